//! Fake resource managers and transports shared by unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::remote::{Endpoint, Transport, TransportError};
use crate::rm::{
    CciConnection, Closeable, Connection, DataSource, DataSourceHolder, ManagedConnection,
    ManagedConnectionFactory, RmError, Session, XaConnection, XaConnectionFactory, XaDataSource,
    XaMessagingConnection, XaSession,
};
use crate::wire::protocol::{Call, Message, Status};
use crate::xa::{Vote, XaError, XaResource, Xid};

pub fn xid(n: u8) -> Xid {
    Xid::new(0x1207, vec![n; 4], vec![1])
}

/// Lifecycle counters observed by assertions.
#[derive(Debug, Default)]
pub struct Counters {
    pub probe_opened: AtomicUsize,
    pub probe_closed: AtomicUsize,
    pub managed_opened: AtomicUsize,
    pub managed_closed: AtomicUsize,
}

/// How a fake resource manager misbehaves.
#[derive(Debug, Default, Clone)]
pub struct Faults {
    /// Factory refuses to create the connection-level object.
    pub connect: Option<String>,
    /// Messaging connection refuses to create an XA session.
    pub session: Option<String>,
    /// Companion probe fails to open.
    pub probe: Option<String>,
    /// Companion probe opens but fails to close.
    pub probe_close: Option<String>,
    /// XA handle extraction fails.
    pub handle: Option<String>,
}

// -- XA resource --

#[derive(Debug, Default)]
pub struct FakeXaResource {
    pub in_doubt: Vec<Xid>,
}

impl XaResource for FakeXaResource {
    fn prepare(&self, _xid: &Xid) -> Result<Vote, XaError> {
        Ok(Vote::Ok)
    }

    fn commit(&self, _xid: &Xid, _one_phase: bool) -> Result<(), XaError> {
        Ok(())
    }

    fn rollback(&self, _xid: &Xid) -> Result<(), XaError> {
        Ok(())
    }

    fn recover(&self) -> Result<Vec<Xid>, XaError> {
        Ok(self.in_doubt.clone())
    }

    fn forget(&self, _xid: &Xid) -> Result<(), XaError> {
        Ok(())
    }
}

// -- Companion probe --

/// A companion connection/session that counts its close calls.
#[derive(Debug)]
pub struct FakeProbe {
    counters: Arc<Counters>,
    close_error: Option<String>,
}

impl FakeProbe {
    pub fn new(counters: Arc<Counters>, close_error: Option<String>) -> Self {
        Self {
            counters,
            close_error,
        }
    }
}

impl Closeable for FakeProbe {
    fn close(&mut self) -> Result<(), RmError> {
        self.counters.probe_closed.fetch_add(1, Ordering::SeqCst);
        match &self.close_error {
            Some(msg) => Err(RmError::new(msg.clone())),
            None => Ok(()),
        }
    }
}

impl Connection for FakeProbe {
    fn recorded_branches(&mut self) -> Result<Vec<Xid>, RmError> {
        Ok(Vec::new())
    }

    fn forget_branch(&mut self, _xid: &Xid) -> Result<bool, RmError> {
        Ok(false)
    }
}

impl Session for FakeProbe {}

impl CciConnection for FakeProbe {}

fn open_probe(counters: &Arc<Counters>, faults: &Faults) -> Result<FakeProbe, RmError> {
    if let Some(msg) = &faults.probe {
        return Err(RmError::new(msg.clone()));
    }
    counters.probe_opened.fetch_add(1, Ordering::SeqCst);
    Ok(FakeProbe::new(counters.clone(), faults.probe_close.clone()))
}

fn extract(xa: &Arc<FakeXaResource>, faults: &Faults) -> Result<Arc<dyn XaResource>, RmError> {
    match &faults.handle {
        Some(msg) => Err(RmError::new(msg.clone())),
        None => Ok(xa.clone()),
    }
}

// -- Plain relational --

/// In-memory relational store holding branch records.
#[derive(Debug, Default)]
pub struct FakeDataSource {
    branches: Arc<Mutex<Vec<Xid>>>,
    refuse: Option<String>,
    fail_queries: bool,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl FakeDataSource {
    pub fn with_branches(branches: Vec<Xid>) -> Self {
        Self {
            branches: Arc::new(Mutex::new(branches)),
            ..Self::default()
        }
    }

    pub fn unreachable(msg: &str) -> Self {
        Self {
            refuse: Some(msg.to_string()),
            ..Self::default()
        }
    }

    pub fn with_failing_queries() -> Self {
        Self {
            fail_queries: true,
            ..Self::default()
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

struct FakeConnection {
    branches: Arc<Mutex<Vec<Xid>>>,
    fail_queries: bool,
    closed: Arc<AtomicUsize>,
}

impl Closeable for FakeConnection {
    fn close(&mut self) -> Result<(), RmError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Connection for FakeConnection {
    fn recorded_branches(&mut self) -> Result<Vec<Xid>, RmError> {
        if self.fail_queries {
            return Err(RmError::new("relation does not exist"));
        }
        Ok(self.branches.lock().clone())
    }

    fn forget_branch(&mut self, xid: &Xid) -> Result<bool, RmError> {
        if self.fail_queries {
            return Err(RmError::new("relation does not exist"));
        }
        let mut branches = self.branches.lock();
        let before = branches.len();
        branches.retain(|b| b != xid);
        Ok(branches.len() != before)
    }
}

impl DataSource for FakeDataSource {
    fn connection(&self) -> Result<Box<dyn Connection>, RmError> {
        if let Some(msg) = &self.refuse {
            return Err(RmError::new(msg.clone()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection {
            branches: self.branches.clone(),
            fail_queries: self.fail_queries,
            closed: self.closed.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct FakeDataSourceHolder(pub Arc<FakeDataSource>);

impl DataSourceHolder for FakeDataSourceHolder {
    fn data_source(&self) -> Arc<dyn DataSource> {
        self.0.clone()
    }
}

// -- XA relational --

#[derive(Debug)]
pub struct FakeXaConnection {
    xa: Arc<FakeXaResource>,
    faults: Faults,
    counters: Arc<Counters>,
}

impl FakeXaConnection {
    pub fn new(xa: Arc<FakeXaResource>) -> Self {
        Self {
            xa,
            faults: Faults::default(),
            counters: Arc::new(Counters::default()),
        }
    }
}

impl XaConnection for FakeXaConnection {
    fn connection(&self) -> Result<Box<dyn Connection>, RmError> {
        Ok(Box::new(open_probe(&self.counters, &self.faults)?))
    }

    fn xa_resource(&self) -> Result<Arc<dyn XaResource>, RmError> {
        extract(&self.xa, &self.faults)
    }

    fn close(&self) -> Result<(), RmError> {
        self.counters.managed_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakeXaDataSource {
    pub xa: Arc<FakeXaResource>,
    pub counters: Arc<Counters>,
    faults: Faults,
}

impl FakeXaDataSource {
    pub fn with_faults(faults: Faults) -> Self {
        Self {
            xa: Arc::new(FakeXaResource::default()),
            counters: Arc::new(Counters::default()),
            faults,
        }
    }

    pub fn healthy() -> Self {
        Self::with_faults(Faults::default())
    }

    pub fn probe_fails(msg: &str) -> Self {
        Self::with_faults(Faults {
            probe: Some(msg.into()),
            ..Faults::default()
        })
    }

    pub fn handle_fails(msg: &str) -> Self {
        Self::with_faults(Faults {
            handle: Some(msg.into()),
            ..Faults::default()
        })
    }

    pub fn unreachable(msg: &str) -> Self {
        Self::with_faults(Faults {
            connect: Some(msg.into()),
            ..Faults::default()
        })
    }
}

impl XaDataSource for FakeXaDataSource {
    fn xa_connection(&self) -> Result<Arc<dyn XaConnection>, RmError> {
        if let Some(msg) = &self.faults.connect {
            return Err(RmError::new(msg.clone()));
        }
        self.counters.managed_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeXaConnection {
            xa: self.xa.clone(),
            faults: self.faults.clone(),
            counters: self.counters.clone(),
        }))
    }
}

// -- XA messaging --

#[derive(Debug)]
pub struct FakeXaConnectionFactory {
    pub xa: Arc<FakeXaResource>,
    pub counters: Arc<Counters>,
    faults: Faults,
}

impl FakeXaConnectionFactory {
    pub fn with_faults(faults: Faults) -> Self {
        Self {
            xa: Arc::new(FakeXaResource::default()),
            counters: Arc::new(Counters::default()),
            faults,
        }
    }

    pub fn healthy() -> Self {
        Self::with_faults(Faults::default())
    }

    pub fn probe_fails(msg: &str) -> Self {
        Self::with_faults(Faults {
            probe: Some(msg.into()),
            ..Faults::default()
        })
    }

    pub fn handle_fails(msg: &str) -> Self {
        Self::with_faults(Faults {
            handle: Some(msg.into()),
            ..Faults::default()
        })
    }

    pub fn session_fails(msg: &str) -> Self {
        Self::with_faults(Faults {
            session: Some(msg.into()),
            ..Faults::default()
        })
    }
}

#[derive(Debug)]
struct FakeMessagingConnection {
    xa: Arc<FakeXaResource>,
    faults: Faults,
    counters: Arc<Counters>,
}

struct FakeXaSession {
    xa: Arc<FakeXaResource>,
    faults: Faults,
    counters: Arc<Counters>,
}

impl XaSession for FakeXaSession {
    fn session(&self) -> Result<Box<dyn Session>, RmError> {
        Ok(Box::new(open_probe(&self.counters, &self.faults)?))
    }

    fn xa_resource(&self) -> Result<Arc<dyn XaResource>, RmError> {
        extract(&self.xa, &self.faults)
    }
}

impl XaMessagingConnection for FakeMessagingConnection {
    fn create_xa_session(&self) -> Result<Box<dyn XaSession>, RmError> {
        if let Some(msg) = &self.faults.session {
            return Err(RmError::new(msg.clone()));
        }
        Ok(Box::new(FakeXaSession {
            xa: self.xa.clone(),
            faults: self.faults.clone(),
            counters: self.counters.clone(),
        }))
    }

    fn close(&self) -> Result<(), RmError> {
        self.counters.managed_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl XaConnectionFactory for FakeXaConnectionFactory {
    fn create_xa_connection(&self) -> Result<Arc<dyn XaMessagingConnection>, RmError> {
        if let Some(msg) = &self.faults.connect {
            return Err(RmError::new(msg.clone()));
        }
        self.counters.managed_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeMessagingConnection {
            xa: self.xa.clone(),
            faults: self.faults.clone(),
            counters: self.counters.clone(),
        }))
    }
}

// -- XA connector --

#[derive(Debug)]
pub struct FakeManagedConnectionFactory {
    pub xa: Arc<FakeXaResource>,
    pub counters: Arc<Counters>,
    faults: Faults,
}

impl FakeManagedConnectionFactory {
    pub fn with_faults(faults: Faults) -> Self {
        Self {
            xa: Arc::new(FakeXaResource::default()),
            counters: Arc::new(Counters::default()),
            faults,
        }
    }

    pub fn healthy() -> Self {
        Self::with_faults(Faults::default())
    }

    pub fn probe_fails(msg: &str) -> Self {
        Self::with_faults(Faults {
            probe: Some(msg.into()),
            ..Faults::default()
        })
    }

    pub fn handle_fails(msg: &str) -> Self {
        Self::with_faults(Faults {
            handle: Some(msg.into()),
            ..Faults::default()
        })
    }

    pub fn probe_close_fails(msg: &str) -> Self {
        Self::with_faults(Faults {
            probe_close: Some(msg.into()),
            ..Faults::default()
        })
    }
}

#[derive(Debug)]
struct FakeManagedConnection {
    xa: Arc<FakeXaResource>,
    faults: Faults,
    counters: Arc<Counters>,
}

impl ManagedConnection for FakeManagedConnection {
    fn connection(&self) -> Result<Box<dyn CciConnection>, RmError> {
        Ok(Box::new(open_probe(&self.counters, &self.faults)?))
    }

    fn xa_resource(&self) -> Result<Arc<dyn XaResource>, RmError> {
        extract(&self.xa, &self.faults)
    }

    fn close(&self) -> Result<(), RmError> {
        self.counters.managed_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl ManagedConnectionFactory for FakeManagedConnectionFactory {
    fn create_managed_connection(&self) -> Result<Arc<dyn ManagedConnection>, RmError> {
        if let Some(msg) = &self.faults.connect {
            return Err(RmError::new(msg.clone()));
        }
        self.counters.managed_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeManagedConnection {
            xa: self.xa.clone(),
            faults: self.faults.clone(),
            counters: self.counters.clone(),
        }))
    }
}

// -- Transport --

/// Records every exchange and answers with a canned reply.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub calls: Mutex<Vec<(Endpoint, Message)>>,
    /// Branches reported for `recover`.
    pub in_doubt: Vec<Xid>,
    /// When set, every exchange fails with this error.
    pub down: Option<String>,
}

impl RecordingTransport {
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Transport for RecordingTransport {
    fn exchange(&self, endpoint: &Endpoint, request: Message) -> Result<Message, TransportError> {
        self.calls.lock().push((endpoint.clone(), request.clone()));
        if let Some(msg) = &self.down {
            return Err(TransportError::Connect {
                endpoint: endpoint.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, msg.clone()),
            });
        }
        let Message::Invoke { id, call, .. } = request else {
            return Err(TransportError::UnexpectedReply(format!("{request:?}")));
        };
        let reply = match call {
            Call::Prepare { .. } => Message::Reply {
                id,
                status: Status::Ok,
                error: None,
                vote: Some(Vote::Ok),
                xids: None,
            },
            Call::Recover => Message::Reply {
                id,
                status: Status::Ok,
                error: None,
                vote: None,
                xids: Some(self.in_doubt.clone()),
            },
            _ => Message::ok_reply(id),
        };
        Ok(reply)
    }
}
