//! Per-resource-manager extraction strategies.
//!
//! Each strategy returns `None` when the instance lacks its capability,
//! so the dispatcher can move on to the next table entry.
//!
//! The three XA strategies share one shape: obtain the connection-level
//! object, open a companion probe, extract the XA handle from the
//! connection-level object whether or not the probe opened, close the
//! probe. The connection-level object is handed off, never closed here,
//! unless handle extraction fails before the hand-off.

use std::sync::Arc;

use super::DispatchError;
use super::probe;
use crate::descriptor::ResourceDescriptor;
use crate::rm::{
    Capability, CciConnection, Connection, ManagedConnectionFactory, ManagedResource,
    RecoveredResource, RmError, ServiceInstance, Session, XaConnectionFactory, XaDataSource,
};

pub(super) type Outcome = Option<Result<ResourceDescriptor, DispatchError>>;

pub(super) fn local_recoverable(identifier: &str, instance: &ServiceInstance) -> Outcome {
    let holder = instance.data_source_holder()?;
    let resource = RecoveredResource::new(holder.data_source());
    Some(Ok(ResourceDescriptor::local(identifier, Arc::new(resource))))
}

pub(super) fn relational(identifier: &str, instance: &ServiceInstance) -> Outcome {
    let ds = instance.data_source()?;
    let resource = RecoveredResource::new(Arc::clone(ds));
    Some(Ok(ResourceDescriptor::local(identifier, Arc::new(resource))))
}

pub(super) fn xa_relational(identifier: &str, instance: &ServiceInstance) -> Outcome {
    let ds = instance.xa_data_source()?;
    Some(extract_xa_relational(identifier, ds.as_ref()))
}

pub(super) fn xa_messaging(identifier: &str, instance: &ServiceInstance) -> Outcome {
    let factory = instance.xa_connection_factory()?;
    Some(extract_xa_messaging(identifier, factory.as_ref()))
}

pub(super) fn xa_connector(identifier: &str, instance: &ServiceInstance) -> Outcome {
    let factory = instance.managed_connection_factory()?;
    Some(extract_xa_connector(identifier, factory.as_ref()))
}

fn extract_xa_relational(
    identifier: &str,
    ds: &dyn XaDataSource,
) -> Result<ResourceDescriptor, DispatchError> {
    let cap = Capability::XaRelational;
    let xa_conn = ds
        .xa_connection()
        .map_err(|e| DispatchError::new(cap, "xa connection", e))?;

    let (guard, degraded) =
        probe::open::<dyn Connection, _>(identifier, cap, || xa_conn.connection());
    let extracted = xa_conn.xa_resource();
    drop(guard);

    let managed = ManagedResource::XaConnection(xa_conn);
    let resource = extracted.map_err(|e| abandon(identifier, &managed, cap, "xa resource", e))?;
    Ok(ResourceDescriptor::common(identifier, resource, managed, degraded))
}

fn extract_xa_messaging(
    identifier: &str,
    factory: &dyn XaConnectionFactory,
) -> Result<ResourceDescriptor, DispatchError> {
    let cap = Capability::XaMessaging;
    let xa_conn = factory
        .create_xa_connection()
        .map_err(|e| DispatchError::new(cap, "xa connection", e))?;
    let managed = ManagedResource::XaMessagingConnection(Arc::clone(&xa_conn));

    let xa_session = xa_conn
        .create_xa_session()
        .map_err(|e| abandon(identifier, &managed, cap, "xa session", e))?;

    let (guard, degraded) =
        probe::open::<dyn Session, _>(identifier, cap, || xa_session.session());
    let extracted = xa_session.xa_resource();
    drop(guard);

    let resource = extracted.map_err(|e| abandon(identifier, &managed, cap, "xa resource", e))?;
    Ok(ResourceDescriptor::common(identifier, resource, managed, degraded))
}

fn extract_xa_connector(
    identifier: &str,
    factory: &dyn ManagedConnectionFactory,
) -> Result<ResourceDescriptor, DispatchError> {
    let cap = Capability::XaConnector;
    let mc = factory
        .create_managed_connection()
        .map_err(|e| DispatchError::new(cap, "managed connection", e))?;

    let (guard, degraded) =
        probe::open::<dyn CciConnection, _>(identifier, cap, || mc.connection());
    let extracted = mc.xa_resource();
    drop(guard);

    let managed = ManagedResource::ManagedConnection(mc);
    let resource = extracted.map_err(|e| abandon(identifier, &managed, cap, "xa resource", e))?;
    Ok(ResourceDescriptor::common(identifier, resource, managed, degraded))
}

/// Close a connection-level object that never reached its new owner.
fn abandon(
    identifier: &str,
    managed: &ManagedResource,
    cap: Capability,
    stage: &'static str,
    cause: RmError,
) -> DispatchError {
    if let Err(e) = managed.close() {
        tracing::debug!(
            identifier,
            resource = managed.kind(),
            error = %e,
            "close after failed extraction"
        );
    }
    DispatchError::new(cap, stage, cause)
}
