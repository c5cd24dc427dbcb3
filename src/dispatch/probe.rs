//! Scoped validation probes.
//!
//! A probe is the companion connection or session a strategy opens only
//! to confirm the resource manager session is usable. The probe belongs
//! to the dispatch call: it is closed exactly once when the guard drops,
//! on every exit path. Close failures are logged and discarded.

use crate::descriptor::ProbeFailure;
use crate::rm::{Capability, Closeable, RmError};

pub(crate) struct ProbeGuard<T: Closeable + ?Sized> {
    inner: Option<Box<T>>,
    capability: Capability,
}

impl<T: Closeable + ?Sized> Drop for ProbeGuard<T> {
    fn drop(&mut self) {
        if let Some(mut probe) = self.inner.take() {
            if let Err(e) = probe.close() {
                tracing::debug!(
                    capability = %self.capability,
                    error = %e,
                    "probe close failed"
                );
            }
        }
    }
}

/// Open a probe, absorbing failure.
///
/// Returns the guard (holding the probe when it opened) and, when the
/// open failed, the failure to surface on the descriptor.
pub(crate) fn open<T, F>(
    identifier: &str,
    capability: Capability,
    connect: F,
) -> (ProbeGuard<T>, Option<ProbeFailure>)
where
    T: Closeable + ?Sized,
    F: FnOnce() -> Result<Box<T>, RmError>,
{
    match connect() {
        Ok(probe) => (
            ProbeGuard {
                inner: Some(probe),
                capability,
            },
            None,
        ),
        Err(e) => {
            tracing::warn!(
                identifier,
                capability = %capability,
                error = %e,
                "validation probe failed; continuing with factory-level handle"
            );
            (
                ProbeGuard {
                    inner: None,
                    capability,
                },
                Some(ProbeFailure {
                    capability,
                    message: e.0,
                }),
            )
        }
    }
}
