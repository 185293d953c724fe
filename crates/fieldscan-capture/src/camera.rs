//! # Camera Device
//!
//! Exclusive ownership of the scanning camera.
//!
//! ## Lease Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         CameraDevice "rear"                             │
//! │                                                                         │
//! │   Arc<Mutex<()>>  ──try_acquire()──►  CameraLease (owned guard)         │
//! │        │                                   │                            │
//! │        │  second try_acquire()             │  moved into ScanSession    │
//! │        └──────────► CameraBusy             │                            │
//! │                                            ▼                            │
//! │                               complete / cancel / drop                  │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                                  guard dropped → released               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no `release()` method: the only way to give the camera back is to
//! drop the lease, so every exit path releases it.

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::{ScanError, ScanResult};

/// Name used when no camera is configured.
pub const DEFAULT_CAMERA: &str = "default";

/// A camera that at most one scan session may hold at a time.
///
/// Cloning is cheap: clones refer to the same physical device.
#[derive(Debug, Clone)]
pub struct CameraDevice {
    name: String,
    lock: Arc<Mutex<()>>,
}

impl CameraDevice {
    pub fn new(name: impl Into<String>) -> Self {
        CameraDevice {
            name: name.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Takes the camera without waiting.
    ///
    /// Fails with [`ScanError::CameraBusy`] while another lease is alive.
    pub fn try_acquire(&self) -> ScanResult<CameraLease> {
        let guard = self
            .lock
            .clone()
            .try_lock_owned()
            .map_err(|_| ScanError::CameraBusy {
                device: self.name.clone(),
            })?;

        debug!(camera = %self.name, "Camera acquired");

        Ok(CameraLease {
            device: self.name.clone(),
            _guard: guard,
        })
    }

    /// Returns true while a lease is held.
    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}

impl Default for CameraDevice {
    fn default() -> Self {
        CameraDevice::new(DEFAULT_CAMERA)
    }
}

/// Proof of exclusive camera ownership. Dropping it releases the camera.
#[derive(Debug)]
pub struct CameraLease {
    device: String,
    _guard: OwnedMutexGuard<()>,
}

impl CameraLease {
    pub fn device(&self) -> &str {
        &self.device
    }
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        debug!(camera = %self.device, "Camera released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_lease_is_refused() {
        let camera = CameraDevice::new("rear");
        let lease = camera.try_acquire().unwrap();
        assert_eq!(lease.device(), "rear");
        assert!(camera.is_busy());

        let err = camera.try_acquire().unwrap_err();
        assert!(matches!(err, ScanError::CameraBusy { ref device } if device == "rear"));
    }

    #[test]
    fn test_drop_releases() {
        let camera = CameraDevice::default();
        let clone = camera.clone();

        {
            let _lease = camera.try_acquire().unwrap();
            assert!(clone.is_busy());
        }

        assert!(!clone.is_busy());
        assert!(clone.try_acquire().is_ok());
    }
}
