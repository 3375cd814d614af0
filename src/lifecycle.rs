//! Storage Lifecycle
//!
//! Process-wide initialize-once/teardown-once accessor for the single
//! storage instance backing the emulator.
//!
//! Core logic never touches this module: everything in the storage layer
//! operates on an explicit [`Storage`] object. Only the server's top-level
//! wiring consumes the global accessor, because exactly one instance backs
//! the whole process.
//!
//! States: `Uninitialized → Ready → Closed`. `init` is idempotent while
//! `Ready`; `close` before any `init` is a true no-op leaving `init`
//! available; `init` after a real `close` is an explicit error rather than
//! the silent dead state the once-initialization pattern would produce.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::store::Storage;

enum LifecycleState {
    Uninitialized,
    Ready(Arc<Storage>),
    Closed,
}

static GLOBAL: RwLock<LifecycleState> = RwLock::new(LifecycleState::Uninitialized);

/// Initialize the process-wide storage instance at `path`
///
/// Idempotent while `Ready`: every caller observes the same instance.
/// Double-checked: a fast read-locked check first, then the write lock for
/// the one-time open, so concurrent callers never open the same path twice.
pub fn init(path: &Path) -> Result<Arc<Storage>> {
    if let LifecycleState::Ready(storage) = &*GLOBAL.read() {
        return Ok(storage.clone());
    }

    let mut state = GLOBAL.write();
    match &*state {
        LifecycleState::Ready(storage) => Ok(storage.clone()),
        LifecycleState::Closed => Err(StoreError::AlreadyClosed),
        LifecycleState::Uninitialized => {
            let config = Config::builder().data_dir(path).build();
            let storage = Arc::new(Storage::open(config)?);
            tracing::info!(path = %path.display(), "global storage initialized");
            *state = LifecycleState::Ready(storage.clone());
            Ok(storage)
        }
    }
}

/// Current instance, or `None` when not `Ready`
pub fn get() -> Option<Arc<Storage>> {
    match &*GLOBAL.read() {
        LifecycleState::Ready(storage) => Some(storage.clone()),
        _ => None,
    }
}

/// Release the instance and transition to `Closed`
///
/// A no-op when never initialized: `init` still works afterwards. A live
/// instance gets a final WAL sync before the accessor lets go of it.
/// Outstanding `Arc`s keep the instance alive until their holders finish;
/// the accessor stops handing out new ones immediately.
pub fn close() {
    let mut state = GLOBAL.write();
    if let LifecycleState::Ready(storage) = &*state {
        if let Err(e) = storage.sync() {
            tracing::error!(error = %e, "final sync on close failed");
        }
        tracing::info!("global storage closed");
        *state = LifecycleState::Closed;
    }
}
