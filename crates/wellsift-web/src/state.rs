use std::sync::Mutex;

use wellsift_store::WellStore;

/// Shared application state accessible from all handlers.
///
/// The store holds a single SQLite connection; handlers take the lock
/// inside `spawn_blocking` so queries never stall the async runtime.
pub struct AppState {
    pub store: Mutex<WellStore>,
}
