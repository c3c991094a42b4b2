use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use flamenco_sync_core::CacheStore;
use tracing::info;

use crate::http::HttpManagerClient;
use crate::ClientError;

/// Process-wide holder of the Manager client.
///
/// The client is only built on first use and is then shared until
/// [`ClientSlot::discard`].
#[derive(Debug)]
pub struct ClientSlot {
    timeout: Duration,
    client: Mutex<Option<Arc<HttpManagerClient>>>,
}

impl ClientSlot {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            client: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<HttpManagerClient>>> {
        self.client.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the client for `manager_url`, creating it if needed.
    ///
    /// Asking for a different URL than the current client's replaces it.
    pub fn get_or_create(&self, manager_url: &str) -> Result<Arc<HttpManagerClient>, ClientError> {
        let mut slot = self.lock();
        if let Some(client) = slot.as_ref() {
            if client.base_url() == manager_url.trim_end_matches('/') {
                return Ok(Arc::clone(client));
            }
            info!(old = client.base_url(), new = manager_url, "Manager URL changed");
        }

        let client = Arc::new(HttpManagerClient::new(manager_url, self.timeout)?);
        info!("created API client for Manager at {manager_url}");
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_some()
    }

    /// Closes the client and drops the cached Manager info along with it.
    pub fn discard(&self, store: &CacheStore) {
        if self.lock().take().is_some() {
            info!("closing Flamenco client");
        }
        store.clear();
    }
}

/// Version of this client library.
pub fn client_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
