pub mod manager;
pub mod sqlite;
pub mod store;
pub mod types;

pub use manager::SessionManager;
pub use sqlite::SqliteSessionStore;
pub use store::{HISTORY_KEY, LocalSessionStore, SessionStore};
pub use types::{Attachment, ChatSession, DEFAULT_TITLE, Message, Role, derive_title};

use crate::config::{Config, StorageBackend};
use anyhow::Result;
use std::sync::Arc;

/// Open the store selected by `[storage] backend`.
pub async fn open_store(config: &Config) -> Result<Arc<dyn SessionStore>> {
    match config.storage.backend {
        StorageBackend::Local => {
            let dir = config.history_dir();
            tracing::debug!(dir = %dir.display(), "using local session store");
            Ok(Arc::new(LocalSessionStore::new(&dir)))
        }
        StorageBackend::Hosted => {
            let path = config.hosted_db_path();
            tracing::debug!(path = %path.display(), user_id = %config.storage.user_id, "using hosted session store");
            let store = SqliteSessionStore::connect(&path, &config.storage.user_id).await?;
            Ok(Arc::new(store))
        }
    }
}
