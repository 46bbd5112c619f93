use super::types::ChatSession;
use anyhow::{Context, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::sync::Mutex;

/// Fixed key the whole history is stored under.
pub const HISTORY_KEY: &str = "strawberryAiChatHistory";

/// Async session persistence contract.
pub trait SessionStore: Send + Sync {
    /// Insert or replace a session by id.
    fn put_session<'a>(
        &'a self,
        session: &'a ChatSession,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    fn get_session<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ChatSession>>> + Send + 'a>>;

    /// All sessions, most recently updated first.
    fn list_sessions(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ChatSession>>> + Send + '_>>;

    fn delete_session<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;

    fn delete_all(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Client-local history: one JSON array in `<dir>/strawberryAiChatHistory.json`.
///
/// Every mutation rewrites the whole file (write to a temp file, then
/// rename). Read-modify-write cycles are serialized by `lock`.
pub struct LocalSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalSessionStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{HISTORY_KEY}.json")),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<ChatSession>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("read history file {}", self.path.display()));
            }
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("parse history file {}", self.path.display()))
    }

    async fn write_all(&self, mut sessions: Vec<ChatSession>) -> Result<()> {
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        let json = serde_json::to_vec(&sessions).context("serialize history")?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create history directory {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("write history file {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replace history file {}", self.path.display()))?;
        Ok(())
    }
}

impl SessionStore for LocalSessionStore {
    fn put_session<'a>(
        &'a self,
        session: &'a ChatSession,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut sessions = self.read_all().await?;
            match sessions.iter_mut().find(|s| s.id == session.id) {
                Some(existing) => *existing = session.clone(),
                None => sessions.push(session.clone()),
            }
            self.write_all(sessions).await
        })
    }

    fn get_session<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ChatSession>>> + Send + 'a>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            Ok(self.read_all().await?.into_iter().find(|s| s.id == id))
        })
    }

    fn list_sessions(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ChatSession>>> + Send + '_>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut sessions = self.read_all().await?;
            sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(sessions)
        })
    }

    fn delete_session<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut sessions = self.read_all().await?;
            let before = sessions.len();
            sessions.retain(|s| s.id != id);
            if sessions.len() == before {
                return Ok(false);
            }
            self.write_all(sessions).await?;
            Ok(true)
        })
    }

    fn delete_all(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            match tokio::fs::remove_file(&self.path).await {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(error) => Err(error)
                    .with_context(|| format!("remove history file {}", self.path.display())),
            }
        })
    }
}
