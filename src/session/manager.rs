use super::store::SessionStore;
use super::types::{ChatSession, Message};
use chrono::Utc;
use std::sync::Arc;

/// Best-effort session bookkeeping on top of any [`SessionStore`].
///
/// Storage failures are logged and swallowed; the in-memory conversation
/// always carries on.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Allocate and persist a new session titled after `first_message`.
    pub async fn create_session(&self, first_message: &str, messages: Vec<Message>) -> ChatSession {
        let session = ChatSession::new(first_message, messages);
        if let Err(error) = self.store.put_session(&session).await {
            tracing::warn!(session_id = %session.id, "Failed to persist new session: {error:#}");
        }
        session
    }

    /// Replace the stored message list. Unknown ids are ignored.
    pub async fn update_messages(&self, session_id: &str, messages: &[Message]) {
        let existing = match self.store.get_session(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::debug!(session_id, "update for unknown session ignored");
                return;
            }
            Err(error) => {
                tracing::warn!(session_id, "Failed to load session for update: {error:#}");
                return;
            }
        };

        let updated = ChatSession {
            messages: messages.to_vec(),
            updated_at: Utc::now(),
            ..existing
        };
        if let Err(error) = self.store.put_session(&updated).await {
            tracing::warn!(session_id, "Failed to persist session messages: {error:#}");
        }
    }

    pub async fn get_session(&self, session_id: &str) -> Option<ChatSession> {
        self.store
            .get_session(session_id)
            .await
            .unwrap_or_else(|error| {
                tracing::warn!(session_id, "Failed to load session: {error:#}");
                None
            })
    }

    /// Most recently updated first.
    pub async fn list_sessions(&self) -> Vec<ChatSession> {
        self.store.list_sessions().await.unwrap_or_else(|error| {
            tracing::warn!("Failed to list sessions: {error:#}");
            Vec::new()
        })
    }

    pub async fn delete_session(&self, session_id: &str) -> bool {
        self.store
            .delete_session(session_id)
            .await
            .unwrap_or_else(|error| {
                tracing::warn!(session_id, "Failed to delete session: {error:#}");
                false
            })
    }

    pub async fn delete_all(&self) {
        if let Err(error) = self.store.delete_all().await {
            tracing::warn!("Failed to delete all sessions: {error:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::LocalSessionStore;
    use crate::session::types::Role;
    use anyhow::{Result, bail};
    use std::future::Future;
    use std::pin::Pin;
    use tempfile::TempDir;

    /// Store whose every operation fails.
    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn put_session<'a>(
            &'a self,
            _session: &'a ChatSession,
        ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
            Box::pin(async { bail!("disk full") })
        }

        fn get_session<'a>(
            &'a self,
            _id: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Option<ChatSession>>> + Send + 'a>> {
            Box::pin(async { bail!("disk full") })
        }

        fn list_sessions(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<ChatSession>>> + Send + '_>> {
            Box::pin(async { bail!("disk full") })
        }

        fn delete_session<'a>(
            &'a self,
            _id: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
            Box::pin(async { bail!("disk full") })
        }

        fn delete_all(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            Box::pin(async { bail!("disk full") })
        }
    }

    fn local(tmp: &TempDir) -> SessionManager {
        SessionManager::new(Arc::new(LocalSessionStore::new(tmp.path())))
    }

    #[tokio::test]
    async fn create_session_derives_title_and_persists() {
        let tmp = TempDir::new().unwrap();
        let manager = local(&tmp);
        let text = "Hello world, this is a long message exceeding fifty characters total";
        let session = manager
            .create_session(text, vec![Message::user(text), Message::assistant_placeholder()])
            .await;

        assert_eq!(session.title.chars().count(), 50);
        assert!(session.title.ends_with("..."));
        let stored = manager.get_session(&session.id).await.unwrap();
        assert_eq!(stored.messages.len(), 2);
    }

    #[tokio::test]
    async fn update_messages_replaces_list_and_bumps_updated_at() {
        let tmp = TempDir::new().unwrap();
        let manager = local(&tmp);
        let session = manager.create_session("hi", vec![Message::user("hi")]).await;

        let mut messages = session.messages.clone();
        messages.push(Message::new(Role::Assistant, "hello"));
        manager.update_messages(&session.id, &messages).await;

        let stored = manager.get_session(&session.id).await.unwrap();
        assert_eq!(stored.messages, messages);
        assert!(stored.updated_at >= session.updated_at);
        assert_eq!(stored.created_at, session.created_at);
    }

    #[tokio::test]
    async fn update_on_unknown_session_is_a_noop() {
        let tmp = TempDir::new().unwrap();
        let manager = local(&tmp);
        manager
            .update_messages("does-not-exist", &[Message::user("x")])
            .await;
        assert!(manager.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn delete_all_then_list_is_empty() {
        let tmp = TempDir::new().unwrap();
        let manager = local(&tmp);
        manager.create_session("a", Vec::new()).await;
        manager.create_session("b", Vec::new()).await;
        assert_eq!(manager.list_sessions().await.len(), 2);

        manager.delete_all().await;
        assert!(manager.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn storage_failures_never_propagate() {
        let manager = SessionManager::new(Arc::new(BrokenStore));
        let session = manager.create_session("hi", vec![Message::user("hi")]).await;
        assert_eq!(session.title, "hi");

        manager.update_messages(&session.id, &session.messages).await;
        assert!(manager.get_session(&session.id).await.is_none());
        assert!(manager.list_sessions().await.is_empty());
        assert!(!manager.delete_session(&session.id).await);
        manager.delete_all().await;
    }
}
