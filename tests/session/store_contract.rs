use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use strawberry::Config;
use strawberry::config::StorageBackend;
use strawberry::session::{
    ChatSession, LocalSessionStore, Message, SessionManager, SessionStore, SqliteSessionStore,
    open_store,
};

fn session_at(title: &str, minutes_ago: i64) -> ChatSession {
    let mut session = ChatSession::new(title, vec![Message::user(title)]);
    session.updated_at = Utc::now() - Duration::minutes(minutes_ago);
    session
}

async fn exercise_contract(store: &dyn SessionStore) {
    assert!(store.list_sessions().await.unwrap().is_empty());
    assert!(store.get_session("absent").await.unwrap().is_none());
    assert!(!store.delete_session("absent").await.unwrap());

    let older = session_at("older chat", 30);
    let newer = session_at("newer chat", 1);
    store.put_session(&older).await.unwrap();
    store.put_session(&newer).await.unwrap();

    let titles: Vec<String> = store
        .list_sessions()
        .await
        .unwrap()
        .into_iter()
        .map(|session| session.title)
        .collect();
    assert_eq!(titles, vec!["newer chat", "older chat"]);

    let mut updated = older.clone();
    updated.messages.push(Message::user("follow-up"));
    updated.updated_at = Utc::now();
    store.put_session(&updated).await.unwrap();

    let listed = store.list_sessions().await.unwrap();
    assert_eq!(listed.len(), 2, "upsert must not duplicate");
    assert_eq!(listed[0].id, older.id);
    assert_eq!(listed[0].messages.len(), 2);
    assert_eq!(
        listed[0].created_at.timestamp_millis(),
        older.created_at.timestamp_millis()
    );

    let fetched = store.get_session(&newer.id).await.unwrap().unwrap();
    assert_eq!(fetched.messages, newer.messages);

    assert!(store.delete_session(&newer.id).await.unwrap());
    assert!(store.get_session(&newer.id).await.unwrap().is_none());

    store.delete_all().await.unwrap();
    assert!(store.list_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn local_store_honours_contract() {
    let tmp = TempDir::new().unwrap();
    exercise_contract(&LocalSessionStore::new(tmp.path())).await;
}

#[tokio::test]
async fn sqlite_store_honours_contract() {
    let tmp = TempDir::new().unwrap();
    let store = SqliteSessionStore::connect(&tmp.path().join("db/chats.db"), "user-1")
        .await
        .unwrap();
    exercise_contract(&store).await;
}

#[tokio::test]
async fn hosted_sessions_are_scoped_by_user() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("chats.db");
    let alice = SqliteSessionStore::connect(&path, "alice").await.unwrap();
    let bob = SqliteSessionStore::connect(&path, "bob").await.unwrap();

    let session = session_at("alice's chat", 0);
    alice.put_session(&session).await.unwrap();

    assert!(bob.get_session(&session.id).await.unwrap().is_none());
    assert!(bob.list_sessions().await.unwrap().is_empty());
    assert!(!bob.delete_session(&session.id).await.unwrap());
    bob.delete_all().await.unwrap();

    let mut hijack = session.clone();
    hijack.title = "bob was here".into();
    bob.put_session(&hijack).await.unwrap();

    let kept = alice.get_session(&session.id).await.unwrap().unwrap();
    assert_eq!(kept.title, "alice's chat");
    assert_eq!(kept.user_id.as_deref(), Some("alice"));
}

#[tokio::test]
async fn local_history_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let session = session_at("persisted", 0);
    LocalSessionStore::new(tmp.path())
        .put_session(&session)
        .await
        .unwrap();

    let reopened = LocalSessionStore::new(tmp.path());
    let listed = reopened.list_sessions().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, session.id);
}

#[tokio::test]
async fn open_store_follows_configured_backend() {
    let tmp = TempDir::new().unwrap();
    let mut config = Config {
        data_dir: tmp.path().to_path_buf(),
        ..Config::default()
    };

    let local = SessionManager::new(open_store(&config).await.unwrap());
    local.create_session("kept locally", Vec::new()).await;
    assert!(config.history_dir().join("strawberryAiChatHistory.json").exists());

    config.storage.backend = StorageBackend::Hosted;
    let hosted: Arc<dyn SessionStore> = open_store(&config).await.unwrap();
    assert!(hosted.list_sessions().await.unwrap().is_empty());
    assert!(config.hosted_db_path().exists());
}
