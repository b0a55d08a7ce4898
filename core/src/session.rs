//! Persisted session credentials.
//!
//! # Design
//! Storage and observation are separate concerns. A [`SessionStorage`]
//! backend only knows how to read and write one string per key; the
//! [`SessionStore`] on top keeps the latest [`Credentials`] snapshot in a
//! `watch` channel so screens can subscribe to changes. Keys are written one
//! at a time with no cross-key transaction: a crash between two saves leaves
//! a partial set, which is fine because login always restarts from the app
//! key.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

use crate::error::SessionError;
use crate::types::Credentials;

/// The four persisted credentials and their on-disk names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    AppKey,
    OauthKey,
    OauthUserId,
    SessKey,
}

impl SessionKey {
    pub const ALL: [SessionKey; 4] = [
        SessionKey::AppKey,
        SessionKey::OauthKey,
        SessionKey::OauthUserId,
        SessionKey::SessKey,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SessionKey::AppKey => "app_key",
            SessionKey::OauthKey => "oauth_key",
            SessionKey::OauthUserId => "oauth_user_id",
            SessionKey::SessKey => "sess_key",
        }
    }

    fn get(self, credentials: &Credentials) -> &str {
        match self {
            SessionKey::AppKey => &credentials.app_key,
            SessionKey::OauthKey => &credentials.oauth_key,
            SessionKey::OauthUserId => &credentials.oauth_user_id,
            SessionKey::SessKey => &credentials.sess_key,
        }
    }

    fn get_mut(self, credentials: &mut Credentials) -> &mut String {
        match self {
            SessionKey::AppKey => &mut credentials.app_key,
            SessionKey::OauthKey => &mut credentials.oauth_key,
            SessionKey::OauthUserId => &mut credentials.oauth_user_id,
            SessionKey::SessKey => &mut credentials.sess_key,
        }
    }
}

/// A durable string-per-key backend.
pub trait SessionStorage: Send + Sync {
    fn read(&self, key: SessionKey) -> Result<Option<String>, SessionError>;
    fn write(&self, key: SessionKey, value: &str) -> Result<(), SessionError>;
}

/// Process-lifetime storage, for tests and hosts that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<SessionKey, String>>,
}

impl SessionStorage for MemoryStorage {
    fn read(&self, key: SessionKey) -> Result<Option<String>, SessionError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(&key).cloned())
    }

    fn write(&self, key: SessionKey, value: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, value.to_string());
        Ok(())
    }
}

/// A JSON object on disk, rewritten through a temp file and a rename.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl SessionStorage for FileStorage {
    fn read(&self, key: SessionKey) -> Result<Option<String>, SessionError> {
        Ok(self.load()?.remove(key.as_str()))
    }

    fn write(&self, key: SessionKey, value: &str) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        entries.insert(key.as_str().to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// The session interface injected into the repository.
///
/// Reads never fail and yield `""` for a credential that was never saved.
pub trait SessionManager: Send + Sync {
    fn load(&self, key: SessionKey) -> String;
    fn save(&self, key: SessionKey, value: &str) -> Result<(), SessionError>;
    fn subscribe(&self) -> watch::Receiver<Credentials>;

    fn app_key(&self) -> String {
        self.load(SessionKey::AppKey)
    }

    fn oauth_key(&self) -> String {
        self.load(SessionKey::OauthKey)
    }

    fn oauth_user_id(&self) -> String {
        self.load(SessionKey::OauthUserId)
    }

    fn sess_key(&self) -> String {
        self.load(SessionKey::SessKey)
    }

    fn save_app_key(&self, app_key: &str) -> Result<(), SessionError> {
        self.save(SessionKey::AppKey, app_key)
    }

    fn save_oauth_key(&self, oauth_key: &str) -> Result<(), SessionError> {
        self.save(SessionKey::OauthKey, oauth_key)
    }

    fn save_oauth_user_id(&self, oauth_user_id: &str) -> Result<(), SessionError> {
        self.save(SessionKey::OauthUserId, oauth_user_id)
    }

    fn save_sess_key(&self, sess_key: &str) -> Result<(), SessionError> {
        self.save(SessionKey::SessKey, sess_key)
    }
}

/// [`SessionManager`] over any [`SessionStorage`] backend.
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    updates: watch::Sender<Credentials>,
    /// Held across the storage write and the snapshot update so both see
    /// saves in the same order.
    save_order: Mutex<()>,
}

impl SessionStore {
    /// Wrap `storage`, seeding the observable snapshot from what it holds.
    pub fn new(storage: impl SessionStorage + 'static) -> Result<Self, SessionError> {
        let mut credentials = Credentials::default();
        for key in SessionKey::ALL {
            if let Some(value) = storage.read(key)? {
                *key.get_mut(&mut credentials) = value;
            }
        }
        let (updates, _) = watch::channel(credentials);
        Ok(Self {
            storage: Box::new(storage),
            updates,
            save_order: Mutex::new(()),
        })
    }

    pub fn in_memory() -> Self {
        let (updates, _) = watch::channel(Credentials::default());
        Self {
            storage: Box::new(MemoryStorage::default()),
            updates,
            save_order: Mutex::new(()),
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        Self::new(FileStorage::new(path))
    }

    pub fn credentials(&self) -> Credentials {
        self.updates.borrow().clone()
    }
}

impl SessionManager for SessionStore {
    fn load(&self, key: SessionKey) -> String {
        key.get(&self.updates.borrow()).to_string()
    }

    fn save(&self, key: SessionKey, value: &str) -> Result<(), SessionError> {
        let _order = self.save_order.lock().unwrap_or_else(PoisonError::into_inner);
        self.storage.write(key, value)?;
        self.updates.send_modify(|credentials| {
            *key.get_mut(credentials) = value.to_string();
        });
        tracing::debug!(key = key.as_str(), "credential saved");
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Credentials> {
        self.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_credentials_read_as_empty() {
        let store = SessionStore::in_memory();
        assert_eq!(store.app_key(), "");
        assert_eq!(store.oauth_key(), "");
        assert_eq!(store.oauth_user_id(), "");
        assert_eq!(store.sess_key(), "");
    }

    #[test]
    fn save_overwrites_single_key() {
        let store = SessionStore::in_memory();
        store.save_app_key("ak-1").unwrap();
        store.save_app_key("ak-2").unwrap();
        store.save_sess_key("sk-1").unwrap();
        assert_eq!(
            store.credentials(),
            Credentials {
                app_key: "ak-2".to_string(),
                sess_key: "sk-1".to_string(),
                ..Credentials::default()
            }
        );
    }

    #[tokio::test]
    async fn subscribers_see_saves() {
        let store = SessionStore::in_memory();
        let mut rx = store.subscribe();
        store.save_oauth_user_id("u-7").unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().oauth_user_id, "u-7");
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("userSession.json");
        {
            let store = SessionStore::open(&path).unwrap();
            store.save_app_key("ak-1").unwrap();
            store.save_oauth_key("ok-1").unwrap();
            store.save_oauth_user_id("u-7").unwrap();
        }
        let reopened = SessionStore::open(&path).unwrap();
        assert_eq!(reopened.app_key(), "ak-1");
        assert_eq!(reopened.oauth_key(), "ok-1");
        assert_eq!(reopened.oauth_user_id(), "u-7");
        assert_eq!(reopened.sess_key(), "");
    }

    #[test]
    fn concurrent_saves_leave_memory_and_disk_in_agreement() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("userSession.json");
        let store = SessionStore::open(&path).unwrap();

        std::thread::scope(|scope| {
            for writer in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for round in 0..25 {
                        store.save_sess_key(&format!("sk-{writer}-{round}")).unwrap();
                    }
                });
            }
        });

        let reopened = SessionStore::open(&path).unwrap();
        assert_eq!(reopened.credentials(), store.credentials());
        assert!(store.sess_key().starts_with("sk-"));
    }

    #[test]
    fn file_store_uses_fixed_key_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("userSession.json"));
        storage.write(SessionKey::SessKey, "sk-1").unwrap();
        let raw = fs::read_to_string(storage.path()).unwrap();
        let map: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(map.get("sess_key").map(String::as_str), Some("sk-1"));
        assert!(!storage.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("userSession.json");
        fs::write(&path, "{ not json").unwrap();
        let err = SessionStore::open(&path).err().unwrap();
        assert!(matches!(err, SessionError::Format(_)));
    }
}
