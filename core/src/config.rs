//! Client configuration: defaults overridden by environment variables.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

pub const DEFAULT_BASE_URL: &str = "https://timetonic.com";
pub const DEFAULT_APP_NAME: &str = "android";
pub const DEFAULT_API_VERSION: &str = "6.49q/6.49";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// File holding the persisted credentials inside `session_dir`.
pub const SESSION_FILE_NAME: &str = "userSession.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub app_name: String,
    pub api_version: String,
    pub connect_timeout: Duration,
    pub session_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            session_dir: default_session_dir(),
        }
    }
}

impl ClientConfig {
    /// Defaults, overridden by `BOOKLIST_*` variables from the process
    /// environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable lookup.
    /// Unparseable timeouts fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("BOOKLIST_BASE_URL") {
            config.base_url = url;
        }
        if let Some(name) = lookup("BOOKLIST_APP_NAME") {
            config.app_name = name;
        }
        if let Some(version) = lookup("BOOKLIST_API_VERSION") {
            config.api_version = version;
        }
        match lookup("BOOKLIST_CONNECT_TIMEOUT_SECS").map(|s| s.parse::<u64>()) {
            Some(Ok(secs)) => config.connect_timeout = Duration::from_secs(secs),
            Some(Err(err)) => {
                tracing::warn!(%err, "ignoring invalid BOOKLIST_CONNECT_TIMEOUT_SECS");
            }
            None => {}
        }
        if let Some(dir) = lookup("BOOKLIST_SESSION_DIR") {
            config.session_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn session_file(&self) -> PathBuf {
        self.session_dir.join(SESSION_FILE_NAME)
    }
}

fn default_session_dir() -> PathBuf {
    ProjectDirs::from("com", "timetonic", "booklist")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".booklist"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_keeps_defaults() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.app_name, "android");
        assert_eq!(config.api_version, "6.49q/6.49");
        assert_eq!(config.connect_timeout, Duration::from_secs(60));
    }

    #[test]
    fn environment_overrides_every_field() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("BOOKLIST_BASE_URL", "http://127.0.0.1:3000"),
            ("BOOKLIST_APP_NAME", "ios"),
            ("BOOKLIST_API_VERSION", "7.0"),
            ("BOOKLIST_CONNECT_TIMEOUT_SECS", "5"),
            ("BOOKLIST_SESSION_DIR", "/tmp/booklist"),
        ]));
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.app_name, "ios");
        assert_eq!(config.api_version, "7.0");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(
            config.session_file(),
            PathBuf::from("/tmp/booklist/userSession.json")
        );
    }

    #[test]
    fn invalid_timeout_falls_back_to_default() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[("BOOKLIST_CONNECT_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }
}
