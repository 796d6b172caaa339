//! Configuration file watcher for hot reload.
//!
//! # Responsibilities
//! - Notice saves of the config file, including write-to-temp-then-rename
//! - Coalesce the burst of events one save produces into a single reload
//! - Forward only configs that load and validate
//!
//! # Design Decisions
//! - The parent directory is watched, not the file: a rename replaces the
//!   inode and a file watch would silently go dead
//! - Events are matched on file name only; siblings in the directory are ignored
//! - notify's callback thread only signals; loading runs on a tokio task

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ProxyConfig;

/// Quiet period after the last event before the file is reloaded.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches the config file and sends validated configs on change.
pub struct ConfigWatcher {
    path: PathBuf,
    debounce: Duration,
    update_tx: mpsc::UnboundedSender<ProxyConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ProxyConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let watcher = Self {
            path: path.to_path_buf(),
            debounce: DEFAULT_DEBOUNCE,
            update_tx,
        };
        (watcher, update_rx)
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching. Must be called from within a tokio runtime.
    ///
    /// The returned watcher must be kept alive; dropping it stops the reload
    /// task as well.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name = self
            .path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| {
                notify::Error::generic(&format!("not a file path: {}", self.path.display()))
            })?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if is_config_change(&event, &file_name) {
                        let _ = event_tx.send(());
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tokio::spawn(reload_on_change(
            self.path.clone(),
            self.debounce,
            event_rx,
            self.update_tx,
        ));

        tracing::info!(path = ?self.path, dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}

/// A create, write or rename-into-place that lands on `file_name`.
fn is_config_change(event: &Event, file_name: &OsString) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

async fn reload_on_change(
    path: PathBuf,
    debounce: Duration,
    mut events: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<ProxyConfig>,
) {
    while events.recv().await.is_some() {
        // Wait for the file to settle.
        loop {
            match tokio::time::timeout(debounce, events.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) | Err(_) => break,
            }
        }

        tracing::info!(path = ?path, "Config file change detected, reloading");
        match load_config(&path) {
            Ok(config) => {
                if updates.send(config).is_err() {
                    tracing::debug!("Config receiver dropped, stopping reloads");
                    return;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, EventKind, ModifyKind, RemoveKind, RenameMode};
    use std::fs;

    fn config_toml(api_url: &str) -> String {
        format!(
            "[grafana]\napi_url = \"{}\"\napi_username = \"admin\"\napi_password = \"admin\"\n",
            api_url
        )
    }

    async fn next_with_url(
        updates: &mut mpsc::UnboundedReceiver<ProxyConfig>,
        api_url: &str,
    ) -> ProxyConfig {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let config = updates.recv().await.expect("update channel closed");
                if config.grafana.api_url == api_url {
                    return config;
                }
            }
        })
        .await
        .expect("no config update after change")
    }

    #[test]
    fn test_event_filter() {
        let name = OsString::from("grafana-proxy.toml");
        let renamed = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To)))
            .add_path(PathBuf::from("/etc/grafana-proxy/grafana-proxy.toml"));
        assert!(is_config_change(&renamed, &name));

        let created = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/etc/grafana-proxy/grafana-proxy.toml"));
        assert!(is_config_change(&created, &name));

        let sibling = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/etc/grafana-proxy/grafana-proxy.toml.swp"));
        assert!(!is_config_change(&sibling, &name));

        let removed = Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/etc/grafana-proxy/grafana-proxy.toml"));
        assert!(!is_config_change(&removed, &name));
    }

    #[tokio::test]
    async fn test_rename_over_config_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grafana-proxy.toml");
        fs::write(&path, config_toml("http://grafana-a:3000/")).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _watcher = watcher.with_debounce(Duration::from_millis(50)).run().unwrap();

        // Twice: the watch has to survive the inode being replaced.
        for api_url in ["http://grafana-b:3000/", "http://grafana-c:3000/"] {
            let staged = dir.path().join("grafana-proxy.toml.new");
            fs::write(&staged, config_toml(api_url)).unwrap();
            fs::rename(&staged, &path).unwrap();

            let config = next_with_url(&mut updates, api_url).await;
            assert_eq!(config.grafana.api_username.as_deref(), Some("admin"));
        }
    }

    #[tokio::test]
    async fn test_invalid_and_unrelated_files_not_sent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grafana-proxy.toml");
        fs::write(&path, config_toml("http://grafana-a:3000/")).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _watcher = watcher.with_debounce(Duration::from_millis(50)).run().unwrap();

        fs::write(dir.path().join("other.toml"), config_toml("http://other:3000/")).unwrap();
        fs::write(&path, "[grafana]\napi_url = \"not a url\"\n").unwrap();
        assert!(
            tokio::time::timeout(Duration::from_millis(500), updates.recv())
                .await
                .is_err(),
            "unexpected config update"
        );

        fs::write(&path, config_toml("http://grafana-b:3000/")).unwrap();
        next_with_url(&mut updates, "http://grafana-b:3000/").await;
    }
}
