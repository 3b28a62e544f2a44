use crate::config::AppConfig;
use crate::config_loader::ConfigLoader;
use anyhow::Result;
use notify::{Event, RecursiveMode, Watcher};
use std::path::PathBuf;
use tokio::sync::watch;

/// Hot-reloads the TOML configuration and publishes each successfully parsed
/// version to subscribers.
///
/// Trader actors hold a receiver and read the risk limits from the latest
/// value at the start of every cycle.
pub struct ConfigWatcher {
    path: PathBuf,
    tx: watch::Sender<AppConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver seeded with `initial_config`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, initial_config: AppConfig) -> (Self, watch::Receiver<AppConfig>) {
        let (tx, rx) = watch::channel(initial_config);
        (
            Self {
                path: path.into(),
                tx,
            },
            rx,
        )
    }

    /// Reloads the file once and publishes the result.
    ///
    /// A parse failure keeps the previous configuration in place.
    ///
    /// # Errors
    ///
    /// Returns the loader error when the file cannot be parsed.
    pub fn reload(&self) -> Result<()> {
        let config = ConfigLoader::load_from(&self.path)?;
        self.tx.send_replace(config);
        tracing::info!(path = %self.path.display(), "configuration reloaded");
        Ok(())
    }

    /// Blocks a worker thread on file notifications until the watcher fails.
    ///
    /// # Errors
    ///
    /// Returns an error if file watching cannot be initiated or the worker task panics.
    pub async fn watch(self) -> Result<()> {
        tokio::task::spawn_blocking(move || {
            let (notify_tx, notify_rx) = std::sync::mpsc::channel();

            let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            })?;

            watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

            for event in notify_rx {
                if !event.kind.is_modify() {
                    continue;
                }
                if let Err(e) = self.reload() {
                    tracing::error!(path = %self.path.display(), "config reload rejected: {e:#}");
                }
            }

            Ok::<_, anyhow::Error>(())
        })
        .await??;

        Ok(())
    }
}
