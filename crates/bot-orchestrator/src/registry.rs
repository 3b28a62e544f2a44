use crate::commands::TraderStatus;
use crate::trader_actor::{TraderActor, TraderServices};
use crate::trader_handle::TraderHandle;
use algo_trade_core::TraderConfig;
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, RwLock};

/// Running trader actors keyed by trader id.
pub struct TraderRegistry {
    traders: Arc<RwLock<HashMap<String, TraderHandle>>>,
}

impl Default for TraderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TraderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            traders: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Spawns a trader actor in the stopped state.
    ///
    /// # Errors
    /// Returns an error if the id is already registered or the actor cannot
    /// open its journal.
    pub async fn spawn_trader(&self, config: TraderConfig, services: TraderServices) -> Result<TraderHandle> {
        let mut traders = self.traders.write().await;
        if traders.contains_key(&config.trader_id) {
            bail!("Trader {} is already registered", config.trader_id);
        }

        let (tx, rx) = mpsc::channel(32);
        let (status_tx, status_rx) = watch::channel(TraderStatus::stopped(
            config.trader_id.clone(),
            config.prompt_template.clone(),
        ));
        let handle = TraderHandle::new(tx, status_rx);

        let trader_id = config.trader_id.clone();
        let actor = TraderActor::new(config, services, rx, status_tx)?;
        let trader_id_for_task = trader_id.clone();
        tokio::spawn(async move {
            if let Err(e) = actor.run().await {
                tracing::error!("Trader {} error: {}", trader_id_for_task, e);
            }
        });

        traders.insert(trader_id.clone(), handle.clone());
        tracing::info!(trader_id = %trader_id, "Trader registered");
        Ok(handle)
    }

    #[must_use]
    pub async fn get_trader(&self, trader_id: &str) -> Option<TraderHandle> {
        self.traders.read().await.get(trader_id).cloned()
    }

    /// Removes and shuts down the trader with the given id.
    ///
    /// # Errors
    /// Returns an error if the shutdown command cannot be delivered.
    pub async fn remove_trader(&self, trader_id: &str) -> Result<()> {
        let value = self.traders.write().await.remove(trader_id);
        if let Some(handle) = value {
            handle.shutdown().await?;
        }
        Ok(())
    }

    /// Registered trader ids, sorted.
    #[must_use]
    pub async fn list_traders(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.traders.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Latest published status of every trader, sorted by id.
    #[must_use]
    pub async fn statuses(&self) -> Vec<TraderStatus> {
        let mut statuses: Vec<TraderStatus> = self
            .traders
            .read()
            .await
            .values()
            .map(TraderHandle::latest_status)
            .collect();
        statuses.sort_by(|a, b| a.trader_id.cmp(&b.trader_id));
        statuses
    }

    /// Starts every registered trader.
    ///
    /// # Errors
    /// Returns an error if any start command cannot be delivered.
    pub async fn start_all(&self) -> Result<()> {
        let handles: Vec<_> = self.traders.read().await.values().cloned().collect();
        for handle in handles {
            handle.start().await?;
        }
        Ok(())
    }

    /// Shuts down all traders in the registry.
    ///
    /// # Errors
    /// Returns an error if any trader shutdown fails.
    pub async fn shutdown_all(&self) -> Result<()> {
        let handles: Vec<_> = self.traders.write().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            handle.shutdown().await?;
        }
        Ok(())
    }
}
