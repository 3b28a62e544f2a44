use crate::commands::{TraderCommand, TraderStatus};
use algo_trade_decision::DecisionRecord;
use anyhow::Result;
use tokio::sync::{mpsc, oneshot, watch};

/// Cloneable front end of a running trader actor.
#[derive(Clone)]
pub struct TraderHandle {
    tx: mpsc::Sender<TraderCommand>,
    status_rx: watch::Receiver<TraderStatus>,
}

impl TraderHandle {
    #[must_use]
    pub const fn new(tx: mpsc::Sender<TraderCommand>, status_rx: watch::Receiver<TraderStatus>) -> Self {
        Self { tx, status_rx }
    }

    /// Starts the scan loop. The first cycle runs immediately.
    ///
    /// # Errors
    /// Returns an error if the command cannot be sent to the trader actor.
    pub async fn start(&self) -> Result<()> {
        self.tx.send(TraderCommand::Start).await?;
        Ok(())
    }

    /// Stops the scan loop after the cycle in progress.
    ///
    /// # Errors
    /// Returns an error if the command cannot be sent to the trader actor.
    pub async fn stop(&self) -> Result<()> {
        self.tx.send(TraderCommand::Stop).await?;
        Ok(())
    }

    /// Runs one cycle and waits for its journal record.
    ///
    /// # Errors
    /// Returns an error if the actor is gone or drops the reply.
    pub async fn run_cycle(&self) -> Result<DecisionRecord> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(TraderCommand::RunCycle(tx)).await?;
        Ok(rx.await?)
    }

    /// Selects the prompt template for later cycles. `None` uses the base rules only.
    ///
    /// # Errors
    /// Returns an error if the command cannot be sent to the trader actor.
    pub async fn set_prompt(&self, template_id: Option<String>) -> Result<()> {
        self.tx.send(TraderCommand::SetPrompt(template_id)).await?;
        Ok(())
    }

    /// Asks the actor for its status.
    ///
    /// Blocks behind a running cycle; use [`Self::latest_status`] to avoid waiting.
    ///
    /// # Errors
    /// Returns an error if the command cannot be sent or the response cannot be received.
    pub async fn get_status(&self) -> Result<TraderStatus> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(TraderCommand::GetStatus(tx)).await?;
        Ok(rx.await?)
    }

    /// Last status published by the actor.
    #[must_use]
    pub fn latest_status(&self) -> TraderStatus {
        self.status_rx.borrow().clone()
    }

    /// Waits until the actor publishes a new status.
    ///
    /// # Errors
    /// Returns an error once the actor has exited.
    pub async fn status_changed(&mut self) -> Result<TraderStatus> {
        self.status_rx.changed().await?;
        Ok(self.status_rx.borrow_and_update().clone())
    }

    /// Shuts the actor down.
    ///
    /// # Errors
    /// Returns an error if the command cannot be sent to the trader actor.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(TraderCommand::Shutdown).await?;
        Ok(())
    }
}
