use std::sync::Arc;
use std::time::Duration;

use algo_trade_core::{
    normalize_symbol, AccountSource, AppConfig, CandidateCoin, CandleSource, DecisionSink, ReasoningClient,
    TraderConfig,
};
use algo_trade_decision::{
    build_system_prompt, build_user_prompt, extract_cot_trace, DecisionAcquisition, DecisionContext,
    DecisionJournal, DecisionRecord, DecisionValidator, PromptRepository,
};
use algo_trade_ledger::sharpe_ratio;
use algo_trade_market::MarketSnapshotBuilder;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::commands::{TraderCommand, TraderState, TraderStatus};

/// Journal records used for the Sharpe ratio shown to the model.
pub const SHARPE_LOOKBACK: usize = 100;

/// Candidate source tag for symbols listed in the trader config.
const CONFIG_SOURCE: &str = "AI500";

/// Collaborators one trader needs to run a cycle.
#[derive(Clone)]
pub struct TraderServices {
    pub candles: Arc<dyn CandleSource>,
    pub reasoning: Arc<dyn ReasoningClient>,
    pub account: Arc<dyn AccountSource>,
    pub sink: Arc<dyn DecisionSink>,
    pub prompts: Arc<PromptRepository>,
    /// Latest application config; risk and market limits are read from it every cycle.
    pub app_config: watch::Receiver<AppConfig>,
}

pub struct TraderActor {
    config: TraderConfig,
    services: TraderServices,
    journal: DecisionJournal,
    rx: mpsc::Receiver<TraderCommand>,
    status_tx: watch::Sender<TraderStatus>,
    state: TraderState,
    started_at: Option<DateTime<Utc>>,
    cycle_count: u64,
}

impl TraderActor {
    /// # Errors
    /// Fails when the journal directory cannot be created.
    pub fn new(
        config: TraderConfig,
        services: TraderServices,
        rx: mpsc::Receiver<TraderCommand>,
        status_tx: watch::Sender<TraderStatus>,
    ) -> Result<Self> {
        let journal = DecisionJournal::open(&config.journal_dir)
            .with_context(|| format!("Failed to open journal for trader {}", config.trader_id))?;
        // Continue numbering after a restart
        let cycle_count = journal
            .latest_records(1)
            .ok()
            .and_then(|records| records.last().map(|r| r.cycle_number))
            .unwrap_or(0);

        Ok(Self {
            config,
            services,
            journal,
            rx,
            status_tx,
            state: TraderState::Stopped,
            started_at: None,
            cycle_count,
        })
    }

    pub async fn run(mut self) -> Result<()> {
        tracing::info!(trader_id = %self.config.trader_id, "Trader starting");

        let period = Duration::from_secs(self.config.scan_interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    let was_running = self.state == TraderState::Running;
                    if !self.handle_command(cmd).await {
                        break;
                    }
                    if !was_running && self.state == TraderState::Running {
                        ticker.reset_immediately();
                    }
                }
                _ = ticker.tick(), if self.state == TraderState::Running => {
                    self.run_cycle().await;
                }
            }
        }

        tracing::info!(trader_id = %self.config.trader_id, "Trader stopped");
        Ok(())
    }

    /// Returns false when the actor should exit.
    async fn handle_command(&mut self, cmd: TraderCommand) -> bool {
        match cmd {
            TraderCommand::Start => {
                if self.state == TraderState::Running {
                    tracing::warn!(trader_id = %self.config.trader_id, "Trader already running, ignoring start");
                    return true;
                }
                tracing::info!(
                    trader_id = %self.config.trader_id,
                    interval_secs = self.config.scan_interval_secs,
                    "Trader running"
                );
                self.state = TraderState::Running;
                self.started_at = Some(Utc::now());
                self.publish(|_| {});
            }
            TraderCommand::Stop => {
                if self.state == TraderState::Stopped {
                    tracing::warn!(trader_id = %self.config.trader_id, "Trader already stopped, ignoring stop");
                    return true;
                }
                tracing::info!(trader_id = %self.config.trader_id, "Trader stopping");
                self.state = TraderState::Stopped;
                self.publish(|_| {});
            }
            TraderCommand::RunCycle(reply) => {
                let record = self.run_cycle().await;
                let _ = reply.send(record);
            }
            TraderCommand::SetPrompt(template_id) => {
                tracing::info!(trader_id = %self.config.trader_id, template = ?template_id, "Prompt template changed");
                self.config.prompt_template = template_id;
                self.publish(|_| {});
            }
            TraderCommand::GetStatus(reply) => {
                let _ = reply.send(self.status_tx.borrow().clone());
            }
            TraderCommand::Shutdown => {
                tracing::info!(trader_id = %self.config.trader_id, "Trader shutting down");
                self.state = TraderState::Stopped;
                self.publish(|_| {});
                return false;
            }
        }
        true
    }

    /// Runs one cycle end to end and journals it, successful or not.
    async fn run_cycle(&mut self) -> DecisionRecord {
        self.cycle_count += 1;
        let cycle = self.cycle_count;
        tracing::info!(trader_id = %self.config.trader_id, cycle, "Decision cycle started");

        let record = match self.decide(cycle).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(trader_id = %self.config.trader_id, cycle, error = %e, "Decision cycle aborted");
                let account = self.services.account.account_state().await.unwrap_or_default();
                let mut record = DecisionRecord::new(cycle, account, Vec::new());
                record.prompt_template.clone_from(&self.config.prompt_template);
                record.fail(format!("{e:#}"));
                record
            }
        };

        if let Err(e) = self.journal.log(&record) {
            tracing::warn!(trader_id = %self.config.trader_id, cycle, error = %e, "Failed to journal cycle");
        }

        let sharpe = self.current_sharpe();
        if record.success {
            tracing::info!(
                trader_id = %self.config.trader_id,
                cycle,
                decisions = record.decisions.len(),
                "Decision cycle complete"
            );
        }
        self.publish(|status| {
            status.last_cycle_at = Some(record.timestamp);
            status.last_cycle_success = Some(record.success);
            status.last_error = (!record.success).then(|| record.error_message.clone());
            status.last_sharpe = sharpe;
            status.total_equity = Some(record.account_state.total_equity);
        });
        record
    }

    /// Snapshots → context → acquisition → sink.
    ///
    /// Errors are limited to account and market data failures; a decision the
    /// model cannot get right is recorded on the returned record instead.
    async fn decide(&self, cycle: u64) -> Result<DecisionRecord> {
        let app = self.services.app_config.borrow().clone();

        let account = self
            .services
            .account
            .account_state()
            .await
            .context("Failed to read account state")?;
        let mut positions = self
            .services
            .account
            .open_positions()
            .await
            .context("Failed to read open positions")?;
        for position in &mut positions {
            position.symbol = normalize_symbol(&position.symbol);
        }
        let candidate_symbols = normalized_candidates(&self.config.candidates);

        let mut record = DecisionRecord::new(cycle, account.clone(), positions.clone());
        record.prompt_template.clone_from(&self.config.prompt_template);
        record.candidate_coins.clone_from(&candidate_symbols);

        let held: Vec<String> = positions.iter().map(|p| p.symbol.clone()).collect();
        let builder = MarketSnapshotBuilder::new(Arc::clone(&self.services.candles), &app.market);
        let universe = builder.build_universe(&held, &candidate_symbols).await?;
        if !universe.illiquid.is_empty() {
            tracing::info!(trader_id = %self.config.trader_id, symbols = ?universe.illiquid, "Skipped illiquid candidates");
        }

        let candidates = candidate_symbols
            .into_iter()
            .map(|symbol| CandidateCoin::new(symbol).with_source(CONFIG_SOURCE))
            .collect();
        let now = Utc::now();
        let ctx = DecisionContext {
            current_time: now,
            cycle_number: cycle,
            runtime_minutes: self.started_at.map_or(0, |t| (now - t).num_minutes()),
            account,
            positions,
            candidates,
            snapshots: universe.snapshots,
            sharpe: self.current_sharpe(),
        };

        let template = self
            .config
            .prompt_template
            .as_deref()
            .and_then(|id| self.services.prompts.get(id));
        if let (Some(id), None) = (&self.config.prompt_template, &template) {
            tracing::warn!(trader_id = %self.config.trader_id, template = %id, "Prompt template not found, using base rules");
        }
        let system_prompt = build_system_prompt(
            &app.risk,
            template.as_ref().map(|t| t.content.as_str()),
            self.config.override_base_prompt,
        );
        let user_prompt = build_user_prompt(&ctx);

        let acquisition = DecisionAcquisition::new(
            Arc::clone(&self.services.reasoning),
            DecisionValidator::new(app.risk.clone()),
        );
        match acquisition
            .acquire(&system_prompt, &user_prompt, &ctx.validation_context())
            .await
        {
            Ok(decision) => {
                record.apply_decision(&decision);
                match self.services.sink.submit(&decision.decisions).await {
                    Ok(log) => record.execution_log = log,
                    Err(e) => {
                        tracing::error!(trader_id = %self.config.trader_id, cycle, error = %e, "Decision sink failed");
                        record.execution_log.push(format!("submission failed: {e:#}"));
                    }
                }
            }
            Err(e) => {
                tracing::warn!(trader_id = %self.config.trader_id, cycle, error = %e, "No valid decision this cycle");
                record.system_prompt = system_prompt;
                record.input_prompt = user_prompt;
                if let Some(raw) = e.last_response() {
                    record.cot_trace = extract_cot_trace(raw);
                }
                record.attempts = e.attempts().to_vec();
                record.fail(e.to_string());
            }
        }

        Ok(record)
    }

    /// Sharpe over the recent journal, `None` until two snapshots exist.
    fn current_sharpe(&self) -> Option<f64> {
        match self.journal.equity_series(SHARPE_LOOKBACK) {
            Ok(equity) if equity.len() >= 2 => Some(sharpe_ratio(&equity)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(trader_id = %self.config.trader_id, error = %e, "Failed to read equity history");
                None
            }
        }
    }

    fn publish(&self, update: impl FnOnce(&mut TraderStatus)) {
        self.status_tx.send_modify(|status| {
            status.state = self.state;
            status.prompt_template.clone_from(&self.config.prompt_template);
            status.started_at = self.started_at;
            status.cycle_count = self.cycle_count;
            update(status);
        });
    }
}

/// Configured candidates in exchange form, first occurrence kept.
fn normalized_candidates(symbols: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(symbols.len());
    for symbol in symbols.iter().map(|s| normalize_symbol(s)) {
        if !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_candidates() {
        let raw = vec!["sol".to_string(), "BTCUSDT".to_string(), " Sol ".to_string(), "ethusdt".to_string()];
        assert_eq!(normalized_candidates(&raw), vec!["SOLUSDT", "BTCUSDT", "ETHUSDT"]);
    }
}
