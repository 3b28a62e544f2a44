//! On-disk journal of decision cycles, one pretty-printed JSON file per cycle.

use std::fs;
use std::path::{Path, PathBuf};

use algo_trade_core::{AccountState, Decision, PositionInfo};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::acquisition::{AttemptRecord, FullDecision};

const FILE_PREFIX: &str = "decision_";

/// Everything recorded about one decision cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub cycle_number: u64,
    /// Template id in effect, if any.
    #[serde(default)]
    pub prompt_template: Option<String>,
    #[serde(default)]
    pub system_prompt: String,
    pub input_prompt: String,
    #[serde(default)]
    pub cot_trace: String,
    #[serde(default)]
    pub decision_json: String,
    pub account_state: AccountState,
    #[serde(default)]
    pub positions: Vec<PositionInfo>,
    #[serde(default)]
    pub candidate_coins: Vec<String>,
    #[serde(default)]
    pub decisions: Vec<Decision>,
    #[serde(default)]
    pub execution_log: Vec<String>,
    #[serde(default)]
    pub attempts: Vec<AttemptRecord>,
    pub success: bool,
    #[serde(default)]
    pub error_message: String,
}

impl DecisionRecord {
    /// A record with the cycle inputs filled in and no outcome yet.
    #[must_use]
    pub fn new(cycle_number: u64, account_state: AccountState, positions: Vec<PositionInfo>) -> Self {
        Self {
            timestamp: Utc::now(),
            cycle_number,
            prompt_template: None,
            system_prompt: String::new(),
            input_prompt: String::new(),
            cot_trace: String::new(),
            decision_json: String::new(),
            account_state,
            positions,
            candidate_coins: Vec::new(),
            decisions: Vec::new(),
            execution_log: Vec::new(),
            attempts: Vec::new(),
            success: false,
            error_message: String::new(),
        }
    }

    /// Copies an accepted decision set into the record.
    pub fn apply_decision(&mut self, decision: &FullDecision) {
        self.system_prompt.clone_from(&decision.system_prompt);
        self.input_prompt.clone_from(&decision.user_prompt);
        self.cot_trace.clone_from(&decision.cot_trace);
        self.decision_json = serde_json::to_string_pretty(&decision.decisions).unwrap_or_default();
        self.decisions.clone_from(&decision.decisions);
        self.attempts.clone_from(&decision.attempts);
        self.success = true;
    }

    /// Marks the cycle failed.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.success = false;
        self.error_message = message.into();
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{FILE_PREFIX}{}_cycle{}.json",
            self.timestamp.format("%Y%m%d_%H%M%S"),
            self.cycle_number
        )
    }

    /// True when the system prompt was built from `template`.
    #[must_use]
    pub fn used_template(&self, template: &str) -> bool {
        let template = template.trim();
        !template.is_empty() && {
            let system = self.system_prompt.trim();
            system == template || system.ends_with(template)
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionJournal {
    dir: PathBuf,
}

impl DecisionJournal {
    /// Opens the journal, creating the directory if needed.
    ///
    /// # Errors
    /// Fails when the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create journal directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes one record and returns its path.
    ///
    /// # Errors
    /// Fails on serialization or write errors.
    pub fn log(&self, record: &DecisionRecord) -> Result<PathBuf> {
        let path = self.dir.join(record.file_name());
        let data = serde_json::to_string_pretty(record).context("Failed to serialize decision record")?;
        fs::write(&path, data).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(cycle = record.cycle_number, file = %path.display(), "Decision record saved");
        Ok(path)
    }

    /// Every readable record, oldest first.
    ///
    /// # Errors
    /// Fails when the directory cannot be listed.
    pub fn all_records(&self) -> Result<Vec<DecisionRecord>> {
        self.read_matching(|_| true)
    }

    /// The `n` most recent records, oldest first.
    ///
    /// # Errors
    /// Fails when the directory cannot be listed.
    pub fn latest_records(&self, n: usize) -> Result<Vec<DecisionRecord>> {
        let mut records = Vec::with_capacity(n.min(64));
        for path in self.record_paths(|_| true)?.iter().rev() {
            if records.len() == n {
                break;
            }
            if let Some(record) = read_record(path) {
                records.push(record);
            }
        }
        records.sort_by(chronological);
        Ok(records)
    }

    /// Records written on `date` (UTC), oldest first.
    ///
    /// # Errors
    /// Fails when the directory cannot be listed.
    pub fn records_for_date(&self, date: NaiveDate) -> Result<Vec<DecisionRecord>> {
        let prefix = format!("{FILE_PREFIX}{}_", date.format("%Y%m%d"));
        self.read_matching(|name| name.starts_with(&prefix))
    }

    /// Records whose system prompt came from `template_content`, oldest first.
    ///
    /// # Errors
    /// Fails when the directory cannot be listed.
    pub fn records_for_template(&self, template_content: &str) -> Result<Vec<DecisionRecord>> {
        Ok(self
            .all_records()?
            .into_iter()
            .filter(|r| r.used_template(template_content))
            .collect())
    }

    /// Account equity per record, oldest first, for the last `n` records.
    ///
    /// # Errors
    /// Fails when the directory cannot be listed.
    pub fn equity_series(&self, n: usize) -> Result<Vec<f64>> {
        Ok(self
            .latest_records(n)?
            .into_iter()
            .map(|r| r.account_state.total_equity)
            .filter(|equity| *equity > 0.0)
            .collect())
    }

    /// Deletes records older than `days`.
    ///
    /// # Errors
    /// Fails when the directory cannot be listed.
    pub fn clean_old_records(&self, days: i64) -> Result<usize> {
        self.clean_older_than(Utc::now() - Duration::days(days))
    }

    /// Deletes records stamped before `cutoff`.
    ///
    /// # Errors
    /// Fails when the directory cannot be listed.
    pub fn clean_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut removed = 0;
        for (path, record) in self.read_entries(|_| true)? {
            if record.timestamp >= cutoff {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!(file = %path.display(), error = %e, "Failed to remove old record"),
            }
        }
        if removed > 0 {
            info!(removed, %cutoff, "Cleaned old decision records");
        }
        Ok(removed)
    }

    fn read_matching(&self, filter: impl Fn(&str) -> bool) -> Result<Vec<DecisionRecord>> {
        Ok(self
            .read_entries(filter)?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    fn read_entries(&self, filter: impl Fn(&str) -> bool) -> Result<Vec<(PathBuf, DecisionRecord)>> {
        let mut records: Vec<_> = self
            .record_paths(filter)?
            .into_iter()
            .filter_map(|path| read_record(&path).map(|record| (path, record)))
            .collect();
        records.sort_by(|(_, a), (_, b)| chronological(a, b));
        Ok(records)
    }

    /// Record files accepted by `filter`, ordered by the stamp and cycle in
    /// their names. Nothing is parsed.
    fn record_paths(&self, filter: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read journal directory {}", self.dir.display()))?;

        let mut keyed = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(FILE_PREFIX)
                || path.extension().and_then(|e| e.to_str()) != Some("json")
                || !filter(name)
            {
                continue;
            }
            let key = name_key(name);
            keyed.push((key, path));
        }
        keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(keyed.into_iter().map(|(_, path)| path).collect())
    }
}

/// Sort key from `decision_YYYYMMDD_HHMMSS_cycleN.json`. Names that do not
/// follow the pattern keep their full stem and cycle 0.
fn name_key(name: &str) -> (String, u64) {
    let stem = name
        .trim_start_matches(FILE_PREFIX)
        .trim_end_matches(".json");
    match stem.rsplit_once("_cycle") {
        Some((stamp, cycle)) => match cycle.parse() {
            Ok(cycle) => (stamp.to_string(), cycle),
            Err(_) => (stem.to_string(), 0),
        },
        None => (stem.to_string(), 0),
    }
}

fn read_record(path: &Path) -> Option<DecisionRecord> {
    let parsed = fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|data| serde_json::from_str::<DecisionRecord>(&data).map_err(anyhow::Error::from));
    match parsed {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(file = %path.display(), error = %e, "Skipping unreadable record");
            None
        }
    }
}

fn chronological(a: &DecisionRecord, b: &DecisionRecord) -> std::cmp::Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then(a.cycle_number.cmp(&b.cycle_number))
}
