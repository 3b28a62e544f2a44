use std::fs::File;
use std::path::{Path, PathBuf};

use algo_trade_core::{Fill, FillLedger};
use anyhow::{Context, Result};
use async_trait::async_trait;
use csv::{Reader, Writer};

/// Fill ledger backed by a CSV file.
///
/// Columns: `trade_id,order_id,symbol,price,quantity,commission,commission_asset,is_buyer,is_maker,timestamp`,
/// with RFC 3339 timestamps.
#[derive(Debug, Clone)]
pub struct CsvFillLedger {
    path: PathBuf,
}

impl CsvFillLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every fill in file order.
    ///
    /// # Errors
    /// Fails when the file cannot be opened or a row does not parse.
    pub fn read(&self) -> Result<Vec<Fill>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open fill ledger {}", self.path.display()))?;
        let mut reader = Reader::from_reader(file);

        reader
            .deserialize::<Fill>()
            .enumerate()
            .map(|(i, row)| row.with_context(|| format!("Invalid fill at row {}", i + 2)))
            .collect()
    }

    /// Overwrites the file with `fills`, sorted by timestamp.
    ///
    /// # Errors
    /// Fails when the file cannot be created or written.
    pub fn write(&self, fills: &[Fill]) -> Result<()> {
        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create fill ledger {}", self.path.display()))?;
        let mut writer = Writer::from_writer(file);

        let mut sorted = fills.to_vec();
        sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.trade_id.cmp(&b.trade_id)));
        for fill in &sorted {
            writer.serialize(fill)?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl FillLedger for CsvFillLedger {
    async fn fills(&self) -> Result<Vec<Fill>> {
        let ledger = self.clone();
        tokio::task::spawn_blocking(move || ledger.read())
            .await
            .context("Fill ledger read task failed")?
    }
}
