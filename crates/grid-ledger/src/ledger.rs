//! Append-only CSV trade ledger.
//!
//! Each executed or implied leg becomes one CSV row. The file is opened in
//! append mode so an interrupted run never truncates history; the header
//! row is written exactly once, the first time the file is empty.

use crate::error::LedgerResult;
use chrono::{DateTime, Utc};
use grid_core::{Price, Qty, Side};
use rust_decimal::Decimal;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub side: Side,
    pub price: Price,
    pub qty: Qty,
    /// Estimated profit of the leg against the price at logging time.
    /// Absent when no reference price was available.
    pub estimated_profit: Option<Decimal>,
}

impl TradeRecord {
    /// Record a leg now, estimating profit against `current_price`.
    ///
    /// Buy legs profit when the market is above the order price; sell legs
    /// when it is below.
    pub fn now(side: Side, price: Price, qty: Qty, current_price: Price) -> Self {
        let estimated_profit = match side {
            Side::Buy => current_price.inner() - price.inner(),
            Side::Sell => price.inner() - current_price.inner(),
        };
        Self {
            timestamp: Utc::now(),
            side,
            price,
            qty,
            estimated_profit: Some(estimated_profit),
        }
    }

    pub fn csv_header() -> &'static str {
        "timestamp,side,price,quantity,profit"
    }

    pub fn to_csv_line(&self) -> String {
        let profit = self
            .estimated_profit
            .map(|p| p.to_string())
            .unwrap_or_default();
        format!(
            "{},{},{},{},{}",
            self.timestamp.to_rfc3339(),
            self.side,
            self.price,
            self.qty,
            profit
        )
    }
}

/// CSV writer for trade records.
pub struct TradeLedger {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl TradeLedger {
    /// Create a ledger that appends to `path`. The file is opened lazily
    /// on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, writing the header first if the file is empty.
    pub fn append(&mut self, record: &TradeRecord) -> LedgerResult<()> {
        if self.writer.is_none() {
            self.open()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", record.to_csv_line())?;
            // Flush per record: a crash between polls must not lose legs.
            writer.flush()?;
        }
        Ok(())
    }

    fn open(&mut self) -> LedgerResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = BufWriter::new(file);
        if is_empty {
            writeln!(writer, "{}", TradeRecord::csv_header())?;
            writer.flush()?;
        }

        info!(path = %self.path.display(), "Opened trade ledger (append mode)");
        self.writer = Some(writer);
        Ok(())
    }
}

impl Drop for TradeLedger {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                warn!(error = %e, "Failed to flush trade ledger on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn sample_record(side: Side, price: Decimal) -> TradeRecord {
        TradeRecord::now(
            side,
            Price::new(price),
            Qty::new(dec!(0.0018)),
            Price::new(dec!(50000)),
        )
    }

    #[test]
    fn test_header_written_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");

        {
            let mut ledger = TradeLedger::new(&path);
            ledger.append(&sample_record(Side::Buy, dec!(49960))).unwrap();
        }
        {
            // Reopening an existing non-empty file must not repeat the header.
            let mut ledger = TradeLedger::new(&path);
            ledger.append(&sample_record(Side::Sell, dec!(50040))).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], TradeRecord::csv_header());
        assert!(lines[1].contains("buy"));
        assert!(lines[2].contains("sell"));
        assert_eq!(
            contents.matches(TradeRecord::csv_header()).count(),
            1,
            "header must appear exactly once"
        );
    }

    #[test]
    fn test_estimated_profit_sign() {
        // Buy at 49960 with market at 50000: profit 40.
        let buy = sample_record(Side::Buy, dec!(49960));
        assert_eq!(buy.estimated_profit, Some(dec!(40)));

        // Sell at 50040 with market at 50000: profit 40.
        let sell = sample_record(Side::Sell, dec!(50040));
        assert_eq!(sell.estimated_profit, Some(dec!(40)));

        // Sell below the market books a negative estimate.
        let bad_sell = sample_record(Side::Sell, dec!(49900));
        assert_eq!(bad_sell.estimated_profit, Some(dec!(-100)));
    }

    #[test]
    fn test_csv_line_format() {
        let record = TradeRecord {
            timestamp: DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
            side: Side::Buy,
            price: Price::new(dec!(50040)),
            qty: Qty::new(dec!(0.0018)),
            estimated_profit: None,
        };
        assert_eq!(
            record.to_csv_line(),
            "2024-01-02T03:04:05+00:00,buy,50040,0.0018,"
        );
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/trades.csv");

        let mut ledger = TradeLedger::new(&path);
        ledger.append(&sample_record(Side::Buy, dec!(49960))).unwrap();

        assert!(path.exists());
    }
}
