use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{DeepqError, Result};

/// One day of historical market data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: String,
    pub open: f32,
    pub high: f32,
    pub low: f32,
    pub close: f32,
    pub volume: f32,
}

/// An ordered, cleaned window of daily price records, indexed by day.
///
/// Raw exports routinely contain null or zero entries on days the exchange
/// reported nothing; cleaning fills those forward from the previous close
/// (previous volume for the volume column). Once constructed the series is
/// read-only.
#[derive(Clone, Debug)]
pub struct PriceSeries {
    records: Vec<PriceRecord>,
}

fn unusable(value: f32) -> bool {
    !value.is_finite() || value == 0.0
}

impl PriceSeries {
    /// Clean and adopt a window of raw records.
    ///
    /// Fails when the window is empty, too short to trade on, or the first
    /// record is itself unusable (there is nothing to fill forward from).
    pub fn new(mut records: Vec<PriceRecord>) -> Result<Self> {
        if records.len() < 2 {
            return Err(DeepqError::DataError(format!(
                "price series needs at least 2 records, got {}",
                records.len()
            )));
        }
        let first = &records[0];
        if unusable(first.open)
            || unusable(first.high)
            || unusable(first.low)
            || unusable(first.close)
        {
            return Err(DeepqError::DataError(
                "first record has no usable price to fill forward from".to_string(),
            ));
        }

        for i in 1..records.len() {
            let prev_close = records[i - 1].close;
            let prev_volume = records[i - 1].volume;
            let record = &mut records[i];
            if unusable(record.open) {
                record.open = prev_close;
            }
            if unusable(record.high) {
                record.high = prev_close;
            }
            if unusable(record.low) {
                record.low = prev_close;
            }
            if unusable(record.close) {
                record.close = prev_close;
            }
            if unusable(record.volume) {
                record.volume = prev_volume;
            }
        }

        Ok(PriceSeries { records })
    }

    /// Load a JSON array of records from disk.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let records: Vec<PriceRecord> = serde_json::from_str(&raw)?;
        Self::new(records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The cleaned record for a day. Panics when `day` is outside the window.
    pub fn record(&self, day: usize) -> &PriceRecord {
        &self.records[day]
    }

    /// Opening price on the given day. Panics when `day` is outside the window.
    pub fn open(&self, day: usize) -> f32 {
        self.records[day].open
    }

    pub fn last_day(&self) -> usize {
        self.records.len() - 1
    }
}
