//! Price and membership data access.
//!
//! The engine reads through the [`DataSource`] trait; production hosts back
//! it with their own store, and [`MemoryDataSource`] (plus its CSV loaders)
//! covers tests and standalone use.

use crate::error::{EngineError, Result};
use crate::types::{MembershipRecord, PriceRecord};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::info;

/// Read-only contract the selection engine runs against.
///
/// Implementations must be safe to share across threads so that independent
/// evaluation windows can run in parallel.
pub trait DataSource: Send + Sync {
    /// Sorted distinct trading days with any price in `[start, end]`.
    fn distinct_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>>;

    /// Symbols with an index-membership interval covering `day`.
    fn memberships_active_at(&self, day: NaiveDate) -> Result<Vec<String>>;

    /// All price rows for the given symbols in `[start, end]`. Row order is
    /// unspecified; callers must not depend on it.
    fn prices(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>>;
}

/// In-memory [`DataSource`] over plain record vectors.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataSource {
    prices: HashMap<String, BTreeMap<NaiveDate, f64>>,
    memberships: Vec<MembershipRecord>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from record vectors. Duplicate (symbol, date) price keys keep
    /// the last value seen.
    pub fn from_records(prices: Vec<PriceRecord>, memberships: Vec<MembershipRecord>) -> Self {
        let mut source = Self::new();
        for record in prices {
            source.add_price(record);
        }
        for record in memberships {
            source.add_membership(record);
        }
        source
    }

    pub fn add_price(&mut self, record: PriceRecord) {
        self.prices
            .entry(record.symbol)
            .or_default()
            .insert(record.date, record.price_adj);
    }

    pub fn add_membership(&mut self, record: MembershipRecord) {
        self.memberships.push(record);
    }

    /// Load price rows from a CSV file with a `symbol,date,price_adj` header.
    pub fn load_prices_csv(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let header = ColumnMap::new(reader.headers()?, &["symbol", "date", "price_adj"])?;

        let mut count = 0;
        for row in reader.records() {
            let row = row?;
            let symbol = header.field(&row, 0)?.to_string();
            let date = NaiveDate::parse_from_str(header.field(&row, 1)?, "%Y-%m-%d")?;
            let price_adj = header
                .field(&row, 2)?
                .parse::<f64>()
                .map_err(|e| EngineError::Data(format!("bad price_adj: {e}")))?;
            self.add_price(PriceRecord::new(symbol, date, price_adj));
            count += 1;
        }
        info!(rows = count, "loaded price CSV");
        Ok(count)
    }

    /// Load membership rows from a CSV file with a
    /// `symbol,start_date,end_date` header. An empty `end_date` means the
    /// membership is still open.
    pub fn load_memberships_csv(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let header = ColumnMap::new(reader.headers()?, &["symbol", "start_date", "end_date"])?;

        let mut count = 0;
        for row in reader.records() {
            let row = row?;
            let symbol = header.field(&row, 0)?.to_string();
            let start_date = NaiveDate::parse_from_str(header.field(&row, 1)?, "%Y-%m-%d")?;
            let end_raw = header.field(&row, 2)?;
            let end_date = if end_raw.is_empty() {
                None
            } else {
                Some(NaiveDate::parse_from_str(end_raw, "%Y-%m-%d")?)
            };
            self.add_membership(MembershipRecord::new(symbol, start_date, end_date));
            count += 1;
        }
        info!(rows = count, "loaded membership CSV");
        Ok(count)
    }
}

impl DataSource for MemoryDataSource {
    fn distinct_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
        let mut dates = BTreeSet::new();
        for series in self.prices.values() {
            for (&date, _) in series.range(start..=end) {
                dates.insert(date);
            }
        }
        Ok(dates.into_iter().collect())
    }

    fn memberships_active_at(&self, day: NaiveDate) -> Result<Vec<String>> {
        let symbols: BTreeSet<&str> = self
            .memberships
            .iter()
            .filter(|m| m.covers(day))
            .map(|m| m.symbol.as_str())
            .collect();
        Ok(symbols.into_iter().map(String::from).collect())
    }

    fn prices(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>> {
        let mut rows = Vec::new();
        for symbol in symbols {
            if let Some(series) = self.prices.get(symbol) {
                for (&date, &price_adj) in series.range(start..=end) {
                    rows.push(PriceRecord::new(symbol.clone(), date, price_adj));
                }
            }
        }
        Ok(rows)
    }
}

/// Header-name to column-index resolution for the CSV loaders.
struct ColumnMap {
    indices: Vec<usize>,
}

impl ColumnMap {
    fn new(headers: &csv::StringRecord, names: &[&str]) -> Result<Self> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let index = headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| EngineError::Data(format!("missing CSV column: {name}")))?;
            indices.push(index);
        }
        Ok(Self { indices })
    }

    fn field<'a>(&self, row: &'a csv::StringRecord, slot: usize) -> Result<&'a str> {
        row.get(self.indices[slot])
            .map(str::trim)
            .ok_or_else(|| EngineError::Data("short CSV row".to_string()))
    }
}
