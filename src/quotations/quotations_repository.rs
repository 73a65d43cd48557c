use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveTime, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Text;
use log::error;

use super::quotations_buffer::QuotationWriteBuffer;
use super::quotations_constants::{FOREIGN_QUOTATION_TABLE, SYMBOL_LOOKBACK_DAYS};
use super::quotations_errors::{QuotationError, Result};
use super::quotations_model::{
    format_timestamp, ForeignQuotation, LatestQuotationRow, PriceRow, QuotationPointDB, SymbolRow,
};
use crate::db::{get_connection, DbPool};

/// Store-session handle for foreign quotations. Clones share the same
/// connection pool and write buffer.
#[derive(Clone)]
pub struct QuotationRepository {
    pool: Arc<DbPool>,
    buffer: Arc<QuotationWriteBuffer>,
}

impl QuotationRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self {
            pool,
            buffer: Arc::new(QuotationWriteBuffer::new()),
        }
    }

    /// Stores a quotation point and flushes the write buffer. A point that
    /// cannot be built is logged and dropped; previously buffered points are
    /// still flushed. Success means every buffered point, including this one,
    /// was accepted by the store.
    pub fn save_quotation(&self, quotation: &ForeignQuotation) -> Result<()> {
        let point = match QuotationPointDB::try_from(quotation) {
            Ok(point) => Some(point),
            Err(e) => {
                error!("Failed to build quotation point: {}", e);
                None
            }
        };

        let mut conn = get_connection(&self.pool)?;
        self.buffer.submit(point, &mut conn)
    }

    /// Returns the last quotation of `symbol` on `source` strictly before
    /// `timestamp`. A query that matches no rows yields the zero-valued
    /// record; callers detect emptiness by field inspection.
    pub fn get_quotation_before(
        &self,
        symbol: &str,
        source: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<ForeignQuotation> {
        let mut conn = get_connection(&self.pool)?;

        let rows: Vec<LatestQuotationRow> = sql_query(format!(
            "SELECT timestamp, price, price_yesterday, volume_yesterday_usd, name \
             FROM {} \
             WHERE source = ? AND symbol = ? AND timestamp < ? \
             ORDER BY timestamp DESC LIMIT 1",
            FOREIGN_QUOTATION_TABLE
        ))
        .bind::<Text, _>(source)
        .bind::<Text, _>(symbol)
        .bind::<Text, _>(format_timestamp(&timestamp))
        .load(&mut conn)?;

        Ok(rows
            .into_iter()
            .next()
            .map(|row| row.into_quotation(symbol, source))
            .unwrap_or_default())
    }

    /// Returns the average price of `symbol` on `source` over the preceding
    /// full calendar day, delimited by the caller's local wall clock.
    pub fn get_average_price_yesterday(&self, symbol: &str, source: &str) -> Result<f64> {
        let (start, end) = yesterday_window(Local::now().fixed_offset());
        self.get_average_price(symbol, source, start, end)
    }

    fn get_average_price(
        &self,
        symbol: &str,
        source: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64> {
        let mut conn = get_connection(&self.pool)?;

        let rows: Vec<PriceRow> = sql_query(format!(
            "SELECT price FROM {} \
             WHERE source = ? AND symbol = ? AND timestamp >= ? AND timestamp < ?",
            FOREIGN_QUOTATION_TABLE
        ))
        .bind::<Text, _>(source)
        .bind::<Text, _>(symbol)
        .bind::<Text, _>(format_timestamp(&start))
        .bind::<Text, _>(format_timestamp(&end))
        .load(&mut conn)?;

        // Simple average; an undecodable price reduces the sample count
        // instead of aborting the computation.
        let mut sum = 0.0;
        let mut samples = 0usize;
        for row in &rows {
            match row.price {
                Some(price) => {
                    sum += price;
                    samples += 1;
                }
                None => error!("Skipping quotation row with undecodable price"),
            }
        }

        if samples == 0 {
            return Err(QuotationError::NoData(
                "no data available from yesterday".to_string(),
            ));
        }
        Ok(sum / samples as f64)
    }

    /// Returns the distinct symbols quoted by `source` within the last
    /// 7 days, in order of first observation.
    pub fn get_symbols_by_source(&self, source: &str) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let cutoff = Utc::now() - Duration::days(SYMBOL_LOOKBACK_DAYS);

        let rows: Vec<SymbolRow> = sql_query(format!(
            "SELECT symbol, source FROM {} \
             WHERE source = ? AND timestamp > ? \
             ORDER BY timestamp ASC",
            FOREIGN_QUOTATION_TABLE
        ))
        .bind::<Text, _>(source)
        .bind::<Text, _>(format_timestamp(&cutoff))
        .load(&mut conn)?;

        let mut seen = HashSet::new();
        let mut symbols = Vec::new();
        for row in rows {
            if seen.insert(row.symbol.clone()) {
                symbols.push(row.symbol);
            }
        }
        Ok(symbols)
    }
}

/// Window covering the full calendar day preceding `now`, resolved in the
/// caller's current UTC offset. Fixed offsets have no DST gaps, so local
/// midnight always exists.
pub(crate) fn yesterday_window(now: DateTime<FixedOffset>) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    let end = midnight.and_utc() - Duration::seconds(i64::from(now.offset().local_minus_utc()));
    (end - Duration::hours(24), end)
}
