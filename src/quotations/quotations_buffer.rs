use std::sync::Mutex;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::debug;

use super::quotations_constants::QUOTATION_FLUSH_CHUNK_SIZE;
use super::quotations_errors::Result;
use super::quotations_model::QuotationPointDB;
use crate::schema::foreignquotation;

/// Accumulation buffer for pending quotation points, shared by every clone of
/// the owning repository handle. Append-then-flush runs under a single lock
/// so concurrent submissions cannot interleave flushes.
#[derive(Debug, Default)]
pub struct QuotationWriteBuffer {
    pending: Mutex<Vec<QuotationPointDB>>,
}

impl QuotationWriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `point` (when construction produced one) and flushes the
    /// entire buffer to the store in one immediate transaction. The buffer is
    /// cleared on success; on failure the points are retained for the next
    /// flush and the error goes to the caller that triggered it.
    pub(crate) fn submit(
        &self,
        point: Option<QuotationPointDB>,
        conn: &mut SqliteConnection,
    ) -> Result<()> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(point) = point {
            pending.push(point);
        }
        if pending.is_empty() {
            return Ok(());
        }

        conn.immediate_transaction(|conn| -> diesel::QueryResult<()> {
            for chunk in pending.chunks(QUOTATION_FLUSH_CHUNK_SIZE) {
                diesel::replace_into(foreignquotation::table)
                    .values(chunk)
                    .execute(conn)?;
            }
            Ok(())
        })?;

        debug!("Flushed {} quotation point(s)", pending.len());
        pending.clear();
        Ok(())
    }
}
