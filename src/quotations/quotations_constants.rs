/// Measurement (table) holding foreign quotation points
pub const FOREIGN_QUOTATION_TABLE: &str = "foreignquotation";

/// Wire layout for the stored timestamp column (UTC, whole seconds)
pub const QUOTATION_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Lookback window for the symbol catalog
pub const SYMBOL_LOOKBACK_DAYS: i64 = 7;

/// Rows per batch statement when flushing buffered points
pub const QUOTATION_FLUSH_CHUNK_SIZE: usize = 500;
