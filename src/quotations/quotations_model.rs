use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use log::error;
use serde::{Deserialize, Serialize};

use super::quotations_constants::QUOTATION_TIME_FORMAT;
use super::quotations_errors::QuotationError;

/// Domain model representing one observed price point for an asset from a
/// named external feed. The zero value (`Default`) is what point queries
/// return for an empty result, with the timestamp at the Unix epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignQuotation {
    pub symbol: String,
    pub name: String,
    pub source: String,
    pub price: f64,
    pub price_yesterday: f64,
    #[serde(rename = "volumeYesterdayUSD")]
    pub volume_yesterday_usd: f64,
    pub timestamp: DateTime<Utc>,
}

/// Database model for a stored quotation point. Tags (`symbol`, `name`) and
/// the timestamp key are always present; field columns are nullable at the
/// store level, so rows written by other producers may omit them.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::foreignquotation)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct QuotationPointDB {
    pub symbol: String,
    pub name: String,
    pub timestamp: String,
    pub price: f64,
    pub price_yesterday: f64,
    pub source: String,
    pub volume_yesterday_usd: f64,
}

impl TryFrom<&ForeignQuotation> for QuotationPointDB {
    type Error = QuotationError;

    fn try_from(quotation: &ForeignQuotation) -> Result<Self, Self::Error> {
        if quotation.symbol.is_empty() {
            return Err(QuotationError::InvalidPoint(
                "symbol tag is empty".to_string(),
            ));
        }
        if quotation.source.is_empty() {
            return Err(QuotationError::InvalidPoint(
                "source field is empty".to_string(),
            ));
        }
        for (field, value) in [
            ("price", quotation.price),
            ("priceYesterday", quotation.price_yesterday),
            ("volumeYesterdayUSD", quotation.volume_yesterday_usd),
        ] {
            if !value.is_finite() {
                return Err(QuotationError::InvalidPoint(format!(
                    "{} is not a finite number: {}",
                    field, value
                )));
            }
        }

        Ok(Self {
            symbol: quotation.symbol.clone(),
            name: quotation.name.clone(),
            timestamp: format_timestamp(&quotation.timestamp),
            price: quotation.price,
            price_yesterday: quotation.price_yesterday,
            source: quotation.source.clone(),
            volume_yesterday_usd: quotation.volume_yesterday_usd,
        })
    }
}

/// Typed row for the latest-before query
#[derive(QueryableByName, Debug)]
pub struct LatestQuotationRow {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub timestamp: String,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Double>)]
    pub price: Option<f64>,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Double>)]
    pub price_yesterday: Option<f64>,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Double>)]
    pub volume_yesterday_usd: Option<f64>,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    pub name: Option<String>,
}

impl LatestQuotationRow {
    /// Maps the row into a domain record. `symbol` and `source` come from the
    /// call's inputs since they were the query filters. Each field decodes
    /// independently; a missing or malformed value is logged and left at its
    /// zero value.
    pub(crate) fn into_quotation(self, symbol: &str, source: &str) -> ForeignQuotation {
        let timestamp = match NaiveDateTime::parse_from_str(&self.timestamp, QUOTATION_TIME_FORMAT)
        {
            Ok(parsed) => parsed.and_utc(),
            Err(e) => {
                error!(
                    "Failed to parse quotation timestamp {:?}: {}",
                    self.timestamp, e
                );
                DateTime::<Utc>::default()
            }
        };

        ForeignQuotation {
            symbol: symbol.to_string(),
            name: self.name.unwrap_or_else(|| {
                error!("Quotation row has no name value, defaulting to empty");
                String::new()
            }),
            source: source.to_string(),
            price: field_or_zero(self.price, "price"),
            price_yesterday: field_or_zero(self.price_yesterday, "priceYesterday"),
            volume_yesterday_usd: field_or_zero(self.volume_yesterday_usd, "volumeYesterdayUSD"),
            timestamp,
        }
    }
}

/// Typed row for the yesterday-average query
#[derive(QueryableByName, Debug)]
pub struct PriceRow {
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Double>)]
    pub price: Option<f64>,
}

/// Typed row for the symbol catalog query
#[derive(QueryableByName, Debug)]
pub struct SymbolRow {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub symbol: String,
}

pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(QUOTATION_TIME_FORMAT).to_string()
}

fn field_or_zero(value: Option<f64>, field: &str) -> f64 {
    value.unwrap_or_else(|| {
        error!("Quotation row has no {} value, defaulting to 0", field);
        0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_quotation() -> ForeignQuotation {
        ForeignQuotation {
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            source: "CoinGecko".to_string(),
            price: 41230.55,
            price_yesterday: 40800.0,
            volume_yesterday_usd: 1_250_000.0,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_point_construction_roundtrip() {
        let point = QuotationPointDB::try_from(&sample_quotation()).unwrap();
        assert_eq!(point.symbol, "BTC");
        assert_eq!(point.timestamp, "2024-05-01T10:30:00Z");
        assert_eq!(point.price, 41230.55);
    }

    #[test]
    fn test_point_construction_accepts_zero_price() {
        let mut quotation = sample_quotation();
        quotation.price = 0.0;
        quotation.volume_yesterday_usd = 0.0;
        assert!(QuotationPointDB::try_from(&quotation).is_ok());
    }

    #[test]
    fn test_point_construction_rejects_bad_shapes() {
        let mut quotation = sample_quotation();
        quotation.symbol = String::new();
        assert!(matches!(
            QuotationPointDB::try_from(&quotation),
            Err(QuotationError::InvalidPoint(_))
        ));

        let mut quotation = sample_quotation();
        quotation.source = String::new();
        assert!(QuotationPointDB::try_from(&quotation).is_err());

        let mut quotation = sample_quotation();
        quotation.price = f64::NAN;
        assert!(QuotationPointDB::try_from(&quotation).is_err());

        let mut quotation = sample_quotation();
        quotation.volume_yesterday_usd = f64::INFINITY;
        assert!(QuotationPointDB::try_from(&quotation).is_err());
    }

    #[test]
    fn test_row_decodes_fixed_layout() {
        let row = LatestQuotationRow {
            timestamp: "2024-05-01T10:30:00Z".to_string(),
            price: Some(41230.55),
            price_yesterday: Some(40800.0),
            volume_yesterday_usd: Some(1_250_000.0),
            name: Some("Bitcoin".to_string()),
        };

        let quotation = row.into_quotation("BTC", "CoinGecko");
        assert_eq!(quotation, sample_quotation());
    }

    #[test]
    fn test_row_decode_failures_are_independent() {
        // A malformed timestamp and a missing price leave those fields at
        // their zero values without touching the siblings.
        let row = LatestQuotationRow {
            timestamp: "2024-05-01 10:30:00".to_string(),
            price: None,
            price_yesterday: Some(40800.0),
            volume_yesterday_usd: Some(1_250_000.0),
            name: None,
        };

        let quotation = row.into_quotation("BTC", "CoinGecko");
        assert_eq!(quotation.timestamp, DateTime::<Utc>::default());
        assert_eq!(quotation.price, 0.0);
        assert_eq!(quotation.price_yesterday, 40800.0);
        assert_eq!(quotation.volume_yesterday_usd, 1_250_000.0);
        assert_eq!(quotation.name, "");
        assert_eq!(quotation.symbol, "BTC");
        assert_eq!(quotation.source, "CoinGecko");
    }

    #[test]
    fn test_serde_wire_casing() {
        let json = serde_json::to_value(sample_quotation()).unwrap();
        assert!(json.get("priceYesterday").is_some());
        assert!(json.get("volumeYesterdayUSD").is_some());
        assert!(json.get("symbol").is_some());
        assert!(json.get("price_yesterday").is_none());
    }
}
