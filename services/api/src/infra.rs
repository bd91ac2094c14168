use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};
use unit_valuation::error::AppError;
use unit_valuation::valuation::{OverrideBook, TransactionLedger};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// CSV files backing the in-memory stores; each one is optional.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DataFiles<'a> {
    pub(crate) transactions: Option<&'a Path>,
    pub(crate) overrides: Option<&'a Path>,
    pub(crate) buildings: Option<&'a Path>,
}

pub(crate) fn load_stores(files: DataFiles<'_>) -> Result<(TransactionLedger, OverrideBook), AppError> {
    let ledger = match files.transactions {
        Some(path) => {
            let ledger = TransactionLedger::from_path(path)?;
            info!(path = %path.display(), records = ledger.len(), "transaction export loaded");
            ledger
        }
        None => {
            warn!("no transaction export configured, every estimate will be reference-only");
            TransactionLedger::default()
        }
    };

    let mut book = OverrideBook::default();
    if let Some(path) = files.overrides {
        let rows = book.load_overrides(File::open(path)?)?;
        info!(path = %path.display(), rows, "adjustment overrides loaded");
    }
    if let Some(path) = files.buildings {
        let rows = book.load_buildings(File::open(path)?)?;
        info!(path = %path.display(), rows, "building directory loaded");
    }

    Ok((ledger, book))
}

pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_yield_empty_stores() {
        let (ledger, _book) = load_stores(DataFiles::default()).expect("empty stores");
        assert!(ledger.is_empty());
    }

    #[test]
    fn unreadable_export_surfaces_a_store_error() {
        let files = DataFiles {
            transactions: Some(Path::new("/nonexistent/unit-valuation/export.csv")),
            ..DataFiles::default()
        };
        let err = load_stores(files).expect_err("missing file fails");
        assert!(matches!(err, AppError::Store(_)));
    }

    #[test]
    fn parse_date_reports_the_offending_input() {
        assert_eq!(
            parse_date(" 2025-09-01 "),
            Ok(NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"))
        );
        let err = parse_date("tomorrow").expect_err("not a date");
        assert!(err.contains("tomorrow"));
    }
}
