use std::sync::Arc;

use chrono::NaiveDate;

use crate::valuation::domain::{
    AdjustmentValues, HomeSpecs, ListingStatus, TransactionRecord, TransactionType, UnitSpecs,
};
use crate::valuation::service::ValuationService;
use crate::valuation::store::{
    AdjustmentOverride, AdjustmentOverrideStore, BuildingGeography, OverrideBook, OverrideLevel,
    PoolQuery, StoreError, TransactionLedger, TransactionStore,
};

pub(super) const BUILDING: &str = "b-harbour-88";

pub(super) fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date")
}

pub(super) fn days_ago(days: u64) -> NaiveDate {
    as_of() - chrono::Days::new(days)
}

pub(super) fn sale_values() -> AdjustmentValues {
    AdjustmentValues {
        parking_per_space: 50_000,
        locker: 10_000,
        bathroom: 25_000,
    }
}

pub(super) fn subject() -> UnitSpecs {
    UnitSpecs {
        building_id: BUILDING.to_string(),
        bedrooms: 2,
        bathrooms: 2,
        living_area_range: Some("800-899".to_string()),
        exact_sqft: Some(850),
        parking: 1,
        has_locker: false,
        annual_tax: Some(3_100),
        association_fee: Some(700),
    }
}

/// Closed sale in the test building matching `subject()` on every feature.
pub(super) fn sale(id: &str, price: i64, sqft: u32, closed_days_ago: u64) -> TransactionRecord {
    TransactionRecord {
        listing_id: id.to_string(),
        transaction_type: TransactionType::Sale,
        status: ListingStatus::Closed,
        building_id: Some(BUILDING.to_string()),
        community_id: Some("waterfront".to_string()),
        neighbourhood: Some("harbourfront".to_string()),
        municipality_id: Some("toronto".to_string()),
        area: Some("gta".to_string()),
        unit_number: None,
        close_price: Some(price),
        list_price: Some(price + 10_000),
        close_date: Some(days_ago(closed_days_ago)),
        bedrooms: 2,
        bathrooms: 2,
        living_area_range: Some("800-899".to_string()),
        sqft_source: Some(sqft.to_string()),
        parking: 1,
        has_locker: false,
        association_fee: Some(700),
        days_on_market: Some(18),
        property_subtype: None,
        lot_front: None,
        lot_depth: None,
        garage_type: None,
        basement_type: None,
        approx_age: None,
    }
}

pub(super) fn lease(id: &str, rent: i64, closed_days_ago: u64) -> TransactionRecord {
    TransactionRecord {
        transaction_type: TransactionType::Lease,
        association_fee: None,
        ..sale(id, rent, 850, closed_days_ago)
    }
}

pub(super) fn home_subject() -> HomeSpecs {
    HomeSpecs {
        community_id: "leslieville".to_string(),
        municipality_id: "toronto".to_string(),
        neighbourhood: None,
        area: Some("gta".to_string()),
        property_subtype: "Semi-Detached".to_string(),
        bedrooms: 3,
        bathrooms: 2,
        living_area_range: Some("1500-2000".to_string()),
        exact_sqft: Some(1800),
        parking: 1,
        annual_tax: Some(5_400),
        lot_front: Some(20.0),
        lot_depth: Some(100.0),
        garage_type: Some("Detached".to_string()),
        basement_type: Some("Finished".to_string()),
        approx_age: Some("51-99".to_string()),
        association_fee: None,
    }
}

pub(super) fn home_sale(
    id: &str,
    community: &str,
    subtype: &str,
    price: i64,
    sqft: u32,
    closed_days_ago: u64,
) -> TransactionRecord {
    TransactionRecord {
        listing_id: id.to_string(),
        transaction_type: TransactionType::Sale,
        status: ListingStatus::Closed,
        building_id: None,
        community_id: Some(community.to_string()),
        neighbourhood: None,
        municipality_id: Some("toronto".to_string()),
        area: Some("gta".to_string()),
        unit_number: None,
        close_price: Some(price),
        list_price: None,
        close_date: Some(days_ago(closed_days_ago)),
        bedrooms: 3,
        bathrooms: 2,
        living_area_range: Some("1500-2000".to_string()),
        sqft_source: Some(sqft.to_string()),
        parking: 1,
        has_locker: false,
        association_fee: None,
        days_on_market: Some(9),
        property_subtype: Some(subtype.to_string()),
        lot_front: Some(20.0),
        lot_depth: Some(100.0),
        garage_type: Some("Detached".to_string()),
        basement_type: Some("Finished".to_string()),
        approx_age: Some("51-99".to_string()),
    }
}

pub(super) fn override_book() -> OverrideBook {
    let mut book = OverrideBook::default();
    book.insert_building(
        BUILDING,
        BuildingGeography {
            community: Some("waterfront".to_string()),
            neighbourhood: Some("harbourfront".to_string()),
            municipality: Some("toronto".to_string()),
            area: Some("gta".to_string()),
        },
    );
    book.insert_override(
        OverrideLevel::Building,
        BUILDING,
        TransactionType::Sale,
        AdjustmentOverride {
            parking_per_space: Some(60_000),
            locker: None,
            bathroom: None,
        },
    );
    book
}

pub(super) fn service(
    records: Vec<TransactionRecord>,
) -> ValuationService<TransactionLedger, OverrideBook> {
    ValuationService::new(
        Arc::new(TransactionLedger::new(records)),
        Arc::new(override_book()),
    )
}

/// Store that counts queries so the geographic cascade can be observed.
#[derive(Default)]
pub(super) struct CountingStore {
    pub(super) ledger: TransactionLedger,
    pub(super) queries: std::sync::Mutex<Vec<PoolQuery>>,
}

impl TransactionStore for CountingStore {
    fn comparable_pool(&self, query: &PoolQuery) -> Result<Vec<TransactionRecord>, StoreError> {
        self.queries
            .lock()
            .expect("query log poisoned")
            .push(query.clone());
        self.ledger.comparable_pool(query)
    }
}

/// Store that always fails, standing in for a lost database connection.
pub(super) struct OfflineStore;

impl TransactionStore for OfflineStore {
    fn comparable_pool(&self, _query: &PoolQuery) -> Result<Vec<TransactionRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

impl AdjustmentOverrideStore for OfflineStore {
    fn building_geography(
        &self,
        _building_id: &str,
    ) -> Result<Option<BuildingGeography>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn override_for(
        &self,
        _level: OverrideLevel,
        _key: &str,
        _transaction_type: TransactionType,
    ) -> Result<Option<AdjustmentOverride>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}
