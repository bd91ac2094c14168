use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{ListingStatus, TransactionRecord, TransactionType};

/// Default close-price floor separating sale rows from misclassified leases.
pub const DEFAULT_SALE_PRICE_FLOOR: i64 = 50_000;

/// Comparables older than this many months are never eligible.
pub const RECENCY_WINDOW_MONTHS: u32 = 24;

/// Geographic slice of the transaction store a pool is drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", content = "id", rename_all = "snake_case")]
pub enum PoolScope {
    Building(String),
    Community(String),
    Municipality(String),
}

impl PoolScope {
    fn contains(&self, record: &TransactionRecord) -> bool {
        let (value, id) = match self {
            PoolScope::Building(id) => (record.building_id.as_deref(), id),
            PoolScope::Community(id) => (record.community_id.as_deref(), id),
            PoolScope::Municipality(id) => (record.municipality_id.as_deref(), id),
        };
        value.is_some_and(|value| value.eq_ignore_ascii_case(id))
    }
}

/// Read-only query describing the comparable pool for one estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolQuery {
    pub scope: PoolScope,
    pub transaction_type: TransactionType,
    pub as_of: NaiveDate,
    pub sale_price_floor: i64,
}

impl PoolQuery {
    pub fn new(scope: PoolScope, transaction_type: TransactionType, as_of: NaiveDate) -> Self {
        Self {
            scope,
            transaction_type,
            as_of,
            sale_price_floor: DEFAULT_SALE_PRICE_FLOOR,
        }
    }

    pub fn with_sale_price_floor(mut self, floor: i64) -> Self {
        self.sale_price_floor = floor;
        self
    }

    pub fn earliest_close_date(&self) -> NaiveDate {
        self.as_of
            .checked_sub_months(Months::new(RECENCY_WINDOW_MONTHS))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Eligibility contract every store implementation must honor.
    pub fn admits(&self, record: &TransactionRecord) -> bool {
        if record.transaction_type != self.transaction_type
            || record.status != ListingStatus::Closed
            || !self.scope.contains(record)
        {
            return false;
        }

        let Some(price) = record.close_price else {
            return false;
        };
        if self.transaction_type == TransactionType::Sale && price <= self.sale_price_floor {
            return false;
        }

        match record.close_date {
            Some(date) => date >= self.earliest_close_date() && date <= self.as_of,
            None => false,
        }
    }
}

/// Error enumeration for data-store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("data store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read data file: {0}")]
    Io(#[from] std::io::Error),
}

/// Read access to closed transactions, filtered per [`PoolQuery::admits`].
pub trait TransactionStore: Send + Sync {
    fn comparable_pool(&self, query: &PoolQuery) -> Result<Vec<TransactionRecord>, StoreError>;
}

/// Override hierarchy levels, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideLevel {
    Building,
    Community,
    Neighbourhood,
    Municipality,
    Area,
    Generic,
}

impl OverrideLevel {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Building,
            Self::Community,
            Self::Neighbourhood,
            Self::Municipality,
            Self::Area,
            Self::Generic,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Community => "community",
            Self::Neighbourhood => "neighbourhood",
            Self::Municipality => "municipality",
            Self::Area => "area",
            Self::Generic => "generic",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(value.trim()))
            .or_else(|| (value.trim().eq_ignore_ascii_case("default")).then_some(Self::Generic))
    }
}

/// Partial override row; any field may be missing at any level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentOverride {
    pub parking_per_space: Option<i64>,
    pub locker: Option<i64>,
    pub bathroom: Option<i64>,
}

/// Where a building sits in the override hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingGeography {
    pub community: Option<String>,
    pub neighbourhood: Option<String>,
    pub municipality: Option<String>,
    pub area: Option<String>,
}

/// Per-geography adjustment override tables.
pub trait AdjustmentOverrideStore: Send + Sync {
    fn building_geography(&self, building_id: &str)
        -> Result<Option<BuildingGeography>, StoreError>;

    /// `key` is ignored for [`OverrideLevel::Generic`].
    fn override_for(
        &self,
        level: OverrideLevel,
        key: &str,
        transaction_type: TransactionType,
    ) -> Result<Option<AdjustmentOverride>, StoreError>;
}

/// In-memory transaction store backed by a listing export.
#[derive(Debug, Clone, Default)]
pub struct TransactionLedger {
    records: Vec<TransactionRecord>,
}

impl TransactionLedger {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StoreError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for row in csv_reader.deserialize::<TransactionRow>() {
            if let Some(record) = row?.into_record() {
                records.push(record);
            }
        }

        Ok(Self { records })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TransactionStore for TransactionLedger {
    fn comparable_pool(&self, query: &PoolQuery) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut pool: Vec<TransactionRecord> = self
            .records
            .iter()
            .filter(|record| query.admits(record))
            .cloned()
            .collect();
        pool.sort_by(|a, b| b.close_date.cmp(&a.close_date));
        Ok(pool)
    }
}

/// In-memory override tables plus the building directory they hang off.
#[derive(Debug, Clone, Default)]
pub struct OverrideBook {
    buildings: HashMap<String, BuildingGeography>,
    overrides: HashMap<(OverrideLevel, String, TransactionType), AdjustmentOverride>,
}

impl OverrideBook {
    pub fn insert_building(&mut self, building_id: impl Into<String>, geography: BuildingGeography) {
        self.buildings
            .insert(normalize_key(&building_id.into()), geography);
    }

    pub fn insert_override(
        &mut self,
        level: OverrideLevel,
        key: &str,
        transaction_type: TransactionType,
        values: AdjustmentOverride,
    ) {
        self.overrides
            .insert((level, level_key(level, key), transaction_type), values);
    }

    /// Load override rows (`level,key,transaction_type,parking_per_space,locker,bathroom`).
    pub fn load_overrides<R: Read>(&mut self, reader: R) -> Result<usize, StoreError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut loaded = 0;

        for row in csv_reader.deserialize::<OverrideRow>() {
            let row = row?;
            let (Some(level), Some(transaction_type)) = (
                OverrideLevel::parse(&row.level),
                TransactionType::parse(&row.transaction_type),
            ) else {
                continue;
            };
            self.insert_override(
                level,
                row.key.as_deref().unwrap_or_default(),
                transaction_type,
                AdjustmentOverride {
                    parking_per_space: row.parking_per_space,
                    locker: row.locker,
                    bathroom: row.bathroom,
                },
            );
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Load building rows (`building_id,community,neighbourhood,municipality,area`).
    pub fn load_buildings<R: Read>(&mut self, reader: R) -> Result<usize, StoreError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut loaded = 0;

        for row in csv_reader.deserialize::<BuildingRow>() {
            let row = row?;
            self.insert_building(
                row.building_id,
                BuildingGeography {
                    community: row.community,
                    neighbourhood: row.neighbourhood,
                    municipality: row.municipality,
                    area: row.area,
                },
            );
            loaded += 1;
        }

        Ok(loaded)
    }
}

impl AdjustmentOverrideStore for OverrideBook {
    fn building_geography(
        &self,
        building_id: &str,
    ) -> Result<Option<BuildingGeography>, StoreError> {
        Ok(self.buildings.get(&normalize_key(building_id)).cloned())
    }

    fn override_for(
        &self,
        level: OverrideLevel,
        key: &str,
        transaction_type: TransactionType,
    ) -> Result<Option<AdjustmentOverride>, StoreError> {
        Ok(self
            .overrides
            .get(&(level, level_key(level, key), transaction_type))
            .copied())
    }
}

fn normalize_key(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

fn level_key(level: OverrideLevel, key: &str) -> String {
    match level {
        OverrideLevel::Generic => String::new(),
        _ => normalize_key(key),
    }
}

#[derive(Debug, Deserialize)]
struct TransactionRow {
    listing_id: String,
    transaction_type: String,
    status: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    building_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    community_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    neighbourhood: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    municipality_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    area: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    unit_number: Option<String>,
    #[serde(default)]
    close_price: Option<i64>,
    #[serde(default)]
    list_price: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    close_date: Option<String>,
    bedrooms: u8,
    bathrooms: u8,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    living_area_range: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    sqft_source: Option<String>,
    #[serde(default)]
    parking: Option<u8>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    locker: Option<String>,
    #[serde(default)]
    association_fee: Option<i64>,
    #[serde(default)]
    days_on_market: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    property_subtype: Option<String>,
    #[serde(default)]
    lot_front: Option<f64>,
    #[serde(default)]
    lot_depth: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    garage_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    basement_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    approx_age: Option<String>,
}

impl TransactionRow {
    fn into_record(self) -> Option<TransactionRecord> {
        let transaction_type = TransactionType::parse(&self.transaction_type)?;
        let close_date = self
            .close_date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());
        let has_locker = self.locker.as_deref().is_some_and(locker_present);

        Some(TransactionRecord {
            listing_id: self.listing_id,
            transaction_type,
            status: ListingStatus::parse(&self.status),
            building_id: self.building_id,
            community_id: self.community_id,
            neighbourhood: self.neighbourhood,
            municipality_id: self.municipality_id,
            area: self.area,
            unit_number: self.unit_number,
            close_price: self.close_price,
            list_price: self.list_price,
            close_date,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            living_area_range: self.living_area_range,
            sqft_source: self.sqft_source,
            parking: self.parking.unwrap_or(0),
            has_locker,
            association_fee: self.association_fee,
            days_on_market: self.days_on_market,
            property_subtype: self.property_subtype,
            lot_front: self.lot_front,
            lot_depth: self.lot_depth,
            garage_type: self.garage_type,
            basement_type: self.basement_type,
            approx_age: self.approx_age,
        })
    }
}

fn locker_present(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "none" | "no" | "false" | "0"
    )
}

#[derive(Debug, Deserialize)]
struct OverrideRow {
    level: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    key: Option<String>,
    transaction_type: String,
    #[serde(default)]
    parking_per_space: Option<i64>,
    #[serde(default)]
    locker: Option<i64>,
    #[serde(default)]
    bathroom: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BuildingRow {
    building_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    community: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    neighbourhood: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    municipality: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    area: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
