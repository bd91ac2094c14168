use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Sale,
    Lease,
}

impl TransactionType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Lease => "lease",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sale" | "sales" | "sold" => Some(Self::Sale),
            "lease" | "leased" | "rent" | "rental" => Some(Self::Lease),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Closed,
    Active,
    Other,
}

impl ListingStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "closed" | "sold" | "leased" => Self::Closed,
            "active" | "new" => Self::Active,
            _ => Self::Other,
        }
    }
}

/// Precedence level at which a comparable set was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchTier {
    Bingo,
    Fair,
    Adjusted,
    Contact,
}

impl MatchTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bingo => "BINGO",
            Self::Fair => "FAIR",
            Self::Adjusted => "ADJUSTED",
            Self::Contact => "CONTACT",
        }
    }

    /// Contact-tier comparables are reference data and never carry a price.
    pub const fn is_priced(self) -> bool {
        !matches!(self, Self::Contact)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchQuality {
    Perfect,
    Excellent,
    Good,
    Fair,
}

impl MatchQuality {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect",
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
        }
    }

    /// Quality of an adjusted-tier comparable, by number of itemized adjustments.
    pub fn from_adjustment_count(count: usize) -> Self {
        match count {
            0 => Self::Excellent,
            1 => Self::Good,
            _ => Self::Fair,
        }
    }

    /// Repetition count of this comparable in the weighted price list.
    pub const fn weight(self) -> usize {
        match self {
            Self::Perfect => 3,
            Self::Excellent => 2,
            Self::Good | Self::Fair => 1,
        }
    }
}

/// Parsed living-area range label such as `700-799` or `2000+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivingAreaRange {
    pub low: u32,
    pub high: Option<u32>,
}

impl LivingAreaRange {
    pub fn parse(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if let Some(open) = trimmed.strip_suffix('+') {
            let low = open.trim().parse().ok()?;
            return Some(Self { low, high: None });
        }

        let (low, high) = trimmed.split_once('-')?;
        let low: u32 = low.trim().parse().ok()?;
        let high: u32 = high.trim().parse().ok()?;
        if high < low {
            return None;
        }
        Some(Self {
            low,
            high: Some(high),
        })
    }

    pub fn midpoint(&self) -> u32 {
        match self.high {
            Some(high) => (self.low + high + 1) / 2,
            None => self.low,
        }
    }
}

/// Structural compatibility group for freehold subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySubtypeGroup {
    Detached,
    Attached,
    Multiplex,
    Other,
}

impl PropertySubtypeGroup {
    pub fn classify(subtype: &str) -> Self {
        let normalized = subtype.trim().to_ascii_lowercase();
        if normalized.contains("semi") || normalized.contains("link") || normalized.contains("att")
        {
            Self::Attached
        } else if normalized.contains("detached") {
            Self::Detached
        } else if ["duplex", "triplex", "fourplex", "multiplex"]
            .iter()
            .any(|kind| normalized.contains(kind))
        {
            Self::Multiplex
        } else {
            Self::Other
        }
    }

    /// Whether a comparable subtype may stand in for the subject subtype.
    pub fn compatible(subject: &str, candidate: &str) -> bool {
        match Self::classify(subject) {
            Self::Other => subject.trim().eq_ignore_ascii_case(candidate.trim()),
            group => group == Self::classify(candidate),
        }
    }
}

/// Approximate-age brackets in listing order, youngest first.
const AGE_BRACKETS: [&str; 8] = [
    "new", "0-5", "6-10", "11-15", "16-30", "31-50", "51-99", "100+",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AgeBracket(usize);

impl AgeBracket {
    pub fn parse(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect();
        AGE_BRACKETS
            .iter()
            .position(|bracket| *bracket == normalized)
            .map(Self)
    }

    pub fn distance(self, other: Self) -> usize {
        self.0.abs_diff(other.0)
    }
}

/// Subject condo unit as described by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpecs {
    pub building_id: String,
    pub bedrooms: u8,
    pub bathrooms: u8,
    #[serde(default)]
    pub living_area_range: Option<String>,
    #[serde(default)]
    pub exact_sqft: Option<u32>,
    #[serde(default)]
    pub parking: u8,
    #[serde(default)]
    pub has_locker: bool,
    #[serde(default)]
    pub annual_tax: Option<i64>,
    #[serde(default)]
    pub association_fee: Option<i64>,
}

/// Subject freehold home as described by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeSpecs {
    pub community_id: String,
    pub municipality_id: String,
    #[serde(default)]
    pub neighbourhood: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    pub property_subtype: String,
    pub bedrooms: u8,
    pub bathrooms: u8,
    #[serde(default)]
    pub living_area_range: Option<String>,
    #[serde(default)]
    pub exact_sqft: Option<u32>,
    #[serde(default)]
    pub parking: u8,
    #[serde(default)]
    pub annual_tax: Option<i64>,
    #[serde(default)]
    pub lot_front: Option<f64>,
    #[serde(default)]
    pub lot_depth: Option<f64>,
    #[serde(default)]
    pub garage_type: Option<String>,
    #[serde(default)]
    pub basement_type: Option<String>,
    #[serde(default)]
    pub approx_age: Option<String>,
    /// Common-element fee for POTL and similar freeholds.
    #[serde(default)]
    pub association_fee: Option<i64>,
}

impl HomeSpecs {
    pub fn lot_area(&self) -> Option<f64> {
        lot_area(self.lot_front, self.lot_depth)
    }

    /// Unit-level view used by the shared tier predicates and adjustments.
    pub fn as_unit(&self) -> UnitSpecs {
        UnitSpecs {
            building_id: String::new(),
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            living_area_range: self.living_area_range.clone(),
            exact_sqft: self.exact_sqft,
            parking: self.parking,
            has_locker: false,
            annual_tax: self.annual_tax,
            association_fee: self.association_fee,
        }
    }
}

/// One row of the external transaction store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub listing_id: String,
    pub transaction_type: TransactionType,
    pub status: ListingStatus,
    #[serde(default)]
    pub building_id: Option<String>,
    #[serde(default)]
    pub community_id: Option<String>,
    #[serde(default)]
    pub neighbourhood: Option<String>,
    #[serde(default)]
    pub municipality_id: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub unit_number: Option<String>,
    pub close_price: Option<i64>,
    #[serde(default)]
    pub list_price: Option<i64>,
    pub close_date: Option<NaiveDate>,
    pub bedrooms: u8,
    pub bathrooms: u8,
    #[serde(default)]
    pub living_area_range: Option<String>,
    #[serde(default)]
    pub sqft_source: Option<String>,
    #[serde(default)]
    pub parking: u8,
    #[serde(default)]
    pub has_locker: bool,
    #[serde(default)]
    pub association_fee: Option<i64>,
    #[serde(default)]
    pub days_on_market: Option<u32>,
    #[serde(default)]
    pub property_subtype: Option<String>,
    #[serde(default)]
    pub lot_front: Option<f64>,
    #[serde(default)]
    pub lot_depth: Option<f64>,
    #[serde(default)]
    pub garage_type: Option<String>,
    #[serde(default)]
    pub basement_type: Option<String>,
    #[serde(default)]
    pub approx_age: Option<String>,
}

impl TransactionRecord {
    pub fn lot_area(&self) -> Option<f64> {
        lot_area(self.lot_front, self.lot_depth)
    }
}

fn lot_area(front: Option<f64>, depth: Option<f64>) -> Option<f64> {
    match (front, depth) {
        (Some(front), Some(depth)) if front > 0.0 && depth > 0.0 => Some(front * depth),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Parking,
    Locker,
    Bathroom,
}

/// Itemized dollar delta normalizing a comparable to the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub kind: AdjustmentKind,
    pub difference: i32,
    pub amount: i64,
    pub reason: String,
}

/// Effective per-feature dollar values for one estimate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentValues {
    pub parking_per_space: i64,
    pub locker: i64,
    pub bathroom: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparable {
    pub record: TransactionRecord,
    pub exact_sqft: Option<u32>,
    pub tier: MatchTier,
    pub quality: MatchQuality,
    pub adjustments: Vec<Adjustment>,
    /// Absent for reference-only comparables.
    pub adjusted_price: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<String>,
}

impl Comparable {
    /// Price used by the estimator: adjusted when computed, raw close otherwise.
    pub fn effective_price(&self) -> Option<i64> {
        self.adjusted_price.or(self.record.close_price)
    }

    pub fn net_adjustment(&self) -> i64 {
        self.adjustments.iter().map(|adjustment| adjustment.amount).sum()
    }
}

/// Matcher output: the tier that satisfied the ladder and its comparables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub tier: MatchTier,
    pub comparables: Vec<Comparable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_closed_and_open_ranges() {
        let closed = LivingAreaRange::parse("700-799").expect("closed range");
        assert_eq!(closed.low, 700);
        assert_eq!(closed.high, Some(799));
        assert_eq!(closed.midpoint(), 750);

        let open = LivingAreaRange::parse("2000+").expect("open range");
        assert_eq!(open.high, None);
        assert_eq!(open.midpoint(), 2000);

        assert!(LivingAreaRange::parse("n/a").is_none());
    }

    #[test]
    fn subtype_groups_cover_attached_and_multiplex_variants() {
        assert!(PropertySubtypeGroup::compatible("Semi-Detached", "Link"));
        assert!(PropertySubtypeGroup::compatible("Att/Row/Townhouse", "Semi-Detached"));
        assert!(PropertySubtypeGroup::compatible("Duplex", "Fourplex"));
        assert!(PropertySubtypeGroup::compatible("Detached", "detached"));
        assert!(!PropertySubtypeGroup::compatible("Detached", "Semi-Detached"));
        assert!(!PropertySubtypeGroup::compatible("Triplex", "Detached"));
    }

    #[test]
    fn age_brackets_measure_adjacency() {
        let young = AgeBracket::parse("6-10").expect("bracket");
        let next = AgeBracket::parse(" 11-15 ").expect("bracket");
        let old = AgeBracket::parse("51-99").expect("bracket");
        assert_eq!(young.distance(next), 1);
        assert_eq!(young.distance(old), 4);
        assert_eq!(AgeBracket::parse("New"), Some(AgeBracket(0)));
    }

    #[test]
    fn quality_follows_adjustment_count() {
        assert_eq!(MatchQuality::from_adjustment_count(0), MatchQuality::Excellent);
        assert_eq!(MatchQuality::from_adjustment_count(1), MatchQuality::Good);
        assert_eq!(MatchQuality::from_adjustment_count(3), MatchQuality::Fair);
    }
}
