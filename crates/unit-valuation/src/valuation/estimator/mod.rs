mod market;

pub use market::{market_speed, MarketSpeed, MarketSpeedStatus};

use serde::{Deserialize, Serialize};

use super::domain::{Comparable, MatchQuality, MatchTier, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub low: i64,
    pub high: i64,
}

impl PriceRange {
    pub fn contains(&self, price: i64) -> bool {
        self.low <= price && price <= self.high
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentSummary {
    pub perfect_match_count: usize,
    pub adjusted_comparable_count: usize,
    pub avg_adjustment_magnitude: i64,
}

/// Point estimate, range and confidence derived from a priced comparable set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateResult {
    pub tier: MatchTier,
    pub transaction_type: TransactionType,
    pub estimated_price: i64,
    pub price_range: PriceRange,
    pub confidence: Confidence,
    pub market_speed: Option<MarketSpeed>,
    pub comparables: Vec<Comparable>,
    pub adjustment_summary: AdjustmentSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EstimateError {
    #[error("no comparable transactions available to estimate from")]
    NoComparables,
    #[error("contact-tier comparables are reference only and cannot be priced")]
    ReferenceOnly,
}

/// Deterministic aggregation of comparables into an estimate.
#[derive(Debug, Clone, Copy)]
pub struct StatisticalEstimator {
    transaction_type: TransactionType,
}

impl StatisticalEstimator {
    pub fn new(transaction_type: TransactionType) -> Self {
        Self { transaction_type }
    }

    pub fn estimate(
        &self,
        tier: MatchTier,
        comparables: Vec<Comparable>,
    ) -> Result<EstimateResult, EstimateError> {
        if !tier.is_priced() {
            return Err(EstimateError::ReferenceOnly);
        }

        let mut weighted = weighted_prices(&comparables);
        if weighted.is_empty() {
            return Err(EstimateError::NoComparables);
        }
        weighted.sort_unstable();
        let estimated_price = median(&weighted);

        let perfect = count_quality(&comparables, MatchQuality::Perfect);
        let excellent = count_quality(&comparables, MatchQuality::Excellent);

        let fraction = range_fraction(perfect, excellent);
        let (lower, upper) = (
            scale(estimated_price, 1.0 - fraction),
            scale(estimated_price, 1.0 + fraction),
        );
        let price_range = PriceRange {
            low: lower.min(upper),
            high: lower.max(upper),
        };

        Ok(EstimateResult {
            tier,
            transaction_type: self.transaction_type,
            estimated_price,
            price_range,
            confidence: confidence(perfect, excellent, comparables.len()),
            market_speed: market_speed(&comparables, self.transaction_type),
            adjustment_summary: adjustment_summary(&comparables, perfect),
            comparables,
        })
    }
}

/// Positive effective prices repeated by match-quality weight.
///
/// Adjustments can drive a comparable to zero or below; such rows are not
/// evidence of a price and are left out.
pub fn weighted_prices(comparables: &[Comparable]) -> Vec<i64> {
    comparables
        .iter()
        .filter_map(|comparable| {
            comparable
                .effective_price()
                .filter(|price| *price > 0)
                .map(|price| (price, comparable.quality.weight()))
        })
        .flat_map(|(price, weight)| std::iter::repeat(price).take(weight))
        .collect()
}

/// Median of a sorted, non-empty list; even lengths average the middle pair.
fn median(sorted: &[i64]) -> i64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        ((sorted[mid - 1] + sorted[mid]) as f64 / 2.0).round() as i64
    }
}

fn count_quality(comparables: &[Comparable], quality: MatchQuality) -> usize {
    comparables
        .iter()
        .filter(|comparable| comparable.quality == quality)
        .count()
}

fn range_fraction(perfect: usize, excellent: usize) -> f64 {
    if perfect >= 3 {
        0.05
    } else if excellent >= 3 {
        0.08
    } else {
        0.10
    }
}

fn confidence(perfect: usize, excellent: usize, total: usize) -> Confidence {
    if perfect >= 3 || total >= 8 {
        Confidence::High
    } else if excellent >= 2 || total >= 4 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn scale(price: i64, factor: f64) -> i64 {
    (price as f64 * factor).round() as i64
}

fn adjustment_summary(comparables: &[Comparable], perfect: usize) -> AdjustmentSummary {
    let magnitudes: Vec<i64> = comparables
        .iter()
        .filter(|comparable| !comparable.adjustments.is_empty())
        .map(|comparable| comparable.net_adjustment().abs())
        .collect();
    let avg_adjustment_magnitude = if magnitudes.is_empty() {
        0
    } else {
        (magnitudes.iter().sum::<i64>() as f64 / magnitudes.len() as f64).round() as i64
    };

    AdjustmentSummary {
        perfect_match_count: perfect,
        adjusted_comparable_count: magnitudes.len(),
        avg_adjustment_magnitude,
    }
}
