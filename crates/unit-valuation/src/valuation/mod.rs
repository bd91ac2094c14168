//! Comparable transaction matching and price estimation.
//!
//! Data flows one way: the adjustment resolver supplies per-feature dollar
//! values, the matchers walk a tier ladder over an eligible transaction pool
//! (adjusting comparables where needed), and the statistical estimator turns
//! the priced comparables into a point estimate, range and confidence.

pub mod adjustments;
pub mod domain;
pub mod estimator;
pub mod matching;
pub mod router;
pub mod service;
pub mod sqft;
pub mod store;

#[cfg(test)]
mod tests;

pub use adjustments::{AdjustmentResolver, ResolvedAdjustments};
pub use domain::{
    Adjustment, AdjustmentKind, AdjustmentValues, Comparable, HomeSpecs, ListingStatus,
    MatchQuality, MatchResult, MatchTier, TransactionRecord, TransactionType, UnitSpecs,
};
pub use estimator::{
    Confidence, EstimateError, EstimateResult, MarketSpeed, MarketSpeedStatus, PriceRange,
    StatisticalEstimator,
};
pub use matching::{ComparableMatcher, GeographyLevel, HomeComparableMatcher, HomeMatchResult};
pub use router::valuation_router;
pub use service::{
    CondoValuationRequest, HomeValuationRequest, ValuationOutcome, ValuationService,
    ValuationServiceError,
};
pub use sqft::extract_exact_sqft;
pub use store::{
    AdjustmentOverride, AdjustmentOverrideStore, BuildingGeography, OverrideBook, OverrideLevel,
    PoolQuery, PoolScope, StoreError, TransactionLedger, TransactionStore,
};
