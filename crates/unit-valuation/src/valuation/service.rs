use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::adjustments::{AdjustmentResolver, AdjustmentScope, ResolvedAdjustments};
use super::domain::{
    Comparable, HomeSpecs, MatchResult, MatchTier, TransactionType, UnitSpecs,
};
use super::estimator::{EstimateError, EstimateResult, StatisticalEstimator};
use super::matching::{ComparableMatcher, GeographyLevel, HomeComparableMatcher};
use super::store::{
    AdjustmentOverrideStore, BuildingGeography, PoolQuery, PoolScope, StoreError,
    TransactionStore, DEFAULT_SALE_PRICE_FLOOR,
};

const AGENT_FOLLOW_UP: &str =
    "Not enough comparable transactions to estimate this unit. An agent will follow up with a personal evaluation.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondoValuationRequest {
    pub specs: UnitSpecs,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeValuationRequest {
    pub specs: HomeSpecs,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

/// Either a priced estimate or reference data that must not be shown as a price.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValuationOutcome {
    Estimated {
        estimate: EstimateResult,
        adjustment_values: ResolvedAdjustments,
        #[serde(skip_serializing_if = "Option::is_none")]
        geography: Option<GeographyLevel>,
    },
    ReferenceOnly {
        tier: MatchTier,
        comparables: Vec<Comparable>,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        geography: Option<GeographyLevel>,
    },
}

impl ValuationOutcome {
    pub fn tier(&self) -> MatchTier {
        match self {
            ValuationOutcome::Estimated { estimate, .. } => estimate.tier,
            ValuationOutcome::ReferenceOnly { tier, .. } => *tier,
        }
    }

    pub fn estimated_price(&self) -> Option<i64> {
        match self {
            ValuationOutcome::Estimated { estimate, .. } => Some(estimate.estimated_price),
            ValuationOutcome::ReferenceOnly { .. } => None,
        }
    }

    pub fn comparables(&self) -> &[Comparable] {
        match self {
            ValuationOutcome::Estimated { estimate, .. } => &estimate.comparables,
            ValuationOutcome::ReferenceOnly { comparables, .. } => comparables,
        }
    }
}

/// Service composing the override resolver, transaction store, matchers and estimator.
pub struct ValuationService<T, O> {
    store: Arc<T>,
    resolver: AdjustmentResolver<O>,
    sale_price_floor: i64,
}

impl<T, O> ValuationService<T, O>
where
    T: TransactionStore + 'static,
    O: AdjustmentOverrideStore + 'static,
{
    pub fn new(store: Arc<T>, overrides: Arc<O>) -> Self {
        Self {
            store,
            resolver: AdjustmentResolver::new(overrides),
            sale_price_floor: DEFAULT_SALE_PRICE_FLOOR,
        }
    }

    pub fn with_sale_price_floor(mut self, floor: i64) -> Self {
        self.sale_price_floor = floor;
        self
    }

    pub fn resolve_adjustments(
        &self,
        building_id: &str,
        transaction_type: TransactionType,
    ) -> Result<ResolvedAdjustments, ValuationServiceError> {
        Ok(self.resolver.resolve(building_id, transaction_type)?)
    }

    /// Estimate a condo unit's price or rent from its building's closed transactions.
    pub fn estimate_condo(
        &self,
        request: CondoValuationRequest,
    ) -> Result<ValuationOutcome, ValuationServiceError> {
        let CondoValuationRequest {
            specs,
            transaction_type,
            as_of,
        } = request;
        let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());

        let adjustment_values = self.resolver.resolve(&specs.building_id, transaction_type)?;
        let pool = self.store.comparable_pool(&self.query(
            PoolScope::Building(specs.building_id.clone()),
            transaction_type,
            as_of,
        ))?;
        if pool.is_empty() {
            warn!(
                building = %specs.building_id,
                transaction_type = transaction_type.label(),
                "comparable pool is empty"
            );
        }

        let matched = ComparableMatcher::for_type(transaction_type).find(
            &specs,
            &adjustment_values.values,
            &pool,
            as_of,
        );
        debug!(
            building = %specs.building_id,
            pool = pool.len(),
            tier = matched.tier.label(),
            comparables = matched.comparables.len(),
            "condo comparables matched"
        );

        self.conclude(matched, transaction_type, adjustment_values, None)
    }

    /// Estimate a freehold home, widening from community to municipality when needed.
    pub fn estimate_home(
        &self,
        request: HomeValuationRequest,
    ) -> Result<ValuationOutcome, ValuationServiceError> {
        let HomeValuationRequest {
            specs,
            transaction_type,
            as_of,
        } = request;
        let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());

        let scope = AdjustmentScope {
            building_id: None,
            geography: BuildingGeography {
                community: Some(specs.community_id.clone()),
                neighbourhood: specs.neighbourhood.clone(),
                municipality: Some(specs.municipality_id.clone()),
                area: specs.area.clone(),
            },
        };
        let adjustment_values = self.resolver.resolve_scope(&scope, transaction_type)?;

        let community_pool = self.store.comparable_pool(&self.query(
            PoolScope::Community(specs.community_id.clone()),
            transaction_type,
            as_of,
        ))?;

        let matched = HomeComparableMatcher::for_type(transaction_type).find_with(
            &specs,
            &adjustment_values.values,
            &community_pool,
            as_of,
            || {
                debug!(
                    community = %specs.community_id,
                    municipality = %specs.municipality_id,
                    "community pool insufficient, widening to municipality"
                );
                self.store.comparable_pool(&self.query(
                    PoolScope::Municipality(specs.municipality_id.clone()),
                    transaction_type,
                    as_of,
                ))
            },
        )?;

        let geography = matched.geography;
        self.conclude(
            MatchResult {
                tier: matched.tier,
                comparables: matched.comparables,
            },
            transaction_type,
            adjustment_values,
            Some(geography),
        )
    }

    fn query(
        &self,
        scope: PoolScope,
        transaction_type: TransactionType,
        as_of: NaiveDate,
    ) -> PoolQuery {
        PoolQuery::new(scope, transaction_type, as_of).with_sale_price_floor(self.sale_price_floor)
    }

    fn conclude(
        &self,
        matched: MatchResult,
        transaction_type: TransactionType,
        adjustment_values: ResolvedAdjustments,
        geography: Option<GeographyLevel>,
    ) -> Result<ValuationOutcome, ValuationServiceError> {
        if !matched.tier.is_priced() {
            info!(
                transaction_type = transaction_type.label(),
                references = matched.comparables.len(),
                "no estimate produced, returning reference comparables"
            );
            return Ok(ValuationOutcome::ReferenceOnly {
                tier: matched.tier,
                comparables: matched.comparables,
                message: AGENT_FOLLOW_UP.to_string(),
                geography,
            });
        }

        let estimate = StatisticalEstimator::new(transaction_type)
            .estimate(matched.tier, matched.comparables)?;
        info!(
            transaction_type = transaction_type.label(),
            tier = estimate.tier.label(),
            estimated_price = estimate.estimated_price,
            confidence = estimate.confidence.label(),
            comparables = estimate.comparables.len(),
            "valuation estimate produced"
        );

        Ok(ValuationOutcome::Estimated {
            estimate,
            adjustment_values,
            geography,
        })
    }
}

/// Error raised by the valuation service.
#[derive(Debug, thiserror::Error)]
pub enum ValuationServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Estimate(#[from] EstimateError),
}
