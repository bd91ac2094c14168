use std::convert::Infallible;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::super::adjustments::home_similarity_score;
use super::super::domain::{
    AdjustmentValues, Comparable, HomeSpecs, MatchResult, MatchTier, PropertySubtypeGroup,
    TransactionRecord, TransactionType, UnitSpecs,
};
use super::ladder::{self, Candidate, LadderRules, SizeTolerance, TierStage};

/// Relative exact-sqft band for freehold BINGO matches.
pub const HOME_SQFT_TOLERANCE: f64 = 0.10;
/// Community results below this count defer to the municipality pool.
pub const COMMUNITY_MIN_RESULTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeographyLevel {
    Community,
    Municipality,
}

impl GeographyLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::Municipality => "municipality",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeMatchResult {
    pub tier: MatchTier,
    pub geography: GeographyLevel,
    pub comparables: Vec<Comparable>,
}

/// Comparable matcher for freehold homes with a community-to-municipality cascade.
#[derive(Debug, Clone, Copy)]
pub struct HomeComparableMatcher {
    transaction_type: TransactionType,
}

impl HomeComparableMatcher {
    pub fn sales() -> Self {
        Self::for_type(TransactionType::Sale)
    }

    pub fn rentals() -> Self {
        Self::for_type(TransactionType::Lease)
    }

    pub fn for_type(transaction_type: TransactionType) -> Self {
        Self { transaction_type }
    }

    fn rules(&self) -> LadderRules {
        LadderRules {
            size_tolerance: SizeTolerance::Relative(HOME_SQFT_TOLERANCE),
            fee_band: self.transaction_type == TransactionType::Sale,
            compare_locker: false,
        }
    }

    /// Match against both pools already in memory.
    pub fn find(
        &self,
        subject: &HomeSpecs,
        values: &AdjustmentValues,
        community_pool: &[TransactionRecord],
        municipality_pool: &[TransactionRecord],
        as_of: NaiveDate,
    ) -> HomeMatchResult {
        match self.find_with(subject, values, community_pool, as_of, || {
            Ok::<_, Infallible>(municipality_pool.to_vec())
        }) {
            Ok(result) => result,
            Err(never) => match never {},
        }
    }

    /// Match the community pool first, loading the municipality pool only when needed.
    pub fn find_with<F, E>(
        &self,
        subject: &HomeSpecs,
        values: &AdjustmentValues,
        community_pool: &[TransactionRecord],
        as_of: NaiveDate,
        load_municipality: F,
    ) -> Result<HomeMatchResult, E>
    where
        F: FnOnce() -> Result<Vec<TransactionRecord>, E>,
    {
        let rules = self.rules();
        let unit = subject.as_unit();

        let community = compatible_candidates(subject, community_pool);
        let community_stages =
            self.stages(subject, &unit, values, &rules, as_of, COMMUNITY_MIN_RESULTS);
        if let Some(result) = ladder::run_ladder(&community_stages, &community) {
            return Ok(with_geography(result, GeographyLevel::Community));
        }

        let municipality_pool = load_municipality()?;
        let municipality = compatible_candidates(subject, &municipality_pool);
        let municipality_stages = self.stages(subject, &unit, values, &rules, as_of, 1);
        if let Some(result) = ladder::run_ladder(&municipality_stages, &municipality) {
            return Ok(with_geography(result, GeographyLevel::Municipality));
        }

        let (reference, geography) = if municipality.is_empty() {
            (community, GeographyLevel::Community)
        } else {
            (municipality, GeographyLevel::Municipality)
        };
        Ok(HomeMatchResult {
            tier: MatchTier::Contact,
            geography,
            comparables: ladder::contact(&unit, &rules, &reference),
        })
    }

    fn stages<'s>(
        &self,
        subject: &'s HomeSpecs,
        unit: &'s UnitSpecs,
        values: &'s AdjustmentValues,
        rules: &'s LadderRules,
        as_of: NaiveDate,
        min_count: usize,
    ) -> Vec<TierStage<'s>> {
        vec![
            TierStage::new(MatchTier::Bingo, min_count, move |candidates| {
                ladder::bingo(unit, rules, candidates)
            }),
            TierStage::new(MatchTier::Fair, min_count, move |candidates| {
                ladder::fair(unit, rules, candidates)
            }),
            TierStage::new(MatchTier::Adjusted, min_count, move |candidates| {
                ladder::adjusted(unit, rules, values, candidates, |candidate: &Candidate<'_>| {
                    home_similarity_score(subject, candidate.record, candidate.exact_sqft, as_of)
                })
            }),
        ]
    }
}

/// Rows whose subtype may stand in for the subject's; rows without a subtype are excluded.
fn compatible_candidates<'a>(
    subject: &HomeSpecs,
    pool: &'a [TransactionRecord],
) -> Vec<Candidate<'a>> {
    ladder::prepare(pool.iter().filter(|record| {
        record
            .property_subtype
            .as_deref()
            .is_some_and(|subtype| PropertySubtypeGroup::compatible(&subject.property_subtype, subtype))
    }))
}

fn with_geography(result: MatchResult, geography: GeographyLevel) -> HomeMatchResult {
    HomeMatchResult {
        tier: result.tier,
        geography,
        comparables: result.comparables,
    }
}
