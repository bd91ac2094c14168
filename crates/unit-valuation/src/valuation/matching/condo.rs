use chrono::NaiveDate;

use super::super::adjustments::similarity_score;
use super::super::domain::{
    AdjustmentValues, MatchResult, MatchTier, TransactionRecord, TransactionType, UnitSpecs,
};
use super::ladder::{self, Candidate, LadderRules, SizeTolerance, TierStage};

/// Exact-sqft band for condo BINGO matches.
pub const CONDO_SQFT_TOLERANCE: u32 = 50;

/// Comparable matcher for condo sales and rentals.
#[derive(Debug, Clone, Copy)]
pub struct ComparableMatcher {
    transaction_type: TransactionType,
}

impl ComparableMatcher {
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
            size_tolerance: SizeTolerance::Absolute(CONDO_SQFT_TOLERANCE),
            fee_band: self.transaction_type == TransactionType::Sale,
            compare_locker: true,
        }
    }

    /// Walk BINGO, FAIR, ADJUSTED and CONTACT over an eligible pool.
    ///
    /// An empty pool resolves to CONTACT with no comparables.
    pub fn find(
        &self,
        subject: &UnitSpecs,
        values: &AdjustmentValues,
        pool: &[TransactionRecord],
        as_of: NaiveDate,
    ) -> MatchResult {
        let rules = self.rules();
        let candidates = ladder::prepare(pool);
        let stages = self.stages(subject, values, &rules, as_of);

        ladder::run_ladder(&stages, &candidates).unwrap_or(MatchResult {
            tier: MatchTier::Contact,
            comparables: Vec::new(),
        })
    }

    fn stages<'s>(
        &self,
        subject: &'s UnitSpecs,
        values: &'s AdjustmentValues,
        rules: &'s LadderRules,
        as_of: NaiveDate,
    ) -> Vec<TierStage<'s>> {
        vec![
            TierStage::new(MatchTier::Bingo, 1, move |candidates| {
                ladder::bingo(subject, rules, candidates)
            }),
            TierStage::new(MatchTier::Fair, 1, move |candidates| {
                ladder::fair(subject, rules, candidates)
            }),
            TierStage::new(MatchTier::Adjusted, 1, move |candidates| {
                ladder::adjusted(subject, rules, values, candidates, |candidate: &Candidate<'_>| {
                    similarity_score(subject, candidate.record, candidate.exact_sqft, as_of)
                })
            }),
            TierStage::new(MatchTier::Contact, 0, move |candidates| {
                ladder::contact(subject, rules, candidates)
            }),
        ]
    }
}
