use std::cmp::Ordering;

use super::super::adjustments::{adjusted_price, compute_adjustments};
use super::super::domain::{
    AdjustmentKind, AdjustmentValues, Comparable, MatchQuality, MatchResult, MatchTier,
    TransactionRecord, UnitSpecs,
};
use super::super::sqft::extract_exact_sqft;

/// Most comparables returned from the adjusted tier.
pub const ADJUSTED_LIMIT: usize = 10;
/// Most reference-only comparables returned from the contact tier.
pub const CONTACT_LIMIT: usize = 5;

/// Pool row with its exact square footage extracted once.
#[derive(Debug, Clone)]
pub(crate) struct Candidate<'a> {
    pub record: &'a TransactionRecord,
    pub exact_sqft: Option<u32>,
}

/// Most recent first; rows without a close date sort last.
pub(crate) fn prepare<'a, I>(records: I) -> Vec<Candidate<'a>>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut candidates: Vec<Candidate<'a>> = records
        .into_iter()
        .map(|record| Candidate {
            record,
            exact_sqft: extract_exact_sqft(record.sqft_source.as_deref()),
        })
        .collect();
    candidates.sort_by(|a, b| b.record.close_date.cmp(&a.record.close_date));
    candidates
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SizeTolerance {
    /// Fixed band in square feet.
    Absolute(u32),
    /// Fraction of the subject's square footage.
    Relative(f64),
}

impl SizeTolerance {
    fn admits(self, subject: u32, candidate: u32) -> bool {
        let diff = subject.abs_diff(candidate);
        match self {
            SizeTolerance::Absolute(band) => diff <= band,
            SizeTolerance::Relative(fraction) => f64::from(diff) <= f64::from(subject) * fraction,
        }
    }
}

/// Feature rules shared by every stage of one ladder.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LadderRules {
    pub size_tolerance: SizeTolerance,
    pub fee_band: bool,
    pub compare_locker: bool,
}

impl LadderRules {
    fn same_configuration(&self, subject: &UnitSpecs, record: &TransactionRecord) -> bool {
        record.bedrooms == subject.bedrooms
            && record.bathrooms == subject.bathrooms
            && record.parking == subject.parking
            && (!self.compare_locker || record.has_locker == subject.has_locker)
    }
}

type Selector<'s> = Box<dyn Fn(&[Candidate<'_>]) -> Vec<Comparable> + 's>;

/// One rung of the fallback ladder.
pub(crate) struct TierStage<'s> {
    pub tier: MatchTier,
    pub min_count: usize,
    select: Selector<'s>,
}

impl<'s> TierStage<'s> {
    pub fn new<F>(tier: MatchTier, min_count: usize, select: F) -> Self
    where
        F: Fn(&[Candidate<'_>]) -> Vec<Comparable> + 's,
    {
        Self {
            tier,
            min_count,
            select: Box::new(select),
        }
    }
}

/// First stage whose selection reaches its minimum count wins.
///
/// A stage with `min_count == 0` is terminal and accepts even an empty selection.
pub(crate) fn run_ladder(
    stages: &[TierStage<'_>],
    candidates: &[Candidate<'_>],
) -> Option<MatchResult> {
    stages.iter().find_map(|stage| {
        let comparables = (stage.select)(candidates);
        let accepted = stage.min_count == 0 || comparables.len() >= stage.min_count;
        accepted.then(|| MatchResult {
            tier: stage.tier,
            comparables,
        })
    })
}

pub(crate) fn bingo(
    subject: &UnitSpecs,
    rules: &LadderRules,
    candidates: &[Candidate<'_>],
) -> Vec<Comparable> {
    let Some(subject_sqft) = subject.exact_sqft else {
        return Vec::new();
    };

    candidates
        .iter()
        .filter(|candidate| rules.same_configuration(subject, candidate.record))
        .filter(|candidate| {
            candidate
                .exact_sqft
                .is_some_and(|sqft| rules.size_tolerance.admits(subject_sqft, sqft))
        })
        .map(|candidate| unadjusted(candidate, MatchTier::Bingo, MatchQuality::Perfect))
        .collect()
}

pub(crate) fn fair(
    subject: &UnitSpecs,
    rules: &LadderRules,
    candidates: &[Candidate<'_>],
) -> Vec<Comparable> {
    let Some(subject_range) = subject.living_area_range.as_deref().map(str::trim) else {
        return Vec::new();
    };

    candidates
        .iter()
        .filter(|candidate| rules.same_configuration(subject, candidate.record))
        .filter(|candidate| {
            candidate
                .record
                .living_area_range
                .as_deref()
                .is_some_and(|range| range.trim() == subject_range)
        })
        .filter(|candidate| {
            !rules.fee_band || within_fee_band(subject.association_fee, candidate.record.association_fee)
        })
        .map(|candidate| unadjusted(candidate, MatchTier::Fair, MatchQuality::Good))
        .collect()
}

/// Fee within 20% of the subject's; unknown fees on either side impose no constraint.
pub(crate) fn within_fee_band(subject_fee: Option<i64>, candidate_fee: Option<i64>) -> bool {
    match (subject_fee, candidate_fee) {
        (Some(subject), Some(candidate)) => (candidate - subject).abs() * 5 <= subject.abs(),
        _ => true,
    }
}

pub(crate) fn adjusted<S>(
    subject: &UnitSpecs,
    rules: &LadderRules,
    values: &AdjustmentValues,
    candidates: &[Candidate<'_>],
    score: S,
) -> Vec<Comparable>
where
    S: Fn(&Candidate<'_>) -> f64,
{
    let mut scored: Vec<(f64, Comparable)> = candidates
        .iter()
        .filter(|candidate| candidate.record.bedrooms == subject.bedrooms)
        .filter_map(|candidate| {
            let close_price = candidate.record.close_price?;
            let mut adjustments = compute_adjustments(subject, candidate.record, values);
            if !rules.compare_locker {
                adjustments.retain(|adjustment| adjustment.kind != AdjustmentKind::Locker);
            }
            let comparable = Comparable {
                record: candidate.record.clone(),
                exact_sqft: candidate.exact_sqft,
                tier: MatchTier::Adjusted,
                quality: MatchQuality::from_adjustment_count(adjustments.len()),
                adjusted_price: Some(adjusted_price(close_price, &adjustments)),
                adjustments,
                mismatches: Vec::new(),
            };
            Some((score(candidate), comparable))
        })
        .collect();

    // Stable sort keeps the most recent first among equal scores.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored
        .into_iter()
        .take(ADJUSTED_LIMIT)
        .map(|(_, comparable)| comparable)
        .collect()
}

/// Most recent transactions as reference only, each explaining how it differs.
pub(crate) fn contact(
    subject: &UnitSpecs,
    rules: &LadderRules,
    candidates: &[Candidate<'_>],
) -> Vec<Comparable> {
    candidates
        .iter()
        .take(CONTACT_LIMIT)
        .map(|candidate| {
            let record = candidate.record;
            let mut mismatches = Vec::new();
            if record.bedrooms != subject.bedrooms {
                mismatches.push(format!(
                    "{} bed vs your {} bed",
                    record.bedrooms, subject.bedrooms
                ));
            }
            if record.bathrooms != subject.bathrooms {
                mismatches.push(format!(
                    "{} bath vs your {} bath",
                    record.bathrooms, subject.bathrooms
                ));
            }
            if record.parking != subject.parking {
                mismatches.push(format!(
                    "{} parking vs your {} parking",
                    record.parking, subject.parking
                ));
            }
            if rules.compare_locker && record.has_locker != subject.has_locker {
                mismatches.push(if record.has_locker {
                    "has locker vs your none".to_string()
                } else {
                    "no locker vs your locker".to_string()
                });
            }

            Comparable {
                record: record.clone(),
                exact_sqft: candidate.exact_sqft,
                tier: MatchTier::Contact,
                quality: MatchQuality::Fair,
                adjustments: Vec::new(),
                adjusted_price: None,
                mismatches,
            }
        })
        .collect()
}

fn unadjusted(candidate: &Candidate<'_>, tier: MatchTier, quality: MatchQuality) -> Comparable {
    Comparable {
        record: candidate.record.clone(),
        exact_sqft: candidate.exact_sqft,
        tier,
        quality,
        adjustments: Vec::new(),
        adjusted_price: candidate.record.close_price,
        mismatches: Vec::new(),
    }
}
