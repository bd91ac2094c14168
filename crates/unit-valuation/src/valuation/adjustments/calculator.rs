use chrono::NaiveDate;

use super::super::domain::{
    Adjustment, AdjustmentKind, AdjustmentValues, AgeBracket, HomeSpecs, LivingAreaRange,
    TransactionRecord, UnitSpecs,
};

/// Itemized adjustments normalizing `record` to the subject configuration.
///
/// Dimensions without a difference produce no entry, so the list length is
/// the number of features that had to be reconciled.
pub fn compute_adjustments(
    subject: &UnitSpecs,
    record: &TransactionRecord,
    values: &AdjustmentValues,
) -> Vec<Adjustment> {
    let mut adjustments = Vec::new();

    let parking_diff = i32::from(subject.parking) - i32::from(record.parking);
    if parking_diff != 0 {
        adjustments.push(Adjustment {
            kind: AdjustmentKind::Parking,
            difference: parking_diff,
            amount: i64::from(parking_diff) * values.parking_per_space,
            reason: format!(
                "{} parking vs your {}",
                record.parking, subject.parking
            ),
        });
    }

    if subject.has_locker != record.has_locker {
        let (difference, amount, reason) = if subject.has_locker {
            (1, values.locker, "no locker vs your locker")
        } else {
            (-1, -values.locker, "has locker vs your none")
        };
        adjustments.push(Adjustment {
            kind: AdjustmentKind::Locker,
            difference,
            amount,
            reason: reason.to_string(),
        });
    }

    let bathroom_diff = i32::from(subject.bathrooms) - i32::from(record.bathrooms);
    if bathroom_diff != 0 {
        adjustments.push(Adjustment {
            kind: AdjustmentKind::Bathroom,
            difference: bathroom_diff,
            amount: i64::from(bathroom_diff) * values.bathroom,
            reason: format!(
                "{} bath vs your {}",
                record.bathrooms, subject.bathrooms
            ),
        });
    }

    adjustments
}

pub fn adjusted_price(close_price: i64, adjustments: &[Adjustment]) -> i64 {
    close_price
        + adjustments
            .iter()
            .map(|adjustment| adjustment.amount)
            .sum::<i64>()
}

/// Similarity of an adjusted-tier candidate to a condo subject; higher is closer.
pub fn similarity_score(
    subject: &UnitSpecs,
    record: &TransactionRecord,
    record_sqft: Option<u32>,
    as_of: NaiveDate,
) -> f64 {
    configuration_score(subject, record, record_sqft, as_of, true)
}

fn configuration_score(
    subject: &UnitSpecs,
    record: &TransactionRecord,
    record_sqft: Option<u32>,
    as_of: NaiveDate,
    compare_locker: bool,
) -> f64 {
    let mut score = 100.0;

    score -= 15.0 * f64::from(subject.bathrooms.abs_diff(record.bathrooms));
    score += size_closeness(
        subject.exact_sqft,
        subject.living_area_range.as_deref(),
        record_sqft,
        record.living_area_range.as_deref(),
    );
    score -= 8.0 * f64::from(subject.parking.abs_diff(record.parking));
    if compare_locker && subject.has_locker == record.has_locker {
        score += 5.0;
    }
    score + recency_bonus(record.close_date, as_of)
}

/// Condo similarity without the locker term, plus lot, garage, basement and age-bracket terms.
pub fn home_similarity_score(
    subject: &HomeSpecs,
    record: &TransactionRecord,
    record_sqft: Option<u32>,
    as_of: NaiveDate,
) -> f64 {
    let mut score = configuration_score(&subject.as_unit(), record, record_sqft, as_of, false);

    if let (Some(subject_lot), Some(record_lot)) = (subject.lot_area(), record.lot_area()) {
        let relative = (subject_lot - record_lot).abs() / subject_lot;
        score += if relative <= 0.10 {
            15.0
        } else if relative <= 0.20 {
            10.0
        } else if relative <= 0.30 {
            5.0
        } else {
            0.0
        };
    }

    if labels_match(subject.garage_type.as_deref(), record.garage_type.as_deref()) {
        score += 10.0;
    }
    if labels_match(subject.basement_type.as_deref(), record.basement_type.as_deref()) {
        score += 5.0;
    }

    let subject_age = subject.approx_age.as_deref().and_then(AgeBracket::parse);
    let record_age = record.approx_age.as_deref().and_then(AgeBracket::parse);
    if let (Some(subject_age), Some(record_age)) = (subject_age, record_age) {
        score += match subject_age.distance(record_age) {
            0 => 10.0,
            1 => 5.0,
            _ => 0.0,
        };
    }

    score
}

fn size_closeness(
    subject_sqft: Option<u32>,
    subject_range: Option<&str>,
    record_sqft: Option<u32>,
    record_range: Option<&str>,
) -> f64 {
    if let (Some(subject), Some(record)) = (subject_sqft, record_sqft) {
        let diff = f64::from(subject.abs_diff(record));
        return 20.0 - (diff / 25.0).min(30.0);
    }

    if let (Some(subject), Some(record)) = (subject_range, record_range) {
        if subject.trim() == record.trim() {
            return 15.0;
        }
        if let (Some(subject), Some(record)) =
            (LivingAreaRange::parse(subject), LivingAreaRange::parse(record))
        {
            let diff = f64::from(subject.midpoint().abs_diff(record.midpoint()));
            return 10.0 - (diff / 50.0).min(25.0);
        }
    }

    0.0
}

fn recency_bonus(close_date: Option<NaiveDate>, as_of: NaiveDate) -> f64 {
    let Some(close_date) = close_date else {
        return 0.0;
    };
    let days = (as_of - close_date).num_days();
    if days <= 91 {
        10.0
    } else if days <= 182 {
        6.0
    } else if days <= 365 {
        3.0
    } else {
        0.0
    }
}

fn labels_match(subject: Option<&str>, record: Option<&str>) -> bool {
    match (subject, record) {
        (Some(subject), Some(record)) => subject.trim().eq_ignore_ascii_case(record.trim()),
        _ => false,
    }
}
