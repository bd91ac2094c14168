use super::common::*;
use crate::valuation::domain::{AdjustmentKind, MatchQuality, MatchTier, TransactionRecord};
use crate::valuation::matching::{ComparableMatcher, ADJUSTED_LIMIT, CONTACT_LIMIT};

fn find(pool: &[TransactionRecord]) -> crate::valuation::domain::MatchResult {
    ComparableMatcher::sales().find(&subject(), &sale_values(), pool, as_of())
}

#[test]
fn exact_sqft_matches_resolve_to_bingo() {
    let pool = vec![
        sale("A", 700_000, 830, 10),
        sale("B", 705_000, 850, 20),
        sale("C", 698_000, 870, 30),
        sale("D", 710_000, 845, 40),
    ];

    let result = find(&pool);

    assert_eq!(result.tier, MatchTier::Bingo);
    assert_eq!(result.comparables.len(), 4);
    assert!(result.comparables.iter().all(|comparable| {
        comparable.quality == MatchQuality::Perfect && comparable.adjustments.is_empty()
    }));
    assert_eq!(result.comparables[0].record.listing_id, "A");
}

#[test]
fn bingo_eligible_pool_never_falls_to_fair() {
    let mut outside_band = sale("far", 690_000, 960, 5);
    outside_band.living_area_range = Some("800-899".to_string());
    let pool = vec![outside_band, sale("near", 700_000, 880, 50)];

    let result = find(&pool);

    assert_eq!(result.tier, MatchTier::Bingo);
    assert_eq!(result.comparables.len(), 1);
    assert_eq!(result.comparables[0].record.listing_id, "near");
}

#[test]
fn unreliable_sqft_sources_drop_to_range_match() {
    let mut third_party = sale("A", 700_000, 850, 10);
    third_party.sqft_source = Some("850 3rd party".to_string());
    let mut range_only = sale("B", 705_000, 850, 20);
    range_only.sqft_source = Some("800-899".to_string());

    let result = find(&[third_party, range_only]);

    assert_eq!(result.tier, MatchTier::Fair);
    assert_eq!(result.comparables.len(), 2);
    assert!(result
        .comparables
        .iter()
        .all(|comparable| comparable.exact_sqft.is_none() && comparable.quality == MatchQuality::Good));
}

#[test]
fn fair_tier_enforces_fee_band_for_sales_only() {
    let mut subject = subject();
    subject.exact_sqft = None;

    let mut pricey_fee = sale("fee", 720_000, 850, 10);
    pricey_fee.association_fee = Some(950);
    let mut unknown_fee = sale("unknown", 710_000, 850, 20);
    unknown_fee.association_fee = None;
    let pool = vec![pricey_fee, unknown_fee];

    let sales = ComparableMatcher::sales().find(&subject, &sale_values(), &pool, as_of());
    assert_eq!(sales.tier, MatchTier::Fair);
    let ids: Vec<&str> = sales
        .comparables
        .iter()
        .map(|comparable| comparable.record.listing_id.as_str())
        .collect();
    assert_eq!(ids, vec!["unknown"]);

    let mut rental = lease("fee", 3_100, 10);
    rental.association_fee = Some(950);
    let rentals = ComparableMatcher::rentals().find(&subject, &sale_values(), &[rental], as_of());
    assert_eq!(rentals.tier, MatchTier::Fair);
}

#[test]
fn adjusted_tier_itemizes_differences_and_grades_quality() {
    let mut one_off = sale("parking", 650_000, 850, 15);
    one_off.parking = 0;
    let mut two_off = sale("bath-locker", 640_000, 850, 25);
    two_off.bathrooms = 1;
    two_off.has_locker = true;
    let mut same_config_other_range = sale("range", 660_000, 850, 35);
    same_config_other_range.sqft_source = None;
    same_config_other_range.living_area_range = Some("900-999".to_string());
    let mut other_beds = sale("beds", 900_000, 850, 5);
    other_beds.bedrooms = 3;

    let result = find(&[one_off, two_off, same_config_other_range, other_beds]);

    assert_eq!(result.tier, MatchTier::Adjusted);
    assert_eq!(result.comparables.len(), 3);
    assert!(result
        .comparables
        .iter()
        .all(|comparable| comparable.record.bedrooms == 2));

    let parking = result
        .comparables
        .iter()
        .find(|comparable| comparable.record.listing_id == "parking")
        .expect("parking comparable present");
    assert_eq!(parking.quality, MatchQuality::Good);
    assert_eq!(parking.adjustments[0].kind, AdjustmentKind::Parking);
    assert_eq!(parking.adjusted_price, Some(700_000));

    let two = result
        .comparables
        .iter()
        .find(|comparable| comparable.record.listing_id == "bath-locker")
        .expect("bath/locker comparable present");
    assert_eq!(two.quality, MatchQuality::Fair);
    assert_eq!(two.adjustments.len(), 2);
    assert_eq!(two.adjusted_price, Some(640_000 - 10_000 + 25_000));

    let range = result
        .comparables
        .iter()
        .find(|comparable| comparable.record.listing_id == "range")
        .expect("range comparable present");
    assert_eq!(range.quality, MatchQuality::Excellent);
    assert_eq!(range.adjusted_price, Some(660_000));
}

#[test]
fn adjusted_tier_keeps_the_ten_closest() {
    let pool: Vec<TransactionRecord> = (0..14)
        .map(|index| {
            let mut record = sale(&format!("S{index}"), 600_000 + index * 1_000, 850, 10);
            record.bathrooms = if index < 10 { 2 } else { 3 };
            record.parking = 0;
            record
        })
        .collect();

    let result = find(&pool);

    assert_eq!(result.tier, MatchTier::Adjusted);
    assert_eq!(result.comparables.len(), ADJUSTED_LIMIT);
    assert!(result
        .comparables
        .iter()
        .all(|comparable| comparable.record.bathrooms == 2));
}

#[test]
fn no_bedroom_match_returns_annotated_references() {
    let mut subject = subject();
    subject.bedrooms = 3;
    let pool: Vec<TransactionRecord> = (0..6)
        .map(|index| sale(&format!("R{index}"), 650_000, 850, 10 + index))
        .collect();

    let result = ComparableMatcher::sales().find(&subject, &sale_values(), &pool, as_of());

    assert_eq!(result.tier, MatchTier::Contact);
    assert_eq!(result.comparables.len(), CONTACT_LIMIT);
    assert_eq!(result.comparables[0].record.listing_id, "R0");
    for comparable in &result.comparables {
        assert!(comparable.adjusted_price.is_none());
        assert!(comparable
            .mismatches
            .iter()
            .any(|reason| reason == "2 bed vs your 3 bed"));
    }
}

#[test]
fn empty_pool_is_contact_with_no_comparables() {
    let result = find(&[]);
    assert_eq!(result.tier, MatchTier::Contact);
    assert!(result.comparables.is_empty());
}
