use std::cell::Cell;
use std::convert::Infallible;

use super::common::*;
use crate::valuation::domain::{MatchQuality, MatchTier, TransactionRecord};
use crate::valuation::matching::{GeographyLevel, HomeComparableMatcher};

#[test]
fn community_pool_with_three_matches_skips_municipality() {
    let community = vec![
        home_sale("H1", "leslieville", "Semi-Detached", 1_150_000, 1_780, 20),
        home_sale("H2", "leslieville", "Link", 1_120_000, 1_850, 40),
        home_sale("H3", "leslieville", "Att/Row/Townhouse", 1_180_000, 1_900, 60),
    ];
    let loaded = Cell::new(false);

    let result = HomeComparableMatcher::sales()
        .find_with(&home_subject(), &sale_values(), &community, as_of(), || {
            loaded.set(true);
            Ok::<_, Infallible>(Vec::new())
        })
        .expect("infallible loader");

    assert_eq!(result.tier, MatchTier::Bingo);
    assert_eq!(result.geography, GeographyLevel::Community);
    assert_eq!(result.comparables.len(), 3);
    assert!(!loaded.get(), "municipality pool must not be queried");
}

#[test]
fn sparse_community_widens_to_municipality() {
    let community = vec![
        home_sale("H1", "leslieville", "Semi-Detached", 1_150_000, 1_780, 20),
        home_sale("H2", "leslieville", "Semi-Detached", 1_120_000, 1_850, 40),
    ];
    let mut municipality = community.clone();
    municipality.push(home_sale(
        "H3",
        "riverdale",
        "Semi-Detached",
        1_240_000,
        1_760,
        15,
    ));

    let result = HomeComparableMatcher::sales().find(
        &home_subject(),
        &sale_values(),
        &community,
        &municipality,
        as_of(),
    );

    assert_eq!(result.geography, GeographyLevel::Municipality);
    assert_eq!(result.tier, MatchTier::Bingo);
    assert_eq!(result.comparables.len(), 3);
    assert_eq!(result.comparables[0].record.listing_id, "H3");
}

#[test]
fn incompatible_subtypes_are_never_compared() {
    let community: Vec<TransactionRecord> = (0..4)
        .map(|index| {
            home_sale(
                &format!("D{index}"),
                "leslieville",
                "Detached",
                1_600_000,
                1_800,
                10 + index,
            )
        })
        .collect();

    let result = HomeComparableMatcher::sales().find(
        &home_subject(),
        &sale_values(),
        &community,
        &community,
        as_of(),
    );

    assert_eq!(result.tier, MatchTier::Contact);
    assert!(result.comparables.is_empty());
}

#[test]
fn exact_sqft_band_is_relative_to_subject() {
    let community = vec![
        home_sale("in-band", "leslieville", "Semi-Detached", 1_150_000, 1_980, 20),
        home_sale("out-of-band", "leslieville", "Semi-Detached", 1_190_000, 1_990, 30),
    ];

    let result = HomeComparableMatcher::sales().find(
        &home_subject(),
        &sale_values(),
        &community,
        &community,
        as_of(),
    );

    assert_eq!(result.geography, GeographyLevel::Municipality);
    assert_eq!(result.tier, MatchTier::Bingo);
    let ids: Vec<&str> = result
        .comparables
        .iter()
        .map(|comparable| comparable.record.listing_id.as_str())
        .collect();
    assert_eq!(ids, vec!["in-band"]);
}

#[test]
fn adjusted_home_ranking_rewards_lot_garage_and_age_similarity() {
    let mut similar = home_sale("similar", "leslieville", "Semi-Detached", 1_100_000, 1_800, 200);
    similar.bathrooms = 3;
    let mut dissimilar =
        home_sale("dissimilar", "leslieville", "Semi-Detached", 1_300_000, 1_800, 200);
    dissimilar.bathrooms = 3;
    dissimilar.lot_front = Some(35.0);
    dissimilar.garage_type = Some("None".to_string());
    dissimilar.approx_age = Some("0-5".to_string());
    dissimilar.basement_type = Some("Crawl Space".to_string());
    let mut third = home_sale("third", "leslieville", "Semi-Detached", 1_200_000, 1_800, 400);
    third.bathrooms = 3;

    let community = vec![dissimilar, similar, third];
    let result = HomeComparableMatcher::sales().find(
        &home_subject(),
        &sale_values(),
        &community,
        &[],
        as_of(),
    );

    assert_eq!(result.tier, MatchTier::Adjusted);
    assert_eq!(result.geography, GeographyLevel::Community);
    assert_eq!(result.comparables[0].record.listing_id, "similar");
    assert_eq!(result.comparables[2].record.listing_id, "dissimilar");
    for comparable in &result.comparables {
        assert_eq!(comparable.quality, MatchQuality::Good);
        assert_eq!(comparable.adjustments.len(), 1);
    }
}

#[test]
fn no_bedroom_match_anywhere_returns_municipality_references() {
    let mut subject = home_subject();
    subject.bedrooms = 5;
    let municipality = vec![
        home_sale("M1", "riverdale", "Semi-Detached", 1_240_000, 1_760, 15),
        home_sale("M2", "danforth", "Duplex", 1_340_000, 2_100, 25),
    ];

    let result = HomeComparableMatcher::sales().find(
        &subject,
        &sale_values(),
        &[],
        &municipality,
        as_of(),
    );

    assert_eq!(result.tier, MatchTier::Contact);
    assert_eq!(result.geography, GeographyLevel::Municipality);
    assert_eq!(result.comparables.len(), 1);
    assert_eq!(
        result.comparables[0].mismatches,
        vec!["3 bed vs your 5 bed".to_string()]
    );
}

#[test]
fn common_element_fee_narrows_home_sales_but_not_rentals() {
    let mut subject = home_subject();
    subject.exact_sqft = None;
    subject.association_fee = Some(300);
    let pool: Vec<TransactionRecord> = [("F1", Some(320)), ("F2", Some(270)), ("F3", Some(900))]
        .into_iter()
        .map(|(id, fee)| {
            let mut record = home_sale(id, "riverdale", "Semi-Detached", 1_150_000, 1_800, 20);
            record.association_fee = fee;
            record
        })
        .collect();

    let sales = HomeComparableMatcher::sales().find(&subject, &sale_values(), &[], &pool, as_of());
    assert_eq!(sales.tier, MatchTier::Fair);
    let ids: Vec<&str> = sales
        .comparables
        .iter()
        .map(|comparable| comparable.record.listing_id.as_str())
        .collect();
    assert_eq!(ids, vec!["F1", "F2"]);

    let rentals =
        HomeComparableMatcher::rentals().find(&subject, &sale_values(), &[], &pool, as_of());
    assert_eq!(rentals.tier, MatchTier::Fair);
    assert_eq!(rentals.comparables.len(), 3);
}
