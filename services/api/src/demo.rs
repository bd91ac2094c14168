use crate::infra::{load_stores, read_json_file, DataFiles};
use chrono::NaiveDate;
use clap::Args;
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use std::sync::Arc;
use unit_valuation::config::AppConfig;
use unit_valuation::error::AppError;
use unit_valuation::valuation::{
    CondoValuationRequest, HomeSpecs, HomeValuationRequest, OverrideBook, OverrideLevel,
    ResolvedAdjustments, TransactionLedger, TransactionType, UnitSpecs, ValuationOutcome,
    ValuationService,
};

const DEMO_BUILDING: &str = "demo-harbour";

const DEMO_TRANSACTIONS: &str = "listing_id,transaction_type,status,building_id,community_id,municipality_id,close_price,close_date,bedrooms,bathrooms,living_area_range,sqft_source,parking,locker,association_fee,days_on_market,property_subtype,lot_front,lot_depth,garage_type,basement_type,approx_age
D1,Sale,Closed,demo-harbour,waterfront,toronto,705000,2025-08-12,2,2,800-899,840,1,None,640,16,,,,,,
D2,Sale,Closed,demo-harbour,waterfront,toronto,699000,2025-07-02,2,2,800-899,870 sq ft,1,None,655,24,,,,,,
D3,Sale,Closed,demo-harbour,waterfront,toronto,712000,2025-05-20,2,2,800-899,828,1,None,630,31,,,,,,
D4,Sale,Closed,demo-harbour,waterfront,toronto,660000,2025-04-03,2,2,800-899,850,0,Owned,610,45,,,,,,
D5,Lease,Closed,demo-harbour,waterfront,toronto,3100,2025-08-01,2,2,800-899,845,1,None,,9,,,,,,
D6,Sale,Closed,demo-harbour,waterfront,toronto,2950,2025-06-01,2,2,800-899,850,1,None,,12,,,,,,
D7,Sale,Closed,demo-harbour,waterfront,toronto,520000,2022-11-15,2,2,800-899,850,1,None,600,20,,,,,,
H1,Sale,Closed,,leslieville,toronto,1185000,2025-08-05,3,2,1500-2000,1790,1,,,11,Semi-Detached,20,110,Detached,Finished,51-99
H2,Sale,Closed,,leslieville,toronto,1210000,2025-06-18,3,2,1500-2000,1850,1,,,8,Semi-Detached,21,100,Detached,Finished,51-99
H3,Sale,Closed,,leslieville,toronto,1149000,2025-03-09,3,2,1500-2000,1720,1,,,19,Link,18,105,None,Finished,31-50
H4,Sale,Closed,,riverdale,toronto,1325000,2025-07-14,3,3,1500-2000,1900,2,,,7,Semi-Detached,22,120,Detached,Finished,100+
";

const DEMO_OVERRIDES: &str = "level,key,transaction_type,parking_per_space,locker,bathroom
building,demo-harbour,sale,65000,,
community,waterfront,sale,,12000,
generic,,lease,,,175
";

const DEMO_BUILDINGS: &str = "building_id,community,neighbourhood,municipality,area
demo-harbour,waterfront,harbourfront,toronto,gta
";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Valuation date for the synthetic dataset (defaults to 2025-09-01)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Print raw JSON outcomes instead of the narrated summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct EstimateArgs {
    /// JSON file describing the subject unit (or home with --home)
    #[arg(long)]
    pub(crate) subject: PathBuf,
    /// Closed transaction export; falls back to VALUATION_TRANSACTIONS_CSV
    #[arg(long)]
    pub(crate) transactions: Option<PathBuf>,
    /// Adjustment override rows; falls back to VALUATION_OVERRIDES_CSV
    #[arg(long)]
    pub(crate) overrides: Option<PathBuf>,
    /// Building directory rows; falls back to VALUATION_BUILDINGS_CSV
    #[arg(long)]
    pub(crate) buildings: Option<PathBuf>,
    /// Estimate monthly rent instead of sale price
    #[arg(long)]
    pub(crate) lease: bool,
    /// Treat the subject as a freehold home
    #[arg(long)]
    pub(crate) home: bool,
    /// Valuation date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Print the raw JSON outcome
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let EstimateArgs {
        subject,
        transactions,
        overrides,
        buildings,
        lease,
        home,
        as_of,
        json,
    } = args;

    let config = AppConfig::load()?;
    let transactions = transactions.or(config.valuation.transactions_csv);
    if transactions.is_none() {
        return Err(AppError::Io(io::Error::new(
            ErrorKind::InvalidInput,
            "no transaction export given; pass --transactions or set VALUATION_TRANSACTIONS_CSV",
        )));
    }
    let overrides = overrides.or(config.valuation.overrides_csv);
    let buildings = buildings.or(config.valuation.buildings_csv);

    let (ledger, book) = load_stores(DataFiles {
        transactions: transactions.as_deref(),
        overrides: overrides.as_deref(),
        buildings: buildings.as_deref(),
    })?;
    let service = ValuationService::new(Arc::new(ledger), Arc::new(book))
        .with_sale_price_floor(config.valuation.sale_price_floor);

    let transaction_type = if lease {
        TransactionType::Lease
    } else {
        TransactionType::Sale
    };

    let outcome = if home {
        let specs: HomeSpecs = read_json_file(&subject)?;
        service.estimate_home(HomeValuationRequest {
            specs,
            transaction_type,
            as_of,
        })?
    } else {
        let specs: UnitSpecs = read_json_file(&subject)?;
        service.estimate_condo(CondoValuationRequest {
            specs,
            transaction_type,
            as_of,
        })?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        render_outcome(&outcome);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let as_of = args
        .as_of
        .or_else(|| NaiveDate::from_ymd_opt(2025, 9, 1));
    let service = demo_service()?;

    println!("Unit valuation demo");

    let scenarios: Vec<(&str, ValuationOutcome)> = vec![
        (
            "Condo sale, exact square footage on file",
            service.estimate_condo(CondoValuationRequest {
                specs: demo_unit(2),
                transaction_type: TransactionType::Sale,
                as_of,
            })?,
        ),
        (
            "Condo rental",
            service.estimate_condo(CondoValuationRequest {
                specs: demo_unit(2),
                transaction_type: TransactionType::Lease,
                as_of,
            })?,
        ),
        (
            "Three-bedroom unit with no three-bedroom history",
            service.estimate_condo(CondoValuationRequest {
                specs: demo_unit(3),
                transaction_type: TransactionType::Sale,
                as_of,
            })?,
        ),
        (
            "Semi-detached home",
            service.estimate_home(HomeValuationRequest {
                specs: demo_home(),
                transaction_type: TransactionType::Sale,
                as_of,
            })?,
        ),
    ];

    for (label, outcome) in &scenarios {
        println!("\n{label}");
        if args.json {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        } else {
            render_outcome(outcome);
        }
    }

    for transaction_type in [TransactionType::Sale, TransactionType::Lease] {
        let resolved = service.resolve_adjustments(DEMO_BUILDING, transaction_type)?;
        println!("\nAdjustment values for {DEMO_BUILDING} ({transaction_type})");
        render_adjustments(&resolved);
    }

    Ok(())
}

fn demo_service() -> Result<ValuationService<TransactionLedger, OverrideBook>, AppError> {
    let ledger = TransactionLedger::from_reader(DEMO_TRANSACTIONS.as_bytes())?;
    let mut book = OverrideBook::default();
    book.load_overrides(DEMO_OVERRIDES.as_bytes())?;
    book.load_buildings(DEMO_BUILDINGS.as_bytes())?;
    Ok(ValuationService::new(Arc::new(ledger), Arc::new(book)))
}

fn demo_unit(bedrooms: u8) -> UnitSpecs {
    UnitSpecs {
        building_id: DEMO_BUILDING.to_string(),
        bedrooms,
        bathrooms: 2,
        living_area_range: Some("800-899".to_string()),
        exact_sqft: Some(850),
        parking: 1,
        has_locker: false,
        annual_tax: Some(3_050),
        association_fee: Some(650),
    }
}

fn demo_home() -> HomeSpecs {
    HomeSpecs {
        community_id: "leslieville".to_string(),
        municipality_id: "toronto".to_string(),
        neighbourhood: None,
        area: Some("gta".to_string()),
        property_subtype: "Semi-Detached".to_string(),
        bedrooms: 3,
        bathrooms: 2,
        living_area_range: Some("1500-2000".to_string()),
        exact_sqft: Some(1_800),
        parking: 1,
        annual_tax: Some(5_600),
        lot_front: Some(20.0),
        lot_depth: Some(105.0),
        garage_type: Some("Detached".to_string()),
        basement_type: Some("Finished".to_string()),
        approx_age: Some("51-99".to_string()),
        association_fee: None,
    }
}

fn render_outcome(outcome: &ValuationOutcome) {
    match outcome {
        ValuationOutcome::Estimated {
            estimate,
            adjustment_values,
            geography,
        } => {
            println!(
                "- {} estimate: ${} (range ${} - ${}) | tier {} | {} confidence",
                estimate.transaction_type,
                estimate.estimated_price,
                estimate.price_range.low,
                estimate.price_range.high,
                estimate.tier.label(),
                estimate.confidence.label()
            );
            if let Some(geography) = geography {
                println!("- Comparables drawn from the {} pool", geography.label());
            }
            match &estimate.market_speed {
                Some(speed) => println!(
                    "- Market speed: {} ({} days avg) {}",
                    speed.status.label(),
                    speed.avg_days_on_market,
                    speed.message
                ),
                None => println!("- Market speed: no days-on-market data"),
            }
            let summary = &estimate.adjustment_summary;
            println!(
                "- {} perfect matches | {} adjusted | avg adjustment ${}",
                summary.perfect_match_count,
                summary.adjusted_comparable_count,
                summary.avg_adjustment_magnitude
            );
            println!(
                "- Values used: parking ${} | locker ${} | bathroom ${}",
                adjustment_values.values.parking_per_space,
                adjustment_values.values.locker,
                adjustment_values.values.bathroom
            );
            println!("Comparables:");
            for comparable in &estimate.comparables {
                let closed = comparable
                    .record
                    .close_date
                    .map(|date| date.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "  - {} closed {} at ${} -> ${} [{}]",
                    comparable.record.listing_id,
                    closed,
                    comparable.record.close_price.unwrap_or_default(),
                    comparable.effective_price().unwrap_or_default(),
                    comparable.quality.label()
                );
                for adjustment in &comparable.adjustments {
                    println!("      {:+} {}", adjustment.amount, adjustment.reason);
                }
            }
        }
        ValuationOutcome::ReferenceOnly {
            tier,
            comparables,
            message,
            geography,
        } => {
            println!("- Tier {}: {}", tier.label(), message);
            if let Some(geography) = geography {
                println!("- References drawn from the {} pool", geography.label());
            }
            if comparables.is_empty() {
                println!("- No reference transactions available");
            }
            for comparable in comparables {
                println!(
                    "  - {} ({} bed / {} bath): {}",
                    comparable.record.listing_id,
                    comparable.record.bedrooms,
                    comparable.record.bathrooms,
                    comparable.mismatches.join(", ")
                );
            }
        }
    }
}

fn render_adjustments(resolved: &ResolvedAdjustments) {
    let source = |level: Option<OverrideLevel>| level.map(OverrideLevel::label).unwrap_or("default");
    println!(
        "- parking ${} ({}) | locker ${} ({}) | bathroom ${} ({})",
        resolved.values.parking_per_space,
        source(resolved.source.parking_per_space),
        resolved.values.locker,
        source(resolved.source.locker),
        resolved.values.bathroom,
        source(resolved.source.bathroom)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use unit_valuation::valuation::{
        AdjustmentOverrideStore, MatchTier, PoolQuery, PoolScope, TransactionStore,
    };

    fn as_of() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2025, 9, 1)
    }

    #[test]
    fn demo_dataset_parses_and_filters_noise() {
        let ledger = TransactionLedger::from_reader(DEMO_TRANSACTIONS.as_bytes()).expect("parses");
        assert_eq!(ledger.len(), 11);

        let query = PoolQuery::new(
            PoolScope::Building(DEMO_BUILDING.to_string()),
            TransactionType::Sale,
            as_of().expect("valid date"),
        );
        let pool = ledger.comparable_pool(&query).expect("pool");
        let ids: Vec<&str> = pool.iter().map(|record| record.listing_id.as_str()).collect();
        assert_eq!(ids, vec!["D1", "D2", "D3", "D4"]);
    }

    #[test]
    fn demo_scenarios_cover_each_outcome() {
        let service = demo_service().expect("demo data loads");

        let sale = service
            .estimate_condo(CondoValuationRequest {
                specs: demo_unit(2),
                transaction_type: TransactionType::Sale,
                as_of: as_of(),
            })
            .expect("estimate");
        assert_eq!(sale.tier(), MatchTier::Bingo);
        assert_eq!(sale.comparables().len(), 3);

        let rental = service
            .estimate_condo(CondoValuationRequest {
                specs: demo_unit(2),
                transaction_type: TransactionType::Lease,
                as_of: as_of(),
            })
            .expect("estimate");
        assert_eq!(rental.estimated_price(), Some(3_100));

        let reference = service
            .estimate_condo(CondoValuationRequest {
                specs: demo_unit(3),
                transaction_type: TransactionType::Sale,
                as_of: as_of(),
            })
            .expect("reference outcome");
        assert_eq!(reference.tier(), MatchTier::Contact);
        assert!(reference.estimated_price().is_none());

        let home = service
            .estimate_home(HomeValuationRequest {
                specs: demo_home(),
                transaction_type: TransactionType::Sale,
                as_of: as_of(),
            })
            .expect("estimate");
        assert!(home.estimated_price().is_some());
    }

    #[test]
    fn demo_overrides_cascade_by_field() {
        let service = demo_service().expect("demo data loads");
        let resolved = service
            .resolve_adjustments(DEMO_BUILDING, TransactionType::Sale)
            .expect("resolves");
        assert_eq!(resolved.values.parking_per_space, 65_000);
        assert_eq!(resolved.source.parking_per_space, Some(OverrideLevel::Building));
        assert_eq!(resolved.values.locker, 12_000);
        assert_eq!(resolved.source.locker, Some(OverrideLevel::Community));
        assert_eq!(resolved.source.bathroom, None);

        let book = {
            let mut book = OverrideBook::default();
            book.load_overrides(DEMO_OVERRIDES.as_bytes()).expect("loads");
            book
        };
        let generic = book
            .override_for(OverrideLevel::Generic, "", TransactionType::Lease)
            .expect("lookup")
            .expect("generic lease row");
        assert_eq!(generic.bathroom, Some(175));
    }
}
