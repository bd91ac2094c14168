use serde::{Deserialize, Serialize};

use super::super::domain::{Comparable, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketSpeedStatus {
    Fast,
    Moderate,
    Slow,
}

impl MarketSpeedStatus {
    pub fn from_average_days(days: f64) -> Self {
        if days < 30.0 {
            Self::Fast
        } else if days < 60.0 {
            Self::Moderate
        } else {
            Self::Slow
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Fast => "Fast",
            Self::Moderate => "Moderate",
            Self::Slow => "Slow",
        }
    }

    pub fn message(self, transaction_type: TransactionType) -> String {
        let (verb, noun) = match transaction_type {
            TransactionType::Sale => ("selling", "sale"),
            TransactionType::Lease => ("renting", "lease"),
        };
        match self {
            Self::Fast => format!(
                "Units like this are {verb} quickly. Expect competition and price accordingly."
            ),
            Self::Moderate => format!(
                "Units like this are {verb} at a steady pace, typically within one to two months of listing for {noun}."
            ),
            Self::Slow => format!(
                "Units like this are {verb} slowly. Sharp pricing and presentation matter for a timely {noun}."
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSpeed {
    pub avg_days_on_market: u32,
    pub status: MarketSpeedStatus,
    pub message: String,
}

/// Mean days-on-market classification; `None` when no comparable reports it.
pub fn market_speed(
    comparables: &[Comparable],
    transaction_type: TransactionType,
) -> Option<MarketSpeed> {
    let days: Vec<u32> = comparables
        .iter()
        .filter_map(|comparable| comparable.record.days_on_market)
        .collect();
    if days.is_empty() {
        return None;
    }

    let average = days.iter().map(|day| f64::from(*day)).sum::<f64>() / days.len() as f64;
    let status = MarketSpeedStatus::from_average_days(average);
    Some(MarketSpeed {
        avg_days_on_market: average.round() as u32,
        status,
        message: status.message(transaction_type),
    })
}
