use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::super::domain::{AdjustmentValues, TransactionType};
use super::super::store::{
    AdjustmentOverride, AdjustmentOverrideStore, BuildingGeography, OverrideLevel, StoreError,
};

/// Hardcoded values used when no override level supplies a field.
pub const fn default_values(transaction_type: TransactionType) -> AdjustmentValues {
    match transaction_type {
        TransactionType::Sale => AdjustmentValues {
            parking_per_space: 50_000,
            locker: 10_000,
            bathroom: 25_000,
        },
        // Monthly figures.
        TransactionType::Lease => AdjustmentValues {
            parking_per_space: 200,
            locker: 50,
            bathroom: 150,
        },
    }
}

/// Level that supplied a resolved field; `None` means the hardcoded default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolutionSource {
    pub parking_per_space: Option<OverrideLevel>,
    pub locker: Option<OverrideLevel>,
    pub bathroom: Option<OverrideLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedAdjustments {
    pub values: AdjustmentValues,
    pub source: ResolutionSource,
}

/// Fold ordered partial overrides into effective values, first non-null wins per field.
pub fn cascade(
    levels: &[(OverrideLevel, AdjustmentOverride)],
    defaults: AdjustmentValues,
) -> ResolvedAdjustments {
    fn first<F>(
        levels: &[(OverrideLevel, AdjustmentOverride)],
        field: F,
    ) -> Option<(OverrideLevel, i64)>
    where
        F: Fn(&AdjustmentOverride) -> Option<i64>,
    {
        levels
            .iter()
            .find_map(|(level, row)| field(row).map(|value| (*level, value)))
    }

    let parking = first(levels, |row| row.parking_per_space);
    let locker = first(levels, |row| row.locker);
    let bathroom = first(levels, |row| row.bathroom);

    ResolvedAdjustments {
        values: AdjustmentValues {
            parking_per_space: parking.map_or(defaults.parking_per_space, |(_, value)| value),
            locker: locker.map_or(defaults.locker, |(_, value)| value),
            bathroom: bathroom.map_or(defaults.bathroom, |(_, value)| value),
        },
        source: ResolutionSource {
            parking_per_space: parking.map(|(level, _)| level),
            locker: locker.map(|(level, _)| level),
            bathroom: bathroom.map(|(level, _)| level),
        },
    }
}

/// Keys used to walk the override hierarchy for one subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjustmentScope {
    pub building_id: Option<String>,
    pub geography: BuildingGeography,
}

impl AdjustmentScope {
    fn key(&self, level: OverrideLevel) -> Option<&str> {
        match level {
            OverrideLevel::Building => self.building_id.as_deref(),
            OverrideLevel::Community => self.geography.community.as_deref(),
            OverrideLevel::Neighbourhood => self.geography.neighbourhood.as_deref(),
            OverrideLevel::Municipality => self.geography.municipality.as_deref(),
            OverrideLevel::Area => self.geography.area.as_deref(),
            OverrideLevel::Generic => Some(""),
        }
    }
}

/// Resolves effective adjustment values through the override hierarchy.
pub struct AdjustmentResolver<O> {
    store: Arc<O>,
}

impl<O> AdjustmentResolver<O>
where
    O: AdjustmentOverrideStore,
{
    pub fn new(store: Arc<O>) -> Self {
        Self { store }
    }

    /// Resolve for a condo building; unknown buildings fall through to the generic row.
    pub fn resolve(
        &self,
        building_id: &str,
        transaction_type: TransactionType,
    ) -> Result<ResolvedAdjustments, StoreError> {
        let geography = self
            .store
            .building_geography(building_id)?
            .unwrap_or_default();
        let scope = AdjustmentScope {
            building_id: Some(building_id.to_string()),
            geography,
        };
        self.resolve_scope(&scope, transaction_type)
    }

    pub fn resolve_scope(
        &self,
        scope: &AdjustmentScope,
        transaction_type: TransactionType,
    ) -> Result<ResolvedAdjustments, StoreError> {
        let mut levels = Vec::new();
        for level in OverrideLevel::ordered() {
            let Some(key) = scope.key(level) else {
                continue;
            };
            if let Some(row) = self.store.override_for(level, key, transaction_type)? {
                levels.push((level, row));
            }
        }

        let resolved = cascade(&levels, default_values(transaction_type));
        debug!(
            building = scope.building_id.as_deref().unwrap_or("-"),
            transaction_type = transaction_type.label(),
            parking_from = source_label(resolved.source.parking_per_space),
            locker_from = source_label(resolved.source.locker),
            bathroom_from = source_label(resolved.source.bathroom),
            "resolved adjustment values"
        );
        Ok(resolved)
    }
}

fn source_label(level: Option<OverrideLevel>) -> &'static str {
    level.map_or("default", OverrideLevel::label)
}
