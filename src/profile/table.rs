use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::codec::DpId;
use crate::transform::conversion_exists;

use super::entry::MappingEntry;
use super::identity::DriverType;

/// Errors detected while loading profile data.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ProfileError {
    /// A mapping entry references a conversion name with no registered
    /// implementation. This is configuration damage, caught at load time.
    #[error("mapping entry for datapoint {dp_id} references unknown conversion `{conversion}`")]
    UnknownConversion { dp_id: u8, conversion: String },
}

/// Provenance of a resolved mapping table.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum ProfileSource {
    /// Tier 1: an exact manufacturer profile.
    Manufacturer { manufacturer: String },
    /// Tier 1 via a single-hop `inherit` redirection.
    Inherited {
        manufacturer: String,
        inherited_from: String,
    },
    /// Tier 2: a driver-type fallback profile.
    DriverType { driver_type: DriverType },
    /// Tier 3 only: no profile matched; universal conventions apply.
    UniversalOnly,
}

impl fmt::Display for ProfileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manufacturer { manufacturer } => write!(f, "manufacturer:{manufacturer}"),
            Self::Inherited {
                manufacturer,
                inherited_from,
            } => write!(f, "manufacturer:{manufacturer} (inherits {inherited_from})"),
            Self::DriverType { driver_type } => write!(f, "driver_type:{driver_type}"),
            Self::UniversalOnly => write!(f, "universal"),
        }
    }
}

/// Resolved datapoint mappings for one device identity.
///
/// Built once at device initialisation and never mutated afterwards; later
/// entries for the same datapoint override earlier ones during construction,
/// which is how profile entries take precedence over universal conventions.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingTable {
    source: ProfileSource,
    by_dp: BTreeMap<DpId, MappingEntry>,
    by_capability: HashMap<(&'static str, Option<&'static str>), DpId>,
}

impl MappingTable {
    pub(crate) fn from_entries(source: ProfileSource, entries: Vec<MappingEntry>) -> Self {
        let mut by_dp = BTreeMap::new();
        let mut by_capability = HashMap::new();
        for entry in entries {
            by_capability.insert((entry.capability(), entry.sub_channel()), entry.dp_id());
            by_dp.insert(entry.dp_id(), entry);
        }
        Self {
            source,
            by_dp,
            by_capability,
        }
    }

    /// Returns where this table came from in the resolution chain.
    #[must_use]
    pub fn source(&self) -> &ProfileSource {
        &self.source
    }

    /// Returns the entry mapped for one datapoint id.
    #[must_use]
    pub fn entry(&self, dp_id: DpId) -> Option<&MappingEntry> {
        self.by_dp.get(&dp_id)
    }

    /// Returns the entry for a capability write target.
    #[must_use]
    pub fn entry_for_capability(
        &self,
        capability: &str,
        sub_channel: Option<&str>,
    ) -> Option<&MappingEntry> {
        let dp_id = self
            .by_capability
            .iter()
            .find(|((cap, sub), _)| *cap == capability && sub.as_deref() == sub_channel)
            .map(|(_, dp_id)| *dp_id)?;
        self.by_dp.get(&dp_id)
    }

    /// Returns all entries in datapoint-id order.
    pub fn entries(&self) -> impl Iterator<Item = &MappingEntry> {
        self.by_dp.values()
    }

    /// Returns the number of mapped datapoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_dp.len()
    }

    /// Returns whether the table maps no datapoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_dp.is_empty()
    }
}

/// Validates that every conversion referenced by `entries` is registered.
pub(crate) fn validate_entries(entries: &[MappingEntry]) -> Result<(), ProfileError> {
    for entry in entries {
        if let Some(conversion) = entry.conversion() {
            if !conversion_exists(conversion) {
                return Err(ProfileError::UnknownConversion {
                    dp_id: entry.dp_id().value(),
                    conversion: conversion.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use crate::codec::DpType;
    use crate::profile::capability;

    use super::*;

    fn dp(value: u8) -> DpId {
        DpId::new(value).expect("test ids are non-zero")
    }

    fn onoff_entry(dp_id: u8, sub_channel: Option<&'static str>) -> MappingEntry {
        MappingEntry::builder()
            .dp_id(dp(dp_id))
            .dp_type(DpType::Bool)
            .capability(capability::ONOFF)
            .maybe_sub_channel(sub_channel)
            .build()
    }

    #[test]
    fn later_entries_override_earlier_datapoints() {
        let battery = MappingEntry::builder()
            .dp_id(dp(4))
            .dp_type(DpType::Value)
            .capability(capability::MEASURE_BATTERY)
            .conversion("battery-percent")
            .build();
        let table = MappingTable::from_entries(
            ProfileSource::UniversalOnly,
            vec![battery, onoff_entry(4, Some("gang4"))],
        );

        assert_eq!(1, table.len());
        assert_eq!(
            Some(capability::ONOFF),
            table.entry(dp(4)).map(MappingEntry::capability)
        );
    }

    #[test]
    fn reverse_index_distinguishes_sub_channels() {
        let table = MappingTable::from_entries(
            ProfileSource::UniversalOnly,
            vec![onoff_entry(1, None), onoff_entry(2, Some("gang2"))],
        );

        assert_eq!(
            Some(dp(1)),
            table
                .entry_for_capability(capability::ONOFF, None)
                .map(MappingEntry::dp_id)
        );
        assert_eq!(
            Some(dp(2)),
            table
                .entry_for_capability(capability::ONOFF, Some("gang2"))
                .map(MappingEntry::dp_id)
        );
        assert_eq!(
            None,
            table
                .entry_for_capability(capability::ONOFF, Some("gang3"))
                .map(MappingEntry::dp_id)
        );
    }

    #[test]
    fn validate_entries_rejects_unknown_conversion_names() {
        let entry = MappingEntry::builder()
            .dp_id(dp(7))
            .dp_type(DpType::Value)
            .capability(capability::MEASURE_TEMPERATURE)
            .conversion("kelvin-hundredths")
            .build();

        let result = validate_entries(&[entry]);
        assert_matches!(
            result,
            Err(ProfileError::UnknownConversion { dp_id: 7, conversion })
            if conversion == "kelvin-hundredths"
        );
    }
}
