use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::instrument;

use super::categories::category_profiles;
use super::entry::MappingEntry;
use super::identity::{DeviceIdentity, DriverType};
use super::table::{MappingTable, ProfileError, ProfileSource, validate_entries};
use super::universal::universal_entries;
use super::vendors::vendor_profiles;

/// One tier-1 profile record: either concrete entries or a single-hop
/// redirection to another manufacturer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum VendorProfile {
    Entries(Vec<MappingEntry>),
    Inherit(&'static str),
}

/// Immutable profile data injected into resolution.
///
/// Loaded once at process start; resolution never mutates it and performs no
/// I/O.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    vendors: HashMap<&'static str, VendorProfile>,
    categories: HashMap<DriverType, Vec<MappingEntry>>,
    universal: Vec<MappingEntry>,
}

static BUILTIN: LazyLock<ProfileRegistry> = LazyLock::new(|| {
    ProfileRegistry::new(vendor_profiles(), category_profiles(), universal_entries())
        .expect("built-in profile tables reference only registered conversions")
});

impl ProfileRegistry {
    /// Creates a registry from profile data, validating every conversion name.
    ///
    /// # Errors
    ///
    /// Returns an error when any entry references an unregistered conversion.
    pub(crate) fn new(
        vendors: HashMap<&'static str, VendorProfile>,
        categories: HashMap<DriverType, Vec<MappingEntry>>,
        universal: Vec<MappingEntry>,
    ) -> Result<Self, ProfileError> {
        for profile in vendors.values() {
            if let VendorProfile::Entries(entries) = profile {
                validate_entries(entries)?;
            }
        }
        for entries in categories.values() {
            validate_entries(entries)?;
        }
        validate_entries(&universal)?;

        Ok(Self {
            vendors,
            categories,
            universal,
        })
    }

    /// Returns the registry of profiles shipped with the crate.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    fn vendor(&self, manufacturer: &str) -> Option<&VendorProfile> {
        self.vendors.get(manufacturer)
    }

    fn category(&self, driver_type: DriverType) -> Option<&[MappingEntry]> {
        self.categories.get(&driver_type).map(Vec::as_slice)
    }
}

/// Resolves the mapping table for one device identity.
pub struct ProfileResolver;

impl ProfileResolver {
    /// Resolves a mapping table through the four-tier priority chain.
    ///
    /// Pure and deterministic: the same identity always yields an identical
    /// table. Resolution never fails; an identity nothing matches gets the
    /// universal conventions only.
    ///
    /// ```
    /// use tuyadp::{DeviceIdentity, ProfileRegistry, ProfileResolver};
    ///
    /// let identity = DeviceIdentity::new("_TZE200_cwbvmsar", "TS0601", "climate_sensor");
    /// let table = ProfileResolver::resolve(ProfileRegistry::builtin(), &identity);
    /// assert_eq!("manufacturer:_TZE200_cwbvmsar", table.source().to_string());
    /// ```
    #[must_use]
    #[instrument(skip(registry), level = "debug", fields(manufacturer = identity.manufacturer()))]
    pub fn resolve(registry: &ProfileRegistry, identity: &DeviceIdentity) -> MappingTable {
        let profile = Self::resolve_profile(registry, identity);

        let mut entries: Vec<MappingEntry> = match &profile {
            // A concrete profile suppresses multi-use universal conventions;
            // its own entries override the rest per datapoint.
            Some((_, _)) => registry
                .universal
                .iter()
                .filter(|entry| !entry.multi_use())
                .copied()
                .collect(),
            None => registry.universal.clone(),
        };

        let source = match profile {
            Some((source, profile_entries)) => {
                entries.extend(profile_entries);
                source
            }
            None => ProfileSource::UniversalOnly,
        };

        MappingTable::from_entries(source, entries)
    }

    fn resolve_profile(
        registry: &ProfileRegistry,
        identity: &DeviceIdentity,
    ) -> Option<(ProfileSource, Vec<MappingEntry>)> {
        if let Some(found) = Self::resolve_manufacturer(registry, identity.manufacturer()) {
            return Some(found);
        }

        let driver_type = identity.driver_category()?;
        let entries = registry.category(driver_type)?;
        Some((
            ProfileSource::DriverType { driver_type },
            entries.to_vec(),
        ))
    }

    fn resolve_manufacturer(
        registry: &ProfileRegistry,
        manufacturer: &str,
    ) -> Option<(ProfileSource, Vec<MappingEntry>)> {
        match registry.vendor(manufacturer)? {
            VendorProfile::Entries(entries) => Some((
                ProfileSource::Manufacturer {
                    manufacturer: manufacturer.to_string(),
                },
                entries.clone(),
            )),
            // Inheritance resolves in at most one hop; a chained or missing
            // target falls through to tier 2 instead of looping.
            VendorProfile::Inherit(target) => match registry.vendor(target)? {
                VendorProfile::Entries(entries) => Some((
                    ProfileSource::Inherited {
                        manufacturer: manufacturer.to_string(),
                        inherited_from: (*target).to_string(),
                    },
                    entries.clone(),
                )),
                VendorProfile::Inherit(_) => None,
            },
        }
    }
}
