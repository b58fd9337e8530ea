//! Registry of configured providers
//!
//! Holds the providers in configured preference order and resolves, per
//! destination region, which of them may be tried and in what order:
//! - A per-region override list, when configured, replaces the global order
//! - Providers that denylist the region are always filtered out

use std::{collections::HashMap, sync::Arc};

use ahash::{AHashMap, AHashSet};
use herald_common::{Address, RegionCode};

use crate::{ConfigurationError, DispatchConfig, Provider, ProviderType};

/// Configured, deduplicated set of providers
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    /// Providers in configured preference order
    providers: Vec<Arc<dyn Provider>>,
    by_type: AHashMap<ProviderType, Arc<dyn Provider>>,
    region_overrides: AHashMap<RegionCode, Vec<ProviderType>>,
}

impl ProviderRegistry {
    /// Build a registry from providers listed in preference order
    ///
    /// # Errors
    ///
    /// Fails if `providers` is empty or configures the same type twice.
    pub fn configure(providers: Vec<Arc<dyn Provider>>) -> Result<Self, ConfigurationError> {
        if providers.is_empty() {
            return Err(ConfigurationError::EmptyProviderList);
        }

        let mut by_type = AHashMap::with_capacity(providers.len());
        for provider in &providers {
            let ty = provider.provider_type();
            if by_type.insert(ty, Arc::clone(provider)).is_some() {
                return Err(ConfigurationError::DuplicateProvider(ty));
            }
        }

        Ok(Self {
            providers,
            by_type,
            region_overrides: AHashMap::default(),
        })
    }

    /// Build a registry from configuration, picking the configured types out
    /// of the supplied provider instances
    ///
    /// Instances whose type is not configured are ignored.
    ///
    /// # Errors
    ///
    /// Fails if the configured list is empty or has duplicates, or if a
    /// configured type has no matching instance.
    pub fn from_config(
        config: &DispatchConfig,
        available: impl IntoIterator<Item = Arc<dyn Provider>>,
    ) -> Result<Self, ConfigurationError> {
        let mut available: AHashMap<ProviderType, Arc<dyn Provider>> = available
            .into_iter()
            .map(|provider| (provider.provider_type(), provider))
            .collect();

        let mut providers = Vec::with_capacity(config.providers.len());
        for ty in &config.providers {
            let provider = match available.remove(ty) {
                Some(provider) => provider,
                // Already taken by an earlier entry of the list
                None if providers
                    .iter()
                    .any(|p: &Arc<dyn Provider>| p.provider_type() == *ty) =>
                {
                    return Err(ConfigurationError::DuplicateProvider(*ty));
                }
                None => return Err(ConfigurationError::MissingProvider(*ty)),
            };
            providers.push(provider);
        }

        let registry = Self::configure(providers)?;
        Ok(registry.with_region_overrides(&config.region_providers))
    }

    /// Use `providers`, in that order, for destinations in `region`
    #[must_use]
    pub fn with_region_override(mut self, region: RegionCode, providers: Vec<ProviderType>) -> Self {
        self.region_overrides.insert(region, providers);
        self
    }

    fn with_region_overrides(mut self, overrides: &HashMap<RegionCode, Vec<ProviderType>>) -> Self {
        self.region_overrides.extend(
            overrides
                .iter()
                .map(|(region, providers)| (region.clone(), providers.clone())),
        );
        self
    }

    /// The providers to try for a destination, most preferred first
    ///
    /// Override entries naming a type that is not configured are skipped.
    #[must_use]
    pub fn candidates_for(&self, region: &RegionCode, address: &Address) -> Vec<Arc<dyn Provider>> {
        let ordered: Vec<&Arc<dyn Provider>> = match self.region_overrides.get(region) {
            Some(types) => types.iter().filter_map(|ty| self.by_type.get(ty)).collect(),
            None => self.providers.iter().collect(),
        };

        ordered
            .into_iter()
            .filter(|provider| {
                !provider.unsupported_regions().contains(region)
                    && provider.can_serve(region, address)
            })
            .cloned()
            .collect()
    }

    /// Look up the configured instance of a provider type
    #[must_use]
    pub fn by_type(&self, ty: ProviderType) -> Option<Arc<dyn Provider>> {
        self.by_type.get(&ty).cloned()
    }

    /// Configured provider types, in preference order
    #[must_use]
    pub fn configured_types(&self) -> Vec<ProviderType> {
        self.providers.iter().map(|p| p.provider_type()).collect()
    }

    /// Providers whose sends are confirmed by receipts
    #[must_use]
    pub fn supported_async(&self) -> Vec<Arc<dyn Provider>> {
        self.providers
            .iter()
            .filter(|p| p.supports_delivery_status())
            .cloned()
            .collect()
    }

    /// Regions no configured provider can serve
    #[must_use]
    pub fn globally_unsupported_regions(&self) -> AHashSet<RegionCode> {
        let mut providers = self.providers.iter();
        let Some(first) = providers.next() else {
            return AHashSet::default();
        };

        providers.fold(first.unsupported_regions().clone(), |acc, provider| {
            let unsupported = provider.unsupported_regions();
            acc.into_iter()
                .filter(|region| unsupported.contains(region))
                .collect()
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
