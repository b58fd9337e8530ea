//! Mapping a destination address to its region
//!
//! The orchestrator only needs the region to select providers; the rest of
//! the address is passed through to the provider untouched.

use std::fmt;

use ahash::AHashMap;
use herald_common::{Address, RegionCode};

use crate::NormalizerConfig;

/// Derives the region a destination belongs to
pub trait AddressNormalizer: Send + Sync + fmt::Debug {
    /// `None` when the address cannot be mapped to a region
    fn region_for(&self, address: &Address) -> Option<RegionCode>;
}

/// Shortest and longest E.164 subscriber number, country code included
const MIN_DIGITS: usize = 7;
const MAX_DIGITS: usize = 15;

/// E.164 normalizer matching the longest known calling-code prefix
#[derive(Debug, Clone)]
pub struct PrefixNormalizer {
    calling_codes: AHashMap<String, RegionCode>,
    longest_code: usize,
}

impl PrefixNormalizer {
    #[must_use]
    pub fn new(calling_codes: impl IntoIterator<Item = (String, RegionCode)>) -> Self {
        let calling_codes: AHashMap<_, _> = calling_codes.into_iter().collect();
        let longest_code = calling_codes.keys().map(String::len).max().unwrap_or(0);

        Self {
            calling_codes,
            longest_code,
        }
    }

    #[must_use]
    pub fn from_config(config: &NormalizerConfig) -> Self {
        Self::new(
            config
                .calling_codes
                .iter()
                .map(|(code, region)| (code.clone(), region.clone())),
        )
    }
}

impl Default for PrefixNormalizer {
    fn default() -> Self {
        Self::from_config(&NormalizerConfig::default())
    }
}

impl AddressNormalizer for PrefixNormalizer {
    fn region_for(&self, address: &Address) -> Option<RegionCode> {
        let digits = address.as_str().trim().strip_prefix('+')?;

        if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len())
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        (1..=self.longest_code.min(digits.len()))
            .rev()
            .find_map(|len| self.calling_codes.get(&digits[..len]))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn region(normalizer: &PrefixNormalizer, address: &str) -> Option<String> {
        normalizer
            .region_for(&Address::new(address))
            .map(|r| r.as_str().to_string())
    }

    #[test]
    fn test_default_table() {
        let normalizer = PrefixNormalizer::default();

        assert_eq!(region(&normalizer, "+15005550006").as_deref(), Some("US"));
        assert_eq!(region(&normalizer, "+447700900123").as_deref(), Some("GB"));
        assert_eq!(region(&normalizer, "+2348012345678").as_deref(), Some("NG"));
    }

    #[test]
    fn test_longest_prefix_wins() {
        let normalizer = PrefixNormalizer::new([
            ("2".to_string(), RegionCode::new("AA")),
            ("25".to_string(), RegionCode::new("BB")),
            ("254".to_string(), RegionCode::new("KE")),
        ]);

        assert_eq!(region(&normalizer, "+254712345678").as_deref(), Some("KE"));
        assert_eq!(region(&normalizer, "+255712345678").as_deref(), Some("BB"));
        assert_eq!(region(&normalizer, "+212612345678").as_deref(), Some("AA"));
    }

    #[test]
    fn test_rejects_malformed() {
        let normalizer = PrefixNormalizer::default();

        assert_eq!(region(&normalizer, "15005550006"), None);
        assert_eq!(region(&normalizer, "+1500"), None);
        assert_eq!(region(&normalizer, "+1500555000612345"), None);
        assert_eq!(region(&normalizer, "+1500-555-0006"), None);
        assert_eq!(region(&normalizer, "not a number"), None);
    }

    #[test]
    fn test_unknown_calling_code() {
        let normalizer = PrefixNormalizer::default();
        assert_eq!(region(&normalizer, "+9995550006"), None);
    }
}
