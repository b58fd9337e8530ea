//! Destination address newtype
//!
//! Addresses are phone numbers in practice. They are personal data, so the
//! `Display` implementation never prints them in full; use
//! [`Address::as_str`] when the raw value is needed (for a provider call).

use std::{
    fmt::{self, Display},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

/// Number of leading characters kept visible by [`Address::obfuscated`]
const VISIBLE_PREFIX: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(Arc<str>);

impl Address {
    #[must_use]
    pub fn new(address: impl Into<Arc<str>>) -> Self {
        Self(address.into())
    }

    /// The raw address
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The address with everything after the first few characters masked
    ///
    /// ```
    /// use herald_common::Address;
    ///
    /// assert_eq!(Address::new("+14155550123").obfuscated(), "+1415XXXXXXX");
    /// ```
    #[must_use]
    pub fn obfuscated(&self) -> String {
        self.0
            .chars()
            .enumerate()
            .map(|(i, c)| if i < VISIBLE_PREFIX { c } else { 'X' })
            .collect()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.obfuscated())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_obfuscated_masks_tail() {
        let address = Address::new("+447700900123");
        assert_eq!(address.obfuscated(), "+4477XXXXXXXX");
        assert_eq!(address.obfuscated().len(), address.as_str().len());
    }

    #[test]
    fn test_obfuscated_short_address() {
        assert_eq!(Address::new("+1").obfuscated(), "+1");
        assert_eq!(Address::new("").obfuscated(), "");
    }

    #[test]
    fn test_display_never_shows_full_address() {
        let address = Address::from("+2348031234567");
        let shown = format!("{address}");
        assert!(!shown.contains("1234567"));
        assert!(shown.starts_with("+2348"));
    }
}
