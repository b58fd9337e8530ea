//! Region code newtype
//!
//! A region code is the jurisdiction a destination address belongs to
//! (`"US"`, `"GB"`, ...). It drives provider eligibility and the preference
//! order used for a delivery. Codes are stored upper-cased so configuration
//! and normalizer output compare equal regardless of the case they were
//! written in.

use std::{
    fmt::{self, Display},
    ops::Deref,
    sync::Arc,
};

use serde::{Deserialize, Serialize};

/// An upper-cased region code
///
/// # Examples
///
/// ```
/// use herald_common::RegionCode;
///
/// let region = RegionCode::new("gb");
/// assert_eq!(region.as_str(), "GB");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RegionCode(Arc<str>);

impl RegionCode {
    /// Create a new `RegionCode`, upper-casing the input
    #[must_use]
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(Arc::from(code.as_ref().trim().to_ascii_uppercase()))
    }

    /// Parse a strict two letter ISO 3166 alpha-2 style code
    ///
    /// ```
    /// use herald_common::RegionCode;
    ///
    /// assert!(RegionCode::parse("de").is_some());
    /// assert!(RegionCode::parse("DEU").is_none());
    /// assert!(RegionCode::parse("1").is_none());
    /// ```
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        (code.len() == 2 && code.bytes().all(|b| b.is_ascii_alphabetic())).then(|| Self::new(code))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RegionCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for RegionCode {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<String> for RegionCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for RegionCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<RegionCode> for String {
    fn from(region: RegionCode) -> Self {
        region.0.to_string()
    }
}
