//! # Asset Identifier Newtypes
//!
//! Two distinct identifier types flow through a media request:
//!
//! - [`RawAssetId`]: what the client put in the URL, after suffix stripping
//!   and the lenient syntactic check. Untrusted with respect to existence.
//! - [`CanonicalAssetId`]: what the metadata service says the asset is
//!   called. The sole key for the cache and the lock registry.
//!
//! Both reject anything outside `[A-Za-z0-9_-]`, so an id can be turned into a
//! file name without escaping and never walks out of the cache directory.
//! Deserialization goes through the same checks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// File extension of cached artifacts.
pub const ARTIFACT_EXTENSION: &str = "m4a";

/// Suffix podcast clients append to media URLs. Stripped before validation.
const MEDIA_SUFFIX: &str = ".m4a";

/// Inclusive length window for raw ids.
const MIN_LEN: usize = 5;
const MAX_LEN: usize = 64;

fn is_id_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn check_charset(id: &str) -> Result<(), ValidationError> {
    match id.chars().enumerate().find(|(_, ch)| !is_id_char(*ch)) {
        Some((position, ch)) => Err(ValidationError::InvalidCharacter { ch, position }),
        None => Ok(()),
    }
}

/// Client-supplied asset identifier that passed the local syntactic check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RawAssetId(String);

impl RawAssetId {
    /// Strip the media suffix (once) and validate the remainder.
    ///
    /// Performs no I/O.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let id = raw.strip_suffix(MEDIA_SUFFIX).unwrap_or(raw);
        if id.is_empty() {
            return Err(ValidationError::Empty);
        }
        let len = id.chars().count();
        if !(MIN_LEN..=MAX_LEN).contains(&len) {
            return Err(ValidationError::Length {
                len,
                min: MIN_LEN,
                max: MAX_LEN,
            });
        }
        check_charset(id)?;
        Ok(Self(id.to_string()))
    }

    /// Access the cleaned identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawAssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RawAssetId {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<RawAssetId> for String {
    fn from(id: RawAssetId) -> Self {
        id.0
    }
}

/// Identifier as reported by the metadata service.
///
/// Not assumed to equal the [`RawAssetId`] it was resolved from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalAssetId(String);

impl CanonicalAssetId {
    /// Wrap an id returned by the metadata service.
    ///
    /// Only the character set is enforced; the service is authoritative on
    /// length.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::Empty);
        }
        check_charset(&id)?;
        Ok(Self(id))
    }

    /// Access the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the cached artifact for this id.
    pub fn artifact_file_name(&self) -> String {
        format!("{}.{ARTIFACT_EXTENSION}", self.0)
    }
}

impl fmt::Display for CanonicalAssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CanonicalAssetId {
    type Error = ValidationError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<CanonicalAssetId> for String {
    fn from(id: CanonicalAssetId) -> Self {
        id.0
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every id drawn from the accepted alphabet and window parses unchanged.
        #[test]
        fn valid_ids_round_trip(id in "[A-Za-z0-9_-]{5,64}") {
            let parsed = RawAssetId::parse(&id).unwrap();
            prop_assert_eq!(parsed.as_str(), id.as_str());
        }

        /// With or without the media suffix, the same raw id comes out.
        #[test]
        fn suffix_is_transparent(id in "[A-Za-z0-9_-]{5,64}") {
            let with_suffix = format!("{id}.m4a");
            prop_assert_eq!(
                RawAssetId::parse(&id).unwrap(),
                RawAssetId::parse(&with_suffix).unwrap()
            );
        }

        /// Any character outside the alphabet is rejected wherever it appears.
        #[test]
        fn foreign_characters_rejected(
            prefix in "[a-z]{3,10}",
            bad in "[ ./\\\\?#%&:;]",
            suffix in "[a-z]{3,10}",
        ) {
            let id = format!("{prefix}{bad}{suffix}");
            let is_invalid_character = matches!(
                RawAssetId::parse(&id),
                Err(ValidationError::InvalidCharacter { .. })
            );
            prop_assert!(is_invalid_character);
        }
    }
}
