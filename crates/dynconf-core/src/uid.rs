//! Stable identifiers for clusters, stripes and nodes.

use crate::error::DynConfigError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque 128-bit identifier.
///
/// The text form is the 16 bytes encoded as URL-safe base64 without padding,
/// always 22 characters long. Names are mutable and carry no identity; the UID
/// is what survives renames.
///
/// # Example
///
/// ```
/// use dynconf_core::Uid;
///
/// let uid = Uid::new_uid();
/// let text = uid.to_string();
/// assert_eq!(text.len(), 22);
/// assert_eq!(text.parse::<Uid>().unwrap(), uid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uid(Uuid);

impl Uid {
    /// Creates a new random UID.
    #[must_use]
    pub fn new_uid() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a UID from the given random source.
    ///
    /// A seeded generator yields a reproducible sequence.
    pub fn from_rng<R: Rng>(rng: &mut R) -> Self {
        let bytes: [u8; 16] = rng.gen();
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Creates a UID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.0.as_bytes()))
    }
}

impl FromStr for Uid {
    type Err = DynConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| DynConfigError::InvalidUid {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(s.trim())
            .map_err(|e| invalid(&e.to_string()))?;
        let bytes: [u8; 16] = bytes
            .try_into()
            .map_err(|_| invalid("expected 16 bytes"))?;
        Ok(Self(Uuid::from_bytes(bytes)))
    }
}

impl TryFrom<String> for Uid {
    type Error = DynConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.to_string()
    }
}

impl From<Uuid> for Uid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
