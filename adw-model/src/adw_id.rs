use std::fmt;

use uuid::Uuid;

/// An 8-hex-character identifier, unique per workflow invocation.
///
/// Minted from the low 32 bits of a UUIDv4 at admission time; immutable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AdwId([u8; 4]);

#[cfg(feature = "serde")]
impl serde::Serialize for AdwId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_hex())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for AdwId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        AdwId::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid adw_id: {raw}"))
        })
    }
}

impl AdwId {
    /// Mint a new random identifier.
    pub fn generate() -> Self {
        let bytes = Uuid::new_v4().into_bytes();
        Self([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Parse an 8-hex-character string, case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut out = [0u8; 4];
        for (i, chunk) in raw.as_bytes().chunks(2).enumerate() {
            let hi = (chunk[0] as char).to_digit(16)?;
            let lo = (chunk[1] as char).to_digit(16)?;
            out[i] = ((hi << 4) | lo) as u8;
        }
        Some(Self(out))
    }

    /// Render as a lowercase 8-hex-character string.
    pub fn as_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for AdwId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_hex() {
        let id = AdwId::generate();
        let parsed = AdwId::parse(&id.as_hex()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_wrong_length_or_non_hex() {
        assert!(AdwId::parse("abc").is_none());
        assert!(AdwId::parse("zzzzzzzz").is_none());
        assert!(AdwId::parse("DEADBEEF").is_some());
    }
}
