//! Tryte codec.
//!
//! Everything a channel carries (seeds, side keys, payloads) lives in the
//! 27-symbol alphabet `9ABCDEFGHIJKLMNOPQRSTUVWXYZ`. Arbitrary bytes are packed
//! two trytes per byte: `byte % 27` first, `byte / 27` second.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// The tryte alphabet, indexed by tryte value.
pub const TRYTE_ALPHABET: &[u8; 27] = b"9ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Check whether a byte is a valid tryte character.
pub fn is_tryte(b: u8) -> bool {
    b == b'9' || b.is_ascii_uppercase()
}

fn tryte_value(b: u8) -> Option<u8> {
    match b {
        b'9' => Some(0),
        b'A'..=b'Z' => Some(b - b'A' + 1),
        _ => None,
    }
}

/// A validated tryte string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Trytes(String);

impl Trytes {
    /// Validate and wrap a tryte string.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if let Some(offset) = s.bytes().position(|b| !is_tryte(b)) {
            let found = s[offset..].chars().next().unwrap_or('?');
            return Err(CoreError::EncodingError(format!(
                "invalid tryte {:?} at offset {}",
                found, offset
            )));
        }
        Ok(Self(s))
    }

    /// Wrap a string already known to contain only trytes.
    pub(crate) fn from_valid(s: String) -> Self {
        debug_assert!(s.bytes().all(is_tryte));
        Self(s)
    }

    /// The empty tryte string.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Pack arbitrary bytes into trytes (two trytes per byte).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut out = String::with_capacity(bytes.len() * 2);
        for &b in bytes {
            out.push(TRYTE_ALPHABET[(b % 27) as usize] as char);
            out.push(TRYTE_ALPHABET[(b / 27) as usize] as char);
        }
        Self(out)
    }

    /// Unpack trytes produced by [`Trytes::from_bytes`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let raw = self.0.as_bytes();
        if raw.len() % 2 != 0 {
            return Err(CoreError::EncodingError(format!(
                "odd tryte length {} cannot encode bytes",
                raw.len()
            )));
        }

        raw.chunks_exact(2)
            .map(|pair| {
                // Both values are valid: the string was checked on construction.
                let low = tryte_value(pair[0]).unwrap_or(0) as u16;
                let high = tryte_value(pair[1]).unwrap_or(0) as u16;
                let value = low + high * 27;
                u8::try_from(value).map_err(|_| {
                    CoreError::EncodingError(format!(
                        "tryte pair {}{} is out of byte range",
                        pair[0] as char, pair[1] as char
                    ))
                })
            })
            .collect()
    }

    /// Right-pad with `9` up to `len` trytes. Longer strings are unchanged.
    pub fn padded(&self, len: usize) -> Self {
        let mut s = self.0.clone();
        while s.len() < len {
            s.push('9');
        }
        Self(s)
    }

    /// Tryte values (0..27) of each symbol.
    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|b| tryte_value(b).unwrap_or(0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Encode UTF-8 text as trytes.
pub fn encode_str(text: &str) -> Trytes {
    Trytes::from_bytes(text.as_bytes())
}

/// Decode trytes produced by [`encode_str`] back into UTF-8 text.
pub fn decode_str(trytes: &Trytes) -> Result<String> {
    let bytes = trytes.to_bytes()?;
    String::from_utf8(bytes).map_err(|e| CoreError::EncodingError(e.to_string()))
}

impl fmt::Debug for Trytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trytes({})", self.0)
    }
}

impl fmt::Display for Trytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Trytes {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Trytes {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<Trytes> for String {
    fn from(t: Trytes) -> Self {
        t.0
    }
}

impl AsRef<str> for Trytes {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_lowercase_and_symbols() {
        assert!(Trytes::new("HELLO9WORLD").is_ok());
        assert!(matches!(
            Trytes::new("hello"),
            Err(CoreError::EncodingError(_))
        ));
        assert!(Trytes::new("ABC-DEF").is_err());
        assert!(Trytes::new("ÄBC").is_err());
    }

    #[test]
    fn test_known_encoding() {
        // 'A' = 65 = 11 + 2*27 -> "KB"
        assert_eq!(Trytes::from_bytes(b"A").as_str(), "KB");
        assert_eq!(encode_str("{}").as_str(), "ODQD");
    }

    #[test]
    fn test_to_bytes_rejects_odd_length() {
        let t = Trytes::new("ABC").unwrap();
        assert!(t.to_bytes().is_err());
    }

    #[test]
    fn test_to_bytes_rejects_out_of_range_pair() {
        // 'Z' (26) + 'Z' (26) * 27 = 728 > 255
        let t = Trytes::new("ZZ").unwrap();
        assert!(t.to_bytes().is_err());
    }

    #[test]
    fn test_padding() {
        let t = Trytes::new("KEY").unwrap();
        assert_eq!(t.padded(6).as_str(), "KEY999");
        assert_eq!(t.padded(2).as_str(), "KEY");
    }

    #[test]
    fn test_json_text_roundtrip() {
        let text = r#"{"item":"Light_1","state":"ON"}"#;
        let trytes = encode_str(text);
        assert_eq!(decode_str(&trytes).unwrap(), text);
    }

    #[test]
    fn test_serde_validates() {
        let parsed: std::result::Result<Trytes, _> = serde_json::from_str("\"abc\"");
        assert!(parsed.is_err());
        let parsed: Trytes = serde_json::from_str("\"ABC\"").unwrap();
        assert_eq!(parsed.as_str(), "ABC");
    }

    proptest! {
        #[test]
        fn bytes_survive_tryte_packing(data in prop::collection::vec(any::<u8>(), 0..512)) {
            let trytes = Trytes::from_bytes(&data);
            prop_assert_eq!(trytes.len(), data.len() * 2);
            prop_assert_eq!(trytes.to_bytes().unwrap(), data);
        }
    }
}
