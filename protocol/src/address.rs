//! Ledger account addresses (20 bytes, `0x`-hex in text form).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

pub const ADDRESS_LEN: usize = 20;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Constant-time equality, used when matching decrypted recipients.
    pub fn ct_matches(&self, other: &Address) -> bool {
        bool::from(self.0.ct_eq(&other.0))
    }
}

/// Error returned when parsing an address from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid address {0:?}: expected 0x followed by 40 hex characters")]
pub struct ParseAddressError(pub String);

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if body.len() != ADDRESS_LEN * 2 {
            return Err(ParseAddressError(s.to_string()));
        }
        let bytes = hex::decode(body).map_err(|_| ParseAddressError(s.to_string()))?;
        Self::from_slice(&bytes).ok_or_else(|| ParseAddressError(s.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = ParseAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let text = "0x00000000000000000000000000000000000abc01";
        let address: Address = text.parse().unwrap();
        assert_eq!(address.to_string(), text);
        assert_eq!(address.as_bytes()[19], 0x01);

        let bare: Address = "00000000000000000000000000000000000abc01".parse().unwrap();
        assert_eq!(bare, address);
    }

    #[test]
    fn test_parse_rejects_wrong_length_and_non_hex() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz000000000000000000000000000000000abc01".parse::<Address>().is_err());
        assert!("0x00000000000000000000000000000000000abc0100".parse::<Address>().is_err());
    }

    #[test]
    fn test_zero_and_ct_match() {
        assert!(Address::ZERO.is_zero());
        let a = Address::new([7u8; 20]);
        let b = Address::new([7u8; 20]);
        let c = Address::new([8u8; 20]);
        assert!(a.ct_matches(&b));
        assert!(!a.ct_matches(&c));
        assert!(!a.is_zero());
    }
}
