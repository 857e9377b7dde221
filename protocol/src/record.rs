//! Public, ledger-visible deposit records.

use serde::{Deserialize, Serialize};

use crate::commitment::Commitment;

/// 32-byte random deposit identifier, unique per deployment.
pub type DepositId = [u8; 32];

/// One stored deposit.
///
/// `ciphertext` holds the envelope bundle when the listing endpoint returns it
/// inline; it is empty when the bundle has to be fetched separately by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub index: u64,
    #[serde(with = "hex_serde::array32")]
    pub deposit_id: DepositId,
    #[serde(with = "hex_serde::array32")]
    pub commitment: Commitment,
    #[serde(with = "hex_serde::bytes", default)]
    pub ciphertext: Vec<u8>,
    pub amount: u128,
    pub created_at: u64,
    pub claimed: bool,
}

impl DepositRecord {
    /// The same record without its inline bundle.
    pub fn without_ciphertext(&self) -> Self {
        Self {
            ciphertext: Vec::new(),
            ..self.clone()
        }
    }
}

/// Hex (de)serialization helpers for byte fields in JSON documents.
pub mod hex_serde {
    pub mod array32 {
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&hex::encode(bytes))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
            let text = String::deserialize(deserializer)?;
            let bytes = hex::decode(text.strip_prefix("0x").unwrap_or(&text)).map_err(D::Error::custom)?;
            bytes
                .try_into()
                .map_err(|v: Vec<u8>| D::Error::custom(format!("expected 32 bytes, got {}", v.len())))
        }
    }

    pub mod bytes {
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&hex::encode(bytes))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
            let text = String::deserialize(deserializer)?;
            hex::decode(text.strip_prefix("0x").unwrap_or(&text)).map_err(D::Error::custom)
        }
    }
}
