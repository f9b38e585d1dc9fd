use {
    crate::{account::AccountId, bytes::Bytes, coin::Coin},
    serde::{Deserialize, Serialize},
    sha2::{Digest, Sha256},
};

/// A protobuf `Any`-style message: a type URL plus the encoded payload.
/// Modules downcast the payloads they own; everything else stays opaque.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg {
    pub type_url: String,
    pub value: Bytes<Vec<u8>>,
}

impl Msg {
    pub fn new(type_url: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            type_url: type_url.into(),
            value: Bytes(value.into()),
        }
    }
}

/// One signer of a transaction. Signature verification proper is the host's
/// concern; the pipeline only inspects presence, address, and sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    pub address: AccountId,
    pub sequence: u64,
    pub signature: Bytes<Vec<u8>>,
}

/// The decoded transaction model the lanes operate on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub messages: Vec<Msg>,
    pub signers: Vec<SignerInfo>,
    pub timeout_height: u64,
    pub gas_limit: u64,
    pub fee: Option<Coin>,
}

impl Tx {
    /// The first signer pays and is the transaction's principal.
    pub fn principal(&self) -> Option<&SignerInfo> {
        self.signers.first()
    }

    pub fn is_signed_by(&self, address: &AccountId) -> bool {
        self.signers.iter().any(|signer| signer.address == *address)
    }
}

/// Content hash of a transaction's canonical wire encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn digest(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}
