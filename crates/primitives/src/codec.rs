//! The wire codec boundary. The pipeline never assumes an encoding; it works
//! through [`TxDecoder`]/[`TxEncoder`]. [`ProtoCodec`] is the reference
//! protobuf implementation used by the tests and the CLI.

use {
    crate::{
        bytes::Bytes,
        coin::{Coin, CoinError},
        tx::{Msg, SignerInfo, Tx},
    },
    primitive_types::U256,
    thiserror::Error,
};

pub trait TxDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Tx, CodecError>;
}

pub trait TxEncoder: Send + Sync {
    fn encode(&self, tx: &Tx) -> Result<Bytes<Vec<u8>>, CodecError>;
}

/// Both directions of the wire boundary.
pub trait TxCodec: TxDecoder + TxEncoder {}

impl<T: TxDecoder + TxEncoder> TxCodec for T {}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed transaction bytes: {0}")]
    Malformed(#[from] prost::DecodeError),
    #[error("malformed address in transaction: {0}")]
    Address(#[from] crate::account::AddressError),
    #[error("malformed coin in transaction: {0}")]
    Coin(#[from] CoinError),
    #[error("malformed amount {0:?}")]
    Amount(String),
}

/// Protobuf tx codec. Encoding is deterministic: prost emits fields in tag
/// order and the message contains no maps.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProtoCodec;

impl TxDecoder for ProtoCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Tx, CodecError> {
        let raw = <proto::Tx as prost::Message>::decode(bytes)?;
        raw.try_into()
    }
}

impl TxEncoder for ProtoCodec {
    fn encode(&self, tx: &Tx) -> Result<Bytes<Vec<u8>>, CodecError> {
        let raw = proto::Tx::from(tx);
        Ok(Bytes(prost::Message::encode_to_vec(&raw)))
    }
}

pub fn decode_coin(coin: &proto::Coin) -> Result<Coin, CodecError> {
    let amount = U256::from_dec_str(&coin.amount)
        .map_err(|_| CodecError::Amount(coin.amount.clone()))?;
    Ok(Coin::new(coin.denom.parse()?, amount))
}

pub fn encode_coin(coin: &Coin) -> proto::Coin {
    proto::Coin {
        denom: coin.denom.to_string(),
        amount: coin.amount.to_string(),
    }
}

impl TryFrom<proto::Tx> for Tx {
    type Error = CodecError;

    fn try_from(raw: proto::Tx) -> Result<Self, Self::Error> {
        Ok(Self {
            messages: raw
                .messages
                .into_iter()
                .map(|msg| Msg {
                    type_url: msg.type_url,
                    value: Bytes(msg.value),
                })
                .collect(),
            signers: raw
                .signers
                .into_iter()
                .map(|signer| {
                    Ok(SignerInfo {
                        address: signer.address.parse()?,
                        sequence: signer.sequence,
                        signature: Bytes(signer.signature),
                    })
                })
                .collect::<Result<_, CodecError>>()?,
            timeout_height: raw.timeout_height,
            gas_limit: raw.gas_limit,
            fee: raw.fee.as_ref().map(decode_coin).transpose()?,
        })
    }
}

impl From<&Tx> for proto::Tx {
    fn from(tx: &Tx) -> Self {
        Self {
            messages: tx
                .messages
                .iter()
                .map(|msg| proto::Any {
                    type_url: msg.type_url.clone(),
                    value: msg.value.0.clone(),
                })
                .collect(),
            signers: tx
                .signers
                .iter()
                .map(|signer| proto::SignerInfo {
                    address: signer.address.to_string(),
                    sequence: signer.sequence,
                    signature: signer.signature.0.clone(),
                })
                .collect(),
            timeout_height: tx.timeout_height,
            gas_limit: tx.gas_limit,
            fee: tx.fee.as_ref().map(encode_coin),
        }
    }
}

pub mod proto {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Any {
        #[prost(string, tag = "1")]
        pub type_url: ::prost::alloc::string::String,
        #[prost(bytes = "vec", tag = "2")]
        pub value: ::prost::alloc::vec::Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Coin {
        #[prost(string, tag = "1")]
        pub denom: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub amount: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SignerInfo {
        #[prost(string, tag = "1")]
        pub address: ::prost::alloc::string::String,
        #[prost(uint64, tag = "2")]
        pub sequence: u64,
        #[prost(bytes = "vec", tag = "3")]
        pub signature: ::prost::alloc::vec::Vec<u8>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Tx {
        #[prost(message, repeated, tag = "1")]
        pub messages: ::prost::alloc::vec::Vec<Any>,
        #[prost(message, repeated, tag = "2")]
        pub signers: ::prost::alloc::vec::Vec<SignerInfo>,
        #[prost(uint64, tag = "3")]
        pub timeout_height: u64,
        #[prost(uint64, tag = "4")]
        pub gas_limit: u64,
        #[prost(message, optional, tag = "5")]
        pub fee: ::core::option::Option<Coin>,
    }
}
