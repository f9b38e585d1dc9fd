use {
    crate::error::AuctionError,
    num::{BigRational, One, Zero},
    primitive_types::U256,
    primitives::{
        codec::{decode_coin, encode_coin, CodecError},
        ratio,
        store::StateStore,
        AccountId, Coin,
    },
    serde::{Deserialize, Serialize},
};

/// The economic parameters of the auction. Created at genesis, mutated only
/// through the authority-gated params-update message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub max_bundle_size: u32,
    pub escrow_address: AccountId,
    pub reserve_fee: Coin,
    pub min_buy_in_fee: Coin,
    pub min_bid_increment: Coin,
    pub front_running_protection: bool,
    #[serde(with = "ratio")]
    pub proposer_fee: BigRational,
}

impl Params {
    pub fn validate(&self) -> Result<(), AuctionError> {
        if self.max_bundle_size == 0 {
            return Err(AuctionError::InvalidParams(
                "max bundle size must be positive".to_owned(),
            ));
        }
        if self.proposer_fee < BigRational::zero() || self.proposer_fee > BigRational::one() {
            return Err(AuctionError::InvalidParams(format!(
                "proposer fee {} is outside [0, 1]",
                ratio::to_decimal_string(&self.proposer_fee)
            )));
        }
        for (name, fee) in [
            ("min buy-in fee", &self.min_buy_in_fee),
            ("min bid increment", &self.min_bid_increment),
        ] {
            if fee.denom != self.reserve_fee.denom {
                return Err(AuctionError::InvalidParams(format!(
                    "{name} denom {} differs from the reserve fee denom {}",
                    fee.denom, self.reserve_fee.denom
                )));
            }
        }
        Ok(())
    }
}

/// Persistence of the params under their single state key.
pub struct ParamsStore;

impl ParamsStore {
    const KEY: &'static [u8] = b"auction/params";

    pub fn get(store: &dyn StateStore) -> Result<Params, AuctionError> {
        let raw = store
            .get(Self::KEY)
            .ok_or_else(|| AuctionError::Internal("params are not initialized".to_owned()))?;
        let pb = <proto::Params as prost::Message>::decode(raw.as_slice())
            .map_err(CodecError::from)?;
        Params::try_from(pb)
    }

    /// Validates before persisting; a rejected update leaves the previous
    /// params untouched.
    pub fn set(store: &mut dyn StateStore, params: &Params) -> Result<(), AuctionError> {
        params.validate()?;
        let raw = prost::Message::encode_to_vec(&proto::Params::from(params));
        store.set(Self::KEY.to_vec(), raw);
        Ok(())
    }
}

impl TryFrom<proto::Params> for Params {
    type Error = AuctionError;

    fn try_from(pb: proto::Params) -> Result<Self, Self::Error> {
        let coin = |field: &Option<primitives::codec::proto::Coin>, name: &str| {
            field
                .as_ref()
                .ok_or_else(|| AuctionError::InvalidParams(format!("missing {name}")))
                .and_then(|coin| decode_coin(coin).map_err(AuctionError::from))
        };
        Ok(Self {
            max_bundle_size: pb.max_bundle_size,
            escrow_address: pb
                .escrow_address
                .parse()
                .map_err(|_| AuctionError::InvalidParams("malformed escrow address".to_owned()))?,
            reserve_fee: coin(&pb.reserve_fee, "reserve fee")?,
            min_buy_in_fee: coin(&pb.min_buy_in_fee, "min buy-in fee")?,
            min_bid_increment: coin(&pb.min_bid_increment, "min bid increment")?,
            front_running_protection: pb.front_running_protection,
            proposer_fee: ratio::parse_decimal(&pb.proposer_fee)
                .map_err(|err| AuctionError::InvalidParams(err.to_string()))?,
        })
    }
}

impl From<&Params> for proto::Params {
    fn from(params: &Params) -> Self {
        Self {
            max_bundle_size: params.max_bundle_size,
            escrow_address: params.escrow_address.to_string(),
            reserve_fee: Some(encode_coin(&params.reserve_fee)),
            min_buy_in_fee: Some(encode_coin(&params.min_buy_in_fee)),
            min_bid_increment: Some(encode_coin(&params.min_bid_increment)),
            front_running_protection: params.front_running_protection,
            proposer_fee: ratio::to_decimal_string(&params.proposer_fee),
        }
    }
}

pub mod proto {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Params {
        #[prost(uint32, tag = "1")]
        pub max_bundle_size: u32,
        #[prost(string, tag = "2")]
        pub escrow_address: ::prost::alloc::string::String,
        #[prost(message, optional, tag = "3")]
        pub reserve_fee: ::core::option::Option<primitives::codec::proto::Coin>,
        #[prost(message, optional, tag = "4")]
        pub min_buy_in_fee: ::core::option::Option<primitives::codec::proto::Coin>,
        #[prost(message, optional, tag = "5")]
        pub min_bid_increment: ::core::option::Option<primitives::codec::proto::Coin>,
        #[prost(bool, tag = "6")]
        pub front_running_protection: bool,
        #[prost(string, tag = "7")]
        pub proposer_fee: ::prost::alloc::string::String,
    }
}

/// A `Params` value every test starts from; not a `Default` impl because a
/// real chain has no default escrow account.
pub fn reference_params(denom: primitives::coin::Denom, escrow: AccountId) -> Params {
    Params {
        max_bundle_size: 4,
        escrow_address: escrow,
        reserve_fee: Coin::new(denom.clone(), U256::from(100u64)),
        min_buy_in_fee: Coin::new(denom.clone(), U256::from(10u64)),
        min_bid_increment: Coin::new(denom, U256::from(10u64)),
        front_running_protection: true,
        proposer_fee: BigRational::new(1.into(), 4.into()),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        primitives::{coin::Denom, test_util::MemStore},
    };

    fn params() -> Params {
        reference_params(Denom::new("uatom").unwrap(), AccountId::from([9; 20]))
    }

    #[test]
    fn validates_bundle_size_and_fee_range() {
        let mut p = params();
        p.max_bundle_size = 0;
        assert!(matches!(p.validate(), Err(AuctionError::InvalidParams(_))));

        let mut p = params();
        p.proposer_fee = BigRational::new(3.into(), 2.into());
        assert!(matches!(p.validate(), Err(AuctionError::InvalidParams(_))));

        let mut p = params();
        p.min_buy_in_fee = Coin::new(Denom::new("stake").unwrap(), 1u64);
        assert!(matches!(p.validate(), Err(AuctionError::InvalidParams(_))));

        assert!(params().validate().is_ok());
    }

    #[test]
    fn persists_round_trip() {
        let mut store = MemStore::default();
        assert!(matches!(
            ParamsStore::get(&store),
            Err(AuctionError::Internal(_))
        ));

        ParamsStore::set(&mut store, &params()).unwrap();
        assert_eq!(ParamsStore::get(&store).unwrap(), params());
    }

    #[test]
    fn invalid_params_are_never_persisted() {
        let mut store = MemStore::default();
        ParamsStore::set(&mut store, &params()).unwrap();

        let mut bad = params();
        bad.max_bundle_size = 0;
        assert!(ParamsStore::set(&mut store, &bad).is_err());
        assert_eq!(ParamsStore::get(&store).unwrap(), params());
    }

    #[test]
    fn serde_uses_decimal_fee() {
        let json = serde_json::to_value(params()).unwrap();
        assert_eq!(json["proposer_fee"], "0.25");
        let back: Params = serde_json::from_value(json).unwrap();
        assert_eq!(back, params());
    }
}
