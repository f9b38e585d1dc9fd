use {
    crate::{error::AuctionError, params::{Params, ParamsStore}},
    primitives::store::StateStore,
    serde::{Deserialize, Serialize},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
}

pub fn init_genesis(
    store: &mut dyn StateStore,
    genesis: &GenesisState,
) -> Result<(), AuctionError> {
    ParamsStore::set(store, &genesis.params)
}

pub fn export_genesis(store: &dyn StateStore) -> Result<GenesisState, AuctionError> {
    Ok(GenesisState {
        params: ParamsStore::get(store)?,
    })
}
