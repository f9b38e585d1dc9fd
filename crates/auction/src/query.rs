//! Query surface for the module. The host mounts these on its own
//! transport; the responses are plain serde DTOs.

use {
    crate::{error::AuctionError, params::{Params, ParamsStore}},
    primitives::store::StateStore,
    serde::{Deserialize, Serialize},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamsResponse {
    pub params: Params,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct QueryService;

impl QueryService {
    pub fn params(&self, store: &dyn StateStore) -> Result<ParamsResponse, AuctionError> {
        Ok(ParamsResponse {
            params: ParamsStore::get(store)?,
        })
    }
}
