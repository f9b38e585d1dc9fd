//! Post-auction notifications for in-process subscribers (analytics,
//! reward routing). Subscriber failures are logged and swallowed: a broken
//! listener must never affect consensus.

use {
    primitives::{AccountId, Coin, TxHash},
    std::sync::Arc,
    tracing::error,
};

pub type HookResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub trait AuctionHooks: Send + Sync {
    fn name(&self) -> &str {
        "auction-hook"
    }

    /// Invoked after a winning bid's proceeds have been settled.
    fn after_auction(&self, bidder: &AccountId, bid: &Coin, bundle_hash: &TxHash) -> HookResult;
}

/// Fan-out to subscribers in registration order.
#[derive(Clone, Default)]
pub struct MultiHooks(Vec<Arc<dyn AuctionHooks>>);

impl MultiHooks {
    pub fn new(hooks: Vec<Arc<dyn AuctionHooks>>) -> Self {
        Self(hooks)
    }

    pub fn after_auction(&self, bidder: &AccountId, bid: &Coin, bundle_hash: &TxHash) {
        for hook in &self.0 {
            if let Err(err) = hook.after_auction(bidder, bid, bundle_hash) {
                error!(hook = %hook.name(), %err, "auction hook failed");
            }
        }
    }
}
