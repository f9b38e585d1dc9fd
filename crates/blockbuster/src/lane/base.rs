use {
    super::{
        Lane, LaneInitError, LaneLimits, LaneMempool, MatchHandler, OrderRule, OrderViolation,
        PrepareError, ProcessError,
    },
    crate::{pool_tx::PoolTx, proposal::Proposal},
    num::{BigRational, Zero},
    primitives::{
        ante::{AnteChain, AnteDecorator},
        store::{Branch, StateStore},
        Context, Tx,
    },
    std::sync::Arc,
    tracing::debug,
};

/// The generic lane. Behavior seams (admission predicate, ordering rule,
/// ante chain) are fixed at construction through [`LaneBuilder`]; lanes with
/// bespoke prepare/process semantics implement [`Lane`] themselves.
pub struct BaseLane {
    name: String,
    max_block_space: BigRational,
    mempool: Arc<dyn LaneMempool>,
    ante: AnteChain,
    match_handler: Arc<dyn MatchHandler>,
    order_rule: Arc<dyn OrderRule>,
    ignore: Vec<Arc<dyn Lane>>,
}

pub struct LaneBuilder {
    name: String,
    max_block_space: BigRational,
    mempool: Option<Arc<dyn LaneMempool>>,
    ante: AnteChain,
    match_handler: Option<Arc<dyn MatchHandler>>,
    order_rule: Option<Arc<dyn OrderRule>>,
    ignore: Vec<Arc<dyn Lane>>,
}

impl LaneBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_block_space: BigRational::zero(),
            mempool: None,
            ante: AnteChain::empty(),
            match_handler: None,
            order_rule: None,
            ignore: Vec::new(),
        }
    }

    pub fn max_block_space(mut self, fraction: BigRational) -> Self {
        self.max_block_space = fraction;
        self
    }

    pub fn mempool(mut self, mempool: Arc<dyn LaneMempool>) -> Self {
        self.mempool = Some(mempool);
        self
    }

    pub fn ante(mut self, ante: AnteChain) -> Self {
        self.ante = ante;
        self
    }

    pub fn match_handler(mut self, handler: impl MatchHandler + 'static) -> Self {
        self.match_handler = Some(Arc::new(handler));
        self
    }

    pub fn order_rule(mut self, rule: impl OrderRule + 'static) -> Self {
        self.order_rule = Some(Arc::new(rule));
        self
    }

    pub fn ignore(mut self, lanes: Vec<Arc<dyn Lane>>) -> Self {
        self.ignore = lanes;
        self
    }

    pub fn build(self) -> Result<BaseLane, LaneInitError> {
        if self.name.is_empty() {
            return Err(LaneInitError::EmptyName);
        }
        let mempool = self
            .mempool
            .ok_or_else(|| LaneInitError::MissingMempool(self.name.clone()))?;
        let match_handler = self
            .match_handler
            .ok_or_else(|| LaneInitError::MissingMatchHandler(self.name.clone()))?;
        if self.max_block_space < BigRational::zero()
            || self.max_block_space > BigRational::from_integer(1.into())
        {
            return Err(LaneInitError::QuotaOutOfRange(self.name));
        }
        Ok(BaseLane {
            name: self.name,
            max_block_space: self.max_block_space,
            mempool,
            ante: self.ante,
            match_handler,
            order_rule: self.order_rule.unwrap_or_else(|| Arc::new(fee_ordering)),
            ignore: self.ignore,
        })
    }
}

/// The default lane-local ordering invariant: fee amounts never increase.
pub fn fee_ordering(_ctx: &Context, txs: &[PoolTx]) -> Result<(), OrderViolation> {
    let fees = txs
        .iter()
        .map(|tx| tx.tx.fee.as_ref().map(|fee| fee.amount).unwrap_or_default());
    let sorted = fees.clone().zip(fees.skip(1)).all(|(a, b)| a >= b);
    if !sorted {
        return Err(OrderViolation(
            "transactions are not in descending fee order".to_owned(),
        ));
    }
    Ok(())
}

impl Lane for BaseLane {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_block_space(&self) -> &BigRational {
        &self.max_block_space
    }

    fn matches(&self, ctx: &Context, tx: &Tx) -> bool {
        self.match_handler.matches(ctx, tx)
            && !self.ignore.iter().any(|lane| lane.matches(ctx, tx))
    }

    fn mempool(&self) -> &dyn LaneMempool {
        self.mempool.as_ref()
    }

    /// Walks the mempool in priority order. Transactions that fail a
    /// stateful check are evicted; transactions that no longer fit the
    /// remaining budgets are skipped, so smaller ones further down may
    /// still make it in.
    fn prepare(
        &self,
        ctx: &Context,
        store: &dyn StateStore,
        proposal: &mut Proposal,
        limits: LaneLimits,
    ) -> Result<(), PrepareError> {
        let mut branch = Branch::new(store);
        let mut lane_bytes = 0u64;
        for pool_tx in self.mempool.select() {
            if ctx.deadline_exceeded() {
                debug!(lane = %self.name, "deadline reached, stopping lane fill");
                break;
            }
            if proposal.contains(&pool_tx.hash) {
                continue;
            }
            if lane_bytes + pool_tx.size() > limits.max_bytes {
                continue;
            }
            if let Err(err) = self.ante.ante_handle(ctx, &mut branch, &pool_tx.tx) {
                debug!(lane = %self.name, hash = %pool_tx.hash, %err, "evicting transaction");
                self.mempool.remove(&pool_tx.hash);
                continue;
            }
            match proposal.try_push(&pool_tx) {
                Ok(()) => lane_bytes += pool_tx.size(),
                Err(err) => {
                    debug!(lane = %self.name, hash = %pool_tx.hash, %err, "skipping transaction");
                }
            }
        }
        Ok(())
    }

    /// Consumes the longest prefix of transactions matching this lane,
    /// re-running the ante chain and the ordering rule over it.
    fn process(
        &self,
        ctx: &Context,
        store: &dyn StateStore,
        txs: &[PoolTx],
    ) -> Result<usize, ProcessError> {
        let mut branch = Branch::new(store);
        let mut consumed = 0;
        for pool_tx in txs {
            if !self.matches(ctx, &pool_tx.tx) {
                break;
            }
            self.ante
                .ante_handle(ctx, &mut branch, &pool_tx.tx)
                .map_err(|source| ProcessError::Rejected {
                    lane: self.name.clone(),
                    hash: pool_tx.hash,
                    source,
                })?;
            consumed += 1;
        }
        self.check_order(ctx, &txs[..consumed])?;
        Ok(consumed)
    }

    fn check_order(&self, ctx: &Context, txs: &[PoolTx]) -> Result<(), ProcessError> {
        if let Some(foreign) = txs.iter().find(|tx| !self.matches(ctx, &tx.tx)) {
            return Err(ProcessError::Order {
                lane: self.name.clone(),
                source: OrderViolation(format!(
                    "transaction {} does not belong to this lane",
                    foreign.hash
                )),
            });
        }
        self.order_rule
            .check(ctx, txs)
            .map_err(|source| ProcessError::Order {
                lane: self.name.clone(),
                source,
            })
    }
}
