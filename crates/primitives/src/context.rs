use {crate::account::AccountId, std::time::Instant};

/// Which pipeline stage a transaction is being evaluated in. Some checks
/// (mempool insertion, escrow debits) only apply in specific modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    CheckTx,
    ReCheckTx,
    PrepareProposal,
    ProcessProposal,
    Finalize,
}

/// Per-invocation execution context handed down from the consensus engine.
#[derive(Clone, Debug)]
pub struct Context {
    pub height: u64,
    pub mode: ExecMode,
    /// Byte budget for the proposal under construction.
    pub max_block_bytes: u64,
    /// Consensus gas ceiling; `None` means unlimited.
    pub consensus_max_gas: Option<u64>,
    /// Proposal construction stops (returning what was built) once elapsed.
    pub deadline: Option<Instant>,
    pub proposer: AccountId,
}

impl Context {
    pub fn new(height: u64, mode: ExecMode) -> Self {
        Self {
            height,
            mode,
            max_block_bytes: 0,
            consensus_max_gas: None,
            deadline: None,
            proposer: AccountId::default(),
        }
    }

    pub fn with_block_limits(mut self, max_block_bytes: u64, max_gas: Option<u64>) -> Self {
        self.max_block_bytes = max_block_bytes;
        self.consensus_max_gas = max_gas;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_proposer(mut self, proposer: AccountId) -> Self {
        self.proposer = proposer;
        self
    }

    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
