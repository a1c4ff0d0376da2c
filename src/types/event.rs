use alloy::primitives::TxHash;

/// Events from a specific block.
#[derive(Debug)]
pub struct BlockEvents<T> {
    block_number: u64,
    events: Vec<T>,
}

/// Event along with the transaction context it was emitted in.
#[derive(Clone, Debug)]
pub struct EventContext<T> {
    pub(crate) block_number: u64,
    pub(crate) tx_hash: TxHash,
    pub(crate) log_index: u64,
    pub(crate) event: T,
}

impl<T> BlockEvents<T> {
    pub(crate) fn new(block_number: u64, events: Vec<T>) -> Self {
        Self {
            block_number,
            events,
        }
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn events(&self) -> &[T] {
        &self.events
    }

    pub fn into_events(self) -> Vec<T> {
        self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<T> EventContext<T> {
    pub fn new(block_number: u64, tx_hash: TxHash, log_index: u64, event: T) -> Self {
        Self {
            block_number,
            tx_hash,
            log_index,
            event,
        }
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn log_index(&self) -> u64 {
        self.log_index
    }

    pub fn event(&self) -> &T {
        &self.event
    }

    pub fn into_event(self) -> T {
        self.event
    }
}
