//! Inventory domain module: FIFO stock allocation.
//!
//! This crate contains business rules for inventory, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage, no logging).

pub mod allocation;
pub mod fifo;
pub mod lot;
pub mod status;

pub use allocation::{AllocationRecord, FifoAllocation, LotBalance, Shortfall};
pub use fifo::{FifoEngine, OutgoingOrder, allocate};
pub use lot::{IncomingLot, OutgoingTransaction};
pub use status::{DEFAULT_RESTOCK_THRESHOLD, StockStatus};
