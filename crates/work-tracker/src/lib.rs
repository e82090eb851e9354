//! Periodic background commitments: keeping this operator's bonded
//! address confirmed on-chain, supervised with restart-on-crash semantics.

mod bonded_address;
mod supervisor;

pub use bonded_address::BondedAddressTask;
pub use supervisor::{TaskOutcome, WorkTask, WorkTracker, WorkTrackerConfig};
