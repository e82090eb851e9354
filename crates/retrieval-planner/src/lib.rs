//! Client-side orchestration of a PRE retrieval: which operators to query
//! for which capsules, tracked to threshold completion.

mod plan;
mod transport;

pub use plan::{RetrievalKit, RetrievalPlan, RetrievalWorkOrder};
pub use transport::{run_plan, RetrievalTransport};
