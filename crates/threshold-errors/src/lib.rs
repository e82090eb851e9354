//! Unified error taxonomy for the operator node.
//!
//! Every leaf component returns a typed [`NodeError`] variant; callers at the
//! HTTP boundary map it to a status code via [`NodeError::http_status`]
//! rather than each component reasoning about transport concerns.

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, NodeError>;

/// The failing leaf's position within a [`ConditionLingo`] tree.
///
/// [`ConditionLingo`]: https://docs.rs/condition-lingo (crate in this workspace)
pub type LeafIndex = usize;

/// Errors surfaced anywhere in the reencryption / DKG / condition-evaluation
/// pipeline. Never swallowed: always propagated to the HTTP boundary or to
/// the retrieval planner, per the error handling design.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// kfrag decryption failed (bad MAC or padding). Never reveals which.
    #[error("key fragment decryption failed")]
    DecryptionFailed,

    /// A signature verification failed somewhere in the pipeline.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The HRAC is present in this operator's revocation set.
    #[error("policy revoked: {0}")]
    PolicyRevoked(String),

    /// A condition evaluated to `Failed`; carries the first failing leaf.
    #[error("conditions not satisfied at leaf {0}")]
    ConditionsNotSatisfied(LeafIndex),

    /// A context variable referenced by a condition was not supplied.
    #[error("required input missing: {0}")]
    RequiredInput(String),

    /// Static validation of a condition failed at construction time.
    #[error("invalid condition: {0}")]
    InvalidCondition(String),

    /// The requested chain id has no configured RPC endpoint.
    #[error("no connection configured for chain {0}")]
    NoConnectionForChain(u64),

    /// An RPC call exceeded its timeout budget.
    #[error("rpc timeout calling chain {0}")]
    RpcTimeout(u64),

    /// An RPC call failed for a reason other than timeout.
    #[error("rpc error: {0}")]
    RpcError(String),

    /// A previously cached per-block result was invalidated by a reorg.
    #[error("chain reorg detected at block {0}")]
    ChainReorg(u64),

    /// The embedded HRAC did not match the HRAC supplied with the request.
    #[error("encrypted key fragment bound to a different policy")]
    WrongPolicy,

    /// A ritual operation was attempted from an incompatible ritual status.
    #[error("ritual {ritual_id} not in required state: {reason}")]
    InvalidRitualState { ritual_id: u32, reason: String },

    /// Round 2 could not proceed because a node's transcript slot was empty.
    #[error("missing transcripts for ritual {0}")]
    MissingTranscripts(u32),

    /// Posting a transcript/aggregation to the coordinator reverted.
    #[error("coordinator transaction reverted: {0}")]
    CoordinatorTxReverted(String),

    /// Anything else; no further detail is leaked to the caller.
    #[error("internal error")]
    InternalError,

    /// A request body failed to decode into the expected wire type.
    /// Carries the decode error for logging only; never surfaced to the
    /// caller, who instead sees [`NodeError::class_name`].
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

impl NodeError {
    /// Map to the HTTP status code named in the error handling design.
    /// This is applied exactly once, at the HTTP boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            NodeError::DecryptionFailed => 403,
            NodeError::InvalidSignature(_) => 401,
            NodeError::PolicyRevoked(_) => 401,
            NodeError::ConditionsNotSatisfied(_) => 403,
            NodeError::RequiredInput(_) => 403,
            NodeError::InvalidCondition(_) => 400,
            NodeError::NoConnectionForChain(_) => 400,
            NodeError::RpcTimeout(_) => 502,
            NodeError::RpcError(_) => 502,
            NodeError::ChainReorg(_) => 502,
            NodeError::WrongPolicy => 400,
            NodeError::InvalidRitualState { .. } => 409,
            NodeError::MissingTranscripts(_) => 409,
            NodeError::CoordinatorTxReverted(_) => 502,
            NodeError::InternalError => 500,
            NodeError::MalformedRequest(_) => 400,
        }
    }

    /// `true` for errors a retrying caller may reasonably retry as-is
    /// (e.g. the retrieval planner never retries the *same* operator, but a
    /// client-side caller talking to a single operator may).
    pub fn is_transient(&self) -> bool {
        matches!(self, NodeError::RpcTimeout(_) | NodeError::RpcError(_))
    }
}

impl NodeError {
    /// Coarse class name, used for the 400 "malformed request" responses
    /// where only the error class (not detail) should be surfaced, matching
    /// the original server's behavior of responding with the literal
    /// exception class name rather than a free-text message.
    pub fn class_name(&self) -> &'static str {
        match self {
            NodeError::DecryptionFailed => "DecryptionFailed",
            NodeError::InvalidSignature(_) => "InvalidSignature",
            NodeError::PolicyRevoked(_) => "PolicyRevoked",
            NodeError::ConditionsNotSatisfied(_) => "ConditionsNotSatisfied",
            NodeError::RequiredInput(_) => "RequiredInput",
            NodeError::InvalidCondition(_) => "InvalidCondition",
            NodeError::NoConnectionForChain(_) => "NoConnectionForChain",
            NodeError::RpcTimeout(_) => "RpcTimeout",
            NodeError::RpcError(_) => "RpcError",
            NodeError::ChainReorg(_) => "ChainReorg",
            NodeError::WrongPolicy => "WrongPolicy",
            NodeError::InvalidRitualState { .. } => "InvalidRitualState",
            NodeError::MissingTranscripts(_) => "MissingTranscripts",
            NodeError::CoordinatorTxReverted(_) => "CoordinatorTxReverted",
            NodeError::InternalError => "InternalError",
            NodeError::MalformedRequest(_) => "MalformedRequest",
        }
    }

    /// `true` for the one class of error whose response body must be just
    /// the class name, never the `Display` detail (which may echo back
    /// attacker-controlled parse-error text).
    pub fn is_malformed_request(&self) -> bool {
        matches!(self, NodeError::MalformedRequest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_design() {
        assert_eq!(NodeError::DecryptionFailed.http_status(), 403);
        assert_eq!(NodeError::PolicyRevoked("x".into()).http_status(), 401);
        assert_eq!(NodeError::ConditionsNotSatisfied(2).http_status(), 403);
        assert_eq!(NodeError::RequiredInput("y".into()).http_status(), 403);
        assert_eq!(NodeError::InvalidCondition("z".into()).http_status(), 400);
        assert_eq!(NodeError::NoConnectionForChain(99).http_status(), 400);
        assert_eq!(NodeError::InternalError.http_status(), 500);
        assert_eq!(NodeError::MalformedRequest("x".into()).http_status(), 400);
    }

    #[test]
    fn transient_classification() {
        assert!(NodeError::RpcTimeout(1).is_transient());
        assert!(!NodeError::PolicyRevoked("x".into()).is_transient());
    }

    #[test]
    fn only_malformed_request_is_class_name_only() {
        let err = NodeError::MalformedRequest("bad bytes".into());
        assert!(err.is_malformed_request());
        assert_eq!(err.class_name(), "MalformedRequest");
        assert!(!NodeError::InternalError.is_malformed_request());
    }
}
