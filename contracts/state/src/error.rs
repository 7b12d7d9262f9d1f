use thiserror::Error;

use crate::{ActionId, PolicyKind, SignerId};

/// Error types related to session state decoding and registration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionStateError {
    /// Payload shorter than its fixed-size prefix; carries the observed length
    #[error("Data too short: {0} bytes")]
    DataTooShort(usize),

    /// The signer id already has a registered session
    #[error("Session for signer {0} is already enabled")]
    SessionAlreadyEnabled(SignerId),

    /// No session is registered for the signer id
    #[error("No session enabled for signer {0}")]
    SessionNotFound(SignerId),

    /// The same module appears twice in one policy list
    #[error("Duplicate {kind} policy 0x{}", hex::encode(.policy))]
    DuplicatePolicy { kind: PolicyKind, policy: [u8; 20] },

    /// The same action id appears twice in one enable payload
    #[error("Duplicate action {0}")]
    DuplicateAction(ActionId),
}
