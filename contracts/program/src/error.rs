//! Smart Sessions Error Types

use smart_sessions_interface::{CallFailure, ModuleError};
use smart_sessions_state::{
    address_hex, Address, ModuleKind, PolicyKind, SessionId, SessionStateError, SignerId,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmartSessionError {
    #[error(transparent)]
    State(#[from] SessionStateError),

    #[error("Unknown session mode 0x{0:02x}")]
    UnknownMode(u8),

    #[error("Malformed enable data: {0}")]
    MalformedEnableData(String),

    #[error("Unsafe enable mode is disabled")]
    UnsafeEnableDisabled,

    #[error("Invalid enable signature for account {} over digest 0x{}", address_hex(.account), hex::encode(.digest))]
    InvalidEnableSignature { account: Address, digest: [u8; 32] },

    #[error("No signer registered for {0}")]
    SignerNotFound(SignerId),

    #[error("Module {} does not implement {kind}", address_hex(.module))]
    ModuleNotFound { kind: ModuleKind, module: Address },

    #[error("Module {} rejected install: {reason}", address_hex(.module))]
    ModuleInstallFailed { module: Address, reason: ModuleError },

    #[error("Module {} rejected uninstall: {reason}", address_hex(.module))]
    ModuleUninstallFailed { module: Address, reason: ModuleError },

    #[error("Invalid session signature for {signer_id}: {reason}")]
    InvalidSessionSignature { signer_id: SignerId, reason: ModuleError },

    #[error("{kind} policy {} rejected session {session}", address_hex(.policy))]
    PolicyViolation {
        kind: PolicyKind,
        policy: Address,
        session: SessionId,
    },

    #[error("{kind} policies for session {session}: {found} configured, {required} required")]
    InsufficientPolicies {
        kind: PolicyKind,
        session: SessionId,
        required: usize,
        found: usize,
    },

    #[error("Unsupported call type 0x{0:02x}")]
    UnsupportedCallType(u8),

    #[error("Unsupported execution type 0x{0:02x}")]
    UnsupportedExecutionType(u8),

    #[error("executeFromExecutor is not supported for sessions")]
    UnsupportedExecutionPath,

    #[error("Call data is not an execution")]
    NotAnExecution,

    #[error("Call value does not fit in 128 bits")]
    ValueOverflow,

    #[error("Malformed batch: {0}")]
    MalformedBatch(String),

    #[error("Batch of {found} calls exceeds limit of {max}")]
    BatchTooLarge { found: usize, max: usize },

    #[error("{found} {kind} policies exceed limit of {max}")]
    TooManyPolicies {
        kind: PolicyKind,
        found: usize,
        max: usize,
    },

    #[error("{found} actions exceed limit of {max}")]
    TooManyActions { found: usize, max: usize },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Call(#[from] CallFailure),
}

/// Result type alias for validator operations
pub type Result<T> = std::result::Result<T, SmartSessionError>;
