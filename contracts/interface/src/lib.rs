//! Smart Sessions Module Interface
//!
//! This crate defines the interfaces the validator calls out to: signer
//! modules, the three kinds of policy modules, and the smart account itself.
//! Modules are addressed by their 20-byte address and looked up through a
//! [`ModuleResolver`]; the validator never special-cases a concrete module.

use smart_sessions_state::{address_hex, ActionId, Address, SessionId, ValidationData};
use thiserror::Error;

/// `bytes4(keccak256("isValidSignature(bytes32,bytes)"))`
pub const ERC1271_MAGIC_VALUE: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

/// Returned by signature checks that fail.
pub const ERC1271_INVALID: [u8; 4] = [0xff, 0xff, 0xff, 0xff];

/// ERC-4337 packed user operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedUserOperation {
    pub sender: Address,
    pub nonce: [u8; 32],
    pub init_code: Vec<u8>,
    pub call_data: Vec<u8>,
    pub account_gas_limits: [u8; 32],
    pub pre_verification_gas: [u8; 32],
    pub gas_fees: [u8; 32],
    pub paymaster_and_data: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Context handed to a signer module.
#[derive(Debug, Clone, Copy)]
pub struct SignatureRequest<'a> {
    pub session_id: SessionId,
    pub account: Address,
    /// Operation hash, or the hash being verified on the ERC-1271 path
    pub hash: [u8; 32],
    /// Raw signature with the session prefix stripped
    pub signature: &'a [u8],
}

/// Context handed to an ERC-1271 policy.
#[derive(Debug, Clone, Copy)]
pub struct Erc1271Check<'a> {
    pub session_id: SessionId,
    pub account: Address,
    /// Contract asking the account to verify the signature
    pub sender: Address,
    pub hash: [u8; 32],
    pub signature: &'a [u8],
}

/// Context handed to an action policy for one requested call.
#[derive(Debug, Clone, Copy)]
pub struct ActionCheck<'a> {
    pub session_id: SessionId,
    pub action_id: ActionId,
    pub account: Address,
    pub caller: Address,
    pub target: Address,
    pub value: u128,
    pub call_data: &'a [u8],
}

/// Error codes for module operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleError {
    /// Verification failed - operation not allowed
    #[error("Verification failed")]
    VerificationFailed,

    /// Module holds no configuration for the session
    #[error("Module not initialized for session {0}")]
    NotInitialized(SessionId),

    /// Invalid install or state data format
    #[error("Invalid state data")]
    InvalidStateData,

    /// Invalid check context
    #[error("Invalid context")]
    InvalidContext,

    #[error("{0}")]
    Rejected(String),
}

/// Lifecycle hooks shared by every module.
///
/// `data` uses the install-data layout (session id, account, init data).
pub trait SessionModule {
    fn on_install(&self, _data: &[u8]) -> Result<(), ModuleError> {
        Ok(())
    }

    fn on_uninstall(&self, _data: &[u8]) -> Result<(), ModuleError> {
        Ok(())
    }
}

/// Proves that a signature authorizes a hash for a session.
///
/// Implementations must fail closed and must not mutate state while
/// verifying.
pub trait SessionSigner: SessionModule {
    fn prove_authorization(&self, request: &SignatureRequest<'_>) -> Result<(), ModuleError>;
}

/// Policy evaluated against every operation of a session.
pub trait UserOpPolicy: SessionModule {
    fn check_user_op(
        &self,
        session_id: &SessionId,
        op: &PackedUserOperation,
    ) -> Result<ValidationData, ModuleError>;
}

/// Policy evaluated against signature-verification requests.
pub trait Erc1271Policy: SessionModule {
    fn check_signature(&self, check: &Erc1271Check<'_>) -> Result<ValidationData, ModuleError>;
}

/// Policy evaluated against each call an operation requests.
pub trait ActionPolicy: SessionModule {
    fn check_action(&self, check: &ActionCheck<'_>) -> Result<ValidationData, ModuleError>;
}

/// Maps module addresses to the capabilities they implement.
///
/// Returning `None` means the address does not implement that capability.
pub trait ModuleResolver {
    fn signer(&self, module: &Address) -> Option<&dyn SessionSigner>;

    fn user_op_policy(&self, module: &Address) -> Option<&dyn UserOpPolicy>;

    fn erc1271_policy(&self, module: &Address) -> Option<&dyn Erc1271Policy>;

    fn action_policy(&self, module: &Address) -> Option<&dyn ActionPolicy>;
}

/// The smart account a session belongs to.
pub trait SmartAccount {
    fn address(&self) -> Address;

    /// ERC-1271 owner signature check; returns [`ERC1271_MAGIC_VALUE`] on success.
    fn is_valid_signature(&self, hash: &[u8; 32], signature: &[u8]) -> [u8; 4];
}

/// A reverted external call, with the callee's revert data kept verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Call to {} reverted ({} bytes of revert data)", address_hex(.target), .revert_data.len())]
pub struct CallFailure {
    pub target: Address,
    pub revert_data: Vec<u8>,
}

/// The account's low-level execution primitive.
pub trait AccountExecutor {
    fn execute(&mut self, target: &Address, value: u128, call_data: &[u8])
        -> Result<Vec<u8>, CallFailure>;
}
