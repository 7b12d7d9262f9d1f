//! Smart Sessions State Module
//!
//! Per-account session state: identifiers and their derivation, the
//! install-data layout handed to modules, validation results, and the signer
//! and policy registries that the validator reads on every operation.

pub mod builder;
pub mod error;
pub mod ids;
pub mod install;
pub mod policy;
pub mod registry;
pub mod validation;

pub use builder::{ModuleInstall, ModuleKind, SessionBuilder, SessionRegistration};
pub use error::SessionStateError;
pub use ids::{keccak256, selector_of, ActionId, Address, SessionId, SignerId};
pub use install::{decode_install_data, encode_install_data, InstallData, INSTALL_DATA_MIN_LEN};
pub use policy::{ActionData, PolicyData, PolicyKind, PolicyList};
pub use registry::{AccountSessions, RemovedSession, SessionStore, SignerEntry};
pub use validation::ValidationData;

/// The zero address.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Formats an address as `0x`-prefixed lowercase hex.
pub fn address_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}
