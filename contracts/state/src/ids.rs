//! Session addressing.
//!
//! Every piece of per-session state is keyed by a [`SessionId`] derived from
//! the account and the owner-chosen [`SignerId`], optionally narrowed by an
//! [`ActionId`]. Derivation is a pure keccak256 over the packed inputs.

use core::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use sha3::{Digest, Keccak256};

/// 20-byte account / module address.
pub type Address = [u8; 20];

/// keccak256 of `data`.
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data.as_ref());
    hasher.finalize().into()
}

/// Leading four bytes of a call payload, zero-padded when shorter.
pub fn selector_of(call_data: &[u8]) -> [u8; 4] {
    let mut selector = [0u8; 4];
    let len = call_data.len().min(4);
    selector[..len].copy_from_slice(&call_data[..len]);
    selector
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, BorshSerialize,
            BorshDeserialize,
        )]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub const LEN: usize = 32;

            pub const fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self)
            }
        }
    };
}

define_id!(
    /// Primary key into all per-session state.
    SessionId
);
define_id!(
    /// Owner-chosen name for a signer configuration, unique per account.
    SignerId
);
define_id!(
    /// Fingerprint of a call target and selector.
    ActionId
);

impl SessionId {
    /// Session id for signer, operation-policy and verification-policy state.
    pub fn for_signer(account: &Address, signer_id: &SignerId) -> Self {
        let mut packed = [0u8; 20 + 32];
        packed[..20].copy_from_slice(account);
        packed[20..].copy_from_slice(&signer_id.0);
        Self(keccak256(packed))
    }

    /// Session id for policies scoped to a single action.
    pub fn for_action(account: &Address, signer_id: &SignerId, action_id: &ActionId) -> Self {
        let mut packed = [0u8; 20 + 32 + 32];
        packed[..20].copy_from_slice(account);
        packed[20..52].copy_from_slice(&signer_id.0);
        packed[52..].copy_from_slice(&action_id.0);
        Self(keccak256(packed))
    }
}

impl ActionId {
    /// `keccak256(target ‖ selector(call_data))`.
    pub fn for_call(target: &Address, call_data: &[u8]) -> Self {
        let mut packed = [0u8; 20 + 4];
        packed[..20].copy_from_slice(target);
        packed[20..].copy_from_slice(&selector_of(call_data));
        Self(keccak256(packed))
    }
}
