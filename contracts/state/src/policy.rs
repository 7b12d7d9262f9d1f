//! Policy configuration records and ordered policy lists.
//!
//! A policy list is the evaluation order for one session scope. Entries keep
//! their insertion order; a module may appear at most once per list.

use core::fmt;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{ActionId, Address, SessionStateError};

/// One policy module reference with its initialization bytes.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct PolicyData {
    /// Policy module address
    pub policy: Address,
    /// Module-specific init data forwarded to `on_install`
    pub init_data: Vec<u8>,
}

impl PolicyData {
    pub fn new(policy: Address, init_data: impl Into<Vec<u8>>) -> Self {
        Self {
            policy,
            init_data: init_data.into(),
        }
    }
}

/// Policies scoped to a single action.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActionData {
    pub action_id: ActionId,
    pub action_policies: Vec<PolicyData>,
}

/// The three independent policy collections kept per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// Checked against every operation
    UserOp,
    /// Checked against signature-verification requests
    Erc1271,
    /// Checked against each requested call
    Action,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::UserOp => "user-op",
            PolicyKind::Erc1271 => "erc1271",
            PolicyKind::Action => "action",
        };
        f.write_str(name)
    }
}

/// Ordered, duplicate-free list of policies for one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyList {
    entries: Vec<PolicyData>,
}

impl PolicyList {
    /// Builds a list in the given order, rejecting repeated modules.
    pub fn from_policies(
        kind: PolicyKind,
        policies: Vec<PolicyData>,
    ) -> Result<Self, SessionStateError> {
        let mut entries: Vec<PolicyData> = Vec::with_capacity(policies.len());
        for policy in policies {
            if entries.iter().any(|entry| entry.policy == policy.policy) {
                return Err(SessionStateError::DuplicatePolicy {
                    kind,
                    policy: policy.policy,
                });
            }
            entries.push(policy);
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PolicyData> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
