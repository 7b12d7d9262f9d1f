//! Per-account signer and policy registries.
//!
//! [`AccountSessions`] holds every session of one account: the signer table
//! and the three policy collections, all keyed by [`SignerId`] (plus
//! [`ActionId`] for action policies). [`SessionStore`] owns one
//! `AccountSessions` per account; accounts never share state.

use std::collections::HashMap;

use tracing::debug;

use crate::{ActionId, Address, PolicyList, SessionRegistration, SignerId};

/// Installed signer module for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerEntry {
    /// Signer module address
    pub signer: Address,
    /// Module-specific init data forwarded to `on_install`
    pub init_data: Vec<u8>,
}

/// Everything removed by [`AccountSessions::remove`].
pub type RemovedSession = SessionRegistration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSessions {
    signers: HashMap<SignerId, SignerEntry>,
    user_op_policies: HashMap<SignerId, PolicyList>,
    erc1271_policies: HashMap<SignerId, PolicyList>,
    action_policies: HashMap<(SignerId, ActionId), PolicyList>,
    /// Enabled actions per signer, in enable order
    actions: HashMap<SignerId, Vec<ActionId>>,
    /// Enable nonce per signer id. Kept across removal and bumped on every
    /// enable and removal, so an owner signature enables at most once.
    nonces: HashMap<SignerId, u64>,
}

impl AccountSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, signer_id: &SignerId) -> bool {
        self.signers.contains_key(signer_id)
    }

    pub fn signer(&self, signer_id: &SignerId) -> Option<&SignerEntry> {
        self.signers.get(signer_id)
    }

    pub fn user_op_policies(&self, signer_id: &SignerId) -> Option<&PolicyList> {
        self.user_op_policies.get(signer_id)
    }

    pub fn erc1271_policies(&self, signer_id: &SignerId) -> Option<&PolicyList> {
        self.erc1271_policies.get(signer_id)
    }

    pub fn action_policies(&self, signer_id: &SignerId, action_id: &ActionId) -> Option<&PolicyList> {
        self.action_policies.get(&(*signer_id, *action_id))
    }

    /// Actions with configured policies for `signer_id`, in enable order.
    pub fn action_ids(&self, signer_id: &SignerId) -> &[ActionId] {
        self.actions
            .get(signer_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.signers.len()
    }

    /// Nonce the next enable digest for `signer_id` must commit to.
    pub fn nonce(&self, signer_id: &SignerId) -> u64 {
        self.nonces.get(signer_id).copied().unwrap_or_default()
    }

    fn bump_nonce(&mut self, signer_id: &SignerId) {
        let nonce = self.nonces.entry(*signer_id).or_default();
        *nonce = nonce.wrapping_add(1);
    }

    /// Writes all four registrations. Callers check preconditions first;
    /// this never fails part way.
    pub(crate) fn insert(&mut self, registration: SessionRegistration) {
        let SessionRegistration {
            signer_id,
            signer,
            user_op_policies,
            erc1271_policies,
            actions,
        } = registration;

        debug!(
            signer_id = %signer_id,
            user_op = user_op_policies.len(),
            erc1271 = erc1271_policies.len(),
            actions = actions.len(),
            "registering session"
        );

        self.signers.insert(signer_id, signer);
        self.user_op_policies.insert(signer_id, user_op_policies);
        self.erc1271_policies.insert(signer_id, erc1271_policies);
        let mut action_ids = Vec::with_capacity(actions.len());
        for (action_id, policies) in actions {
            self.action_policies.insert((signer_id, action_id), policies);
            action_ids.push(action_id);
        }
        self.actions.insert(signer_id, action_ids);
        self.bump_nonce(&signer_id);
    }

    /// Drops every registration of `signer_id` and hands them back so the
    /// caller can uninstall the modules.
    pub fn remove(&mut self, signer_id: &SignerId) -> Option<RemovedSession> {
        let signer = self.signers.remove(signer_id)?;
        let user_op_policies = self.user_op_policies.remove(signer_id).unwrap_or_default();
        let erc1271_policies = self.erc1271_policies.remove(signer_id).unwrap_or_default();
        let actions = self
            .actions
            .remove(signer_id)
            .unwrap_or_default()
            .into_iter()
            .map(|action_id| {
                let policies = self
                    .action_policies
                    .remove(&(*signer_id, action_id))
                    .unwrap_or_default();
                (action_id, policies)
            })
            .collect();

        self.bump_nonce(signer_id);
        debug!(signer_id = %signer_id, nonce = self.nonce(signer_id), "removed session");
        Some(SessionRegistration {
            signer_id: *signer_id,
            signer,
            user_op_policies,
            erc1271_policies,
            actions,
        })
    }
}

/// Session state for every account known to the validator.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    accounts: HashMap<Address, AccountSessions>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self, account: &Address) -> Option<&AccountSessions> {
        self.accounts.get(account)
    }

    /// Enable nonce of `signer_id` on `account`, zero if never used.
    pub fn nonce(&self, account: &Address, signer_id: &SignerId) -> u64 {
        self.accounts
            .get(account)
            .map(|sessions| sessions.nonce(signer_id))
            .unwrap_or_default()
    }

    /// Working copy of an account's sessions, empty for unknown accounts.
    pub fn snapshot(&self, account: &Address) -> AccountSessions {
        self.accounts.get(account).cloned().unwrap_or_default()
    }

    /// Replaces an account's sessions with a fully validated working copy.
    pub fn commit(&mut self, account: Address, sessions: AccountSessions) {
        self.accounts.insert(account, sessions);
    }
}
