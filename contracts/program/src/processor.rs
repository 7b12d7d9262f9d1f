//! Validator entry points
//!
//! Thin layer that routes each request to its handler and owns the session
//! store. Handlers that may enable or remove sessions work on a snapshot of
//! the account's sessions, which is committed only when they succeed.

use smart_sessions_interface::{
    ModuleResolver, PackedUserOperation, SmartAccount, ERC1271_INVALID, ERC1271_MAGIC_VALUE,
};
use smart_sessions_state::{
    address_hex, AccountSessions, Address, SessionId, SessionStore, SignerEntry, SignerId,
    ValidationData,
};
use tracing::{debug, warn};

use crate::actions;
use crate::config::ValidatorConfig;
use crate::error::Result;
use crate::instruction::{decode_mode, SessionConfig, SessionMode};

/// Session-scoped validator for smart accounts.
#[derive(Debug, Clone, Default)]
pub struct SmartSession {
    config: ValidatorConfig,
    store: SessionStore,
}

impl SmartSession {
    pub fn new(config: ValidatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: SessionStore::new(),
        })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Validates a user operation for `account`.
    ///
    /// In an enable mode the session is enabled and the same operation is
    /// then enforced against it; nothing is stored unless both succeed.
    pub fn validate_user_op(
        &mut self,
        modules: &dyn ModuleResolver,
        account: &dyn SmartAccount,
        op_hash: &[u8; 32],
        op: &PackedUserOperation,
    ) -> Result<ValidationData> {
        let address = account.address();
        let (mode, payload) = decode_mode(&op.signature).map_err(|e| {
            warn!(account = %address_hex(&address), error = %e, "malformed session signature");
            e
        })?;
        debug!(account = %address_hex(&address), ?mode, "validating user operation");

        match mode {
            SessionMode::Use => {
                let empty = AccountSessions::new();
                let sessions = self.store.account(&address).unwrap_or(&empty);
                actions::enforce_use(modules, &self.config, sessions, &address, op_hash, op, payload)
            },
            SessionMode::Enable | SessionMode::UnsafeEnable => {
                let mut staged = self.store.snapshot(&address);
                let (signer_id, use_payload) = actions::enable_in_band(
                    modules,
                    &self.config,
                    account,
                    &mut staged,
                    mode,
                    payload,
                )?;
                let enforced = actions::enforce_use(
                    modules,
                    &self.config,
                    &staged,
                    &address,
                    op_hash,
                    op,
                    use_payload,
                );
                let result = match enforced {
                    Ok(result) => result,
                    Err(e) => {
                        actions::rollback_session(modules, &mut staged, &address, &signer_id);
                        return Err(e);
                    },
                };
                self.store.commit(address, staged);
                Ok(result)
            },
        }
    }

    /// ERC-1271 check through a session, with the detailed outcome.
    pub fn validate_signature_with_sender(
        &self,
        modules: &dyn ModuleResolver,
        account: &Address,
        sender: &Address,
        hash: &[u8; 32],
        signature: &[u8],
    ) -> Result<ValidationData> {
        let empty = AccountSessions::new();
        let sessions = self.store.account(account).unwrap_or(&empty);
        actions::validate_signature_with_sender(modules, sessions, account, sender, hash, signature)
    }

    /// ERC-1271 check through a session.
    ///
    /// Returns the magic value only if the check passes and its validity
    /// window admits `timestamp`.
    pub fn is_valid_signature_with_sender(
        &self,
        modules: &dyn ModuleResolver,
        account: &Address,
        sender: &Address,
        hash: &[u8; 32],
        signature: &[u8],
        timestamp: u64,
    ) -> [u8; 4] {
        match self.validate_signature_with_sender(modules, account, sender, hash, signature) {
            Ok(result) if result.is_valid_at(timestamp) => ERC1271_MAGIC_VALUE,
            Ok(result) => {
                debug!(
                    timestamp,
                    valid_after = result.valid_after,
                    valid_until = result.valid_until,
                    "signature outside validity window"
                );
                ERC1271_INVALID
            },
            Err(e) => {
                warn!(account = %address_hex(account), error = %e, "session signature rejected");
                ERC1271_INVALID
            },
        }
    }

    /// Enables sessions directly on behalf of `account`, without an owner
    /// signature. All sessions are enabled or none are.
    pub fn enable_sessions(
        &mut self,
        modules: &dyn ModuleResolver,
        account: &Address,
        sessions: Vec<(SignerId, SessionConfig)>,
    ) -> Result<Vec<SessionId>> {
        let mut staged = self.store.snapshot(account);
        let enabled =
            actions::enable_sessions(modules, &self.config, &mut staged, account, sessions)?;
        self.store.commit(*account, staged);
        Ok(enabled)
    }

    pub fn remove_session(
        &mut self,
        modules: &dyn ModuleResolver,
        account: &Address,
        signer_id: &SignerId,
    ) -> Result<()> {
        let mut staged = self.store.snapshot(account);
        actions::remove_session(modules, &mut staged, account, signer_id)?;
        self.store.commit(*account, staged);
        Ok(())
    }

    pub fn is_session_enabled(&self, account: &Address, signer_id: &SignerId) -> bool {
        self.store
            .account(account)
            .is_some_and(|sessions| sessions.is_enabled(signer_id))
    }

    pub fn signer_entry(&self, account: &Address, signer_id: &SignerId) -> Option<&SignerEntry> {
        self.store.account(account)?.signer(signer_id)
    }

    /// Nonce the owner's next enable signature for `signer_id` must cover.
    pub fn enable_nonce(&self, account: &Address, signer_id: &SignerId) -> u64 {
        self.store.nonce(account, signer_id)
    }

    pub fn session_id_for(account: &Address, signer_id: &SignerId) -> SessionId {
        SessionId::for_signer(account, signer_id)
    }
}
