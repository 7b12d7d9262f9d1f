use smart_sessions_program::instruction::{
    digest_session, encode_enable_signature, encode_use_signature,
};
use smart_sessions_program::{EnableSessions, SessionConfig, SessionMode, SmartSession};
use smart_sessions_state::{ActionData, ActionId, Address, SignerId};

use crate::basic::policy::PolicyConfigBuilder;
use crate::error::{Result, SessionSdkError};

/// Builds the [`SessionConfig`] of one session.
#[derive(Debug, Default, Clone)]
pub struct SessionConfigBuilder {
    signer: Option<(Address, Vec<u8>)>,
    user_op_policies: PolicyConfigBuilder,
    erc1271_policies: PolicyConfigBuilder,
    actions: Vec<ActionData>,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signer(mut self, module: Address, init_data: impl Into<Vec<u8>>) -> Self {
        self.signer = Some((module, init_data.into()));
        self
    }

    pub fn with_user_op_policies(mut self, policies: PolicyConfigBuilder) -> Self {
        self.user_op_policies = policies;
        self
    }

    pub fn with_erc1271_policies(mut self, policies: PolicyConfigBuilder) -> Self {
        self.erc1271_policies = policies;
        self
    }

    /// Permits `action_id`, guarded by `policies` (which may be empty).
    pub fn with_action(mut self, action_id: ActionId, policies: PolicyConfigBuilder) -> Self {
        self.actions.push(ActionData {
            action_id,
            action_policies: policies.build(),
        });
        self
    }

    pub fn build(self) -> Result<SessionConfig> {
        let (session_validator, session_validator_init_data) =
            self.signer.ok_or(SessionSdkError::MissingSigner)?;
        Ok(SessionConfig {
            session_validator,
            session_validator_init_data,
            user_op_policies: self.user_op_policies.build(),
            erc1271_policies: self.erc1271_policies.build(),
            actions: self.actions,
        })
    }
}

/// Prepares an owner-authorized enable request for one account.
#[derive(Debug, Clone)]
pub struct EnableSessionsBuilder {
    account: Address,
    signer_id: SignerId,
    session: SessionConfig,
    nonce: u64,
}

impl EnableSessionsBuilder {
    /// Request for a signer id that has never been enabled on `account`.
    pub fn new(account: Address, signer_id: SignerId, session: SessionConfig) -> Self {
        Self {
            account,
            signer_id,
            session,
            nonce: 0,
        }
    }

    /// Request bound to the signer id's current enable nonce in `validator`.
    pub fn for_validator(
        validator: &SmartSession,
        account: Address,
        signer_id: SignerId,
        session: SessionConfig,
    ) -> Self {
        Self::new(account, signer_id, session).with_nonce(validator.enable_nonce(&account, &signer_id))
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// The hash the account owner has to sign.
    pub fn digest(&self) -> Result<[u8; 32]> {
        Ok(digest_session(&self.session, &self.account, &self.signer_id, self.nonce)?)
    }

    /// Attaches the owner signature produced by `sign` over [`Self::digest`].
    pub fn sign_with<F>(self, sign: F) -> Result<EnableSessions>
    where
        F: FnOnce(&[u8; 32]) -> Vec<u8>,
    {
        let digest = self.digest()?;
        Ok(EnableSessions {
            session: self.session,
            permission_enable_sig: sign(&digest),
        })
    }
}

/// USE-mode user-op signature.
pub fn use_signature(signer_id: &SignerId, signature: &[u8]) -> Vec<u8> {
    encode_use_signature(signer_id, signature)
}

/// ENABLE or UNSAFE_ENABLE user-op signature.
pub fn enable_signature(
    mode: SessionMode,
    enable: &EnableSessions,
    signer_id: &SignerId,
    signature: &[u8],
) -> Result<Vec<u8>> {
    Ok(encode_enable_signature(mode, enable, signer_id, signature)?)
}
