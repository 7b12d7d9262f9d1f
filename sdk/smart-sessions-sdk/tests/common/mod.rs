//! In-memory host for validator tests: a smart account with an owner key, a
//! keyed signer module, configurable policy modules and an executor.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use smart_sessions_interface::{
    AccountExecutor, ActionCheck, ActionPolicy, CallFailure, Erc1271Check, Erc1271Policy,
    ModuleError, ModuleResolver, PackedUserOperation, SessionModule, SessionSigner,
    SignatureRequest, SmartAccount, UserOpPolicy, ERC1271_INVALID, ERC1271_MAGIC_VALUE,
};
use smart_sessions_program::{SessionConfig, SessionMode, SmartSession, ValidatorConfig};
use smart_sessions_sdk::{
    action_id, enable_signature, use_signature, EnableSessionsBuilder, PolicyConfigBuilder,
    SessionConfigBuilder,
};
use smart_sessions_state::{
    decode_install_data, keccak256, ActionId, Address, SessionId, SignerId, ValidationData,
};

pub const ACCOUNT: Address = [0xAC; 20];
pub const SIGNER_MODULE: Address = [0x51; 20];
pub const USER_OP_POLICY: Address = [0x01; 20];
pub const ERC1271_POLICY: Address = [0x02; 20];
pub const ACTION_POLICY: Address = [0x03; 20];
pub const SECOND_ACTION_POLICY: Address = [0x04; 20];
/// Registered as a user-op policy only
pub const USER_OP_ONLY: Address = [0x05; 20];
/// Not known to the host at all
pub const UNKNOWN_MODULE: Address = [0xEE; 20];

pub const TOKEN: Address = [0x7A; 20];
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

pub const SESSION_KEY: &[u8] = b"session-key-1";

/// Policy init data that accepts.
pub fn allow() -> Vec<u8> {
    vec![0]
}

/// Policy init data that reports failure.
pub fn deny() -> Vec<u8> {
    vec![1]
}

/// Policy init data that accepts within a window.
pub fn window(valid_after: u64, valid_until: u64) -> Vec<u8> {
    let mut data = vec![0];
    data.extend_from_slice(&valid_after.to_be_bytes());
    data.extend_from_slice(&valid_until.to_be_bytes());
    data
}

fn verdict(init_data: &[u8]) -> Result<ValidationData, ModuleError> {
    match init_data {
        [0] => Ok(ValidationData::SUCCESS),
        [1] => Ok(ValidationData::FAILED),
        [0, rest @ ..] if rest.len() == 16 => {
            let mut after = [0u8; 8];
            let mut until = [0u8; 8];
            after.copy_from_slice(&rest[..8]);
            until.copy_from_slice(&rest[8..]);
            Ok(ValidationData::window(
                u64::from_be_bytes(after),
                u64::from_be_bytes(until),
            ))
        },
        _ => Err(ModuleError::InvalidStateData),
    }
}

/// Session signature a [`MockSigner`] accepts for `key`.
pub fn session_sign(key: &[u8], hash: &[u8; 32]) -> Vec<u8> {
    keccak256([key, hash.as_slice()].concat()).to_vec()
}

pub fn transfer_call(amount: u8) -> Vec<u8> {
    let mut call = TRANSFER_SELECTOR.to_vec();
    call.extend_from_slice(&[0u8; 31]);
    call.push(amount);
    call
}

#[derive(Default)]
pub struct MockSigner {
    pub keys: RefCell<HashMap<SessionId, Vec<u8>>>,
    pub fail_install: Cell<bool>,
    pub proofs: Cell<usize>,
}

impl SessionModule for MockSigner {
    fn on_install(&self, data: &[u8]) -> Result<(), ModuleError> {
        if self.fail_install.get() {
            return Err(ModuleError::Rejected("signer install refused".into()));
        }
        let install = decode_install_data(data).map_err(|_| ModuleError::InvalidStateData)?;
        self.keys
            .borrow_mut()
            .insert(install.session_id, install.payload.to_vec());
        Ok(())
    }

    fn on_uninstall(&self, data: &[u8]) -> Result<(), ModuleError> {
        let install = decode_install_data(data).map_err(|_| ModuleError::InvalidStateData)?;
        self.keys.borrow_mut().remove(&install.session_id);
        Ok(())
    }
}

impl SessionSigner for MockSigner {
    fn prove_authorization(&self, request: &SignatureRequest<'_>) -> Result<(), ModuleError> {
        self.proofs.set(self.proofs.get() + 1);
        let keys = self.keys.borrow();
        let key = keys
            .get(&request.session_id)
            .ok_or(ModuleError::NotInitialized(request.session_id))?;
        if request.signature == session_sign(key, &request.hash).as_slice() {
            Ok(())
        } else {
            Err(ModuleError::VerificationFailed)
        }
    }
}

/// Serves every policy kind; behaviour per session comes from its init data.
#[derive(Default)]
pub struct MockPolicy {
    pub installed: RefCell<HashMap<SessionId, Vec<u8>>>,
    pub fail_install: Cell<bool>,
    pub fail_uninstall: Cell<bool>,
    pub checks: Cell<usize>,
    pub uninstalls: Cell<usize>,
    pub actions_seen: RefCell<Vec<(Address, Address, u128, ActionId)>>,
}

impl MockPolicy {
    fn check(&self, session_id: &SessionId) -> Result<ValidationData, ModuleError> {
        self.checks.set(self.checks.get() + 1);
        let installed = self.installed.borrow();
        let init_data = installed
            .get(session_id)
            .ok_or(ModuleError::NotInitialized(*session_id))?;
        verdict(init_data)
    }
}

impl SessionModule for MockPolicy {
    fn on_install(&self, data: &[u8]) -> Result<(), ModuleError> {
        if self.fail_install.get() {
            return Err(ModuleError::Rejected("policy install refused".into()));
        }
        let install = decode_install_data(data).map_err(|_| ModuleError::InvalidStateData)?;
        self.installed
            .borrow_mut()
            .insert(install.session_id, install.payload.to_vec());
        Ok(())
    }

    fn on_uninstall(&self, data: &[u8]) -> Result<(), ModuleError> {
        if self.fail_uninstall.get() {
            return Err(ModuleError::Rejected("policy uninstall refused".into()));
        }
        let install = decode_install_data(data).map_err(|_| ModuleError::InvalidStateData)?;
        self.installed.borrow_mut().remove(&install.session_id);
        self.uninstalls.set(self.uninstalls.get() + 1);
        Ok(())
    }
}

impl UserOpPolicy for MockPolicy {
    fn check_user_op(
        &self,
        session_id: &SessionId,
        _op: &PackedUserOperation,
    ) -> Result<ValidationData, ModuleError> {
        self.check(session_id)
    }
}

impl Erc1271Policy for MockPolicy {
    fn check_signature(&self, check: &Erc1271Check<'_>) -> Result<ValidationData, ModuleError> {
        self.check(&check.session_id)
    }
}

impl ActionPolicy for MockPolicy {
    fn check_action(&self, check: &ActionCheck<'_>) -> Result<ValidationData, ModuleError> {
        self.actions_seen.borrow_mut().push((
            check.caller,
            check.target,
            check.value,
            check.action_id,
        ));
        self.check(&check.session_id)
    }
}

pub struct MockHost {
    pub signer: MockSigner,
    pub policies: HashMap<Address, MockPolicy>,
}

impl MockHost {
    pub fn new() -> Self {
        let policies = [
            USER_OP_POLICY,
            ERC1271_POLICY,
            ACTION_POLICY,
            SECOND_ACTION_POLICY,
            USER_OP_ONLY,
        ]
        .into_iter()
        .map(|address| (address, MockPolicy::default()))
        .collect();
        Self {
            signer: MockSigner::default(),
            policies,
        }
    }

    pub fn policy(&self, address: &Address) -> &MockPolicy {
        &self.policies[address]
    }

    /// True when no module holds install state for any session.
    pub fn is_clean(&self) -> bool {
        self.signer.keys.borrow().is_empty()
            && self.policies.values().all(|p| p.installed.borrow().is_empty())
    }

    /// Policy checks run across every module.
    pub fn total_checks(&self) -> usize {
        self.policies.values().map(|p| p.checks.get()).sum()
    }
}

impl ModuleResolver for MockHost {
    fn signer(&self, module: &Address) -> Option<&dyn SessionSigner> {
        (*module == SIGNER_MODULE).then_some(&self.signer as &dyn SessionSigner)
    }

    fn user_op_policy(&self, module: &Address) -> Option<&dyn UserOpPolicy> {
        self.policies.get(module).map(|p| p as &dyn UserOpPolicy)
    }

    fn erc1271_policy(&self, module: &Address) -> Option<&dyn Erc1271Policy> {
        if *module == USER_OP_ONLY {
            return None;
        }
        self.policies.get(module).map(|p| p as &dyn Erc1271Policy)
    }

    fn action_policy(&self, module: &Address) -> Option<&dyn ActionPolicy> {
        if *module == USER_OP_ONLY {
            return None;
        }
        self.policies.get(module).map(|p| p as &dyn ActionPolicy)
    }
}

/// Smart account whose owner "signs" by hashing with a secret.
pub struct MockAccount {
    pub address: Address,
    secret: Vec<u8>,
}

impl MockAccount {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            secret: b"owner-secret".to_vec(),
        }
    }

    pub fn owner_sign(&self, hash: &[u8; 32]) -> Vec<u8> {
        keccak256([self.secret.as_slice(), hash.as_slice()].concat()).to_vec()
    }
}

impl SmartAccount for MockAccount {
    fn address(&self) -> Address {
        self.address
    }

    fn is_valid_signature(&self, hash: &[u8; 32], signature: &[u8]) -> [u8; 4] {
        if signature == self.owner_sign(hash).as_slice() {
            ERC1271_MAGIC_VALUE
        } else {
            ERC1271_INVALID
        }
    }
}

#[derive(Default)]
pub struct MockExecutor {
    pub calls: Vec<(Address, u128, Vec<u8>)>,
    /// Calls to this target revert with the given data
    pub revert: Option<(Address, Vec<u8>)>,
}

impl AccountExecutor for MockExecutor {
    fn execute(
        &mut self,
        target: &Address,
        value: u128,
        call_data: &[u8],
    ) -> Result<Vec<u8>, CallFailure> {
        if let Some((reverting, data)) = &self.revert {
            if reverting == target {
                return Err(CallFailure {
                    target: *target,
                    revert_data: data.clone(),
                });
            }
        }
        self.calls.push((*target, value, call_data.to_vec()));
        Ok(keccak256(call_data)[..4].to_vec())
    }
}

pub struct TestContext {
    pub validator: SmartSession,
    pub host: MockHost,
    pub account: MockAccount,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(ValidatorConfig::default())
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self {
            validator: SmartSession::new(config).expect("valid config"),
            host: MockHost::new(),
            account: MockAccount::new(ACCOUNT),
        }
    }

    /// Signer, one permissive policy of each scope, and token transfers
    /// guarded by one permissive action policy.
    pub fn session(&self) -> SessionConfigBuilder {
        SessionConfigBuilder::new()
            .with_signer(SIGNER_MODULE, SESSION_KEY.to_vec())
            .with_user_op_policies(PolicyConfigBuilder::new().add_policy(USER_OP_POLICY, allow()))
            .with_erc1271_policies(PolicyConfigBuilder::new().add_policy(ERC1271_POLICY, allow()))
            .with_action(
                action_id(&TOKEN, TRANSFER_SELECTOR),
                PolicyConfigBuilder::new().add_policy(ACTION_POLICY, allow()),
            )
    }

    pub fn enable_direct(&mut self, signer_id: SignerId, session: SessionConfig) -> anyhow::Result<()> {
        self.validator
            .enable_sessions(&self.host, &ACCOUNT, vec![(signer_id, session)])?;
        Ok(())
    }

    pub fn user_op(&self, call_data: Vec<u8>, nonce: u8) -> PackedUserOperation {
        let mut op = PackedUserOperation {
            sender: ACCOUNT,
            call_data,
            ..Default::default()
        };
        op.nonce[31] = nonce;
        op
    }

    pub fn op_hash(op: &PackedUserOperation) -> [u8; 32] {
        keccak256([op.sender.as_slice(), op.nonce.as_slice(), op.call_data.as_slice()].concat())
    }

    /// Signs `op` in USE mode with `key`.
    pub fn sign_use(op: &mut PackedUserOperation, signer_id: &SignerId, key: &[u8]) {
        let hash = Self::op_hash(op);
        op.signature = use_signature(signer_id, &session_sign(key, &hash));
    }

    /// Signs `op` in an enable mode, with the owner authorizing `session`.
    pub fn sign_enable(
        &self,
        op: &mut PackedUserOperation,
        mode: SessionMode,
        signer_id: &SignerId,
        session: SessionConfig,
    ) -> anyhow::Result<()> {
        let enable = EnableSessionsBuilder::for_validator(&self.validator, ACCOUNT, *signer_id, session)
            .sign_with(|digest| self.account.owner_sign(digest))?;
        let hash = Self::op_hash(op);
        op.signature = enable_signature(mode, &enable, signer_id, &session_sign(SESSION_KEY, &hash))?;
        Ok(())
    }

    pub fn validate(&mut self, op: &PackedUserOperation) -> smart_sessions_program::Result<ValidationData> {
        let hash = Self::op_hash(op);
        self.validator
            .validate_user_op(&self.host, &self.account, &hash, op)
    }
}
