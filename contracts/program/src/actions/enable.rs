//! Session enabling, in-band (ENABLE modes) and direct.

use smart_sessions_interface::{ModuleResolver, SmartAccount, ERC1271_MAGIC_VALUE};
use smart_sessions_state::{
    address_hex, AccountSessions, Address, SessionBuilder, SessionId, SessionStateError, SignerId,
};
use tracing::{debug, info, warn};

use crate::actions::hooks::{revert_hooks, run_hooks, Hook};
use crate::config::ValidatorConfig;
use crate::error::{Result, SmartSessionError};
use crate::instruction::{decode_enable, decode_use, SessionConfig, SessionMode};

/// Registers `session` under `signer_id` in `sessions`.
///
/// Install hooks run before the registries change; if any check or hook
/// fails, `sessions` is left untouched and no module keeps install state.
pub fn install_session(
    modules: &dyn ModuleResolver,
    config: &ValidatorConfig,
    sessions: &mut AccountSessions,
    account: &Address,
    signer_id: SignerId,
    session: SessionConfig,
) -> Result<()> {
    if sessions.is_enabled(&signer_id) {
        warn!(%signer_id, "session already enabled");
        return Err(SessionStateError::SessionAlreadyEnabled(signer_id).into());
    }
    config.check_session_bounds(&session)?;

    let registration = session.into_registration(signer_id)?;
    let installs = registration.modules(account);
    run_hooks(modules, &installs, Hook::Install)?;
    if let Err(e) = SessionBuilder::new(sessions).add_session(registration) {
        revert_hooks(modules, &installs, Hook::Install);
        return Err(e.into());
    }

    info!(
        account = %address_hex(account),
        %signer_id,
        session_id = %SessionId::for_signer(account, &signer_id),
        "session enabled"
    );
    Ok(())
}

/// Takes an installed session back out of `sessions` and uninstalls its
/// modules. Used when the request that installed it fails later on.
pub fn rollback_session(
    modules: &dyn ModuleResolver,
    sessions: &mut AccountSessions,
    account: &Address,
    signer_id: &SignerId,
) {
    if let Some(registration) = sessions.remove(signer_id) {
        revert_hooks(modules, &registration.modules(account), Hook::Install);
        debug!(account = %address_hex(account), %signer_id, "session enable rolled back");
    }
}

/// Handles the enable part of an ENABLE or UNSAFE_ENABLE signature.
///
/// Verifies the owner's signature over the enable digest through the
/// account, installs the session into `sessions` and returns the enabled
/// signer id with the trailing USE payload for enforcement.
pub fn enable_in_band<'a>(
    modules: &dyn ModuleResolver,
    config: &ValidatorConfig,
    account: &dyn SmartAccount,
    sessions: &mut AccountSessions,
    mode: SessionMode,
    payload: &'a [u8],
) -> Result<(SignerId, &'a [u8])> {
    if mode == SessionMode::UnsafeEnable && !config.allow_unsafe_enable {
        warn!("unsafe enable refused by configuration");
        return Err(SmartSessionError::UnsafeEnableDisabled);
    }

    let (enable, use_payload) = decode_enable(payload)?;
    let (signer_id, _) = decode_use(use_payload)?;
    let address = account.address();
    debug!(account = %address_hex(&address), %signer_id, ?mode, "enabling session in-band");

    if sessions.is_enabled(&signer_id) {
        warn!(%signer_id, "session already enabled");
        return Err(SessionStateError::SessionAlreadyEnabled(signer_id).into());
    }
    config.check_session_bounds(&enable.session)?;

    let nonce = sessions.nonce(&signer_id);
    let digest = enable.digest(&address, &signer_id, nonce)?;
    if account.is_valid_signature(&digest, &enable.permission_enable_sig) != ERC1271_MAGIC_VALUE {
        warn!(account = %address_hex(&address), %signer_id, nonce, "owner did not authorize enable");
        return Err(SmartSessionError::InvalidEnableSignature {
            account: address,
            digest,
        });
    }

    install_session(modules, config, sessions, &address, signer_id, enable.session)?;
    Ok((signer_id, use_payload))
}

/// Enables several sessions at once; all are installed or none are.
pub fn enable_sessions(
    modules: &dyn ModuleResolver,
    config: &ValidatorConfig,
    sessions: &mut AccountSessions,
    account: &Address,
    requests: Vec<(SignerId, SessionConfig)>,
) -> Result<Vec<SessionId>> {
    let mut staged = sessions.clone();
    let mut installed = Vec::with_capacity(requests.len());
    for (signer_id, session) in requests {
        if let Err(e) = install_session(modules, config, &mut staged, account, signer_id, session) {
            for done in installed.iter().rev() {
                rollback_session(modules, &mut staged, account, done);
            }
            return Err(e);
        }
        installed.push(signer_id);
    }
    *sessions = staged;
    Ok(installed
        .iter()
        .map(|signer_id| SessionId::for_signer(account, signer_id))
        .collect())
}
