//! USE-mode enforcement pipeline
//!
//! 1. decode the signer id and signature
//! 2. prove the signature with the session's signer module
//! 3. user-op policies (at least one)
//! 4. action policies for each requested call (none required)
//!
//! The first failure aborts; passing results are intersected.

use smart_sessions_interface::{ModuleResolver, PackedUserOperation, SignatureRequest};
use smart_sessions_state::{
    AccountSessions, ActionId, Address, ModuleKind, SessionId, SignerId, ValidationData,
};
use tracing::{debug, warn};

use crate::actions::policies::{
    check_action_policies, check_batch_action_policies, check_user_op_policies,
    MIN_ACTION_POLICIES, MIN_USER_OP_POLICIES,
};
use crate::config::ValidatorConfig;
use crate::error::{Result, SmartSessionError};
use crate::execution::{decode_action, Action, Execution};
use crate::instruction::decode_use;

/// Verifies `signature` over `hash` with the signer registered for `signer_id`.
pub fn prove_signer(
    modules: &dyn ModuleResolver,
    sessions: &AccountSessions,
    account: &Address,
    signer_id: &SignerId,
    hash: &[u8; 32],
    signature: &[u8],
) -> Result<SessionId> {
    let entry = sessions.signer(signer_id).ok_or_else(|| {
        warn!(%signer_id, "no signer registered");
        SmartSessionError::SignerNotFound(*signer_id)
    })?;
    let signer = modules
        .signer(&entry.signer)
        .ok_or(SmartSessionError::ModuleNotFound {
            kind: ModuleKind::Signer,
            module: entry.signer,
        })?;

    let session_id = SessionId::for_signer(account, signer_id);
    signer
        .prove_authorization(&SignatureRequest {
            session_id,
            account: *account,
            hash: *hash,
            signature,
        })
        .map_err(|reason| {
            warn!(%signer_id, %reason, "session signature rejected");
            SmartSessionError::InvalidSessionSignature {
                signer_id: *signer_id,
                reason,
            }
        })?;
    Ok(session_id)
}

/// Validates a user operation against an enabled session.
///
/// `use_payload` is the signature with the mode tag (and any enable body)
/// already stripped.
pub fn enforce_use(
    modules: &dyn ModuleResolver,
    config: &ValidatorConfig,
    sessions: &AccountSessions,
    account: &Address,
    op_hash: &[u8; 32],
    op: &PackedUserOperation,
    use_payload: &[u8],
) -> Result<ValidationData> {
    let (signer_id, signature) = decode_use(use_payload)?;
    let session_id = prove_signer(modules, sessions, account, &signer_id, op_hash, signature)?;
    debug!(%session_id, "session signature verified");

    let mut result = check_user_op_policies(
        modules,
        sessions,
        account,
        &signer_id,
        op,
        MIN_USER_OP_POLICIES,
    )?;

    let actions = match decode_action(&op.call_data, config.max_batch_calls)? {
        Action::Single(execution) => check_action_policies(
            modules,
            sessions,
            account,
            &signer_id,
            &op.sender,
            &execution,
            MIN_ACTION_POLICIES,
        )?,
        Action::Batch(executions) => check_batch_action_policies(
            modules,
            sessions,
            account,
            &signer_id,
            &op.sender,
            &executions,
            MIN_ACTION_POLICIES,
        )?,
        Action::ExecuteFromExecutor => {
            warn!(%session_id, "executeFromExecutor requested by session");
            return Err(SmartSessionError::UnsupportedExecutionPath);
        },
        Action::Other => {
            // Placeholder record: the account calls itself with no value.
            let call = Execution::new(op.sender, 0, op.call_data.clone());
            debug!(
                %session_id,
                action_id = %ActionId::for_call(&call.target, &call.call_data),
                "checking non-execute call"
            );
            check_action_policies(
                modules,
                sessions,
                account,
                &signer_id,
                &op.sender,
                &call,
                MIN_ACTION_POLICIES,
            )?
        },
    };
    result = result.intersect(actions);

    debug!(
        %session_id,
        valid_after = result.valid_after,
        valid_until = result.valid_until,
        "user operation validated"
    );
    Ok(result)
}
