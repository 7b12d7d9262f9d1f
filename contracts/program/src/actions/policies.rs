//! Policy enforcement with per-kind minimums.

use smart_sessions_interface::{
    ActionCheck, Erc1271Check, ModuleError, ModuleResolver, PackedUserOperation,
};
use smart_sessions_state::{
    address_hex, AccountSessions, ActionId, Address, ModuleKind, PolicyData, PolicyKind,
    PolicyList, SessionId, SignerId, ValidationData,
};
use tracing::{debug, warn};

use crate::error::{Result, SmartSessionError};
use crate::execution::Execution;

/// A session must carry at least this many user-op policies.
pub const MIN_USER_OP_POLICIES: usize = 1;
/// A session must carry at least this many ERC-1271 policies.
pub const MIN_ERC1271_POLICIES: usize = 1;
/// Actions without policies are allowed.
pub const MIN_ACTION_POLICIES: usize = 0;

/// Runs `check` against every policy of `list`, requiring `minimum` entries.
///
/// A policy that errors or reports failure rejects the whole request.
fn enforce_list<F>(
    kind: PolicyKind,
    session: SessionId,
    list: Option<&PolicyList>,
    minimum: usize,
    mut check: F,
) -> Result<ValidationData>
where
    F: FnMut(&PolicyData) -> Result<std::result::Result<ValidationData, ModuleError>>,
{
    let found = list.map_or(0, PolicyList::len);
    if found < minimum {
        warn!(%session, %kind, found, minimum, "not enough policies configured");
        return Err(SmartSessionError::InsufficientPolicies {
            kind,
            session,
            required: minimum,
            found,
        });
    }

    let mut result = ValidationData::SUCCESS;
    for policy in list.into_iter().flat_map(PolicyList::iter) {
        let verdict = match check(policy)? {
            Ok(verdict) if !verdict.is_failure() => verdict,
            Ok(_) => {
                warn!(%session, %kind, policy = %address_hex(&policy.policy), "policy reported failure");
                return Err(violation(kind, policy, session));
            },
            Err(reason) => {
                warn!(%session, %kind, policy = %address_hex(&policy.policy), %reason, "policy rejected");
                return Err(violation(kind, policy, session));
            },
        };
        result = result.intersect(verdict);
    }

    debug!(%session, %kind, checked = found, "policies passed");
    Ok(result)
}

fn violation(kind: PolicyKind, policy: &PolicyData, session: SessionId) -> SmartSessionError {
    SmartSessionError::PolicyViolation {
        kind,
        policy: policy.policy,
        session,
    }
}

fn module_not_found(kind: PolicyKind, policy: &PolicyData) -> SmartSessionError {
    SmartSessionError::ModuleNotFound {
        kind: ModuleKind::Policy(kind),
        module: policy.policy,
    }
}

pub fn check_user_op_policies(
    modules: &dyn ModuleResolver,
    sessions: &AccountSessions,
    account: &Address,
    signer_id: &SignerId,
    op: &PackedUserOperation,
    minimum: usize,
) -> Result<ValidationData> {
    let session = SessionId::for_signer(account, signer_id);
    enforce_list(
        PolicyKind::UserOp,
        session,
        sessions.user_op_policies(signer_id),
        minimum,
        |policy| {
            let module = modules
                .user_op_policy(&policy.policy)
                .ok_or_else(|| module_not_found(PolicyKind::UserOp, policy))?;
            Ok(module.check_user_op(&session, op))
        },
    )
}

pub fn check_erc1271_policies(
    modules: &dyn ModuleResolver,
    sessions: &AccountSessions,
    account: &Address,
    signer_id: &SignerId,
    sender: &Address,
    hash: &[u8; 32],
    signature: &[u8],
    minimum: usize,
) -> Result<ValidationData> {
    let session = SessionId::for_signer(account, signer_id);
    let check = Erc1271Check {
        session_id: session,
        account: *account,
        sender: *sender,
        hash: *hash,
        signature,
    };
    enforce_list(
        PolicyKind::Erc1271,
        session,
        sessions.erc1271_policies(signer_id),
        minimum,
        |policy| {
            let module = modules
                .erc1271_policy(&policy.policy)
                .ok_or_else(|| module_not_found(PolicyKind::Erc1271, policy))?;
            Ok(module.check_signature(&check))
        },
    )
}

/// Checks one requested call against the policies of its action.
pub fn check_action_policies(
    modules: &dyn ModuleResolver,
    sessions: &AccountSessions,
    account: &Address,
    signer_id: &SignerId,
    caller: &Address,
    execution: &Execution,
    minimum: usize,
) -> Result<ValidationData> {
    let action_id = ActionId::for_call(&execution.target, &execution.call_data);
    let session = SessionId::for_action(account, signer_id, &action_id);
    let check = ActionCheck {
        session_id: session,
        action_id,
        account: *account,
        caller: *caller,
        target: execution.target,
        value: execution.value,
        call_data: &execution.call_data,
    };
    enforce_list(
        PolicyKind::Action,
        session,
        sessions.action_policies(signer_id, &action_id),
        minimum,
        |policy| {
            let module = modules
                .action_policy(&policy.policy)
                .ok_or_else(|| module_not_found(PolicyKind::Action, policy))?;
            Ok(module.check_action(&check))
        },
    )
}

/// Checks every call of a batch, in order, and intersects the results.
pub fn check_batch_action_policies(
    modules: &dyn ModuleResolver,
    sessions: &AccountSessions,
    account: &Address,
    signer_id: &SignerId,
    caller: &Address,
    executions: &[Execution],
    minimum: usize,
) -> Result<ValidationData> {
    executions
        .iter()
        .try_fold(ValidationData::SUCCESS, |result, execution| {
            let verdict = check_action_policies(
                modules, sessions, account, signer_id, caller, execution, minimum,
            )?;
            Ok(result.intersect(verdict))
        })
}
