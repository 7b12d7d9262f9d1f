use assert_matches::assert_matches;
use smart_sessions_interface::ModuleError;
use smart_sessions_program::execution::{encode_execute, EXECUTE_FROM_EXECUTOR_SELECTOR};
use smart_sessions_program::{CallType, ExecType, ExecutionMode, SessionMode, SmartSessionError};
use smart_sessions_sdk::types::PackedUserOperation;
use smart_sessions_sdk::{action_id, use_signature, ExecutionBuilder, PolicyConfigBuilder};
use smart_sessions_state::{ActionId, PolicyKind, SessionId, SessionStateError, SignerId, ValidationData};

mod common;
use common::*;

const SIGNER: SignerId = SignerId([0x11; 32]);

fn enabled_context() -> anyhow::Result<TestContext> {
    let mut ctx = TestContext::new();
    ctx.enable_direct(SIGNER, ctx.session().build()?)?;
    Ok(ctx)
}

fn signed(ctx: &TestContext, call_data: Vec<u8>) -> PackedUserOperation {
    let mut op = ctx.user_op(call_data, 0);
    TestContext::sign_use(&mut op, &SIGNER, SESSION_KEY);
    op
}

#[test_log::test]
fn test_single_transfer_passes() -> anyhow::Result<()> {
    let mut ctx = enabled_context()?;
    let op = signed(&ctx, ExecutionBuilder::new().call(TOKEN, 0, transfer_call(9)).build()?);
    assert_eq!(ctx.validate(&op)?, ValidationData::SUCCESS);

    let seen = ctx.host.policy(&ACTION_POLICY).actions_seen.borrow().clone();
    assert_eq!(seen, vec![(ACCOUNT, TOKEN, 0, action_id(&TOKEN, TRANSFER_SELECTOR))]);
    assert_eq!(ctx.host.policy(&USER_OP_POLICY).checks.get(), 1);
    Ok(())
}

#[test_log::test]
fn test_unknown_signer_fails_before_policies() -> anyhow::Result<()> {
    let mut ctx = enabled_context()?;
    let mut op = ctx.user_op(ExecutionBuilder::new().call(TOKEN, 0, transfer_call(1)).build()?, 0);
    TestContext::sign_use(&mut op, &SignerId([0x99; 32]), SESSION_KEY);

    assert_eq!(
        ctx.validate(&op),
        Err(SmartSessionError::SignerNotFound(SignerId([0x99; 32])))
    );
    assert_eq!(ctx.host.signer.proofs.get(), 0);
    assert_eq!(ctx.host.total_checks(), 0);
    Ok(())
}

#[test_log::test]
fn test_short_use_payload_fails_before_lookup() -> anyhow::Result<()> {
    let mut ctx = enabled_context()?;
    let mut op = ctx.user_op(vec![], 0);
    op.signature = vec![SessionMode::Use as u8];
    op.signature.extend_from_slice(&[0x11; 20]);

    assert_eq!(
        ctx.validate(&op),
        Err(SmartSessionError::State(SessionStateError::DataTooShort(20)))
    );
    assert_eq!(ctx.host.signer.proofs.get(), 0);

    op.signature.clear();
    assert_eq!(
        ctx.validate(&op),
        Err(SmartSessionError::State(SessionStateError::DataTooShort(0)))
    );
    Ok(())
}

#[test_log::test]
fn test_wrong_session_key_rejected() -> anyhow::Result<()> {
    let mut ctx = enabled_context()?;
    let mut op = ctx.user_op(ExecutionBuilder::new().call(TOKEN, 0, transfer_call(1)).build()?, 0);
    TestContext::sign_use(&mut op, &SIGNER, b"not-the-key");

    assert_eq!(
        ctx.validate(&op),
        Err(SmartSessionError::InvalidSessionSignature {
            signer_id: SIGNER,
            reason: ModuleError::VerificationFailed
        })
    );
    assert_eq!(ctx.host.total_checks(), 0);
    Ok(())
}

#[test_log::test]
fn test_session_without_user_op_policies_fails() -> anyhow::Result<()> {
    let mut ctx = TestContext::new();
    let session = ctx
        .session()
        .with_user_op_policies(PolicyConfigBuilder::new())
        .build()?;
    ctx.enable_direct(SIGNER, session)?;

    let op = signed(&ctx, ExecutionBuilder::new().call(TOKEN, 0, transfer_call(1)).build()?);
    assert_eq!(
        ctx.validate(&op),
        Err(SmartSessionError::InsufficientPolicies {
            kind: PolicyKind::UserOp,
            session: SessionId::for_signer(&ACCOUNT, &SIGNER),
            required: 1,
            found: 0,
        })
    );
    Ok(())
}

#[test_log::test]
fn test_action_without_policies_passes() -> anyhow::Result<()> {
    let mut ctx = enabled_context()?;
    // No action is configured for this target at all.
    let op = signed(&ctx, ExecutionBuilder::new().call([0x33; 20], 7, vec![0xde, 0xad]).build()?);
    assert_eq!(ctx.validate(&op)?, ValidationData::SUCCESS);
    assert!(ctx.host.policy(&ACTION_POLICY).actions_seen.borrow().is_empty());
    Ok(())
}

#[test_log::test]
fn test_denying_action_policy_rejects() -> anyhow::Result<()> {
    let mut ctx = TestContext::new();
    let session = ctx
        .session()
        .with_action(
            action_id(&[0x33; 20], [0xde, 0xad, 0xbe, 0xef]),
            PolicyConfigBuilder::new()
                .add_policy(ACTION_POLICY, allow())
                .add_policy(SECOND_ACTION_POLICY, deny()),
        )
        .build()?;
    ctx.enable_direct(SIGNER, session)?;

    let op = signed(
        &ctx,
        ExecutionBuilder::new()
            .call(TOKEN, 0, transfer_call(1))
            .call([0x33; 20], 0, vec![0xde, 0xad, 0xbe, 0xef])
            .build()?,
    );
    assert_matches!(
        ctx.validate(&op),
        Err(SmartSessionError::PolicyViolation { kind: PolicyKind::Action, policy: SECOND_ACTION_POLICY, .. })
    );
    // Both calls reached the first policy before the second one refused.
    assert_eq!(ctx.host.policy(&ACTION_POLICY).actions_seen.borrow().len(), 2);
    Ok(())
}

#[test_log::test]
fn test_policy_windows_intersect() -> anyhow::Result<()> {
    let mut ctx = TestContext::new();
    let session = ctx
        .session()
        .with_user_op_policies(PolicyConfigBuilder::new().add_policy(USER_OP_POLICY, window(100, 500)))
        .with_action(
            action_id(&[0x33; 20], [0xde, 0xad, 0xbe, 0xef]),
            PolicyConfigBuilder::new().add_policy(ACTION_POLICY, window(200, 0)),
        )
        .build()?;
    ctx.enable_direct(SIGNER, session)?;

    let op = signed(
        &ctx,
        ExecutionBuilder::new()
            .call([0x33; 20], 0, vec![0xde, 0xad, 0xbe, 0xef])
            .build()?,
    );
    let result = ctx.validate(&op)?;
    assert_eq!(result, ValidationData::window(200, 500));
    assert!(!result.is_valid_at(150));
    assert!(result.is_valid_at(300));
    Ok(())
}

#[test_log::test]
fn test_try_batch_always_rejected() -> anyhow::Result<()> {
    let mut ctx = enabled_context()?;
    for body in [vec![], vec![0xff; 7], vec![1, 0, 0, 0]] {
        let mode = ExecutionMode::new(CallType::Batch, ExecType::Try);
        let op = signed(&ctx, encode_execute(&mode, &body));
        assert_eq!(ctx.validate(&op), Err(SmartSessionError::UnsupportedExecutionType(0x01)));
    }

    let op = signed(
        &ctx,
        ExecutionBuilder::new()
            .call(TOKEN, 0, transfer_call(1))
            .with_exec_type(ExecType::Try)
            .build()?,
    );
    assert_eq!(ctx.validate(&op), Err(SmartSessionError::UnsupportedExecutionType(0x01)));
    Ok(())
}

#[test_log::test]
fn test_delegate_call_rejected() -> anyhow::Result<()> {
    let mut ctx = enabled_context()?;
    let mode = ExecutionMode::new(CallType::DelegateCall, ExecType::Default);
    let op = signed(&ctx, encode_execute(&mode, &[]));
    assert_eq!(ctx.validate(&op), Err(SmartSessionError::UnsupportedCallType(0xff)));
    Ok(())
}

#[test_log::test]
fn test_execute_from_executor_rejected() -> anyhow::Result<()> {
    let mut ctx = enabled_context()?;
    let mut call_data = EXECUTE_FROM_EXECUTOR_SELECTOR.to_vec();
    call_data.extend_from_slice(&[0u8; 64]);
    let op = signed(&ctx, call_data);
    assert_eq!(ctx.validate(&op), Err(SmartSessionError::UnsupportedExecutionPath));
    Ok(())
}

#[test_log::test]
fn test_other_call_checked_against_account() -> anyhow::Result<()> {
    let mut ctx = TestContext::new();
    let install_module = [0x9a, 0x7f, 0x2c, 0x11];
    let session = ctx
        .session()
        .with_action(
            action_id(&ACCOUNT, install_module),
            PolicyConfigBuilder::new().add_policy(SECOND_ACTION_POLICY, allow()),
        )
        .build()?;
    ctx.enable_direct(SIGNER, session)?;

    let mut call_data = install_module.to_vec();
    call_data.extend_from_slice(&[5u8; 32]);
    let op = signed(&ctx, call_data.clone());
    assert_eq!(ctx.validate(&op)?, ValidationData::SUCCESS);

    let seen = ctx.host.policy(&SECOND_ACTION_POLICY).actions_seen.borrow().clone();
    assert_eq!(
        seen,
        vec![(ACCOUNT, ACCOUNT, 0, ActionId::for_call(&ACCOUNT, &call_data))]
    );
    Ok(())
}

#[test_log::test]
fn test_batch_over_limit_rejected() -> anyhow::Result<()> {
    let mut ctx = TestContext::with_config(smart_sessions_program::ValidatorConfig {
        max_batch_calls: 2,
        ..Default::default()
    });
    ctx.enable_direct(SIGNER, ctx.session().build()?)?;

    let call_data = (0..3)
        .fold(ExecutionBuilder::new(), |builder, i| builder.call(TOKEN, 0, transfer_call(i)))
        .build()?;
    let op = signed(&ctx, call_data);
    assert_eq!(
        ctx.validate(&op),
        Err(SmartSessionError::BatchTooLarge { found: 3, max: 2 })
    );
    Ok(())
}

#[test_log::test]
fn test_policy_missing_capability() -> anyhow::Result<()> {
    let mut ctx = TestContext::new();
    let session = ctx
        .session()
        .with_action(
            action_id(&[0x33; 20], [0xde, 0xad, 0xbe, 0xef]),
            PolicyConfigBuilder::new().add_policy(USER_OP_ONLY, allow()),
        )
        .build()?;
    assert_matches!(
        ctx.enable_direct(SIGNER, session),
        Err(e) if matches!(
            e.downcast_ref::<SmartSessionError>(),
            Some(SmartSessionError::ModuleNotFound { module: USER_OP_ONLY, .. })
        )
    );
    Ok(())
}

#[test_log::test]
fn test_use_signature_matches_layout() {
    let signature = use_signature(&SIGNER, b"sig");
    assert_eq!(signature[0], SessionMode::Use as u8);
    assert_eq!(&signature[1..33], SIGNER.as_bytes());
    assert_eq!(hex::encode(&signature[33..]), "736967");
}
