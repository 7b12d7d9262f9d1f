//! ERC-1271 verification on behalf of a session.

use smart_sessions_interface::ModuleResolver;
use smart_sessions_state::{AccountSessions, Address, ValidationData};
use tracing::debug;

use crate::actions::enforce::prove_signer;
use crate::actions::policies::{check_erc1271_policies, MIN_ERC1271_POLICIES};
use crate::error::Result;
use crate::instruction::decode_use;

/// Checks a `[signer_id: 32][signature]` payload for `hash`, requested by
/// `sender`. The signer must prove the signature and every ERC-1271 policy
/// of the session (at least one) must accept the request.
pub fn validate_signature_with_sender(
    modules: &dyn ModuleResolver,
    sessions: &AccountSessions,
    account: &Address,
    sender: &Address,
    hash: &[u8; 32],
    payload: &[u8],
) -> Result<ValidationData> {
    let (signer_id, signature) = decode_use(payload)?;
    let session_id = prove_signer(modules, sessions, account, &signer_id, hash, signature)?;

    let result = check_erc1271_policies(
        modules,
        sessions,
        account,
        &signer_id,
        sender,
        hash,
        signature,
        MIN_ERC1271_POLICIES,
    )?;
    debug!(%session_id, "session signature accepted for erc1271");
    Ok(result)
}
