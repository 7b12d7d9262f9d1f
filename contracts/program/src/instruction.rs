//! Smart Sessions signature encoding
//!
//! The signature field of a user operation starts with a one-byte mode tag:
//!
//! - `USE`: `[signer_id: 32][signer signature]`
//! - `ENABLE` / `UNSAFE_ENABLE`: `[borsh(EnableSessions)][USE payload]`
//!
//! The ENABLE body is borsh-encoded, and the bytes left after decoding it
//! form the USE payload of the same operation.

use borsh::{BorshDeserialize, BorshSerialize};
use smart_sessions_assertions::read_array32;
use smart_sessions_state::{
    keccak256, ActionData, Address, PolicyData, SessionRegistration, SessionStateError,
    SignerEntry, SignerId,
};

use crate::error::{Result, SmartSessionError};

/// Prefix mixed into every enable digest.
pub const ENABLE_DOMAIN_TAG: &[u8] = b"smart-sessions:enable:v1";

/// Signature mode discriminators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionMode {
    Use = 0x00,
    Enable = 0x01,
    UnsafeEnable = 0x02,
}

impl SessionMode {
    pub fn is_enable(&self) -> bool {
        matches!(self, SessionMode::Enable | SessionMode::UnsafeEnable)
    }
}

impl TryFrom<u8> for SessionMode {
    type Error = SmartSessionError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(SessionMode::Use),
            0x01 => Ok(SessionMode::Enable),
            0x02 => Ok(SessionMode::UnsafeEnable),
            _ => Err(SmartSessionError::UnknownMode(value)),
        }
    }
}

/// Everything needed to register one session, minus its signer id.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Signer module verifying session signatures
    pub session_validator: Address,
    /// Passed to the signer's install hook
    pub session_validator_init_data: Vec<u8>,
    pub user_op_policies: Vec<PolicyData>,
    pub erc1271_policies: Vec<PolicyData>,
    pub actions: Vec<ActionData>,
}

impl SessionConfig {
    /// Validates the lists and produces a registration under `signer_id`.
    pub fn into_registration(self, signer_id: SignerId) -> Result<SessionRegistration> {
        let registration = SessionRegistration::new(
            signer_id,
            SignerEntry {
                signer: self.session_validator,
                init_data: self.session_validator_init_data,
            },
            self.user_op_policies,
            self.erc1271_policies,
            self.actions,
        )?;
        Ok(registration)
    }
}

/// In-band enable request, authorized by the account owner.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct EnableSessions {
    pub session: SessionConfig,
    /// Owner signature over [`EnableSessions::digest`], checked through the
    /// account's ERC-1271 entry point
    pub permission_enable_sig: Vec<u8>,
}

impl EnableSessions {
    /// Hash the owner signs to enable `session` for `signer_id` on `account`.
    ///
    /// Covers every field except the signature itself, so changing any
    /// policy, init data, signer or action invalidates the signature.
    /// `nonce` is the signer id's current enable nonce on the account.
    pub fn digest(&self, account: &Address, signer_id: &SignerId, nonce: u64) -> Result<[u8; 32]> {
        digest_session(&self.session, account, signer_id, nonce)
    }
}

pub fn digest_session(
    session: &SessionConfig,
    account: &Address,
    signer_id: &SignerId,
    nonce: u64,
) -> Result<[u8; 32]> {
    let body = borsh::to_vec(session)
        .map_err(|e| SmartSessionError::MalformedEnableData(e.to_string()))?;

    let mut preimage = Vec::with_capacity(
        ENABLE_DOMAIN_TAG.len() + account.len() + SignerId::LEN + 8 + body.len(),
    );
    preimage.extend_from_slice(ENABLE_DOMAIN_TAG);
    preimage.extend_from_slice(account);
    preimage.extend_from_slice(signer_id.as_bytes());
    preimage.extend_from_slice(&nonce.to_be_bytes());
    preimage.extend_from_slice(&body);
    Ok(keccak256(&preimage))
}

/// Splits the mode tag from the rest of the signature.
pub fn decode_mode(signature: &[u8]) -> Result<(SessionMode, &[u8])> {
    let (&tag, payload) = signature
        .split_first()
        .ok_or(SessionStateError::DataTooShort(0))?;
    Ok((SessionMode::try_from(tag)?, payload))
}

/// Splits a USE payload into the signer id and the raw signer signature.
pub fn decode_use(payload: &[u8]) -> Result<(SignerId, &[u8])> {
    let id = read_array32(payload, 0, SessionStateError::DataTooShort(payload.len()))?;
    Ok((SignerId(id), &payload[SignerId::LEN..]))
}

/// Decodes an ENABLE payload into the enable request and the trailing USE payload.
pub fn decode_enable(payload: &[u8]) -> Result<(EnableSessions, &[u8])> {
    let mut cursor = payload;
    let enable = EnableSessions::deserialize(&mut cursor)
        .map_err(|e| SmartSessionError::MalformedEnableData(e.to_string()))?;
    Ok((enable, cursor))
}

pub fn encode_use(signer_id: &SignerId, signature: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(SignerId::LEN + signature.len());
    payload.extend_from_slice(signer_id.as_bytes());
    payload.extend_from_slice(signature);
    payload
}

/// Full user-op signature for the USE mode.
pub fn encode_use_signature(signer_id: &SignerId, signature: &[u8]) -> Vec<u8> {
    let mut out = vec![SessionMode::Use as u8];
    out.extend_from_slice(&encode_use(signer_id, signature));
    out
}

/// Full user-op signature for an enable mode.
pub fn encode_enable_signature(
    mode: SessionMode,
    enable: &EnableSessions,
    signer_id: &SignerId,
    signature: &[u8],
) -> Result<Vec<u8>> {
    let mut out = vec![mode as u8];
    enable
        .serialize(&mut out)
        .map_err(|e| SmartSessionError::MalformedEnableData(e.to_string()))?;
    out.extend_from_slice(&encode_use(signer_id, signature));
    Ok(out)
}
