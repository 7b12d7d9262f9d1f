//! Install-data layout handed to every module's `on_install` hook.
//!
//! ```text
//! [0..32)  session id
//! [32..52) account address
//! [52..)   module-specific init data
//! ```

use smart_sessions_assertions::{check_min_len, read_array20, read_array32};

use crate::{Address, SessionId, SessionStateError};

/// Minimum length of a well-formed install payload.
pub const INSTALL_DATA_MIN_LEN: usize = 32 + 20;

/// Borrowed view over a decoded install payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallData<'a> {
    pub session_id: SessionId,
    pub account: Address,
    pub payload: &'a [u8],
}

/// Splits an install payload without copying the trailing init data.
pub fn decode_install_data(data: &[u8]) -> Result<InstallData<'_>, SessionStateError> {
    let too_short = SessionStateError::DataTooShort(data.len());
    check_min_len(data, INSTALL_DATA_MIN_LEN, too_short.clone())?;
    let session_id = SessionId(read_array32(data, 0, too_short.clone())?);
    let account = read_array20(data, 32, too_short)?;
    Ok(InstallData {
        session_id,
        account,
        payload: &data[INSTALL_DATA_MIN_LEN..],
    })
}

pub fn encode_install_data(session_id: &SessionId, account: &Address, payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(INSTALL_DATA_MIN_LEN + payload.len());
    data.extend_from_slice(&session_id.0);
    data.extend_from_slice(account);
    data.extend_from_slice(payload);
    data
}
