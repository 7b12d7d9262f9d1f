//! Decoding of the account calls a user operation requests.
//!
//! Only the account's `execute(bytes32 mode, bytes executionCalldata)` entry
//! point is interpreted. Its mode word carries the call type in byte 0 and the
//! execution type in byte 1; the execution body follows the mode word.

use borsh::{BorshDeserialize, BorshSerialize};
use smart_sessions_assertions::{
    check_max_count, check_zero_bytes, read_array20, read_array32, read_selector,
};
use smart_sessions_state::{Address, SessionStateError};

use crate::error::{Result, SmartSessionError};

/// `execute(bytes32,bytes)`
pub const EXECUTE_SELECTOR: [u8; 4] = [0xe9, 0xae, 0x5c, 0x53];
/// `executeFromExecutor(bytes32,bytes)`
pub const EXECUTE_FROM_EXECUTOR_SELECTOR: [u8; 4] = [0xd6, 0x91, 0xc9, 0x64];

/// Offset of the call data inside a single-call body
const SINGLE_HEADER_LEN: usize = 20 + 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CallType {
    Single = 0x00,
    Batch = 0x01,
    Static = 0xfe,
    DelegateCall = 0xff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExecType {
    Default = 0x00,
    Try = 0x01,
}

/// 32-byte execution mode word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionMode(pub [u8; 32]);

impl ExecutionMode {
    pub fn new(call_type: CallType, exec_type: ExecType) -> Self {
        let mut word = [0u8; 32];
        word[0] = call_type as u8;
        word[1] = exec_type as u8;
        Self(word)
    }

    pub fn single() -> Self {
        Self::new(CallType::Single, ExecType::Default)
    }

    pub fn batch() -> Self {
        Self::new(CallType::Batch, ExecType::Default)
    }

    pub fn call_type(&self) -> u8 {
        self.0[0]
    }

    pub fn exec_type(&self) -> u8 {
        self.0[1]
    }
}

/// One call the account is asked to make.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub target: Address,
    pub value: u128,
    pub call_data: Vec<u8>,
}

impl Execution {
    pub fn new(target: Address, value: u128, call_data: impl Into<Vec<u8>>) -> Self {
        Self {
            target,
            value,
            call_data: call_data.into(),
        }
    }
}

/// Shape of a user operation's call data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Single(Execution),
    Batch(Vec<Execution>),
    /// Module-initiated execution; never valid for a session
    ExecuteFromExecutor,
    /// Any other account function, checked as one call to the account itself
    Other,
}

impl Action {
    /// The calls this action dispatches, if it is an execution.
    pub fn executions(&self) -> Option<&[Execution]> {
        match self {
            Action::Single(execution) => Some(std::slice::from_ref(execution)),
            Action::Batch(executions) => Some(executions),
            Action::ExecuteFromExecutor | Action::Other => None,
        }
    }
}

/// Classifies `call_data` and decodes the calls of an `execute` request.
///
/// Any execution type other than default is rejected before the body is
/// looked at, as are static and delegate call types.
pub fn decode_action(call_data: &[u8], max_batch_calls: usize) -> Result<Action> {
    let Ok(selector) = read_selector(call_data, ()) else {
        return Ok(Action::Other);
    };

    match selector {
        EXECUTE_SELECTOR => decode_execute(&call_data[4..], max_batch_calls),
        EXECUTE_FROM_EXECUTOR_SELECTOR => Ok(Action::ExecuteFromExecutor),
        _ => Ok(Action::Other),
    }
}

fn decode_execute(args: &[u8], max_batch_calls: usize) -> Result<Action> {
    let mode = ExecutionMode(read_array32(
        args,
        0,
        SessionStateError::DataTooShort(args.len()),
    )?);
    let body = &args[32..];

    if mode.exec_type() != ExecType::Default as u8 {
        return Err(SmartSessionError::UnsupportedExecutionType(mode.exec_type()));
    }

    match mode.call_type() {
        t if t == CallType::Single as u8 => Ok(Action::Single(decode_single(body)?)),
        t if t == CallType::Batch as u8 => Ok(Action::Batch(decode_batch(body, max_batch_calls)?)),
        other => Err(SmartSessionError::UnsupportedCallType(other)),
    }
}

/// `[target: 20][value: 32 big-endian][call data]`
pub fn decode_single(body: &[u8]) -> Result<Execution> {
    let too_short = SessionStateError::DataTooShort(body.len());
    let target = read_array20(body, 0, too_short.clone())?;
    let value_word = read_array32(body, 20, too_short)?;

    check_zero_bytes(&value_word[..16], SmartSessionError::ValueOverflow)?;
    let mut low = [0u8; 16];
    low.copy_from_slice(&value_word[16..]);

    Ok(Execution {
        target,
        value: u128::from_be_bytes(low),
        call_data: body[SINGLE_HEADER_LEN..].to_vec(),
    })
}

/// Borsh-encoded `Vec<Execution>`; trailing bytes are rejected.
pub fn decode_batch(body: &[u8], max_batch_calls: usize) -> Result<Vec<Execution>> {
    let executions = Vec::<Execution>::try_from_slice(body)
        .map_err(|e| SmartSessionError::MalformedBatch(e.to_string()))?;
    check_max_count(
        executions.len(),
        max_batch_calls,
        SmartSessionError::BatchTooLarge {
            found: executions.len(),
            max: max_batch_calls,
        },
    )?;
    Ok(executions)
}

pub fn encode_single(execution: &Execution) -> Vec<u8> {
    let mut body = Vec::with_capacity(SINGLE_HEADER_LEN + execution.call_data.len());
    body.extend_from_slice(&execution.target);
    body.extend_from_slice(&[0u8; 16]);
    body.extend_from_slice(&execution.value.to_be_bytes());
    body.extend_from_slice(&execution.call_data);
    body
}

pub fn encode_batch(executions: &[Execution]) -> Result<Vec<u8>> {
    borsh::to_vec(executions).map_err(|e| SmartSessionError::MalformedBatch(e.to_string()))
}

/// `execute(mode, body)` call data.
pub fn encode_execute(mode: &ExecutionMode, body: &[u8]) -> Vec<u8> {
    let mut call_data = Vec::with_capacity(4 + 32 + body.len());
    call_data.extend_from_slice(&EXECUTE_SELECTOR);
    call_data.extend_from_slice(&mode.0);
    call_data.extend_from_slice(body);
    call_data
}
