use smart_sessions_program::execution::{encode_batch, encode_execute, encode_single};
use smart_sessions_program::{CallType, ExecType, Execution, ExecutionMode};
use smart_sessions_state::Address;

use crate::error::{Result, SessionSdkError};

/// Builds `execute(mode, body)` call data for the account.
///
/// One call encodes as a single execution, more as a batch, unless
/// [`force_batch`](Self::force_batch) is set.
#[derive(Debug, Clone)]
pub struct ExecutionBuilder {
    calls: Vec<Execution>,
    exec_type: ExecType,
    force_batch: bool,
}

impl Default for ExecutionBuilder {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            exec_type: ExecType::Default,
            force_batch: false,
        }
    }
}

impl ExecutionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call(mut self, target: Address, value: u128, call_data: impl Into<Vec<u8>>) -> Self {
        self.calls.push(Execution::new(target, value, call_data));
        self
    }

    pub fn with_exec_type(mut self, exec_type: ExecType) -> Self {
        self.exec_type = exec_type;
        self
    }

    pub fn force_batch(mut self) -> Self {
        self.force_batch = true;
        self
    }

    pub fn build(self) -> Result<Vec<u8>> {
        match self.calls.as_slice() {
            [] => Err(SessionSdkError::EmptyExecution),
            [single] if !self.force_batch => {
                let mode = ExecutionMode::new(CallType::Single, self.exec_type);
                Ok(encode_execute(&mode, &encode_single(single)))
            },
            calls => {
                let mode = ExecutionMode::new(CallType::Batch, self.exec_type);
                Ok(encode_execute(&mode, &encode_batch(calls)?))
            },
        }
    }
}
