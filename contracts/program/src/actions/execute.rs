//! Dispatch of validated executions through the account.

use smart_sessions_interface::AccountExecutor;
use smart_sessions_state::address_hex;
use tracing::{debug, warn};

use crate::error::{Result, SmartSessionError};
use crate::execution::Action;

/// Makes every call of `action` in order and collects the return data.
///
/// The first failing call stops the batch; its revert data is returned
/// unchanged inside [`SmartSessionError::Call`].
pub fn execute_action(executor: &mut dyn AccountExecutor, action: &Action) -> Result<Vec<Vec<u8>>> {
    let executions = match action {
        Action::ExecuteFromExecutor => return Err(SmartSessionError::UnsupportedExecutionPath),
        other => other.executions().ok_or(SmartSessionError::NotAnExecution)?,
    };

    let mut results = Vec::with_capacity(executions.len());
    for (index, execution) in executions.iter().enumerate() {
        let output = executor
            .execute(&execution.target, execution.value, &execution.call_data)
            .map_err(|failure| {
                warn!(index, target = %address_hex(&failure.target), "call reverted");
                failure
            })?;
        debug!(index, target = %address_hex(&execution.target), "call succeeded");
        results.push(output);
    }
    Ok(results)
}
