//! Validator configuration.

use serde::{Deserialize, Serialize};
use smart_sessions_state::PolicyKind;

use crate::error::{Result, SmartSessionError};
use crate::instruction::SessionConfig;

/// Tunables for one validator instance.
///
/// Every field has a default, so a partial (or empty) document deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Accept the UNSAFE_ENABLE mode tag
    pub allow_unsafe_enable: bool,
    /// Upper bound on each policy list of one session
    pub max_policies_per_set: usize,
    /// Upper bound on the number of actions of one session
    pub max_action_sets: usize,
    /// Upper bound on the calls of one batch execution
    pub max_batch_calls: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            allow_unsafe_enable: true,
            max_policies_per_set: 16,
            max_action_sets: 32,
            max_batch_calls: 64,
        }
    }
}

impl ValidatorConfig {
    pub fn validate(&self) -> Result<()> {
        let bounds = [
            ("max_policies_per_set", self.max_policies_per_set),
            ("max_action_sets", self.max_action_sets),
            ("max_batch_calls", self.max_batch_calls),
        ];
        for (name, value) in bounds {
            if value == 0 {
                return Err(SmartSessionError::InvalidConfig(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }

    /// Rejects a session whose lists exceed the configured bounds.
    pub fn check_session_bounds(&self, session: &SessionConfig) -> Result<()> {
        if session.actions.len() > self.max_action_sets {
            return Err(SmartSessionError::TooManyActions {
                found: session.actions.len(),
                max: self.max_action_sets,
            });
        }

        let action_lists = session
            .actions
            .iter()
            .map(|action| (PolicyKind::Action, action.action_policies.len()));
        let lists = [
            (PolicyKind::UserOp, session.user_op_policies.len()),
            (PolicyKind::Erc1271, session.erc1271_policies.len()),
        ]
        .into_iter()
        .chain(action_lists);

        for (kind, found) in lists {
            if found > self.max_policies_per_set {
                return Err(SmartSessionError::TooManyPolicies {
                    kind,
                    found,
                    max: self.max_policies_per_set,
                });
            }
        }
        Ok(())
    }
}
