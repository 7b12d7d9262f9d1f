//! Client-side helpers for smart sessions: fluent builders for session
//! configs, owner-signed enable requests, session signatures and account
//! execution call data.

pub mod basic;
pub mod error;

pub use crate::basic::execution::ExecutionBuilder;
pub use crate::basic::policy::{action_id, PolicyConfigBuilder};
pub use crate::basic::session::{
    enable_signature, use_signature, EnableSessionsBuilder, SessionConfigBuilder,
};
pub use crate::error::{Result, SessionSdkError};

pub mod types {
    pub use smart_sessions_interface::PackedUserOperation;
    pub use smart_sessions_program::{
        EnableSessions, Execution, ExecutionMode, SessionConfig, SessionMode,
    };
    pub use smart_sessions_state::{
        ActionData, ActionId, Address, PolicyData, SessionId, SignerId, ValidationData,
    };
}
