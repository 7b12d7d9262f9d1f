//! Smart Sessions Validator
//!
//! Session-scoped permission validator for smart accounts. A session binds a
//! signer module to sets of policies; user operations signed with a session
//! key are accepted only if the signer proves the signature and every policy
//! in scope agrees.

pub mod actions;
pub mod config;
pub mod error;
pub mod execution;
pub mod instruction;
pub mod processor;

pub use config::ValidatorConfig;
pub use error::{Result, SmartSessionError};
pub use execution::{Action, CallType, ExecType, Execution, ExecutionMode};
pub use instruction::{EnableSessions, SessionConfig, SessionMode};
pub use processor::SmartSession;
