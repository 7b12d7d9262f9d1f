pub mod execution;
pub mod policy;
pub mod session;
