pub mod enable;
pub mod enforce;
pub mod execute;
pub mod hooks;
pub mod manage;
pub mod policies;
pub mod signature;

pub use enable::*;
pub use enforce::*;
pub use execute::*;
pub use manage::*;
pub use policies::*;
pub use signature::*;
