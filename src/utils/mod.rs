pub mod command;
pub mod glob;
pub mod locker;

// Trait-based abstraction for testability
pub mod executor;

// Re-export commonly used types and traits (used by test crate)
pub use command::{Invocation, TransferError};
pub use executor::{CommandExecutor, RealExecutor};
