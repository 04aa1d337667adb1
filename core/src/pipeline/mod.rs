// orka_flow/src/pipeline/mod.rs

//! Defines the error-as-value chain model: the `Pipeline<TData, Err>` container,
//! the `Group` chain-group, handler registration and the execution engine.

pub mod definition;
pub mod execution;
pub mod group;
pub mod hooks;

pub use definition::Pipeline;
pub use execution::{execute, Rest};
pub use group::Group;
