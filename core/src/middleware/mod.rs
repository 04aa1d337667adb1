// orka_flow/src/middleware/mod.rs

//! The continuation model and its bridge to the error-as-value model.

pub mod bridge;
pub mod next;
pub mod stack;

pub use next::Next;
pub use stack::{AutoFn, Layer, LayerKind, ManualFn, Middleware, Stack};
