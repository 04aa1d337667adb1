pub mod context_data;
pub mod control;
pub mod handler;
pub mod meta;
pub mod processor;

// Re-export key types for easier access from other modules (and lib.rs)
pub use context_data::{ContextData, DoneSignal};
pub use control::{Control, PipelineResult};
pub use handler::{BoxFuture, Entry, Handler, HandlerKind};
pub use meta::{Meta, MetaHierarchy};
pub use processor::Processor;
