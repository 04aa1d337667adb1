// src/lib.rs

//! Orka Flow: composable ASYNC handler chains for Rust.
//!
//! Orka Flow runs ordered lists of asynchronous handlers against a shared,
//! mutable context, with features like:
//!  - Error-as-value chains: a failing handler leaves a *pending error* that
//!    only error handlers see, until one of them clears it.
//!  - Explicit flow control through `Control::{Continue, Abort, Clear}`.
//!  - Chain-groups (`Group`) whose abort only ends the group itself.
//!  - Arbitrary nesting: pipelines, groups and stacks are processors too.
//!  - A continuation model (`Stack`, `Middleware`, `Next`) for middleware that
//!    needs to run code around everything after it.
//!  - Combinators (`If`, `After`, `AfterIf`, `Catch`) for conditional,
//!    post-processing and failure-boundary behaviour.
//!  - A shared done marker on the context that stops every enclosing container.
//!  - Metadata trees (`MetaHierarchy`) for introspecting a composed flow.

pub mod combinators;
pub mod core;
pub mod error;
pub mod middleware;
pub mod pipeline;

// --- Re-exports for the Public API ---

pub use crate::core::context_data::{ContextData, DoneSignal};
pub use crate::core::control::{Control, PipelineResult};
pub use crate::core::handler::{BoxFuture, Entry, Handler, HandlerKind};
pub use crate::core::meta::{Meta, MetaHierarchy};
pub use crate::core::processor::Processor;

pub use crate::pipeline::{execute, Group, Pipeline, Rest};

pub use crate::middleware::{Layer, LayerKind, Middleware, Next, Stack};

pub use crate::combinators::{After, AfterIf, Catch, If};

pub use crate::error::{ErrorValue, FlowError, FlowResult};

/*
    Core Workflow:
    1. Define a context struct `MyCtx` and wrap it: `ContextData::new(MyCtx { .. })`.
    2. Create a `Pipeline<MyCtx>` and register handlers in order:
       - `.use_task(|ctx| async move { ..; Ok(Control::Continue) })`
       - `.use_error(|ctx, err| async move { ..; Ok(Control::Clear) })`
       - `.use_group(Group::new().task(..).task(..))` for group-local aborts.
       - `.use_processor(other_pipeline)` to nest.
    3. Call `pipeline.run(ctx).await` and inspect the `PipelineResult`, or the
       error that was left pending.
    4. For around-style middleware build a `Stack`, register layers with
       `.use_auto(..)`, `.use_manual(..)` or `.use_middleware(If::new(..))`, and
       call `stack.process(ctx, Next::noop()).await`.
*/
