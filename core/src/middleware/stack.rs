// orka_flow/src/middleware/stack.rs

//! The continuation-passing model: `Middleware`, the `Layer` tagged union and
//! the `Stack` container.

use crate::core::context_data::ContextData;
use crate::core::handler::BoxFuture;
use crate::core::meta::{Meta, MetaHierarchy};
use crate::error::{ErrorValue, FlowError};
use crate::middleware::next::Next;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{event, Level};

/// A unit of the continuation model: receives the context and the continuation
/// for everything after it, and decides whether and when to run it.
#[async_trait]
pub trait Middleware<TData, Err>: Send + Sync
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  async fn process(&self, ctx: ContextData<TData>, next: Next<Err>) -> Result<(), Err>;

  fn meta(&self) -> Option<&Meta> {
    None
  }

  fn hierarchy(&self) -> MetaHierarchy {
    MetaHierarchy::leaf(self.meta().cloned())
  }
}

/// Takes only the context; the continuation runs automatically once it succeeds.
pub type AutoFn<TData, Err> = Arc<dyn Fn(ContextData<TData>) -> BoxFuture<'static, Result<(), Err>> + Send + Sync>;

/// Takes the context and the continuation, and drives the continuation itself.
pub type ManualFn<TData, Err> =
  Arc<dyn Fn(ContextData<TData>, Next<Err>) -> BoxFuture<'static, Result<(), Err>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
  Auto,
  Manual,
  Middleware,
}

/// One unit of a `Stack`, classified once when it is built.
pub enum Layer<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  Auto(AutoFn<TData, Err>),
  Manual(ManualFn<TData, Err>),
  Middleware(Arc<dyn Middleware<TData, Err>>),
}

impl<TData, Err> Layer<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  pub fn auto<F, Fut>(layer_fn: F) -> Self
  where
    F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Err>> + Send + 'static,
  {
    Layer::Auto(Arc::new(
      move |ctx: ContextData<TData>| -> BoxFuture<'static, Result<(), Err>> { Box::pin(layer_fn(ctx)) },
    ))
  }

  pub fn manual<F, Fut>(layer_fn: F) -> Self
  where
    F: Fn(ContextData<TData>, Next<Err>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Err>> + Send + 'static,
  {
    Layer::Manual(Arc::new(
      move |ctx: ContextData<TData>, next: Next<Err>| -> BoxFuture<'static, Result<(), Err>> {
        Box::pin(layer_fn(ctx, next))
      },
    ))
  }

  pub fn middleware<M>(middleware: M) -> Self
  where
    M: Middleware<TData, Err> + 'static,
  {
    Layer::Middleware(Arc::new(middleware))
  }

  pub fn kind(&self) -> LayerKind {
    match self {
      Layer::Auto(_) => LayerKind::Auto,
      Layer::Manual(_) => LayerKind::Manual,
      Layer::Middleware(_) => LayerKind::Middleware,
    }
  }
}

impl<TData, Err> Clone for Layer<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn clone(&self) -> Self {
    match self {
      Layer::Auto(f) => Layer::Auto(Arc::clone(f)),
      Layer::Manual(f) => Layer::Manual(Arc::clone(f)),
      Layer::Middleware(m) => Layer::Middleware(Arc::clone(m)),
    }
  }
}

struct StackEntry<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  layer: Layer<TData, Err>,
  meta: Option<Meta>,
}

// Manual impl: a derive would demand `TData: Clone`.
impl<TData, Err> Clone for StackEntry<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn clone(&self) -> Self {
    Self {
      layer: self.layer.clone(),
      meta: self.meta.clone(),
    }
  }
}

impl<TData, Err> StackEntry<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn hierarchy(&self) -> MetaHierarchy {
    match &self.layer {
      Layer::Middleware(middleware) => middleware.hierarchy().or_meta(self.meta.as_ref()),
      Layer::Auto(_) | Layer::Manual(_) => MetaHierarchy::leaf(self.meta.clone()),
    }
  }
}

/// Ordered middleware container for the continuation model.
///
/// Each layer receives a `Next` that runs the remaining layers and, after the
/// last one, the tail passed to `process`. Layers are shared behind an `Arc` so a
/// run never borrows the stack.
pub struct Stack<TData, Err = FlowError>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  entries: Arc<Vec<StackEntry<TData, Err>>>,
  meta: Option<Meta>,
}

impl<TData, Err> Stack<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Vec::new()),
      meta: None,
    }
  }

  pub fn from_layers(layers: Vec<Layer<TData, Err>>) -> Self {
    let entries = layers.into_iter().map(|layer| StackEntry { layer, meta: None }).collect();
    Self {
      entries: Arc::new(entries),
      meta: None,
    }
  }

  pub fn with_meta(mut self, meta: Meta) -> Self {
    self.meta = Some(meta);
    self
  }

  pub fn set_meta(&mut self, meta: Meta) {
    self.meta = Some(meta);
  }

  pub fn use_layer(&mut self, layer: Layer<TData, Err>) -> &mut Self {
    self.push(layer, None)
  }

  pub fn use_layer_with_meta(&mut self, layer: Layer<TData, Err>, meta: Meta) -> &mut Self {
    self.push(layer, Some(meta))
  }

  /// Registers a layer that only sees the context; the continuation is invoked on
  /// its behalf after it succeeds.
  pub fn use_auto<F, Fut>(&mut self, layer_fn: F) -> &mut Self
  where
    F: Fn(ContextData<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Err>> + Send + 'static,
  {
    self.use_layer(Layer::auto(layer_fn))
  }

  /// Registers a layer that drives the continuation itself.
  pub fn use_manual<F, Fut>(&mut self, layer_fn: F) -> &mut Self
  where
    F: Fn(ContextData<TData>, Next<Err>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Err>> + Send + 'static,
  {
    self.use_layer(Layer::manual(layer_fn))
  }

  pub fn use_middleware<M>(&mut self, middleware: M) -> &mut Self
  where
    M: Middleware<TData, Err> + 'static,
  {
    self.use_layer(Layer::middleware(middleware))
  }

  pub fn use_shared(&mut self, middleware: Arc<dyn Middleware<TData, Err>>) -> &mut Self {
    self.use_layer(Layer::Middleware(middleware))
  }

  fn push(&mut self, layer: Layer<TData, Err>, meta: Option<Meta>) -> &mut Self {
    event!(Level::TRACE, kind = ?layer.kind(), position = self.entries.len(), "Layer registered.");
    Arc::make_mut(&mut self.entries).push(StackEntry { layer, meta });
    self
  }

  pub fn meta(&self) -> Option<&Meta> {
    self.meta.as_ref()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn layer_kinds(&self) -> Vec<LayerKind> {
    self.entries.iter().map(|entry| entry.layer.kind()).collect()
  }

  pub fn hierarchy(&self) -> MetaHierarchy {
    MetaHierarchy::node(self.meta.clone(), self.child_hierarchies())
  }

  pub(crate) fn child_hierarchies(&self) -> Vec<MetaHierarchy> {
    self.entries.iter().map(StackEntry::hierarchy).collect()
  }

  /// Runs every layer in order, then `next`.
  pub async fn process(&self, ctx: ContextData<TData>, next: Next<Err>) -> Result<(), Err> {
    dispatch(Arc::clone(&self.entries), 0, ctx, next).await
  }
}

fn dispatch<TData, Err>(
  entries: Arc<Vec<StackEntry<TData, Err>>>,
  index: usize,
  ctx: ContextData<TData>,
  tail: Next<Err>,
) -> BoxFuture<'static, Result<(), Err>>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  Box::pin(async move {
    if ctx.is_done() {
      event!(Level::DEBUG, index = index, "Done marker set; skipping remaining layers.");
      return Ok(());
    }

    let layer = match entries.get(index) {
      Some(entry) => entry.layer.clone(),
      None => return tail.run().await,
    };

    event!(Level::TRACE, index = index, kind = ?layer.kind(), "Dispatching layer.");
    let next_ctx = ctx.clone();
    let next = Next::new(move || dispatch(entries, index + 1, next_ctx, tail));

    match layer {
      Layer::Auto(layer_fn) => {
        layer_fn(ctx).await?;
        next.run().await
      }
      Layer::Manual(layer_fn) => layer_fn(ctx, next).await,
      Layer::Middleware(middleware) => middleware.process(ctx, next).await,
    }
  })
}

impl<TData, Err> Default for Stack<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn default() -> Self {
    Self::new()
  }
}

// Clones share their layers until one of them registers another.
impl<TData, Err> Clone for Stack<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn clone(&self) -> Self {
    Self {
      entries: Arc::clone(&self.entries),
      meta: self.meta.clone(),
    }
  }
}

impl<TData, Err> fmt::Debug for Stack<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Stack")
      .field("meta", &self.meta)
      .field("layers", &self.layer_kinds())
      .finish()
  }
}

#[async_trait]
impl<TData, Err> Middleware<TData, Err> for Stack<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: ErrorValue,
{
  async fn process(&self, ctx: ContextData<TData>, next: Next<Err>) -> Result<(), Err> {
    Stack::process(self, ctx, next).await
  }

  fn meta(&self) -> Option<&Meta> {
    Stack::meta(self)
  }

  fn hierarchy(&self) -> MetaHierarchy {
    Stack::hierarchy(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clones_copy_on_register() {
    let mut base = Stack::<(), FlowError>::new();
    base.use_auto(|_ctx: ContextData<()>| async { Ok(()) });

    let mut extended = base.clone();
    extended.use_manual(|_ctx: ContextData<()>, next: Next<FlowError>| next.run());

    assert_eq!(base.layer_kinds(), vec![LayerKind::Auto]);
    assert_eq!(extended.layer_kinds(), vec![LayerKind::Auto, LayerKind::Manual]);
  }
}
