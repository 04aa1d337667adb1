// tests/pipeline_execution_tests.rs
mod common;
use common::*;
use orka_flow::{execute, ContextData, Control, Entry, Handler, Pipeline, PipelineResult, Processor};
use serial_test::serial;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn counted_task(step_name: &'static str) -> Handler<TestContext, TestError> {
  Handler::task(move |ctx: ContextData<TestContext>| async move {
    HANDLER_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
    record(&ctx, step_name);
    Ok::<Control, TestError>(Control::Continue)
  })
}

#[tokio::test]
#[serial]
async fn test_every_task_runs_once_in_order() {
  setup_tracing();
  reset_counters();
  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline
    .use_handler(counted_task("a"))
    .use_handler(counted_task("b"))
    .use_handler(counted_task("c"));

  let ctx = new_ctx();
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result, Ok(PipelineResult::Completed));
  assert_eq!(steps(&ctx), vec!["a", "b", "c"]);
  assert_eq!(HANDLER_EXEC_COUNTER.load(Ordering::SeqCst), 3);
}

#[tokio::test]
#[serial]
async fn test_empty_pipeline_completes() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext, TestError>::default();
  assert!(pipeline.is_empty());

  let ctx = new_ctx();
  let result = pipeline.run(ctx.clone()).await;
  assert_eq!(result, Ok(PipelineResult::Completed));
  assert!(steps(&ctx).is_empty());
}

#[tokio::test]
#[serial]
async fn test_use_task_closures_mutate_shared_context() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline
    .use_task(|ctx: ContextData<TestContext>| async move {
      ctx.write().message.push_str("Hello");
      Ok(Control::Continue)
    })
    .use_task(|ctx: ContextData<TestContext>| async move {
      tokio::time::sleep(std::time::Duration::from_millis(5)).await;
      ctx.write().message.push_str(", world");
      Ok(Control::Continue)
    });

  let ctx = new_ctx();
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "Hello, world");
}

#[tokio::test]
#[serial]
async fn test_abort_in_pipeline_stops_remaining_handlers() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext, TestError>::from_handlers(vec![
    step_handler("a"),
    step_handler("b"),
    step_handler("c"),
  ]);

  let ctx = new_ctx();
  ctx.write().should_stop_at = Some("b".to_string());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result, Ok(PipelineResult::Stopped));
  assert_eq!(steps(&ctx), vec!["a", "b"]);
}

#[tokio::test]
#[serial]
async fn test_abort_from_last_handler_reports_stopped() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext, TestError>::from_handlers(vec![step_handler("a"), abort_handler("b")]);

  let ctx = new_ctx();
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Stopped));
  assert_eq!(steps(&ctx), vec!["a", "b"]);
}

#[tokio::test]
#[serial]
async fn test_nested_pipeline_runs_in_place() {
  setup_tracing();
  let nested = Pipeline::<TestContext, TestError>::from_handlers(vec![
    step_handler("nested_1"),
    observing_error_handler("nested_error"),
    step_handler("nested_2"),
  ]);

  let mut outer = Pipeline::<TestContext, TestError>::new();
  outer
    .use_handler(step_handler("outer_1"))
    .use_processor(nested)
    .use_handler(step_handler("outer_2"));

  let ctx = new_ctx();
  assert_eq!(outer.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(steps(&ctx), vec!["outer_1", "nested_1", "nested_2", "outer_2"]);
  assert!(ctx.read().errors_seen.is_empty());
}

#[tokio::test]
#[serial]
async fn test_nested_last_handler_abort_stops_outer() {
  setup_tracing();
  let nested = Pipeline::<TestContext, TestError>::from_handlers(vec![step_handler("nested_1"), abort_handler("nested_last")]);

  let mut outer = Pipeline::<TestContext, TestError>::new();
  outer.use_processor(nested).use_handler(step_handler("outer_after"));

  let ctx = new_ctx();
  let control = outer.process(ctx.clone(), None).await;

  assert_eq!(control, Ok(Control::Abort));
  assert_eq!(steps(&ctx), vec!["nested_1", "nested_last"]);
}

#[tokio::test]
#[serial]
async fn test_nested_pipeline_non_last_abort_terminates_parent() {
  setup_tracing();
  let nested = Pipeline::<TestContext, TestError>::from_handlers(vec![
    step_handler("nested_1"),
    abort_handler("nested_2"),
    step_handler("nested_3"),
  ]);

  let mut outer = Pipeline::<TestContext, TestError>::new();
  outer
    .use_handler(step_handler("outer_1"))
    .use_processor(nested)
    .use_handler(step_handler("outer_2"));

  let ctx = new_ctx();
  assert_eq!(outer.run(ctx.clone()).await, Ok(PipelineResult::Stopped));
  assert_eq!(steps(&ctx), vec!["outer_1", "nested_1", "nested_2"]);
}

#[tokio::test]
#[serial]
async fn test_shared_pipeline_nested_in_two_parents() {
  setup_tracing();
  let shared: Arc<dyn Processor<TestContext, TestError>> =
    Arc::new(Pipeline::<TestContext, TestError>::from_handlers(vec![step_handler("shared")]));

  let mut first = Pipeline::<TestContext, TestError>::new();
  first.use_handler(step_handler("first")).use_shared(Arc::clone(&shared));
  let mut second = Pipeline::<TestContext, TestError>::new();
  second.use_handler(step_handler("second")).use_shared(shared);

  let ctx = new_ctx();
  first.run(ctx.clone()).await.unwrap();
  second.run(ctx.clone()).await.unwrap();
  assert_eq!(steps(&ctx), vec!["first", "shared", "second", "shared"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_through_processor_trait_object() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext, TestError>::from_handlers(vec![step_handler("a"), step_handler("b")]);
  let as_processor: &dyn Processor<TestContext, TestError> = &pipeline;

  let ctx = new_ctx();
  assert_eq!(as_processor.process(ctx.clone(), None).await, Ok(Control::Continue));
  assert_eq!(steps(&ctx), vec!["a", "b"]);
}

#[tokio::test]
#[serial]
async fn test_execute_on_ad_hoc_list() {
  setup_tracing();
  let entries: Vec<Entry<TestContext, TestError>> = vec![
    Entry::new(step_handler("a")),
    Entry::new(abort_handler("b")),
    Entry::new(step_handler("c")),
  ];

  // Not terminating: a non-last abort only ends this list.
  let ctx = new_ctx();
  assert_eq!(execute(ctx.clone(), None, &entries, false).await, Ok(Control::Continue));
  assert_eq!(steps(&ctx), vec!["a", "b"]);

  // Terminating: the same abort is forwarded.
  let ctx = new_ctx();
  assert_eq!(execute(ctx.clone(), None, &entries, true).await, Ok(Control::Abort));
  assert_eq!(steps(&ctx), vec!["a", "b"]);
}

#[tokio::test]
#[serial]
async fn test_execute_with_empty_list() {
  setup_tracing();
  let ctx = new_ctx();
  let entries: Vec<Entry<TestContext, TestError>> = Vec::new();
  assert_eq!(execute(ctx.clone(), None, &entries, true).await, Ok(Control::Continue));
  assert_eq!(
    execute(ctx, Some(TestError::Handler("left".to_string())), &entries, true).await,
    Err(TestError::Handler("left".to_string()))
  );
}

#[tokio::test]
#[serial]
async fn test_pipeline_reports_length_and_kinds() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline
    .use_handler(step_handler("a"))
    .use_handler(clearing_error_handler("b"))
    .use_processor(Pipeline::<TestContext, TestError>::new());

  assert_eq!(pipeline.len(), 3);
  let kinds: Vec<_> = pipeline.entries().iter().map(|entry| entry.kind()).collect();
  assert_eq!(
    kinds,
    vec![
      orka_flow::HandlerKind::Task,
      orka_flow::HandlerKind::Error,
      orka_flow::HandlerKind::Processor
    ]
  );
}
