// tests/chain_group_tests.rs
mod common;
use common::*;
use orka_flow::{ContextData, Control, Group, Handler, Pipeline, PipelineResult};
use serial_test::serial;

fn error_abort(step_name: &'static str) -> Handler<TestContext, TestError> {
  Handler::error(move |ctx: ContextData<TestContext>, err: TestError| async move {
    record(&ctx, step_name);
    ctx.write().errors_seen.push(err.message().to_string());
    Ok::<Control, TestError>(Control::Abort)
  })
}

#[tokio::test]
#[serial]
async fn test_group_runs_all_members() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline
    .use_group(
      Group::new()
        .handler(step_handler("g1"))
        .handler(clearing_error_handler("g_error"))
        .handler(step_handler("g2")),
    )
    .use_handler(step_handler("after"));

  let ctx = new_ctx();
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(steps(&ctx), vec!["g1", "g2", "after"]);
}

#[tokio::test]
#[serial]
async fn test_group_non_last_abort_only_ends_group() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline
    .use_group(
      Group::new()
        .handler(step_handler("h1"))
        .handler(abort_handler("h2"))
        .handler(step_handler("h3")),
    )
    .use_handler(step_handler("h4"));

  let ctx = new_ctx();
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(steps(&ctx), vec!["h1", "h2", "h4"]);
}

#[tokio::test]
#[serial]
async fn test_group_last_abort_terminates_enclosing_pipeline() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline
    .use_group(Group::new().handler(step_handler("h1")).handler(abort_handler("h2")))
    .use_handler(step_handler("never"));

  let ctx = new_ctx();
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Stopped));
  assert_eq!(steps(&ctx), vec!["h1", "h2"]);
}

#[tokio::test]
#[serial]
async fn test_group_abort_keeps_error_created_inside_group() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline
    .use_group(
      Group::new()
        .handler(failing_handler("fail", "group error"))
        .handler(error_abort("error_abort"))
        .handler(step_handler("never_in_group")),
    )
    .use_handler(step_handler("skipped_task"))
    .use_handler(clearing_error_handler("outer_clear"))
    .use_handler(step_handler("resumed"));

  let ctx = new_ctx();
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(steps(&ctx), vec!["fail", "error_abort", "outer_clear", "resumed"]);
  assert_eq!(ctx.read().errors_seen, vec!["group error", "group error"]);
}

#[tokio::test]
#[serial]
async fn test_group_abort_keeps_error_of_parent_scope() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline
    .use_group(Group::new().handler(error_abort("error_abort")).handler(step_handler("never")))
    .use_handler(step_handler("skipped_task"))
    .use_handler(clearing_error_handler("outer_clear"));

  let ctx = new_ctx();
  let result = pipeline
    .run_with_error(ctx.clone(), TestError::Handler("parent".to_string()))
    .await;

  assert_eq!(result, Ok(PipelineResult::Completed));
  assert_eq!(steps(&ctx), vec!["error_abort", "outer_clear"]);
  assert_eq!(ctx.read().errors_seen, vec!["parent", "parent"]);
}

#[tokio::test]
#[serial]
async fn test_group_error_handlers_see_member_failure() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline
    .use_group(
      Group::new()
        .handler(failing_handler("fail", "member"))
        .handler(step_handler("skipped"))
        .handler(clearing_error_handler("group_clear"))
        .handler(step_handler("resumed_in_group")),
    )
    .use_handler(clearing_error_handler("never"))
    .use_handler(step_handler("after"));

  let ctx = new_ctx();
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(steps(&ctx), vec!["fail", "group_clear", "resumed_in_group", "after"]);
}

#[tokio::test]
#[serial]
async fn test_group_failure_flows_to_handlers_after_group() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline
    .use_group(Group::new().handler(step_handler("g1")).handler(failing_handler("g2", "late")))
    .use_handler(observing_error_handler("after_observe"))
    .use_handler(clearing_error_handler("after_clear"));

  let ctx = new_ctx();
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(steps(&ctx), vec!["g1", "g2", "after_observe", "after_clear"]);
  assert_eq!(ctx.read().errors_seen, vec!["late", "late"]);
}

#[tokio::test]
#[serial]
async fn test_group_closure_builders() {
  setup_tracing();
  let group = Group::<TestContext, TestError>::new()
    .task(|ctx: ContextData<TestContext>| async move {
      ctx.write().counter += 10;
      Err(TestError::Handler("built".to_string()))
    })
    .error(|ctx: ContextData<TestContext>, err: TestError| async move {
      ctx.write().errors_seen.push(err.message().to_string());
      Ok(Control::Clear)
    })
    .processor(Pipeline::from_handlers(vec![step_handler("nested")]));
  assert_eq!(group.len(), 3);

  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline.use_group(group);

  let ctx = new_ctx();
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(ctx.read().counter, 11);
  assert_eq!(ctx.read().errors_seen, vec!["built"]);
  assert_eq!(steps(&ctx), vec!["nested"]);
}

#[tokio::test]
#[serial]
async fn test_use_chain_groups_multiple_handlers() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline
    .use_chain(vec![step_handler("a"), abort_handler("b"), step_handler("c")])
    .use_handler(step_handler("d"));
  assert_eq!(pipeline.len(), 2);

  let ctx = new_ctx();
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(steps(&ctx), vec!["a", "b", "d"]);
}

#[tokio::test]
#[serial]
async fn test_use_chain_single_handler_is_not_grouped() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline
    .use_chain(vec![abort_handler("only")])
    .use_chain(Vec::new())
    .use_handler(step_handler("never"));
  assert_eq!(pipeline.len(), 2);
  assert_eq!(pipeline.entries()[0].kind(), orka_flow::HandlerKind::Task);

  let ctx = new_ctx();
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Stopped));
  assert_eq!(steps(&ctx), vec!["only"]);
}

#[tokio::test]
#[serial]
async fn test_nested_groups_bound_abort_locally() {
  setup_tracing();
  let inner = Group::new().handler(abort_handler("inner_abort")).handler(step_handler("inner_never"));
  let outer_group = Group::new()
    .processor(inner)
    .handler(step_handler("outer_group_next"));

  let mut pipeline = Pipeline::<TestContext, TestError>::new();
  pipeline.use_group(outer_group).use_handler(step_handler("tail"));

  let ctx = new_ctx();
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(PipelineResult::Completed));
  assert_eq!(steps(&ctx), vec!["inner_abort", "outer_group_next", "tail"]);
}
