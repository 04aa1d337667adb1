// orka_flow/examples/basic_pipeline.rs

use orka_flow::{ContextData, Control, FlowError, FlowResult, Group, Pipeline, PipelineResult};
use tracing::info;

// 1. Define the Context Data for the pipeline
#[derive(Clone, Debug, Default)]
struct BasicContext {
  message_log: Vec<String>,
  counter: i32,
}

fn log(data: &mut BasicContext, step: &str) {
  let msg = format!("{} executed: counter = {}", step, data.counter);
  info!("{}", msg);
  data.message_log.push(msg);
}

#[tokio::main]
async fn main() -> Result<(), FlowError> {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Pipeline Example ---");

  // 2. Create a pipeline. The error type defaults to FlowError.
  let mut pipeline = Pipeline::<BasicContext>::new();

  // 3. Register handlers in execution order
  pipeline
    .use_task(|ctx: ContextData<BasicContext>| async move {
      let mut data = ctx.write();
      data.counter += 1;
      log(&mut data, "Alpha");
      FlowResult::<_>::Ok(Control::Continue)
    })
    // A group: its abort only ends the group, the pipeline carries on.
    .use_group(
      Group::new()
        .task(|ctx: ContextData<BasicContext>| async move {
          let mut data = ctx.write();
          data.counter *= 2;
          log(&mut data, "Beta");
          Ok(Control::Abort)
        })
        .task(|ctx: ContextData<BasicContext>| async move {
          let mut data = ctx.write();
          data.counter = 0;
          log(&mut data, "Never");
          Ok(Control::Continue)
        }),
    )
    .use_task(|ctx: ContextData<BasicContext>| async move {
      let mut data = ctx.write();
      data.counter -= 1;
      log(&mut data, "Gamma");
      Ok(Control::Continue)
    });

  // 4. Create an initial context
  let pipeline_context = ContextData::new(BasicContext {
    message_log: Vec::new(),
    counter: 5, // Start counter at 5
  });

  // 5. Run the pipeline
  info!("Starting pipeline execution...");
  let result = pipeline.run(pipeline_context.clone()).await?;

  // 6. Inspect the results
  match result {
    PipelineResult::Completed => info!("Pipeline completed successfully!"),
    PipelineResult::Stopped => info!("Pipeline was stopped early."),
  }

  let final_context_state = pipeline_context.read();
  info!("Final counter value: {}", final_context_state.counter);
  for log_entry in &final_context_state.message_log {
    info!("- {}", log_entry);
  }

  // Expected: (5+1)*2 - 1 = 11
  assert_eq!(final_context_state.counter, 11);
  assert_eq!(final_context_state.message_log.len(), 3);

  Ok(())
}
