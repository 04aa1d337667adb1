// orka_flow/examples/middleware_stack.rs

use orka_flow::{After, Catch, ContextData, Control, FlowError, If, Layer, Next, Pipeline, Stack};
use std::time::Instant;
use tracing::info;

#[derive(Clone, Debug, Default)]
struct RequestContext {
  path: String,
  authenticated: bool,
  status: Option<u16>,
  audit: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), FlowError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Middleware Stack Example ---");

  // Admin routes: a terminating gate, so nothing after it runs for them.
  let mut admin_gate: If<RequestContext> = If::terminating(
    |ctx: ContextData<RequestContext>| async move { Ok(ctx.read().path.starts_with("/admin")) },
    true,
  );
  admin_gate.stack_mut().use_auto(|ctx: ContextData<RequestContext>| async move {
    let mut data = ctx.write();
    data.status = Some(if data.authenticated { 200 } else { 403 });
    data.audit.push("admin handler".to_string());
    Ok(())
  });

  // A chain-model pipeline nested as middleware.
  let mut page_pipeline = Pipeline::<RequestContext>::new();
  page_pipeline.use_task(|ctx: ContextData<RequestContext>| async move {
    let mut data = ctx.write();
    data.status = Some(200);
    data.audit.push("page handler".to_string());
    Ok(Control::Continue)
  });

  let mut stack = Stack::<RequestContext>::new();
  stack
    // Timing around everything downstream.
    .use_manual(|ctx: ContextData<RequestContext>, next: Next<FlowError>| async move {
      let started = Instant::now();
      let outcome = next.run().await;
      info!(path = %ctx.read().path, elapsed = ?started.elapsed(), "Request finished");
      outcome
    })
    .use_middleware(Catch::around(|err: FlowError, ctx: ContextData<RequestContext>| async move {
      let mut data = ctx.write();
      data.status = Some(500);
      data.audit.push(format!("caught: {}", err));
      Ok(())
    }))
    .use_middleware(After::new(Stack::from_layers(vec![Layer::auto(
      |ctx: ContextData<RequestContext>| async move {
        ctx.write().audit.push("after hook".to_string());
        Ok(())
      },
    )])))
    .use_auto(|ctx: ContextData<RequestContext>| async move {
      if ctx.read().path == "/boom" {
        return Err(FlowError::handler("handler exploded"));
      }
      Ok(())
    })
    .use_middleware(admin_gate)
    .use_middleware(page_pipeline);

  for path in ["/admin/users", "/home", "/boom"] {
    let ctx = ContextData::new(RequestContext {
      path: path.to_string(),
      ..Default::default()
    });
    stack.process(ctx.clone(), Next::noop()).await?;
    let data = ctx.read();
    info!(path, status = ?data.status, audit = ?data.audit, "Result");
  }

  info!(hierarchy = ?stack.hierarchy(), "Stack layout");
  Ok(())
}
