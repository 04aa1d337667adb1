// orka_flow/examples/error_handling.rs

use orka_flow::{ContextData, Control, Pipeline, PipelineResult};
use tracing::{error, info, warn};

#[derive(Clone, Debug, Default)]
struct OrderContext {
  order_id: String,
  charged: bool,
  retries: u32,
  notes: Vec<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
enum OrderError {
  #[error("Payment gateway unavailable for order {0}")]
  GatewayUnavailable(String),
  #[error("Order {0} rejected: {1}")]
  Rejected(String, String),
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Error Handling Example ---");

  let mut pipeline = Pipeline::<OrderContext, OrderError>::new();
  pipeline
    .use_task(|ctx: ContextData<OrderContext>| async move {
      let order_id = ctx.read().order_id.clone();
      info!(%order_id, "Charging order");
      // The first attempt always fails; the failure becomes the pending error.
      Err(OrderError::GatewayUnavailable(order_id))
    })
    .use_task(|_ctx: ContextData<OrderContext>| async move {
      // Skipped: an error is pending.
      error!("This task must not run while an error is pending");
      Ok(Control::Continue)
    })
    .use_error(|ctx: ContextData<OrderContext>, err: OrderError| async move {
      warn!(error = %err, "Recovering from payment failure");
      match err {
        OrderError::GatewayUnavailable(_) => {
          let mut data = ctx.write();
          data.retries += 1;
          data.charged = true;
          data.notes.push(format!("recovered after: {}", err));
          Ok(Control::Clear)
        }
        other => Err(other),
      }
    })
    .use_task(|ctx: ContextData<OrderContext>| async move {
      ctx.write().notes.push("receipt sent".to_string());
      Ok(Control::Continue)
    });

  let ctx = ContextData::new(OrderContext {
    order_id: "ord-42".to_string(),
    ..Default::default()
  });

  match pipeline.run(ctx.clone()).await {
    Ok(PipelineResult::Completed) => info!("Order processed"),
    Ok(PipelineResult::Stopped) => info!("Order processing stopped early"),
    Err(e) => error!(error = %e, "Order failed"),
  }

  let data = ctx.read();
  info!(charged = data.charged, retries = data.retries, notes = ?data.notes, "Final state");
  assert!(data.charged);
  assert_eq!(data.retries, 1);

  // An error nobody clears is returned from `run`.
  let mut strict = Pipeline::<OrderContext, OrderError>::new();
  strict.use_task(|ctx: ContextData<OrderContext>| async move {
    let order_id = ctx.read().order_id.clone();
    Err::<Control, OrderError>(OrderError::Rejected(order_id, "card expired".to_string()))
  });
  let outcome = strict.run(ContextData::new(OrderContext::default())).await;
  assert!(matches!(outcome, Err(OrderError::Rejected(_, _))));
  info!("Unrecovered error surfaced as expected: {:?}", outcome);
}
