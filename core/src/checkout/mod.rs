// cartsync/src/checkout/mod.rs

//! Order submission from a reconciled cart.

pub mod context;
pub mod pipeline;
pub mod steps;

pub use context::{CheckoutCtxData, ContextData};
pub use pipeline::{Pipeline, PipelineControl, PipelineResult};

use crate::cart::{CartReconciler, HydratedLineItem};
use crate::error::{CheckoutError, PipelineError};
use crate::orders::{OrderGateway, OrderReceipt, OrderRequest};
use crate::session::SessionContext;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Submits the cart as an order through a `validate_cart` → `require_session`
/// → `submit_order` pipeline.
///
/// Extra steps can be spliced in through `pipeline_mut`. A handler that
/// stops the run surfaces as `CheckoutError::Halted`.
pub struct CheckoutInitiator {
  pipeline: Pipeline<CheckoutCtxData, CheckoutError>,
  session: SessionContext,
}

impl std::fmt::Debug for CheckoutInitiator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CheckoutInitiator")
      .field("pipeline", &self.pipeline)
      .field("session", &self.session)
      .finish()
  }
}

impl CheckoutInitiator {
  pub fn new(session: SessionContext, gateway: Arc<dyn OrderGateway>) -> Result<Self, PipelineError> {
    let mut pipeline = Pipeline::new(&[
      (steps::VALIDATE_CART, false),
      (steps::REQUIRE_SESSION, false),
      (steps::SUBMIT_ORDER, false),
    ]);

    pipeline.on(steps::VALIDATE_CART, steps::validate_cart)?;

    let step_session = session.clone();
    pipeline.on(steps::REQUIRE_SESSION, move |ctx| {
      steps::require_session(step_session.clone(), ctx)
    })?;

    pipeline.on(steps::SUBMIT_ORDER, move |ctx| {
      steps::submit_order(Arc::clone(&gateway), ctx)
    })?;

    Ok(Self { pipeline, session })
  }

  pub fn session(&self) -> &SessionContext {
    &self.session
  }

  pub fn pipeline(&self) -> &Pipeline<CheckoutCtxData, CheckoutError> {
    &self.pipeline
  }

  pub fn pipeline_mut(&mut self) -> &mut Pipeline<CheckoutCtxData, CheckoutError> {
    &mut self.pipeline
  }

  /// Runs the pipeline for `items` without touching any cart.
  pub async fn submit<'a>(
    &self,
    items: impl IntoIterator<Item = &'a HydratedLineItem>,
  ) -> Result<OrderReceipt, CheckoutError> {
    let request = OrderRequest::from_items(items);
    let ctx = ContextData::new(CheckoutCtxData::new(request.items));

    match self.pipeline.run(ctx.clone()).await? {
      PipelineResult::Completed => {}
      PipelineResult::Stopped { step_name } => return Err(CheckoutError::Halted { step_name }),
    }

    let receipt = ctx.write().receipt.take();
    receipt.ok_or_else(|| {
      CheckoutError::from(PipelineError::HandlerMissing {
        step_name: steps::SUBMIT_ORDER.to_string(),
      })
    })
  }

  /// Submits the hydrated lines of `cart` and clears it on success.
  ///
  /// Only hydrated lines are ordered, but success clears the whole cart:
  /// unresolved entries are dropped along with them. Callers that want to
  /// keep those should check `cart.unresolved()` before calling.
  ///
  /// On failure the cart is left as it was. A receipt is returned even if
  /// clearing the cart afterwards fails, since the order already exists.
  #[instrument(name = "CheckoutInitiator::place_order", skip_all, fields(lines = cart.item_count()))]
  pub async fn place_order(&self, cart: &mut CartReconciler) -> Result<OrderReceipt, CheckoutError> {
    let receipt = self.submit(cart.items()).await?;
    if let Err(e) = cart.clear_cart() {
      warn!(error = %e, "Order placed but the cart could not be cleared.");
    }
    Ok(receipt)
  }
}
