// cartsync/src/checkout/steps.rs

//! The three built-in checkout steps.
//!
//! `validate_cart` runs before `require_session` so that an empty cart is
//! reported as such even for an anonymous caller. Neither makes a network call.

use super::context::{CheckoutCtxData, ContextData};
use super::pipeline::PipelineControl;
use crate::error::{ApiError, CheckoutError};
use crate::orders::{OrderGateway, OrderRequest};
use crate::session::SessionContext;
use std::sync::Arc;
use tracing::{info, instrument};

pub const VALIDATE_CART: &str = "validate_cart";
pub const REQUIRE_SESSION: &str = "require_session";
pub const SUBMIT_ORDER: &str = "submit_order";

pub type CheckoutCtx = ContextData<CheckoutCtxData>;

#[instrument(skip_all)]
pub async fn validate_cart(ctx: CheckoutCtx) -> Result<PipelineControl, CheckoutError> {
  if ctx.read().lines.is_empty() {
    return Err(CheckoutError::EmptyCart);
  }
  Ok(PipelineControl::Continue)
}

#[instrument(skip_all)]
pub async fn require_session(session: SessionContext, ctx: CheckoutCtx) -> Result<PipelineControl, CheckoutError> {
  let credential = session.credential().ok_or(CheckoutError::Unauthenticated)?;
  ctx.write().credential = Some(credential);
  Ok(PipelineControl::Continue)
}

#[instrument(skip_all)]
pub async fn submit_order(gateway: Arc<dyn OrderGateway>, ctx: CheckoutCtx) -> Result<PipelineControl, CheckoutError> {
  let (request, credential) = {
    let data = ctx.read();
    let credential = data.credential.clone().ok_or(CheckoutError::Unauthenticated)?;
    (
      OrderRequest {
        items: data.lines.clone(),
      },
      credential,
    )
  };

  let receipt = gateway
    .create_order(&credential, &request)
    .await
    .map_err(|source| match source {
      ApiError::Unauthorized => CheckoutError::Unauthenticated,
      source => CheckoutError::Submission { source },
    })?;

  info!(lines = request.items.len(), message = ?receipt.message, "Order submitted.");
  ctx.write().receipt = Some(receipt);
  Ok(PipelineControl::Continue)
}
