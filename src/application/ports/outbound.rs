//! Outbound ports — interface to the external payment gateway
//!
//! [`PaymentGateway`] is the architectural contract that decouples the
//! payment coordinator from the concrete processor integration. The
//! in-process [`SandboxPaymentGateway`](crate::infrastructure::gateway::
//! SandboxPaymentGateway) implements it for development and tests; a
//! production deployment would implement it against a real processor.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// Metadata attached to a payment intent, echoed back in callbacks.
#[derive(Debug, Clone)]
pub struct IntentMetadata {
    pub booking_id: i32,
    pub driver_id: i32,
    pub lot_id: i32,
}

/// A created payment intent. The `client_secret` goes to the paying
/// client; the `intent_id` is stored on the booking as the idempotency
/// key for later confirmation callbacks.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub client_secret: String,
}

/// Gateway acknowledgement of a refund.
#[derive(Debug, Clone)]
pub struct RefundReceipt {
    pub refund_id: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway could not be reached; the operation was not started.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    /// The gateway rejected the request (unknown intent, refused refund).
    #[error("gateway rejected the request: {0}")]
    Rejected(String),
}

/// Port for talking to the external payment processor.
///
/// Callbacks (intent succeeded, refund settled) arrive through the API
/// layer and are routed to the payment coordinator; this trait only
/// covers the calls the core initiates.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for `amount` in `currency`.
    async fn create_intent(
        &self,
        amount: Decimal,
        currency: &str,
        metadata: IntentMetadata,
    ) -> Result<PaymentIntent, GatewayError>;

    /// Request a refund for a previously settled intent. Returns only
    /// after the gateway acknowledges.
    async fn refund(&self, intent_id: &str, reason: &str) -> Result<RefundReceipt, GatewayError>;
}
