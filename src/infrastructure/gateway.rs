//! Sandbox payment gateway
//!
//! In-process stand-in for the external payment processor. Intents are
//! tracked in memory so confirmation callbacks and refunds can be
//! exercised end to end; `set_unavailable` simulates an outage for
//! failure-path tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use rust_decimal::Decimal;

use crate::application::ports::{
    GatewayError, IntentMetadata, PaymentGateway, PaymentIntent, RefundReceipt,
};

#[derive(Debug, Clone)]
struct SandboxIntent {
    amount: Decimal,
    currency: String,
    metadata: IntentMetadata,
    refunded: bool,
}

#[derive(Default)]
pub struct SandboxPaymentGateway {
    intents: DashMap<String, SandboxIntent>,
    counter: AtomicU64,
    unavailable: AtomicBool,
}

impl SandboxPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a gateway outage. While set, every call fails with
    /// `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), GatewayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(
                "sandbox gateway is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for SandboxPaymentGateway {
    async fn create_intent(
        &self,
        amount: Decimal,
        currency: &str,
        metadata: IntentMetadata,
    ) -> Result<PaymentIntent, GatewayError> {
        self.check_reachable()?;
        if amount < Decimal::ZERO {
            return Err(GatewayError::Rejected(
                "amount must not be negative".to_string(),
            ));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let intent_id = format!("pi_sandbox_{:08}", n);
        let client_secret = format!("{}_secret_{}", intent_id, uuid::Uuid::new_v4().simple());

        debug!(
            "Sandbox intent {} for booking {} ({} {})",
            intent_id, metadata.booking_id, amount, currency
        );
        self.intents.insert(
            intent_id.clone(),
            SandboxIntent {
                amount,
                currency: currency.to_string(),
                metadata,
                refunded: false,
            },
        );

        Ok(PaymentIntent {
            intent_id,
            client_secret,
        })
    }

    async fn refund(&self, intent_id: &str, reason: &str) -> Result<RefundReceipt, GatewayError> {
        self.check_reachable()?;

        let mut intent = self
            .intents
            .get_mut(intent_id)
            .ok_or_else(|| GatewayError::Rejected(format!("unknown intent {}", intent_id)))?;
        if intent.refunded {
            return Err(GatewayError::Rejected(format!(
                "intent {} already refunded",
                intent_id
            )));
        }
        intent.refunded = true;

        debug!(
            "Sandbox refund for intent {} ({} {}): {}",
            intent_id, intent.amount, intent.currency, reason
        );
        Ok(RefundReceipt {
            refund_id: format!("re_sandbox_{}", uuid::Uuid::new_v4().simple()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> IntentMetadata {
        IntentMetadata {
            booking_id: 1,
            driver_id: 2,
            lot_id: 3,
        }
    }

    #[tokio::test]
    async fn intent_ids_are_unique() {
        let gw = SandboxPaymentGateway::new();
        let a = gw
            .create_intent(Decimal::new(600, 2), "usd", metadata())
            .await
            .unwrap();
        let b = gw
            .create_intent(Decimal::new(600, 2), "usd", metadata())
            .await
            .unwrap();
        assert_ne!(a.intent_id, b.intent_id);
    }

    #[tokio::test]
    async fn refund_of_unknown_intent_is_rejected() {
        let gw = SandboxPaymentGateway::new();
        let err = gw.refund("pi_missing", "test").await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(_)));
    }

    #[tokio::test]
    async fn double_refund_is_rejected() {
        let gw = SandboxPaymentGateway::new();
        let intent = gw
            .create_intent(Decimal::new(600, 2), "usd", metadata())
            .await
            .unwrap();
        gw.refund(&intent.intent_id, "first").await.unwrap();
        let err = gw.refund(&intent.intent_id, "second").await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(_)));
    }

    #[tokio::test]
    async fn outage_fails_every_call() {
        let gw = SandboxPaymentGateway::new();
        gw.set_unavailable(true);
        let err = gw
            .create_intent(Decimal::new(600, 2), "usd", metadata())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }
}
