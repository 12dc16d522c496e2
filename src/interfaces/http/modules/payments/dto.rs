//! Payment DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::ports::{PaymentIntent, RefundReceipt};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateIntentRequest {
    pub booking_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IntentResponse {
    pub intent_id: String,
    pub client_secret: String,
}

impl From<PaymentIntent> for IntentResponse {
    fn from(i: PaymentIntent) -> Self {
        Self {
            intent_id: i.intent_id,
            client_secret: i.client_secret,
        }
    }
}

/// Gateway confirmation callback body (webhook).
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ConfirmIntentRequest {
    #[validate(length(min = 1))]
    pub intent_id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefundRequest {
    pub booking_id: i32,
    #[validate(length(max = 200))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefundResponse {
    pub refund_id: String,
}

impl From<RefundReceipt> for RefundResponse {
    fn from(r: RefundReceipt) -> Self {
        Self {
            refund_id: r.refund_id,
        }
    }
}
