pub mod outbound;

pub use outbound::{GatewayError, IntentMetadata, PaymentGateway, PaymentIntent, RefundReceipt};
