//! Payment coordinator
//!
//! Mediates between bookings and the external payment gateway. The
//! booking's frozen total is the amount charged; the stored intent id is
//! the idempotency key for confirmation callbacks, so a redelivered
//! callback is a no-op rather than a duplicate payment.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use rust_decimal::Decimal;

use crate::application::ports::{
    GatewayError, IntentMetadata, PaymentGateway, PaymentIntent, RefundReceipt,
};
use crate::domain::booking::{Booking, BookingStatus, TransitionStamps};
use crate::domain::notification::NotificationKind;
use crate::domain::{Actor, DomainError, DomainResult, RepositoryProvider};

use super::notification::NotificationService;

fn format_amount(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn map_gateway_error(e: GatewayError) -> DomainError {
    match e {
        GatewayError::Unavailable(msg) => DomainError::GatewayUnavailable(msg),
        GatewayError::Rejected(msg) => DomainError::Validation(msg),
    }
}

/// Service for payment coordination
pub struct PaymentService {
    repos: Arc<dyn RepositoryProvider>,
    notifier: Arc<NotificationService>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl PaymentService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        notifier: Arc<NotificationService>,
        gateway: Arc<dyn PaymentGateway>,
        currency: String,
    ) -> Self {
        Self {
            repos,
            notifier,
            gateway,
            currency,
        }
    }

    async fn find_booking(&self, id: i32) -> DomainResult<Booking> {
        self.repos
            .bookings()
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Booking",
                field: "id",
                value: id.to_string(),
            })
    }

    /// Create a payment intent for a booking's frozen total. Only the
    /// booking's driver may pay, and only while the booking is
    /// `PENDING` or `CONFIRMED`.
    pub async fn create_intent(
        &self,
        actor: &Actor,
        booking_id: i32,
    ) -> DomainResult<PaymentIntent> {
        let booking = self.find_booking(booking_id).await?;
        match actor {
            Actor::Driver(id) if *id == booking.driver_id => {}
            _ => {
                return Err(DomainError::Forbidden(
                    "only the booking's driver may pay for it".to_string(),
                ))
            }
        }

        if booking.status.is_paid_or_later() {
            return Err(DomainError::AlreadyPaid(booking_id));
        }
        if !matches!(
            booking.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) {
            return Err(DomainError::IllegalTransition {
                from: booking.status.as_str(),
                to: BookingStatus::Paid.as_str(),
            });
        }

        let intent = self
            .gateway
            .create_intent(
                format_amount(booking.total_price_cents),
                &self.currency,
                IntentMetadata {
                    booking_id: booking.id,
                    driver_id: booking.driver_id,
                    lot_id: booking.lot_id,
                },
            )
            .await
            .map_err(map_gateway_error)?;

        self.repos
            .bookings()
            .set_payment_intent(booking_id, &intent.intent_id)
            .await?;

        info!(
            "Payment intent {} created for booking {} ({} {})",
            intent.intent_id,
            booking_id,
            format_amount(booking.total_price_cents),
            self.currency
        );
        Ok(intent)
    }

    /// Gateway confirmation callback. Idempotent: an unknown intent or an
    /// already-paid booking is a logged no-op, never a duplicate
    /// transition or a second round of notifications.
    pub async fn on_intent_succeeded(&self, intent_id: &str) -> DomainResult<Option<Booking>> {
        let booking = match self
            .repos
            .bookings()
            .find_by_payment_intent(intent_id)
            .await?
        {
            Some(b) => b,
            None => {
                warn!("Confirmation for unknown payment intent {}", intent_id);
                return Ok(None);
            }
        };

        if booking.status.is_paid_or_later() {
            debug!(
                "Redelivered confirmation for intent {} (booking {} already {})",
                intent_id, booking.id, booking.status
            );
            return Ok(Some(booking));
        }

        let lot = self
            .repos
            .lots()
            .find_by_id(booking.lot_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "ParkingLot",
                field: "id",
                value: booking.lot_id.to_string(),
            })?;

        booking.transition(BookingStatus::Paid, &Actor::Gateway, lot.owner_id)?;
        let updated = self
            .repos
            .bookings()
            .transition_status(
                booking.id,
                booking.status,
                BookingStatus::Paid,
                TransitionStamps {
                    payment_completed_at: Some(Utc::now()),
                    refunded_at: None,
                },
            )
            .await?;

        metrics::counter!("parkwise_payments_confirmed_total").increment(1);
        info!("Booking {} paid via intent {}", updated.id, intent_id);

        let amount = format_amount(updated.total_price_cents);
        self.notify_payment(
            updated.driver_id,
            "Payment Processed",
            format!("Your payment of ${} for {} was processed", amount, lot.name),
            &updated,
        )
        .await;
        self.notify_payment(
            lot.owner_id,
            "Payment Received",
            format!("A payment of ${} was received for {}", amount, lot.name),
            &updated,
        )
        .await;

        Ok(Some(updated))
    }

    /// Refund a paid booking. The gateway is asked first; local state
    /// changes only after it acknowledges, so an unreachable gateway
    /// leaves the booking `PAID` and retryable.
    pub async fn request_refund(
        &self,
        actor: &Actor,
        booking_id: i32,
        reason: &str,
    ) -> DomainResult<RefundReceipt> {
        let booking = self.find_booking(booking_id).await?;
        let lot = self
            .repos
            .lots()
            .find_by_id(booking.lot_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "ParkingLot",
                field: "id",
                value: booking.lot_id.to_string(),
            })?;

        let allowed = match actor {
            Actor::Driver(id) => *id == booking.driver_id,
            Actor::Owner(id) => *id == lot.owner_id,
            Actor::Gateway => false,
        };
        if !allowed {
            return Err(DomainError::Forbidden(
                "refunds may be requested by the booking's driver or the lot's owner".to_string(),
            ));
        }

        if booking.status != BookingStatus::Paid {
            return Err(DomainError::IllegalTransition {
                from: booking.status.as_str(),
                to: BookingStatus::Refunded.as_str(),
            });
        }
        let intent_id = booking
            .payment_intent_id
            .as_deref()
            .ok_or_else(|| DomainError::Validation("booking has no payment intent".to_string()))?;

        let receipt = self
            .gateway
            .refund(intent_id, reason)
            .await
            .map_err(map_gateway_error)?;

        let updated = self
            .repos
            .bookings()
            .transition_status(
                booking_id,
                BookingStatus::Paid,
                BookingStatus::Refunded,
                TransitionStamps {
                    payment_completed_at: None,
                    refunded_at: Some(Utc::now()),
                },
            )
            .await?;

        metrics::counter!("parkwise_refunds_total").increment(1);
        info!(
            "Booking {} refunded ({}, refund {})",
            booking_id, reason, receipt.refund_id
        );

        let amount = format_amount(updated.total_price_cents);
        self.notify_payment(
            updated.driver_id,
            "Refund Processed",
            format!("Your refund of ${} for {} was processed", amount, lot.name),
            &updated,
        )
        .await;
        self.notify_payment(
            lot.owner_id,
            "Booking Refunded",
            format!("A booking for {} was refunded (${})", lot.name, amount),
            &updated,
        )
        .await;

        Ok(receipt)
    }

    /// Paid bookings of a driver, most recently paid first.
    pub async fn payment_history(&self, actor: &Actor) -> DomainResult<Vec<Booking>> {
        match actor {
            Actor::Driver(id) => self.repos.bookings().list_paid_for_driver(*id).await,
            _ => Err(DomainError::Forbidden(
                "payment history requires a driver identity".to_string(),
            )),
        }
    }

    async fn notify_payment(&self, user_id: i32, title: &str, message: String, booking: &Booking) {
        let payload = serde_json::json!({
            "bookingId": booking.id,
            "lotId": booking.lot_id,
            "amount": format_amount(booking.total_price_cents),
        });
        if let Err(e) = self
            .notifier
            .notify(
                user_id,
                NotificationKind::PaymentProcessed,
                title,
                message,
                Some(payload),
            )
            .await
        {
            log::error!(
                "Failed to notify user {} about payment on booking {}: {}",
                user_id,
                booking.id,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::services::lot::{CreateLotCommand, LotService};
    use crate::application::services::reservation::{CreateBookingCommand, ReservationService};
    use crate::application::session::ConnectionRegistry;
    use crate::infrastructure::gateway::SandboxPaymentGateway;
    use crate::infrastructure::storage::memory::MemoryRepositoryProvider;
    use chrono::Duration;

    struct Fixture {
        payments: PaymentService,
        reservations: ReservationService,
        lots: LotService,
        notifier: Arc<NotificationService>,
        gateway: Arc<SandboxPaymentGateway>,
    }

    fn fixture() -> Fixture {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(MemoryRepositoryProvider::new());
        let notifier = Arc::new(NotificationService::new(
            repos.clone(),
            create_event_bus(),
            ConnectionRegistry::shared(),
        ));
        let gateway = Arc::new(SandboxPaymentGateway::new());
        Fixture {
            payments: PaymentService::new(
                repos.clone(),
                notifier.clone(),
                gateway.clone(),
                "usd".to_string(),
            ),
            reservations: ReservationService::new(repos.clone(), notifier.clone()),
            lots: LotService::new(repos, notifier.clone()),
            notifier,
            gateway,
        }
    }

    async fn paid_setup(f: &Fixture) -> (Booking, PaymentIntent) {
        let lot = f
            .lots
            .create_lot(
                &Actor::Owner(1),
                CreateLotCommand {
                    name: "Pay Lot".to_string(),
                    address: "2 Pay St".to_string(),
                    total_spaces: 5,
                    price_per_hour_cents: 300,
                },
            )
            .await
            .unwrap();
        let start = Utc::now() + Duration::hours(1);
        let booking = f
            .reservations
            .create_booking(
                &Actor::Driver(10),
                CreateBookingCommand {
                    lot_id: lot.id,
                    start_time: start,
                    end_time: start + Duration::hours(2),
                    vehicle_info: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        let intent = f
            .payments
            .create_intent(&Actor::Driver(10), booking.id)
            .await
            .unwrap();
        (booking, intent)
    }

    #[tokio::test]
    async fn intent_then_confirmation_marks_paid() {
        let f = fixture();
        let (booking, intent) = paid_setup(&f).await;

        let paid = f
            .payments
            .on_intent_succeeded(&intent.intent_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(paid.id, booking.id);
        assert_eq!(paid.status, BookingStatus::Paid);
        assert!(paid.payment_completed_at.is_some());
    }

    #[tokio::test]
    async fn redelivered_confirmation_is_noop() {
        let f = fixture();
        let (_, intent) = paid_setup(&f).await;

        f.payments.on_intent_succeeded(&intent.intent_id).await.unwrap();
        let driver_before = f.notifier.list_for_user(10, 50).await.unwrap().len();

        let again = f
            .payments
            .on_intent_succeeded(&intent.intent_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.status, BookingStatus::Paid);
        // no second round of notifications
        assert_eq!(f.notifier.list_for_user(10, 50).await.unwrap().len(), driver_before);
    }

    #[tokio::test]
    async fn unknown_intent_confirmation_is_noop() {
        let f = fixture();
        assert!(f
            .payments
            .on_intent_succeeded("pi_does_not_exist")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn paying_twice_is_rejected() {
        let f = fixture();
        let (booking, intent) = paid_setup(&f).await;
        f.payments.on_intent_succeeded(&intent.intent_id).await.unwrap();

        let err = f
            .payments
            .create_intent(&Actor::Driver(10), booking.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyPaid(_)));
    }

    #[tokio::test]
    async fn cancelled_booking_cannot_be_paid() {
        let f = fixture();
        let (booking, _) = paid_setup(&f).await;
        f.reservations
            .transition(&Actor::Driver(10), booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        let err = f
            .payments
            .create_intent(&Actor::Driver(10), booking.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::IllegalTransition { .. }));
    }

    #[tokio::test]
    async fn only_own_driver_can_pay() {
        let f = fixture();
        let (booking, _) = paid_setup(&f).await;
        let err = f
            .payments
            .create_intent(&Actor::Driver(99), booking.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn refund_moves_paid_to_refunded() {
        let f = fixture();
        let (booking, intent) = paid_setup(&f).await;
        f.payments.on_intent_succeeded(&intent.intent_id).await.unwrap();

        f.payments
            .request_refund(&Actor::Driver(10), booking.id, "requested_by_customer")
            .await
            .unwrap();

        let refunded = f
            .reservations
            .get_booking(&Actor::Driver(10), booking.id)
            .await
            .unwrap();
        assert_eq!(refunded.status, BookingStatus::Refunded);
        assert!(refunded.refunded_at.is_some());
    }

    #[tokio::test]
    async fn refund_of_unpaid_booking_is_illegal() {
        let f = fixture();
        let (booking, _) = paid_setup(&f).await;
        // intent exists but was never confirmed
        let err = f
            .payments
            .request_refund(&Actor::Driver(10), booking.id, "changed my mind")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::IllegalTransition { .. }));
    }

    #[tokio::test]
    async fn unreachable_gateway_leaves_booking_paid() {
        let f = fixture();
        let (booking, intent) = paid_setup(&f).await;
        f.payments.on_intent_succeeded(&intent.intent_id).await.unwrap();

        f.gateway.set_unavailable(true);
        let err = f
            .payments
            .request_refund(&Actor::Driver(10), booking.id, "requested_by_customer")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::GatewayUnavailable(_)));

        let still_paid = f
            .reservations
            .get_booking(&Actor::Driver(10), booking.id)
            .await
            .unwrap();
        assert_eq!(still_paid.status, BookingStatus::Paid);

        // retry once the gateway is back
        f.gateway.set_unavailable(false);
        f.payments
            .request_refund(&Actor::Driver(10), booking.id, "requested_by_customer")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn payment_history_lists_paid_bookings() {
        let f = fixture();
        let (booking, intent) = paid_setup(&f).await;
        f.payments.on_intent_succeeded(&intent.intent_id).await.unwrap();

        let history = f.payments.payment_history(&Actor::Driver(10)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, booking.id);
    }
}
