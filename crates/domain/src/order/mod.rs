//! Orders and the aggregate rule tying them to their tickets.

mod state;

pub use state::OrderStatus;

use chrono::NaiveDateTime;
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;
use crate::ticket::Ticket;

/// A purchase of one or more tickets by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_no: String,
    pub user_id: UserId,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub created_at: NaiveDateTime,
    pub paid_at: Option<NaiveDateTime>,
    pub canceled_at: Option<NaiveDateTime>,
}

impl Order {
    /// Places an UNPAID order for `count` seats at `unit_price` each.
    pub fn place(
        order_no: String,
        user_id: UserId,
        unit_price: Money,
        count: u32,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: OrderId::new(),
            order_no,
            user_id,
            total_amount: unit_price.multiply(count),
            status: OrderStatus::Unpaid,
            payment_method: None,
            created_at: now,
            paid_at: None,
            canceled_at: None,
        }
    }

    /// UNPAID → PAID, recording how and when.
    pub fn mark_paid(
        &mut self,
        payment_method: impl Into<String>,
        now: NaiveDateTime,
    ) -> Result<(), DomainError> {
        if !self.status.can_pay() {
            return Err(DomainError::InvalidOrderState {
                current: self.status,
                action: "pay",
            });
        }
        self.status = OrderStatus::Paid;
        self.payment_method = Some(payment_method.into());
        self.paid_at = Some(now);
        Ok(())
    }

    /// UNPAID or PAID → CANCELED.
    ///
    /// Returns the status the order had, which tells the caller whether
    /// seats have to go back to inventory.
    pub fn cancel(&mut self, now: NaiveDateTime) -> Result<OrderStatus, DomainError> {
        if !self.status.can_cancel() {
            return Err(DomainError::InvalidOrderState {
                current: self.status,
                action: "cancel",
            });
        }
        let prior = self.status;
        self.status = OrderStatus::Canceled;
        self.canceled_at = Some(now);
        Ok(prior)
    }

    /// Re-derives the order from the tickets still live under it.
    ///
    /// With no ACTIVE ticket left the order is canceled. Otherwise the total
    /// becomes the sum of the ACTIVE ticket prices and the status is kept.
    /// Non-ACTIVE tickets in `tickets` are ignored.
    pub fn recompute_after_ticket_change<'a>(
        &mut self,
        tickets: impl IntoIterator<Item = &'a Ticket>,
        now: NaiveDateTime,
    ) {
        let mut active = tickets.into_iter().filter(|ticket| ticket.is_active()).peekable();
        if active.peek().is_none() {
            self.status = OrderStatus::Canceled;
            self.canceled_at = Some(now);
            return;
        }
        self.total_amount = active.map(|ticket| ticket.price).sum();
    }

    /// Returns true if the order belongs to `user_id`.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
