//! Integration tests for the ticket and order lifecycle.
//!
//! These tests drive trains, orders and tickets together through the same
//! sequences the booking workflows use, without any storage.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use common::{OrderId, PassengerId, StationId, TrainId, UserId};
use domain::{
    DomainError, Money, Order, OrderStatus, Passenger, RefundOutcome, Refusal, SeatInventory,
    Ticket, TicketIssue, TicketStatus, Train, TrainType, evaluate_change, evaluate_refund,
    station_city,
};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 4, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn train(code: &str, train_type: TrainType, inventory: SeatInventory) -> Train {
    Train {
        id: TrainId::new(),
        code: code.to_string(),
        train_type,
        start_station_id: StationId::new(),
        end_station_id: StationId::new(),
        start_station: "北京西站".to_string(),
        end_station: "郑州东站".to_string(),
        start_time: "10:00".to_string(),
        end_time: "12:30".to_string(),
        duration_minutes: Some(150),
        price: Money::from_yuan(450),
        inventory,
    }
}

fn take_seats(train: &mut Train, seat_class: &str, count: u32) -> bool {
    let tier = train.seat_tier(seat_class).unwrap();
    train.inventory.debit(tier, count).is_ok()
}

fn return_seats(train: &mut Train, seat_class: &str, count: u32) {
    let tier = train.seat_tier(seat_class).unwrap();
    train.inventory.credit(tier, count);
}

fn passenger(user_id: UserId, name: &str) -> Passenger {
    Passenger {
        id: PassengerId::new(),
        user_id,
        real_name: name.to_string(),
        card_id: format!("{name}-card"),
    }
}

fn issue<'a>(
    train: &'a Train,
    order_id: OrderId,
    user_id: UserId,
    seat_class: &'a str,
    seat: u32,
    travel_date: NaiveDate,
) -> TicketIssue<'a> {
    TicketIssue {
        ticket_no: format!("TICKET20260401080000{seat:04}"),
        order_id,
        user_id,
        train,
        seat_class,
        price: train.price_for(seat_class).unwrap(),
        seat,
        travel_date,
        start_station_id: Some(train.start_station_id),
        end_station_id: Some(train.end_station_id),
        start_city: station_city(&train.start_station).to_string(),
        end_city: station_city(&train.end_station).to_string(),
        issued_at: now(),
    }
}

/// Books an order for two passengers on `train`, the way the booking
/// workflow does: priced, availability checked, nothing debited.
fn book_two(train: &Train, seat_class: &str) -> (Order, Vec<Ticket>) {
    let user_id = UserId::new();
    let price = train.price_for(seat_class).unwrap();
    train.ensure_available(seat_class, 2).unwrap();
    let order = Order::place("ORDER202604010800000001".to_string(), user_id, price, 2, now());
    let travel_date = now().date() + Duration::days(3);
    let tickets = ["张三", "李四"]
        .into_iter()
        .zip(1..)
        .map(|(name, seat)| {
            Ticket::issue(
                &passenger(user_id, name),
                issue(train, order.id, user_id, seat_class, seat, travel_date),
            )
        })
        .collect();
    (order, tickets)
}

mod payment {
    use super::*;

    #[test]
    fn booking_leaves_counters_and_payment_debits() {
        let mut train = train("G79", TrainType::Bullet, SeatInventory::new(Some(5), Some(5), Some(2)));
        let before = train.inventory;

        let (mut order, mut tickets) = book_two(&train, "二等座");
        assert_eq!(train.inventory, before);
        assert_eq!(order.total_amount, tickets.iter().map(|t| t.price).sum::<Money>());

        assert!(take_seats(&mut train, "二等座", tickets.len() as u32));
        order.mark_paid("alipay", now()).unwrap();
        for ticket in &mut tickets {
            ticket.confirm_payment(now()).unwrap();
        }

        assert_eq!(train.available("二等座"), 0);
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.total_amount, tickets.iter().map(|t| t.price).sum::<Money>());
    }

    #[test]
    fn second_payer_is_rejected_without_mutation() {
        let mut train = train("G79", TrainType::Bullet, SeatInventory::new(Some(5), Some(5), Some(2)));
        book_two(&train, "二等座");
        book_two(&train, "二等座");

        assert!(take_seats(&mut train, "二等座", 2));
        assert!(!take_seats(&mut train, "二等座", 2));
        assert!(matches!(
            train.ensure_available("二等座", 2),
            Err(DomainError::InsufficientInventory { available: 0, .. })
        ));
        assert_eq!(train.available("二等座"), 0);
    }
}

mod cancellation {
    use super::*;

    #[test]
    fn cancel_one_of_two_keeps_order_paid() {
        let train = train("D1", TrainType::Express, SeatInventory::new(None, Some(4), Some(4)));
        let (mut order, mut tickets) = book_two(&train, "二等座");
        order.mark_paid("wechat", now()).unwrap();

        tickets[1].cancel(now()).unwrap();
        order.recompute_after_ticket_change(&tickets, now());

        assert_eq!(order.total_amount, Money::from_yuan(450));
        assert_eq!(order.status, OrderStatus::Paid);
    }

    #[test]
    fn cancel_last_ticket_cancels_order() {
        let train = train("D1", TrainType::Express, SeatInventory::new(None, Some(4), Some(4)));
        let (mut order, mut tickets) = book_two(&train, "二等座");
        order.mark_paid("wechat", now()).unwrap();

        for ticket in &mut tickets {
            ticket.cancel(now()).unwrap();
        }
        order.recompute_after_ticket_change(&tickets, now());

        assert_eq!(order.status, OrderStatus::Canceled);
        assert_eq!(order.canceled_at, Some(now()));
    }

    #[test]
    fn cancel_paid_order_restores_debited_seats() {
        let mut train = train("K7", TrainType::Regular, SeatInventory::new(Some(3), Some(3), Some(3)));
        let before = train.inventory;
        let (mut order, mut tickets) = book_two(&train, "硬卧");
        assert!(take_seats(&mut train, "硬卧", 2));
        order.mark_paid("cash", now()).unwrap();

        let prior = order.cancel(now()).unwrap();
        for ticket in &mut tickets {
            ticket.cancel(now()).unwrap();
        }
        if prior.holds_inventory() {
            return_seats(&mut train, "硬卧", tickets.len() as u32);
        }
        assert_eq!(train.inventory, before);
    }
}

mod rebooking {
    use super::*;

    #[test]
    fn rebook_is_seat_neutral_across_trains() {
        let mut original = train("G1", TrainType::Bullet, SeatInventory::new(Some(2), Some(2), Some(2)));
        let mut target = train("G3", TrainType::Bullet, SeatInventory::new(Some(2), Some(2), Some(2)));
        let (mut order, mut tickets) = book_two(&original, "二等座");
        assert!(take_seats(&mut original, "二等座", 2));
        order.mark_paid("alipay", now()).unwrap();
        let total_before = original.seat_count() + target.seat_count();

        assert!(evaluate_change(&tickets[0], now()).unwrap().can_change());
        return_seats(&mut original, "二等座", 1);
        assert!(take_seats(&mut target, "一等座", 1));
        let successor = tickets[0].successor(issue(
            &target,
            order.id,
            order.user_id,
            "一等座",
            1,
            tickets[0].travel_date + Duration::days(1),
        ));
        tickets[0].mark_changed(now()).unwrap();

        assert_eq!(original.seat_count() + target.seat_count(), total_before);
        assert_eq!(tickets[0].status, TicketStatus::Changed);
        assert_eq!(successor.passenger_id, tickets[0].passenger_id);
        assert_eq!(successor.price, Money::from_yuan(540));
        assert_eq!(successor.start_city, "北京");
        assert_eq!(successor.end_city, "郑州");

        tickets.push(successor);
        order.recompute_after_ticket_change(&tickets, now());
        assert_eq!(order.total_amount, Money::from_yuan(990));
    }
}

mod rules {
    use super::*;

    #[test]
    fn refund_after_cancel_is_refused() {
        let train = train("G1", TrainType::Bullet, SeatInventory::new(Some(2), Some(2), Some(2)));
        let (_, mut tickets) = book_two(&train, "二等座");

        let quote = evaluate_refund(&tickets[0], now()).unwrap();
        // departure is three days out
        assert!(matches!(quote.outcome, RefundOutcome::Refundable { .. }));
        assert_eq!(quote.fee(), Some(Money::from_fen(2250)));

        tickets[0].cancel(now()).unwrap();
        let quote = evaluate_refund(&tickets[0], now()).unwrap();
        assert_eq!(quote.refusal(), Some(Refusal::AlreadyChangedOrRefunded));
    }

    #[test]
    fn ticket_serializes_with_snapshot_fields() {
        let train = train("G1", TrainType::Bullet, SeatInventory::new(Some(2), Some(2), Some(2)));
        let (_, tickets) = book_two(&train, "商务座");
        let json = serde_json::to_value(&tickets[0]).unwrap();
        assert_eq!(json["seat_info"], "1车1号座");
        assert_eq!(json["train_code"], "G1");
        assert_eq!(json["status"], "Active");
    }
}
