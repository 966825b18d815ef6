//! Booking workflows on the PostgreSQL store, including concurrent callers.
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p booking --test postgres_workflows -- --test-threads=1
//! ```

use std::sync::Arc;

use booking::{
    BookRequest, BookingConfig, BookingError, BookingService, FixedClock, OrderDetail, PayRequest,
    RebookRequest,
};
use chrono::{NaiveDate, NaiveDateTime};
use common::{PassengerId, StationId, TrainId, UserId};
use domain::{
    Caller, DomainError, Money, OrderStatus, Passenger, SeatInventory, TicketStatus, Train,
    TrainType,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use ticket_store::{PostgresTicketStore, TicketStore};
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_ticketing_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

fn at(date: &str, time: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M").unwrap()
}

fn travel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()
}

struct TestHarness {
    service: BookingService<PostgresTicketStore>,
    store: PostgresTicketStore,
    user: Caller,
    passengers: Vec<PassengerId>,
    /// G7 上海虹桥站 → 北京南站, 二等座 2.
    bullet: Train,
    /// D311 上海站 → 北京站, 一等座 20 / 二等座 20.
    express: Train,
    /// D313 on the same route as D311, leaving later.
    express_later: Train,
}

impl TestHarness {
    async fn new() -> Self {
        let info = get_container_info().await;
        let store = PostgresTicketStore::connect(&info.connection_string, 8)
            .await
            .unwrap();
        sqlx::query("TRUNCATE TABLE tickets, orders, trains, stations, passengers, seat_counters")
            .execute(store.pool())
            .await
            .unwrap();

        let clock = Arc::new(FixedClock::new(at("2026-03-01", "08:00")));
        let service =
            BookingService::new(store.clone(), &BookingConfig::default()).with_clock(clock);

        let user = Caller::user(UserId::new());
        let mut passengers = Vec::new();
        for (name, card) in [
            ("赵六", "310101198801014321"),
            ("钱七", "310101199002025432"),
            ("孙八", "310101199203036543"),
        ] {
            let passenger = Passenger {
                id: PassengerId::new(),
                user_id: user.user_id,
                real_name: name.to_string(),
                card_id: card.to_string(),
            };
            store.insert_passenger(&passenger).await.unwrap();
            passengers.push(passenger.id);
        }

        let bullet = Train {
            id: TrainId::new(),
            code: "G7".to_string(),
            train_type: TrainType::Bullet,
            start_station_id: StationId::new(),
            end_station_id: StationId::new(),
            start_station: "上海虹桥站".to_string(),
            end_station: "北京南站".to_string(),
            start_time: "19:00".to_string(),
            end_time: "23:18".to_string(),
            duration_minutes: Some(258),
            price: Money::from_yuan(626),
            inventory: SeatInventory::new(Some(1), Some(3), Some(2)),
        };
        let express = Train {
            id: TrainId::new(),
            code: "D311".to_string(),
            train_type: TrainType::Express,
            start_station_id: StationId::new(),
            end_station_id: StationId::new(),
            start_station: "上海站".to_string(),
            end_station: "北京站".to_string(),
            start_time: "08:30".to_string(),
            end_time: "17:30".to_string(),
            duration_minutes: Some(540),
            price: Money::from_yuan(400),
            inventory: SeatInventory::new(None, Some(20), Some(20)),
        };
        let express_later = Train {
            id: TrainId::new(),
            code: "D313".to_string(),
            start_time: "19:34".to_string(),
            end_time: "07:24".to_string(),
            ..express.clone()
        };
        for train in [&bullet, &express, &express_later] {
            store.insert_train(train).await.unwrap();
        }

        Self {
            service,
            store,
            user,
            passengers,
            bullet,
            express,
            express_later,
        }
    }

    async fn book(&self, train: &Train, passengers: usize) -> OrderDetail {
        let request = BookRequest::new(
            train.id,
            train.start_station.clone(),
            train.end_station.clone(),
            self.passengers[..passengers].to_vec(),
        )
        .on(travel_date());
        self.service.book(self.user, request).await.unwrap()
    }

    async fn pay(&self, order_no: &str) -> Result<OrderDetail, BookingError> {
        self.service
            .pay(self.user, PayRequest::new(order_no, "alipay"))
            .await
    }

    async fn inventory(&self, train: &Train) -> SeatInventory {
        let mut tx = self.store.begin().await.unwrap();
        tx.find_train(train.id).await.unwrap().unwrap().inventory
    }

    async fn order_status(&self, order_no: &str) -> OrderStatus {
        let mut tx = self.store.begin().await.unwrap();
        tx.find_order_by_no(order_no).await.unwrap().unwrap().status
    }
}

#[tokio::test]
#[serial]
async fn lifecycle_moves_seats_and_persists_state() {
    let h = TestHarness::new().await;
    let booked = h.book(&h.express, 2).await;
    assert_eq!(h.inventory(&h.express).await, h.express.inventory);

    let paid = h.pay(&booked.order.order_no).await.unwrap();
    assert_eq!(paid.order.status, OrderStatus::Paid);
    assert_eq!(h.inventory(&h.express).await.low, Some(18));

    let rebooked = h
        .service
        .rebook(
            h.user,
            RebookRequest::new(
                &paid.tickets[0].ticket_no,
                h.express_later.id,
                "一等座",
                travel_date(),
            ),
        )
        .await
        .unwrap();
    assert_eq!(rebooked.original.status, TicketStatus::Changed);
    assert_eq!(h.inventory(&h.express).await.low, Some(19));
    assert_eq!(h.inventory(&h.express_later).await.mid, Some(19));

    let after = h
        .service
        .cancel_ticket(h.user, &rebooked.replacement.ticket_no)
        .await
        .unwrap();
    assert_eq!(after.order.status, OrderStatus::Paid);
    assert_eq!(after.tickets.len(), 3);
    assert_eq!(h.inventory(&h.express_later).await.mid, Some(20));

    let detail = h
        .service
        .order_detail(h.user, &booked.order.order_no)
        .await
        .unwrap();
    assert_eq!(detail.active_tickets().count(), 1);
}

#[tokio::test]
#[serial]
async fn concurrent_payments_of_one_order_take_seats_once() {
    let h = TestHarness::new().await;

    for round in 1..=5u32 {
        let booked = h.book(&h.express, 1).await;
        let order_no = booked.order.order_no.as_str();

        let (a, b) = tokio::join!(h.pay(order_no), h.pay(order_no));
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1, "round {round}");
        let err = a.err().or(b.err()).unwrap();
        assert!(matches!(
            err,
            BookingError::Domain(DomainError::InvalidOrderState {
                current: OrderStatus::Paid,
                ..
            })
        ));
        assert_eq!(h.inventory(&h.express).await.low, Some(20 - round));
    }
}

#[tokio::test]
#[serial]
async fn concurrent_payments_never_oversell() {
    let h = TestHarness::new().await;
    let first = h.book(&h.bullet, 1).await;
    let second = h.book(&h.bullet, 1).await;
    let third = h.book(&h.bullet, 1).await;

    let (a, b, c) = tokio::join!(
        h.pay(&first.order.order_no),
        h.pay(&second.order.order_no),
        h.pay(&third.order.order_no)
    );
    let results = [a, b, c];
    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 2);
    assert_eq!(h.inventory(&h.bullet).await.low, Some(0));

    let mut unpaid = 0;
    for order_no in [&first, &second, &third].map(|detail| detail.order.order_no.as_str()) {
        if h.order_status(order_no).await == OrderStatus::Unpaid {
            unpaid += 1;
        }
    }
    assert_eq!(unpaid, 1);
    let rejected = results.into_iter().find_map(Result::err).unwrap();
    assert!(rejected.is_retryable());
}

#[tokio::test]
#[serial]
async fn concurrent_cancels_of_one_ticket_return_one_seat() {
    let h = TestHarness::new().await;
    let booked = h.book(&h.express, 2).await;
    let paid = h.pay(&booked.order.order_no).await.unwrap();
    let ticket_no = paid.tickets[0].ticket_no.as_str();

    let (a, b) = tokio::join!(
        h.service.cancel_ticket(h.user, ticket_no),
        h.service.cancel_ticket(h.user, ticket_no)
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(h.inventory(&h.express).await.low, Some(19));
}

#[tokio::test]
#[serial]
async fn ticket_cancel_racing_payment_conserves_seats() {
    let h = TestHarness::new().await;
    let booked = h.book(&h.express, 2).await;

    let (canceled, paid) = tokio::join!(
        h.service
            .cancel_ticket(h.user, &booked.tickets[0].ticket_no),
        h.pay(&booked.order.order_no)
    );
    canceled.unwrap();
    paid.unwrap();

    // Whichever ran first, exactly one seat is sold.
    assert_eq!(h.inventory(&h.express).await.low, Some(19));
    assert_eq!(h.order_status(&booked.order.order_no).await, OrderStatus::Paid);
}
