use async_trait::async_trait;
use common::{OrderId, PassengerId, StationId, TicketId, TrainId, UserId};
use domain::{
    Money, Order, OrderStatus, Passenger, SeatInventory, SeatTier, Station, Ticket, TicketStatus,
    Train, TrainType,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{SeatCounterKey, StoreTransaction, TicketStore},
};

const TRAIN_COLUMNS: &str = "id, code, train_type, start_station_id, end_station_id, \
     start_station, end_station, start_time, end_time, duration_minutes, price_fen, \
     high_seat_count, mid_seat_count, low_seat_count";

const ORDER_COLUMNS: &str = "id, order_no, user_id, total_amount_fen, status, payment_method, \
     created_at, paid_at, canceled_at";

const TICKET_COLUMNS: &str = "id, ticket_no, order_id, user_id, passenger_id, passenger_name, \
     passenger_card, train_id, train_code, train_type, start_station_id, end_station_id, \
     start_station, end_station, start_city, end_city, seat_class, coach, seat, seat_info, \
     price_fen, travel_date, start_time, end_time, duration_minutes, status, created_at, \
     updated_at";

/// PostgreSQL-backed ticket store implementation.
#[derive(Clone)]
pub struct PostgresTicketStore {
    pool: PgPool,
}

impl PostgresTicketStore {
    /// Creates a new PostgreSQL ticket store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool of at most `max_connections` to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("ticketing migrations applied");
        Ok(())
    }

    /// Adds or replaces a train in the catalogue.
    pub async fn insert_train(&self, train: &Train) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO trains ({TRAIN_COLUMNS}, seat_count) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             ON CONFLICT (id) DO UPDATE SET \
                 code = EXCLUDED.code, train_type = EXCLUDED.train_type, \
                 start_station_id = EXCLUDED.start_station_id, \
                 end_station_id = EXCLUDED.end_station_id, \
                 start_station = EXCLUDED.start_station, end_station = EXCLUDED.end_station, \
                 start_time = EXCLUDED.start_time, end_time = EXCLUDED.end_time, \
                 duration_minutes = EXCLUDED.duration_minutes, price_fen = EXCLUDED.price_fen, \
                 high_seat_count = EXCLUDED.high_seat_count, \
                 mid_seat_count = EXCLUDED.mid_seat_count, \
                 low_seat_count = EXCLUDED.low_seat_count, seat_count = EXCLUDED.seat_count"
        ))
        .bind(train.id.as_uuid())
        .bind(&train.code)
        .bind(train.train_type.as_str())
        .bind(train.start_station_id.as_uuid())
        .bind(train.end_station_id.as_uuid())
        .bind(&train.start_station)
        .bind(&train.end_station)
        .bind(&train.start_time)
        .bind(&train.end_time)
        .bind(train.duration_minutes.map(to_i32).transpose()?)
        .bind(train.price.fen())
        .bind(train.inventory.high.map(to_i32).transpose()?)
        .bind(train.inventory.mid.map(to_i32).transpose()?)
        .bind(train.inventory.low.map(to_i32).transpose()?)
        .bind(to_i32(train.seat_count())?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Adds or replaces a station in the catalogue.
    pub async fn insert_station(&self, station: &Station) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stations (id, name, city) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, city = EXCLUDED.city
            "#,
        )
        .bind(station.id.as_uuid())
        .bind(&station.name)
        .bind(&station.city)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Adds or replaces a passenger in the catalogue.
    pub async fn insert_passenger(&self, passenger: &Passenger) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO passengers (id, user_id, real_name, card_id) VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                real_name = EXCLUDED.real_name,
                card_id = EXCLUDED.card_id
            "#,
        )
        .bind(passenger.id.as_uuid())
        .bind(passenger.user_id.as_uuid())
        .bind(&passenger.real_name)
        .bind(&passenger.card_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TicketStore for PostgresTicketStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

/// Transaction handle. Rolled back by sqlx when dropped uncommitted.
struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

fn invalid(entity: &'static str, reason: impl Into<String>) -> StoreError {
    StoreError::InvalidRecord {
        entity,
        reason: reason.into(),
    }
}

fn to_i32(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| invalid("column", format!("{value} does not fit INTEGER")))
}

fn get_u32(row: &PgRow, entity: &'static str, column: &str) -> Result<u32> {
    let value: i32 = row.try_get(column)?;
    u32::try_from(value).map_err(|_| invalid(entity, format!("{column} is negative: {value}")))
}

fn get_opt_u32(row: &PgRow, entity: &'static str, column: &str) -> Result<Option<u32>> {
    let value: Option<i32> = row.try_get(column)?;
    value
        .map(|v| {
            u32::try_from(v).map_err(|_| invalid(entity, format!("{column} is negative: {v}")))
        })
        .transpose()
}

fn get_train_type(row: &PgRow, entity: &'static str) -> Result<TrainType> {
    let name: String = row.try_get("train_type")?;
    TrainType::parse(&name).ok_or_else(|| invalid(entity, format!("unknown train type {name:?}")))
}

fn tier_column(tier: SeatTier) -> &'static str {
    match tier {
        SeatTier::High => "high_seat_count",
        SeatTier::Mid => "mid_seat_count",
        SeatTier::Low => "low_seat_count",
    }
}

fn row_to_train(row: PgRow) -> Result<Train> {
    Ok(Train {
        id: TrainId::from_uuid(row.try_get::<Uuid, _>("id")?),
        code: row.try_get("code")?,
        train_type: get_train_type(&row, "train")?,
        start_station_id: StationId::from_uuid(row.try_get::<Uuid, _>("start_station_id")?),
        end_station_id: StationId::from_uuid(row.try_get::<Uuid, _>("end_station_id")?),
        start_station: row.try_get("start_station")?,
        end_station: row.try_get("end_station")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        duration_minutes: get_opt_u32(&row, "train", "duration_minutes")?,
        price: Money::from_fen(row.try_get("price_fen")?),
        inventory: SeatInventory::new(
            get_opt_u32(&row, "train", "high_seat_count")?,
            get_opt_u32(&row, "train", "mid_seat_count")?,
            get_opt_u32(&row, "train", "low_seat_count")?,
        ),
    })
}

fn row_to_order(row: PgRow) -> Result<Order> {
    let code: i16 = row.try_get("status")?;
    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_no: row.try_get("order_no")?,
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        total_amount: Money::from_fen(row.try_get("total_amount_fen")?),
        status: OrderStatus::from_code(code)
            .ok_or_else(|| invalid("order", format!("unknown status code {code}")))?,
        payment_method: row.try_get("payment_method")?,
        created_at: row.try_get("created_at")?,
        paid_at: row.try_get("paid_at")?,
        canceled_at: row.try_get("canceled_at")?,
    })
}

fn row_to_ticket(row: PgRow) -> Result<Ticket> {
    let code: i16 = row.try_get("status")?;
    Ok(Ticket {
        id: TicketId::from_uuid(row.try_get::<Uuid, _>("id")?),
        ticket_no: row.try_get("ticket_no")?,
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        passenger_id: PassengerId::from_uuid(row.try_get::<Uuid, _>("passenger_id")?),
        passenger_name: row.try_get("passenger_name")?,
        passenger_card: row.try_get("passenger_card")?,
        train_id: TrainId::from_uuid(row.try_get::<Uuid, _>("train_id")?),
        train_code: row.try_get("train_code")?,
        train_type: get_train_type(&row, "ticket")?,
        start_station_id: row
            .try_get::<Option<Uuid>, _>("start_station_id")?
            .map(StationId::from_uuid),
        end_station_id: row
            .try_get::<Option<Uuid>, _>("end_station_id")?
            .map(StationId::from_uuid),
        start_station: row.try_get("start_station")?,
        end_station: row.try_get("end_station")?,
        start_city: row.try_get("start_city")?,
        end_city: row.try_get("end_city")?,
        seat_class: row.try_get("seat_class")?,
        coach: get_u32(&row, "ticket", "coach")?,
        seat: get_u32(&row, "ticket", "seat")?,
        seat_info: row.try_get("seat_info")?,
        price: Money::from_fen(row.try_get("price_fen")?),
        travel_date: row.try_get("travel_date")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        duration_minutes: get_u32(&row, "ticket", "duration_minutes")?,
        status: TicketStatus::from_code(code)
            .ok_or_else(|| invalid("ticket", format!("unknown status code {code}")))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Maps a unique-number violation to `Duplicate`.
fn duplicate_or(
    err: sqlx::Error,
    constraint: &str,
    entity: &'static str,
    number: &str,
) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.constraint() == Some(constraint)
    {
        return StoreError::Duplicate {
            entity,
            number: number.to_string(),
        };
    }
    StoreError::Database(err)
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn find_train(&mut self, id: TrainId) -> Result<Option<Train>> {
        sqlx::query(&format!("SELECT {TRAIN_COLUMNS} FROM trains WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(row_to_train)
            .transpose()
    }

    async fn find_station(&mut self, id: StationId) -> Result<Option<Station>> {
        let row = sqlx::query("SELECT id, name, city FROM stations WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(|row| {
            Ok(Station {
                id: StationId::from_uuid(row.try_get::<Uuid, _>("id")?),
                name: row.try_get("name")?,
                city: row.try_get("city")?,
            })
        })
        .transpose()
    }

    async fn find_passenger(&mut self, id: PassengerId) -> Result<Option<Passenger>> {
        let row =
            sqlx::query("SELECT id, user_id, real_name, card_id FROM passengers WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await?;
        row.map(|row| {
            Ok(Passenger {
                id: PassengerId::from_uuid(row.try_get::<Uuid, _>("id")?),
                user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
                real_name: row.try_get("real_name")?,
                card_id: row.try_get("card_id")?,
            })
        })
        .transpose()
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(row_to_order)
            .transpose()
    }

    async fn find_order_by_no(&mut self, order_no: &str) -> Result<Option<Order>> {
        sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_no = $1 FOR UPDATE"
        ))
            .bind(order_no)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(row_to_order)
            .transpose()
    }

    async fn find_ticket_by_no(&mut self, ticket_no: &str) -> Result<Option<Ticket>> {
        sqlx::query(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_no = $1"))
            .bind(ticket_no)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(row_to_ticket)
            .transpose()
    }

    async fn find_tickets_by_order(&mut self, order_id: OrderId) -> Result<Vec<Ticket>> {
        let rows = sqlx::query(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE order_id = $1 \
             ORDER BY created_at ASC, ticket_no ASC"
        ))
        .bind(order_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(row_to_ticket).collect()
    }

    async fn save_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO UPDATE SET \
                 order_no = EXCLUDED.order_no, user_id = EXCLUDED.user_id, \
                 total_amount_fen = EXCLUDED.total_amount_fen, status = EXCLUDED.status, \
                 payment_method = EXCLUDED.payment_method, created_at = EXCLUDED.created_at, \
                 paid_at = EXCLUDED.paid_at, canceled_at = EXCLUDED.canceled_at"
        ))
        .bind(order.id.as_uuid())
        .bind(&order.order_no)
        .bind(order.user_id.as_uuid())
        .bind(order.total_amount.fen())
        .bind(order.status.code())
        .bind(&order.payment_method)
        .bind(order.created_at)
        .bind(order.paid_at)
        .bind(order.canceled_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| duplicate_or(e, "unique_order_no", "order", &order.order_no))?;
        Ok(())
    }

    async fn save_ticket(&mut self, ticket: &Ticket) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO tickets ({TICKET_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, \
              $19, $20, $21, $22, $23, $24, $25, $26, $27, $28) \
             ON CONFLICT (id) DO UPDATE SET \
                 ticket_no = EXCLUDED.ticket_no, order_id = EXCLUDED.order_id, \
                 user_id = EXCLUDED.user_id, passenger_id = EXCLUDED.passenger_id, \
                 passenger_name = EXCLUDED.passenger_name, \
                 passenger_card = EXCLUDED.passenger_card, train_id = EXCLUDED.train_id, \
                 train_code = EXCLUDED.train_code, train_type = EXCLUDED.train_type, \
                 start_station_id = EXCLUDED.start_station_id, \
                 end_station_id = EXCLUDED.end_station_id, \
                 start_station = EXCLUDED.start_station, end_station = EXCLUDED.end_station, \
                 start_city = EXCLUDED.start_city, end_city = EXCLUDED.end_city, \
                 seat_class = EXCLUDED.seat_class, coach = EXCLUDED.coach, seat = EXCLUDED.seat, \
                 seat_info = EXCLUDED.seat_info, price_fen = EXCLUDED.price_fen, \
                 travel_date = EXCLUDED.travel_date, start_time = EXCLUDED.start_time, \
                 end_time = EXCLUDED.end_time, duration_minutes = EXCLUDED.duration_minutes, \
                 status = EXCLUDED.status, created_at = EXCLUDED.created_at, \
                 updated_at = EXCLUDED.updated_at"
        ))
        .bind(ticket.id.as_uuid())
        .bind(&ticket.ticket_no)
        .bind(ticket.order_id.as_uuid())
        .bind(ticket.user_id.as_uuid())
        .bind(ticket.passenger_id.as_uuid())
        .bind(&ticket.passenger_name)
        .bind(&ticket.passenger_card)
        .bind(ticket.train_id.as_uuid())
        .bind(&ticket.train_code)
        .bind(ticket.train_type.as_str())
        .bind(ticket.start_station_id.map(|id| id.as_uuid()))
        .bind(ticket.end_station_id.map(|id| id.as_uuid()))
        .bind(&ticket.start_station)
        .bind(&ticket.end_station)
        .bind(&ticket.start_city)
        .bind(&ticket.end_city)
        .bind(&ticket.seat_class)
        .bind(to_i32(ticket.coach)?)
        .bind(to_i32(ticket.seat)?)
        .bind(&ticket.seat_info)
        .bind(ticket.price.fen())
        .bind(ticket.travel_date)
        .bind(&ticket.start_time)
        .bind(&ticket.end_time)
        .bind(to_i32(ticket.duration_minutes)?)
        .bind(ticket.status.code())
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| duplicate_or(e, "unique_ticket_no", "ticket", &ticket.ticket_no))?;
        Ok(())
    }

    async fn debit_seats(
        &mut self,
        train_id: TrainId,
        tier: SeatTier,
        count: u32,
    ) -> Result<bool> {
        let column = tier_column(tier);
        let result = sqlx::query(&format!(
            "UPDATE trains SET {column} = {column} - $2, seat_count = seat_count - $2 \
             WHERE id = $1 AND {column} >= $2"
        ))
        .bind(train_id.as_uuid())
        .bind(to_i32(count)?)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn credit_seats(&mut self, train_id: TrainId, tier: SeatTier, count: u32) -> Result<()> {
        let column = tier_column(tier);
        sqlx::query(&format!(
            "UPDATE trains SET {column} = {column} + $2, seat_count = seat_count + $2 \
             WHERE id = $1 AND {column} IS NOT NULL"
        ))
        .bind(train_id.as_uuid())
        .bind(to_i32(count)?)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn allocate_seats(&mut self, key: &SeatCounterKey, count: u32) -> Result<u32> {
        let allocated: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO seat_counters (train_id, travel_date, seat_class, allocated)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (train_id, travel_date, seat_class)
            DO UPDATE SET allocated = seat_counters.allocated + EXCLUDED.allocated
            RETURNING allocated
            "#,
        )
        .bind(key.train_id.as_uuid())
        .bind(key.travel_date)
        .bind(&key.seat_class)
        .bind(to_i32(count)?)
        .fetch_one(&mut *self.tx)
        .await?;

        let allocated = u32::try_from(allocated)
            .map_err(|_| invalid("seat counter", format!("allocated is negative: {allocated}")))?;
        Ok(allocated - count + 1)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
