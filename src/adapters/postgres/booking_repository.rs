use crate::domain::{
    Booking, BookingId, CourtId, Invite, Player, TimeOfDay, UserId, VenueId, schedule,
};
use crate::ports::booking_repository::{
    BookingFilter, BookingRepository as BookingRepositoryTrait, InsertOutcome, PublicMatchQuery,
    Result, UpdateOutcome,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row};
use std::io;
use std::str::FromStr;
use uuid::Uuid;

const BOOKING_COLUMNS: &str = r#"
    booking_id,
    court_id,
    venue_id,
    created_by,
    date,
    start_time,
    end_time,
    total_amount,
    booking_type,
    group_type,
    max_players,
    status,
    payment_status,
    owner_approved,
    owner_approved_at,
    players,
    invites,
    cancelled_at,
    cancelled_by,
    cancellation_reason,
    completed_at,
    created_at,
    updated_at,
    version
"#;

/// BookingFilter の条件（$2〜$9）
const FILTER_CLAUSE: &str = r#"
    AND ($2::varchar IS NULL OR status = $2)
    AND ($3::date IS NULL OR date = $3)
    AND ($4::date IS NULL OR date >= $4)
    AND ($5::date IS NULL OR date <= $5)
    AND ($6::uuid IS NULL OR court_id = $6)
    AND ($7::uuid IS NULL OR venue_id = $7)
    AND ($8::varchar IS NULL OR booking_type = $8)
    AND ($9::varchar IS NULL OR group_type = $9)
"#;

fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(io::Error::new(io::ErrorKind::InvalidData, message))
}

fn parse_column<T>(row: &PgRow, column: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value: &str = row.get(column);
    T::from_str(value).map_err(|e| invalid_data(format!("{}: {}", column, e)))
}

fn non_negative(row: &PgRow, column: &str) -> Result<u32> {
    let value: i32 = row.get(column);
    value
        .try_into()
        .map_err(|_| invalid_data(format!("{} out of range: {}", column, value)))
}

/// PostgreSQLの行データをBookingに変換する
///
/// 列挙型と時刻は文字列から、参加者と招待はJSONBから復元する。
fn map_row_to_booking(row: &PgRow) -> Result<Booking> {
    let start_time: TimeOfDay = parse_column(row, "start_time")?;
    let end_time: TimeOfDay = parse_column(row, "end_time")?;
    let players: Json<Vec<Player>> = row.try_get("players")?;
    let invites: Json<Vec<Invite>> = row.try_get("invites")?;
    let cancelled_by: Option<Uuid> = row.get("cancelled_by");

    Ok(Booking {
        booking_id: BookingId::from_uuid(row.get("booking_id")),
        court_id: CourtId::from_uuid(row.get("court_id")),
        venue_id: VenueId::from_uuid(row.get("venue_id")),
        created_by: UserId::from_uuid(row.get("created_by")),
        date: row.get("date"),
        start_time,
        end_time,
        total_amount: row.get("total_amount"),
        booking_type: parse_column(row, "booking_type")?,
        group_type: parse_column(row, "group_type")?,
        max_players: non_negative(row, "max_players")?,
        status: parse_column(row, "status")?,
        payment_status: parse_column(row, "payment_status")?,
        owner_approved: row.get("owner_approved"),
        owner_approved_at: row.get("owner_approved_at"),
        players: players.0,
        invites: invites.0,
        cancelled_at: row.get("cancelled_at"),
        cancelled_by: cancelled_by.map(UserId::from_uuid),
        cancellation_reason: row.get("cancellation_reason"),
        completed_at: row.get("completed_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: non_negative(row, "version")?,
    })
}

fn bind_filter<'q>(
    query: Query<'q, Postgres, PgArguments>,
    filter: &BookingFilter,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.date)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(filter.court_id.map(|c| c.value()))
        .bind(filter.venue_id.map(|v| v.value()))
        .bind(filter.booking_type.map(|t| t.as_str()))
        .bind(filter.group_type.map(|g| g.as_str()))
}

/// 同じコート・同じ日の作成を直列化するロックのキー
fn slot_lock_key(court_id: CourtId, date: NaiveDate) -> String {
    format!("bookings:{}:{}", court_id, date)
}

/// BookingRepositoryのPostgreSQL実装
///
/// 参加者と招待はJSONB列に埋め込み、version列で楽観的ロックを行う。
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// PostgreSQLコネクションプールから新しいBookingRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepositoryTrait for BookingRepository {
    /// 重複チェック付きで予約を保存
    ///
    /// トランザクション内で (court_id, date) のアドバイザリロックを取り、
    /// 既存予約の読み込みから INSERT までを他の作成と直列化する。
    async fn insert_if_slot_free(&self, booking: &Booking) -> Result<InsertOutcome> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(slot_lock_key(booking.court_id, booking.date))
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            "SELECT {} FROM bookings WHERE court_id = $1 AND date = $2 AND status <> 'cancelled'",
            BOOKING_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(booking.court_id.value())
            .bind(booking.date)
            .fetch_all(&mut *tx)
            .await?;
        let existing = rows
            .iter()
            .map(map_row_to_booking)
            .collect::<Result<Vec<_>>>()?;

        let slot = booking.slot();
        let taken: Vec<_> = existing.iter().map(|b| (b.booking_id, b.slot())).collect();
        if let Some(conflicting_booking_id) =
            schedule::find_conflict(&slot, taken.iter().map(|(id, s)| (*id, s)))
        {
            return Ok(InsertOutcome::SlotTaken {
                conflicting_booking_id,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO bookings (
                booking_id,
                court_id,
                venue_id,
                created_by,
                date,
                start_time,
                end_time,
                total_amount,
                booking_type,
                group_type,
                max_players,
                status,
                payment_status,
                owner_approved,
                owner_approved_at,
                players,
                invites,
                cancelled_at,
                cancelled_by,
                cancellation_reason,
                completed_at,
                created_at,
                updated_at,
                version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
            "#,
        )
        .bind(booking.booking_id.value())
        .bind(booking.court_id.value())
        .bind(booking.venue_id.value())
        .bind(booking.created_by.value())
        .bind(booking.date)
        .bind(booking.start_time.to_string())
        .bind(booking.end_time.to_string())
        .bind(booking.total_amount)
        .bind(booking.booking_type.as_str())
        .bind(booking.group_type.as_str())
        .bind(booking.max_players as i32)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.owner_approved)
        .bind(booking.owner_approved_at)
        .bind(Json(&booking.players))
        .bind(Json(&booking.invites))
        .bind(booking.cancelled_at)
        .bind(booking.cancelled_by.map(|u| u.value()))
        .bind(booking.cancellation_reason.as_deref())
        .bind(booking.completed_at)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .bind(booking.version as i32)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(InsertOutcome::Inserted)
    }

    async fn get_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE booking_id = $1",
            BOOKING_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(booking_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_booking).transpose()
    }

    /// バージョン付きで予約を更新
    ///
    /// 予約作成後に変わりうる列のみを更新する。
    /// `WHERE version = $n` に一致しなければ0行更新となり、競合として返す。
    async fn update(&self, booking: &Booking, expected_version: u32) -> Result<UpdateOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = $2,
                payment_status = $3,
                owner_approved = $4,
                owner_approved_at = $5,
                players = $6,
                invites = $7,
                cancelled_at = $8,
                cancelled_by = $9,
                cancellation_reason = $10,
                completed_at = $11,
                updated_at = $12,
                version = $13
            WHERE booking_id = $1 AND version = $14
            "#,
        )
        .bind(booking.booking_id.value())
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.owner_approved)
        .bind(booking.owner_approved_at)
        .bind(Json(&booking.players))
        .bind(Json(&booking.invites))
        .bind(booking.cancelled_at)
        .bind(booking.cancelled_by.map(|u| u.value()))
        .bind(booking.cancellation_reason.as_deref())
        .bind(booking.completed_at)
        .bind(booking.updated_at)
        .bind(booking.version as i32)
        .bind(expected_version as i32)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(UpdateOutcome::Updated)
        } else {
            Ok(UpdateOutcome::VersionConflict)
        }
    }

    async fn find_by_court_and_date(
        &self,
        court_id: CourtId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE court_id = $1 AND date = $2 AND status <> 'cancelled'
            ORDER BY start_time ASC
            "#,
            BOOKING_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(court_id.value())
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_row_to_booking).collect()
    }

    /// 作成者、または players に参加中のエントリを持つ予約
    ///
    /// JSONBの包含演算子で (players, jsonb_path_ops) のGINインデックスを使う。
    async fn find_by_user(&self, user_id: UserId, filter: &BookingFilter) -> Result<Vec<Booking>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE (
                created_by = $1
                OR players @> jsonb_build_array(
                    jsonb_build_object('user_id', $1::uuid, 'status', 'active')
                )
            )
            {}
            ORDER BY date ASC, start_time ASC
            "#,
            BOOKING_COLUMNS, FILTER_CLAUSE
        );
        let query = sqlx::query(&sql).bind(user_id.value());
        let rows = bind_filter(query, filter).fetch_all(&self.pool).await?;

        rows.iter().map(map_row_to_booking).collect()
    }

    async fn find_by_venues(
        &self,
        venue_ids: &[VenueId],
        filter: &BookingFilter,
    ) -> Result<Vec<Booking>> {
        let ids: Vec<Uuid> = venue_ids.iter().map(|v| v.value()).collect();
        let sql = format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE venue_id = ANY($1)
            {}
            ORDER BY date ASC, start_time ASC
            "#,
            BOOKING_COLUMNS, FILTER_CLAUSE
        );
        let query = sqlx::query(&sql).bind(ids);
        let rows = bind_filter(query, filter).fetch_all(&self.pool).await?;

        rows.iter().map(map_row_to_booking).collect()
    }

    async fn find_public_matches(
        &self,
        query: &PublicMatchQuery,
        today: NaiveDate,
    ) -> Result<Vec<Booking>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM bookings
            WHERE group_type = 'public'
              AND status IN ('pending', 'confirmed')
              AND (($1::date IS NULL AND date >= $2) OR date = $1)
              AND ($3::uuid IS NULL OR court_id = $3)
              AND ($4::uuid IS NULL OR venue_id = $4)
              AND ($5::varchar IS NULL OR booking_type = $5)
            ORDER BY date ASC, start_time ASC
            "#,
            BOOKING_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(query.date)
            .bind(today)
            .bind(query.court_id.map(|c| c.value()))
            .bind(query.venue_id.map(|v| v.value()))
            .bind(query.booking_type.map(|t| t.as_str()))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_row_to_booking).collect()
    }
}
