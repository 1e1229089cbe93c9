#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use futsal_booking::adapters::mock;
use futsal_booking::application::booking::ServiceDependencies;
use futsal_booking::config::{BookingConfig, DatabaseConfig};
use futsal_booking::domain::{
    BookingId, BookingType, CourtId, TimeOfDay, UserId, VenueId, commands::*,
};
use futsal_booking::ports::{Court, Venue};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;

/// テスト用データベースプールを作成し、マイグレーションを実行
///
/// DATABASE_URL環境変数（未設定ならローカルの futsal_booking）に接続し、
/// sqlx migrateを使用してマイグレーションを適用します。
pub async fn create_test_pool() -> PgPool {
    let config = DatabaseConfig::from_env();
    let pool = futsal_booking::adapters::postgres::connect(&config)
        .await
        .expect("Failed to connect to test database");

    futsal_booking::adapters::postgres::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// テストログを出力する（RUST_LOG で制御）
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 予約を行う「現在時刻」
pub fn requested_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 30, 10, 0, 0).unwrap()
}

/// 予約対象日
pub fn booking_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

pub fn time(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

pub fn hourly_rate() -> Decimal {
    Decimal::new(1000, 0)
}

pub fn peak_hour_rate() -> Decimal {
    Decimal::new(1500, 0)
}

/// モックを組み立てたテスト環境
///
/// 施設1つ（オーナー付き）とコート1面（定員10、06:00〜24:00）を登録済み。
pub struct TestEnv {
    pub repository: Arc<mock::BookingRepository>,
    pub courts: Arc<mock::CourtDirectory>,
    pub users: Arc<mock::UserDirectory>,
    pub notifications: Arc<mock::NotificationService>,
    pub deps: ServiceDependencies,
    pub owner_id: UserId,
    pub venue_id: VenueId,
    pub court_id: CourtId,
}

impl TestEnv {
    pub fn new() -> Self {
        init_tracing();

        let repository = Arc::new(mock::BookingRepository::new());
        let courts = Arc::new(mock::CourtDirectory::new());
        let users = Arc::new(mock::UserDirectory::new());
        let notifications = Arc::new(mock::NotificationService::new());

        let owner_id = UserId::new();
        let venue_id = VenueId::new();
        let court_id = CourtId::new();

        courts.add_venue(Venue {
            venue_id,
            owner_id,
            name: "Downtown Futsal".to_string(),
            location: "Kathmandu".to_string(),
        });
        courts.add_court(court(court_id, venue_id));
        users.add_user(owner_id, "Venue Owner");

        let deps = ServiceDependencies {
            booking_repository: repository.clone(),
            court_directory: courts.clone(),
            user_directory: users.clone(),
            notification_service: notifications.clone(),
            config: BookingConfig::default(),
        };

        Self {
            repository,
            courts,
            users,
            notifications,
            deps,
            owner_id,
            venue_id,
            court_id,
        }
    }

    /// 名前付きのユーザーを登録して返す
    pub fn user(&self, name: &str) -> UserId {
        let user_id = UserId::new();
        self.users.add_user(user_id, name);
        user_id
    }

    /// 別のオーナーの施設とコートを登録し、(オーナー, コート) を返す
    pub fn other_venue(&self) -> (UserId, CourtId) {
        let owner_id = self.user("Other Owner");
        let venue_id = VenueId::new();
        let court_id = CourtId::new();
        self.courts.add_venue(Venue {
            venue_id,
            owner_id,
            name: "Uptown Arena".to_string(),
            location: "Lalitpur".to_string(),
        });
        self.courts.add_court(court(court_id, venue_id));
        (owner_id, court_id)
    }

    pub fn create_cmd(&self, created_by: UserId, start: &str, end: &str) -> CreateBooking {
        CreateBooking {
            created_by,
            court_id: self.court_id,
            date: booking_date(),
            start_time: time(start),
            end_time: time(end),
            booking_type: BookingType::PartialTeam,
            group_type: None,
            max_players: None,
            requested_at: requested_at(),
        }
    }

    pub fn join_cmd(&self, booking_id: BookingId, user_id: UserId) -> JoinBooking {
        JoinBooking {
            booking_id,
            user_id,
            joined_at: requested_at(),
        }
    }
}

pub fn court(court_id: CourtId, venue_id: VenueId) -> Court {
    Court {
        court_id,
        venue_id,
        name: "Court A".to_string(),
        size: "5-a-side".to_string(),
        is_active: true,
        hourly_rate: hourly_rate(),
        peak_hour_rate: peak_hour_rate(),
        max_players: 10,
        opening_time: time("06:00"),
        closing_time: time("24:00"),
    }
}
