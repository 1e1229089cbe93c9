//! PostgreSQLアダプターのテスト
//!
//! DATABASE_URL（未設定ならローカルの futsal_booking）のデータベースを使う。

mod common;

use common::*;
use futsal_booking::adapters::postgres::PostgresBookingRepository;
use futsal_booking::domain::{
    self, Booking, BookingId, BookingStatus, CourtId, PeakHours, UserId, VenueId, commands::*,
};
use futsal_booking::ports::{
    BookingFilter, BookingRepository, InsertOutcome, PublicMatchQuery, UpdateOutcome,
};
use sqlx::PgPool;

/// テストデータをクリーンアップ
async fn cleanup_court(pool: &PgPool, court_id: CourtId) {
    sqlx::query("DELETE FROM bookings WHERE court_id = $1")
        .bind(court_id.value())
        .execute(pool)
        .await
        .expect("Failed to cleanup test bookings");
}

/// テストごとに別のコートを使う
fn new_booking(court_id: CourtId, venue_id: VenueId, start: &str, end: &str) -> Booking {
    let cmd = CreateBooking {
        created_by: UserId::new(),
        court_id,
        date: booking_date(),
        start_time: time(start),
        end_time: time(end),
        booking_type: domain::BookingType::PartialTeam,
        group_type: None,
        max_players: Some(10),
        requested_at: requested_at(),
    };
    let terms = court(court_id, venue_id).terms();
    domain::create_booking(&cmd, &terms, &[], &PeakHours::default())
        .expect("Failed to build booking")
        .0
}

#[tokio::test]
async fn test_insert_and_get_by_id() {
    let pool = create_test_pool().await;
    let repository = PostgresBookingRepository::new(pool.clone());
    let court_id = CourtId::new();
    let booking = new_booking(court_id, VenueId::new(), "18:00", "19:30");

    let outcome = repository
        .insert_if_slot_free(&booking)
        .await
        .expect("Failed to insert booking");
    assert_eq!(outcome, InsertOutcome::Inserted);

    let stored = repository
        .get_by_id(booking.booking_id)
        .await
        .expect("Failed to get booking")
        .expect("Booking not found");

    assert_eq!(stored.booking_id, booking.booking_id);
    assert_eq!(stored.start_time, booking.start_time);
    assert_eq!(stored.end_time, booking.end_time);
    assert_eq!(stored.total_amount, booking.total_amount);
    assert_eq!(stored.status, BookingStatus::Pending);
    assert_eq!(stored.players, booking.players);
    assert_eq!(stored.created_at, booking.created_at);
    assert_eq!(stored.version, 1);

    let missing = repository
        .get_by_id(BookingId::new())
        .await
        .expect("Failed to get booking");
    assert!(missing.is_none());

    cleanup_court(&pool, court_id).await;
}

#[tokio::test]
async fn test_insert_overlapping_slot_is_rejected() {
    let pool = create_test_pool().await;
    let repository = PostgresBookingRepository::new(pool.clone());
    let court_id = CourtId::new();
    let venue_id = VenueId::new();

    let first = new_booking(court_id, venue_id, "18:00", "20:00");
    repository.insert_if_slot_free(&first).await.unwrap();

    let overlapping = new_booking(court_id, venue_id, "19:00", "21:00");
    let outcome = repository.insert_if_slot_free(&overlapping).await.unwrap();
    assert_eq!(
        outcome,
        InsertOutcome::SlotTaken {
            conflicting_booking_id: first.booking_id,
        }
    );

    // 隣接する枠は予約できる
    let adjacent = new_booking(court_id, venue_id, "20:00", "24:00");
    let outcome = repository.insert_if_slot_free(&adjacent).await.unwrap();
    assert_eq!(outcome, InsertOutcome::Inserted);

    let bookings = repository
        .find_by_court_and_date(court_id, booking_date())
        .await
        .unwrap();
    let ids: Vec<_> = bookings.iter().map(|b| b.booking_id).collect();
    assert_eq!(ids, vec![first.booking_id, adjacent.booking_id]);

    cleanup_court(&pool, court_id).await;
}

#[tokio::test]
async fn test_update_checks_version() {
    let pool = create_test_pool().await;
    let repository = PostgresBookingRepository::new(pool.clone());
    let court_id = CourtId::new();
    let booking = new_booking(court_id, VenueId::new(), "10:00", "11:00");
    repository.insert_if_slot_free(&booking).await.unwrap();

    let player = UserId::new();
    let joined_at = requested_at();
    let (mut joined, _) = domain::join_booking(&booking, player, joined_at).unwrap();
    joined.version = booking.version + 1;

    // 古いバージョンを期待した更新は失敗する
    let stale = booking.version + 5;
    let outcome = repository.update(&joined, stale).await.unwrap();
    assert_eq!(outcome, UpdateOutcome::VersionConflict);

    let outcome = repository.update(&joined, booking.version).await.unwrap();
    assert_eq!(outcome, UpdateOutcome::Updated);

    // 同じバージョンからの2回目の更新は競合になる
    let outcome = repository.update(&joined, booking.version).await.unwrap();
    assert_eq!(outcome, UpdateOutcome::VersionConflict);

    let stored = repository
        .get_by_id(booking.booking_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.active_player_count(), 2);

    // 参加者として検索できる
    let by_player = repository
        .find_by_user(player, &BookingFilter::default())
        .await
        .unwrap();
    assert_eq!(by_player.len(), 1);
    assert_eq!(by_player[0].booking_id, booking.booking_id);

    cleanup_court(&pool, court_id).await;
}

#[tokio::test]
async fn test_cancelled_booking_frees_slot_and_leaves_public_matches() {
    let pool = create_test_pool().await;
    let repository = PostgresBookingRepository::new(pool.clone());
    let court_id = CourtId::new();
    let venue_id = VenueId::new();
    let booking = new_booking(court_id, venue_id, "12:00", "13:00");
    repository.insert_if_slot_free(&booking).await.unwrap();

    let query = PublicMatchQuery {
        court_id: Some(court_id),
        ..Default::default()
    };
    let matches = repository
        .find_public_matches(&query, booking_date())
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);

    let (mut cancelled, _) = domain::cancel_booking(
        &booking,
        booking.created_by,
        "Cancelled by creator".to_string(),
        requested_at(),
    )
    .unwrap();
    cancelled.version = booking.version + 1;
    let outcome = repository.update(&cancelled, booking.version).await;
    assert_eq!(outcome.unwrap(), UpdateOutcome::Updated);

    let matches = repository
        .find_public_matches(&query, booking_date())
        .await
        .unwrap();
    assert!(matches.is_empty());

    let filter = BookingFilter {
        status: Some(BookingStatus::Cancelled),
        ..Default::default()
    };
    let by_venue = repository
        .find_by_venues(&[venue_id], &filter)
        .await
        .unwrap();
    assert_eq!(by_venue.len(), 1);
    assert_eq!(by_venue[0].cancelled_by, Some(booking.created_by));

    // キャンセル済みの枠には新しい予約を入れられる
    let replacement = new_booking(court_id, venue_id, "12:00", "13:00");
    let outcome = repository.insert_if_slot_free(&replacement).await.unwrap();
    assert_eq!(outcome, InsertOutcome::Inserted);

    cleanup_court(&pool, court_id).await;
}

#[tokio::test]
async fn test_completed_booking_keeps_its_slot() {
    let pool = create_test_pool().await;
    let repository = PostgresBookingRepository::new(pool.clone());
    let court_id = CourtId::new();
    let venue_id = VenueId::new();
    let booking = new_booking(court_id, venue_id, "20:00", "21:00");
    repository.insert_if_slot_free(&booking).await.unwrap();

    let owner = UserId::new();
    let at = requested_at();
    let (mut approved, _) = domain::approve_booking(&booking, owner, at).unwrap();
    approved.version = 2;
    repository.update(&approved, 1).await.unwrap();
    let (mut completed, _) = domain::complete_booking(&approved, owner, at).unwrap();
    completed.version = 3;
    repository.update(&completed, 2).await.unwrap();

    // 完了済みの予約も枠を占有する
    let bookings = repository
        .find_by_court_and_date(court_id, booking_date())
        .await
        .unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].status, BookingStatus::Completed);

    let again = new_booking(court_id, venue_id, "20:00", "21:00");
    let outcome = repository.insert_if_slot_free(&again).await.unwrap();
    assert_eq!(
        outcome,
        InsertOutcome::SlotTaken {
            conflicting_booking_id: booking.booking_id,
        }
    );

    cleanup_court(&pool, court_id).await;
}
