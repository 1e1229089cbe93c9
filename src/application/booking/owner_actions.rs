use crate::domain::{self, Booking, BookingEvent, UserId, commands::*};

use super::booking_service::{ServiceDependencies, load_booking, modify_booking};
use super::details::{BookingDetails, build_details};
use super::errors::{BookingApplicationError, Result};
use super::notifications;

/// 施設オーナーであることを確認するヘルパー関数
///
/// 予約のコート → コートを所有する施設 → 施設のオーナー の順に辿る。
///
/// # エラー
/// - CourtNotFound / VenueNotFound: コートまたは施設が存在しない
/// - NotVenueOwner: オーナーではない
async fn ensure_venue_owner(
    deps: &ServiceDependencies,
    booking: &Booking,
    owner_id: UserId,
) -> Result<()> {
    let court = deps
        .court_directory
        .get_court_by_id(booking.court_id)
        .await
        .map_err(BookingApplicationError::CourtDirectoryError)?
        .ok_or(BookingApplicationError::CourtNotFound(booking.court_id))?;

    let venue = deps
        .court_directory
        .get_venue_by_id(court.venue_id)
        .await
        .map_err(BookingApplicationError::CourtDirectoryError)?
        .ok_or(BookingApplicationError::VenueNotFound(court.venue_id))?;

    if venue.owner_id != owner_id {
        return Err(BookingApplicationError::NotVenueOwner);
    }
    Ok(())
}

/// 施設オーナーが予約を承認する
///
/// Pending → Confirmed。自動確定済みの予約ではサインオフのみ記録する。
/// 参加中の全員に確定を通知する。
pub async fn approve_booking(
    deps: &ServiceDependencies,
    cmd: ApproveBooking,
) -> Result<BookingDetails> {
    let current = load_booking(deps, cmd.booking_id).await?;
    ensure_venue_owner(deps, &current, cmd.owner_id).await?;

    let (booking, event) = modify_booking(deps, cmd.booking_id, |booking| {
        domain::approve_booking(booking, cmd.owner_id, cmd.approved_at)
    })
    .await?;

    tracing::info!(
        booking_id = %booking.booking_id,
        owner_id = %cmd.owner_id,
        "booking approved"
    );

    notifications::dispatch(deps, &booking, &BookingEvent::BookingApproved(event)).await;

    Ok(build_details(deps, booking).await)
}

/// 施設オーナーが予約を却下する
///
/// Pending / Confirmed → Cancelled。理由が未指定なら設定のデフォルト理由を使う。
/// 参加中の全員に理由付きで通知する。
pub async fn reject_booking(
    deps: &ServiceDependencies,
    cmd: RejectBooking,
) -> Result<BookingDetails> {
    let current = load_booking(deps, cmd.booking_id).await?;
    ensure_venue_owner(deps, &current, cmd.owner_id).await?;

    let reason = cmd
        .reason
        .clone()
        .unwrap_or_else(|| deps.config.default_rejection_reason.clone());

    let (booking, event) = modify_booking(deps, cmd.booking_id, |booking| {
        domain::reject_booking(booking, cmd.owner_id, reason.clone(), cmd.rejected_at)
    })
    .await?;

    tracing::info!(
        booking_id = %booking.booking_id,
        owner_id = %cmd.owner_id,
        reason = %event.reason,
        "booking rejected"
    );

    notifications::dispatch(deps, &booking, &BookingEvent::BookingCancelled(event)).await;

    Ok(build_details(deps, booking).await)
}

/// 施設オーナーが予約を完了にする
///
/// Confirmed → Completed のみ。Pending の予約は先に承認が必要。
pub async fn complete_booking(
    deps: &ServiceDependencies,
    cmd: CompleteBooking,
) -> Result<BookingDetails> {
    let current = load_booking(deps, cmd.booking_id).await?;
    ensure_venue_owner(deps, &current, cmd.owner_id).await?;

    let (booking, event) = modify_booking(deps, cmd.booking_id, |booking| {
        domain::complete_booking(booking, cmd.owner_id, cmd.completed_at)
    })
    .await?;

    tracing::info!(
        booking_id = %booking.booking_id,
        owner_id = %cmd.owner_id,
        "booking completed"
    );

    notifications::dispatch(deps, &booking, &BookingEvent::BookingCompleted(event)).await;

    Ok(build_details(deps, booking).await)
}
