use crate::config::BookingConfig;
use crate::domain::{self, Booking, BookingEvent, BookingId, InviteSkipReason, UserId, commands::*};
use crate::ports::*;
use std::sync::Arc;

use super::details::{BookingDetails, build_details};
use super::errors::{BookingApplicationError, Result};
use super::notifications;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub booking_repository: Arc<dyn BookingRepository>,
    pub court_directory: Arc<dyn CourtDirectory>,
    pub user_directory: Arc<dyn UserDirectory>,
    pub notification_service: Arc<dyn NotificationService>,
    pub config: BookingConfig,
}

/// 参加の結果
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub details: BookingDetails,
    /// この参加で定員に達し、Confirmed になった
    pub auto_confirmed: bool,
}

/// 招待の結果
#[derive(Debug, Clone)]
pub struct InviteOutcome {
    pub details: BookingDetails,
    pub invited: Vec<UserId>,
    /// 参加中または招待済みのためスキップしたユーザー
    pub skipped: Vec<(UserId, InviteSkipReason)>,
}

/// 予約をストアから読み込むヘルパー関数
///
/// # エラー
/// - RepositoryError: 読み込み失敗
/// - BookingNotFound: 予約が存在しない
pub(super) async fn load_booking(
    deps: &ServiceDependencies,
    booking_id: BookingId,
) -> Result<Booking> {
    deps.booking_repository
        .get_by_id(booking_id)
        .await
        .map_err(BookingApplicationError::RepositoryError)?
        .ok_or(BookingApplicationError::BookingNotFound(booking_id))
}

/// 予約を読み込み、純粋関数で変更し、バージョン付きで保存する
///
/// 保存時にバージョンが競合した場合は読み込みからやり直す。
/// 変更は毎回最新の状態に対して検証されるため、同時に参加しても定員を超えない。
///
/// # エラー
/// - 変更関数のエラー（アプリケーションエラーに変換）
/// - ConcurrentModification: 再試行回数を超えて競合が続いた
pub(super) async fn modify_booking<F, T, E>(
    deps: &ServiceDependencies,
    booking_id: BookingId,
    mutate: F,
) -> Result<(Booking, T)>
where
    F: Fn(&Booking) -> std::result::Result<(Booking, T), E>,
    BookingApplicationError: From<E>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        let current = load_booking(deps, booking_id).await?;
        let (mut updated, output) = mutate(&current)?;
        updated.version = current.version + 1;

        let outcome = deps
            .booking_repository
            .update(&updated, current.version)
            .await
            .map_err(BookingApplicationError::RepositoryError)?;

        match outcome {
            UpdateOutcome::Updated => return Ok((updated, output)),
            UpdateOutcome::VersionConflict if attempts <= deps.config.max_update_retries => {
                tracing::debug!(
                    booking_id = %booking_id,
                    attempt = attempts,
                    "booking version conflict, retrying"
                );
            }
            UpdateOutcome::VersionConflict => {
                return Err(BookingApplicationError::ConcurrentModification {
                    booking_id,
                    attempts,
                });
            }
        }
    }
}

/// コートを予約する
///
/// ビジネスルール：
/// - コートが存在し、アクティブであること
/// - コートを所有する施設が存在すること
/// - 日付が今日以降、終了時刻 > 開始時刻、最大人数がコートの定員以下であること
/// - 同じコート・同じ日のキャンセルされていない予約と重ならないこと
///
/// 重複チェックは保存時にストアでもう一度アトミックに行う。
/// 同時に作成された予約に負けた場合も SlotUnavailable になる。
///
/// # 戻り値
/// 作成された予約の詳細
pub async fn create_booking(
    deps: &ServiceDependencies,
    cmd: CreateBooking,
) -> Result<BookingDetails> {
    // 1. コートの存在確認
    let court = deps
        .court_directory
        .get_court_by_id(cmd.court_id)
        .await
        .map_err(BookingApplicationError::CourtDirectoryError)?
        .filter(|court| court.is_active)
        .ok_or(BookingApplicationError::CourtNotFound(cmd.court_id))?;

    // 2. 施設の存在確認
    deps.court_directory
        .get_venue_by_id(court.venue_id)
        .await
        .map_err(BookingApplicationError::CourtDirectoryError)?
        .ok_or(BookingApplicationError::VenueNotFound(court.venue_id))?;

    // 3. 同じコート・同じ日の既存予約
    let existing = deps
        .booking_repository
        .find_by_court_and_date(cmd.court_id, cmd.date)
        .await
        .map_err(BookingApplicationError::RepositoryError)?;

    // 4. ドメインロジック実行（純粋関数）
    let (booking, event) =
        domain::create_booking(&cmd, &court.terms(), &existing, &deps.config.peak_hours)?;

    // 5. 重複チェック付きで保存
    let outcome = deps
        .booking_repository
        .insert_if_slot_free(&booking)
        .await
        .map_err(BookingApplicationError::RepositoryError)?;

    if let InsertOutcome::SlotTaken {
        conflicting_booking_id,
    } = outcome
    {
        return Err(BookingApplicationError::SlotUnavailable {
            conflicting_booking_id,
        });
    }

    tracing::info!(
        booking_id = %booking.booking_id,
        court_id = %booking.court_id,
        date = %booking.date,
        start_time = %booking.start_time,
        end_time = %booking.end_time,
        total_amount = %booking.total_amount,
        "booking created"
    );

    notifications::dispatch(deps, &booking, &BookingEvent::BookingCreated(event)).await;

    Ok(build_details(deps, booking).await)
}

/// 予約に参加する
///
/// ビジネスルールはドメインの `join_booking` を参照。
/// 定員に達した場合は自動で Confirmed になり、参加中の全員に通知する。
pub async fn join_booking(deps: &ServiceDependencies, cmd: JoinBooking) -> Result<JoinOutcome> {
    let (booking, event) = modify_booking(deps, cmd.booking_id, |booking| {
        domain::join_booking(booking, cmd.user_id, cmd.joined_at)
    })
    .await?;

    tracing::info!(
        booking_id = %booking.booking_id,
        user_id = %cmd.user_id,
        active_players = booking.active_player_count(),
        auto_confirmed = event.auto_confirmed,
        "player joined booking"
    );

    let auto_confirmed = event.auto_confirmed;
    notifications::dispatch(deps, &booking, &BookingEvent::PlayerJoined(event)).await;

    Ok(JoinOutcome {
        details: build_details(deps, booking).await,
        auto_confirmed,
    })
}

/// 予約から抜ける
///
/// 参加エントリは Left として残る。2回目の離脱はエラーになる。
pub async fn leave_booking(
    deps: &ServiceDependencies,
    cmd: LeaveBooking,
) -> Result<BookingDetails> {
    let (booking, event) = modify_booking(deps, cmd.booking_id, |booking| {
        domain::leave_booking(booking, cmd.user_id, cmd.left_at)
    })
    .await?;

    tracing::info!(
        booking_id = %booking.booking_id,
        user_id = %cmd.user_id,
        "player left booking"
    );

    notifications::dispatch(deps, &booking, &BookingEvent::PlayerLeft(event)).await;

    Ok(build_details(deps, booking).await)
}

/// プレイヤーを招待する
///
/// 参加中・招待済みのユーザーはスキップし、残りに招待を送る（一部成功を許す）。
pub async fn invite_players(
    deps: &ServiceDependencies,
    cmd: InvitePlayers,
) -> Result<InviteOutcome> {
    let (booking, event) = modify_booking(deps, cmd.booking_id, |booking| {
        domain::invite_players(booking, cmd.invited_by, &cmd.user_ids, cmd.invited_at)
    })
    .await?;

    tracing::info!(
        booking_id = %booking.booking_id,
        invited_by = %cmd.invited_by,
        invited = event.invited.len(),
        skipped = event.skipped.len(),
        "players invited"
    );

    let invited = event.invited.clone();
    let skipped = event.skipped.clone();
    notifications::dispatch(deps, &booking, &BookingEvent::PlayersInvited(event)).await;

    Ok(InviteOutcome {
        details: build_details(deps, booking).await,
        invited,
        skipped,
    })
}

/// 招待を辞退する
pub async fn decline_invite(
    deps: &ServiceDependencies,
    cmd: DeclineInvite,
) -> Result<BookingDetails> {
    let (booking, event) = modify_booking(deps, cmd.booking_id, |booking| {
        domain::decline_invite(booking, cmd.user_id, cmd.declined_at)
    })
    .await?;

    tracing::info!(
        booking_id = %booking.booking_id,
        user_id = %cmd.user_id,
        "invite declined"
    );

    notifications::dispatch(deps, &booking, &BookingEvent::InviteDeclined(event)).await;

    Ok(build_details(deps, booking).await)
}

/// 作成者が予約をキャンセルする
///
/// 理由が未指定なら設定のデフォルト理由を使う。
pub async fn cancel_booking(
    deps: &ServiceDependencies,
    cmd: CancelBooking,
) -> Result<BookingDetails> {
    let reason = cmd
        .reason
        .clone()
        .unwrap_or_else(|| deps.config.default_cancellation_reason.clone());

    let (booking, event) = modify_booking(deps, cmd.booking_id, |booking| {
        domain::cancel_booking(booking, cmd.cancelled_by, reason.clone(), cmd.cancelled_at)
    })
    .await?;

    tracing::info!(
        booking_id = %booking.booking_id,
        cancelled_by = %cmd.cancelled_by,
        reason = %event.reason,
        "booking cancelled by creator"
    );

    notifications::dispatch(deps, &booking, &BookingEvent::BookingCancelled(event)).await;

    Ok(build_details(deps, booking).await)
}
