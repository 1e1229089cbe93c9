use crate::domain::{Booking, BookingEvent, UserId};
use crate::ports::{Notification, NotificationKind};
use futures::future::join_all;
use serde_json::json;

use super::booking_service::ServiceDependencies;
use super::details::resolve_user;

/// 純粋関数：イベントから送るべき通知を組み立てる
///
/// 受信者：
/// - 参加：作成者へ PlayerJoined。定員に達したら参加中の全員へ BookingFull
/// - 離脱：作成者へ PlayerLeft
/// - 招待：招待された各ユーザーへ InviteReceived
/// - 招待辞退：招待者へ InviteDeclined
/// - 承認・却下・完了：参加中の全員へ
/// - 作成者キャンセル：作成者以外の参加中の全員へ
///
/// `booking` はイベント適用後の状態。`actor_name` は操作したユーザーの表示名。
pub fn notifications_for(
    event: &BookingEvent,
    booking: &Booking,
    actor_name: &str,
) -> Vec<Notification> {
    let booking_id = booking.booking_id;
    let notification = |user_id: UserId, kind: NotificationKind, metadata: serde_json::Value| {
        Notification {
            user_id,
            kind,
            booking_id,
            metadata,
        }
    };
    let active_players = || booking.active_players().map(|p| p.user_id);

    match event {
        BookingEvent::BookingCreated(_) => Vec::new(),
        BookingEvent::PlayerJoined(e) => {
            let mut out = vec![notification(
                booking.created_by,
                NotificationKind::PlayerJoined,
                json!({ "player_id": e.user_id, "player_name": actor_name }),
            )];
            if e.auto_confirmed {
                out.extend(active_players().map(|user_id| {
                    notification(
                        user_id,
                        NotificationKind::BookingFull,
                        json!({ "max_players": booking.max_players }),
                    )
                }));
            }
            out
        }
        BookingEvent::PlayerLeft(e) => vec![notification(
            booking.created_by,
            NotificationKind::PlayerLeft,
            json!({ "player_id": e.user_id, "player_name": actor_name }),
        )],
        BookingEvent::PlayersInvited(e) => e
            .invited
            .iter()
            .map(|&user_id| {
                notification(
                    user_id,
                    NotificationKind::InviteReceived,
                    json!({ "invited_by": e.invited_by, "inviter_name": actor_name }),
                )
            })
            .collect(),
        BookingEvent::InviteDeclined(e) => vec![notification(
            e.invited_by,
            NotificationKind::InviteDeclined,
            json!({ "player_id": e.user_id, "player_name": actor_name }),
        )],
        BookingEvent::BookingApproved(_) => active_players()
            .map(|user_id| notification(user_id, NotificationKind::BookingConfirmed, json!({})))
            .collect(),
        BookingEvent::BookingCancelled(e) => active_players()
            .filter(|&user_id| e.rejected_by_owner || user_id != e.cancelled_by)
            .map(|user_id| {
                notification(
                    user_id,
                    NotificationKind::BookingCancelled,
                    json!({ "reason": e.reason, "rejected_by_owner": e.rejected_by_owner }),
                )
            })
            .collect(),
        BookingEvent::BookingCompleted(_) => active_players()
            .map(|user_id| notification(user_id, NotificationKind::BookingCompleted, json!({})))
            .collect(),
    }
}

/// イベントを起こしたユーザー
fn actor_of(event: &BookingEvent) -> UserId {
    match event {
        BookingEvent::BookingCreated(e) => e.created_by,
        BookingEvent::PlayerJoined(e) => e.user_id,
        BookingEvent::PlayerLeft(e) => e.user_id,
        BookingEvent::PlayersInvited(e) => e.invited_by,
        BookingEvent::InviteDeclined(e) => e.user_id,
        BookingEvent::BookingApproved(e) => e.approved_by,
        BookingEvent::BookingCancelled(e) => e.cancelled_by,
        BookingEvent::BookingCompleted(e) => e.completed_by,
    }
}

/// 通知を並行して送る（コミット後に呼ぶ）
///
/// 送信の失敗はログに残して捨てる。予約操作の結果には影響しない。
pub(super) async fn dispatch(deps: &ServiceDependencies, booking: &Booking, event: &BookingEvent) {
    let actor = resolve_user(deps, actor_of(event)).await;
    let notifications = notifications_for(event, booking, &actor.full_name);
    if notifications.is_empty() {
        return;
    }

    let results = join_all(notifications.into_iter().map(|notification| async move {
        let user_id = notification.user_id;
        let kind = notification.kind;
        (
            user_id,
            kind,
            deps.notification_service.notify(notification).await,
        )
    }))
    .await;

    for (user_id, kind, result) in results {
        if let Err(e) = result {
            tracing::warn!(
                booking_id = %booking.booking_id,
                user_id = %user_id,
                kind = kind.as_str(),
                error = %e,
                "failed to send notification"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        BookingCancelled, BookingType, CourtId, CourtRates, CourtTerms, GroupType, PeakHours,
        PlayerJoined, VenueId, commands::CreateBooking, create_booking, join_booking,
    };
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn booking(max_players: u32) -> Booking {
        let court = CourtTerms {
            court_id: CourtId::new(),
            venue_id: VenueId::new(),
            rates: CourtRates {
                hourly_rate: Decimal::new(1000, 0),
                peak_hour_rate: Decimal::new(1500, 0),
            },
            capacity: 10,
        };
        let cmd = CreateBooking {
            created_by: UserId::new(),
            court_id: court.court_id,
            date: "2025-06-01".parse().unwrap(),
            start_time: "10:00".parse().unwrap(),
            end_time: "11:00".parse().unwrap(),
            booking_type: BookingType::PartialTeam,
            group_type: Some(GroupType::Public),
            max_players: Some(max_players),
            requested_at: Utc.with_ymd_and_hms(2025, 5, 30, 9, 0, 0).unwrap(),
        };
        create_booking(&cmd, &court, &[], &PeakHours::default())
            .unwrap()
            .0
    }

    #[test]
    fn test_join_that_fills_booking_notifies_everyone() {
        let user = UserId::new();
        let (booking, event) = join_booking(&booking(2), user, Utc::now()).unwrap();

        let notifications =
            notifications_for(&BookingEvent::PlayerJoined(event), &booking, "Alice");

        assert_eq!(notifications.len(), 3);
        assert_eq!(notifications[0].user_id, booking.created_by);
        assert_eq!(notifications[0].kind, NotificationKind::PlayerJoined);
        assert_eq!(notifications[0].metadata["player_name"], "Alice");
        let full: Vec<_> = notifications
            .iter()
            .filter(|n| n.kind == NotificationKind::BookingFull)
            .map(|n| n.user_id)
            .collect();
        assert_eq!(full, vec![booking.created_by, user]);
    }

    #[test]
    fn test_join_without_filling_notifies_creator_only() {
        let b = booking(5);
        let event = PlayerJoined {
            booking_id: b.booking_id,
            user_id: UserId::new(),
            joined_at: Utc::now(),
            auto_confirmed: false,
            via_invite: false,
        };
        let notifications = notifications_for(&BookingEvent::PlayerJoined(event), &b, "Bob");
        assert_eq!(notifications.len(), 1);
    }

    #[test]
    fn test_creator_cancel_skips_creator() {
        let user = UserId::new();
        let (b, _) = join_booking(&booking(5), user, Utc::now()).unwrap();
        let event = BookingCancelled {
            booking_id: b.booking_id,
            cancelled_by: b.created_by,
            reason: "Rain".to_string(),
            cancelled_at: Utc::now(),
            rejected_by_owner: false,
        };

        let notifications = notifications_for(&BookingEvent::BookingCancelled(event), &b, "x");
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].user_id, user);
        assert_eq!(notifications[0].metadata["reason"], "Rain");
    }
}
