use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BookingId, CourtId, TimeOfDay, UserId};

/// イベント：予約が作成された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCreated {
    pub booking_id: BookingId,
    pub court_id: CourtId,
    pub created_by: UserId,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// イベント：プレイヤーが参加した
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerJoined {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
    /// この参加で定員に達し、自動確定した
    pub auto_confirmed: bool,
    /// 招待を受諾しての参加
    pub via_invite: bool,
}

/// イベント：プレイヤーが抜けた
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLeft {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub left_at: DateTime<Utc>,
}

/// 招待をスキップした理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteSkipReason {
    /// 既に参加中
    AlreadyActive,
    /// 既に保留中の招待がある
    AlreadyInvited,
}

/// イベント：プレイヤーが招待された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayersInvited {
    pub booking_id: BookingId,
    pub invited_by: UserId,
    pub invited: Vec<UserId>,
    pub skipped: Vec<(UserId, InviteSkipReason)>,
    pub invited_at: DateTime<Utc>,
}

/// イベント：招待が辞退された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteDeclined {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub invited_by: UserId,
    pub declined_at: DateTime<Utc>,
}

/// イベント：施設オーナーが承認した
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingApproved {
    pub booking_id: BookingId,
    pub approved_by: UserId,
    pub approved_at: DateTime<Utc>,
}

/// イベント：予約がキャンセルされた（オーナー却下または作成者キャンセル）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCancelled {
    pub booking_id: BookingId,
    pub cancelled_by: UserId,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
    pub rejected_by_owner: bool,
}

/// イベント：予約が完了した
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCompleted {
    pub booking_id: BookingId,
    pub completed_by: UserId,
    pub completed_at: DateTime<Utc>,
}

/// ドメインイベント統合型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEvent {
    BookingCreated(BookingCreated),
    PlayerJoined(PlayerJoined),
    PlayerLeft(PlayerLeft),
    PlayersInvited(PlayersInvited),
    InviteDeclined(InviteDeclined),
    BookingApproved(BookingApproved),
    BookingCancelled(BookingCancelled),
    BookingCompleted(BookingCompleted),
}
