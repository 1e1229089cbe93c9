use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{BookingId, BookingType, CourtId, GroupType, TimeOfDay, UserId};

/// コマンド：コートを予約する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBooking {
    pub created_by: UserId,
    pub court_id: CourtId,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub booking_type: BookingType,
    /// 未指定なら public
    pub group_type: Option<GroupType>,
    /// 未指定ならコートの定員
    pub max_players: Option<u32>,
    pub requested_at: DateTime<Utc>,
}

/// コマンド：予約（試合）に参加する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinBooking {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
}

/// コマンド：予約から抜ける
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBooking {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub left_at: DateTime<Utc>,
}

/// コマンド：プレイヤーを招待する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitePlayers {
    pub booking_id: BookingId,
    pub invited_by: UserId,
    pub user_ids: Vec<UserId>,
    pub invited_at: DateTime<Utc>,
}

/// コマンド：招待を辞退する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineInvite {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub declined_at: DateTime<Utc>,
}

/// コマンド：作成者が予約をキャンセルする
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelBooking {
    pub booking_id: BookingId,
    pub cancelled_by: UserId,
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

/// コマンド：施設オーナーが予約を承認する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveBooking {
    pub booking_id: BookingId,
    pub owner_id: UserId,
    pub approved_at: DateTime<Utc>,
}

/// コマンド：施設オーナーが予約を却下する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectBooking {
    pub booking_id: BookingId,
    pub owner_id: UserId,
    pub reason: Option<String>,
    pub rejected_at: DateTime<Utc>,
}

/// コマンド：施設オーナーが予約を完了にする
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteBooking {
    pub booking_id: BookingId,
    pub owner_id: UserId,
    pub completed_at: DateTime<Utc>,
}
