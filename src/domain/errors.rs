use chrono::NaiveDate;

use super::{BookingId, BookingStatus, TimeOfDay};

/// 状態遷移のエラー
///
/// 状態機械で許されない遷移（例: Cancelled → Confirmed）を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub from: BookingStatus,
    pub to: BookingStatus,
}

/// 予約作成のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateBookingError {
    /// 過去の日付
    PastDate { date: NaiveDate, today: NaiveDate },
    /// 終了時刻が開始時刻以前
    InvalidTimeRange { start: TimeOfDay, end: TimeOfDay },
    /// 最大人数が1未満、またはコートの定員を超える
    InvalidMaxPlayers { requested: u32, capacity: u32 },
    /// 既存の予約と時間枠が重なる
    SlotUnavailable { conflicting_booking_id: BookingId },
}

/// 参加のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinBookingError {
    /// 自分が作成した予約には参加できない
    CannotJoinOwnBooking,
    /// 既に参加中
    AlreadyJoined,
    /// 定員に達している
    BookingFull { max_players: u32 },
    /// 参加を受け付けない状態（Cancelled / Completed）
    BookingClosed { status: BookingStatus },
    /// プライベートグループに招待なしで参加しようとした
    NotInvited,
}

/// 離脱のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveBookingError {
    /// 参加中のプレイヤーではない（離脱済みを含む）
    NotActivePlayer,
    /// 作成者は離脱できない（キャンセルする必要がある）
    CreatorCannotLeave,
    /// 離脱を受け付けない状態
    BookingClosed { status: BookingStatus },
}

/// 招待のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteError {
    /// 招待者が参加中のプレイヤーではない
    NotParticipant,
    /// 招待を受け付けない状態
    BookingClosed { status: BookingStatus },
    /// 招待人数が空き枠を超える
    InsufficientSlots { available: u32, requested: u32 },
}

/// 招待辞退のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclineInviteError {
    /// 保留中の招待がない
    NoPendingInvite,
    /// 辞退を受け付けない状態
    BookingClosed { status: BookingStatus },
}

/// 作成者キャンセルのエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelBookingError {
    /// 作成者以外はキャンセルできない
    NotCreator,
    /// 終了状態からはキャンセルできない
    InvalidTransition(TransitionError),
}

impl From<TransitionError> for CancelBookingError {
    fn from(err: TransitionError) -> Self {
        CancelBookingError::InvalidTransition(err)
    }
}
