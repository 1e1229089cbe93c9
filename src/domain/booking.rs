use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::pricing::{self, CourtRates, PeakHours};
use super::schedule::{self, TimeSlot};
use super::{
    BookingApproved, BookingCancelled, BookingCompleted, BookingCreated, BookingId,
    CancelBookingError, CourtId, CreateBookingError, DeclineInviteError, InviteDeclined,
    InviteError, InviteSkipReason, JoinBookingError, LeaveBookingError, PlayerJoined, PlayerLeft,
    PlayersInvited, TimeOfDay, TransitionError, UserId, VenueId, commands::CreateBooking,
};

// ============================================================================
// 列挙型
// ============================================================================

/// 予約ステータス
///
/// 状態機械：
/// - Pending → Confirmed（定員到達による自動確定、またはオーナー承認）
/// - Pending → Cancelled（オーナー却下、作成者キャンセル）
/// - Confirmed → Cancelled（確定後の却下も可能）
/// - Confirmed → Completed（オーナーが完了にする）
///
/// Cancelled と Completed は終了状態で、そこからの遷移はない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// 終了状態か
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// 参加・離脱・招待を受け付ける状態か
    pub fn allows_roster_changes(&self) -> bool {
        !self.is_terminal()
    }

    /// 状態機械で許された遷移か
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;

        match (self, next) {
            (Pending, Confirmed) => true,
            (Pending, Cancelled) => true,
            (Confirmed, Cancelled) => true,
            (Confirmed, Completed) => true,
            (Pending, Pending | Completed) => false,
            (Confirmed, Pending | Confirmed) => false,
            (Cancelled, _) => false,
            (Completed, _) => false,
        }
    }

    /// 遷移を検証して次の状態を返す
    pub fn transition_to(self, next: BookingStatus) -> Result<BookingStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }
}

/// 予約種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    /// チーム全員で予約
    FullTeam,
    /// 一部のメンバーで予約し、残りを募集
    PartialTeam,
    /// 個人で予約し、他のプレイヤーを募集
    Solo,
}

impl BookingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::FullTeam => "full_team",
            BookingType::PartialTeam => "partial_team",
            BookingType::Solo => "solo",
        }
    }
}

impl std::str::FromStr for BookingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_team" => Ok(BookingType::FullTeam),
            "partial_team" => Ok(BookingType::PartialTeam),
            "solo" => Ok(BookingType::Solo),
            _ => Err(format!("Invalid booking type: {}", s)),
        }
    }
}

/// グループ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    /// 誰でも参加できる
    #[default]
    Public,
    /// 招待されたプレイヤーのみ参加できる
    Private,
}

impl GroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::Public => "public",
            GroupType::Private => "private",
        }
    }
}

impl std::str::FromStr for GroupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(GroupType::Public),
            "private" => Ok(GroupType::Private),
            _ => Err(format!("Invalid group type: {}", s)),
        }
    }
}

/// 支払いステータス（記録のみ。このエンジンでは照合しない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// 参加者エントリのステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Active,
    Left,
    Removed,
}

/// 招待のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Rejected,
}

// ============================================================================
// 集約
// ============================================================================

/// 参加者エントリ
///
/// 離脱してもエントリは削除せず、ステータスを Left にして残す（監査用）。
/// 再参加時は新しいエントリを追加する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub is_admin: bool,
    pub status: PlayerStatus,
}

impl Player {
    pub fn is_active(&self) -> bool {
        self.status == PlayerStatus::Active
    }
}

/// 招待
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub user_id: UserId,
    pub invited_by: UserId,
    pub status: InviteStatus,
    pub invited_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Booking集約 - 1コート・1日・1時間枠の予約と、その参加者・招待
///
/// 不変条件：
/// - 参加中（Active）のプレイヤー数 ≤ max_players
/// - 作成者は is_admin = true のエントリを1つだけ持ち、離脱できない
/// - 同じコート・同じ日のキャンセルされていない予約同士は時間枠が重ならない
/// - プライベートグループへの参加は保留中の招待経由のみ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    // 識別子
    pub booking_id: BookingId,

    // 他の集約への参照（IDのみ）
    pub court_id: CourtId,
    pub venue_id: VenueId,
    pub created_by: UserId,

    // 予約枠
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub total_amount: Decimal,

    // 分類
    pub booking_type: BookingType,
    pub group_type: GroupType,
    pub max_players: u32,

    // 状態
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub owner_approved: bool,
    pub owner_approved_at: Option<DateTime<Utc>>,

    pub players: Vec<Player>,
    pub invites: Vec<Invite>,

    // キャンセル・完了情報
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<UserId>,
    pub cancellation_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,

    // 監査情報
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// 楽観的ロック用のバージョン（永続化のたびに1増える）
    pub version: u32,
}

impl Booking {
    /// 予約の時間枠
    pub fn slot(&self) -> TimeSlot {
        TimeSlot {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// 参加中のプレイヤー
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_active())
    }

    pub fn active_player_count(&self) -> u32 {
        self.active_players().count() as u32
    }

    /// 空き枠 = max_players - 参加中の人数
    pub fn available_slots(&self) -> u32 {
        self.max_players.saturating_sub(self.active_player_count())
    }

    pub fn is_full(&self) -> bool {
        self.active_player_count() >= self.max_players
    }

    pub fn is_creator(&self, user_id: UserId) -> bool {
        self.created_by == user_id
    }

    pub fn is_active_player(&self, user_id: UserId) -> bool {
        self.active_players().any(|p| p.user_id == user_id)
    }

    /// ユーザー宛ての保留中の招待
    pub fn pending_invite(&self, user_id: UserId) -> Option<&Invite> {
        self.invites
            .iter()
            .find(|i| i.user_id == user_id && i.status == InviteStatus::Pending)
    }

    /// 作成者または参加中のプレイヤーか
    pub fn involves(&self, user_id: UserId) -> bool {
        self.is_creator(user_id) || self.is_active_player(user_id)
    }

    /// コート・日付の枠を占有しているか（キャンセル済みは占有しない）
    pub fn occupies(&self, court_id: CourtId, date: NaiveDate) -> bool {
        self.court_id == court_id && self.date == date && self.status != BookingStatus::Cancelled
    }
}

/// 予約対象コートの条件
///
/// 施設カタログから取得した値のうち、予約作成に必要なもの。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourtTerms {
    pub court_id: CourtId,
    pub venue_id: VenueId,
    pub rates: CourtRates,
    /// コートの定員（max_players の上限かつデフォルト値）
    pub capacity: u32,
}

// ============================================================================
// 純粋関数
// ============================================================================

/// 純粋関数：予約を作成する
///
/// ビジネスルール：
/// - 日付は今日以降（`requested_at` の日付と比較）
/// - 終了時刻 > 開始時刻
/// - 1 ≤ max_players ≤ コートの定員（未指定なら定員）
/// - 同じコート・同じ日のキャンセルされていない予約と時間枠が重ならない
/// - 合計金額は作成時に一度だけ計算する
/// - 状態は Pending、参加者は作成者（管理者）のみ
///
/// `existing` には同じコート・同じ日の予約を渡す。キャンセル済みは無視される。
/// 副作用なし。新しいBookingとイベントを返す。
pub fn create_booking(
    cmd: &CreateBooking,
    court: &CourtTerms,
    existing: &[Booking],
    peak_hours: &PeakHours,
) -> Result<(Booking, BookingCreated), CreateBookingError> {
    // バリデーション：過去の日付は不可
    let today = cmd.requested_at.date_naive();
    if cmd.date < today {
        return Err(CreateBookingError::PastDate {
            date: cmd.date,
            today,
        });
    }

    // バリデーション：時間枠
    let slot = TimeSlot::new(cmd.start_time, cmd.end_time).ok_or(
        CreateBookingError::InvalidTimeRange {
            start: cmd.start_time,
            end: cmd.end_time,
        },
    )?;

    // バリデーション：最大人数
    let max_players = cmd.max_players.unwrap_or(court.capacity);
    if max_players == 0 || max_players > court.capacity {
        return Err(CreateBookingError::InvalidMaxPlayers {
            requested: max_players,
            capacity: court.capacity,
        });
    }

    // バリデーション：時間枠の重複
    let taken: Vec<(BookingId, TimeSlot)> = existing
        .iter()
        .filter(|b| b.occupies(court.court_id, cmd.date))
        .map(|b| (b.booking_id, b.slot()))
        .collect();

    if let Some(conflicting_booking_id) =
        schedule::find_conflict(&slot, taken.iter().map(|(id, s)| (*id, s)))
    {
        return Err(CreateBookingError::SlotUnavailable {
            conflicting_booking_id,
        });
    }

    let total_amount = pricing::total_amount(&slot, &court.rates, peak_hours);
    let booking_id = BookingId::new();
    let now = cmd.requested_at;

    let booking = Booking {
        booking_id,
        court_id: court.court_id,
        venue_id: court.venue_id,
        created_by: cmd.created_by,
        date: cmd.date,
        start_time: cmd.start_time,
        end_time: cmd.end_time,
        total_amount,
        booking_type: cmd.booking_type,
        group_type: cmd.group_type.unwrap_or_default(),
        max_players,
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Unpaid,
        owner_approved: false,
        owner_approved_at: None,
        players: vec![Player {
            user_id: cmd.created_by,
            joined_at: now,
            left_at: None,
            is_admin: true,
            status: PlayerStatus::Active,
        }],
        invites: Vec::new(),
        cancelled_at: None,
        cancelled_by: None,
        cancellation_reason: None,
        completed_at: None,
        created_at: now,
        updated_at: now,
        version: 1,
    };

    let event = BookingCreated {
        booking_id,
        court_id: court.court_id,
        created_by: cmd.created_by,
        date: cmd.date,
        start_time: cmd.start_time,
        end_time: cmd.end_time,
        total_amount,
        created_at: now,
    };

    Ok((booking, event))
}

/// 純粋関数：予約に参加する
///
/// ビジネスルール（この順に検証）：
/// - 作成者は自分の予約に参加できない
/// - 既に参加中なら不可
/// - 定員に達していれば不可
/// - Pending / Confirmed 以外は不可
/// - プライベートグループは保留中の招待が必要（参加時に Accepted にする）
///
/// 参加により定員に達した場合は Confirmed に自動確定する。
/// 副作用なし。新しいBookingとイベントを返す。
pub fn join_booking(
    booking: &Booking,
    user_id: UserId,
    joined_at: DateTime<Utc>,
) -> Result<(Booking, PlayerJoined), JoinBookingError> {
    if booking.is_creator(user_id) {
        return Err(JoinBookingError::CannotJoinOwnBooking);
    }

    if booking.is_active_player(user_id) {
        return Err(JoinBookingError::AlreadyJoined);
    }

    if booking.is_full() {
        return Err(JoinBookingError::BookingFull {
            max_players: booking.max_players,
        });
    }

    if !booking.status.allows_roster_changes() {
        return Err(JoinBookingError::BookingClosed {
            status: booking.status,
        });
    }

    let mut updated = booking.clone();

    let via_invite = match booking.group_type {
        GroupType::Private => {
            let invite = updated
                .invites
                .iter_mut()
                .find(|i| i.user_id == user_id && i.status == InviteStatus::Pending)
                .ok_or(JoinBookingError::NotInvited)?;
            invite.status = InviteStatus::Accepted;
            invite.responded_at = Some(joined_at);
            true
        }
        GroupType::Public => false,
    };

    updated.players.push(Player {
        user_id,
        joined_at,
        left_at: None,
        is_admin: false,
        status: PlayerStatus::Active,
    });

    // 定員に達したら自動確定
    let auto_confirmed = updated.is_full();
    if auto_confirmed {
        updated.status = BookingStatus::Confirmed;
    }
    updated.updated_at = joined_at;

    let event = PlayerJoined {
        booking_id: booking.booking_id,
        user_id,
        joined_at,
        auto_confirmed,
        via_invite,
    };

    Ok((updated, event))
}

/// 純粋関数：予約から抜ける
///
/// ビジネスルール：
/// - 参加中のプレイヤーのみ（2回目の離脱はエラー、エントリは重複しない）
/// - 作成者は抜けられない（キャンセルする）
/// - Completed / Cancelled の予約からは抜けられない
/// - エントリは削除せず Left にする。予約ステータスは変わらない
///
/// 副作用なし。新しいBookingとイベントを返す。
pub fn leave_booking(
    booking: &Booking,
    user_id: UserId,
    left_at: DateTime<Utc>,
) -> Result<(Booking, PlayerLeft), LeaveBookingError> {
    if !booking.is_active_player(user_id) {
        return Err(LeaveBookingError::NotActivePlayer);
    }

    if booking.is_creator(user_id) {
        return Err(LeaveBookingError::CreatorCannotLeave);
    }

    if !booking.status.allows_roster_changes() {
        return Err(LeaveBookingError::BookingClosed {
            status: booking.status,
        });
    }

    let mut updated = booking.clone();
    if let Some(player) = updated
        .players
        .iter_mut()
        .find(|p| p.user_id == user_id && p.is_active())
    {
        player.status = PlayerStatus::Left;
        player.left_at = Some(left_at);
    }
    updated.updated_at = left_at;

    let event = PlayerLeft {
        booking_id: booking.booking_id,
        user_id,
        left_at,
    };

    Ok((updated, event))
}

/// 純粋関数：プレイヤーを招待する
///
/// ビジネスルール：
/// - 招待者は参加中のプレイヤー（作成者でなくてもよい）
/// - Pending / Confirmed のみ
/// - 招待人数 ≤ 空き枠
/// - 参加中・招待保留中のユーザーはスキップ（一部成功を許す）
///
/// 副作用なし。新しいBookingとイベントを返す。
pub fn invite_players(
    booking: &Booking,
    invited_by: UserId,
    user_ids: &[UserId],
    invited_at: DateTime<Utc>,
) -> Result<(Booking, PlayersInvited), InviteError> {
    if !booking.is_active_player(invited_by) {
        return Err(InviteError::NotParticipant);
    }

    if !booking.status.allows_roster_changes() {
        return Err(InviteError::BookingClosed {
            status: booking.status,
        });
    }

    let available = booking.available_slots();
    let requested = user_ids.len() as u32;
    if requested > available {
        return Err(InviteError::InsufficientSlots {
            available,
            requested,
        });
    }

    let mut updated = booking.clone();
    let mut invited = Vec::new();
    let mut skipped = Vec::new();

    for &user_id in user_ids {
        if updated.is_active_player(user_id) {
            skipped.push((user_id, InviteSkipReason::AlreadyActive));
            continue;
        }
        if updated.pending_invite(user_id).is_some() {
            skipped.push((user_id, InviteSkipReason::AlreadyInvited));
            continue;
        }

        updated.invites.push(Invite {
            user_id,
            invited_by,
            status: InviteStatus::Pending,
            invited_at,
            responded_at: None,
        });
        invited.push(user_id);
    }

    if !invited.is_empty() {
        updated.updated_at = invited_at;
    }

    let event = PlayersInvited {
        booking_id: booking.booking_id,
        invited_by,
        invited,
        skipped,
        invited_at,
    };

    Ok((updated, event))
}

/// 純粋関数：招待を辞退する
///
/// 保留中の招待を Rejected にする。
pub fn decline_invite(
    booking: &Booking,
    user_id: UserId,
    declined_at: DateTime<Utc>,
) -> Result<(Booking, InviteDeclined), DeclineInviteError> {
    if !booking.status.allows_roster_changes() {
        return Err(DeclineInviteError::BookingClosed {
            status: booking.status,
        });
    }

    let mut updated = booking.clone();
    let invite = updated
        .invites
        .iter_mut()
        .find(|i| i.user_id == user_id && i.status == InviteStatus::Pending)
        .ok_or(DeclineInviteError::NoPendingInvite)?;

    invite.status = InviteStatus::Rejected;
    invite.responded_at = Some(declined_at);
    let invited_by = invite.invited_by;
    updated.updated_at = declined_at;

    let event = InviteDeclined {
        booking_id: booking.booking_id,
        user_id,
        invited_by,
        declined_at,
    };

    Ok((updated, event))
}

/// 純粋関数：作成者が予約をキャンセルする
///
/// ビジネスルール：
/// - 作成者のみ
/// - Pending / Confirmed からのみ（終了状態からは不可）
pub fn cancel_booking(
    booking: &Booking,
    cancelled_by: UserId,
    reason: String,
    cancelled_at: DateTime<Utc>,
) -> Result<(Booking, BookingCancelled), CancelBookingError> {
    if !booking.is_creator(cancelled_by) {
        return Err(CancelBookingError::NotCreator);
    }

    let status = booking.status.transition_to(BookingStatus::Cancelled)?;

    let updated = Booking {
        status,
        cancelled_at: Some(cancelled_at),
        cancelled_by: Some(cancelled_by),
        cancellation_reason: Some(reason.clone()),
        updated_at: cancelled_at,
        ..booking.clone()
    };

    let event = BookingCancelled {
        booking_id: booking.booking_id,
        cancelled_by,
        reason,
        cancelled_at,
        rejected_by_owner: false,
    };

    Ok((updated, event))
}

/// 純粋関数：施設オーナーが予約を承認する
///
/// ビジネスルール：
/// - Pending → Confirmed
/// - 自動確定済み（Confirmed）の予約への承認はサインオフのみ記録する
/// - 終了状態からは不可
///
/// オーナーであることの確認はアプリケーション層で行う。
pub fn approve_booking(
    booking: &Booking,
    owner_id: UserId,
    approved_at: DateTime<Utc>,
) -> Result<(Booking, BookingApproved), TransitionError> {
    let status = match booking.status {
        BookingStatus::Confirmed => BookingStatus::Confirmed,
        other => other.transition_to(BookingStatus::Confirmed)?,
    };

    let updated = Booking {
        status,
        owner_approved: true,
        owner_approved_at: Some(approved_at),
        updated_at: approved_at,
        ..booking.clone()
    };

    let event = BookingApproved {
        booking_id: booking.booking_id,
        approved_by: owner_id,
        approved_at,
    };

    Ok((updated, event))
}

/// 純粋関数：施設オーナーが予約を却下する
///
/// ビジネスルール：
/// - Pending / Confirmed → Cancelled（確定後の却下も可能）
/// - owner_approved は false に戻す
pub fn reject_booking(
    booking: &Booking,
    owner_id: UserId,
    reason: String,
    rejected_at: DateTime<Utc>,
) -> Result<(Booking, BookingCancelled), TransitionError> {
    let status = booking.status.transition_to(BookingStatus::Cancelled)?;

    let updated = Booking {
        status,
        owner_approved: false,
        cancelled_at: Some(rejected_at),
        cancelled_by: Some(owner_id),
        cancellation_reason: Some(reason.clone()),
        updated_at: rejected_at,
        ..booking.clone()
    };

    let event = BookingCancelled {
        booking_id: booking.booking_id,
        cancelled_by: owner_id,
        reason,
        cancelled_at: rejected_at,
        rejected_by_owner: true,
    };

    Ok((updated, event))
}

/// 純粋関数：施設オーナーが予約を完了にする
///
/// Confirmed → Completed のみ許可する。
pub fn complete_booking(
    booking: &Booking,
    owner_id: UserId,
    completed_at: DateTime<Utc>,
) -> Result<(Booking, BookingCompleted), TransitionError> {
    let status = booking.status.transition_to(BookingStatus::Completed)?;

    let updated = Booking {
        status,
        completed_at: Some(completed_at),
        updated_at: completed_at,
        ..booking.clone()
    };

    let event = BookingCompleted {
        booking_id: booking.booking_id,
        completed_by: owner_id,
        completed_at,
    };

    Ok((updated, event))
}
