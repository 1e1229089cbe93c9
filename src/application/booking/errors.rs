use crate::domain::{
    BookingId, BookingStatus, CancelBookingError, CourtId, CreateBookingError,
    DeclineInviteError, InviteError, JoinBookingError, LeaveBookingError, TimeOfDay,
    TransitionError, VenueId,
};
use chrono::NaiveDate;
use thiserror::Error;

/// エラーの分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Authorization,
    BusinessLogic,
    Internal,
}

/// 予約管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum BookingApplicationError {
    /// コートが存在しない、または非アクティブ
    #[error("Court not found: {0}")]
    CourtNotFound(CourtId),

    /// コートを所有する施設が存在しない
    #[error("Venue not found: {0}")]
    VenueNotFound(VenueId),

    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    /// 過去の日付
    #[error("Cannot book a past date: {date} is before {today}")]
    InvalidDate { date: NaiveDate, today: NaiveDate },

    #[error("End time {end} must be after start time {start}")]
    InvalidTimeRange { start: TimeOfDay, end: TimeOfDay },

    #[error("Max players must be between 1 and {capacity}, got {requested}")]
    InvalidMaxPlayers { requested: u32, capacity: u32 },

    /// 時間枠が既存の予約と重なる
    #[error("Time slot is already booked (conflicts with booking {conflicting_booking_id})")]
    SlotUnavailable { conflicting_booking_id: BookingId },

    #[error("Cannot join your own booking")]
    CannotJoinOwnBooking,

    #[error("Already joined this booking")]
    AlreadyJoined,

    #[error("Booking is full (max {max_players} players)")]
    BookingFull { max_players: u32 },

    /// Cancelled / Completed の予約への変更
    #[error("Booking is {status} and no longer accepts changes")]
    BookingClosed { status: BookingStatus },

    #[error("This is a private group; an invite is required to join")]
    NotInvited,

    #[error("Not an active player of this booking")]
    NotActivePlayer,

    #[error("The creator cannot leave the booking; cancel it instead")]
    CreatorCannotLeave,

    #[error("Only active players can invite")]
    NotParticipant,

    #[error("Only {available} slots available, {requested} invites requested")]
    InsufficientSlots { available: u32, requested: u32 },

    #[error("No pending invite for this booking")]
    InviteNotFound,

    #[error("Only the creator can cancel the booking")]
    NotCreator,

    #[error("Only the venue owner can manage this booking")]
    NotVenueOwner,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// 再試行回数を超えてバージョン競合が続いた
    #[error("Booking {booking_id} was modified concurrently ({attempts} attempts)")]
    ConcurrentModification {
        booking_id: BookingId,
        attempts: u32,
    },

    /// 予約ストアのエラー
    #[error("Booking repository error")]
    RepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 施設カタログのエラー
    #[error("Court directory error")]
    CourtDirectoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BookingApplicationError {
    /// エラーの分類
    pub fn kind(&self) -> ErrorKind {
        use BookingApplicationError::*;

        match self {
            CourtNotFound(_) | VenueNotFound(_) | BookingNotFound(_) | InviteNotFound => {
                ErrorKind::NotFound
            }
            InvalidDate { .. } | InvalidTimeRange { .. } | InvalidMaxPlayers { .. } => {
                ErrorKind::Validation
            }
            SlotUnavailable { .. } | AlreadyJoined | ConcurrentModification { .. } => {
                ErrorKind::Conflict
            }
            NotInvited | NotParticipant | NotCreator | NotVenueOwner => ErrorKind::Authorization,
            CannotJoinOwnBooking
            | BookingFull { .. }
            | BookingClosed { .. }
            | NotActivePlayer
            | CreatorCannotLeave
            | InsufficientSlots { .. }
            | InvalidTransition { .. } => ErrorKind::BusinessLogic,
            RepositoryError(_) | CourtDirectoryError(_) => ErrorKind::Internal,
        }
    }

    /// 機械可読なエラーコード
    pub fn code(&self) -> &'static str {
        use BookingApplicationError::*;

        match self {
            CourtNotFound(_) | VenueNotFound(_) => "COURT_NOT_FOUND",
            BookingNotFound(_) => "BOOKING_NOT_FOUND",
            InvalidDate { .. } => "INVALID_DATE",
            InvalidTimeRange { .. } => "INVALID_TIME_RANGE",
            InvalidMaxPlayers { .. } => "INVALID_MAX_PLAYERS",
            SlotUnavailable { .. } => "SLOT_UNAVAILABLE",
            CannotJoinOwnBooking => "CANNOT_JOIN_OWN",
            AlreadyJoined => "DUPLICATE",
            BookingFull { .. } => "ALREADY_FULL",
            BookingClosed { .. } => "BOOKING_CLOSED",
            NotInvited => "NOT_INVITED",
            NotActivePlayer => "NOT_ACTIVE_PLAYER",
            CreatorCannotLeave => "CREATOR_CANNOT_LEAVE",
            NotParticipant => "NOT_PARTICIPANT",
            InsufficientSlots { .. } => "INSUFFICIENT_SLOTS",
            InviteNotFound => "INVITE_NOT_FOUND",
            NotCreator => "NOT_CREATOR",
            NotVenueOwner => "NOT_VENUE_OWNER",
            InvalidTransition { .. } => "INVALID_TRANSITION",
            ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            RepositoryError(_) => "REPOSITORY_ERROR",
            CourtDirectoryError(_) => "COURT_DIRECTORY_ERROR",
        }
    }
}

impl From<TransitionError> for BookingApplicationError {
    fn from(err: TransitionError) -> Self {
        BookingApplicationError::InvalidTransition {
            from: err.from,
            to: err.to,
        }
    }
}

impl From<CreateBookingError> for BookingApplicationError {
    fn from(err: CreateBookingError) -> Self {
        match err {
            CreateBookingError::PastDate { date, today } => {
                BookingApplicationError::InvalidDate { date, today }
            }
            CreateBookingError::InvalidTimeRange { start, end } => {
                BookingApplicationError::InvalidTimeRange { start, end }
            }
            CreateBookingError::InvalidMaxPlayers {
                requested,
                capacity,
            } => BookingApplicationError::InvalidMaxPlayers {
                requested,
                capacity,
            },
            CreateBookingError::SlotUnavailable {
                conflicting_booking_id,
            } => BookingApplicationError::SlotUnavailable {
                conflicting_booking_id,
            },
        }
    }
}

impl From<JoinBookingError> for BookingApplicationError {
    fn from(err: JoinBookingError) -> Self {
        match err {
            JoinBookingError::CannotJoinOwnBooking => BookingApplicationError::CannotJoinOwnBooking,
            JoinBookingError::AlreadyJoined => BookingApplicationError::AlreadyJoined,
            JoinBookingError::BookingFull { max_players } => {
                BookingApplicationError::BookingFull { max_players }
            }
            JoinBookingError::BookingClosed { status } => {
                BookingApplicationError::BookingClosed { status }
            }
            JoinBookingError::NotInvited => BookingApplicationError::NotInvited,
        }
    }
}

impl From<LeaveBookingError> for BookingApplicationError {
    fn from(err: LeaveBookingError) -> Self {
        match err {
            LeaveBookingError::NotActivePlayer => BookingApplicationError::NotActivePlayer,
            LeaveBookingError::CreatorCannotLeave => BookingApplicationError::CreatorCannotLeave,
            LeaveBookingError::BookingClosed { status } => {
                BookingApplicationError::BookingClosed { status }
            }
        }
    }
}

impl From<InviteError> for BookingApplicationError {
    fn from(err: InviteError) -> Self {
        match err {
            InviteError::NotParticipant => BookingApplicationError::NotParticipant,
            InviteError::BookingClosed { status } => {
                BookingApplicationError::BookingClosed { status }
            }
            InviteError::InsufficientSlots {
                available,
                requested,
            } => BookingApplicationError::InsufficientSlots {
                available,
                requested,
            },
        }
    }
}

impl From<DeclineInviteError> for BookingApplicationError {
    fn from(err: DeclineInviteError) -> Self {
        match err {
            DeclineInviteError::NoPendingInvite => BookingApplicationError::InviteNotFound,
            DeclineInviteError::BookingClosed { status } => {
                BookingApplicationError::BookingClosed { status }
            }
        }
    }
}

impl From<CancelBookingError> for BookingApplicationError {
    fn from(err: CancelBookingError) -> Self {
        match err {
            CancelBookingError::NotCreator => BookingApplicationError::NotCreator,
            CancelBookingError::InvalidTransition(e) => e.into(),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, BookingApplicationError>;
