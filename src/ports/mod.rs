pub mod booking_repository;
pub mod court_directory;
pub mod notification_service;
pub mod user_directory;

pub use booking_repository::{
    BookingFilter, BookingRepository, InsertOutcome, MatchSortKey, PublicMatchQuery, SortOrder,
    UpdateOutcome,
};
pub use court_directory::{Court, CourtDirectory, Venue};
pub use notification_service::{Notification, NotificationKind, NotificationService};
pub use user_directory::{UserDirectory, UserProfile};
