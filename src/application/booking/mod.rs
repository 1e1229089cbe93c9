mod booking_service;
mod details;
mod errors;
mod notifications;
mod owner_actions;
mod queries;

pub use booking_service::{
    InviteOutcome, JoinOutcome, ServiceDependencies, cancel_booking, create_booking,
    decline_invite, invite_players, join_booking, leave_booking,
};
pub use details::{
    BookingDetails, CourtSummary, PlayerDetail, UNKNOWN, UserSummary, VenueSummary,
    get_booking_with_details,
};
pub use errors::{BookingApplicationError, ErrorKind, Result};
pub use notifications::notifications_for;
pub use owner_actions::{approve_booking, complete_booking, reject_booking};
pub use queries::{
    CourtAvailability, find_bookings_by_court_and_date, find_bookings_by_user_id,
    find_bookings_for_owner, find_joinable_bookings, find_public_group_matches,
    get_court_availability,
};
