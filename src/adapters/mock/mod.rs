pub mod booking_repository;
pub mod court_directory;
pub mod notification_service;
pub mod user_directory;

pub use booking_repository::BookingRepository;
pub use court_directory::CourtDirectory;
pub use notification_service::NotificationService;
pub use user_directory::UserDirectory;
