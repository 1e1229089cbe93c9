pub mod booking;
pub mod commands;
pub mod errors;
pub mod events;
pub mod pricing;
pub mod schedule;
pub mod value_objects;

pub use booking::*;
pub use errors::*;
pub use events::*;
pub use pricing::{CourtRates, PeakHours};
pub use schedule::TimeSlot;
pub use value_objects::*;
