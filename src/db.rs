pub mod reference_repo;
pub use reference_repo::{ReferenceData, ReferenceRepository};
pub mod demo_repo;
pub use demo_repo::{BookingBackend, DemoBookingBackend};
