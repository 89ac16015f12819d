//! Practice data model.
//!
//! Practices, locations and sets are owned by the store. Dogs, handlers,
//! attendance records and club settings come from external registries and
//! are only consumed.

mod attendance;
mod practice;
mod registry;
mod set;

pub use attendance::{merge_attendance, Attendance, AttendanceStatus};
pub use practice::{Location, Practice, PracticeStatus, PracticeSummary};
pub use registry::{ClubSettings, Dog, DogStatus, Handler};
pub use set::{Lane, PracticeSet, SetDog, SetType};
