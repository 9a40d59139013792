//! Domain models for the clinic-stats system.

mod appointment;
mod patient;
mod records;
mod sale;
mod stats;
mod tutor;
mod window;

pub use appointment::*;
pub use patient::*;
pub use records::*;
pub use sale::*;
pub use stats::*;
pub use tutor::*;
pub use window::*;
