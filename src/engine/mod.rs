pub mod controller;
pub mod error;
pub mod mirror;
pub mod restore;

pub use controller::DisplayController;
pub use error::{Error, Result};
pub use restore::AutoRestoreScheduler;
