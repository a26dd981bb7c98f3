//! monoff turns individual monitors off and back on.
//!
//! The core is a display-state reconciliation engine: it tracks the set of
//! known displays across OS topology churn, mediates two disable strategies
//! (hard output disconnect, and a mirror+blank fallback for displays that
//! reject disconnection), and runs a debounced safety net that re-lights the
//! built-in panel rather than leave the user with every screen dark.
//!
//! The platform is reached only through the traits in [`sys`]; embedders
//! construct a [`sys::SysPorts`] bundle for their backend, spawn the
//! [`actor::reactor::Reactor`], and forward OS reconfiguration callbacks
//! into its sender. Everything else (menus, settings UI, updates) lives
//! outside this crate and talks to the reactor handle.

pub mod actor;
pub mod common;
pub mod engine;
pub mod model;
pub mod sys;

pub use actor::reactor::{Command, DisplaySnapshot, Event, Reactor, ReactorHandle};
pub use common::config::Config;
pub use engine::{Error, Result};
pub use model::display::DisplayState;
pub use sys::screen::{DisplayId, ReconfigFlags};
pub use sys::SysPorts;
