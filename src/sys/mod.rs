//! Interfaces to the OS display stack. Everything the engine needs from the
//! platform is expressed as a trait here so the reconciliation logic can be
//! driven identically by a live backend or by the in-memory fake.

pub mod arrangement;
pub mod gamma;
pub mod screen;
pub mod settings;
pub mod transaction;

#[cfg(test)]
pub mod fake;

use std::sync::Arc;

use thiserror::Error;

/// Failure reported by a platform call, carrying the OS-level description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SysError(pub String);

impl SysError {
    pub fn new(message: impl Into<String>) -> Self {
        SysError(message.into())
    }
}

/// The bundle of platform ports the reactor owns. All ports are shared
/// handles; the live backend and the test fake both hand out clones of a
/// single underlying connection.
#[derive(Clone)]
pub struct SysPorts {
    pub query: Arc<dyn screen::DisplayQuery + Send + Sync>,
    pub session: Arc<dyn transaction::ConfigSession + Send + Sync>,
    pub gamma: Arc<dyn gamma::GammaControl + Send + Sync>,
    pub arrangement: Arc<dyn arrangement::ArrangementCache + Send + Sync>,
    pub settings: Arc<dyn settings::SettingsStore + Send + Sync>,
}
