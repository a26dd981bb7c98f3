use thiserror::Error;

use crate::sys::SysError;
use crate::sys::screen::DisplayId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A native configuration transaction failed. `step` names the phase the
    /// failure happened in, for the user-facing message.
    #[error("configuring display {display} failed while {step}: {source}")]
    Configuration {
        display: DisplayId,
        step: &'static str,
        #[source]
        source: SysError,
    },

    /// The mirror fallback was requested but no other active display exists
    /// to mirror onto.
    #[error("no other active display available to mirror display {display} onto")]
    NoAlternateDisplay { display: DisplayId },

    /// A command named a display handle that is not in the tracked set.
    #[error("display {0} is not tracked")]
    UnknownDisplay(DisplayId),
}

impl Error {
    pub fn configuration(display: DisplayId, step: &'static str, source: SysError) -> Self {
        Error::Configuration { display, step, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
