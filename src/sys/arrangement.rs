//! Snapshot/restore of the physical monitor arrangement.

use super::SysError;

/// `restore` is a no-op until the first successful `snapshot`.
pub trait ArrangementCache {
    fn snapshot(&self) -> Result<(), SysError>;
    fn restore(&self) -> Result<(), SysError>;
}
