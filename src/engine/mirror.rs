//! Mirror relationships between tracked displays.
//!
//! This module owns the back-link bookkeeping: `mirror` and `unmirror` are
//! the only places a `mirror_source`/`mirrored_to` edge is created or
//! removed as a pair, so the symmetry invariant holds everywhere else.

use tracing::debug;

use super::error::{Error, Result};
use crate::model::display::{DisplayArena, DisplayState, EntityKey};
use crate::sys::transaction::ConfigSession;

/// Picks the display `target` will be mirrored onto: the first tracked
/// entity in registry order, other than `target`, that is currently active.
pub fn select_alternate(arena: &DisplayArena, target: EntityKey) -> Result<EntityKey> {
    arena
        .iter_ordered()
        .find(|(key, entity)| *key != target && entity.state == DisplayState::Active)
        .map(|(key, _)| key)
        .ok_or(Error::NoAlternateDisplay { display: arena[target].id })
}

/// Configures `display` to mirror `alternate`'s output and records the edge.
pub fn mirror(
    arena: &mut DisplayArena,
    session: &dyn ConfigSession,
    display: EntityKey,
    alternate: EntityKey,
) -> Result<()> {
    let id = arena[display].id;
    let source_id = arena[alternate].id;
    debug!(%id, source = %source_id, "Mirroring display");

    let mut txn = session
        .begin()
        .map_err(|err| Error::configuration(id, "beginning configuration", err))?;
    if let Err(err) = txn.set_mirror_source(id, Some(source_id)) {
        txn.cancel();
        return Err(Error::configuration(id, "setting mirror source", err));
    }
    txn.complete()
        .map_err(|err| Error::configuration(id, "completing configuration", err))?;

    arena[display].mirror_source = Some(alternate);
    let back_links = &mut arena[alternate].mirrored_to;
    if !back_links.contains(&display) {
        back_links.push(display);
    }
    Ok(())
}

/// Clears `display`'s mirror configuration and removes the edge both ways.
pub fn unmirror(
    arena: &mut DisplayArena,
    session: &dyn ConfigSession,
    display: EntityKey,
) -> Result<()> {
    let id = arena[display].id;
    debug!(%id, "Unmirroring display");

    let mut txn = session
        .begin()
        .map_err(|err| Error::configuration(id, "beginning configuration", err))?;
    if let Err(err) = txn.set_mirror_source(id, None) {
        txn.cancel();
        return Err(Error::configuration(id, "clearing mirror source", err));
    }
    txn.complete()
        .map_err(|err| Error::configuration(id, "completing configuration", err))?;

    if let Some(source) = arena[display].mirror_source.take() {
        arena[source].mirrored_to.retain(|other| *other != display);
    }
    Ok(())
}
