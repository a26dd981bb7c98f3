//! The display registry produces the authoritative tracked-entity set.
//!
//! The OS only distinguishes "active" from "online but inactive". Everything
//! else this crate cares about (disconnected-by-us, mirrored-by-us, pending
//! transitions) is derived state the platform forgets on every query, so
//! reconciliation carries it forward instead of recomputing it.

use tracing::{debug, trace, warn};

use super::display::{DisplayArena, DisplayEntity, DisplayState, placeholder_name};
use crate::common::collections::HashSet;
use crate::sys::arrangement::ArrangementCache;
use crate::sys::screen::{DisplayId, DisplayQuery};
use crate::sys::settings::SettingsStore;

pub struct Registry {
    arena: DisplayArena,
    builtin_probe_limit: u32,
}

impl Registry {
    pub fn new(builtin_probe_limit: u32) -> Self {
        Registry {
            arena: DisplayArena::new(),
            builtin_probe_limit,
        }
    }

    pub fn arena(&self) -> &DisplayArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut DisplayArena {
        &mut self.arena
    }

    /// Rebuilds the tracked set from a fresh OS query, merged with the
    /// derived state of previously tracked entities. Invoked at startup and
    /// after every topology event.
    pub fn reconcile(
        &mut self,
        query: &dyn DisplayQuery,
        arrangement: &dyn ArrangementCache,
        settings: &dyn SettingsStore,
    ) {
        let active: HashSet<DisplayId> = query.active_displays().into_iter().collect();
        let online = query.online_displays();
        let primary = query.primary_display();
        trace!(?online, actives = active.len(), ?primary, "Reconciling displays");

        let mut seen: HashSet<DisplayId> = HashSet::default();
        for id in online {
            if !seen.insert(id) {
                continue;
            }
            let is_active = active.contains(&id);
            let is_builtin = query.is_builtin(id);
            if is_builtin {
                settings.remember_builtin(id);
            }
            self.upsert_online(query, id, is_active, is_builtin, primary == Some(id));
        }

        self.retain_or_drop_absent(&seen, settings.remembered_builtin());

        if let Some(remembered) = settings.remembered_builtin() {
            if self.arena.key_of(remembered).is_none() {
                debug!(
                    id = %remembered,
                    "Remembered built-in display is gone from the OS report; tracking placeholder"
                );
                self.insert_builtin_placeholder(remembered);
            }
        }

        if self.arena.builtin_key().is_none() {
            self.probe_for_builtin(query, settings);
        }

        self.arena.sort();

        // Capture the arrangement so a later mirror teardown can put the
        // displays back where the user had them. Best effort only.
        if let Err(err) = arrangement.snapshot() {
            warn!("Failed to snapshot display arrangement: {err}");
        }
    }

    fn upsert_online(
        &mut self,
        query: &dyn DisplayQuery,
        id: DisplayId,
        is_active: bool,
        is_builtin: bool,
        is_primary: bool,
    ) {
        let os_name = if is_active { query.display_name(id) } else { None };
        let fresh_state = if is_active {
            DisplayState::Active
        } else {
            DisplayState::Disconnected
        };

        if let Some(key) = self.arena.key_of(id) {
            let entity = self.arena.get_mut(key).unwrap();
            // Mirrored and pending are our derived states; the OS report
            // cannot confirm or deny them, so they survive the refresh.
            let state = match entity.state {
                DisplayState::Mirrored | DisplayState::Pending => entity.state,
                _ => fresh_state,
            };
            entity.state = state;
            if let Some(name) = os_name {
                entity.name = name;
            } else if !entity.has_real_name() {
                entity.name = placeholder_name(id, is_builtin || entity.is_builtin);
            }
            entity.is_builtin |= is_builtin;
            entity.is_primary = state == DisplayState::Active && is_primary;
        } else {
            let name = os_name.unwrap_or_else(|| placeholder_name(id, is_builtin));
            let mut entity = DisplayEntity::new(id, name, fresh_state);
            entity.is_builtin = is_builtin;
            entity.is_primary = fresh_state == DisplayState::Active && is_primary;
            self.arena.insert(entity);
        }
    }

    /// Entities absent from the online report either carry forward (our
    /// derived states, and anything the persisted built-in id still names)
    /// or stop being tracked (an unplugged external that was simply active).
    fn retain_or_drop_absent(&mut self, seen: &HashSet<DisplayId>, remembered: Option<DisplayId>) {
        let mut to_remove = Vec::new();
        for (key, entity) in self.arena.iter_ordered() {
            if seen.contains(&entity.id) {
                continue;
            }
            let carried = matches!(
                entity.state,
                DisplayState::Mirrored | DisplayState::Pending | DisplayState::Disconnected
            );
            if carried || remembered == Some(entity.id) {
                continue;
            }
            to_remove.push(key);
        }
        for key in to_remove {
            if let Some(entity) = self.arena.remove(key) {
                debug!(id = %entity.id, "Display no longer referenced; dropping");
            }
        }
        // Carried-forward entities are not in the OS primary report.
        for key in self.arena.keys_ordered() {
            let entity = self.arena.get_mut(key).unwrap();
            if !seen.contains(&entity.id) {
                entity.is_primary = false;
            }
        }
    }

    fn insert_builtin_placeholder(&mut self, id: DisplayId) {
        let mut entity =
            DisplayEntity::new(id, placeholder_name(id, true), DisplayState::Disconnected);
        entity.is_builtin = true;
        self.arena.insert(entity);
    }

    /// The built-in panel has never been observed this run or any prior run.
    /// Low handles are where the OS places it, so probe a small range.
    fn probe_for_builtin(&mut self, query: &dyn DisplayQuery, settings: &dyn SettingsStore) {
        for raw in 1..=self.builtin_probe_limit {
            let id = DisplayId::new(raw);
            if query.is_builtin(id) {
                debug!(%id, "Probe found built-in display");
                settings.remember_builtin(id);
                if self.arena.key_of(id).is_none() {
                    self.insert_builtin_placeholder(id);
                } else if let Some(key) = self.arena.key_of(id) {
                    self.arena.get_mut(key).unwrap().is_builtin = true;
                }
                return;
            }
        }
    }
}
