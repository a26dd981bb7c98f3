//! The tracked display model.
//!
//! Entities live in a slotmap arena and refer to each other by key, so a
//! mirror relationship is a pair of indices rather than a reference cycle:
//! any holder of a key observes in-place mutations through the arena.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use strum::Display as StrumDisplay;

use crate::common::collections::HashMap;
use crate::sys::screen::DisplayId;

slotmap::new_key_type! {
    pub struct EntityKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum DisplayState {
    Active,
    Disconnected,
    Mirrored,
    /// A transition is in flight; the last transaction for this display has
    /// not completed.
    Pending,
}

impl DisplayState {
    /// True for the states where the display is showing nothing of its own.
    pub fn is_off(self) -> bool {
        matches!(self, DisplayState::Disconnected | DisplayState::Mirrored)
    }
}

pub const BUILTIN_DISPLAY_NAME: &str = "Built-in Display";

pub fn placeholder_name(id: DisplayId, builtin: bool) -> String {
    if builtin {
        BUILTIN_DISPLAY_NAME.to_string()
    } else {
        format!("Display {id}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEntity {
    pub id: DisplayId,
    pub name: String,
    pub state: DisplayState,
    pub is_primary: bool,
    pub is_builtin: bool,
    /// Entities currently mirroring onto this one. Back-references; the
    /// forward edge lives in each mirroring entity's `mirror_source`.
    pub mirrored_to: Vec<EntityKey>,
    pub mirror_source: Option<EntityKey>,
}

impl DisplayEntity {
    pub fn new(id: DisplayId, name: String, state: DisplayState) -> Self {
        DisplayEntity {
            id,
            name,
            state,
            is_primary: false,
            is_builtin: false,
            mirrored_to: Vec::new(),
            mirror_source: None,
        }
    }

    /// A name the OS actually reported, as opposed to one we synthesized for
    /// an inactive or never-seen display.
    pub fn has_real_name(&self) -> bool {
        self.name != BUILTIN_DISPLAY_NAME && self.name != placeholder_name(self.id, false)
    }
}

/// Identity-keyed arena of tracked displays. At most one entity per
/// `DisplayId`; `order` is the presentation order maintained by the registry
/// (primary first, then ascending handle).
#[derive(Default)]
pub struct DisplayArena {
    entities: SlotMap<EntityKey, DisplayEntity>,
    by_id: HashMap<DisplayId, EntityKey>,
    order: Vec<EntityKey>,
}

impl DisplayArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: EntityKey) -> Option<&DisplayEntity> {
        self.entities.get(key)
    }

    pub fn get_mut(&mut self, key: EntityKey) -> Option<&mut DisplayEntity> {
        self.entities.get_mut(key)
    }

    pub fn key_of(&self, id: DisplayId) -> Option<EntityKey> {
        self.by_id.get(&id).copied()
    }

    pub fn entity_of(&self, id: DisplayId) -> Option<&DisplayEntity> {
        self.key_of(id).and_then(|key| self.get(key))
    }

    /// Inserts a new entity, or returns the existing key when the id is
    /// already tracked (the dedupe invariant).
    pub fn insert(&mut self, entity: DisplayEntity) -> EntityKey {
        if let Some(key) = self.key_of(entity.id) {
            return key;
        }
        let id = entity.id;
        let key = self.entities.insert(entity);
        self.by_id.insert(id, key);
        self.order.push(key);
        key
    }

    /// Removes an entity no longer referenced by the OS or persisted state,
    /// severing any mirror edges that point at it first.
    pub fn remove(&mut self, key: EntityKey) -> Option<DisplayEntity> {
        self.sever_mirror_links(key);
        let entity = self.entities.remove(key)?;
        self.by_id.remove(&entity.id);
        self.order.retain(|other| *other != key);
        Some(entity)
    }

    /// Drops every mirror edge touching `key`, in both directions.
    pub fn sever_mirror_links(&mut self, key: EntityKey) {
        let Some(entity) = self.entities.get(key) else {
            return;
        };
        let sources: Vec<EntityKey> = entity.mirrored_to.clone();
        let target = entity.mirror_source;
        for source in sources {
            if let Some(source_entity) = self.entities.get_mut(source) {
                source_entity.mirror_source = None;
            }
        }
        if let Some(target) = target {
            if let Some(target_entity) = self.entities.get_mut(target) {
                target_entity.mirrored_to.retain(|other| *other != key);
            }
        }
        if let Some(entity) = self.entities.get_mut(key) {
            entity.mirrored_to.clear();
            entity.mirror_source = None;
        }
    }

    pub fn keys_ordered(&self) -> Vec<EntityKey> {
        self.order.clone()
    }

    pub fn iter_ordered(&self) -> impl Iterator<Item = (EntityKey, &DisplayEntity)> {
        self.order.iter().filter_map(|key| Some((*key, self.entities.get(*key)?)))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Re-sorts the presentation order: primary first, then ascending handle.
    pub fn sort(&mut self) {
        let entities = &self.entities;
        self.order.sort_by_key(|key| {
            let entity = &entities[*key];
            (!entity.is_primary, entity.id)
        });
    }

    pub fn builtin_key(&self) -> Option<EntityKey> {
        self.iter_ordered().find(|(_, entity)| entity.is_builtin).map(|(key, _)| key)
    }
}

impl std::ops::Index<EntityKey> for DisplayArena {
    type Output = DisplayEntity;

    fn index(&self, key: EntityKey) -> &DisplayEntity {
        &self.entities[key]
    }
}

impl std::ops::IndexMut<EntityKey> for DisplayArena {
    fn index_mut(&mut self, key: EntityKey) -> &mut DisplayEntity {
        &mut self.entities[key]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entity(raw: u32) -> DisplayEntity {
        let id = DisplayId::new(raw);
        DisplayEntity::new(id, placeholder_name(id, false), DisplayState::Active)
    }

    #[test]
    fn insert_is_deduplicated_by_id() {
        let mut arena = DisplayArena::new();
        let first = arena.insert(entity(7));
        let second = arena.insert(entity(7));
        assert_eq!(first, second);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn sort_puts_primary_first_then_ascending() {
        let mut arena = DisplayArena::new();
        arena.insert(entity(3));
        let primary = arena.insert(entity(9));
        arena.insert(entity(1));
        arena.get_mut(primary).unwrap().is_primary = true;
        arena.sort();

        let ids: Vec<u32> = arena.iter_ordered().map(|(_, e)| e.id.as_u32()).collect();
        assert_eq!(ids, vec![9, 1, 3]);
    }

    #[test]
    fn sever_mirror_links_drops_both_directions() {
        let mut arena = DisplayArena::new();
        let external = arena.insert(entity(2));
        let builtin = arena.insert(entity(1));
        arena.get_mut(builtin).unwrap().mirror_source = Some(external);
        arena.get_mut(external).unwrap().mirrored_to.push(builtin);

        arena.sever_mirror_links(external);
        assert_eq!(arena.get(builtin).unwrap().mirror_source, None);
        assert!(arena.get(external).unwrap().mirrored_to.is_empty());
    }

    #[test]
    fn remove_clears_id_index_and_order() {
        let mut arena = DisplayArena::new();
        let key = arena.insert(entity(4));
        arena.insert(entity(5));
        arena.remove(key);
        assert_eq!(arena.key_of(DisplayId::new(4)), None);
        assert_eq!(arena.keys_ordered().len(), 1);
    }

    #[test]
    fn placeholder_names_are_not_real_names() {
        let id = DisplayId::new(6);
        let mut display = DisplayEntity::new(id, placeholder_name(id, false), DisplayState::Disconnected);
        assert!(!display.has_real_name());
        display.name = BUILTIN_DISPLAY_NAME.to_string();
        assert!(!display.has_real_name());
        display.name = "DELL U2720Q".to_string();
        assert!(display.has_real_name());
    }
}
