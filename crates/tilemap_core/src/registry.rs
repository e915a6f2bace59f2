//! Ordered tileset registry and global tile id resolution

use crate::{MapError, Result, Tile, TileRef, TileSet};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The tilesets attached to one map, in registration order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TilesetRegistry {
    tilesets: Vec<TileSet>,
}

impl TilesetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tilesets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tilesets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TileSet> {
        self.tilesets.iter()
    }

    pub fn get(&self, index: usize) -> Option<&TileSet> {
        self.tilesets.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut TileSet> {
        self.tilesets.get_mut(index)
    }

    /// Position of the tileset with the given id
    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.tilesets.iter().position(|t| t.id == id)
    }

    pub fn by_id(&self, id: Uuid) -> Option<&TileSet> {
        self.tilesets.iter().find(|t| t.id == id)
    }

    pub fn by_id_mut(&mut self, id: Uuid) -> Option<&mut TileSet> {
        self.tilesets.iter_mut().find(|t| t.id == id)
    }

    /// Look up the tile behind a handle
    pub fn tile(&self, tile: TileRef) -> Option<&Tile> {
        self.by_id(tile.tileset).and_then(|set| set.tile(tile.id))
    }

    /// Whether the handle resolves to a tile of a registered set
    pub fn contains_tile(&self, tile: TileRef) -> bool {
        self.tile(tile).is_some()
    }

    /// The first global id not claimed by any registered set, saturating at `u32::MAX`
    pub fn next_first_gid(&self) -> u32 {
        self.tilesets
            .iter()
            .map(|t| t.first_gid.saturating_add(t.tile_count().max(1)))
            .max()
            .unwrap_or(1)
            .max(1)
    }

    /// Append a tileset, assigning `first_gid` if it is unset.
    ///
    /// Returns the new index, or `None` if a set with the same id is already
    /// registered (in which case nothing changes).
    pub fn add(&mut self, mut tileset: TileSet) -> Option<usize> {
        if self.index_of(tileset.id).is_some() {
            return None;
        }
        if tileset.first_gid == 0 {
            tileset.first_gid = self.next_first_gid();
        }
        log::debug!(
            "Registering tileset '{}' with first gid {}",
            tileset.name,
            tileset.first_gid
        );
        self.tilesets.push(tileset);
        Some(self.tilesets.len() - 1)
    }

    /// Remove the tileset at `index`
    pub fn remove(&mut self, index: usize) -> Result<TileSet> {
        if index >= self.tilesets.len() {
            return Err(MapError::TilesetIndexOutOfRange {
                index,
                len: self.tilesets.len(),
            });
        }
        Ok(self.tilesets.remove(index))
    }

    /// Exchange two tilesets. Returns `false` for the no-op `i == j` swap.
    pub fn swap(&mut self, i: usize, j: usize) -> Result<bool> {
        let len = self.tilesets.len();
        for index in [i, j] {
            if index >= len {
                return Err(MapError::TilesetIndexOutOfRange { index, len });
            }
        }
        if i == j {
            return Ok(false);
        }
        self.tilesets.swap(i, j);
        Ok(true)
    }

    /// Find the tileset responsible for a global id.
    ///
    /// Scans in registration order and keeps the last set whose `first_gid`
    /// is not greater than `gid`. Persisted maps depend on this exact rule.
    pub fn find_for_gid(&self, gid: u32) -> Option<&TileSet> {
        let mut found = None;
        for tileset in &self.tilesets {
            if tileset.first_gid <= gid {
                found = Some(tileset);
            }
        }
        found
    }

    /// Resolve a global id to a tile handle
    pub fn resolve_gid(&self, gid: u32) -> Option<TileRef> {
        let set = self.find_for_gid(gid)?;
        set.tile_ref(gid - set.first_gid)
    }

    /// The global id a writer should use for `tile`; `None` if it does not
    /// fit in a `u32`
    pub fn gid_for_tile(&self, tile: TileRef) -> Option<u32> {
        let set = self.by_id(tile.tileset)?;
        if !set.contains(tile) {
            return None;
        }
        set.first_gid.checked_add(tile.id)
    }
}

impl<'a> IntoIterator for &'a TilesetRegistry {
    type Item = &'a TileSet;
    type IntoIter = std::slice::Iter<'a, TileSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.tilesets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_at(first_gid: u32, tiles: u32) -> TileSet {
        let mut set = TileSet::new(format!("set@{first_gid}"));
        set.first_gid = first_gid;
        for _ in 0..tiles {
            set.add_tile(Tile::new(16, 16));
        }
        set
    }

    #[test]
    fn test_find_for_gid_keeps_greatest_first_gid() {
        let mut registry = TilesetRegistry::new();
        registry.add(set_at(1, 10));
        registry.add(set_at(50, 10));
        registry.add(set_at(120, 10));

        assert_eq!(registry.find_for_gid(75).unwrap().first_gid, 50);
        assert_eq!(registry.find_for_gid(1).unwrap().first_gid, 1);
        assert_eq!(registry.find_for_gid(500).unwrap().first_gid, 120);
        assert!(registry.find_for_gid(0).is_none());
    }

    #[test]
    fn test_find_for_gid_follows_registration_order() {
        // Out-of-order registration: the last qualifying set wins, even
        // though an earlier one has a larger first gid.
        let mut registry = TilesetRegistry::new();
        registry.add(set_at(50, 10));
        registry.add(set_at(1, 10));

        assert_eq!(registry.find_for_gid(75).unwrap().first_gid, 1);
        assert_eq!(registry.find_for_gid(20).unwrap().first_gid, 1);
    }

    #[test]
    fn test_first_gid_assignment() {
        let mut registry = TilesetRegistry::new();
        registry.add(set_at(0, 4));
        registry.add(set_at(0, 0));
        registry.add(set_at(0, 2));

        let gids: Vec<u32> = registry.iter().map(|t| t.first_gid).collect();
        assert_eq!(gids, vec![1, 5, 6]);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut registry = TilesetRegistry::new();
        let set = set_at(1, 1);
        assert_eq!(registry.add(set.clone()), Some(0));
        assert_eq!(registry.add(set), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_gid_round_trip() {
        let mut registry = TilesetRegistry::new();
        registry.add(set_at(1, 3));
        registry.add(set_at(4, 3));

        let tile = registry.resolve_gid(5).unwrap();
        assert_eq!(tile.id, 1);
        assert_eq!(registry.gid_for_tile(tile), Some(5));
        assert_eq!(registry.resolve_gid(7), None);
    }

    #[test]
    fn test_huge_first_gid_saturates() {
        let mut registry = TilesetRegistry::new();
        registry.add(set_at(u32::MAX - 1, 4));
        assert_eq!(registry.next_first_gid(), u32::MAX);

        let tile = registry.get(0).unwrap().tile_ref(3).unwrap();
        assert_eq!(registry.gid_for_tile(tile), None);
        let tile = registry.get(0).unwrap().tile_ref(1).unwrap();
        assert_eq!(registry.gid_for_tile(tile), Some(u32::MAX));
        assert_eq!(registry.get(0).unwrap().last_gid(), u32::MAX);
    }

    #[test]
    fn test_swap() {
        let mut registry = TilesetRegistry::new();
        registry.add(set_at(1, 1));
        registry.add(set_at(2, 1));

        assert!(!registry.swap(1, 1).unwrap());
        assert!(registry.swap(0, 1).unwrap());
        assert_eq!(registry.get(0).unwrap().first_gid, 2);
        assert!(matches!(
            registry.swap(0, 2),
            Err(MapError::TilesetIndexOutOfRange { index: 2, len: 2 })
        ));
    }
}
