//! Tilesets: the authoritative owners of tiles

use crate::{Properties, Tile, TileRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ordered collection of tiles occupying a block of global tile ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileSet {
    pub id: Uuid,
    pub name: String,
    /// First global id of this set; 0 until the set is registered on a map
    #[serde(default)]
    pub first_gid: u32,
    tiles: Vec<Tile>,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

impl TileSet {
    /// Create a new empty tileset
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            first_gid: 0,
            tiles: Vec::new(),
            properties: Properties::new(),
        }
    }

    /// Append a tile; its local id is its position in the set
    pub fn add_tile(&mut self, tile: Tile) -> TileRef {
        let id = self.tiles.len() as u32;
        self.tiles.push(tile);
        TileRef::new(self.id, id)
    }

    /// Get a tile by local id
    pub fn tile(&self, id: u32) -> Option<&Tile> {
        self.tiles.get(id as usize)
    }

    /// Get a mutable tile by local id
    pub fn tile_mut(&mut self, id: u32) -> Option<&mut Tile> {
        self.tiles.get_mut(id as usize)
    }

    /// Handle for the tile with the given local id, if it exists
    pub fn tile_ref(&self, id: u32) -> Option<TileRef> {
        ((id as usize) < self.tiles.len()).then(|| TileRef::new(self.id, id))
    }

    /// Whether the handle points into this set
    pub fn contains(&self, tile: TileRef) -> bool {
        tile.tileset == self.id && (tile.id as usize) < self.tiles.len()
    }

    pub fn tile_count(&self) -> u32 {
        self.tiles.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Iterate over `(handle, tile)` pairs in local id order
    pub fn tiles(&self) -> impl Iterator<Item = (TileRef, &Tile)> {
        let id = self.id;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, tile)| (TileRef::new(id, i as u32), tile))
    }

    /// Widest tile in the set, 0 if empty
    pub fn max_tile_width(&self) -> u32 {
        self.tiles.iter().map(|t| t.width).max().unwrap_or(0)
    }

    /// Tallest tile in the set, 0 if empty
    pub fn max_tile_height(&self) -> u32 {
        self.tiles.iter().map(|t| t.height).max().unwrap_or(0)
    }

    /// Last global id claimed by this set (equal to `first_gid` when empty)
    pub fn last_gid(&self) -> u32 {
        self.first_gid.saturating_add(self.tile_count().saturating_sub(1))
    }
}
