//! Layer types for tile, object and selection layers

use crate::{MapError, MapObject, Properties, Rect, Result, TileRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

fn default_opacity() -> f32 {
    1.0
}

/// A layer (tiles, objects or a selection mask)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub id: Uuid,
    pub name: String,
    pub visible: bool,
    /// Locked layers refuse [`crate::Map::set_tile_at`] and tileset removal
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Tile size override; `None` uses the map's tile size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_height: Option<u32>,
    /// Distance of this layer's plane from the viewer, for parallax views
    #[serde(default)]
    pub view_plane_distance: f32,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    /// Own rectangle in tile units; `x`/`y` is the layer offset
    bounds: Rect,
    data: LayerData,
}

/// The type of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerType {
    Tiles,
    Objects,
    Selection,
}

/// The data contained in a layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LayerData {
    /// Dense row-major grid covering the layer bounds
    Tiles {
        /// `None` means empty, `Some(tile)` references a tile owned by a tileset
        tiles: Vec<Option<TileRef>>,
        /// Per-cell property overrides, keyed by cell index
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        cell_properties: HashMap<usize, Properties>,
    },
    /// Free-form objects in draw order (later entries draw on top)
    Objects { objects: Vec<MapObject> },
    /// Transient selection mask covering the layer bounds
    Selection { mask: Vec<bool> },
}

/// Copy a row-major grid into a resized grid, moving content by `(dx, dy)`
fn shift_grid<T: Clone + Default>(
    old: &[T],
    old_width: i32,
    old_height: i32,
    width: i32,
    height: i32,
    dx: i32,
    dy: i32,
) -> Vec<T> {
    let mut grid = vec![T::default(); Rect::sized(width, height).area()];
    let max_x = width.min(old_width + dx);
    let max_y = height.min(old_height + dy);
    for y in dy.max(0)..max_y {
        for x in dx.max(0)..max_x {
            let src = ((y - dy) * old_width + (x - dx)) as usize;
            grid[(y * width + x) as usize] = old[src].clone();
        }
    }
    grid
}

impl Layer {
    fn with_data(name: String, bounds: Rect, data: LayerData) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            visible: true,
            locked: false,
            opacity: 1.0,
            tile_width: None,
            tile_height: None,
            view_plane_distance: 0.0,
            properties: Properties::new(),
            bounds,
            data,
        }
    }

    /// Create a new empty tile layer anchored at the origin
    pub fn new_tile_layer(name: String, width: i32, height: i32) -> Self {
        Self::new_tile_layer_in(name, Rect::sized(width, height))
    }

    /// Create a new empty tile layer covering `bounds`
    pub fn new_tile_layer_in(name: String, bounds: Rect) -> Self {
        Self::with_data(
            name,
            bounds,
            LayerData::Tiles {
                tiles: vec![None; bounds.area()],
                cell_properties: HashMap::new(),
            },
        )
    }

    /// Create a new object group
    pub fn new_object_group(name: String, width: i32, height: i32) -> Self {
        Self::with_data(
            name,
            Rect::sized(width, height),
            LayerData::Objects {
                objects: Vec::new(),
            },
        )
    }

    /// Create a new selection layer with nothing selected
    pub fn new_selection_layer(name: String, width: i32, height: i32) -> Self {
        let bounds = Rect::sized(width, height);
        Self::with_data(
            name,
            bounds,
            LayerData::Selection {
                mask: vec![false; bounds.area()],
            },
        )
    }

    /// Copy of this layer with a fresh identity
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    /// Get the type of this layer
    pub fn layer_type(&self) -> LayerType {
        match &self.data {
            LayerData::Tiles { .. } => LayerType::Tiles,
            LayerData::Objects { .. } => LayerType::Objects,
            LayerData::Selection { .. } => LayerType::Selection,
        }
    }

    pub fn is_tile_layer(&self) -> bool {
        matches!(self.data, LayerData::Tiles { .. })
    }

    pub fn data(&self) -> &LayerData {
        &self.data
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn width(&self) -> i32 {
        self.bounds.width
    }

    pub fn height(&self) -> i32 {
        self.bounds.height
    }

    pub fn offset(&self) -> (i32, i32) {
        (self.bounds.x, self.bounds.y)
    }

    /// Move the layer within the map without touching its content
    pub fn set_offset(&mut self, x: i32, y: i32) {
        self.bounds.x = x;
        self.bounds.y = y;
    }

    /// Tile size of this layer, falling back to the map's
    pub fn tile_size(&self, map_tile_width: u32, map_tile_height: u32) -> (u32, u32) {
        (
            self.tile_width.unwrap_or(map_tile_width),
            self.tile_height.unwrap_or(map_tile_height),
        )
    }

    /// Whether the map coordinate lies within this layer's own bounds
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.bounds.contains(x, y)
    }

    fn cell_index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(((y - self.bounds.y) * self.bounds.width + (x - self.bounds.x)) as usize)
    }

    /// Map coordinate of a cell index
    fn cell_position(&self, index: usize) -> (i32, i32) {
        let width = self.bounds.width.max(1) as usize;
        (
            self.bounds.x + (index % width) as i32,
            self.bounds.y + (index / width) as i32,
        )
    }

    // ------------------------------------------------------------------
    // Tile grid
    // ------------------------------------------------------------------

    /// Tile at a map coordinate; `None` when empty, out of bounds, or not a tile layer
    pub fn tile_at(&self, x: i32, y: i32) -> Option<TileRef> {
        let index = self.cell_index(x, y)?;
        match &self.data {
            LayerData::Tiles { tiles, .. } => tiles.get(index).copied().flatten(),
            _ => None,
        }
    }

    /// Set or clear the tile at a map coordinate.
    ///
    /// Writes outside the layer bounds, or to a non-tile layer, are ignored.
    /// Returns whether a cell was written.
    pub fn set_tile_at(&mut self, x: i32, y: i32, tile: Option<TileRef>) -> bool {
        let Some(index) = self.cell_index(x, y) else {
            return false;
        };
        match &mut self.data {
            LayerData::Tiles { tiles, .. } => match tiles.get_mut(index) {
                Some(cell) => {
                    *cell = tile;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// The raw cell grid of a tile layer
    pub fn tiles(&self) -> Option<&[Option<TileRef>]> {
        match &self.data {
            LayerData::Tiles { tiles, .. } => Some(tiles),
            _ => None,
        }
    }

    /// Every non-empty cell as `(x, y, tile)` in map coordinates
    pub fn occupied_cells(&self) -> Vec<(i32, i32, TileRef)> {
        match &self.data {
            LayerData::Tiles { tiles, .. } => tiles
                .iter()
                .enumerate()
                .filter_map(|(i, cell)| {
                    cell.map(|tile| {
                        let (x, y) = self.cell_position(i);
                        (x, y, tile)
                    })
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Clear every cell for which `pred` holds; returns the number cleared
    fn clear_cells_where(&mut self, pred: impl Fn(&TileRef) -> bool) -> usize {
        let LayerData::Tiles {
            tiles,
            cell_properties,
        } = &mut self.data
        else {
            return 0;
        };
        let mut cleared = 0;
        for (index, cell) in tiles.iter_mut().enumerate() {
            if cell.as_ref().is_some_and(&pred) {
                *cell = None;
                cell_properties.remove(&index);
                cleared += 1;
            }
        }
        cleared
    }

    /// Clear every cell referencing exactly this tile
    pub fn remove_tile(&mut self, tile: TileRef) -> usize {
        self.clear_cells_where(|cell| *cell == tile)
    }

    /// Clear every cell referencing any tile of the given tileset
    pub fn remove_tileset_tiles(&mut self, tileset: Uuid) -> usize {
        self.clear_cells_where(|cell| cell.tileset == tileset)
    }

    /// Whether any cell references a tile of the given tileset
    pub fn references_tileset(&self, tileset: Uuid) -> bool {
        match &self.data {
            LayerData::Tiles { tiles, .. } => tiles.iter().flatten().any(|t| t.tileset == tileset),
            _ => false,
        }
    }

    /// Per-cell property overrides at a map coordinate
    pub fn tile_properties_at(&self, x: i32, y: i32) -> Option<&Properties> {
        let index = self.cell_index(x, y)?;
        match &self.data {
            LayerData::Tiles {
                cell_properties, ..
            } => cell_properties.get(&index),
            _ => None,
        }
    }

    /// Replace the per-cell overrides at a map coordinate; empty bags are dropped
    pub fn set_tile_properties_at(&mut self, x: i32, y: i32, properties: Properties) -> bool {
        let Some(index) = self.cell_index(x, y) else {
            return false;
        };
        match &mut self.data {
            LayerData::Tiles {
                cell_properties, ..
            } => {
                if properties.is_empty() {
                    cell_properties.remove(&index);
                } else {
                    cell_properties.insert(index, properties);
                }
                true
            }
            _ => false,
        }
    }

    /// Composite this layer's non-empty cells onto `target`, tile for tile.
    ///
    /// A hidden layer contributes nothing. Both layers must be tile layers,
    /// and the target must not be locked.
    pub fn merge_onto(&self, target: &mut Layer) -> Result<()> {
        if !self.is_tile_layer() || !target.is_tile_layer() {
            return Err(MapError::UnsupportedMerge {
                upper: self.layer_type(),
                lower: target.layer_type(),
            });
        }
        if target.locked {
            return Err(MapError::LayerLocked {
                layer: target.id,
                name: target.name.clone(),
            });
        }
        if !self.visible {
            return Ok(());
        }
        for (x, y, tile) in self.occupied_cells() {
            target.set_tile_at(x, y, Some(tile));
        }
        Ok(())
    }

    /// Resize the layer, moving its content by `(dx, dy)` tiles.
    ///
    /// The offset is kept. Objects keep their pixel positions.
    pub fn resize(&mut self, width: i32, height: i32, dx: i32, dy: i32) {
        let (old_width, old_height) = (self.bounds.width, self.bounds.height);
        match &mut self.data {
            LayerData::Tiles {
                tiles,
                cell_properties,
            } => {
                *tiles = shift_grid(tiles, old_width, old_height, width, height, dx, dy);
                *cell_properties = std::mem::take(cell_properties)
                    .into_iter()
                    .filter_map(|(index, props)| {
                        let x = (index as i32 % old_width.max(1)) + dx;
                        let y = (index as i32 / old_width.max(1)) + dy;
                        Rect::sized(width, height)
                            .contains(x, y)
                            .then(|| ((y * width + x) as usize, props))
                    })
                    .collect();
            }
            LayerData::Selection { mask } => {
                *mask = shift_grid(mask, old_width, old_height, width, height, dx, dy);
            }
            LayerData::Objects { .. } => {}
        }
        self.bounds.width = width;
        self.bounds.height = height;
    }

    // ------------------------------------------------------------------
    // Object group
    // ------------------------------------------------------------------

    /// Objects in draw order; empty for other layer kinds
    pub fn objects(&self) -> &[MapObject] {
        match &self.data {
            LayerData::Objects { objects } => objects,
            _ => &[],
        }
    }

    /// Append an object on top; returns `false` if this is not an object group
    pub fn add_object(&mut self, object: MapObject) -> bool {
        match &mut self.data {
            LayerData::Objects { objects } => {
                objects.push(object);
                true
            }
            _ => false,
        }
    }

    /// Remove an object by ID
    pub fn remove_object(&mut self, id: Uuid) -> Option<MapObject> {
        match &mut self.data {
            LayerData::Objects { objects } => objects
                .iter()
                .position(|o| o.id == id)
                .map(|pos| objects.remove(pos)),
            _ => None,
        }
    }

    /// Get object by ID
    pub fn object(&self, id: Uuid) -> Option<&MapObject> {
        self.objects().iter().find(|o| o.id == id)
    }

    /// Get mutable object by ID
    pub fn object_mut(&mut self, id: Uuid) -> Option<&mut MapObject> {
        match &mut self.data {
            LayerData::Objects { objects } => objects.iter_mut().find(|o| o.id == id),
            _ => None,
        }
    }

    /// Topmost object under a pixel position
    pub fn object_at(&self, px: f32, py: f32) -> Option<&MapObject> {
        self.objects().iter().rev().find(|o| o.contains(px, py))
    }

    // ------------------------------------------------------------------
    // Selection mask
    // ------------------------------------------------------------------

    fn set_selected(&mut self, x: i32, y: i32, selected: bool) -> bool {
        let Some(index) = self.cell_index(x, y) else {
            return false;
        };
        match &mut self.data {
            LayerData::Selection { mask } => {
                mask[index] = selected;
                true
            }
            _ => false,
        }
    }

    pub fn select(&mut self, x: i32, y: i32) -> bool {
        self.set_selected(x, y, true)
    }

    pub fn deselect(&mut self, x: i32, y: i32) -> bool {
        self.set_selected(x, y, false)
    }

    /// Select every cell of `rect` that lies within the layer
    pub fn select_rect(&mut self, rect: Rect) {
        let Some(area) = rect.intersection(&self.bounds) else {
            return;
        };
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                self.set_selected(x, y, true);
            }
        }
    }

    pub fn is_selected(&self, x: i32, y: i32) -> bool {
        match (&self.data, self.cell_index(x, y)) {
            (LayerData::Selection { mask }, Some(index)) => mask[index],
            _ => false,
        }
    }

    pub fn clear_selection(&mut self) {
        if let LayerData::Selection { mask } = &mut self.data {
            mask.fill(false);
        }
    }

    pub fn invert_selection(&mut self) {
        if let LayerData::Selection { mask } = &mut self.data {
            mask.iter_mut().for_each(|cell| *cell = !*cell);
        }
    }

    pub fn selected_count(&self) -> usize {
        match &self.data {
            LayerData::Selection { mask } => mask.iter().filter(|s| **s).count(),
            _ => 0,
        }
    }
}
