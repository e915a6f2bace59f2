//! Flattening runs of layers into one tile layer
//!
//! Every grid position of the run yields a stack of tile handles, bottom to
//! top. Identical stacks share one composited output tile, so large areas
//! built from a few repeating layer combinations produce only a few merged
//! tiles.

use crate::{Layer, Map, MapConfig, MapError, Rect, Result, Tile, TileRef, TileSet};
use image::{imageops, RgbaImage};
use std::collections::HashMap;

/// Tile handles at one grid position across a merge run; `None` where a layer
/// is empty, hidden or not a tile layer
pub type TileStack = Vec<Option<TileRef>>;

/// Composites layer runs of one map into shared merged tiles
///
/// The merger owns the tileset that collects the merged tiles. Reusing a
/// merger across calls keeps its cache, so repeated merges hand out the same
/// tiles for the same stacks. The caller must register [`TileMerger::tileset`]
/// on the map before adding a merged layer to it.
#[derive(Debug)]
pub struct TileMerger {
    tileset: TileSet,
    cache: HashMap<TileStack, TileRef>,
    layer_name: String,
}

impl TileMerger {
    pub fn new() -> Self {
        Self::with_config(&MapConfig::default())
    }

    pub fn with_config(config: &MapConfig) -> Self {
        Self {
            tileset: TileSet::new(config.merged_tileset_name.clone()),
            cache: HashMap::new(),
            layer_name: config.merged_layer_name.clone(),
        }
    }

    /// The tileset holding every tile this merger has produced
    pub fn tileset(&self) -> &TileSet {
        &self.tileset
    }

    pub fn into_tileset(self) -> TileSet {
        self.tileset
    }

    /// Number of distinct stacks seen so far
    pub fn cached_stacks(&self) -> usize {
        self.cache.len()
    }

    /// Whether every layer uses the map's tile size
    pub fn tile_sizes_uniform(map: &Map) -> bool {
        map.layers().all(|layer| {
            layer.tile_size(map.tile_width(), map.tile_height())
                == (map.tile_width(), map.tile_height())
        })
    }

    /// The stack of tiles at `(x, y)` over layers `start..start + len`.
    ///
    /// Layers past the top of the stack are left out.
    pub fn stack_at(
        map: &Map,
        x: i32,
        y: i32,
        start: usize,
        len: usize,
        include_hidden: bool,
    ) -> TileStack {
        let end = start.saturating_add(len).min(map.layer_count());
        (start..end)
            .map(|index| {
                map.layer(index)
                    .filter(|layer| layer.is_tile_layer())
                    .filter(|layer| layer.visible || include_hidden)
                    .and_then(|layer| layer.tile_at(x, y))
            })
            .collect()
    }

    /// Flatten layers `start..start + len` into a new full-map tile layer.
    ///
    /// Source layers are not modified. Positions where the whole stack is
    /// empty stay empty in the output.
    pub fn merge(
        &mut self,
        map: &Map,
        start: usize,
        len: usize,
        include_hidden: bool,
    ) -> Result<Layer> {
        let Some(end) = start.checked_add(len).filter(|end| *end <= map.layer_count()) else {
            return Err(MapError::MergeRunOutOfRange {
                start,
                len,
                layers: map.layer_count(),
            });
        };
        if !Self::tile_sizes_uniform(map) {
            log::warn!("Merging layers with non-uniform tile sizes; merged tiles may be misaligned");
        }

        let bounds = Rect::sized(map.width(), map.height());
        let mut merged = Layer::new_tile_layer_in(self.layer_name.clone(), bounds);
        merged.tile_width = Some(map.tile_width());
        merged.tile_height = Some(map.tile_height());

        let cached_before = self.cache.len();
        for y in 0..bounds.height {
            for x in 0..bounds.width {
                let stack = Self::stack_at(map, x, y, start, len, include_hidden);
                let tile = self.tile_for_stack(map, stack);
                merged.set_tile_at(x, y, tile);
            }
        }
        log::info!(
            "Merged layers {}..{} into {} new tile(s) ({} cached)",
            start,
            end,
            self.cache.len() - cached_before,
            self.cache.len()
        );
        Ok(merged)
    }

    /// Shared output tile for a stack, compositing it on first sight
    fn tile_for_stack(&mut self, map: &Map, stack: TileStack) -> Option<TileRef> {
        if stack.iter().all(Option::is_none) {
            return None;
        }
        if let Some(tile) = self.cache.get(&stack) {
            return Some(*tile);
        }
        let tile = self.tileset.add_tile(composite(map, &stack));
        self.cache.insert(stack, tile);
        Some(tile)
    }
}

impl Default for TileMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw a stack bottom to top into one image sized to its largest tile.
///
/// Tiles are anchored at the bottom-left corner, so taller tiles extend
/// upwards.
fn composite(map: &Map, stack: &[Option<TileRef>]) -> Tile {
    let tiles: Vec<&Tile> = stack
        .iter()
        .flatten()
        .filter_map(|tile| {
            let found = map.tile(*tile);
            if found.is_none() {
                log::warn!("Merge stack references unknown tile {:?}", tile);
            }
            found
        })
        .collect();

    let width = tiles.iter().map(|t| t.width).max().unwrap_or(0);
    let height = tiles.iter().map(|t| t.height).max().unwrap_or(0);
    let mut canvas = RgbaImage::new(width, height);
    for tile in tiles {
        if let Some(image) = &tile.image {
            let y = i64::from(height) - i64::from(image.height());
            imageops::overlay(&mut canvas, image, 0, y);
        }
    }
    Tile::from_image(canvas)
}
