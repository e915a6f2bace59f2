//! The map aggregate: layer stack, tilesets and change notification

use crate::{
    Layer, LayerPlane, MapConfig, MapError, MapEvent, MapListeners, MapObject, ParallaxChange,
    ParallaxEvent, ParallaxListeners, Properties, Rect, Result, Tile, TileRef, TileSet,
    TilesetRegistry,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Map projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
    Hexagonal,
    Shifted,
    Frontal,
}

impl Orientation {
    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            Orientation::Orthogonal => "Orthogonal",
            Orientation::Isometric => "Isometric",
            Orientation::Hexagonal => "Hexagonal",
            Orientation::Shifted => "Shifted",
            Orientation::Frontal => "Frontal",
        }
    }

    /// Returns all orientation variants for UI enumeration
    pub fn all() -> &'static [Orientation] {
        &[
            Orientation::Orthogonal,
            Orientation::Isometric,
            Orientation::Hexagonal,
            Orientation::Shifted,
            Orientation::Frontal,
        ]
    }
}

/// A tile map: an ordered layer stack plus the tilesets its tiles come from
///
/// All mutations go through `Map` so that registered listeners hear about
/// them. Every tile referenced by a layer belongs to a registered tileset;
/// the checked entry points ([`Map::add_layer`], [`Map::set_tile_at`], ...)
/// refuse anything else, and removing a tileset first clears its tiles from
/// every layer.
#[derive(Debug, Serialize, Deserialize)]
pub struct Map {
    plane: LayerPlane,
    tile_width: u32,
    tile_height: u32,
    #[serde(default)]
    orientation: Orientation,
    #[serde(default)]
    pub properties: Properties,
    tilesets: TilesetRegistry,
    /// Editor-only layers (selections, previews) that are never persisted
    #[serde(skip)]
    special_layers: Vec<Layer>,
    /// Objects placed on the map itself rather than on an object group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    objects: Vec<MapObject>,
    eye_distance: f32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    #[serde(skip)]
    config: MapConfig,
    #[serde(skip)]
    listeners: MapListeners,
    #[serde(skip)]
    parallax_listeners: ParallaxListeners,
}

impl Map {
    /// Create an empty map with default settings; tile size is taken from the
    /// first tileset added
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_config(width, height, &MapConfig::default())
    }

    /// Create an empty map using the given defaults
    pub fn with_config(width: i32, height: i32, config: &MapConfig) -> Self {
        Self {
            plane: LayerPlane::new(width, height),
            tile_width: 0,
            tile_height: 0,
            orientation: Orientation::default(),
            properties: Properties::new(),
            tilesets: TilesetRegistry::new(),
            special_layers: Vec::new(),
            objects: Vec::new(),
            eye_distance: config.eye_distance,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            config: config.clone(),
            listeners: MapListeners::new(),
            parallax_listeners: ParallaxListeners::new(),
        }
    }

    /// Create a map measured in ZX Spectrum screens, with one empty layer
    pub fn new_zx(screens_x: i32, screens_y: i32) -> Self {
        let config = MapConfig::default();
        let screen = config.zx_screen;
        let mut map = Self::with_config(screens_x * screen.width, screens_y * screen.height, &config);
        map.tile_width = screen.tile_size;
        map.tile_height = screen.tile_size;
        map.add_default_layer();
        map
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Handle to the structural listener collection
    ///
    /// The handle can be cloned into a listener so it can unregister itself.
    pub fn listeners(&self) -> &MapListeners {
        &self.listeners
    }

    /// Handle to the parallax listener collection
    pub fn parallax_listeners(&self) -> &ParallaxListeners {
        &self.parallax_listeners
    }

    fn fire(&self, event: MapEvent) {
        self.listeners.fire(event);
    }

    /// Announce a generic change
    pub fn touch(&self) {
        self.fire(MapEvent::MapChanged);
    }

    /// Announce that the layer at `index` was edited through [`Map::layer_mut`]
    pub fn fire_layer_changed(&self, index: usize) {
        self.fire(MapEvent::LayerChanged { index });
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    /// The underlying layer stack
    pub fn plane(&self) -> &LayerPlane {
        &self.plane
    }

    pub fn bounds(&self) -> Rect {
        self.plane.bounds()
    }

    pub fn width(&self) -> i32 {
        self.plane.width()
    }

    pub fn height(&self) -> i32 {
        self.plane.height()
    }

    /// Whether the tile coordinate lies within the map
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.plane.in_bounds(x, y)
    }

    pub fn layer_count(&self) -> usize {
        self.plane.layer_count()
    }

    /// Get layer by index
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.plane.layer(index)
    }

    /// Get mutable layer by index without notifying listeners.
    ///
    /// Callers are responsible for [`Map::fire_layer_changed`] and for not
    /// introducing tiles from unregistered tilesets.
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.plane.layer_mut(index)
    }

    /// Layers from bottom to top
    pub fn layers(&self) -> std::slice::Iter<'_, Layer> {
        self.plane.layers()
    }

    pub fn find_layer_index(&self, id: Uuid) -> Option<usize> {
        self.plane.find_layer_index(id)
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn set_tile_width(&mut self, width: u32) {
        self.tile_width = width;
        self.touch();
    }

    pub fn set_tile_height(&mut self, height: u32) {
        self.tile_height = height;
        self.touch();
    }

    /// Tallest tile size in use: the map's, or a taller tileset tile
    pub fn tile_height_max(&self) -> u32 {
        self.tilesets
            .iter()
            .map(|t| t.max_tile_height())
            .fold(self.tile_height, u32::max)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        if self.orientation != orientation {
            self.orientation = orientation;
            self.touch();
        }
    }

    // ------------------------------------------------------------------
    // Layer stack
    // ------------------------------------------------------------------

    fn check_tiles_registered(&self, layer: &Layer) -> Result<()> {
        match layer
            .occupied_cells()
            .into_iter()
            .find(|(_, _, tile)| !self.tilesets.contains_tile(*tile))
        {
            Some((_, _, tile)) => Err(MapError::UnknownTile(tile)),
            None => Ok(()),
        }
    }

    /// Add a layer on top; returns its index
    pub fn add_layer(&mut self, layer: Layer) -> Result<usize> {
        self.insert_layer(self.plane.layer_count(), layer)
    }

    /// Insert a layer at `index` (clamped to the stack); returns the actual index
    pub fn insert_layer(&mut self, index: usize, layer: Layer) -> Result<usize> {
        self.check_tiles_registered(&layer)?;
        let index = self.plane.insert_layer(index, layer)?;
        log::debug!("Inserted layer at index {}", index);
        self.fire(MapEvent::LayerAdded { index });
        Ok(index)
    }

    /// Add an empty full-map tile layer named after its position
    pub fn add_default_layer(&mut self) -> usize {
        let name = format!("{} {}", self.config.layer_name_prefix, self.layer_count());
        let layer = Layer::new_tile_layer(name, self.width(), self.height());
        let index = self.plane.push_layer(layer);
        self.fire(MapEvent::LayerAdded { index });
        index
    }

    /// Add an empty full-map object group named after its position
    pub fn add_object_group(&mut self) -> usize {
        let name = format!(
            "{} {}",
            self.config.object_group_name_prefix,
            self.layer_count()
        );
        let layer = Layer::new_object_group(name, self.width(), self.height());
        let index = self.plane.push_layer(layer);
        self.fire(MapEvent::LayerAdded { index });
        index
    }

    /// Replace the layer at `index`, returning the old one
    pub fn set_layer(&mut self, index: usize, layer: Layer) -> Result<Layer> {
        self.check_tiles_registered(&layer)?;
        let old = self.plane.set_layer(index, layer)?;
        self.fire(MapEvent::LayerReplaced { index });
        Ok(old)
    }

    /// Remove and return the layer at `index`
    pub fn remove_layer(&mut self, index: usize) -> Result<Layer> {
        let layer = self.plane.remove_layer(index)?;
        log::debug!("Removed layer '{}' at index {}", layer.name, index);
        self.fire(MapEvent::LayerRemoved { index });
        Ok(layer)
    }

    /// Remove every layer, announcing each removal from the bottom
    pub fn remove_all_layers(&mut self) -> Vec<Layer> {
        let layers = self.plane.remove_all_layers();
        for _ in &layers {
            self.fire(MapEvent::LayerRemoved { index: 0 });
        }
        layers
    }

    /// Exchange the layer at `index` with the one above it.
    ///
    /// # Panics
    ///
    /// Panics if `index` is the topmost layer or out of range.
    pub fn swap_layer_up(&mut self, index: usize) {
        self.plane.swap_layer_up(index);
        self.fire(MapEvent::LayerMoved {
            from: index,
            to: index + 1,
        });
    }

    /// Exchange the layer at `index` with the one below it.
    ///
    /// # Panics
    ///
    /// Panics if `index` is the bottom layer or out of range.
    pub fn swap_layer_down(&mut self, index: usize) {
        self.plane.swap_layer_down(index);
        self.fire(MapEvent::LayerMoved {
            from: index,
            to: index - 1,
        });
    }

    /// Fold the layer at `index` onto the one below it.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0 or out of range.
    pub fn merge_layer_down(&mut self, index: usize) -> Result<()> {
        self.plane.merge_layer_down(index)?;
        log::debug!("Merged layer {} down onto {}", index, index - 1);
        self.fire(MapEvent::LayerReplaced { index: index - 1 });
        self.fire(MapEvent::LayerRemoved { index });
        Ok(())
    }

    /// Resize the map, moving content by `(dx, dy)` tiles.
    ///
    /// Full-map layers are resized along with the map; other layers are only
    /// moved.
    pub fn resize(&mut self, width: i32, height: i32, dx: i32, dy: i32) {
        log::debug!(
            "Resizing map from {}x{} to {}x{} (shift {}, {})",
            self.width(),
            self.height(),
            width,
            height,
            dx,
            dy
        );
        self.plane.resize(width, height, dx, dy);
        self.touch();
    }

    /// Grow or shrink the map to the largest layer
    pub fn fit_bounds_to_layers(&mut self) {
        self.plane.fit_bounds_to_layers();
        self.touch();
    }

    // ------------------------------------------------------------------
    // Layer content
    // ------------------------------------------------------------------

    /// Paint or clear one cell of a layer.
    ///
    /// Coordinates outside the layer are ignored. Painting a tile that does
    /// not belong to a registered tileset is refused, as is any edit of a
    /// locked layer.
    pub fn set_tile_at(
        &mut self,
        layer_index: usize,
        x: i32,
        y: i32,
        tile: Option<TileRef>,
    ) -> Result<()> {
        if let Some(tile) = tile {
            if !self.tilesets.contains_tile(tile) {
                return Err(MapError::UnknownTile(tile));
            }
        }
        let len = self.layer_count();
        let layer = self
            .plane
            .layer_mut(layer_index)
            .ok_or(MapError::LayerIndexOutOfRange {
                index: layer_index,
                len,
            })?;
        if layer.locked {
            return Err(MapError::LayerLocked {
                layer: layer.id,
                name: layer.name.clone(),
            });
        }
        if layer.set_tile_at(x, y, tile) {
            self.fire_layer_changed(layer_index);
        }
        Ok(())
    }

    /// Tile at a map coordinate of one layer
    pub fn tile_at(&self, layer_index: usize, x: i32, y: i32) -> Option<TileRef> {
        self.layer(layer_index).and_then(|l| l.tile_at(x, y))
    }

    /// Edit a layer in place and announce the change afterwards.
    ///
    /// The `locked` flag is not consulted, so this is also how a layer gets
    /// unlocked.
    pub fn with_layer_mut<R>(&mut self, index: usize, edit: impl FnOnce(&mut Layer) -> R) -> Option<R> {
        let result = edit(self.plane.layer_mut(index)?);
        self.fire_layer_changed(index);
        Some(result)
    }

    // ------------------------------------------------------------------
    // Special layers
    // ------------------------------------------------------------------

    /// Editor-only layers, in insertion order
    pub fn special_layers(&self) -> std::slice::Iter<'_, Layer> {
        self.special_layers.iter()
    }

    pub fn special_layer_mut(&mut self, id: Uuid) -> Option<&mut Layer> {
        self.special_layers.iter_mut().find(|l| l.id == id)
    }

    pub fn add_special_layer(&mut self, layer: Layer) {
        self.special_layers.push(layer);
        self.touch();
    }

    pub fn remove_special_layer(&mut self, id: Uuid) -> Option<Layer> {
        let pos = self.special_layers.iter().position(|l| l.id == id)?;
        let layer = self.special_layers.remove(pos);
        self.touch();
        Some(layer)
    }

    pub fn remove_all_special_layers(&mut self) {
        self.special_layers.clear();
        self.touch();
    }

    // ------------------------------------------------------------------
    // Map objects
    // ------------------------------------------------------------------

    /// Map-level objects in insertion order
    pub fn objects(&self) -> &[MapObject] {
        &self.objects
    }

    pub fn add_object(&mut self, object: MapObject) {
        self.objects.push(object);
        self.touch();
    }

    /// Remove a map-level object by ID
    pub fn remove_object(&mut self, id: Uuid) -> Option<MapObject> {
        let pos = self.objects.iter().position(|o| o.id == id)?;
        let object = self.objects.remove(pos);
        self.touch();
        Some(object)
    }

    // ------------------------------------------------------------------
    // Tilesets
    // ------------------------------------------------------------------

    pub fn tilesets(&self) -> &TilesetRegistry {
        &self.tilesets
    }

    /// Look up the tile behind a handle
    pub fn tile(&self, tile: TileRef) -> Option<&Tile> {
        self.tilesets.tile(tile)
    }

    /// Register a tileset.
    ///
    /// Does nothing if a tileset with the same id is already registered.
    /// The map's tile size is initialised from the first tile of the first
    /// tileset that has one. Returns whether the tileset was added.
    pub fn add_tileset(&mut self, tileset: TileSet) -> bool {
        if self.tilesets.index_of(tileset.id).is_some() {
            return false;
        }
        if self.tile_width == 0 {
            if let Some(first) = tileset.tile(0) {
                self.tile_width = first.width;
                self.tile_height = first.height;
            }
        }
        let id = tileset.id;
        let Some(index) = self.tilesets.add(tileset) else {
            return false;
        };
        self.fire(MapEvent::TilesetAdded { index, tileset: id });
        true
    }

    /// Unregister a tileset, first clearing its tiles from every layer.
    ///
    /// Fails without changing anything if a layer holding one of its tiles is
    /// locked. Returns the removed tileset, or `None` if it was not registered.
    pub fn remove_tileset(&mut self, id: Uuid) -> Result<Option<TileSet>> {
        let Some(index) = self.tilesets.index_of(id) else {
            return Ok(None);
        };

        if let Some(locked) = self
            .plane
            .layers()
            .chain(self.special_layers.iter())
            .find(|l| l.locked && l.references_tileset(id))
        {
            log::warn!(
                "Refusing to remove tileset {}: layer '{}' is locked",
                id,
                locked.name
            );
            return Err(MapError::LayerLocked {
                layer: locked.id,
                name: locked.name.clone(),
            });
        }

        let cleared: usize = self
            .plane
            .layers_mut()
            .chain(self.special_layers.iter_mut())
            .map(|layer| layer.remove_tileset_tiles(id))
            .sum();
        let tileset = self.tilesets.remove(index)?;
        log::info!(
            "Removed tileset '{}', cleared {} cell(s)",
            tileset.name,
            cleared
        );
        self.fire(MapEvent::TilesetRemoved { index });
        Ok(Some(tileset))
    }

    /// Exchange two tilesets in the registry; `i == j` is a silent no-op
    pub fn swap_tilesets(&mut self, i: usize, j: usize) -> Result<()> {
        if self.tilesets.swap(i, j)? {
            self.fire(MapEvent::TilesetsSwapped {
                first: i.min(j),
                second: i.max(j),
            });
        }
        Ok(())
    }

    /// The tileset responsible for a global tile id
    pub fn find_tileset_for_gid(&self, gid: u32) -> Option<&TileSet> {
        self.tilesets.find_for_gid(gid)
    }

    // ------------------------------------------------------------------
    // Parallax
    // ------------------------------------------------------------------

    pub fn eye_distance(&self) -> f32 {
        self.eye_distance
    }

    pub fn set_eye_distance(&mut self, distance: f32) {
        if self.eye_distance == distance {
            return;
        }
        self.eye_distance = distance;
        self.parallax_listeners.fire(ParallaxEvent {
            layer: None,
            kind: ParallaxChange::EyeDistance,
        });
    }

    pub fn set_layer_view_plane_distance(&mut self, index: usize, distance: f32) -> Result<()> {
        let len = self.layer_count();
        let layer = self
            .plane
            .layer_mut(index)
            .ok_or(MapError::LayerIndexOutOfRange { index, len })?;
        if layer.view_plane_distance != distance {
            layer.view_plane_distance = distance;
            self.parallax_listeners.fire(ParallaxEvent {
                layer: Some(index),
                kind: ParallaxChange::LayerViewPlaneDistance,
            });
        }
        Ok(())
    }
}
