//! Defaults applied when creating maps and merging layers

use crate::Result;
use serde::{Deserialize, Serialize};

/// Map creation defaults
///
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Distance from the viewer to the view plane, for parallax views
    pub eye_distance: f32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Prefix for generated tile layer names ("Layer 3")
    pub layer_name_prefix: String,
    /// Prefix for generated object group names ("ObjectGroup 1")
    pub object_group_name_prefix: String,
    /// Name of the tileset collecting merged tiles
    pub merged_tileset_name: String,
    /// Name of the layer produced by a merge
    pub merged_layer_name: String,
    /// ZX Spectrum screen geometry, for maps measured in screens
    pub zx_screen: ZxScreen,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            eye_distance: 100.0,
            viewport_width: 640,
            viewport_height: 480,
            layer_name_prefix: "Layer".to_string(),
            object_group_name_prefix: "ObjectGroup".to_string(),
            merged_tileset_name: "Merged Set".to_string(),
            merged_layer_name: "Merged".to_string(),
            zx_screen: ZxScreen::default(),
        }
    }
}

impl MapConfig {
    /// Parse a (possibly partial) JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Size of one ZX Spectrum screen in tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZxScreen {
    pub width: i32,
    pub height: i32,
    pub tile_size: u32,
}

impl Default for ZxScreen {
    fn default() -> Self {
        Self {
            width: 15,
            height: 10,
            tile_size: 16,
        }
    }
}

impl ZxScreen {
    /// Width in pixels of one screen
    pub fn width_in_pixels(&self) -> u32 {
        self.width as u32 * self.tile_size
    }

    /// Height in pixels of one screen
    pub fn height_in_pixels(&self) -> u32 {
        self.height as u32 * self.tile_size
    }
}
