//! Tiles and tile handles

use crate::Properties;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle to a tile owned by a tileset
///
/// Two cells show the same tile exactly when their handles are equal; this is
/// the identity used by tile removal and by merge deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileRef {
    /// The owning tileset
    pub tileset: Uuid,
    /// Local id within the owning tileset
    pub id: u32,
}

impl TileRef {
    pub fn new(tileset: Uuid, id: u32) -> Self {
        Self { tileset, id }
    }
}

/// A single tile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tile {
    pub width: u32,
    pub height: u32,
    /// Pixel content, supplied by whoever loads the tileset
    #[serde(skip)]
    pub image: Option<RgbaImage>,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

impl Tile {
    /// Create a tile without image content
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            image: None,
            properties: Properties::new(),
        }
    }

    /// Create a tile sized to its image
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            image: Some(image),
            properties: Properties::new(),
        }
    }

    /// Replace the image, resizing the tile to match
    pub fn set_image(&mut self, image: RgbaImage) {
        self.width = image.width();
        self.height = image.height();
        self.image = Some(image);
    }
}
