//! Free-form objects placed on object groups

use crate::Properties;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An object positioned in pixels relative to its object group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapObject {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub object_type: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Image reference, resolved by whoever renders the object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

impl MapObject {
    /// Create a new object at a pixel position
    pub fn new(name: String, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            object_type: String::new(),
            x,
            y,
            width,
            height,
            image: None,
            properties: Properties::new(),
        }
    }

    /// Whether the pixel position falls inside the object's box
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && py >= self.y && px < self.x + self.width && py < self.y + self.height
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }
}
