//! Core data structures for layered tile maps
//!
//! This crate provides the model behind a tile map editor:
//! - `Map` - Layer stack, tilesets, parallax settings and change notification
//! - `LayerPlane` - Ordered stack of layers sharing one bounding rectangle
//! - `Layer` - A single layer (tiles, objects or a selection mask)
//! - `TileSet` / `TilesetRegistry` - Tile collections and global tile id lookup
//! - `TileMerger` - Flattens runs of layers into shared composited tiles
//! - `MapListeners` - Ordered, re-entrant listener collections

mod bounds;
mod config;
mod error;
mod events;
mod layer;
mod map;
mod merge;
mod object;
mod plane;
mod registry;
mod tile;
mod tileset;
mod value;

pub use bounds::Rect;
pub use config::{MapConfig, ZxScreen};
pub use error::{MapError, Result};
pub use events::{
    ListenerId, ListenerRegistry, MapChangeListener, MapEvent, MapListeners, ParallaxChange,
    ParallaxChangeListener, ParallaxEvent, ParallaxListeners,
};
pub use layer::{Layer, LayerData, LayerType};
pub use map::{Map, Orientation};
pub use merge::{TileMerger, TileStack};
pub use object::MapObject;
pub use plane::LayerPlane;
pub use registry::TilesetRegistry;
pub use tile::{Tile, TileRef};
pub use tileset::TileSet;
pub use value::{Properties, Value};
