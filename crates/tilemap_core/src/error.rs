//! Error type shared by every map operation

use crate::{LayerType, TileRef};
use thiserror::Error;
use uuid::Uuid;

/// Recoverable failures reported by the map core.
///
/// Caller contract violations (swapping the top layer up, merging the bottom
/// layer down) are not represented here; those operations panic instead.
#[derive(Debug, Error)]
pub enum MapError {
    /// A layer index outside `0..len`
    #[error("layer index {index} out of range (layer count {len})")]
    LayerIndexOutOfRange { index: usize, len: usize },

    /// A tileset index outside `0..len`
    #[error("tileset index {index} out of range (tileset count {len})")]
    TilesetIndexOutOfRange { index: usize, len: usize },

    /// The layer is locked against edits
    #[error("layer '{name}' is locked")]
    LayerLocked { layer: Uuid, name: String },

    /// Merging these two layer kinds has no defined composition
    #[error("cannot merge a {upper:?} layer onto a {lower:?} layer")]
    UnsupportedMerge { upper: LayerType, lower: LayerType },

    /// The layer is already part of the stack
    #[error("layer {0} is already part of this map")]
    DuplicateLayer(Uuid),

    /// The tile belongs to a tileset that is not registered on the map
    #[error("tile {0:?} does not belong to a registered tileset")]
    UnknownTile(TileRef),

    /// The requested merge run does not fit in the layer stack
    #[error("merge run of {len} layer(s) from index {start} exceeds layer count {layers}")]
    MergeRunOutOfRange {
        start: usize,
        len: usize,
        layers: usize,
    },

    /// Configuration could not be parsed
    #[error("invalid map configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MapError>;
