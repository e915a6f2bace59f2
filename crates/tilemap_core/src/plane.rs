//! Ordered layer stack sharing one coordinate grid

use crate::{Layer, MapError, Rect, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stack of layers over a common grid; index 0 is the bottom layer
///
/// This is the structural core shared by maps and brushes. It performs no
/// change notification; [`crate::Map`] wraps it for that.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerPlane {
    bounds: Rect,
    layers: Vec<Layer>,
}

impl LayerPlane {
    /// Create an empty plane of the given size in tiles
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            bounds: Rect::sized(width, height),
            layers: Vec::new(),
        }
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

    /// Whether the tile coordinate lies within the plane
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.bounds.contains(x, y)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Get layer by index
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Get mutable layer by index
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    /// Layers from bottom to top
    pub fn layers(&self) -> std::slice::Iter<'_, Layer> {
        self.layers.iter()
    }

    pub fn layers_mut(&mut self) -> std::slice::IterMut<'_, Layer> {
        self.layers.iter_mut()
    }

    /// Position of the layer with the given id
    pub fn find_layer_index(&self, id: Uuid) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.layers.len() {
            Ok(())
        } else {
            Err(MapError::LayerIndexOutOfRange {
                index,
                len: self.layers.len(),
            })
        }
    }

    fn check_unique(&self, layer: &Layer) -> Result<()> {
        match self.find_layer_index(layer.id) {
            Some(_) => Err(MapError::DuplicateLayer(layer.id)),
            None => Ok(()),
        }
    }

    /// Add a layer on top; returns its index
    pub fn add_layer(&mut self, layer: Layer) -> Result<usize> {
        self.insert_layer(self.layers.len(), layer)
    }

    /// Insert a layer at `index`, clamped to `0..=len`; returns the actual index
    pub fn insert_layer(&mut self, index: usize, layer: Layer) -> Result<usize> {
        self.check_unique(&layer)?;
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
        Ok(index)
    }

    /// Append a layer known to have a fresh identity
    pub(crate) fn push_layer(&mut self, layer: Layer) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    /// Replace the layer at `index`, returning the old one
    pub fn set_layer(&mut self, index: usize, layer: Layer) -> Result<Layer> {
        self.check_index(index)?;
        if let Some(existing) = self.find_layer_index(layer.id) {
            if existing != index {
                return Err(MapError::DuplicateLayer(layer.id));
            }
        }
        Ok(std::mem::replace(&mut self.layers[index], layer))
    }

    /// Remove and return the layer at `index`
    pub fn remove_layer(&mut self, index: usize) -> Result<Layer> {
        self.check_index(index)?;
        Ok(self.layers.remove(index))
    }

    /// Remove every layer, bottom first
    pub fn remove_all_layers(&mut self) -> Vec<Layer> {
        std::mem::take(&mut self.layers)
    }

    /// Exchange the layer at `index` with the one above it.
    ///
    /// # Panics
    ///
    /// Panics if `index` is the topmost layer or out of range.
    pub fn swap_layer_up(&mut self, index: usize) {
        assert!(
            index + 1 < self.layers.len(),
            "can't swap layer {index} up: already at the top of {} layers",
            self.layers.len()
        );
        self.layers.swap(index, index + 1);
    }

    /// Exchange the layer at `index` with the one below it.
    ///
    /// # Panics
    ///
    /// Panics if `index` is the bottom layer or out of range.
    pub fn swap_layer_down(&mut self, index: usize) {
        assert!(
            index >= 1 && index < self.layers.len(),
            "can't swap layer {index} down: already at the bottom of {} layers",
            self.layers.len()
        );
        self.layers.swap(index, index - 1);
    }

    /// Fold the layer at `index` onto a copy of the layer below it.
    ///
    /// The copy replaces the lower layer and the upper layer is removed. Only
    /// tile layers can be merged; any other pairing is rejected without
    /// touching the stack, as is a locked lower layer.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0 or out of range.
    pub fn merge_layer_down(&mut self, index: usize) -> Result<()> {
        assert!(
            index >= 1 && index < self.layers.len(),
            "can't merge layer {index} down: needs a layer below it (layer count {})",
            self.layers.len()
        );
        let upper = &self.layers[index];
        let mut merged = self.layers[index - 1].duplicate();
        upper.merge_onto(&mut merged)?;
        self.layers[index - 1] = merged;
        self.layers.remove(index);
        Ok(())
    }

    /// Change the plane size without touching any layer
    pub fn set_size(&mut self, width: i32, height: i32) {
        self.bounds.width = width;
        self.bounds.height = height;
    }

    /// Resize the plane, moving content by `(dx, dy)`.
    ///
    /// Layers whose bounds equal the old plane bounds are resized along with
    /// it; every other layer keeps its size and is only moved.
    pub fn resize(&mut self, width: i32, height: i32, dx: i32, dy: i32) {
        let old = self.bounds;
        for layer in &mut self.layers {
            if layer.bounds() == old {
                layer.resize(width, height, dx, dy);
            } else {
                let (x, y) = layer.offset();
                layer.set_offset(x + dx, y + dy);
            }
        }
        self.set_size(width, height);
    }

    /// Grow or shrink the plane to the largest layer size
    pub fn fit_bounds_to_layers(&mut self) {
        let width = self.layers.iter().map(|l| l.width()).max().unwrap_or(0);
        let height = self.layers.iter().map(|l| l.height()).max().unwrap_or(0);
        self.set_size(width, height);
    }
}

impl<'a> IntoIterator for &'a LayerPlane {
    type Item = &'a Layer;
    type IntoIter = std::slice::Iter<'a, Layer>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.iter()
    }
}
