//! Change notification for map observers (views, undo history)
//!
//! Mutations on a [`crate::Map`] are announced synchronously, after the
//! mutation has been applied, to every listener registered in the matching
//! category. Listeners may add or remove listeners while being notified:
//! dispatch works on a snapshot of the listener list taken before the first
//! callback runs.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Structural or content change on a map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    /// Generic change (resize, tile size, orientation, special layers, `touch`)
    MapChanged,
    LayerAdded {
        index: usize,
    },
    LayerRemoved {
        index: usize,
    },
    LayerMoved {
        from: usize,
        to: usize,
    },
    /// The layer at `index` was swapped for a different one
    LayerReplaced {
        index: usize,
    },
    /// Content or attributes of the layer at `index` changed
    LayerChanged {
        index: usize,
    },
    TilesetAdded {
        index: usize,
        tileset: Uuid,
    },
    TilesetRemoved {
        index: usize,
    },
    /// Two tilesets exchanged positions; `first < second`
    TilesetsSwapped {
        first: usize,
        second: usize,
    },
}

/// Which parallax parameter changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallaxChange {
    EyeDistance,
    LayerViewPlaneDistance,
}

/// A parallax parameter changed; `layer` is `None` for map-wide parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallaxEvent {
    pub layer: Option<usize>,
    pub kind: ParallaxChange,
}

/// Receives structural and content changes
pub trait MapChangeListener {
    fn map_changed(&self, event: &MapEvent);
}

impl<F: Fn(&MapEvent)> MapChangeListener for F {
    fn map_changed(&self, event: &MapEvent) {
        self(event)
    }
}

/// Receives parallax parameter changes
pub trait ParallaxChangeListener {
    fn parallax_changed(&self, event: &ParallaxEvent);
}

impl<F: Fn(&ParallaxEvent)> ParallaxChangeListener for F {
    fn parallax_changed(&self, event: &ParallaxEvent) {
        self(event)
    }
}

/// Handle identifying a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registered<L: ?Sized> {
    id: ListenerId,
    listener: Rc<L>,
}

struct RegistryInner<L: ?Sized> {
    next_id: u64,
    entries: Vec<Registered<L>>,
}

/// Shared, ordered collection of listeners of one category
///
/// Cloning yields another handle to the same collection, which is how a
/// listener can unregister itself (or others) from inside a callback.
pub struct ListenerRegistry<L: ?Sized> {
    inner: Rc<RefCell<RegistryInner<L>>>,
}

impl<L: ?Sized> ListenerRegistry<L> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryInner {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a listener; it is notified after all earlier registrations
    pub fn add(&self, listener: Rc<L>) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.entries.push(Registered { id, listener });
        id
    }

    /// Unregister a listener; returns whether it was present
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.entries.len();
        inner.entries.retain(|entry| entry.id != id);
        inner.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().entries.clear();
    }

    /// The listeners in registration order, detached from the live collection
    pub fn snapshot(&self) -> Vec<Rc<L>> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|entry| Rc::clone(&entry.listener))
            .collect()
    }

    /// Call `deliver` for every listener captured at the time of the call
    pub fn dispatch(&self, mut deliver: impl FnMut(&L)) {
        // The borrow must end before any callback can touch the registry.
        let listeners = self.snapshot();
        for listener in &listeners {
            deliver(&**listener);
        }
    }
}

impl<L: ?Sized> Clone for ListenerRegistry<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> fmt::Debug for ListenerRegistry<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Listener collection for [`MapEvent`]s
pub type MapListeners = ListenerRegistry<dyn MapChangeListener>;

/// Listener collection for [`ParallaxEvent`]s
pub type ParallaxListeners = ListenerRegistry<dyn ParallaxChangeListener>;

impl ListenerRegistry<dyn MapChangeListener> {
    /// Deliver a map event to the current listeners
    pub fn fire(&self, event: MapEvent) {
        log::trace!("Dispatching {:?} to {} listener(s)", event, self.len());
        self.dispatch(|listener| listener.map_changed(&event));
    }
}

impl ListenerRegistry<dyn ParallaxChangeListener> {
    /// Deliver a parallax event to the current listeners
    pub fn fire(&self, event: ParallaxEvent) {
        log::trace!("Dispatching {:?} to {} listener(s)", event, self.len());
        self.dispatch(|listener| listener.parallax_changed(&event));
    }
}
