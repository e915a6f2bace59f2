use image::{Rgba, RgbaImage};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tilemap_core::{
    Layer, ListenerId, Map, MapError, MapEvent, Tile, TileMerger, TileRef, TileSet,
};

fn solid(color: [u8; 4]) -> Tile {
    Tile::from_image(RgbaImage::from_pixel(16, 16, Rgba(color)))
}

/// A map with one registered two-tile set
fn map_with_tiles(width: i32, height: i32) -> (Map, TileRef, TileRef) {
    let mut map = Map::new(width, height);
    let mut set = TileSet::new("Terrain".to_string());
    let grass = set.add_tile(solid([0, 255, 0, 255]));
    let rock = set.add_tile(solid([255, 0, 0, 255]));
    map.add_tileset(set);
    (map, grass, rock)
}

#[test]
fn test_swap_up_then_down_restores_order() {
    let mut map = Map::new(4, 4);
    for _ in 0..4 {
        map.add_default_layer();
    }
    let before: Vec<_> = map.layers().map(|l| l.id).collect();

    map.swap_layer_up(1);
    assert_ne!(map.layer(1).unwrap().id, before[1]);
    map.swap_layer_down(2);

    let after: Vec<_> = map.layers().map(|l| l.id).collect();
    assert_eq!(before, after);
}

#[test]
#[should_panic(expected = "already at the top")]
fn test_swap_topmost_layer_up_panics() {
    let mut map = Map::new(4, 4);
    map.add_default_layer();
    map.add_default_layer();
    map.swap_layer_up(1);
}

#[test]
fn test_gid_lookup_picks_last_set_not_above_gid() {
    let mut map = Map::new(4, 4);
    let mut ids = Vec::new();
    for (name, first_gid) in [("a", 1), ("b", 50), ("c", 120)] {
        let mut set = TileSet::new(name.to_string());
        set.first_gid = first_gid;
        for _ in 0..30 {
            set.add_tile(Tile::new(16, 16));
        }
        ids.push(set.id);
        map.add_tileset(set);
    }

    assert_eq!(map.find_tileset_for_gid(75).map(|t| t.id), Some(ids[1]));
    assert_eq!(map.find_tileset_for_gid(120).map(|t| t.id), Some(ids[2]));
    assert_eq!(map.find_tileset_for_gid(1).map(|t| t.id), Some(ids[0]));
    assert!(map.find_tileset_for_gid(0).is_none());

    let tile = map.tilesets().resolve_gid(75).unwrap();
    assert_eq!(tile, TileRef::new(ids[1], 25));
    assert_eq!(map.tilesets().gid_for_tile(tile), Some(75));
}

#[test]
fn test_remove_tileset_clears_its_tiles() {
    let (mut map, grass, _) = map_with_tiles(3, 3);
    let mut other = TileSet::new("Other".to_string());
    let water = other.add_tile(solid([0, 0, 200, 255]));
    map.add_tileset(other);
    map.add_default_layer();
    map.add_default_layer();
    map.set_tile_at(0, 0, 0, Some(grass)).unwrap();
    map.set_tile_at(1, 2, 2, Some(grass)).unwrap();
    map.set_tile_at(1, 1, 1, Some(water)).unwrap();

    let removed = map.remove_tileset(grass.tileset).unwrap().unwrap();
    assert_eq!(removed.name, "Terrain");
    assert_eq!(map.tilesets().len(), 1);
    assert!(map
        .layers()
        .flat_map(|l| l.occupied_cells())
        .all(|(_, _, tile)| tile.tileset != grass.tileset));
    assert_eq!(map.tile_at(1, 1, 1), Some(water));
    assert!(map.remove_tileset(grass.tileset).unwrap().is_none());
}

#[test]
fn test_remove_tileset_refused_by_locked_layer() {
    let (mut map, grass, _) = map_with_tiles(3, 3);
    map.add_default_layer();
    map.add_default_layer();
    map.set_tile_at(0, 0, 0, Some(grass)).unwrap();
    map.set_tile_at(1, 1, 0, Some(grass)).unwrap();
    map.layer_mut(1).unwrap().locked = true;

    let events = Rc::new(Cell::new(0));
    let counter = Rc::clone(&events);
    map.listeners()
        .add(Rc::new(move |_: &MapEvent| counter.set(counter.get() + 1)));

    assert!(matches!(
        map.remove_tileset(grass.tileset),
        Err(MapError::LayerLocked { .. })
    ));
    assert_eq!(map.tilesets().len(), 1);
    assert_eq!(map.tile_at(0, 0, 0), Some(grass));
    assert_eq!(map.tile_at(1, 1, 0), Some(grass));
    assert_eq!(events.get(), 0);
}

#[test]
fn test_merge_shares_tiles_between_identical_stacks() {
    let (mut map, grass, rock) = map_with_tiles(4, 2);
    map.add_default_layer();
    map.add_default_layer();
    for y in 0..2 {
        for x in 0..4 {
            map.set_tile_at(0, x, y, Some(grass)).unwrap();
        }
    }
    map.set_tile_at(1, 0, 0, Some(rock)).unwrap();
    map.set_tile_at(1, 2, 1, Some(rock)).unwrap();

    let mut merger = TileMerger::new();
    let merged = merger.merge(&map, 0, 2, false).unwrap();

    assert_eq!(merged.name, "Merged");
    assert_eq!((merged.width(), merged.height()), (4, 2));
    assert_eq!(merger.tileset().tile_count(), 2);
    assert_eq!(merged.tile_at(0, 0), merged.tile_at(2, 1));
    assert_eq!(merged.tile_at(1, 0), merged.tile_at(3, 1));
    assert_ne!(merged.tile_at(0, 0), merged.tile_at(1, 0));

    let top = merger.tileset().tile(merged.tile_at(0, 0).unwrap().id).unwrap();
    assert_eq!(
        *top.image.as_ref().unwrap().get_pixel(8, 8),
        Rgba([255, 0, 0, 255])
    );
}

#[test]
fn test_repeated_merge_is_deterministic() {
    let (mut map, grass, rock) = map_with_tiles(3, 3);
    map.add_default_layer();
    map.add_default_layer();
    map.set_tile_at(0, 1, 1, Some(grass)).unwrap();
    map.set_tile_at(1, 1, 1, Some(rock)).unwrap();
    map.set_tile_at(1, 2, 0, Some(rock)).unwrap();

    let mut merger = TileMerger::new();
    let first = merger.merge(&map, 0, 2, false).unwrap();
    let second = merger.merge(&map, 0, 2, false).unwrap();

    assert_eq!(first.tiles(), second.tiles());
    assert_eq!(merger.cached_stacks(), 2);
    assert_eq!(first.tile_at(0, 0), None);
}

#[test]
fn test_merge_skips_hidden_layers_unless_requested() {
    let (mut map, grass, rock) = map_with_tiles(2, 1);
    map.add_default_layer();
    map.add_default_layer();
    map.set_tile_at(0, 0, 0, Some(grass)).unwrap();
    map.set_tile_at(1, 0, 0, Some(rock)).unwrap();
    map.set_tile_at(1, 1, 0, Some(rock)).unwrap();
    map.layer_mut(1).unwrap().visible = false;

    let visible_only = TileMerger::new().merge(&map, 0, 2, false).unwrap();
    assert!(visible_only.tile_at(0, 0).is_some());
    assert_eq!(visible_only.tile_at(1, 0), None);

    let everything = TileMerger::new().merge(&map, 0, 2, true).unwrap();
    assert!(everything.tile_at(1, 0).is_some());
}

#[test]
fn test_merged_layer_can_be_added_with_its_tileset() {
    let (mut map, grass, _) = map_with_tiles(2, 2);
    map.add_default_layer();
    map.set_tile_at(0, 1, 1, Some(grass)).unwrap();

    let mut merger = TileMerger::new();
    let merged = merger.merge(&map, 0, 1, false).unwrap();
    assert!(matches!(
        map.add_layer(merged.clone()),
        Err(MapError::UnknownTile(_))
    ));

    map.add_tileset(merger.into_tileset());
    assert_eq!(map.add_layer(merged).unwrap(), 1);
}

#[test]
fn test_resize_shifts_content() {
    let (mut map, grass, _) = map_with_tiles(4, 4);
    map.add_default_layer();
    let mut small = Layer::new_tile_layer("Detail".to_string(), 2, 2);
    small.set_offset(1, 1);
    small.set_tile_at(1, 1, Some(grass));
    map.add_layer(small).unwrap();
    map.set_tile_at(0, 0, 0, Some(grass)).unwrap();
    map.set_tile_at(0, 3, 3, Some(grass)).unwrap();

    map.resize(6, 7, 2, 3);

    assert_eq!((map.width(), map.height()), (6, 7));
    let ground = map.layer(0).unwrap();
    assert_eq!((ground.width(), ground.height()), (6, 7));
    assert_eq!(ground.tile_at(2, 3), Some(grass));
    assert_eq!(ground.tile_at(5, 6), Some(grass));
    assert_eq!(ground.tile_at(0, 0), None);

    let detail = map.layer(1).unwrap();
    assert_eq!((detail.width(), detail.height()), (2, 2));
    assert_eq!(detail.offset(), (3, 4));
    assert_eq!(detail.tile_at(3, 4), Some(grass));
}

#[test]
fn test_listener_can_remove_itself_during_dispatch() {
    let mut map = Map::new(4, 4);
    let handle = map.listeners().clone();
    let own_id: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

    let once_calls = Rc::new(Cell::new(0));
    let calls = Rc::clone(&once_calls);
    let id_slot = Rc::clone(&own_id);
    let id = map.listeners().add(Rc::new(move |event: &MapEvent| {
        if let MapEvent::LayerAdded { .. } = event {
            calls.set(calls.get() + 1);
            if let Some(id) = id_slot.get() {
                handle.remove(id);
            }
        }
    }));
    own_id.set(Some(id));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    map.listeners()
        .add(Rc::new(move |event: &MapEvent| sink.borrow_mut().push(*event)));

    map.add_default_layer();
    map.add_default_layer();

    assert_eq!(once_calls.get(), 1);
    assert_eq!(map.listeners().len(), 1);
    assert_eq!(
        *seen.borrow(),
        vec![
            MapEvent::LayerAdded { index: 0 },
            MapEvent::LayerAdded { index: 1 },
        ]
    );
}

#[test]
fn test_listener_removing_a_later_listener_during_dispatch() {
    let mut map = Map::new(4, 4);
    let handle = map.listeners().clone();
    let later_id: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

    let target = Rc::clone(&later_id);
    map.listeners().add(Rc::new(move |_: &MapEvent| {
        if let Some(id) = target.take() {
            handle.remove(id);
        }
    }));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let id = map
        .listeners()
        .add(Rc::new(move |event: &MapEvent| sink.borrow_mut().push(*event)));
    later_id.set(Some(id));

    map.add_default_layer();
    map.add_default_layer();

    assert_eq!(*seen.borrow(), vec![MapEvent::LayerAdded { index: 0 }]);
    assert_eq!(map.listeners().len(), 1);
}

#[test]
fn test_locked_layer_refuses_painting() {
    let (mut map, grass, _) = map_with_tiles(2, 2);
    map.add_default_layer();
    map.set_tile_at(0, 1, 1, Some(grass)).unwrap();
    map.layer_mut(0).unwrap().locked = true;

    assert!(matches!(
        map.set_tile_at(0, 0, 0, Some(grass)),
        Err(MapError::LayerLocked { .. })
    ));
    assert!(matches!(
        map.set_tile_at(0, 1, 1, None),
        Err(MapError::LayerLocked { .. })
    ));
    assert_eq!(map.tile_at(0, 0, 0), None);
    assert_eq!(map.tile_at(0, 1, 1), Some(grass));
}

#[test]
fn test_merge_run_length_overflow() {
    let (mut map, _, _) = map_with_tiles(2, 2);
    map.add_default_layer();
    assert!(matches!(
        TileMerger::new().merge(&map, 1, usize::MAX, false),
        Err(MapError::MergeRunOutOfRange { .. })
    ));
}
