//! # Map Terrain and Occupancy
//!
//! One [`MapTerrain`] per map: static walkability plus the live occupancy
//! table. The map keeper is the only writer of occupancy; creatures share
//! the same `Arc` read-only as the [`OccupancyView`] their pathfinding
//! sees. That split keeps creature-side path decisions advisory while the
//! keeper's commit remains the single source of truth.
//!
//! The [`MapAtlas`] is the injected registry of live maps. The world loop
//! fills it as keepers spawn; the world service routes map switches by it
//! and players rebind their advisory terrain from it after a committed
//! switch.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use embervale_actor::Address;
use embervale_path::OccupancyView;
use embervale_shared::GridCell;

#[derive(Default)]
struct Occupancy {
    by_cell: HashMap<GridCell, u64>,
    by_uid: HashMap<u64, GridCell>,
}

/// Static ground plus live occupancy for one map.
pub struct MapTerrain {
    map_id: u32,
    width: i32,
    height: i32,
    walls: HashSet<GridCell>,
    occupancy: RwLock<Occupancy>,
}

impl MapTerrain {
    /// An open rectangle of walkable ground.
    #[must_use]
    pub fn new(map_id: u32, width: i32, height: i32) -> Self {
        Self {
            map_id,
            width,
            height,
            walls: HashSet::new(),
            occupancy: RwLock::new(Occupancy::default()),
        }
    }

    /// Marks a cell unwalkable. Call during map construction, before the
    /// terrain is shared.
    pub fn block(&mut self, cell: GridCell) {
        self.walls.insert(cell);
    }

    /// The map this terrain belongs to.
    #[must_use]
    pub fn map_id(&self) -> u32 {
        self.map_id
    }

    /// Whether a cell lies inside the map rectangle.
    #[must_use]
    pub fn in_bounds(&self, cell: GridCell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    /// Places a uid on a cell. Fails if the ground is unwalkable, the cell
    /// is taken, or the uid already stands somewhere.
    pub fn occupy(&self, uid: u64, cell: GridCell) -> bool {
        if !self.walkable(cell) {
            return false;
        }
        let mut occupancy = self.occupancy.write();
        if occupancy.by_cell.contains_key(&cell) || occupancy.by_uid.contains_key(&uid) {
            return false;
        }
        occupancy.by_cell.insert(cell, uid);
        occupancy.by_uid.insert(uid, cell);
        true
    }

    /// Removes a uid from the map, returning the cell it stood on.
    pub fn vacate(&self, uid: u64) -> Option<GridCell> {
        let mut occupancy = self.occupancy.write();
        let cell = occupancy.by_uid.remove(&uid)?;
        occupancy.by_cell.remove(&cell);
        Some(cell)
    }

    /// Commits a single step atomically: the uid must currently stand on
    /// `from`, and `to` must be walkable and free.
    pub fn move_occupant(&self, uid: u64, from: GridCell, to: GridCell) -> bool {
        if !self.walkable(to) {
            return false;
        }
        let mut occupancy = self.occupancy.write();
        if occupancy.by_uid.get(&uid) != Some(&from) {
            return false;
        }
        if occupancy.by_cell.contains_key(&to) {
            return false;
        }
        occupancy.by_cell.remove(&from);
        occupancy.by_cell.insert(to, uid);
        occupancy.by_uid.insert(uid, to);
        true
    }

    /// Who stands on a cell, if anyone.
    #[must_use]
    pub fn occupant_at(&self, cell: GridCell) -> Option<u64> {
        self.occupancy.read().by_cell.get(&cell).copied()
    }

    /// Where a uid stands, if it is on this map.
    #[must_use]
    pub fn position_of(&self, uid: u64) -> Option<GridCell> {
        self.occupancy.read().by_uid.get(&uid).copied()
    }

    /// Snapshot of every occupant and their cell, for view fan-out.
    #[must_use]
    pub fn occupant_cells(&self) -> Vec<(u64, GridCell)> {
        self.occupancy
            .read()
            .by_uid
            .iter()
            .map(|(uid, cell)| (*uid, *cell))
            .collect()
    }

    /// Number of occupants on the map.
    #[must_use]
    pub fn population(&self) -> usize {
        self.occupancy.read().by_uid.len()
    }
}

impl OccupancyView for MapTerrain {
    fn walkable(&self, cell: GridCell) -> bool {
        self.in_bounds(cell) && !self.walls.contains(&cell)
    }

    fn occupied(&self, cell: GridCell) -> bool {
        self.occupancy.read().by_cell.contains_key(&cell)
    }
}

/// One live map as the rest of the world sees it.
#[derive(Clone)]
pub struct MapEntry {
    /// Identity of the map's keeper actor.
    pub keeper_uid: u64,
    /// Mailbox of the map's keeper actor.
    pub keeper_addr: Address,
    /// The map's shared terrain and occupancy view.
    pub terrain: Arc<MapTerrain>,
}

/// Registry of live maps, keyed by map id.
#[derive(Default)]
pub struct MapAtlas {
    entries: RwLock<HashMap<u32, MapEntry>>,
}

impl MapAtlas {
    /// An empty atlas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a map. Refuses a duplicate id; two keepers for one map
    /// is a wiring defect the caller must surface.
    pub fn insert(&self, map_id: u32, entry: MapEntry) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&map_id) {
            return false;
        }
        entries.insert(map_id, entry);
        true
    }

    /// Looks up a live map.
    #[must_use]
    pub fn entry(&self, map_id: u32) -> Option<MapEntry> {
        self.entries.read().get(&map_id).cloned()
    }

    /// The shared terrain of a live map.
    #[must_use]
    pub fn terrain(&self, map_id: u32) -> Option<Arc<MapTerrain>> {
        self.entries.read().get(&map_id).map(|entry| Arc::clone(&entry.terrain))
    }

    /// Number of registered maps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` when no map is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
