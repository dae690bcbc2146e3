//! Edge validity and edge cost models.
//!
//! The pathfinder itself knows nothing about terrain. Callers hand it a
//! [`PathGrid`]: a pair of pure functions over live world state. The two
//! models here cover the common cases; anything else can implement the
//! trait directly.

use embervale_shared::grid::GridCell;
use serde::{Deserialize, Serialize};

/// Edge validity and cost supplied per search invocation.
///
/// Both functions must be pure reads of current world state; the search
/// caches nothing between calls.
pub trait PathGrid {
    /// Whether the single step `src -> dst` is allowed at all.
    ///
    /// Returning `false` removes the edge: this is the hard-obstacle path
    /// and the only way a search can end with "no path".
    fn can_traverse(&self, src: GridCell, dst: GridCell) -> bool;

    /// Cost of the single step `src -> dst`.
    ///
    /// Blocked-but-kept edges return a large finite sentinel instead of
    /// being removed, so the graph stays connected.
    fn edge_cost(&self, src: GridCell, dst: GridCell) -> f64;

    /// The cheapest possible single step, used to scale the heuristic.
    ///
    /// Must not exceed any value `edge_cost` can return or the heuristic
    /// stops being admissible.
    fn min_step_cost(&self) -> f64 {
        1.0
    }
}

/// The step-cost family. All values are finite and positive.
///
/// Loaded once at startup; the defaults match the tuning the rest of the
/// world assumes (straight steps slightly cheaper than diagonals, occupied
/// cells two orders of magnitude worse, blocked cells priced out entirely).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PathCosts {
    /// Free orthogonal step
    pub orthogonal: f64,
    /// Free diagonal step (slightly above orthogonal to bias straight lines)
    pub diagonal: f64,
    /// Orthogonal step onto walkable ground currently occupied by a creature
    pub occupied_orthogonal: f64,
    /// Diagonal step onto walkable ground currently occupied by a creature
    pub occupied_diagonal: f64,
    /// Soft-obstacle sentinel for unwalkable ground
    pub blocked: f64,
    /// Node-expansion budget per search; exhausting it reads as "no path"
    pub max_expansions: usize,
}

impl Default for PathCosts {
    fn default() -> Self {
        Self {
            orthogonal: 1.0,
            diagonal: 1.1,
            occupied_orthogonal: 100.0,
            occupied_diagonal: 100.1,
            blocked: 10_000.0,
            max_expansions: 4_096,
        }
    }
}

impl PathCosts {
    /// The cheapest step in the family
    #[must_use]
    pub fn min_step(&self) -> f64 {
        self.orthogonal.min(self.diagonal)
    }
}

/// Live occupancy of a map, owned by the world.
///
/// Implementations read mutable world state; the pathfinder only ever sees
/// them through `&self` for the duration of one search.
pub trait OccupancyView {
    /// Whether the ground at `cell` can ever be stood on
    fn walkable(&self, cell: GridCell) -> bool;

    /// Whether a creature currently stands on `cell`
    fn occupied(&self, cell: GridCell) -> bool;
}

/// Step classification shared by both cost models.
fn shaped_cost<V: OccupancyView>(view: &V, costs: &PathCosts, src: GridCell, dst: GridCell) -> f64 {
    match src.distance2(dst) {
        1 => {
            if !view.walkable(dst) {
                costs.blocked
            } else if view.occupied(dst) {
                costs.occupied_orthogonal
            } else {
                costs.orthogonal
            }
        }
        2 => {
            if !view.walkable(dst) {
                costs.blocked
            } else if view.occupied(dst) {
                costs.occupied_diagonal
            } else {
                costs.diagonal
            }
        }
        // Not a single 8-connected step; priced out rather than asserted
        // because the search only ever generates real neighbors.
        _ => costs.blocked,
    }
}

/// Best-effort model: every edge stays traversable, obstacles are priced.
///
/// Used for client-style movement toward a clicked cell: the returned path
/// approaches the goal as closely as the cost landscape allows.
pub struct ClientCostModel<'a, V> {
    view: &'a V,
    costs: PathCosts,
}

impl<'a, V: OccupancyView> ClientCostModel<'a, V> {
    /// Creates a model over a live occupancy view
    pub fn new(view: &'a V, costs: PathCosts) -> Self {
        Self { view, costs }
    }
}

impl<V: OccupancyView> PathGrid for ClientCostModel<'_, V> {
    fn can_traverse(&self, _src: GridCell, _dst: GridCell) -> bool {
        true
    }

    fn edge_cost(&self, src: GridCell, dst: GridCell) -> f64 {
        shaped_cost(self.view, &self.costs, src, dst)
    }

    fn min_step_cost(&self) -> f64 {
        self.costs.min_step()
    }
}

/// Authoritative model: unwalkable edges are removed, occupancy is priced.
///
/// Used server-side to plan single steps; a search that returns "no path"
/// here means true disconnection.
pub struct ServerCostModel<'a, V> {
    view: &'a V,
    costs: PathCosts,
}

impl<'a, V: OccupancyView> ServerCostModel<'a, V> {
    /// Creates a model over a live occupancy view
    pub fn new(view: &'a V, costs: PathCosts) -> Self {
        Self { view, costs }
    }
}

impl<V: OccupancyView> PathGrid for ServerCostModel<'_, V> {
    fn can_traverse(&self, src: GridCell, dst: GridCell) -> bool {
        matches!(src.distance2(dst), 1 | 2) && self.view.walkable(dst)
    }

    fn edge_cost(&self, src: GridCell, dst: GridCell) -> f64 {
        shaped_cost(self.view, &self.costs, src, dst)
    }

    fn min_step_cost(&self) -> f64 {
        self.costs.min_step()
    }
}
