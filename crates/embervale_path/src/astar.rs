//! The A* search itself.
//!
//! All search state (open set, cost-so-far, parent links) is local to one
//! invocation; the function is re-entrant and never mutates the grid.

use crate::cost::PathGrid;
use embervale_shared::grid::GridCell;
use embervale_shared::protocol::Direction;
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};
use thiserror::Error;

/// Argument errors of a search. "No path" is not an error, see [`find_path`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// Start and goal are the same cell; a zero-length move request is a
    /// caller bug, not a degenerate path.
    #[error("path endpoints are the same cell ({x}, {y})")]
    SameCell {
        /// Column of the duplicated endpoint
        x: i32,
        /// Row of the duplicated endpoint
        y: i32,
    },
}

/// Result alias for search calls
pub type PathResult<T> = Result<T, PathError>;

/// Open-set entry. Ordered so that `BinaryHeap` pops the LOWEST f-score,
/// with ties broken by insertion order (earlier wins, deterministic).
struct OpenNode {
    f: f64,
    g: f64,
    seq: u64,
    cell: GridCell,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.f.total_cmp(&other.f) == Ordering::Equal && self.seq == other.seq
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed on both keys: the max-heap becomes a min-heap on
        // (f, seq). Costs are finite by the PathGrid contract.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Lowest-total-cost path from `src` to `dst` over the 8-connected grid.
///
/// Returns the cell sequence including both endpoints. `Ok(None)` means the
/// grid is disconnected under `can_traverse` (or the expansion budget ran
/// out, which callers treat the same way); it is a normal outcome, never an
/// error. Soft obstacles never cause `Ok(None)`: an expensive edge is still
/// an edge.
///
/// # Errors
///
/// [`PathError::SameCell`] if `src == dst`.
pub fn find_path<G: PathGrid>(
    grid: &G,
    src: GridCell,
    dst: GridCell,
    max_expansions: usize,
) -> PathResult<Option<Vec<GridCell>>> {
    if src == dst {
        return Err(PathError::SameCell { x: src.x, y: src.y });
    }

    let heuristic = |cell: GridCell| -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let steps = cell.chebyshev(dst) as f64;
        steps * grid.min_step_cost()
    };

    let mut open = BinaryHeap::new();
    let mut g_scores: HashMap<GridCell, f64> = HashMap::new();
    let mut came_from: HashMap<GridCell, GridCell> = HashMap::new();
    let mut seq = 0u64;

    g_scores.insert(src, 0.0);
    open.push(OpenNode {
        f: heuristic(src),
        g: 0.0,
        seq,
        cell: src,
    });

    let mut expansions = 0usize;
    while let Some(node) = open.pop() {
        // Stale entry: a cheaper route to this cell was found after this
        // node was pushed.
        if g_scores
            .get(&node.cell)
            .is_some_and(|best| node.g > *best)
        {
            continue;
        }

        if node.cell == dst {
            return Ok(Some(reconstruct(&came_from, src, dst)));
        }

        expansions += 1;
        if expansions > max_expansions {
            return Ok(None);
        }

        for dir in Direction::ALL {
            let (dx, dy) = dir.offset();
            let next = node.cell.offset(dx, dy);
            if !grid.can_traverse(node.cell, next) {
                continue;
            }
            let tentative = node.g + grid.edge_cost(node.cell, next);
            let better = match g_scores.entry(next) {
                Entry::Occupied(mut e) => {
                    if tentative < *e.get() {
                        e.insert(tentative);
                        true
                    } else {
                        false
                    }
                }
                Entry::Vacant(e) => {
                    e.insert(tentative);
                    true
                }
            };
            if better {
                came_from.insert(next, node.cell);
                seq += 1;
                open.push(OpenNode {
                    f: tentative + heuristic(next),
                    g: tentative,
                    seq,
                    cell: next,
                });
            }
        }
    }

    Ok(None)
}

/// Accumulated cost of a path under a grid's cost function.
///
/// Companion to [`find_path`] for callers comparing route alternatives.
#[must_use]
pub fn path_cost<G: PathGrid>(grid: &G, path: &[GridCell]) -> f64 {
    path.windows(2).map(|w| grid.edge_cost(w[0], w[1])).sum()
}

/// Walks the parent links back from `dst`, guarding against link cycles.
fn reconstruct(came_from: &HashMap<GridCell, GridCell>, src: GridCell, dst: GridCell) -> Vec<GridCell> {
    let mut path = vec![dst];
    let mut current = dst;
    let mut guard = came_from.len() + 1;
    while current != src {
        match came_from.get(&current) {
            Some(parent) => {
                current = *parent;
                path.push(current);
            }
            None => break,
        }
        guard -= 1;
        if guard == 0 {
            break;
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{ClientCostModel, OccupancyView, PathCosts, ServerCostModel};
    use std::collections::HashSet;

    struct TestView {
        walls: HashSet<GridCell>,
        creatures: HashSet<GridCell>,
    }

    impl TestView {
        fn open() -> Self {
            Self {
                walls: HashSet::new(),
                creatures: HashSet::new(),
            }
        }

        fn with_walls(walls: &[(i32, i32)]) -> Self {
            Self {
                walls: walls.iter().map(|&(x, y)| GridCell::new(x, y)).collect(),
                creatures: HashSet::new(),
            }
        }
    }

    impl OccupancyView for TestView {
        fn walkable(&self, cell: GridCell) -> bool {
            !self.walls.contains(&cell)
        }

        fn occupied(&self, cell: GridCell) -> bool {
            self.creatures.contains(&cell)
        }
    }

    /// Exhaustive minimum path cost by DFS over simple paths, restricted to
    /// a small bounding box. Exponential, only for cross-checking tiny grids.
    fn brute_force_min_cost<G: PathGrid>(
        grid: &G,
        src: GridCell,
        dst: GridCell,
        lo: GridCell,
        hi: GridCell,
    ) -> Option<f64> {
        fn dfs<G: PathGrid>(
            grid: &G,
            at: GridCell,
            dst: GridCell,
            lo: GridCell,
            hi: GridCell,
            visited: &mut HashSet<GridCell>,
            cost: f64,
            best: &mut Option<f64>,
        ) {
            if best.is_some_and(|b| cost >= b) {
                return;
            }
            if at == dst {
                *best = Some(cost);
                return;
            }
            for dir in Direction::ALL {
                let (dx, dy) = dir.offset();
                let next = at.offset(dx, dy);
                if next.x < lo.x || next.y < lo.y || next.x > hi.x || next.y > hi.y {
                    continue;
                }
                if visited.contains(&next) || !grid.can_traverse(at, next) {
                    continue;
                }
                visited.insert(next);
                dfs(grid, next, dst, lo, hi, visited, cost + grid.edge_cost(at, next), best);
                visited.remove(&next);
            }
        }

        let mut best = None;
        let mut visited = HashSet::new();
        visited.insert(src);
        dfs(grid, src, dst, lo, hi, &mut visited, 0.0, &mut best);
        best
    }

    #[test]
    fn test_same_cell_is_an_argument_error() {
        let view = TestView::open();
        let model = ClientCostModel::new(&view, PathCosts::default());
        let cell = GridCell::new(3, 3);
        assert_eq!(
            find_path(&model, cell, cell, 64),
            Err(PathError::SameCell { x: 3, y: 3 })
        );
    }

    #[test]
    fn test_straight_line_on_open_grid() {
        let view = TestView::open();
        let model = ClientCostModel::new(&view, PathCosts::default());
        let path = find_path(&model, GridCell::new(0, 0), GridCell::new(4, 0), 4_096)
            .unwrap()
            .unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path[0], GridCell::new(0, 0));
        assert_eq!(path[4], GridCell::new(4, 0));
        assert!((path_cost(&model, &path) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_diagonal_bias_prefers_straight_lines() {
        // (0,0) -> (2,1): one diagonal + one straight (2.1) beats any
        // alternative; three straight steps would cost 3.0.
        let view = TestView::open();
        let model = ClientCostModel::new(&view, PathCosts::default());
        let path = find_path(&model, GridCell::new(0, 0), GridCell::new(2, 1), 4_096)
            .unwrap()
            .unwrap();
        assert!((path_cost(&model, &path) - 2.1).abs() < 1e-9);
    }

    #[test]
    fn test_optimal_against_brute_force() {
        // Several goal cells on a 4x4 box with a wall notch; the A* cost
        // must match the exhaustive minimum every time.
        let view = TestView::with_walls(&[(1, 1), (2, 1)]);
        let model = ClientCostModel::new(&view, PathCosts::default());
        let lo = GridCell::new(0, 0);
        let hi = GridCell::new(3, 3);
        let src = GridCell::new(0, 0);
        for (gx, gy) in [(3, 0), (3, 3), (0, 3), (2, 2), (3, 1)] {
            let dst = GridCell::new(gx, gy);
            let path = find_path(&model, src, dst, 4_096).unwrap().unwrap();
            let expected = brute_force_min_cost(&model, src, dst, lo, hi).unwrap();
            let got = path_cost(&model, &path);
            assert!(
                (got - expected).abs() < 1e-9,
                "goal ({gx}, {gy}): a* cost {got}, brute force {expected}"
            );
        }
    }

    #[test]
    fn test_soft_obstacle_never_disconnects() {
        // Wall off the goal's entire neighborhood; the client model still
        // yields a path, just a four-orders-of-magnitude worse one.
        let view = TestView::with_walls(&[
            (3, 1),
            (4, 1),
            (5, 1),
            (3, 2),
            (5, 2),
            (3, 3),
            (4, 3),
            (5, 3),
        ]);
        let model = ClientCostModel::new(&view, PathCosts::default());
        let open_view = TestView::open();
        let open_model = ClientCostModel::new(&open_view, PathCosts::default());
        let open_path = find_path(&open_model, GridCell::new(0, 2), GridCell::new(4, 2), 4_096)
            .unwrap()
            .unwrap();
        let walled = find_path(&model, GridCell::new(0, 2), GridCell::new(4, 2), 4_096)
            .unwrap()
            .expect("soft obstacles must not disconnect the grid");
        assert_eq!(walled.last(), Some(&GridCell::new(4, 2)));
        // Cost goes up against the unwalled baseline; the path never vanishes.
        assert!(path_cost(&model, &walled) > path_cost(&open_model, &open_path));
        assert!(path_cost(&model, &walled) >= 10_000.0);
    }

    #[test]
    fn test_hard_obstacle_disconnects_server_model() {
        // A full wall ring around the goal under the server model is a true
        // disconnection: Ok(None), not an error.
        let view = TestView::with_walls(&[
            (3, 1),
            (4, 1),
            (5, 1),
            (3, 2),
            (5, 2),
            (3, 3),
            (4, 3),
            (5, 3),
        ]);
        let model = ServerCostModel::new(&view, PathCosts::default());
        let result = find_path(&model, GridCell::new(0, 2), GridCell::new(4, 2), 4_096).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_occupied_cells_are_detours_not_walls() {
        // A creature line across the corridor: the path either detours or
        // pays the occupied price, but it never disappears.
        let mut view = TestView::open();
        for y in -1..=1 {
            view.creatures.insert(GridCell::new(2, y));
        }
        let model = ServerCostModel::new(&view, PathCosts::default());
        let path = find_path(&model, GridCell::new(0, 0), GridCell::new(4, 0), 4_096)
            .unwrap()
            .unwrap();
        let cost = path_cost(&model, &path);
        // The detour under the creature line is all cheap steps; paying the
        // occupied price would cost 100+.
        assert!(cost < 10.0);
        assert_eq!(path.last(), Some(&GridCell::new(4, 0)));
    }

    #[test]
    fn test_expansion_budget_reads_as_no_path() {
        let view = TestView::open();
        let model = ClientCostModel::new(&view, PathCosts::default());
        let result = find_path(&model, GridCell::new(0, 0), GridCell::new(40, 0), 8).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_deterministic_tie_break() {
        // Symmetric costs around the diagonal: repeated searches must pick
        // the same route because ties break on insertion order.
        let view = TestView::open();
        let model = ClientCostModel::new(&view, PathCosts::default());
        let first = find_path(&model, GridCell::new(0, 0), GridCell::new(3, 3), 4_096)
            .unwrap()
            .unwrap();
        for _ in 0..10 {
            let again = find_path(&model, GridCell::new(0, 0), GridCell::new(3, 3), 4_096)
                .unwrap()
                .unwrap();
            assert_eq!(again, first);
        }
    }
}
