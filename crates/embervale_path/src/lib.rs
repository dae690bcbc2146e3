//! # EMBERVALE Path
//!
//! Weighted A* search over the 8-connected world grid.
//!
//! ## Soft Obstacles
//!
//! ```text
//! hard obstacle:  edge removed        -> search can return "no path"
//! soft obstacle:  edge cost = 10000   -> search always terminates with
//!                                        the cheapest approach available
//! ```
//!
//! The client-side cost model keeps every edge traversable and prices
//! blocked cells at a large finite sentinel, so best-effort movement toward
//! a clicked cell never fails outright. The server-side model removes
//! genuinely unwalkable edges (authoritative rejection) but keeps the same
//! soft pricing for cells that are merely occupied.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod astar;
pub mod cost;

pub use astar::{find_path, path_cost, PathError, PathResult};
pub use cost::{ClientCostModel, OccupancyView, PathCosts, PathGrid, ServerCostModel};
