//! Grid coordinate math shared between the pathfinder and the world.
//!
//! Cells are screen-oriented: x grows right, y grows down. All distance
//! comparisons in the protocol use squared distance to avoid square roots.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A cell on the world grid.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct GridCell {
    /// Column (grows right)
    pub x: i32,
    /// Row (grows down)
    pub y: i32,
}

impl GridCell {
    /// Creates a new cell
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another cell.
    ///
    /// 0 = same cell, 1 = orthogonally adjacent, 2 = diagonally adjacent.
    #[must_use]
    pub const fn distance2(self, other: Self) -> i64 {
        let dx = (other.x - self.x) as i64;
        let dy = (other.y - self.y) as i64;
        dx * dx + dy * dy
    }

    /// Chebyshev distance (moves needed on an 8-connected grid)
    #[must_use]
    pub const fn chebyshev(self, other: Self) -> i64 {
        let dx = (other.x - self.x).abs() as i64;
        let dy = (other.y - self.y).abs() as i64;
        if dx > dy {
            dx
        } else {
            dy
        }
    }

    /// The cell offset by `(dx, dy)`
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Whether a single step (walk) or straight double step (run) from
    /// `self` can land on `other`.
    #[must_use]
    pub const fn within_step(self, other: Self, step: i32) -> bool {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        if dx == 0 && dy == 0 {
            return false;
        }
        match step {
            1 => dx >= -1 && dx <= 1 && dy >= -1 && dy <= 1,
            2 => {
                // Two cells, straight line only (orthogonal or diagonal).
                let ax = dx.abs();
                let ay = dy.abs();
                (ax == 2 || ax == 0) && (ay == 2 || ay == 0) && (ax + ay > 0)
            }
            _ => false,
        }
    }
}
