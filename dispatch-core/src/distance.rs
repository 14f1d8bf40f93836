//! Integer distance matrices for tour solving.
//!
//! Costs are planar Euclidean distances between raw `(lng, lat)` degree
//! pairs, scaled by [`DISTANCE_SCALE`] and truncated toward zero. The
//! scaling only preserves ordering for the solver; the values carry no unit.

use geo::Coord;

/// Multiplier applied to degree distances before truncation.
pub const DISTANCE_SCALE: f64 = 1000.0;

/// Square, symmetric matrix of scaled travel costs.
///
/// Node `0` is the depot by convention; nodes `1..size` are stops.
///
/// # Examples
///
/// ```
/// use dispatch_core::DistanceMatrix;
/// use geo::Coord;
///
/// let matrix = DistanceMatrix::from_coords(&[
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 0.0, y: 1.0 },
/// ]);
/// assert_eq!(matrix.get(0, 1), 1000);
/// assert_eq!(matrix.get(1, 1), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMatrix {
    size: usize,
    cells: Vec<u64>,
}

impl DistanceMatrix {
    /// Build the matrix for `coords`, depot first.
    #[must_use]
    pub fn from_coords(coords: &[Coord<f64>]) -> Self {
        let size = coords.len();
        let mut cells = vec![0; size * size];
        for (i, a) in coords.iter().enumerate() {
            for (j, b) in coords.iter().enumerate().skip(i + 1) {
                let cost = scaled_distance(*a, *b);
                cells[i * size + j] = cost;
                cells[j * size + i] = cost;
            }
        }
        Self { size, cells }
    }

    /// Build a matrix from explicit rows.
    ///
    /// Returns `None` unless every row has as many entries as there are
    /// rows.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }
        Some(Self {
            size,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Number of nodes, depot included.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Cost of travelling from `from` to `to`, or `0` when either index is
    /// out of range.
    #[must_use]
    pub fn get(&self, from: usize, to: usize) -> u64 {
        if from >= self.size || to >= self.size {
            return 0;
        }
        self.cells.get(from * self.size + to).copied().unwrap_or(0)
    }

    /// Cost of the closed tour `0 → nodes… → 0`.
    ///
    /// Unknown node indices contribute nothing.
    #[must_use]
    pub fn tour_cost(&self, nodes: &[usize]) -> u64 {
        if nodes.is_empty() {
            return 0;
        }
        std::iter::once(0)
            .chain(nodes.iter().copied())
            .zip(nodes.iter().copied().chain(std::iter::once(0)))
            .map(|(from, to)| self.get(from, to))
            .sum()
    }
}

fn scaled_distance(a: Coord<f64>, b: Coord<f64>) -> u64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx.hypot(dy) * DISTANCE_SCALE) as u64
}
