//! Sliding window of resident cells.
//!
//! The window is a `2N x 2N` block of cells whose minimum corner
//! (`start`) is always a multiple of the cell size. Reconciling against a
//! new viewpoint moves the window in whole cells and reports exactly the
//! origins that entered it.
//!
//! ```text
//!   z
//!   ^   +---+---+---+---+ . +
//!   |   |   |   |   |   | new column (x moved +1)
//!   |   +---+---+---+---+ . +
//!   |   |   |   |   |   | .
//!   |   +---+---+---+---+ . +
//!   |   start
//!   +-------------------------> x
//! ```

use glam::Vec2;

/// Fraction of a cell used to absorb floating-point error in window tests.
pub const DISTANCE_TOLERANCE: f32 = 0.125;

/// The rectangular set of cells intended to be resident.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridWindow {
    start: Vec2,
    cell_size: f32,
    half_extent: u32,
}

/// Result of a reconcile that moved the window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowShift {
    /// The window after the move
    pub window: GridWindow,
    /// Origins that entered the window, in enqueue order
    pub entered: Vec<Vec2>,
}

impl GridWindow {
    /// Creates a window with an explicit minimum corner.
    #[must_use]
    pub const fn new(start: Vec2, cell_size: f32, half_extent: u32) -> Self {
        Self {
            start,
            cell_size,
            half_extent,
        }
    }

    /// Creates the window centered on the cell boundary nearest `position`.
    #[must_use]
    pub fn centered_on(position: Vec2, cell_size: f32, half_extent: u32) -> Self {
        let mid = (position / cell_size).round();
        let start = (mid - Vec2::splat(half_extent as f32)) * cell_size;
        Self::new(start, cell_size, half_extent)
    }

    /// Minimum corner of the window.
    #[must_use]
    pub const fn start(&self) -> Vec2 {
        self.start
    }

    /// Cell edge length.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cells along one side.
    #[must_use]
    pub const fn cells_per_side(&self) -> u32 {
        2 * self.half_extent
    }

    /// World-space edge length of the window.
    #[must_use]
    pub fn span(&self) -> f32 {
        self.cells_per_side() as f32 * self.cell_size
    }

    /// Slack allowed around the window and between duplicate origins.
    #[must_use]
    pub fn tolerance(&self) -> f32 {
        self.cell_size * DISTANCE_TOLERANCE
    }

    /// Every origin in the window, x outer and z inner.
    pub fn origins(&self) -> impl Iterator<Item = Vec2> + '_ {
        let side = self.cells_per_side();
        (0..side).flat_map(move |i| {
            (0..side).map(move |j| self.start + Vec2::new(i as f32, j as f32) * self.cell_size)
        })
    }

    /// Returns true if the footprint of the cell at `origin` is not inside
    /// the window, allowing [`GridWindow::tolerance`] of slack.
    #[must_use]
    pub fn is_distant(&self, origin: Vec2) -> bool {
        let tol = self.tolerance();
        let far = self.span() + tol;
        origin.x < self.start.x - tol
            || origin.y < self.start.y - tol
            || origin.x + self.cell_size > self.start.x + far
            || origin.y + self.cell_size > self.start.y + far
    }

    /// Allowed range for `start` given a viewpoint.
    ///
    /// The band is one cell wide, so the window only moves once the viewpoint
    /// crosses a cell boundary and then leads in the direction of travel.
    #[must_use]
    pub fn start_band(&self, position: Vec2) -> (Vec2, Vec2) {
        let min = ((position / self.cell_size).ceil() - Vec2::splat(self.half_extent as f32))
            * self.cell_size;
        (min, min + Vec2::splat(self.cell_size))
    }

    /// Moves the window toward `position`.
    ///
    /// Returns `None` while the viewpoint stays inside the current band.
    /// Otherwise the window moves in whole cells; jumps of several cells
    /// are walked one column or row at a time so every newly entered cell
    /// is reported once. Corner cells covered by the x move are not repeated
    /// by the z move.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn reconcile(&self, position: Vec2) -> Option<WindowShift> {
        let (min, max) = self.start_band(position);
        let new_start = self.start.clamp(min, max);
        if new_start == self.start {
            return None;
        }

        let cs = self.cell_size;
        let old = self.start;
        let side = self.cells_per_side() as i32;
        let far = (side - 1) as f32 * cs;
        let steps_x = ((new_start.x - old.x) / cs).round() as i32;
        let steps_y = ((new_start.y - old.y) / cs).round() as i32;

        let mut entered = Vec::new();

        for step in entering_steps(steps_x, side) {
            let x = if steps_x > 0 {
                old.x + step as f32 * cs + far
            } else {
                old.x - step as f32 * cs
            };
            entered.extend((0..side).map(|j| Vec2::new(x, new_start.y + j as f32 * cs)));
        }

        // Rows skip the columns the x move already produced.
        let row_start = if steps_x < 0 { old.x } else { new_start.x };
        let row_end = if steps_x > 0 { old.x + far } else { new_start.x + far };
        let row_cells = (((row_end - row_start) / cs).round() as i32 + 1).max(0);

        for step in entering_steps(steps_y, side) {
            let y = if steps_y > 0 {
                old.y + step as f32 * cs + far
            } else {
                old.y - step as f32 * cs
            };
            entered.extend((0..row_cells).map(|i| Vec2::new(row_start + i as f32 * cs, y)));
        }

        Some(WindowShift {
            window: Self::new(new_start, cs, self.half_extent),
            entered,
        })
    }
}

/// Step indices `1..=|steps|` whose column or row lies inside the new window.
fn entering_steps(steps: i32, side: i32) -> std::ops::RangeInclusive<i32> {
    let k = steps.abs();
    (k - side + 1).max(1)..=k
}
