//! Grid-cell index of dynamic bodies
//!
//! Each body is filed under the cell nearest its centre. The index holds
//! slice indices, not bodies, and is rebuilt from scratch every tick, so it
//! always reflects positions at the start of that tick.

use glam::{IVec2, Vec2};

use super::map::nearest_cell;
use super::state::Body;

#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    side: i32,
    cells: Vec<Vec<usize>>,
    max_radius: f32,
}

impl SpatialIndex {
    pub fn new(side: i32) -> Self {
        let side = side.max(0);
        Self {
            side,
            cells: vec![Vec::new(); (side * side) as usize],
            max_radius: 0.0,
        }
    }

    #[inline]
    fn slot(&self, cell: IVec2) -> Option<usize> {
        if cell.x >= 0 && cell.y >= 0 && cell.x < self.side && cell.y < self.side {
            Some((cell.y * self.side + cell.x) as usize)
        } else {
            None
        }
    }

    /// Clear all occupancy and file every body under its nearest cell.
    ///
    /// Bodies whose nearest cell is off the grid are left out.
    pub fn rebuild(&mut self, bodies: &[Body]) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.max_radius = 0.0;
        for (i, body) in bodies.iter().enumerate() {
            if let Some(slot) = self.slot(nearest_cell(body.pos)) {
                self.cells[slot].push(i);
                self.max_radius = self.max_radius.max(body.radius);
            }
        }
    }

    /// Largest radius among indexed bodies
    #[inline]
    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    /// Bodies filed under a single cell
    pub fn occupants(&self, cell: IVec2) -> &[usize] {
        match self.slot(cell) {
            Some(slot) => &self.cells[slot],
            None => &[],
        }
    }

    /// Bodies in any cell whose centre lies strictly within `radius` of
    /// `point`. Scans the `2r+1` box around the nearest cell.
    pub fn query(&self, point: Vec2, radius: f32) -> Vec<usize> {
        let center = nearest_cell(point);
        let reach = radius.ceil().max(0.0) as i32;
        let mut found = Vec::new();
        for y in center.y - reach..=center.y + reach {
            for x in center.x - reach..=center.x + reach {
                let cell = IVec2::new(x, y);
                let Some(slot) = self.slot(cell) else {
                    continue;
                };
                if cell.as_vec2().distance(point) < radius {
                    found.extend_from_slice(&self.cells[slot]);
                }
            }
        }
        found
    }
}
