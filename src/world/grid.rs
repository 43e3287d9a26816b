//! Uniform spatial grid
//!
//! Fixed-size square cells (size `1 << shift`) covering the map bounds,
//! anchored at the floored minimum vertex. Each cell keeps three independent
//! lists: lines (static, filled once at load), things and particles
//! (maintained by remove → move → push). Positions past the bounds clamp to
//! the edge cells.

use crate::game::ThingId;
use crate::math::Vec2;
use super::geometry::{LineId, Map};
use super::level::{limits, LevelError};

/// Inclusive block of cells an entity overlaps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub min_col: usize,
    pub max_col: usize,
    pub min_row: usize,
    pub max_row: usize,
}

impl CellRange {
    /// Iterate (column, row) pairs, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let (min_col, max_col) = (self.min_col, self.max_col);
        (self.min_row..=self.max_row)
            .flat_map(move |row| (min_col..=max_col).map(move |col| (col, row)))
    }

    pub fn contains(&self, col: usize, row: usize) -> bool {
        (self.min_col..=self.max_col).contains(&col) && (self.min_row..=self.max_row).contains(&row)
    }
}

/// Which dynamic list of a cell an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Thing,
    Particle,
}

/// One grid bucket
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub lines: Vec<LineId>,
    pub things: Vec<ThingId>,
    pub particles: Vec<ThingId>,
}

impl Cell {
    fn list_mut(&mut self, membership: Membership) -> &mut Vec<ThingId> {
        match membership {
            Membership::Thing => &mut self.things,
            Membership::Particle => &mut self.particles,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Grid {
    shift: u32,
    /// Map coordinate of the corner of cell (0, 0)
    origin_x: f32,
    origin_z: f32,
    columns: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a grid covering the map bounds and register every line.
    ///
    /// Fails when the bounds need more than `limits::MAX_GRID_CELLS` cells.
    pub fn new(map: &Map, shift: u32) -> Result<Self, LevelError> {
        let origin_x = map.min_x.floor();
        let origin_z = map.min_z.floor();
        let columns = (((map.max_x - origin_x).max(0.0) as u64) >> shift) + 1;
        let rows = (((map.max_z - origin_z).max(0.0) as u64) >> shift) + 1;
        let count = columns.saturating_mul(rows);
        if count > limits::MAX_GRID_CELLS as u64 {
            return Err(LevelError::Validation(format!(
                "map bounds need {} grid cells at shift {} (limit {})",
                count, shift, limits::MAX_GRID_CELLS
            )));
        }

        let (columns, rows) = (columns as usize, rows as usize);
        let mut grid = Self {
            shift,
            origin_x,
            origin_z,
            columns,
            rows,
            cells: vec![Cell::default(); columns * rows],
        };
        for (i, line) in map.lines.iter().enumerate() {
            let id = LineId(i as u32);
            for (col, row) in grid.segment_cells(line.a, line.b) {
                grid.cell_mut(col, row).lines.push(id);
            }
        }
        Ok(grid)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        (1u32 << self.shift) as f32
    }

    pub fn cell(&self, col: usize, row: usize) -> &Cell {
        &self.cells[row * self.columns + col]
    }

    fn cell_mut(&mut self, col: usize, row: usize) -> &mut Cell {
        &mut self.cells[row * self.columns + col]
    }

    fn column_of(&self, x: f32) -> usize {
        clamp_index(((x - self.origin_x).floor() as i64) >> self.shift, self.columns)
    }

    fn row_of(&self, z: f32) -> usize {
        clamp_index(((z - self.origin_z).floor() as i64) >> self.shift, self.rows)
    }

    /// Cells overlapped by a square of half-extent `radius` centered at (x, z).
    pub fn range(&self, x: f32, z: f32, radius: f32) -> CellRange {
        CellRange {
            min_col: self.column_of(x - radius),
            max_col: self.column_of(x + radius),
            min_row: self.row_of(z - radius),
            max_row: self.row_of(z + radius),
        }
    }

    /// Insert an entity into every cell of `range`.
    pub fn push(&mut self, id: ThingId, range: CellRange, membership: Membership) {
        for (col, row) in range.cells() {
            let list = self.cell_mut(col, row).list_mut(membership);
            if !list.contains(&id) {
                list.push(id);
            }
        }
    }

    /// Remove an entity from every cell of `range`.
    pub fn remove(&mut self, id: ThingId, range: CellRange, membership: Membership) {
        for (col, row) in range.cells() {
            self.cell_mut(col, row).list_mut(membership).retain(|&other| other != id);
        }
    }

    /// Things in the cell range, each once, in encounter order.
    pub fn things_in_range(&self, range: CellRange) -> Vec<ThingId> {
        let mut out = Vec::new();
        for (col, row) in range.cells() {
            for &id in &self.cell(col, row).things {
                if !out.contains(&id) {
                    out.push(id);
                }
            }
        }
        out
    }

    /// Particles in the cell range, each once.
    pub fn particles_in_range(&self, range: CellRange) -> Vec<ThingId> {
        let mut out = Vec::new();
        for (col, row) in range.cells() {
            for &id in &self.cell(col, row).particles {
                if !out.contains(&id) {
                    out.push(id);
                }
            }
        }
        out
    }

    /// Lines registered in the cell range, each once.
    pub fn lines_in_range(&self, range: CellRange) -> Vec<LineId> {
        let mut out = Vec::new();
        for (col, row) in range.cells() {
            collect_lines(&self.cell(col, row).lines, &mut out);
        }
        out
    }

    /// Lines registered in any cell the segment a→b passes through.
    pub fn lines_along(&self, a: Vec2, b: Vec2) -> Vec<LineId> {
        let mut out = Vec::new();
        for (col, row) in self.segment_cells(a, b) {
            collect_lines(&self.cell(col, row).lines, &mut out);
        }
        out
    }

    /// Every cell listing `id` in the given membership list.
    pub fn cells_containing(&self, id: ThingId, membership: Membership) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.columns {
                let cell = self.cell(col, row);
                let list = match membership {
                    Membership::Thing => &cell.things,
                    Membership::Particle => &cell.particles,
                };
                if list.contains(&id) {
                    out.push((col, row));
                }
            }
        }
        out
    }

    /// Conservative cell walk: for each row slab the segment spans, take the
    /// x extent of the clipped segment and mark every column it covers.
    /// Edge rows absorb whatever part of the segment lies past the bounds.
    fn segment_cells(&self, a: Vec2, b: Vec2) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        let size = self.cell_size();
        let (z_lo, z_hi) = (a.y.min(b.y), a.y.max(b.y));
        let (min_row, max_row) = (self.row_of(z_lo), self.row_of(z_hi));
        let dz = b.y - a.y;

        for row in min_row..=max_row {
            let (x0, x1) = if dz.abs() < 1e-9 {
                (a.x.min(b.x), a.x.max(b.x))
            } else {
                let slab_lo = if row == min_row { z_lo } else { self.origin_z + row as f32 * size };
                let slab_hi = if row == max_row { z_hi } else { self.origin_z + (row + 1) as f32 * size };
                let xa = a.x + (b.x - a.x) * ((slab_lo - a.y) / dz);
                let xb = a.x + (b.x - a.x) * ((slab_hi - a.y) / dz);
                (xa.min(xb), xa.max(xb))
            };
            for col in self.column_of(x0)..=self.column_of(x1) {
                out.push((col, row));
            }
        }
        out
    }
}

fn clamp_index(i: i64, len: usize) -> usize {
    i.clamp(0, len as i64 - 1) as usize
}

fn collect_lines(lines: &[LineId], out: &mut Vec<LineId>) {
    for &id in lines {
        if !out.contains(&id) {
            out.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ThingAllocator;
    use crate::test_support::{diamond_map, two_room_map};

    fn grid() -> Grid {
        let map = Map::build(&two_room_map(), 1.0).unwrap();
        Grid::new(&map, 2).unwrap()
    }

    #[test]
    fn test_dimensions_cover_map() {
        let g = grid();
        // 16 x 8 map with 4-unit cells
        assert_eq!(g.columns(), 5);
        assert_eq!(g.rows(), 3);
    }

    #[test]
    fn test_range_matches_shift_formula() {
        let g = grid();
        let r = g.range(5.0, 3.9, 0.5);
        assert_eq!(r, CellRange { min_col: 1, max_col: 1, min_row: 0, max_row: 1 });
        // Clamped at the edges
        let r = g.range(0.2, 0.2, 1.0);
        assert_eq!((r.min_col, r.min_row), (0, 0));
        let r = g.range(100.0, 100.0, 1.0);
        assert_eq!((r.max_col, r.max_row), (4, 2));
    }

    #[test]
    fn test_push_then_remove_leaves_no_trace() {
        let mut g = grid();
        let mut alloc = ThingAllocator::new();
        let id = alloc.allocate();

        let first = g.range(3.9, 3.9, 0.5);
        g.push(id, first, Membership::Thing);
        let cells = g.cells_containing(id, Membership::Thing);
        assert_eq!(cells, first.cells().collect::<Vec<_>>());
        assert!(g.cells_containing(id, Membership::Particle).is_empty());

        // Move: remove → mutate → push
        g.remove(id, first, Membership::Thing);
        let second = g.range(12.0, 6.0, 0.5);
        g.push(id, second, Membership::Thing);
        assert_eq!(g.cells_containing(id, Membership::Thing), second.cells().collect::<Vec<_>>());
        assert_eq!(g.things_in_range(second), vec![id]);
        assert!(g.things_in_range(first).is_empty());
    }

    #[test]
    fn test_lines_registered_along_segment() {
        let g = grid();
        // Shared ledge runs x = 8 from z 0 to 8: column 2, rows 0..=2
        let found = g.lines_in_range(CellRange { min_col: 2, max_col: 2, min_row: 1, max_row: 1 });
        assert!(found.iter().any(|&id| id.0 as usize == crate::test_support::LEDGE_LINE));
        // Interior cell far from every wall holds nothing
        let open = CellRange { min_col: 1, max_col: 1, min_row: 1, max_row: 1 };
        assert!(g.lines_in_range(open).is_empty());
    }

    #[test]
    fn test_lines_along_diagonal() {
        let g = grid();
        let lines = g.lines_along(Vec2::new(2.0, 2.0), Vec2::new(14.0, 6.0));
        assert!(lines.iter().any(|&id| id.0 as usize == crate::test_support::LEDGE_LINE));
    }

    #[test]
    fn test_particles_in_range_each_once() {
        let mut g = grid();
        let mut alloc = ThingAllocator::new();
        let puff = alloc.allocate();
        let spanning = g.range(4.0, 4.0, 0.5);
        g.push(puff, spanning, Membership::Particle);

        // Spans four cells but is reported once
        assert_eq!(g.particles_in_range(g.range(4.0, 4.0, 2.0)), vec![puff]);
        assert!(g.particles_in_range(g.range(14.0, 6.0, 0.5)).is_empty());
        assert!(g.things_in_range(spanning).is_empty());
    }

    #[test]
    fn test_negative_coordinates_offset_the_grid() {
        let map = Map::build(&diamond_map(), 1.0).unwrap();
        let g = Grid::new(&map, 2).unwrap();
        // -12..12 on both axes with 4-unit cells
        assert_eq!((g.columns(), g.rows()), (7, 7));
        let r = g.range(3.0, -8.5, 0.5);
        assert_eq!(r, CellRange { min_col: 3, max_col: 3, min_row: 0, max_row: 1 });
        // Diagonal wall (0, -12) → (12, 0) is registered where it runs
        assert!(g.lines_in_range(r).contains(&LineId(1)));
        let far = g.range(-6.0, -6.0, 0.5);
        assert!(!g.lines_in_range(far).contains(&LineId(1)));
    }

    #[test]
    fn test_oversized_bounds_rejected() {
        let mut data = two_room_map();
        data.vertices[2] = Vec2::new(1_000_000.0, 0.0);
        data.vertices[3] = Vec2::new(1_000_000.0, 1_000_000.0);
        let map = Map::build(&data, 1.0).unwrap();
        assert!(matches!(Grid::new(&map, 3), Err(LevelError::Validation(_))));
    }
}
