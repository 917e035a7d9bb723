//! Read-only terrain classification.
//!
//! Terrain generation lives outside the simulation. Movement only needs to
//! know whether a point is water and whether it is on the map at all.

use hamlet_types::Position;

/// A 2D terrain query.
pub trait Terrain {
    /// Whether the point lies on water.
    fn is_water(&self, pos: Position) -> bool;

    /// Whether the point lies on the map.
    fn in_bounds(&self, pos: Position) -> bool;

    /// Whether an agent may stand at the point.
    fn is_walkable(&self, pos: Position) -> bool {
        self.in_bounds(pos) && !self.is_water(pos)
    }
}

/// Unbounded dry land.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenTerrain;

impl Terrain for OpenTerrain {
    fn is_water(&self, _pos: Position) -> bool {
        false
    }

    fn in_bounds(&self, _pos: Position) -> bool {
        true
    }
}

/// A rectangular tile grid with a water flag per tile.
///
/// The grid starts at the origin; tile `(col, row)` covers
/// `[col * tile_size, (col + 1) * tile_size)` horizontally and likewise
/// vertically.
#[derive(Debug, Clone)]
pub struct GridTerrain {
    tile_size: f64,
    columns: usize,
    rows: usize,
    water: Vec<bool>,
}

impl GridTerrain {
    /// A dry grid of `columns x rows` tiles.
    pub fn new(columns: usize, rows: usize, tile_size: f64) -> Self {
        Self {
            tile_size: tile_size.max(f64::EPSILON),
            columns,
            rows,
            water: vec![false; columns.saturating_mul(rows)],
        }
    }

    /// Mark a tile as water or land. Out-of-range tiles are ignored.
    pub fn set_water(&mut self, column: usize, row: usize, water: bool) {
        if column >= self.columns || row >= self.rows {
            return;
        }
        let idx = row.saturating_mul(self.columns).saturating_add(column);
        if let Some(tile) = self.water.get_mut(idx) {
            *tile = water;
        }
    }

    /// Total width in world units.
    pub fn width(&self) -> f64 {
        self.columns as f64 * self.tile_size
    }

    /// Total height in world units.
    pub fn height(&self) -> f64 {
        self.rows as f64 * self.tile_size
    }

    fn tile_index(&self, pos: Position) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        let column = usize_floor(pos.x / self.tile_size)?;
        let row = usize_floor(pos.y / self.tile_size)?;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(row.saturating_mul(self.columns).saturating_add(column))
    }
}

impl Terrain for GridTerrain {
    fn is_water(&self, pos: Position) -> bool {
        self.tile_index(pos)
            .and_then(|idx| self.water.get(idx).copied())
            .unwrap_or(false)
    }

    fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0.0 && pos.y >= 0.0 && pos.x < self.width() && pos.y < self.height()
    }
}

/// Floor a non-negative float into a `usize` index.
fn usize_floor(value: f64) -> Option<usize> {
    let floored = value.floor();
    if !floored.is_finite() || floored < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let idx = floored as usize;
    Some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_terrain_is_walkable_everywhere() {
        assert!(OpenTerrain.is_walkable(Position::new(-1e6, 4e6)));
    }

    #[test]
    fn grid_water_tiles_block_walking() {
        let mut grid = GridTerrain::new(4, 4, 10.0);
        grid.set_water(1, 2, true);
        assert!(grid.is_water(Position::new(15.0, 25.0)));
        assert!(!grid.is_walkable(Position::new(15.0, 25.0)));
        assert!(grid.is_walkable(Position::new(5.0, 5.0)));
    }

    #[test]
    fn grid_edges_are_out_of_bounds() {
        let grid = GridTerrain::new(2, 2, 10.0);
        assert!(!grid.in_bounds(Position::new(20.0, 5.0)));
        assert!(!grid.in_bounds(Position::new(-0.1, 5.0)));
        assert!(!grid.is_water(Position::new(50.0, 50.0)));
    }
}
