//! Driver-owned uniform spatial grid. Distinct from Rapier's broad-phase: this
//! buckets awake marbles so driver systems (sleep culling, any region pruning)
//! can touch only the cells they care about instead of scanning every body.

use bevy::prelude::*;
use smallvec::SmallVec;
use std::collections::HashMap;

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct Cell(pub i32, pub i32);

#[derive(Resource, Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<Cell, SmallVec<[Entity; 8]>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn cell_of(&self, pos: Vec2) -> Cell {
        Cell(
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, pos: Vec2, entity: Entity) {
        self.cells.entry(self.cell_of(pos)).or_default().push(entity);
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All entities whose cell row intersects the y band [y_min, y_max].
    pub fn entities_in_band(&self, y_min: f32, y_max: f32) -> impl Iterator<Item = Entity> + '_ {
        let row_min = (y_min / self.cell_size).floor() as i32;
        let row_max = (y_max / self.cell_size).floor() as i32;
        self.cells
            .iter()
            .filter(move |(cell, _)| cell.1 >= row_min && cell.1 <= row_max)
            .flat_map(|(_, entities)| entities.iter().copied())
    }

    /// Entities in the 3x3 cell neighborhood of `pos`.
    pub fn neighbors(&self, pos: Vec2) -> impl Iterator<Item = Entity> + '_ {
        let center = self.cell_of(pos);
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                self.cells
                    .get(&Cell(center.0 + dx, center.1 + dy))
                    .into_iter()
                    .flat_map(|v| v.iter().copied())
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(i: u32) -> Entity {
        Entity::from_raw(i)
    }

    #[test]
    fn bucketing_uses_floor_cells() {
        let mut grid = SpatialGrid::new(100.0);
        grid.insert(Vec2::new(-1.0, -1.0), entity(1));
        grid.insert(Vec2::new(1.0, 1.0), entity(2));
        assert_eq!(grid.cell_of(Vec2::new(-1.0, -1.0)), Cell(-1, -1));
        assert_eq!(grid.cell_of(Vec2::new(1.0, 1.0)), Cell(0, 0));
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn band_query_spans_rows() {
        let mut grid = SpatialGrid::new(100.0);
        grid.insert(Vec2::new(0.0, -50.0), entity(1)); // row -1
        grid.insert(Vec2::new(0.0, -250.0), entity(2)); // row -3
        grid.insert(Vec2::new(0.0, 150.0), entity(3)); // row 1
        let band: Vec<_> = grid.entities_in_band(-120.0, 20.0).collect();
        assert!(band.contains(&entity(1)));
        assert!(!band.contains(&entity(2)));
        assert!(!band.contains(&entity(3)));
    }

    #[test]
    fn neighbors_cover_adjacent_cells_only() {
        let mut grid = SpatialGrid::new(100.0);
        grid.insert(Vec2::new(50.0, 50.0), entity(1));
        grid.insert(Vec2::new(150.0, 50.0), entity(2));
        grid.insert(Vec2::new(450.0, 50.0), entity(3));
        let near: Vec<_> = grid.neighbors(Vec2::new(60.0, 60.0)).collect();
        assert!(near.contains(&entity(1)));
        assert!(near.contains(&entity(2)));
        assert!(!near.contains(&entity(3)));
    }
}
