//! Cell storage with a sentinel ring.
//!
//! The grid is laid out as a 1D array, row by row, including one ring of
//! [`CellState::BORDER`] cells around the playable area:
//! - Row 0 and row `height + 1`: border
//! - Column 0 and column `width + 1` of each row: border
//!
//! Playable cells therefore have 1-based coordinates.

use crate::constants::OFFSET;
use crate::position::{CellState, Position};

#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    width: u8,
    height: u8,
    stride: usize,
    cells: Vec<CellState>,
}

impl Grid {
    /// An empty `width` x `height` grid surrounded by border cells.
    pub fn new(width: u8, height: u8) -> Self {
        let stride = usize::from(width) + 2 * usize::from(OFFSET);
        let rows = usize::from(height) + 2 * usize::from(OFFSET);
        let mut grid = Grid {
            width,
            height,
            stride,
            cells: vec![CellState::BORDER; stride * rows],
        };
        for pos in grid.playable_positions().collect::<Vec<_>>() {
            grid.set(pos, CellState::EMPTY);
        }
        grid
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Width including the border ring.
    pub fn real_width(&self) -> usize {
        self.stride
    }

    /// Height including the border ring.
    pub fn real_height(&self) -> usize {
        self.cells.len() / self.stride
    }

    /// Total number of cells including the border ring.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    fn index(&self, pos: Position) -> Option<usize> {
        let x = usize::from(pos.x());
        let y = usize::from(pos.y());
        (x < self.stride && y < self.real_height()).then_some(y * self.stride + x)
    }

    /// The state at `pos`, or `None` outside the grid (beyond the ring).
    #[inline]
    pub fn cell(&self, pos: Position) -> Option<CellState> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// The state at `pos`; anything outside the grid reads as border.
    #[inline]
    pub fn state(&self, pos: Position) -> CellState {
        self.cell(pos).unwrap_or(CellState::BORDER)
    }

    /// Overwrite the state at `pos`.
    ///
    /// # Panics
    ///
    /// If `pos` lies beyond the border ring.
    #[inline]
    pub fn set(&mut self, pos: Position, state: CellState) {
        let Some(i) = self.index(pos) else {
            panic!("write outside the grid at {pos}");
        };
        self.cells[i] = state;
    }

    /// Whether `pos` lies inside the playable area.
    #[inline]
    pub fn is_playable(&self, pos: Position) -> bool {
        (OFFSET..=self.width).contains(&pos.x()) && (OFFSET..=self.height).contains(&pos.y())
    }

    /// All playable positions, row by row.
    pub fn playable_positions(&self) -> impl Iterator<Item = Position> + use<> {
        let (width, height) = (self.width, self.height);
        (OFFSET..=height).flat_map(move |y| (OFFSET..=width).map(move |x| Position::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_has_border_ring() {
        let grid = Grid::new(3, 2);
        assert_eq!(grid.real_width(), 5);
        assert_eq!(grid.real_height(), 4);
        assert_eq!(grid.len(), 20);

        for pos in grid.playable_positions() {
            assert_eq!(grid.state(pos), CellState::EMPTY, "{pos} should be empty");
        }
        assert_eq!(grid.playable_positions().count(), 6);

        for pos in [
            Position::new(0, 0),
            Position::new(4, 1),
            Position::new(2, 3),
            Position::new(0, 2),
        ] {
            assert!(grid.state(pos).is_border(), "{pos} should be border");
            assert!(!grid.is_playable(pos));
        }
    }

    #[test]
    fn test_outside_reads_as_border() {
        let grid = Grid::new(3, 3);
        assert_eq!(grid.cell(Position::new(9, 9)), None);
        assert!(grid.state(Position::new(9, 9)).is_border());
    }

    #[test]
    #[should_panic(expected = "outside the grid")]
    fn test_write_outside_panics() {
        let mut grid = Grid::new(3, 3);
        grid.set(Position::new(9, 2), CellState::EMPTY);
    }
}
