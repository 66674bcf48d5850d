//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Grid iterators

/// Row-by-row iterator over tile cells of a grid
pub struct GridIterator {
    col: u32,
    row: u32,
    cols: u32,
    rows: u32,
    finished: bool,
}

impl GridIterator {
    /// Iterator over a `cols` x `rows` tile matrix, as returned by `GridGeometry::tile_limits`
    pub fn new(limits: (u32, u32)) -> GridIterator {
        let (cols, rows) = limits;
        GridIterator {
            col: 0,
            row: 0,
            cols,
            rows,
            // Return "empty" iterator for empty grids
            finished: cols == 0 || rows == 0,
        }
    }
}

impl Iterator for GridIterator {
    /// Current cell index `(col, row)`
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let current = (self.col, self.row);
        if self.col < self.cols - 1 {
            self.col += 1;
        } else if self.row < self.rows - 1 {
            self.row += 1;
            self.col = 0;
        } else {
            self.finished = true;
        }
        Some(current)
    }
}

#[test]
fn test_grid_iter() {
    let cells = GridIterator::new((3, 2)).collect::<Vec<_>>();
    assert_eq!(cells, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);

    let cells = GridIterator::new((1, 1)).collect::<Vec<_>>();
    assert_eq!(cells, vec![(0, 0)]);
}

#[test]
fn test_empty_grid() {
    assert_eq!(GridIterator::new((0, 4)).count(), 0);
    assert_eq!(GridIterator::new((4, 0)).count(), 0);
}
