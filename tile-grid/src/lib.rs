//! A library for raster grid calculations
//!
//! ## Grid geometries
//!
//! ```rust
//! use tile_grid::{Envelope, GridGeometry, PixelAnchor};
//!
//! let grid = GridGeometry::new(20, 10, Envelope::new(-5.0, -5.0, 15.0, 5.0, 3857));
//! let to_crs = grid.grid_to_crs(PixelAnchor::Center).unwrap();
//! assert_eq!(to_crs.apply(0.0, 0.0), (-4.5, 4.5));
//! ```
//!
//! ## Grid iterators
//!
//! ```rust
//! use tile_grid::{Envelope, GridGeometry, GridIterator};
//!
//! let grid = GridGeometry::new(600, 300, Envelope::new(0.0, 0.0, 600.0, 300.0, 3857));
//! for (col, row) in GridIterator::new(grid.tile_limits(256, 256)) {
//!     println!("Tile {}/{}: {:?}", col, row, grid.tile_rect(col, row, 256, 256));
//! }
//! ```

mod grid;
mod grid_iterator;
#[cfg(test)]
mod grid_test;

pub use grid::{
    extent_wgs84_to_merc, lonlat_to_merc, merc_to_lonlat, AffineTransform, Envelope, Extent,
    GridGeometry, PixelAnchor, PixelRect, DEFAULT_GRID_SIZE,
};
pub use grid_iterator::GridIterator;
