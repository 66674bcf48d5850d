//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::error::{HeatmapError, Result};
use crate::datasource::PointSource;
use crate::engine::kernel::KernelParameters;
use crate::engine::tile::{Tile, TileAddress};
use crate::transform::CoordinateTransformPipeline;
use std::sync::Arc;
use tile_grid::{GridIterator, PixelRect};

/// Number of points requested per batch from the point source
pub const BATCH_SIZE: usize = 4096;

/// Computes density tiles of one output grid.
///
/// Every `compute` call is independent. Tiles can be computed concurrently from multiple threads.
pub struct TileEngine {
    source: Arc<dyn PointSource>,
    kernel: KernelParameters,
    pipeline: CoordinateTransformPipeline,
    tile_size: u32,
    parallel: bool,
}

impl TileEngine {
    pub fn new(
        source: Arc<dyn PointSource>,
        kernel: KernelParameters,
        pipeline: CoordinateTransformPipeline,
        tile_size: u32,
    ) -> Result<TileEngine> {
        if tile_size == 0 {
            return Err(HeatmapError::UnsupportedRequest(
                "tile size must be > 0".to_string(),
            ));
        }
        Ok(TileEngine {
            source,
            kernel,
            pipeline,
            tile_size,
            parallel: false,
        })
    }

    /// Request parallel point streams from the source
    pub fn with_parallel(mut self, parallel: bool) -> TileEngine {
        self.parallel = parallel;
        self
    }

    pub fn kernel(&self) -> &KernelParameters {
        &self.kernel
    }

    pub fn pipeline(&self) -> &CoordinateTransformPipeline {
        &self.pipeline
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Number of tile columns and rows
    pub fn tile_limits(&self) -> (u32, u32) {
        self.pipeline
            .grid()
            .tile_limits(self.tile_size, self.tile_size)
    }

    /// All tile addresses, row by row
    pub fn tiles(&self) -> impl Iterator<Item = TileAddress> {
        GridIterator::new(self.tile_limits()).map(|(col, row)| TileAddress::new(col, row))
    }

    /// Pixel rectangle of a tile within the output grid
    pub fn tile_rect(&self, address: &TileAddress) -> Result<PixelRect> {
        let (cols, rows) = self.tile_limits();
        if address.col >= cols || address.row >= rows {
            return Err(HeatmapError::UnsupportedRequest(format!(
                "tile {}/{} outside of {}x{} tiles",
                address.col, address.row, cols, rows
            )));
        }
        Ok(self
            .pipeline
            .grid()
            .tile_rect(address.col, address.row, self.tile_size, self.tile_size))
    }

    /// Compute the samples of one tile
    pub fn compute(&self, address: &TileAddress) -> Result<Tile> {
        let rect = self.tile_rect(address)?;
        let mut tile = Tile::new(*address, rect);
        if rect.is_empty() {
            return Ok(tile);
        }
        let query = self
            .pipeline
            .native_envelope(&rect)?
            .expand(self.kernel.distance_x(), self.kernel.distance_y());
        let centers = self.pipeline.pixel_centers(&rect)?;
        debug!(
            "Tile {}/{}: querying points in {:?}",
            address.col, address.row, query
        );

        let mut npoints = 0;
        for chunk in self.source.batch(&query, self.parallel, BATCH_SIZE)? {
            let chunk = chunk?;
            npoints += chunk.len() / 2;
            self.accumulate(&mut tile, &centers, &chunk)?;
        }
        tile.point_count = npoints;
        debug!(
            "Tile {}/{}: {} points, {} pixels with data",
            address.col,
            address.row,
            npoints,
            tile.count_defined()
        );
        Ok(tile)
    }

    /// Add kernel contributions of flat point coordinates to the tile
    fn accumulate(&self, tile: &mut Tile, centers: &[(f64, f64)], chunk: &[f64]) -> Result<()> {
        let (dist_x, dist_y) = (self.kernel.distance_x(), self.kernel.distance_y());
        // Support box corners of every point, in pixel space
        let mut windows = Vec::with_capacity(chunk.len() * 2);
        for xy in chunk.chunks(2) {
            let (x0, y0) = (xy[0], xy[1]);
            windows.push((x0 - dist_x, y0 - dist_y));
            windows.push((x0 + dist_x, y0 - dist_y));
            windows.push((x0 - dist_x, y0 + dist_y));
            windows.push((x0 + dist_x, y0 + dist_y));
        }
        self.pipeline.native_to_corners(&mut windows)?;

        let rect = tile.rect;
        for (xy, corners) in chunk.chunks(2).zip(windows.chunks(4)) {
            let (x0, y0) = (xy[0], xy[1]);
            let (cols, rows) = match pixel_window(&rect, corners) {
                Some(window) => window,
                None => continue,
            };
            for row in rows.0..rows.1 {
                let offset = ((row - rect.y) * rect.width) as usize;
                for col in cols.0..cols.1 {
                    let idx = offset + (col - rect.x) as usize;
                    let (x, y) = centers[idx];
                    let (dx, dy) = (x - x0, y - y0);
                    if !self.kernel.in_support(dx, dy) {
                        continue;
                    }
                    let value = self.kernel.weight(dx, dy);
                    let sample = &mut tile.data[idx];
                    if sample.is_nan() {
                        *sample = value;
                    } else {
                        *sample += value;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Grid column and row ranges (end exclusive) within `rect` whose pixel centers may lie
/// inside the pixel-space bounds of `corners`. Rounded outwards.
fn pixel_window(rect: &PixelRect, corners: &[(f64, f64)]) -> Option<((u32, u32), (u32, u32))> {
    let (mut minc, mut minr) = (f64::INFINITY, f64::INFINITY);
    let (mut maxc, mut maxr) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &(c, r) in corners {
        if !c.is_finite() || !r.is_finite() {
            // Unknown location: scan the whole tile
            return Some((
                (rect.x, rect.x + rect.width),
                (rect.y, rect.y + rect.height),
            ));
        }
        minc = minc.min(c);
        maxc = maxc.max(c);
        minr = minr.min(r);
        maxr = maxr.max(r);
    }
    let clamp = |v: f64, lo: u32, hi: u32| -> u32 { v.max(lo as f64).min(hi as f64) as u32 };
    let (xmin, xmax) = (rect.x, rect.x + rect.width);
    let (ymin, ymax) = (rect.y, rect.y + rect.height);
    let col0 = clamp((minc - 0.5).floor(), xmin, xmax);
    let col1 = clamp((maxc - 0.5).ceil() + 1.0, xmin, xmax);
    let row0 = clamp((minr - 0.5).floor(), ymin, ymax);
    let row1 = clamp((maxr - 0.5).ceil() + 1.0, ymin, ymax);
    if col0 >= col1 || row0 >= row1 {
        return None;
    }
    Some(((col0, col1), (row0, row1)))
}
