//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::error::{HeatmapError, Result};
use crate::transform::reproject::{CoordTransform, CrsRegistry};
use std::sync::Arc;
use tile_grid::{AffineTransform, Envelope, GridGeometry, PixelAnchor, PixelRect};

/// Transforms between pixel space of an output grid and the native CRS of a point source.
///
/// CRS lookups happen once at construction.
pub struct CoordinateTransformPipeline {
    grid: GridGeometry,
    native_srid: i32,
    corner_to_crs: AffineTransform,
    center_to_crs: AffineTransform,
    crs_to_corner: AffineTransform,
    to_native: Arc<dyn CoordTransform>,
    from_native: Arc<dyn CoordTransform>,
}

impl CoordinateTransformPipeline {
    /// `grid` must have a pixel extent.
    pub fn new(
        grid: &GridGeometry,
        native_srid: i32,
        registry: &dyn CrsRegistry,
    ) -> Result<CoordinateTransformPipeline> {
        let corner_to_crs = grid.grid_to_crs(PixelAnchor::Corner).ok_or(
            HeatmapError::Transform(format!("No grid to CRS transform for {:?}", grid)),
        )?;
        let center_to_crs = grid.grid_to_crs(PixelAnchor::Center).ok_or(
            HeatmapError::Transform(format!("No grid to CRS transform for {:?}", grid)),
        )?;
        let crs_to_corner = corner_to_crs.inverse().ok_or(HeatmapError::Transform(
            "Grid to CRS transform is not invertible".to_string(),
        ))?;
        let to_native = registry.transform(grid.srid(), native_srid)?;
        let from_native = registry.transform(native_srid, grid.srid())?;
        Ok(CoordinateTransformPipeline {
            grid: grid.clone(),
            native_srid,
            corner_to_crs,
            center_to_crs,
            crs_to_corner,
            to_native,
            from_native,
        })
    }

    pub fn grid(&self) -> &GridGeometry {
        &self.grid
    }

    pub fn native_srid(&self) -> i32 {
        self.native_srid
    }

    /// Pixel corner position to native CRS
    pub fn corner_to_native(&self, col: f64, row: f64) -> Result<(f64, f64)> {
        let mut coords = [(col, row)];
        self.corners_to_native(&mut coords)?;
        Ok(coords[0])
    }

    /// Pixel center of pixel `(col, row)` to native CRS
    pub fn center_to_native(&self, col: f64, row: f64) -> Result<(f64, f64)> {
        let mut coords = [self.center_to_crs.apply(col, row)];
        self.to_native.transform_coords(&mut coords)?;
        Ok(coords[0])
    }

    /// Native CRS position to fractional pixel position (corner convention)
    pub fn native_to_corner(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let mut coords = [(x, y)];
        self.native_to_corners(&mut coords)?;
        Ok(coords[0])
    }

    /// Batch variant of `corner_to_native`, in place
    pub fn corners_to_native(&self, coords: &mut [(f64, f64)]) -> Result<()> {
        for c in coords.iter_mut() {
            *c = self.corner_to_crs.apply(c.0, c.1);
        }
        self.to_native.transform_coords(coords)
    }

    /// Batch variant of `native_to_corner`, in place
    pub fn native_to_corners(&self, coords: &mut [(f64, f64)]) -> Result<()> {
        self.from_native.transform_coords(coords)?;
        for c in coords.iter_mut() {
            *c = self.crs_to_corner.apply(c.0, c.1);
        }
        Ok(())
    }

    /// Native CRS positions of all pixel centers of `rect`, row-major
    pub fn pixel_centers(&self, rect: &PixelRect) -> Result<Vec<(f64, f64)>> {
        let mut coords = Vec::with_capacity((rect.width * rect.height) as usize);
        for row in rect.y..rect.y + rect.height {
            for col in rect.x..rect.x + rect.width {
                coords.push(self.center_to_crs.apply(col as f64, row as f64));
            }
        }
        self.to_native.transform_coords(&mut coords)?;
        Ok(coords)
    }

    /// Bounding envelope in native CRS of a pixel rectangle.
    /// Edge midpoints are included to cover curved reprojected edges.
    pub fn native_envelope(&self, rect: &PixelRect) -> Result<Envelope> {
        let (x0, y0) = (rect.x as f64, rect.y as f64);
        let (x1, y1) = (x0 + rect.width as f64, y0 + rect.height as f64);
        let (xm, ym) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
        let mut coords = [
            (x0, y0),
            (x1, y0),
            (x0, y1),
            (x1, y1),
            (xm, y0),
            (xm, y1),
            (x0, ym),
            (x1, ym),
        ];
        self.corners_to_native(&mut coords)?;
        if coords.iter().any(|c| !c.0.is_finite() || !c.1.is_finite()) {
            return Err(HeatmapError::Transform(format!(
                "Tile {:?} has no finite native extent",
                rect
            )));
        }
        Envelope::from_coords(coords.iter().cloned(), self.native_srid).ok_or(
            HeatmapError::Transform(format!("Empty native extent for {:?}", rect)),
        )
    }
}
