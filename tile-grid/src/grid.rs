//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Output grids

use std::f64::consts;

/// Default pixel size of a grid without explicit extent
pub const DEFAULT_GRID_SIZE: u32 = 256;

/// Geographic extent
#[derive(PartialEq, Clone, Debug)]
pub struct Extent {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

/// Extent tagged with a spatial reference system.
///
/// The bounds are ordered on construction, so `minx <= maxx` and `miny <= maxy` always hold.
#[derive(PartialEq, Clone, Debug)]
pub struct Envelope {
    minx: f64,
    miny: f64,
    maxx: f64,
    maxy: f64,
    srid: i32,
}

impl Envelope {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, srid: i32) -> Envelope {
        Envelope {
            minx: x1.min(x2),
            miny: y1.min(y2),
            maxx: x1.max(x2),
            maxy: y1.max(y2),
            srid,
        }
    }
    pub fn from_extent(extent: &Extent, srid: i32) -> Envelope {
        Envelope::new(extent.minx, extent.miny, extent.maxx, extent.maxy, srid)
    }
    /// Bounding box of a non-empty point set
    pub fn from_coords<I>(coords: I, srid: i32) -> Option<Envelope>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = coords.into_iter();
        let (x, y) = iter.next()?;
        let mut env = Envelope::new(x, y, x, y, srid);
        for (x, y) in iter {
            env.minx = env.minx.min(x);
            env.miny = env.miny.min(y);
            env.maxx = env.maxx.max(x);
            env.maxy = env.maxy.max(y);
        }
        Some(env)
    }
    pub fn minx(&self) -> f64 {
        self.minx
    }
    pub fn miny(&self) -> f64 {
        self.miny
    }
    pub fn maxx(&self) -> f64 {
        self.maxx
    }
    pub fn maxy(&self) -> f64 {
        self.maxy
    }
    pub fn srid(&self) -> i32 {
        self.srid
    }
    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }
    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }
    pub fn extent(&self) -> Extent {
        Extent {
            minx: self.minx,
            miny: self.miny,
            maxx: self.maxx,
            maxy: self.maxy,
        }
    }
    /// Envelope grown by `dx` on both sides of the x axis and `dy` on the y axis
    pub fn expand(&self, dx: f64, dy: f64) -> Envelope {
        Envelope::new(
            self.minx - dx,
            self.miny - dy,
            self.maxx + dx,
            self.maxy + dy,
            self.srid,
        )
    }
    /// Boundary inclusive containment test
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.minx && x <= self.maxx && y >= self.miny && y <= self.maxy
    }
    pub fn intersects(&self, other: &Extent) -> bool {
        other.minx <= self.maxx
            && other.maxx >= self.minx
            && other.miny <= self.maxy
            && other.maxy >= self.miny
    }
}

/// Pixel coordinate convention of a grid to CRS transform
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum PixelAnchor {
    /// Upper left corner of the pixel
    Corner,
    /// Pixel center
    Center,
}

/// Affine transform in GDAL GeoTransform order:
///
/// `x = c[0] + col * c[1] + row * c[2]`,
/// `y = c[3] + col * c[4] + row * c[5]`
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct AffineTransform(pub [f64; 6]);

impl AffineTransform {
    /// North-up transform mapping the pixel corners of a `width` x `height` grid onto `extent`
    pub fn north_up(extent: &Extent, width: u32, height: u32) -> AffineTransform {
        let resx = (extent.maxx - extent.minx) / width as f64;
        let resy = (extent.maxy - extent.miny) / height as f64;
        AffineTransform([extent.minx, resx, 0.0, extent.maxy, 0.0, -resy])
    }
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let c = &self.0;
        (
            c[0] + col * c[1] + row * c[2],
            c[3] + col * c[4] + row * c[5],
        )
    }
    /// Shift the origin by a fractional number of pixels
    pub fn translate(&self, dcol: f64, drow: f64) -> AffineTransform {
        let (x0, y0) = self.apply(dcol, drow);
        let c = &self.0;
        AffineTransform([x0, c[1], c[2], y0, c[4], c[5]])
    }
    /// Inverse transform, `None` for a degenerate matrix
    pub fn inverse(&self) -> Option<AffineTransform> {
        let c = &self.0;
        let det = c[1] * c[5] - c[2] * c[4];
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        let a = c[5] * inv_det;
        let b = -c[2] * inv_det;
        let d = -c[4] * inv_det;
        let e = c[1] * inv_det;
        Some(AffineTransform([
            -(a * c[0] + b * c[3]),
            a,
            b,
            -(d * c[0] + e * c[3]),
            d,
            e,
        ]))
    }
}

/// Raster grid of an output coverage
#[derive(Clone, Debug)]
pub struct GridGeometry {
    /// Grid size in pixels (width, height). `None` when the caller left it open.
    pixel_extent: Option<(u32, u32)>,
    /// Covered area in the target CRS
    envelope: Envelope,
    /// Explicit pixel corner to CRS transform (rotated or sheared grids)
    transform: Option<AffineTransform>,
}

impl GridGeometry {
    pub fn new(width: u32, height: u32, envelope: Envelope) -> GridGeometry {
        GridGeometry {
            pixel_extent: Some((width, height)),
            envelope,
            transform: None,
        }
    }
    /// Grid covering `envelope` without a requested pixel size
    pub fn from_envelope(envelope: Envelope) -> GridGeometry {
        GridGeometry {
            pixel_extent: None,
            envelope,
            transform: None,
        }
    }
    /// Grid defined by a GDAL style GeoTransform
    pub fn from_geotransform(
        width: u32,
        height: u32,
        transform: AffineTransform,
        srid: i32,
    ) -> GridGeometry {
        let corners = [
            transform.apply(0.0, 0.0),
            transform.apply(width as f64, 0.0),
            transform.apply(0.0, height as f64),
            transform.apply(width as f64, height as f64),
        ];
        let envelope = Envelope::from_coords(corners.iter().cloned(), srid)
            .unwrap_or_else(|| Envelope::new(0.0, 0.0, 0.0, 0.0, srid));
        GridGeometry {
            pixel_extent: Some((width, height)),
            envelope,
            transform: Some(transform),
        }
    }
    pub fn has_pixel_extent(&self) -> bool {
        self.pixel_extent.is_some()
    }
    /// Same grid with `width` x `height` pixels if no size was given
    pub fn with_default_extent(&self, width: u32, height: u32) -> GridGeometry {
        let mut grid = self.clone();
        if grid.pixel_extent.is_none() {
            grid.pixel_extent = Some((width, height));
        }
        grid
    }
    pub fn width(&self) -> u32 {
        self.pixel_extent.map(|(w, _)| w).unwrap_or(0)
    }
    pub fn height(&self) -> u32 {
        self.pixel_extent.map(|(_, h)| h).unwrap_or(0)
    }
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }
    pub fn srid(&self) -> i32 {
        self.envelope.srid
    }
    /// Grid to CRS transform for the given pixel convention.
    /// Returns `None` if the grid has no pixel extent or is degenerate.
    pub fn grid_to_crs(&self, anchor: PixelAnchor) -> Option<AffineTransform> {
        let corner = match self.transform {
            Some(transform) => transform,
            None => {
                let (width, height) = self.pixel_extent?;
                if width == 0 || height == 0 {
                    return None;
                }
                AffineTransform::north_up(&self.envelope.extent(), width, height)
            }
        };
        match anchor {
            PixelAnchor::Corner => Some(corner),
            PixelAnchor::Center => Some(corner.translate(0.5, 0.5)),
        }
    }
    /// CRS to grid transform (pixel corner convention)
    pub fn crs_to_grid(&self) -> Option<AffineTransform> {
        self.grid_to_crs(PixelAnchor::Corner)
            .and_then(|transform| transform.inverse())
    }
    /// Number of tile columns and rows for the given tile size
    pub fn tile_limits(&self, tile_width: u32, tile_height: u32) -> (u32, u32) {
        if tile_width == 0 || tile_height == 0 {
            return (0, 0);
        }
        let count = |size: u32, tile: u32| size / tile + (size % tile != 0) as u32;
        (
            count(self.width(), tile_width),
            count(self.height(), tile_height),
        )
    }
    /// Pixel rectangle `(x, y, width, height)` of a tile, clipped to the grid
    pub fn tile_rect(&self, col: u32, row: u32, tile_width: u32, tile_height: u32) -> PixelRect {
        let x = col.saturating_mul(tile_width).min(self.width());
        let y = row.saturating_mul(tile_height).min(self.height());
        PixelRect {
            x,
            y,
            width: tile_width.min(self.width() - x),
            height: tile_height.min(self.height() - y),
        }
    }
}

/// Rectangle in pixel space
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Returns the Spherical Mercator (x, y) in meters
pub fn lonlat_to_merc(lon: f64, lat: f64) -> (f64, f64) {
    let x = 6378137.0 * lon.to_radians();
    let y = 6378137.0 * ((consts::PI * 0.25) + (0.5 * lat.to_radians())).tan().ln();
    (x, y)
}

/// Returns (lon, lat) in degrees of a Spherical Mercator position
pub fn merc_to_lonlat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / 6378137.0).to_degrees();
    let lat = (2.0 * (y / 6378137.0).exp().atan() - consts::PI * 0.5).to_degrees();
    (lon, lat)
}

/// Projected extent
pub fn extent_wgs84_to_merc(extent: &Extent) -> Extent {
    let (minx, miny) = lonlat_to_merc(extent.minx, extent.miny);
    let (maxx, maxy) = lonlat_to_merc(extent.maxx, extent.maxy);
    Extent {
        minx,
        miny,
        maxx,
        maxy,
    }
}
