//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::grid::{
    extent_wgs84_to_merc, lonlat_to_merc, merc_to_lonlat, AffineTransform, Envelope, Extent,
    GridGeometry, PixelAnchor, PixelRect,
};

#[test]
fn test_envelope_order() {
    let env = Envelope::new(10.0, 5.0, -10.0, -5.0, 3857);
    assert_eq!(env.minx(), -10.0);
    assert_eq!(env.miny(), -5.0);
    assert_eq!(env.maxx(), 10.0);
    assert_eq!(env.maxy(), 5.0);
    assert_eq!(env.width(), 20.0);

    let expanded = env.expand(3.0, 1.0);
    assert_eq!(
        expanded.extent(),
        Extent {
            minx: -13.0,
            miny: -6.0,
            maxx: 13.0,
            maxy: 6.0,
        }
    );
    assert!(expanded.contains(13.0, 6.0));
    assert!(!expanded.contains(13.1, 0.0));
}

#[test]
fn test_envelope_from_coords() {
    let env = Envelope::from_coords(vec![(1.0, 2.0), (-3.0, 8.0), (0.0, -1.0)], 4326).unwrap();
    assert_eq!(env, Envelope::new(-3.0, -1.0, 1.0, 8.0, 4326));
    assert!(Envelope::from_coords(Vec::new(), 4326).is_none());
}

#[test]
fn test_affine_inverse() {
    let transform = AffineTransform([100.0, 2.0, 0.5, 200.0, 0.25, -2.0]);
    let inverse = transform.inverse().unwrap();
    let (x, y) = transform.apply(7.0, 3.0);
    let (col, row) = inverse.apply(x, y);
    assert!((col - 7.0).abs() < 1e-9);
    assert!((row - 3.0).abs() < 1e-9);

    let degenerate = AffineTransform([0.0, 1.0, 2.0, 0.0, 2.0, 4.0]);
    assert_eq!(degenerate.inverse(), None);
}

#[test]
fn test_grid_transforms() {
    let grid = GridGeometry::new(20, 10, Envelope::new(-5.0, -5.0, 15.0, 5.0, 3857));
    let corner = grid.grid_to_crs(PixelAnchor::Corner).unwrap();
    assert_eq!(corner.apply(0.0, 0.0), (-5.0, 5.0));
    assert_eq!(corner.apply(20.0, 10.0), (15.0, -5.0));
    let center = grid.grid_to_crs(PixelAnchor::Center).unwrap();
    assert_eq!(center.apply(0.0, 0.0), (-4.5, 4.5));
    let to_grid = grid.crs_to_grid().unwrap();
    assert_eq!(to_grid.apply(0.0, 0.0), (5.0, 5.0));
}

#[test]
fn test_default_extent() {
    let grid = GridGeometry::from_envelope(Envelope::new(0.0, 0.0, 512.0, 512.0, 3857));
    assert!(!grid.has_pixel_extent());
    assert_eq!(grid.grid_to_crs(PixelAnchor::Corner), None);
    let grid = grid.with_default_extent(256, 256);
    assert_eq!((grid.width(), grid.height()), (256, 256));
    assert_eq!(grid.grid_to_crs(PixelAnchor::Corner).unwrap().0[1], 2.0);

    // explicit extent is kept
    let grid = GridGeometry::new(10, 20, Envelope::new(0.0, 0.0, 1.0, 1.0, 3857));
    let grid = grid.with_default_extent(256, 256);
    assert_eq!((grid.width(), grid.height()), (10, 20));
}

#[test]
fn test_geotransform_grid() {
    let grid =
        GridGeometry::from_geotransform(100, 50, AffineTransform([0.0, 10.0, 0.0, 500.0, 0.0, -10.0]), 2056);
    assert_eq!(grid.envelope(), &Envelope::new(0.0, 0.0, 1000.0, 500.0, 2056));
    assert_eq!(grid.srid(), 2056);
}

#[test]
fn test_tile_limits() {
    let grid = GridGeometry::new(600, 256, Envelope::new(0.0, 0.0, 600.0, 256.0, 3857));
    assert_eq!(grid.tile_limits(256, 256), (3, 1));
    assert_eq!(
        grid.tile_rect(2, 0, 256, 256),
        PixelRect {
            x: 512,
            y: 0,
            width: 88,
            height: 256,
        }
    );
    assert!(grid.tile_rect(5, 5, 256, 256).is_empty());
    assert_eq!(grid.tile_limits(0, 256), (0, 0));
}

#[test]
fn test_tile_limits_large_tiles() {
    let grid = GridGeometry::new(256, 256, Envelope::new(0.0, 0.0, 256.0, 256.0, 3857));
    assert_eq!(grid.tile_limits(u32::MAX, u32::MAX), (1, 1));
    assert_eq!(grid.tile_limits(1000, 256), (1, 1));
    assert_eq!(
        grid.tile_rect(0, 0, u32::MAX, u32::MAX),
        PixelRect {
            x: 0,
            y: 0,
            width: 256,
            height: 256,
        }
    );
}

#[test]
fn test_merc_roundtrip() {
    let (x, y) = lonlat_to_merc(8.5, 47.37);
    let (lon, lat) = merc_to_lonlat(x, y);
    assert!((lon - 8.5).abs() < 1e-9);
    assert!((lat - 47.37).abs() < 1e-9);

    let extent = extent_wgs84_to_merc(&Extent {
        minx: -180.0,
        miny: 0.0,
        maxx: 180.0,
        maxy: 0.0,
    });
    assert_eq!(extent.minx, -20037508.342789244);
    assert!(extent.miny.abs() < 1e-6);
}
