//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::error::{HeatmapError, Result};
use crate::datasource::{
    FeaturePointSource, GeometryField, MemoryDataset, Point2D, PointCloudMetadata, PointSource,
    PointStream,
};
use crate::engine::{KernelParameters, Tile, TileAddress, TileEngine};
use crate::transform::{CoordinateTransformPipeline, Proj4Registry};
use std::collections::BTreeMap;
use std::sync::Arc;
use tile_grid::{Envelope, GridGeometry};

fn point_source(coords: &[(f64, f64)], srid: i32) -> Arc<dyn PointSource> {
    let ds = Arc::new(MemoryDataset::from_points("pts", Some(srid), coords));
    Arc::new(FeaturePointSource::new(ds, GeometryField::points(None)).unwrap())
}

fn tile_engine(
    source: Arc<dyn PointSource>,
    grid: &GridGeometry,
    distance: f64,
    tile_size: u32,
) -> TileEngine {
    let kernel = KernelParameters::new(distance, distance).unwrap();
    let pipeline = CoordinateTransformPipeline::new(grid, source.srid(), &Proj4Registry).unwrap();
    TileEngine::new(source, kernel, pipeline, tile_size).unwrap()
}

/// Grid with one pixel per unit, pixel centers on integer coordinates
fn unit_grid(minx: f64, miny: f64, width: u32, height: u32) -> GridGeometry {
    GridGeometry::new(
        width,
        height,
        Envelope::new(
            minx - 0.5,
            miny - 0.5,
            minx - 0.5 + width as f64,
            miny - 0.5 + height as f64,
            3857,
        ),
    )
}

/// Sample at integer grid coordinate (x, y) of a single tile `unit_grid`
fn sample_at(tile: &Tile, grid: &GridGeometry, x: f64, y: f64) -> f32 {
    let env = grid.envelope();
    let col = (x - env.minx() - 0.5) as u32;
    let row = (env.maxy() - y - 0.5) as u32;
    tile.get(col, row).unwrap()
}

#[test]
fn test_two_points_scenario() {
    let source = point_source(&[(0.0, 0.0), (10.0, 0.0)], 3857);
    let grid = unit_grid(-5.0, -5.0, 21, 11);
    let engine = tile_engine(source, &grid, 3.0, 32);
    assert_eq!(engine.tile_limits(), (1, 1));
    let tile = engine.compute(&TileAddress::new(0, 0)).unwrap();
    assert_eq!((tile.width(), tile.height()), (21, 11));
    assert_eq!(tile.point_count, 2);

    assert!((sample_at(&tile, &grid, 0.0, 0.0) - 1.0).abs() < 1e-6);
    assert!((sample_at(&tile, &grid, 10.0, 0.0) - 1.0).abs() < 1e-6);
    // Outside of both influence radii: no data
    assert!(sample_at(&tile, &grid, 5.0, 0.0).is_nan());
    assert!(sample_at(&tile, &grid, 0.0, 5.0).is_nan());
    // Within radius
    let v = sample_at(&tile, &grid, 3.0, 0.0);
    assert!((v - (-4.5f32).exp()).abs() < 1e-6);
    assert!(sample_at(&tile, &grid, 4.0, 0.0).is_nan());
    // 2 x 7 x 7 pixels within the truncated kernel support
    assert_eq!(tile.count_defined(), 98);
}

#[test]
fn test_peak_and_decrease() {
    let source = point_source(&[(20.0, 20.0)], 3857);
    let grid = unit_grid(0.0, 0.0, 41, 41);
    let kernel = KernelParameters::new(8.0, 8.0)
        .unwrap()
        .with_amplitude(3.5)
        .unwrap();
    let pipeline = CoordinateTransformPipeline::new(&grid, 3857, &Proj4Registry).unwrap();
    let engine = TileEngine::new(source, kernel, pipeline, 64).unwrap();
    let tile = engine.compute(&TileAddress::new(0, 0)).unwrap();

    assert_eq!(sample_at(&tile, &grid, 20.0, 20.0), 3.5);
    let mut last = 3.5;
    for dx in 1..=8 {
        let v = sample_at(&tile, &grid, 20.0 + dx as f64, 20.0);
        assert!(v < last, "{} not < {} at dx={}", v, last, dx);
        // Symmetric
        assert_eq!(v, sample_at(&tile, &grid, 20.0 - dx as f64, 20.0));
        last = v;
    }
    let diagonal = sample_at(&tile, &grid, 23.0, 23.0);
    assert!(diagonal < sample_at(&tile, &grid, 23.0, 20.0));
}

#[test]
fn test_truncation() {
    // Points just outside the support of every pixel of the tile
    let grid = unit_grid(0.0, 0.0, 10, 10);
    let far = [(-4.5, 5.0), (5.0, 13.5), (13.01, 13.01), (-100.0, -100.0)];
    let source = point_source(&far, 3857);
    let tile = tile_engine(source, &grid, 4.0, 16)
        .compute(&TileAddress::new(0, 0))
        .unwrap();
    assert!(tile.is_empty());

    // Adding far points doesn't change the result
    let near = [(2.0, 3.0), (7.5, 7.5)];
    let all: Vec<_> = near.iter().chain(far.iter()).cloned().collect();
    let expected = tile_engine(point_source(&near, 3857), &grid, 4.0, 16)
        .compute(&TileAddress::new(0, 0))
        .unwrap();
    let tile = tile_engine(point_source(&all, 3857), &grid, 4.0, 16)
        .compute(&TileAddress::new(0, 0))
        .unwrap();
    assert_eq!(format!("{:?}", tile.data), format!("{:?}", expected.data));
}

#[test]
fn test_order_independence() {
    let coords: Vec<(f64, f64)> = (0..50)
        .map(|i| ((i * 7 % 23) as f64 * 0.9, (i * 11 % 17) as f64 * 1.1))
        .collect();
    let mut reversed = coords.clone();
    reversed.reverse();
    let mut shuffled = coords.clone();
    shuffled.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

    let grid = unit_grid(0.0, 0.0, 24, 20);
    let tiles: Vec<Tile> = [coords, reversed, shuffled]
        .iter()
        .map(|c| {
            tile_engine(point_source(c, 3857), &grid, 3.0, 32)
                .compute(&TileAddress::new(0, 0))
                .unwrap()
        })
        .collect();
    for other in &tiles[1..] {
        for (a, b) in tiles[0].data.iter().zip(other.data.iter()) {
            assert!(
                (a.is_nan() && b.is_nan()) || (a - b).abs() <= 1e-5 * a.abs().max(1.0),
                "{} != {}",
                a,
                b
            );
        }
    }
}

#[test]
fn test_tile_continuity() {
    let coords = [(7.0, 4.0), (8.5, 5.0), (3.0, 3.0), (12.0, 6.0)];
    let grid = unit_grid(0.0, 0.0, 16, 8);
    let whole = tile_engine(point_source(&coords, 3857), &grid, 3.0, 16)
        .compute(&TileAddress::new(0, 0))
        .unwrap();
    let tiled = tile_engine(point_source(&coords, 3857), &grid, 3.0, 8);
    assert_eq!(tiled.tile_limits(), (2, 1));
    let left = tiled.compute(&TileAddress::new(0, 0)).unwrap();
    let right = tiled.compute(&TileAddress::new(1, 0)).unwrap();
    assert_eq!(right.rect.x, 8);
    for row in 0..8 {
        for col in 0..16 {
            let expected = whole.get(col, row).unwrap();
            let v = if col < 8 {
                left.get(col, row).unwrap()
            } else {
                right.get(col - 8, row).unwrap()
            };
            assert!(
                (v.is_nan() && expected.is_nan()) || v == expected,
                "pixel {}/{}: {} != {}",
                col,
                row,
                v,
                expected
            );
        }
    }
}

#[test]
fn test_partial_edge_tile() {
    let grid = unit_grid(0.0, 0.0, 10, 5);
    let engine = tile_engine(point_source(&[(9.0, 0.0)], 3857), &grid, 2.0, 4);
    assert_eq!(engine.tile_limits(), (3, 2));
    assert_eq!(engine.tiles().count(), 6);
    let tile = engine.compute(&TileAddress::new(2, 1)).unwrap();
    assert_eq!((tile.width(), tile.height()), (2, 1));
    // Pixel center (9, 0)
    assert_eq!(tile.get(1, 0), Some(1.0));
    assert!(matches!(
        engine.compute(&TileAddress::new(3, 0)),
        Err(HeatmapError::UnsupportedRequest(_))
    ));
}

#[test]
fn test_reprojected_grid() {
    // Points in Web Mercator, output grid in lon/lat
    let (x, y) = tile_grid::lonlat_to_merc(8.0, 47.0);
    let source = point_source(&[(x, y)], 3857);
    let grid = GridGeometry::new(20, 20, Envelope::new(7.0, 46.0, 9.0, 48.0, 4326));
    let engine = tile_engine(source, &grid, 100000.0, 32);
    let tile = engine.compute(&TileAddress::new(0, 0)).unwrap();
    // Pixel centers (7.95, 47.05) and (8.05, 46.95) around the point
    let v1 = tile.get(9, 9).unwrap();
    let v2 = tile.get(10, 10).unwrap();
    assert!(v1 > 0.9 && v2 > 0.9);
    // Corner pixel is more than 100 km away
    assert!(tile.get(0, 0).unwrap().is_nan());
}

#[test]
fn test_kernel_distance_zero() {
    assert!(matches!(
        KernelParameters::new(0.0, 3.0),
        Err(HeatmapError::KernelConfiguration(_))
    ));
}

/// Source failing on parallel requests and on data access
struct FailingSource;

impl PointSource for FailingSource {
    fn points_in(&self, _envelope: &Envelope, parallel: bool) -> Result<PointStream<'_>> {
        if parallel {
            return Err(HeatmapError::UnsupportedConcurrency("failing".to_string()));
        }
        let points = vec![
            Ok(Point2D::new(1.0, 1.0)),
            Err(HeatmapError::DataAccess("connection lost".to_string())),
        ];
        Ok(Box::new(points.into_iter()))
    }
    fn envelope(&self) -> Option<Envelope> {
        None
    }
    fn srid(&self) -> i32 {
        3857
    }
    fn metadata(&self) -> PointCloudMetadata {
        PointCloudMetadata {
            identifier: None,
            srid: 3857,
            bounds: None,
            properties: BTreeMap::new(),
        }
    }
}

#[test]
fn test_errors_propagate() {
    let grid = unit_grid(0.0, 0.0, 8, 8);
    let engine = tile_engine(Arc::new(FailingSource), &grid, 2.0, 8);
    assert!(matches!(
        engine.compute(&TileAddress::new(0, 0)),
        Err(HeatmapError::DataAccess(_))
    ));
    let engine = engine.with_parallel(true);
    assert!(matches!(
        engine.compute(&TileAddress::new(0, 0)),
        Err(HeatmapError::UnsupportedConcurrency(_))
    ));
}

#[test]
fn test_tile_larger_than_grid() {
    let source = point_source(&[(0.0, 0.0), (10.0, 0.0)], 3857);
    let grid = unit_grid(-5.0, -5.0, 21, 11);
    let engine = tile_engine(source, &grid, 3.0, u32::MAX);
    assert_eq!(engine.tile_limits(), (1, 1));
    let tile = engine.compute(&TileAddress::new(0, 0)).unwrap();
    assert_eq!((tile.width(), tile.height()), (21, 11));
    assert!((sample_at(&tile, &grid, 10.0, 0.0) - 1.0).abs() < 1e-6);
}
