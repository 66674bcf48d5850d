//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::error::{HeatmapError, Result};
use crate::datasource::{PointCloudMetadata, PointSource};
use crate::engine::{KernelParameters, Tile, TileAddress, TileEngine};
use crate::transform::{CoordinateTransformPipeline, CrsRegistry};
use serde::Serializer;
use std::collections::BTreeMap;
use std::sync::Arc;
use tile_grid::{Envelope, GridGeometry, DEFAULT_GRID_SIZE};

/// Coverage read parameters
#[derive(Clone, Debug)]
pub struct ReadRequest {
    /// Output grid. Required.
    pub grid: Option<GridGeometry>,
    /// Band selection. Must be empty, the surface has a single band.
    pub bands: Vec<String>,
    /// Tile width and height in pixels
    pub tile_size: u32,
}

impl ReadRequest {
    pub fn new(grid: GridGeometry) -> ReadRequest {
        ReadRequest {
            grid: Some(grid),
            bands: Vec::new(),
            tile_size: DEFAULT_GRID_SIZE,
        }
    }
    pub fn with_tile_size(mut self, tile_size: u32) -> ReadRequest {
        self.tile_size = tile_size;
        self
    }
}

/// Sample description of the single density band
#[derive(Serialize, Clone, Debug)]
pub struct SampleDimension {
    pub name: String,
    pub data_type: String,
    /// Value of pixels without data, always NaN for density tiles
    #[serde(serialize_with = "serialize_nodata")]
    pub nodata: Option<f32>,
}

// JSON has no NaN literal
fn serialize_nodata<S>(nodata: &Option<f32>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match nodata {
        Some(v) if v.is_nan() => serializer.serialize_str("NaN"),
        Some(v) => serializer.serialize_f32(*v),
        None => serializer.serialize_none(),
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct SurfaceMetadata {
    pub source: PointCloudMetadata,
    pub sample: SampleDimension,
    pub distance_x: f64,
    pub distance_y: f64,
    pub amplitude: f32,
    pub properties: BTreeMap<String, String>,
}

/// Density surface of a point source
#[derive(Clone)]
pub struct HeatmapSurface {
    source: Arc<dyn PointSource>,
    kernel: KernelParameters,
    registry: Arc<dyn CrsRegistry>,
    properties: BTreeMap<String, String>,
}

impl HeatmapSurface {
    pub fn new(
        source: Arc<dyn PointSource>,
        kernel: KernelParameters,
        registry: Arc<dyn CrsRegistry>,
    ) -> HeatmapSurface {
        HeatmapSurface {
            source,
            kernel,
            registry,
            properties: BTreeMap::new(),
        }
    }

    /// Add descriptive metadata
    pub fn with_property(mut self, key: &str, value: &str) -> HeatmapSurface {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn kernel(&self) -> &KernelParameters {
        &self.kernel
    }

    pub fn source(&self) -> &Arc<dyn PointSource> {
        &self.source
    }

    /// Extent of the point source
    pub fn envelope(&self) -> Option<Envelope> {
        self.source.envelope()
    }

    /// Grid covering the source extent with the default pixel size
    pub fn default_grid_geometry(&self) -> Option<GridGeometry> {
        self.envelope().map(|env| {
            GridGeometry::from_envelope(env)
                .with_default_extent(DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE)
        })
    }

    pub fn metadata(&self) -> SurfaceMetadata {
        SurfaceMetadata {
            source: self.source.metadata(),
            sample: SampleDimension {
                name: "density".to_string(),
                data_type: "Float32".to_string(),
                nodata: Some(f32::NAN),
            },
            distance_x: self.kernel.distance_x(),
            distance_y: self.kernel.distance_y(),
            amplitude: self.kernel.amplitude(),
            properties: self.properties.clone(),
        }
    }

    /// Coverage computing tiles of the requested grid on demand
    pub fn read(&self, request: &ReadRequest) -> Result<HeatmapCoverage> {
        let grid = request.grid.as_ref().ok_or(HeatmapError::UnsupportedRequest(
            "read requires an output grid geometry".to_string(),
        ))?;
        if !request.bands.is_empty() {
            return Err(HeatmapError::UnsupportedRequest(format!(
                "band selection {:?} on single band surface",
                request.bands
            )));
        }
        let grid = grid.with_default_extent(DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE);
        let pipeline =
            CoordinateTransformPipeline::new(&grid, self.source.srid(), self.registry.as_ref())?;
        let engine = TileEngine::new(
            self.source.clone(),
            self.kernel,
            pipeline,
            request.tile_size,
        )?;
        info!(
            "Reading {}x{} grid EPSG:{} from EPSG:{} source",
            grid.width(),
            grid.height(),
            grid.srid(),
            self.source.srid()
        );
        Ok(HeatmapCoverage {
            engine: Arc::new(engine),
        })
    }
}

/// Tiled single band coverage bound to one output grid
#[derive(Clone)]
pub struct HeatmapCoverage {
    engine: Arc<TileEngine>,
}

impl HeatmapCoverage {
    pub fn grid_geometry(&self) -> &GridGeometry {
        self.engine.pipeline().grid()
    }

    pub fn engine(&self) -> &Arc<TileEngine> {
        &self.engine
    }

    pub fn tile_limits(&self) -> (u32, u32) {
        self.engine.tile_limits()
    }

    pub fn tiles(&self) -> impl Iterator<Item = TileAddress> {
        self.engine.tiles()
    }

    pub fn tile(&self, address: &TileAddress) -> Result<Tile> {
        self.engine.compute(address)
    }

    /// Sample at grid pixel `(col, row)`
    pub fn sample(&self, col: u32, row: u32) -> Result<f32> {
        let grid = self.grid_geometry();
        if col >= grid.width() || row >= grid.height() {
            return Err(HeatmapError::UnsupportedRequest(format!(
                "pixel {}/{} outside of {}x{} grid",
                col,
                row,
                grid.width(),
                grid.height()
            )));
        }
        let size = self.engine.tile_size();
        let tile = self.tile(&TileAddress::new(col / size, row / size))?;
        tile.get(col - tile.rect.x, row - tile.rect.y).ok_or(
            HeatmapError::UnsupportedRequest(format!("pixel {}/{} not in tile", col, row)),
        )
    }

    /// All samples of the grid, row-major
    pub fn raster(&self) -> Result<Vec<f32>> {
        let grid = self.grid_geometry();
        let width = grid.width() as usize;
        let mut data = vec![f32::NAN; width * grid.height() as usize];
        for address in self.tiles() {
            let tile = self.tile(&address)?;
            for y in 0..tile.rect.height {
                let src = (y * tile.rect.width) as usize;
                let dst = (tile.rect.y + y) as usize * width + tile.rect.x as usize;
                let len = tile.rect.width as usize;
                data[dst..dst + len].copy_from_slice(&tile.data[src..src + len]);
            }
        }
        Ok(data)
    }
}
