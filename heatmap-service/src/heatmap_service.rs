//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::datasources::{Datasource, Datasources};
use heatmap_core::cache::{metadata_path, tile_path, Cache, TileArena, Tilecache};
use heatmap_core::core::config::SurfaceCfg;
use heatmap_core::core::gridcfg::TiledGrid;
use heatmap_core::core::stats::{Measure, Statistics};
use heatmap_core::core::{ApplicationCfg, Config, HeatmapError, Result};
use heatmap_core::coverage::{HeatmapCoverage, HeatmapSurface, ReadRequest};
use heatmap_core::datasource::{FeaturePointSource, GeometryField};
use heatmap_core::engine::{KernelParameters, Tile, TileAddress};
use heatmap_core::transform::Proj4Registry;
use pbr::ProgressBar;
use std::cmp;
use std::io::{stderr, Stderr, Stdout};
use std::sync::Arc;
use std::time::Instant;
use tile_grid::GridIterator;
use tokio::task;

/// Memory limit of computed tiles kept for repeated requests
const ARENA_CAPACITY_BYTES: usize = 256 * 1024 * 1024;

/// Heatmap surface bound to the service grid
#[derive(Clone)]
pub struct SurfaceLayer {
    pub name: String,
    pub datasource: String,
    pub surface: HeatmapSurface,
    pub coverage: HeatmapCoverage,
}

/// Heatmap tile service
#[derive(Clone)]
pub struct HeatmapService {
    pub datasources: Datasources,
    pub grid: TiledGrid,
    pub surfaces: Vec<SurfaceLayer>,
    pub cache: Tilecache,
    arena: Arc<TileArena>,
}

impl HeatmapService {
    pub fn new(
        datasources: Datasources,
        grid: TiledGrid,
        surfaces: Vec<SurfaceLayer>,
        cache: Tilecache,
    ) -> HeatmapService {
        HeatmapService {
            datasources,
            grid,
            surfaces,
            cache,
            arena: Arc::new(TileArena::new(ARENA_CAPACITY_BYTES)),
        }
    }

    pub fn get_surface(&self, name: &str) -> Option<&SurfaceLayer> {
        self.surfaces.iter().find(|s| s.name == name)
    }

    fn surface_or_err(&self, name: &str) -> Result<&SurfaceLayer> {
        self.get_surface(name).ok_or(HeatmapError::UnsupportedRequest(format!(
            "Surface '{}' not found",
            name
        )))
    }

    /// Selected surfaces, all for `None`
    fn selected_surfaces<'a>(
        &'a self,
        surface_name: Option<&'a str>,
    ) -> impl Iterator<Item = &'a SurfaceLayer> {
        self.surfaces
            .iter()
            .filter(move |s| surface_name.map_or(true, |name| name == s.name))
    }

    /// Build a surface from its configuration
    pub fn surface_from_config(
        datasources: &Datasources,
        grid: &TiledGrid,
        surface_cfg: &SurfaceCfg,
    ) -> Result<SurfaceLayer> {
        let ds = datasources
            .datasource(&surface_cfg.datasource)
            .ok_or(HeatmapError::Config(format!(
                "Datasource of surface '{}' not found",
                surface_cfg.name
            )))?;
        let field = GeometryField::from(surface_cfg);
        let source = FeaturePointSource::new(ds.dataset(), field)?;
        let kernel = KernelParameters::new(surface_cfg.distance_x, surface_cfg.distance_y)?
            .with_amplitude(surface_cfg.amplitude)?;
        let surface = HeatmapSurface::new(Arc::new(source), kernel, Arc::new(Proj4Registry))
            .with_property("name", &surface_cfg.name);
        let request = ReadRequest::new(grid.grid.clone()).with_tile_size(grid.tile_size);
        let coverage = surface.read(&request)?;
        Ok(SurfaceLayer {
            name: surface_cfg.name.clone(),
            datasource: ds.name().to_string(),
            surface,
            coverage,
        })
    }

    /// Compute tile of surface at col/row
    pub fn tile(
        &self,
        surface_name: &str,
        col: u32,
        row: u32,
        stats: Option<&mut Statistics>,
    ) -> Result<Arc<Tile>> {
        let layer = self.surface_or_err(surface_name)?;
        let address = TileAddress::new(col, row);
        let now = Instant::now();
        let mut computed = false;
        let tile = self.arena.get_or_compute(surface_name, &address, || {
            computed = true;
            layer.coverage.tile(&address)
        })?;
        if let Some(stats) = stats {
            if computed {
                let elapsed = now.elapsed();
                stats.add(
                    surface_name,
                    Measure::TileMs,
                    elapsed.as_secs_f64() * 1000.0,
                );
            }
            stats.add(surface_name, Measure::PointCount, tile.point_count as f64);
        }
        debug!(
            "{}/{}/{}: {} points, {} pixels with data",
            surface_name,
            col,
            row,
            tile.point_count,
            tile.count_defined()
        );
        Ok(tile)
    }

    /// Fetch tile from cache or compute it. Returns `None` for tiles without data.
    pub fn tile_cached(
        &self,
        surface_name: &str,
        col: u32,
        row: u32,
        gzip: bool,
        stats: Option<&mut Statistics>,
    ) -> Result<Option<Vec<u8>>> {
        let path = tile_path(surface_name, &TileAddress::new(col, row));
        let mut cached: Option<Vec<u8>> = None;
        self.cache.read(&path, |f| {
            let mut data = Vec::new();
            let _ = f.read_to_end(&mut data);
            cached = Some(data);
        });
        if let Some(tilegz) = cached {
            return Ok(Some(Tile::tile_content(tilegz, gzip)?));
        }

        let tile = self.tile(surface_name, col, row, stats)?;
        if tile.is_empty() {
            // Empty tiles are not stored
            debug!("{} - Skipping empty tile", path);
            return Ok(None);
        }
        let tilegz = tile.tile_bytevec_gz()?;
        if let Err(ioerr) = self.cache.write(&path, &tilegz) {
            error!("Error writing {}: {}", path, ioerr);
        }
        Ok(Some(Tile::tile_content(tilegz, gzip)?))
    }

    fn progress_bar(&self, msg: &str, limits: (u32, u32)) -> ProgressBar<Stdout> {
        let tiles = limits.0 as u64 * limits.1 as u64;
        let mut pb = ProgressBar::new(tiles);
        pb.message(msg);
        pb.show_speed = false;
        pb.show_percent = false;
        pb.show_time_left = false;
        pb
    }

    /// Seed tile cache
    pub fn generate(
        &self,
        surface_name: Option<&str>,
        nodes: Option<u8>,
        nodeno: Option<u8>,
        progress: bool,
        overwrite: bool,
    ) -> Result<()> {
        if let Some(name) = surface_name {
            self.surface_or_err(name)?;
        }
        let nodes = cmp::max(nodes.unwrap_or(1), 1) as u64;
        let nodeno = nodeno.unwrap_or(0) as u64;
        if nodeno >= nodes {
            return Err(HeatmapError::UnsupportedRequest(format!(
                "nodeno {} must be less than nodes {}",
                nodeno, nodes
            )));
        }
        let rt = tokio::runtime::Runtime::new()?;
        if overwrite {
            for layer in self.selected_surfaces(surface_name) {
                self.cache.remove(&layer.name)?;
            }
        }
        self.init_cache();

        for layer in self.selected_surfaces(surface_name) {
            if progress {
                println!("Generating surface '{}'...", layer.name);
            }
            rt.block_on(self.generate_surface(layer, nodes, nodeno, progress, overwrite));
        }
        if progress {
            println!("");
        }
        Ok(())
    }

    /// Seed tile cache for surface
    async fn generate_surface(
        &self,
        layer: &SurfaceLayer,
        nodes: u64,
        nodeno: u64,
        progress: bool,
        overwrite: bool,
    ) {
        // Keep a queue of tasks waiting for parallel execution (size >= #cores)
        let task_queue_size = cmp::min(num_cpus::get() * 2, 64);
        let mut tasks = Vec::with_capacity(task_queue_size);
        let limits = layer.coverage.tile_limits();
        debug!("Surface {}: {:?} tiles", layer.name, limits);
        let mut pb = self.progress_bar(&format!("{}: ", layer.name), limits);
        if progress {
            pb.tick();
        }
        let mut tileno: u64 = 0;
        for (col, row) in GridIterator::new(limits) {
            let skip = tileno % nodes != nodeno;
            tileno += 1;
            if skip {
                continue;
            }
            let address = TileAddress::new(col, row);
            let path = tile_path(&layer.name, &address);

            if overwrite || !self.cache.exists(&path) {
                let coverage = layer.coverage.clone();
                let cache = self.cache.clone();
                tasks.push(task::spawn(async move {
                    // Point streams block on I/O
                    let tile = task::spawn_blocking(move || coverage.tile(&address)).await;
                    match tile {
                        Ok(Ok(tile)) => {
                            if tile.is_empty() {
                                return;
                            }
                            match tile.tile_bytevec_gz() {
                                Ok(tilegz) => {
                                    if let Err(ioerr) = cache.write(&path, &tilegz) {
                                        error!("Error writing {}: {}", path, ioerr);
                                    }
                                }
                                Err(e) => error!("Error encoding {}: {}", path, e),
                            }
                        }
                        Ok(Err(e)) => error!("Error computing {}: {}", path, e),
                        Err(e) => error!("Tile task {} failed: {}", path, e),
                    }
                }));
                if tasks.len() >= task_queue_size {
                    tasks = await_one_task(tasks).await;
                }
            }

            if progress {
                pb.inc();
            }
        }
        // Finish remaining tasks
        futures_util::future::join_all(tasks).await;
    }

    /// Surface description with grid information
    pub fn get_metadata(&self, surface_name: &str) -> Result<serde_json::Value> {
        let layer = self.surface_or_err(surface_name)?;
        let grid = layer.coverage.grid_geometry();
        let env = grid.envelope();
        let (cols, rows) = layer.coverage.tile_limits();
        let metadata = serde_json::to_value(layer.surface.metadata())
            .map_err(|e| HeatmapError::Config(e.to_string()))?;
        Ok(json!({
            "name": layer.name,
            "datasource": layer.datasource,
            "srid": env.srid(),
            "extent": [env.minx(), env.miny(), env.maxx(), env.maxy()],
            "width": grid.width(),
            "height": grid.height(),
            "tile_size": self.grid.tile_size,
            "tile_cols": cols,
            "tile_rows": rows,
            "encoding": "float32le+gzip",
            "tiles": [format!("{}/{}/{{col}}/{{row}}.f32.gz", self.cache.baseurl(), layer.name)],
            "surface": metadata,
        }))
    }

    /// Write surface metadata into cache
    pub fn init_cache(&self) {
        info!("{}", &self.cache.info());
        for layer in &self.surfaces {
            match self.get_metadata(&layer.name) {
                Ok(json) => {
                    let path = metadata_path(&layer.name);
                    let data = json.to_string();
                    if let Err(ioerr) = self.cache.write(&path, data.as_bytes()) {
                        error!("Error writing {}: {}", path, ioerr);
                    }
                }
                Err(e) => error!("Metadata of surface '{}': {}", layer.name, e),
            }
        }
    }

    fn progress_bar_drilldown(&self, count: u64) -> ProgressBar<Stderr> {
        let mut pb = ProgressBar::on(stderr(), count);
        pb.message("Tile ");
        pb.show_speed = false;
        pb.show_percent = false;
        pb.show_time_left = false;
        pb
    }

    /// Statistics of tiles and samples at points given in grid CRS
    pub fn drilldown(
        &self,
        surface_name: Option<&str>,
        points: Vec<f64>,
        progress: bool,
    ) -> Result<Statistics> {
        let mut stats = Statistics::new();
        let surfaces: Vec<_> = self.selected_surfaces(surface_name).collect();
        let mut pb = self.progress_bar_drilldown(surfaces.len() as u64 * points.len() as u64 / 2);
        for layer in surfaces {
            // Grid with the pixel extent applied by `read`
            let grid = layer.coverage.grid_geometry();
            let crs_to_grid = grid
                .crs_to_grid()
                .ok_or(HeatmapError::Transform("Grid is not invertible".to_string()))?;
            let tile_size = layer.coverage.engine().tile_size();
            for point in points.chunks(2) {
                if point.len() < 2 {
                    warn!("Ignoring incomplete point {:?}", point);
                    continue;
                }
                let (col, row) = crs_to_grid.apply(point[0], point[1]);
                if col < 0.0
                    || row < 0.0
                    || col >= grid.width() as f64
                    || row >= grid.height() as f64
                {
                    warn!("Point ({}, {}) outside of grid", point[0], point[1]);
                    continue;
                }
                let (col, row) = (col as u32, row as u32);
                let tile = self.tile(
                    &layer.name,
                    col / tile_size,
                    row / tile_size,
                    Some(&mut stats),
                )?;
                stats.add(
                    &layer.name,
                    Measure::PixelsWithData,
                    tile.count_defined() as f64,
                );
                if let Some(value) = tile.get(col - tile.rect.x, row - tile.rect.y) {
                    stats.add(&layer.name, Measure::Value, value as f64);
                }
                if progress {
                    pb.inc();
                }
            }
        }
        if progress {
            eprintln!("");
        }
        Ok(stats)
    }

    fn gen_surface_runtime_config(&self, layer: &SurfaceLayer) -> String {
        let kernel = layer.surface.kernel();
        let mut lines = vec!["\n[[surface]]".to_string()];
        lines.push(format!(r#"name = "{}""#, layer.name));
        lines.push(format!(r#"datasource = "{}""#, layer.datasource));
        let field = layer.surface.source().metadata();
        if let Some(geometry_type) = field.properties.get("geometry_type") {
            lines.push(format!(r#"geometry_type = "{}""#, geometry_type));
        }
        lines.push(format!("srid = {}", field.srid));
        lines.push(format!("distance_x = {:?}", kernel.distance_x()));
        lines.push(format!("distance_y = {:?}", kernel.distance_y()));
        lines.push(format!("amplitude = {:?}", kernel.amplitude()));
        lines.join("\n") + "\n"
    }
}

async fn await_one_task<T>(tasks: Vec<task::JoinHandle<T>>) -> Vec<task::JoinHandle<T>> {
    // Errors are logged within the tasks
    let (_result, _index, remaining) = futures_util::future::select_all(tasks).await;
    remaining
}

impl<'a> Config<'a, ApplicationCfg> for HeatmapService {
    fn from_config(config: &ApplicationCfg) -> std::result::Result<Self, String> {
        let datasources = Datasources::from_config(config)?;
        let grid = TiledGrid::from_config(&config.grid)?;
        let mut surfaces = Vec::new();
        for surface_cfg in &config.surfaces {
            if surfaces
                .iter()
                .any(|s: &SurfaceLayer| s.name == surface_cfg.name)
            {
                return Err(format!("Duplicate surface name '{}'", surface_cfg.name));
            }
            let layer = Self::surface_from_config(&datasources, &grid, surface_cfg)
                .map_err(|e| format!("Surface '{}': {}", surface_cfg.name, e))?;
            surfaces.push(layer);
        }
        let cache = Tilecache::from_config(config)?;
        Ok(HeatmapService::new(datasources, grid, surfaces, cache))
    }
    fn gen_config() -> String {
        let mut config = String::new();
        config.push_str(TOML_HEADER);
        config.push_str(&Datasource::gen_config());
        config.push_str(&TiledGrid::gen_config());
        config.push_str(TOML_SURFACE);
        config.push_str(&Tilecache::gen_config());
        config
    }
    fn gen_runtime_config(&self) -> String {
        let mut config = String::new();
        config.push_str(TOML_HEADER);
        config.push_str(&self.datasources.gen_runtime_config());
        config.push_str(&self.grid.gen_runtime_config());
        for layer in &self.surfaces {
            config.push_str(&self.gen_surface_runtime_config(layer));
        }
        config.push_str(&self.cache.gen_runtime_config());
        config
    }
}

const TOML_HEADER: &'static str = "# t-rex heatmap configuration\n";

const TOML_SURFACE: &'static str = r#"
[[surface]]
name = "points"
#datasource = "points"
# POINT, MULTIPOINT or GEOMETRY (detected from first feature)
geometry_type = "POINT"
# Influence radius in datasource CRS units
distance_x = 10000.0
distance_y = 10000.0
#amplitude = 1.0
"#;
