//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::GridCfg;
use crate::core::Config;
use tile_grid::{Envelope, Extent, GridGeometry};

/// Output grid with its tile size
#[derive(Clone, Debug)]
pub struct TiledGrid {
    pub grid: GridGeometry,
    pub tile_size: u32,
}

impl<'a> Config<'a, GridCfg> for TiledGrid {
    fn from_config(grid_cfg: &GridCfg) -> Result<Self, String> {
        if grid_cfg.tile_size == 0 {
            return Err("Grid tile_size must be > 0".to_string());
        }
        let extent = Extent::from(&grid_cfg.extent);
        if extent.minx >= extent.maxx || extent.miny >= extent.maxy {
            return Err(format!("Invalid grid extent {:?}", extent));
        }
        let envelope = Envelope::from_extent(&extent, grid_cfg.srid);
        let grid = match (grid_cfg.width, grid_cfg.height) {
            (Some(width), Some(height)) => GridGeometry::new(width, height, envelope),
            (None, None) => GridGeometry::from_envelope(envelope),
            _ => return Err("Grid needs both width and height".to_string()),
        };
        Ok(TiledGrid {
            grid,
            tile_size: grid_cfg.tile_size,
        })
    }
    fn gen_config() -> String {
        let toml = r#"
[grid]
width = 1024
height = 1024
extent = { minx = -20037508.3427892, miny = -20037508.3427892, maxx = 20037508.3427892, maxy = 20037508.3427892 }
srid = 3857
#tile_size = 256
"#;
        toml.to_string()
    }
    fn gen_runtime_config(&self) -> String {
        let env = self.grid.envelope();
        let mut lines = vec!["\n[grid]".to_string()];
        if self.grid.has_pixel_extent() {
            lines.push(format!("width = {}", self.grid.width()));
            lines.push(format!("height = {}", self.grid.height()));
        } else {
            lines.push("#width = 256".to_string());
            lines.push("#height = 256".to_string());
        }
        lines.push(format!(
            "extent = {{ minx = {:.5}, miny = {:.5}, maxx = {:.5}, maxy = {:.5} }}",
            env.minx(),
            env.miny(),
            env.maxx(),
            env.maxy()
        ));
        lines.push(format!("srid = {}", env.srid()));
        lines.push(format!("tile_size = {}", self.tile_size));
        lines.join("\n") + "\n"
    }
}
