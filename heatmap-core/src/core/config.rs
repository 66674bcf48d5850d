//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use regex::Regex;
use serde::Deserialize;
use std;
use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::fs::File;
use std::io::prelude::*;
use tera::{Context, Tera};
use tile_grid::Extent;
use toml::Value;

pub trait Config<'a, C: Deserialize<'a>>
where
    Self: std::marker::Sized,
{
    /// Read configuration
    fn from_config(config: &C) -> Result<Self, String>;
    /// Generate configuration template
    fn gen_config() -> String;
    /// Generate configuration template with runtime information
    fn gen_runtime_config(&self) -> String {
        Self::gen_config()
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationCfg {
    pub datasource: Vec<DatasourceCfg>,
    pub grid: GridCfg,
    #[serde(rename = "surface")]
    pub surfaces: Vec<SurfaceCfg>,
    pub cache: Option<CacheCfg>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatasourceCfg {
    pub name: Option<String>,
    pub default: Option<bool>,
    /// GeoJSON text sequence file (one feature per line)
    pub path: Option<String>,
    /// Inline point coordinates
    pub points: Option<Vec<(f64, f64)>>,
    /// Declared spatial reference system of the dataset
    pub srid: Option<i32>,
    pub extent: Option<ExtentCfg>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ExtentCfg {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl From<&ExtentCfg> for Extent {
    fn from(cfg: &ExtentCfg) -> Extent {
        Extent {
            minx: cfg.minx,
            miny: cfg.miny,
            maxx: cfg.maxx,
            maxy: cfg.maxy,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct GridCfg {
    /// Output grid size in pixels. Defaults to 256 x 256.
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Covered area in grid units, ordered as minx, miny, maxx, maxy.
    pub extent: ExtentCfg,
    /// Spatial reference system (EPSG code)
    pub srid: i32,
    /// Width and height of tiles, in pixels
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
}

pub fn default_tile_size() -> u32 {
    256
}

#[derive(Deserialize, Clone, Debug)]
pub struct SurfaceCfg {
    pub name: String,
    pub datasource: Option<String>,
    pub geometry_field: Option<String>,
    /// POINT, MULTIPOINT or GEOMETRY
    pub geometry_type: Option<String>,
    /// Spatial reference system of the geometry field (overrides datasource SRID)
    pub srid: Option<i32>,
    /// Influence radius along the x axis, in source CRS units
    pub distance_x: f64,
    /// Influence radius along the y axis, in source CRS units
    pub distance_y: f64,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
}

pub fn default_amplitude() -> f32 {
    1.0
}

#[derive(Deserialize, Clone, Debug)]
pub struct CacheCfg {
    pub file: Option<CacheFileCfg>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CacheFileCfg {
    pub base: String,
    pub baseurl: Option<String>,
}

pub const DEFAULT_CONFIG: &'static str = r#"
[[datasource]]
path = ""

[grid]
width = 1024
height = 1024
extent = { minx = -20037508.3427892, miny = -20037508.3427892, maxx = 20037508.3427892, maxy = 20037508.3427892 }
srid = 3857

[[surface]]
name = ""
distance_x = 10000.0
distance_y = 10000.0
"#;

/// Load and parse the config file into an config struct.
pub fn read_config<'a, T: Deserialize<'a>>(path: &str) -> Result<T, String> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(_) => {
            return Err("Could not find config file!".to_string());
        }
    };
    let mut config_toml = String::new();
    if let Err(err) = file.read_to_string(&mut config_toml) {
        return Err(format!("Error while reading config: [{}]", err));
    };

    parse_config(config_toml, path)
}

/// Parse the configuration into an config struct.
pub fn parse_config<'a, T: Deserialize<'a>>(config_toml: String, path: &str) -> Result<T, String> {
    // Check for old ${var} expressions
    let re = Regex::new(r"\$\{([[:alnum:]]+)\}").map_err(|e| e.to_string())?;
    if re.is_match(&config_toml) {
        return Err(
            "Replace old environment variable syntax ${VARNAME} with `{{env.VARNAME}}`".to_string(),
        );
    }

    // Parse template
    let mut tera = Tera::default();
    tera.add_raw_template(path, &config_toml)
        .map_err(|e| format!("Template error: {}", e))?;
    let mut context = Context::new();
    let mut env = HashMap::new();
    for (key, value) in env::vars() {
        env.insert(key, value);
    }
    context.insert("env", &env);
    let toml = tera.render(path, &context).map_err(|e| match e.source() {
        Some(source) => format!("Template error: {}", source),
        None => format!("Template error: {}", e),
    })?;

    toml.parse::<Value>()
        .and_then(|cfg| cfg.try_into::<T>())
        .map_err(|err| format!("{} - {}", path, err))
}
