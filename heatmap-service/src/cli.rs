//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::datasources::Datasources;
use crate::heatmap_service::HeatmapService;
use clap::ArgMatches;
use heatmap_core::cache::{Filecache, Nocache, Tilecache};
use heatmap_core::core::config::{default_amplitude, default_tile_size, SurfaceCfg};
use heatmap_core::core::gridcfg::TiledGrid;
use heatmap_core::core::{read_config, ApplicationCfg, Config};
use heatmap_core::datasource::{FeaturePointSource, GeometryField, PointSource};
use tile_grid::{GridGeometry, DEFAULT_GRID_SIZE};

/// Configuration file given with `--config`
pub fn config_from_args(args: &ArgMatches) -> Result<Option<ApplicationCfg>, String> {
    match args.value_of("config") {
        Some(cfgpath) => {
            info!("Reading configuration from '{}'", cfgpath);
            for argname in vec!["datasource", "distance", "cache"] {
                if args.value_of(argname).is_some() {
                    warn!("Ignoring argument `{}`", argname);
                }
            }
            read_config(cfgpath).map(Some)
        }
        None => Ok(None),
    }
}

fn parse_arg<T: std::str::FromStr>(args: &ArgMatches, name: &str) -> Result<Option<T>, String> {
    match args.value_of(name) {
        Some(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Error parsing '{}' value {}", name, s)),
        None => Ok(None),
    }
}

/// Service from configuration file or from `--datasource` with a surface per datasource
pub fn service_from_args(args: &ArgMatches) -> Result<HeatmapService, String> {
    if let Some(config) = config_from_args(args)? {
        return HeatmapService::from_config(&config);
    }
    let datasources = Datasources::from_args(args)?;
    let ds = datasources
        .default()
        .ok_or("Either 'config' or 'datasource' is required".to_string())?;
    let distance = parse_arg::<f64>(args, "distance")?.unwrap_or(10000.0);
    let surface_cfg = SurfaceCfg {
        name: ds.name().to_string(),
        datasource: Some(ds.name().to_string()),
        geometry_field: None,
        geometry_type: None,
        srid: None,
        distance_x: distance,
        distance_y: distance,
        amplitude: default_amplitude(),
    };
    // Grid in source CRS covering all points with their kernel support
    let source = FeaturePointSource::new(ds.dataset(), GeometryField::from(&surface_cfg))
        .map_err(String::from)?;
    let envelope = source
        .envelope()
        .ok_or(format!("Datasource '{}' has no extent", ds.name()))?;
    let grid = TiledGrid {
        grid: GridGeometry::from_envelope(envelope.expand(distance, distance))
            .with_default_extent(DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE),
        tile_size: default_tile_size(),
    };
    let surface = HeatmapService::surface_from_config(&datasources, &grid, &surface_cfg)
        .map_err(String::from)?;
    let cache = match args.value_of("cache") {
        None => Tilecache::Nocache(Nocache),
        Some(dir) => Tilecache::Filecache(Filecache {
            basepath: dir.to_string(),
            baseurl: None,
        }),
    };
    Ok(HeatmapService::new(datasources, grid, vec![surface], cache))
}

/// Configuration template, with runtime information when a datasource is given
pub fn gen_config(args: &ArgMatches) -> Result<String, String> {
    if args.value_of("datasource").is_some() {
        let service = service_from_args(args)?;
        Ok(service.gen_runtime_config())
    } else {
        Ok(HeatmapService::gen_config())
    }
}

#[cfg(test)]
fn test_args(argv: Vec<&str>) -> ArgMatches<'static> {
    use clap::App;

    App::new("test")
        .args_from_usage(
            "-c, --config=[FILE] 'Load from custom config file'
             --datasource=[FILE] 'GeoJSON text sequence file'
             --srid=[EPSG] 'CRS of datasource'
             --distance=[DIST] 'Influence radius'
             --cache=[DIR] 'Use tile cache in DIR'",
        )
        .get_matches_from(argv)
}

#[test]
fn test_gen_config() {
    use heatmap_core::core::parse_config;

    let toml = gen_config(&test_args(vec![""])).unwrap();
    println!("{}", toml);
    assert_eq!(Some("# t-rex heatmap configuration"), toml.lines().next());

    let config = parse_config(toml, "").unwrap();
    let service = HeatmapService::from_config(&config).unwrap();
    assert_eq!(service.surfaces.len(), 1);
    assert_eq!(service.surfaces[0].name, "points");
}

#[test]
fn test_runtime_config() {
    use heatmap_core::core::parse_config;

    let args = test_args(vec![
        "",
        "--datasource",
        "../data/crimes.geojsons",
        "--srid",
        "4326",
        "--distance",
        "0.2",
    ]);
    let service = service_from_args(&args).unwrap();
    assert_eq!(service.surfaces[0].name, "crimes");
    assert_eq!(service.grid.grid.width(), DEFAULT_GRID_SIZE);
    assert_eq!(service.grid.grid.srid(), 4326);

    let toml = gen_config(&args).unwrap();
    println!("{}", toml);
    assert!(toml.contains(r#"path = "../data/crimes.geojsons""#));
    assert!(toml.contains("distance_x = 0.2"));
    assert!(toml.contains(r#"geometry_type = "POINT""#));

    let config = parse_config(toml, "").unwrap();
    let service = HeatmapService::from_config(&config).unwrap();
    assert_eq!(service.surfaces[0].datasource, "crimes");
}

#[test]
fn test_missing_datasource() {
    let args = test_args(vec!["", "--distance", "100"]);
    assert_eq!(
        service_from_args(&args).err(),
        Some("Either 'config' or 'datasource' is required".to_string())
    );
    let args = test_args(vec!["", "--datasource", "x.geojsons", "--distance", "far"]);
    assert!(service_from_args(&args).is_err());
}
