//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::heatmap_service::HeatmapService;
use heatmap_core::cache::{Cache, Nocache, Tilecache};
use heatmap_core::core::stats::Measure;
use heatmap_core::core::{parse_config, read_config, ApplicationCfg, Config};
use heatmap_core::engine::{Tile, TileAddress};
use std::fs;
use std::path::Path;
use tile_grid::PixelRect;

fn example_service() -> HeatmapService {
    let config: ApplicationCfg = read_config("src/test/example.toml").unwrap();
    let mut service = HeatmapService::from_config(&config).unwrap();
    service.cache = Tilecache::Nocache(Nocache);
    service
}

/// Single point at Geneva on the example grid
fn geneva_service(cache_base: Option<&str>) -> HeatmapService {
    let cache = match cache_base {
        Some(base) => format!("[cache.file]\nbase = \"{}\"\n", base),
        None => String::new(),
    };
    let toml = format!(
        r#"
        [[datasource]]
        name = "geneva"
        points = [[6.1421, 46.2104]]
        srid = 4326

        [grid]
        width = 512
        height = 512
        extent = {{ minx = 626172.13571, miny = 5635549.22141, maxx = 1252344.27143, maxy = 6261721.35712 }}
        srid = 3857

        [[surface]]
        name = "geneva"
        distance_x = 0.5
        distance_y = 0.5

        {}
        "#,
        cache
    );
    let config: ApplicationCfg = parse_config(toml, "").unwrap();
    HeatmapService::from_config(&config).unwrap()
}

#[test]
fn test_from_config() {
    let service = example_service();
    assert_eq!(service.surfaces.len(), 2);
    assert_eq!(service.surfaces[0].name, "crimes");
    assert_eq!(service.surfaces[0].datasource, "crimes");
    assert_eq!(service.surfaces[1].datasource, "stations");
    assert_eq!(service.surfaces[1].surface.kernel().amplitude(), 2.0);
    assert_eq!(service.surfaces[1].coverage.tile_limits(), (2, 2));
    assert!(service.get_surface("unknown").is_none());
}

#[test]
fn test_config_errors() {
    let toml = r#"
        [[datasource]]
        points = [[6.1421, 46.2104]]

        [grid]
        extent = { minx = 0.0, miny = 0.0, maxx = 10.0, maxy = 10.0 }
        srid = 3857

        [[surface]]
        name = "points"
        distance_x = 1.0
        distance_y = 1.0
        "#;
    let config: ApplicationCfg = parse_config(toml.to_string(), "").unwrap();
    assert_eq!(
        HeatmapService::from_config(&config).err(),
        Some("Surface 'points': No coordinate reference system for 'points'".to_string())
    );

    let toml = r#"
        [[datasource]]
        points = [[6.1421, 46.2104]]
        srid = 4326

        [grid]
        extent = { minx = 0.0, miny = 0.0, maxx = 10.0, maxy = 10.0 }
        srid = 4326

        [[surface]]
        name = "points"
        distance_x = 0.0
        distance_y = 1.0
        "#;
    let config: ApplicationCfg = parse_config(toml.to_string(), "").unwrap();
    let err = HeatmapService::from_config(&config).err().unwrap();
    assert!(err.starts_with("Surface 'points': Invalid kernel configuration"));
}

#[test]
fn test_tile() {
    let service = example_service();
    let tile = service.tile("stations", 1, 0, None).unwrap();
    assert_eq!(
        tile.rect,
        PixelRect {
            x: 256,
            y: 0,
            width: 256,
            height: 256
        }
    );
    // Zurich at pixel (265, 210)
    let value = tile.get(265 - 256, 210).unwrap();
    assert!(value > 1.9 && value <= 2.0, "value: {}", value);
    assert_eq!(tile.point_count, 1);

    // Served from memory
    let again = service.tile("stations", 1, 0, None).unwrap();
    assert_eq!(again.data, tile.data);

    assert!(service.tile("unknown", 0, 0, None).is_err());
    assert!(service.tile("stations", 2, 0, None).is_err());
}

#[test]
fn test_tile_cached() {
    let service = geneva_service(None);
    let raw = service
        .tile_cached("geneva", 0, 1, false, None)
        .unwrap()
        .unwrap();
    assert_eq!(raw.len(), 256 * 256 * 4);
    let gz = service
        .tile_cached("geneva", 0, 1, true, None)
        .unwrap()
        .unwrap();
    assert!(gz.len() < raw.len());

    // No data north of Geneva
    assert_eq!(service.tile_cached("geneva", 0, 0, false, None).unwrap(), None);
}

#[test]
fn test_generate() {
    let basedir = std::env::temp_dir().join("heatmap_service_test_generate");
    let _ = fs::remove_dir_all(&basedir);
    let base = basedir.to_string_lossy().into_owned();
    let service = geneva_service(Some(&base));

    // Second node of two only gets the tiles without data
    service
        .generate(Some("geneva"), Some(2), Some(1), false, false)
        .unwrap();
    assert!(Path::new(&format!("{}/geneva/metadata.json", base)).exists());
    assert!(!Path::new(&format!("{}/geneva/0/1.f32.gz", base)).exists());

    service.generate(None, None, None, false, false).unwrap();
    assert!(service.cache.exists("geneva/0/1.f32.gz"));
    assert!(!service.cache.exists("geneva/0/0.f32.gz"));
    assert!(!service.cache.exists("geneva/1/1.f32.gz"));

    let mut tilegz = Vec::new();
    assert!(service.cache.read("geneva/0/1.f32.gz", |f| {
        let _ = f.read_to_end(&mut tilegz);
    }));
    let bytes = Tile::tile_content(tilegz, false).unwrap();
    let rect = service.surfaces[0]
        .coverage
        .engine()
        .tile_rect(&TileAddress::new(0, 1))
        .unwrap();
    let tile = Tile::from_bytes(TileAddress::new(0, 1), rect, &bytes).unwrap();
    // Geneva at pixel (47, 365)
    assert!(tile.get(47, 365 - 256).unwrap() > 0.9);

    let metadata = fs::read_to_string(format!("{}/geneva/metadata.json", base)).unwrap();
    assert!(metadata.contains(r#""tile_cols":2"#));

    assert!(service
        .generate(Some("unknown"), None, None, false, false)
        .is_err());
    assert!(service
        .generate(None, Some(2), Some(2), false, false)
        .is_err());

    // Overwrite clears previous tiles of the surface
    service.generate(None, None, None, false, true).unwrap();
    assert!(service.cache.exists("geneva/0/1.f32.gz"));
    let _ = fs::remove_dir_all(&basedir);
}

#[test]
fn test_metadata() {
    let service = example_service();
    let metadata = service.get_metadata("stations").unwrap();
    assert_eq!(metadata["srid"], 3857);
    assert_eq!(metadata["width"], 512);
    assert_eq!(metadata["tile_rows"], 2);
    assert_eq!(metadata["encoding"], "float32le+gzip");
    assert_eq!(metadata["surface"]["amplitude"], 2.0);
    assert_eq!(metadata["surface"]["sample"]["nodata"], "NaN");
    assert_eq!(metadata["surface"]["source"]["srid"], 4326);
    assert_eq!(metadata["surface"]["properties"]["name"], "stations");
    assert_eq!(
        metadata["tiles"][0],
        "http://localhost:6767/stations/{col}/{row}.f32.gz"
    );
    assert!(service.get_metadata("unknown").is_err());
}

#[test]
fn test_drilldown() {
    let service = example_service();
    // Zurich and a point far outside of the grid
    let points = vec![950690.7, 6004025.9, -1000000.0, 0.0];
    let stats = service.drilldown(Some("stations"), points, false).unwrap();
    let values = stats.results("stations", Measure::Value);
    assert_eq!(values.len, 1);
    assert_eq!(values.nodata, 0);
    assert!(values.max > 1.9);
    assert_eq!(stats.results("stations", Measure::PointCount).len, 1);
    assert!(stats.results("crimes", Measure::Value).len == 0);
    println!("{}", stats.as_csv());
    let csv = stats.as_csv();
    assert!(csv.starts_with("surface,measure,count,nodata,min,max,mean,stddev\n"));
    assert!(csv.contains("\nstations,value,1,0,"));
}

#[test]
fn test_gen_runtime_config() {
    let service = example_service();
    let toml = service.gen_runtime_config();
    println!("{}", toml);
    assert_eq!(Some("# t-rex heatmap configuration"), toml.lines().next());
    assert!(toml.contains(r#"datasource = "stations""#));
    assert!(toml.contains("amplitude = 2.0"));

    let config: ApplicationCfg = parse_config(toml, "").unwrap();
    let service = HeatmapService::from_config(&config).unwrap();
    assert_eq!(service.surfaces.len(), 2);
}

#[test]
fn test_drilldown_default_grid_size() {
    let toml = r#"
        [[datasource]]
        points = [[10.0, 10.0]]
        srid = 3857

        [grid]
        extent = { minx = 0.0, miny = 0.0, maxx = 100.0, maxy = 100.0 }
        srid = 3857

        [[surface]]
        name = "points"
        distance_x = 5.0
        distance_y = 5.0
        "#;
    let config: ApplicationCfg = parse_config(toml.to_string(), "").unwrap();
    let service = HeatmapService::from_config(&config).unwrap();
    let grid = service.surfaces[0].coverage.grid_geometry();
    assert_eq!((grid.width(), grid.height()), (256, 256));

    let stats = service.drilldown(None, vec![10.0, 10.0], false).unwrap();
    let values = stats.results("points", Measure::Value);
    assert_eq!(values.len, 1);
    assert!(values.max > 0.99, "value: {}", values.max);
}
