//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Line delimited GeoJSON features

use crate::core::config::DatasourceCfg;
use crate::core::error::{HeatmapError, Result};
use crate::core::geom::{self, GeometryType};
use crate::core::Config;
use crate::datasource::dataset::{bbox_intersects, Feature, FeatureDataset, FeatureStream};
use postgis::ewkb;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tile_grid::Extent;

/// File with one GeoJSON `Feature` per line.
///
/// Each call of `features` opens the file again, so streams are restartable by calling again.
/// Parallel streaming is not supported.
#[derive(Clone, Debug)]
pub struct GeoJsonSeqDataset {
    pub name: String,
    pub path: String,
    pub srid: Option<i32>,
    pub extent: Option<Extent>,
}

#[derive(Deserialize, Debug)]
struct GeoJsonFeature {
    id: Option<serde_json::Value>,
    geometry: Option<GeoJsonGeometry>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
enum GeoJsonGeometry {
    Point {
        coordinates: Vec<f64>,
    },
    MultiPoint {
        coordinates: Vec<Vec<f64>>,
    },
    LineString {
        coordinates: Vec<Vec<f64>>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    GeometryCollection {
        geometries: Vec<serde_json::Value>,
    },
}

fn point(coords: &[f64], srid: Option<i32>) -> Result<geom::Point> {
    if coords.len() < 2 {
        return Err(HeatmapError::DataAccess(format!(
            "position with {} ordinates",
            coords.len()
        )));
    }
    Ok(geom::Point::new(coords[0], coords[1], srid))
}

fn line(coords: &[Vec<f64>], srid: Option<i32>) -> Result<geom::LineString> {
    let points = coords
        .iter()
        .map(|c| point(c, srid))
        .collect::<Result<Vec<_>>>()?;
    Ok(ewkb::LineStringT { points, srid })
}

fn polygon(rings: &[Vec<Vec<f64>>], srid: Option<i32>) -> Result<geom::Polygon> {
    let rings = rings
        .iter()
        .map(|r| line(r, srid))
        .collect::<Result<Vec<_>>>()?;
    Ok(ewkb::PolygonT { rings, srid })
}

impl GeoJsonGeometry {
    fn to_geom(&self, srid: Option<i32>) -> Result<GeometryType> {
        let geom = match self {
            GeoJsonGeometry::Point { coordinates } => GeometryType::Point(point(coordinates, srid)?),
            GeoJsonGeometry::MultiPoint { coordinates } => {
                let points = coordinates
                    .iter()
                    .map(|c| point(c, srid))
                    .collect::<Result<Vec<_>>>()?;
                GeometryType::MultiPoint(ewkb::MultiPointT { points, srid })
            }
            GeoJsonGeometry::LineString { coordinates } => {
                GeometryType::LineString(line(coordinates, srid)?)
            }
            GeoJsonGeometry::MultiLineString { coordinates } => {
                let lines = coordinates
                    .iter()
                    .map(|l| line(l, srid))
                    .collect::<Result<Vec<_>>>()?;
                GeometryType::MultiLineString(ewkb::MultiLineStringT { lines, srid })
            }
            GeoJsonGeometry::Polygon { coordinates } => {
                GeometryType::Polygon(polygon(coordinates, srid)?)
            }
            GeoJsonGeometry::MultiPolygon { coordinates } => {
                let polygons = coordinates
                    .iter()
                    .map(|p| polygon(p, srid))
                    .collect::<Result<Vec<_>>>()?;
                GeometryType::MultiPolygon(ewkb::MultiPolygonT { polygons, srid })
            }
            GeoJsonGeometry::GeometryCollection { .. } => {
                return Err(HeatmapError::InvalidGeometry(
                    "GeometryCollection can't be streamed as points".to_string(),
                ))
            }
        };
        Ok(geom)
    }
}

fn parse_feature(line: &str, srid: Option<i32>) -> Result<Option<Feature>> {
    let feature: GeoJsonFeature =
        serde_json::from_str(line).map_err(|e| HeatmapError::DataAccess(e.to_string()))?;
    let geometry = match feature.geometry {
        Some(ref g) => g.to_geom(srid)?,
        // Features without geometry are skipped
        None => return Ok(None),
    };
    let fid = feature.id.as_ref().and_then(|id| id.as_u64());
    Ok(Some(Feature { fid, geometry }))
}

/// Lazy feature reader. Dropping it closes the file.
struct FeatureReader {
    lines: Lines<BufReader<File>>,
    lineno: usize,
    srid: Option<i32>,
    bbox: Option<Extent>,
    path: String,
    failed: bool,
}

impl Iterator for FeatureReader {
    type Item = Result<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(HeatmapError::DataAccess(format!(
                        "{}: {}",
                        self.path, e
                    ))));
                }
            };
            self.lineno += 1;
            // RFC 8142 record separators are accepted
            let record = line.trim_matches(|c: char| c == '\u{1e}' || c.is_whitespace());
            if record.is_empty() {
                continue;
            }
            match parse_feature(record, self.srid) {
                Ok(Some(feature)) => {
                    if bbox_intersects(self.bbox.as_ref(), &feature.geometry) {
                        return Some(Ok(feature));
                    }
                }
                Ok(None) => {}
                Err(HeatmapError::DataAccess(msg)) => {
                    self.failed = true;
                    return Some(Err(HeatmapError::DataAccess(format!(
                        "{} line {}: {}",
                        self.path, self.lineno, msg
                    ))));
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl GeoJsonSeqDataset {
    pub fn new(name: &str, path: &str, srid: Option<i32>) -> GeoJsonSeqDataset {
        GeoJsonSeqDataset {
            name: name.to_string(),
            path: path.to_string(),
            srid,
            extent: None,
        }
    }
    /// Extent of all features, by reading the whole file
    pub fn scan_extent(&self) -> Result<Option<Extent>> {
        let mut extent: Option<Extent> = None;
        for feature in self.features(None, false)? {
            if let Some(b) = feature?.geometry.bbox() {
                extent = Some(match extent {
                    None => b,
                    Some(e) => Extent {
                        minx: e.minx.min(b.minx),
                        miny: e.miny.min(b.miny),
                        maxx: e.maxx.max(b.maxx),
                        maxy: e.maxy.max(b.maxy),
                    },
                });
            }
        }
        Ok(extent)
    }
}

impl FeatureDataset for GeoJsonSeqDataset {
    fn name(&self) -> &str {
        &self.name
    }
    fn srid(&self) -> Option<i32> {
        self.srid
    }
    fn extent(&self) -> Option<Extent> {
        self.extent.clone()
    }
    fn features(&self, bbox: Option<&Extent>, parallel: bool) -> Result<FeatureStream<'_>> {
        if parallel {
            return Err(HeatmapError::UnsupportedConcurrency(self.name.clone()));
        }
        let file = File::open(Path::new(&self.path))
            .map_err(|e| HeatmapError::DataAccess(format!("{}: {}", self.path, e)))?;
        debug!("GeoJsonSeqDataset.features {} bbox {:?}", self.path, bbox);
        Ok(Box::new(FeatureReader {
            lines: BufReader::new(file).lines(),
            lineno: 0,
            srid: self.srid,
            bbox: bbox.cloned(),
            path: self.path.clone(),
            failed: false,
        }))
    }
    fn info(&self) -> BTreeMap<String, String> {
        let mut info = BTreeMap::new();
        info.insert("storage".to_string(), "geojsonseq".to_string());
        info.insert("path".to_string(), self.path.clone());
        info
    }
}

impl<'a> Config<'a, DatasourceCfg> for GeoJsonSeqDataset {
    fn from_config(ds_cfg: &DatasourceCfg) -> Result<Self, String> {
        let path = ds_cfg
            .path
            .as_ref()
            .ok_or("Missing 'path' in GeoJSON datasource".to_string())?;
        let name = ds_cfg.name.clone().unwrap_or(
            Path::new(path)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or(path.clone()),
        );
        let mut ds = GeoJsonSeqDataset::new(&name, path, ds_cfg.srid);
        ds.extent = ds_cfg.extent.as_ref().map(Extent::from);
        Ok(ds)
    }
    fn gen_config() -> String {
        let toml = r#"
[[datasource]]
name = "points"
# GeoJSON text sequence, one feature per line
path = "points.geojsons"
srid = 3857
#extent = { minx = 0.0, miny = 0.0, maxx = 1000.0, maxy = 1000.0 }
"#;
        toml.to_string()
    }
    fn gen_runtime_config(&self) -> String {
        let mut lines = vec!["\n[[datasource]]".to_string()];
        lines.push(format!(r#"name = "{}""#, self.name));
        lines.push(format!(r#"path = "{}""#, self.path));
        match self.srid {
            Some(srid) => lines.push(format!("srid = {}", srid)),
            None => lines.push("#srid = 3857".to_string()),
        }
        match self.scan_extent() {
            Ok(Some(ext)) => lines.push(format!(
                "extent = {{ minx = {:.5}, miny = {:.5}, maxx = {:.5}, maxy = {:.5} }}",
                ext.minx, ext.miny, ext.maxx, ext.maxy
            )),
            Ok(None) => lines.push("#extent = { minx = 0.0, miny = 0.0, maxx = 1000.0, maxy = 1000.0 }".to_string()),
            Err(e) => {
                warn!("Datasource '{}': {}", self.name, e);
                lines.push("#extent = { minx = 0.0, miny = 0.0, maxx = 1000.0, maxy = 1000.0 }".to_string())
            }
        }
        lines.join("\n") + "\n"
    }
}
