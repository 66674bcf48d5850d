//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Reprojection between spatial reference systems identified by EPSG codes

use crate::core::error::{HeatmapError, Result};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use std::convert::TryFrom;
use std::sync::Arc;
use tile_grid::{lonlat_to_merc, merc_to_lonlat};

/// Coordinate operation between two CRS
pub trait CoordTransform: Send + Sync {
    /// Transform all coordinates in place
    fn transform_coords(&self, coords: &mut [(f64, f64)]) -> Result<()>;
    fn is_identity(&self) -> bool {
        false
    }
}

/// Source of coordinate operations
pub trait CrsRegistry: Send + Sync {
    fn transform(&self, source_srid: i32, target_srid: i32) -> Result<Arc<dyn CoordTransform>>;
}

pub struct IdentityTransform;

impl CoordTransform for IdentityTransform {
    fn transform_coords(&self, _coords: &mut [(f64, f64)]) -> Result<()> {
        Ok(())
    }
    fn is_identity(&self) -> bool {
        true
    }
}

/// EPSG:4326 to EPSG:3857
pub struct LonLatToMerc;

impl CoordTransform for LonLatToMerc {
    fn transform_coords(&self, coords: &mut [(f64, f64)]) -> Result<()> {
        for c in coords.iter_mut() {
            *c = lonlat_to_merc(c.0, c.1);
        }
        Ok(())
    }
}

/// EPSG:3857 to EPSG:4326
pub struct MercToLonLat;

impl CoordTransform for MercToLonLat {
    fn transform_coords(&self, coords: &mut [(f64, f64)]) -> Result<()> {
        for c in coords.iter_mut() {
            *c = merc_to_lonlat(c.0, c.1);
        }
        Ok(())
    }
}

fn proj_string(srid: i32) -> Result<&'static str> {
    u16::try_from(srid)
        .ok()
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4)
        .ok_or(HeatmapError::Transform(format!(
            "EPSG:{} is not a known CRS",
            srid
        )))
}

/// Transformation based on PROJ.4 definitions, parsed once at construction
pub struct Proj4Transform {
    source_srid: i32,
    target_srid: i32,
    source: Proj,
    target: Proj,
    src_geographic: bool,
    dst_geographic: bool,
}

impl Proj4Transform {
    pub fn new(source_srid: i32, target_srid: i32) -> Result<Proj4Transform> {
        let source_def = proj_string(source_srid)?;
        let target_def = proj_string(target_srid)?;
        Ok(Proj4Transform {
            source_srid,
            target_srid,
            source: Self::proj(source_srid, source_def)?,
            target: Self::proj(target_srid, target_def)?,
            src_geographic: Self::is_geographic(source_def),
            dst_geographic: Self::is_geographic(target_def),
        })
    }
    fn proj(srid: i32, def: &str) -> Result<Proj> {
        Proj::from_proj_string(def)
            .map_err(|e| HeatmapError::Transform(format!("EPSG:{}: {:?}", srid, e)))
    }
    fn is_geographic(def: &str) -> bool {
        def.contains("+proj=longlat")
    }
}

impl CoordTransform for Proj4Transform {
    fn transform_coords(&self, coords: &mut [(f64, f64)]) -> Result<()> {
        for c in coords.iter_mut() {
            // proj4rs expects radians for geographic coordinates
            let mut point = if self.src_geographic {
                (c.0.to_radians(), c.1.to_radians(), 0.0)
            } else {
                (c.0, c.1, 0.0)
            };
            transform(&self.source, &self.target, &mut point).map_err(|e| {
                HeatmapError::Transform(format!(
                    "EPSG:{} -> EPSG:{} failed for ({}, {}): {:?}",
                    self.source_srid, self.target_srid, c.0, c.1, e
                ))
            })?;
            *c = if self.dst_geographic {
                (point.0.to_degrees(), point.1.to_degrees())
            } else {
                (point.0, point.1)
            };
        }
        Ok(())
    }
}

/// Default registry: analytic Web Mercator formulas, PROJ.4 definitions otherwise
#[derive(Default, Clone, Debug)]
pub struct Proj4Registry;

impl CrsRegistry for Proj4Registry {
    fn transform(&self, source_srid: i32, target_srid: i32) -> Result<Arc<dyn CoordTransform>> {
        match (source_srid, target_srid) {
            (s, t) if s == t => Ok(Arc::new(IdentityTransform)),
            (4326, 3857) => Ok(Arc::new(LonLatToMerc)),
            (3857, 4326) => Ok(Arc::new(MercToLonLat)),
            (s, t) => {
                debug!("Using PROJ.4 transformation EPSG:{} -> EPSG:{}", s, t);
                Ok(Arc::new(Proj4Transform::new(s, t)?))
            }
        }
    }
}
