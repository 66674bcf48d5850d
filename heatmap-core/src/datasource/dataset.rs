//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::SurfaceCfg;
use crate::core::error::Result;
use crate::core::geom::GeometryType;
use std::collections::BTreeMap;
use tile_grid::Extent;

/// Feature with geometry
#[derive(Clone, Debug)]
pub struct Feature {
    pub fid: Option<u64>,
    pub geometry: GeometryType,
}

pub type FeatureStream<'a> = Box<dyn Iterator<Item = Result<Feature>> + Send + 'a>;

/// Dataset of geometry-bearing features
pub trait FeatureDataset: Send + Sync {
    fn name(&self) -> &str;
    /// Declared spatial reference system of the dataset
    fn srid(&self) -> Option<i32>;
    fn extent(&self) -> Option<Extent>;
    /// Features with a bounding box intersecting `bbox`, all features for `None`.
    /// Every call opens a new stream.
    fn features(&self, bbox: Option<&Extent>, parallel: bool) -> Result<FeatureStream<'_>>;
    /// Descriptive metadata passed through to consumers
    fn info(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// Geometry attribute description of a layer
#[derive(Default, Clone, Debug)]
pub struct GeometryField {
    pub name: Option<String>,
    /// Declared geometry type (POINT, MULTIPOINT, GEOMETRY, ..)
    pub geometry_type: Option<String>,
    /// Spatial reference system of the geometry attribute
    pub srid: Option<i32>,
}

impl GeometryField {
    pub fn points(srid: Option<i32>) -> GeometryField {
        GeometryField {
            name: None,
            geometry_type: Some("POINT".to_string()),
            srid,
        }
    }
}

impl From<&SurfaceCfg> for GeometryField {
    fn from(cfg: &SurfaceCfg) -> GeometryField {
        GeometryField {
            name: cfg.geometry_field.clone(),
            geometry_type: cfg.geometry_type.clone(),
            srid: cfg.srid,
        }
    }
}

pub(crate) fn bbox_intersects(bbox: Option<&Extent>, geometry: &GeometryType) -> bool {
    match (bbox, geometry.bbox()) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(filter), Some(gbox)) => {
            gbox.minx <= filter.maxx
                && gbox.maxx >= filter.minx
                && gbox.miny <= filter.maxy
                && gbox.maxy >= filter.miny
        }
    }
}
