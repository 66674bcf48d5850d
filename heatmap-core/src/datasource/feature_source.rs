//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::error::{HeatmapError, Result};
use crate::core::geom::GeometryType;
use crate::datasource::dataset::{FeatureDataset, FeatureStream, GeometryField};
use crate::datasource::pointsource::{
    check_envelope_srid, Point2D, PointCloudMetadata, PointSource, PointStream,
};
use std::sync::Arc;
use tile_grid::Envelope;

/// Point geometry variant a feature source streams
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum PointCapability {
    Point,
    MultiPoint,
}

impl PointCapability {
    fn from_geometry(geom: &GeometryType) -> Option<PointCapability> {
        match geom.type_name() {
            "POINT" => Some(PointCapability::Point),
            "MULTIPOINT" => Some(PointCapability::MultiPoint),
            _ => None,
        }
    }
}

/// Points of a geometry-bearing dataset.
///
/// `points_in` and `batch` can be called any number of times; each call opens a new feature
/// stream on the dataset.
pub struct FeaturePointSource {
    dataset: Arc<dyn FeatureDataset>,
    field: GeometryField,
    srid: i32,
    capability: PointCapability,
}

impl FeaturePointSource {
    /// Validates CRS and geometry type once, before any query.
    pub fn new(dataset: Arc<dyn FeatureDataset>, field: GeometryField) -> Result<Self> {
        let srid = field
            .srid
            .or(dataset.srid())
            .ok_or(HeatmapError::MissingCrs(dataset.name().to_string()))?;
        let declared = field
            .geometry_type
            .as_ref()
            .map(|t| t.to_uppercase())
            .unwrap_or("GEOMETRY".to_string());
        let capability = match declared.as_str() {
            "POINT" => PointCapability::Point,
            "MULTIPOINT" => PointCapability::MultiPoint,
            "GEOMETRY" => Self::probe_capability(dataset.as_ref())?,
            other => {
                return Err(HeatmapError::InvalidGeometry(format!(
                    "'{}' has geometry type {}, expected points",
                    dataset.name(),
                    other
                )))
            }
        };
        info!(
            "Point source '{}' EPSG:{} ({:?})",
            dataset.name(),
            srid,
            capability
        );
        Ok(FeaturePointSource {
            dataset,
            field,
            srid,
            capability,
        })
    }

    /// Determine the streamed geometry type from the first feature
    fn probe_capability(dataset: &dyn FeatureDataset) -> Result<PointCapability> {
        let mut features = dataset.features(None, false)?;
        let feature = match features.next() {
            Some(feature) => feature?,
            None => {
                return Err(HeatmapError::InvalidGeometry(format!(
                    "No features in '{}' to determine geometry type",
                    dataset.name()
                )))
            }
        };
        PointCapability::from_geometry(&feature.geometry).ok_or(HeatmapError::InvalidGeometry(
            format!(
                "'{}' contains {} geometries, expected points",
                dataset.name(),
                feature.geometry.type_name()
            ),
        ))
    }

    pub fn capability(&self) -> PointCapability {
        self.capability
    }

    pub fn geometry_field(&self) -> &GeometryField {
        &self.field
    }
}

/// Point extraction from a feature stream
struct FeaturePoints<'a> {
    features: FeatureStream<'a>,
    capability: PointCapability,
    envelope: Envelope,
    pending: Vec<(f64, f64)>,
    failed: bool,
}

impl<'a> Iterator for FeaturePoints<'a> {
    type Item = Result<Point2D>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some((x, y)) = self.pending.pop() {
                if self.envelope.contains(x, y) {
                    return Some(Ok(Point2D::new(x, y)));
                }
            }
            if self.failed {
                return None;
            }
            let feature = match self.features.next()? {
                Ok(feature) => feature,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            };
            let coords = match PointCapability::from_geometry(&feature.geometry) {
                Some(cap) if cap == self.capability => feature.geometry.point_coords(),
                _ => None,
            };
            match coords {
                Some(mut coords) => {
                    coords.reverse();
                    self.pending = coords;
                }
                None => {
                    self.failed = true;
                    return Some(Err(HeatmapError::InvalidGeometry(format!(
                        "Feature {:?} has geometry type {}, expected {:?}",
                        feature.fid,
                        feature.geometry.type_name(),
                        self.capability
                    ))));
                }
            }
        }
    }
}

impl PointSource for FeaturePointSource {
    fn points_in(&self, envelope: &Envelope, parallel: bool) -> Result<PointStream<'_>> {
        check_envelope_srid(envelope, self.srid)?;
        let features = self.dataset.features(Some(&envelope.extent()), parallel)?;
        Ok(Box::new(FeaturePoints {
            features,
            capability: self.capability,
            envelope: envelope.clone(),
            pending: Vec::new(),
            failed: false,
        }))
    }
    fn envelope(&self) -> Option<Envelope> {
        self.dataset
            .extent()
            .map(|ext| Envelope::from_extent(&ext, self.srid))
    }
    fn srid(&self) -> i32 {
        self.srid
    }
    fn metadata(&self) -> PointCloudMetadata {
        let mut properties = self.dataset.info();
        properties.insert(
            "geometry_type".to_string(),
            match self.capability {
                PointCapability::Point => "POINT".to_string(),
                PointCapability::MultiPoint => "MULTIPOINT".to_string(),
            },
        );
        if let Some(ref name) = self.field.name {
            properties.insert("geometry_field".to_string(), name.clone());
        }
        PointCloudMetadata {
            identifier: Some(self.dataset.name().to_string()),
            srid: self.srid,
            bounds: self
                .dataset
                .extent()
                .map(|e| [e.minx, e.miny, e.maxx, e.maxy]),
            properties,
        }
    }
}
