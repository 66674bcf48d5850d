//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::DatasourceCfg;
use crate::core::error::Result;
use crate::core::geom::{self, GeometryType};
use crate::core::Config;
use crate::datasource::dataset::{bbox_intersects, Feature, FeatureDataset, FeatureStream};
use std::collections::BTreeMap;
use tile_grid::Extent;

/// Features held in memory.
///
/// Streams can be opened any number of times. They only borrow the immutable feature
/// list, so a `parallel` request gets the same stream and any number of them can be
/// consumed on separate threads at once. A single stream is not split up.
#[derive(Clone, Debug)]
pub struct MemoryDataset {
    pub name: String,
    pub srid: Option<i32>,
    features: Vec<Feature>,
    extent: Option<Extent>,
}

impl MemoryDataset {
    pub fn new(name: &str, srid: Option<i32>, features: Vec<Feature>) -> MemoryDataset {
        let extent = features
            .iter()
            .filter_map(|f| f.geometry.bbox())
            .fold(None, |acc: Option<Extent>, b| match acc {
                None => Some(b),
                Some(e) => Some(Extent {
                    minx: e.minx.min(b.minx),
                    miny: e.miny.min(b.miny),
                    maxx: e.maxx.max(b.maxx),
                    maxy: e.maxy.max(b.maxy),
                }),
            });
        MemoryDataset {
            name: name.to_string(),
            srid,
            features,
            extent,
        }
    }
    /// Dataset of plain points
    pub fn from_points(name: &str, srid: Option<i32>, coords: &[(f64, f64)]) -> MemoryDataset {
        let features = coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Feature {
                fid: Some(i as u64),
                geometry: GeometryType::Point(geom::Point::new(x, y, srid)),
            })
            .collect();
        MemoryDataset::new(name, srid, features)
    }
    pub fn len(&self) -> usize {
        self.features.len()
    }
}

impl FeatureDataset for MemoryDataset {
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
        debug!("MemoryDataset.features {} bbox {:?} parallel {}", self.name, bbox, parallel);
        let bbox = bbox.cloned();
        Ok(Box::new(
            self.features
                .iter()
                .filter(move |f| bbox_intersects(bbox.as_ref(), &f.geometry))
                .map(|f| Ok(f.clone())),
        ))
    }
    fn info(&self) -> BTreeMap<String, String> {
        let mut info = BTreeMap::new();
        info.insert("storage".to_string(), "memory".to_string());
        info.insert("feature_count".to_string(), self.features.len().to_string());
        info
    }
}

impl<'a> Config<'a, DatasourceCfg> for MemoryDataset {
    fn from_config(ds_cfg: &DatasourceCfg) -> Result<Self, String> {
        let points = ds_cfg
            .points
            .as_ref()
            .ok_or("Missing 'points' in memory datasource".to_string())?;
        let name = ds_cfg.name.clone().unwrap_or("points".to_string());
        Ok(MemoryDataset::from_points(&name, ds_cfg.srid, points))
    }
    fn gen_config() -> String {
        let toml = r#"
#[[datasource]]
#name = "inline"
#points = [[8.54, 47.37], [7.45, 46.95]]
#srid = 4326
"#;
        toml.to_string()
    }
    fn gen_runtime_config(&self) -> String {
        let mut lines = vec!["\n[[datasource]]".to_string()];
        lines.push(format!(r#"name = "{}""#, self.name));
        let points: Vec<String> = self
            .features
            .iter()
            .filter_map(|f| f.geometry.point_coords())
            .flatten()
            .map(|(x, y)| format!("[{:?}, {:?}]", x, y))
            .collect();
        lines.push(format!("points = [{}]", points.join(", ")));
        if let Some(srid) = self.srid {
            lines.push(format!("srid = {}", srid));
        }
        lines.join("\n") + "\n"
    }
}
