//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::error::{HeatmapError, Result};
use std::collections::BTreeMap;
use tile_grid::Envelope;

/// Position in the native CRS of a point source
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Point2D {
        Point2D { x, y }
    }
}

/// Descriptive metadata of a point source
#[derive(Serialize, PartialEq, Clone, Debug)]
pub struct PointCloudMetadata {
    pub identifier: Option<String>,
    pub srid: i32,
    /// `[minx, miny, maxx, maxy]` in `srid`
    pub bounds: Option<[f64; 4]>,
    pub properties: BTreeMap<String, String>,
}

/// Lazy sequence of points. One-shot: consuming it twice requires a new call.
pub type PointStream<'a> = Box<dyn Iterator<Item = Result<Point2D>> + Send + 'a>;

/// Lazy sequence of flat coordinate chunks `[x0, y0, x1, y1, ..]`
pub type BatchStream<'a> = Box<dyn Iterator<Item = Result<Vec<f64>>> + Send + 'a>;

pub trait PointSource: Send + Sync {
    /// Points located within `envelope` (given in the source CRS).
    /// `parallel` asks for a stream that may be produced concurrently; sources which can't
    /// honor it fail with `UnsupportedConcurrency`.
    fn points_in(&self, envelope: &Envelope, parallel: bool) -> Result<PointStream<'_>>;
    /// Same points as `points_in`, in chunks of at most `batch_size` points
    fn batch(
        &self,
        envelope: &Envelope,
        parallel: bool,
        batch_size: usize,
    ) -> Result<BatchStream<'_>> {
        if batch_size == 0 {
            return Err(HeatmapError::UnsupportedRequest(
                "batch size must be > 0".to_string(),
            ));
        }
        let points = self.points_in(envelope, parallel)?;
        Ok(Box::new(CoordinateBatches::new(points, batch_size)))
    }
    /// Extent of all points, if known
    fn envelope(&self) -> Option<Envelope>;
    /// Spatial reference system of returned points
    fn srid(&self) -> i32;
    fn metadata(&self) -> PointCloudMetadata;
}

/// Groups a point stream into flat coordinate chunks
pub struct CoordinateBatches<'a> {
    points: PointStream<'a>,
    batch_size: usize,
    finished: bool,
}

impl<'a> CoordinateBatches<'a> {
    pub fn new(points: PointStream<'a>, batch_size: usize) -> CoordinateBatches<'a> {
        CoordinateBatches {
            points,
            batch_size: batch_size.max(1),
            finished: false,
        }
    }
}

impl<'a> Iterator for CoordinateBatches<'a> {
    type Item = Result<Vec<f64>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let mut chunk = Vec::with_capacity(self.batch_size * 2);
        while chunk.len() < self.batch_size * 2 {
            match self.points.next() {
                Some(Ok(pt)) => {
                    chunk.push(pt.x);
                    chunk.push(pt.y);
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    break;
                }
            }
        }
        if chunk.is_empty() {
            None
        } else {
            Some(Ok(chunk))
        }
    }
}

/// Fails unless `envelope` is expressed in the CRS of `source`
pub(crate) fn check_envelope_srid(envelope: &Envelope, srid: i32) -> Result<()> {
    if envelope.srid() != srid {
        return Err(HeatmapError::UnsupportedRequest(format!(
            "query envelope in EPSG:{} but source CRS is EPSG:{}",
            envelope.srid(),
            srid
        )));
    }
    Ok(())
}
