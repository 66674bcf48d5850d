//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! Per surface statistics of tile computations and density samples

use stats::{MinMax, OnlineStats};
use std::collections::BTreeMap;
use std::fmt;

/// Quantity measured for a surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Measure {
    /// Computation time of a tile in milliseconds
    TileMs,
    /// Points contributing to a tile
    PointCount,
    /// Defined pixels of a tile
    PixelsWithData,
    /// Density sampled at a drilldown point
    Value,
}

impl Measure {
    pub fn name(&self) -> &'static str {
        match self {
            Measure::TileMs => "tile_ms",
            Measure::PointCount => "point_count",
            Measure::PixelsWithData => "pixels_with_data",
            Measure::Value => "value",
        }
    }
}

struct Collector {
    online: OnlineStats,
    minmax: MinMax<f64>,
    nodata: usize,
}

impl Collector {
    fn new() -> Collector {
        Collector {
            online: OnlineStats::new(),
            minmax: MinMax::new(),
            nodata: 0,
        }
    }
    fn add(&mut self, value: f64) {
        // NaN samples would poison min/max and mean
        if value.is_nan() {
            self.nodata += 1;
        } else {
            self.online.add(value);
            self.minmax.add(value);
        }
    }
    fn results(&self) -> StatResults {
        StatResults {
            len: self.minmax.len(),
            nodata: self.nodata,
            min: self.minmax.min().cloned().unwrap_or(0.0),
            max: self.minmax.max().cloned().unwrap_or(0.0),
            mean: self.online.mean(),
            stddev: self.online.stddev(),
            variance: self.online.variance(),
        }
    }
}

/// Summary of the values of one measure. `len` counts values with data only.
#[derive(Default, Clone, PartialEq, Debug)]
pub struct StatResults {
    pub len: usize,
    pub nodata: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
    pub variance: f64,
}

/// Measures keyed by surface name
pub struct Statistics(BTreeMap<(String, Measure), Collector>);

impl Statistics {
    pub fn new() -> Statistics {
        Statistics(BTreeMap::new())
    }
    /// Add a value. NaN is counted as sample without data.
    pub fn add(&mut self, surface: &str, measure: Measure, value: f64) {
        self.0
            .entry((surface.to_string(), measure))
            .or_insert_with(Collector::new)
            .add(value);
    }
    /// Current results, all zero for unknown keys
    pub fn results(&self, surface: &str, measure: Measure) -> StatResults {
        self.0
            .get(&(surface.to_string(), measure))
            .map(Collector::results)
            .unwrap_or_default()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Results as CSV table with header line
    pub fn as_csv(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "surface,measure,count,nodata,min,max,mean,stddev")?;
        for ((surface, measure), collector) in &self.0 {
            let res = collector.results();
            writeln!(
                f,
                "{},{},{},{},{:.3},{:.3},{:.3},{:.3}",
                surface,
                measure.name(),
                res.len,
                res.nodata,
                res.min,
                res.max,
                res.mean,
                res.stddev
            )?;
        }
        Ok(())
    }
}

#[test]
fn usage() {
    let mut stats = Statistics::new();
    assert!(stats.is_empty());
    stats.add("heat", Measure::TileMs, 1.0);
    assert_eq!(stats.results("heat", Measure::TileMs).mean, 1.0);
    stats.add("heat", Measure::TileMs, 2.0);
    assert_eq!(stats.results("heat", Measure::TileMs).mean, 1.5);
    stats.add("heat", Measure::PointCount, 2.0);
    assert_eq!(stats.results("heat", Measure::PointCount).mean, 2.0);
    stats.add("heat", Measure::TileMs, 3.0);
    let res = stats.results("heat", Measure::TileMs);
    assert_eq!(res.mean, 2.0);
    assert_eq!(res.len, 3);
    assert_eq!(res.min, 1.0);
    assert_eq!(res.max, 3.0);
    assert!((res.variance - 2.0 / 3.0).abs() < 1e-12);

    assert_eq!(
        stats.results("other", Measure::TileMs),
        StatResults::default()
    );
}

#[test]
fn nodata_samples() {
    let mut stats = Statistics::new();
    stats.add("heat", Measure::Value, f64::NAN);
    assert_eq!(stats.results("heat", Measure::Value).len, 0);
    assert_eq!(stats.results("heat", Measure::Value).nodata, 1);
    stats.add("heat", Measure::Value, 0.5);
    stats.add("heat", Measure::Value, f64::NAN);
    let res = stats.results("heat", Measure::Value);
    assert_eq!((res.len, res.nodata), (1, 2));
    assert_eq!((res.min, res.max, res.mean), (0.5, 0.5, 0.5));
}

#[test]
fn csv_output() {
    let mut stats = Statistics::new();
    stats.add("b", Measure::PointCount, 4.0);
    stats.add("a", Measure::Value, 1.0);
    stats.add("a", Measure::TileMs, 0.25);
    stats.add("a", Measure::Value, 3.0);
    stats.add("a", Measure::Value, f64::NAN);
    assert_eq!(
        stats.as_csv(),
        "surface,measure,count,nodata,min,max,mean,stddev\n\
         a,tile_ms,1,0,0.250,0.250,0.250,0.000\n\
         a,value,2,1,1.000,3.000,2.000,1.000\n\
         b,point_count,1,0,4.000,4.000,4.000,0.000\n"
    );
}
