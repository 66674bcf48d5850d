//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! On-demand kernel density heatmap tiles from point sources.
//!
//! A [`HeatmapSurface`](coverage::HeatmapSurface) is read with an output grid geometry,
//! the resulting coverage computes tiles lazily from the points around each tile.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod cache;
pub mod core;
pub mod coverage;
pub mod datasource;
pub mod engine;
pub mod transform;
