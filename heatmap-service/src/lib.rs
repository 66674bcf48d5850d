//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_json;

pub mod cli;
pub mod datasources;
pub mod heatmap_service;
#[cfg(test)]
mod heatmap_service_test;

pub use cli::{config_from_args, gen_config, service_from_args};
pub use heatmap_service::{HeatmapService, SurfaceLayer};
