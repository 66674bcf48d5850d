//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use thiserror::Error;

pub type Result<T, E = HeatmapError> = std::result::Result<T, E>;

/// Errors of point sources, transforms and tile computation
#[derive(Error, Debug)]
pub enum HeatmapError {
    #[error("No coordinate reference system for '{0}'")]
    MissingCrs(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Data access error: {0}")]
    DataAccess(String),

    #[error("Point source '{0}' does not support parallel streaming")]
    UnsupportedConcurrency(String),

    #[error("Transformation error: {0}")]
    Transform(String),

    #[error("Invalid kernel configuration: {0}")]
    KernelConfiguration(String),

    #[error("Unsupported request: {0}")]
    UnsupportedRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<HeatmapError> for String {
    fn from(err: HeatmapError) -> String {
        err.to_string()
    }
}
