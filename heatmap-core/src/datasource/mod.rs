//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

pub mod dataset;
pub mod feature_source;
pub mod geojson_ds;
pub mod memory_ds;
pub mod pointsource;

pub use self::dataset::{Feature, FeatureDataset, GeometryField};
pub use self::feature_source::{FeaturePointSource, PointCapability};
pub use self::geojson_ds::GeoJsonSeqDataset;
pub use self::memory_ds::MemoryDataset;
pub use self::pointsource::{Point2D, PointCloudMetadata, PointSource, PointStream};
