//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

pub mod pipeline;
pub mod reproject;

pub use self::pipeline::CoordinateTransformPipeline;
pub use self::reproject::{CoordTransform, CrsRegistry, IdentityTransform, Proj4Registry};
