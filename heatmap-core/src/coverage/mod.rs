//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

mod surface;

pub use self::surface::{
    HeatmapCoverage, HeatmapSurface, ReadRequest, SampleDimension, SurfaceMetadata,
};
