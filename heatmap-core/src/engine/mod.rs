//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

pub mod kernel;
pub mod tile;
pub mod tile_engine;

pub use self::kernel::KernelParameters;
pub use self::tile::{Tile, TileAddress};
pub use self::tile_engine::TileEngine;

#[cfg(test)]
mod tile_engine_test;
