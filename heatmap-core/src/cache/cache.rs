//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::engine::TileAddress;
use std::io;
use std::io::Read;

/// Persistent store of encoded tiles
pub trait Cache {
    fn info(&self) -> String;
    /// Base URL of tile cache server published in metadata
    fn baseurl(&self) -> String;
    /// Calls `read` with the cached object. Returns false on a cache miss.
    fn read<F>(&self, path: &str, read: F) -> bool
    where
        F: FnMut(&mut dyn Read);
    fn write(&self, path: &str, obj: &[u8]) -> Result<(), io::Error>;
    fn exists(&self, path: &str) -> bool;
    /// Remove all cached objects below `path`
    fn remove(&self, path: &str) -> Result<(), io::Error>;
}

/// Cache path of a gzip compressed tile
pub fn tile_path(surface: &str, address: &TileAddress) -> String {
    format!("{}/{}/{}.f32.gz", surface, address.col, address.row)
}

/// Cache path of the surface metadata
pub fn metadata_path(surface: &str) -> String {
    format!("{}/metadata.json", surface)
}

#[derive(Clone)]
pub struct Nocache;

impl Cache for Nocache {
    fn info(&self) -> String {
        "No cache".to_string()
    }
    fn baseurl(&self) -> String {
        "http://localhost:6767".to_string()
    }
    fn read<F>(&self, _path: &str, _read: F) -> bool
    where
        F: FnMut(&mut dyn Read),
    {
        false
    }
    fn write(&self, _path: &str, _obj: &[u8]) -> Result<(), io::Error> {
        Ok(())
    }
    fn exists(&self, _path: &str) -> bool {
        false
    }
    fn remove(&self, _path: &str) -> Result<(), io::Error> {
        Ok(())
    }
}
