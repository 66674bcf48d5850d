//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

//! In-memory tile arena keyed by tile address

use crate::core::error::Result;
use crate::engine::{Tile, TileAddress};
use lru::LruCache;
use std::sync::{Arc, Mutex};

struct ArenaEntries {
    tiles: LruCache<(String, TileAddress), Arc<Tile>>,
    current_bytes: usize,
}

/// Computed tiles, bounded by memory size. Least recently used tiles are evicted first.
pub struct TileArena {
    entries: Mutex<ArenaEntries>,
    capacity_bytes: usize,
}

fn tile_bytes(tile: &Tile) -> usize {
    tile.data.len() * std::mem::size_of::<f32>()
}

impl TileArena {
    pub fn new(capacity_bytes: usize) -> TileArena {
        TileArena {
            entries: Mutex::new(ArenaEntries {
                tiles: LruCache::unbounded(),
                current_bytes: 0,
            }),
            capacity_bytes,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ArenaEntries> {
        // Entries stay consistent even if a holder panicked
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, surface: &str, address: &TileAddress) -> Option<Arc<Tile>> {
        let key = (surface.to_string(), *address);
        self.lock().tiles.get(&key).cloned()
    }

    pub fn insert(&self, surface: &str, tile: Arc<Tile>) {
        let size = tile_bytes(&tile);
        if size > self.capacity_bytes {
            return;
        }
        let mut entries = self.lock();
        let key = (surface.to_string(), tile.address);
        if let Some(old) = entries.tiles.pop(&key) {
            entries.current_bytes = entries.current_bytes.saturating_sub(tile_bytes(&old));
        }
        while entries.current_bytes + size > self.capacity_bytes {
            match entries.tiles.pop_lru() {
                Some((_, evicted)) => {
                    entries.current_bytes =
                        entries.current_bytes.saturating_sub(tile_bytes(&evicted))
                }
                None => break,
            }
        }
        entries.current_bytes += size;
        entries.tiles.put(key, tile);
    }

    /// Cached tile or result of `compute`. Errors are not cached.
    ///
    /// The lock is not held while computing, concurrent misses compute the same tile twice.
    pub fn get_or_compute<F>(&self, surface: &str, address: &TileAddress, compute: F) -> Result<Arc<Tile>>
    where
        F: FnOnce() -> Result<Tile>,
    {
        if let Some(tile) = self.get(surface, address) {
            return Ok(tile);
        }
        let tile = Arc::new(compute()?);
        self.insert(surface, tile.clone());
        Ok(tile)
    }

    pub fn len(&self) -> usize {
        self.lock().tiles.len()
    }

    pub fn size_bytes(&self) -> usize {
        self.lock().current_bytes
    }

    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.tiles.clear();
        entries.current_bytes = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::error::HeatmapError;
    use tile_grid::PixelRect;

    fn tile(col: u32) -> Tile {
        let rect = PixelRect {
            x: col * 4,
            y: 0,
            width: 4,
            height: 4,
        };
        Tile::new(TileAddress::new(col, 0), rect)
    }

    #[test]
    fn test_get_or_compute() {
        let arena = TileArena::new(1024);
        let addr = TileAddress::new(1, 0);
        let mut calls = 0;
        let t = arena
            .get_or_compute("s", &addr, || {
                calls += 1;
                Ok(tile(1))
            })
            .unwrap();
        assert_eq!(t.address, addr);
        let _ = arena.get_or_compute("s", &addr, || {
            calls += 1;
            Ok(tile(1))
        });
        assert_eq!(calls, 1);
        // Keyed by surface
        assert!(arena.get("other", &addr).is_none());

        let err = arena.get_or_compute("s", &TileAddress::new(2, 0), || {
            Err(HeatmapError::DataAccess("down".to_string()))
        });
        assert!(err.is_err());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_eviction() {
        // Room for two 64 byte tiles
        let arena = TileArena::new(150);
        arena.insert("s", Arc::new(tile(0)));
        arena.insert("s", Arc::new(tile(1)));
        assert!(arena.get("s", &TileAddress::new(0, 0)).is_some());
        arena.insert("s", Arc::new(tile(2)));
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.size_bytes(), 128);
        // Tile 1 was least recently used
        assert!(arena.get("s", &TileAddress::new(1, 0)).is_none());
        assert!(arena.get("s", &TileAddress::new(0, 0)).is_some());
        arena.clear();
        assert_eq!(arena.len(), 0);
    }
}
