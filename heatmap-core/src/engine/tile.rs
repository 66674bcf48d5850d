//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};
use tile_grid::PixelRect;

/// Tile column and row within the output grid
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct TileAddress {
    pub col: u32,
    pub row: u32,
}

impl TileAddress {
    pub fn new(col: u32, row: u32) -> TileAddress {
        TileAddress { col, row }
    }
}

/// Single band float samples of a grid rectangle, row-major. NaN means no data.
#[derive(Clone, Debug)]
pub struct Tile {
    pub address: TileAddress,
    pub rect: PixelRect,
    pub data: Vec<f32>,
    /// Number of points queried for this tile
    pub point_count: usize,
}

impl Tile {
    /// Tile filled with the background value
    pub fn new(address: TileAddress, rect: PixelRect) -> Tile {
        let len = (rect.width * rect.height) as usize;
        Tile {
            address,
            rect,
            data: vec![f32::NAN; len],
            point_count: 0,
        }
    }
    pub fn width(&self) -> u32 {
        self.rect.width
    }
    pub fn height(&self) -> u32 {
        self.rect.height
    }
    /// Sample at tile-local pixel `(x, y)`
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.rect.width || y >= self.rect.height {
            return None;
        }
        self.data.get((y * self.rect.width + x) as usize).cloned()
    }
    /// Number of pixels with data
    pub fn count_defined(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|v| v.is_nan())
    }

    pub fn write_to(out: &mut dyn Write, data: &[f32]) -> std::io::Result<()> {
        for v in data {
            out.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn write_gz_to(out: &mut dyn Write, data: &[f32]) -> std::io::Result<()> {
        let mut gz = GzEncoder::new(out, Compression::default());
        Self::write_to(&mut gz, data)?;
        gz.finish()?;
        Ok(())
    }

    /// Samples as little endian f32
    pub fn tile_bytevec(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(self.data.len() * 4);
        for sample in &self.data {
            v.extend_from_slice(&sample.to_le_bytes());
        }
        v
    }

    /// Gzip compressed `tile_bytevec`
    pub fn tile_bytevec_gz(&self) -> std::io::Result<Vec<u8>> {
        let mut v = Vec::with_capacity(self.data.len());
        Self::write_gz_to(&mut v, &self.data)?;
        Ok(v)
    }

    pub fn tile_content(tilegz: Vec<u8>, gzip: bool) -> std::io::Result<Vec<u8>> {
        if gzip {
            Ok(tilegz)
        } else {
            let mut gz = GzDecoder::new(&tilegz[..]);
            let mut unc_tile = Vec::with_capacity(tilegz.len() * 4);
            gz.read_to_end(&mut unc_tile)?;
            Ok(unc_tile)
        }
    }

    /// Tile from little endian f32 samples
    pub fn from_bytes(address: TileAddress, rect: PixelRect, bytes: &[u8]) -> Option<Tile> {
        if bytes.len() != (rect.width * rect.height) as usize * 4 {
            return None;
        }
        let data = bytes
            .chunks(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Some(Tile {
            address,
            rect,
            data,
            point_count: 0,
        })
    }
}
