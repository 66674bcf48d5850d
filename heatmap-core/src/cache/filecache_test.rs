//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::cache::{tile_path, Cache, Filecache, Nocache};
use crate::engine::{Tile, TileAddress};
use std::env;
use std::fs;
use std::io::Read;
use std::path::Path;
use tile_grid::PixelRect;

#[test]
fn test_dircache() {
    let mut dir = env::temp_dir();
    dir.push("t_rex_heatmap_cache_test");
    let basepath = format!("{}", &dir.display());
    let _ = fs::remove_dir_all(&basepath);

    let cache = Filecache {
        basepath,
        baseurl: Some("http://localhost:6767".to_string()),
    };
    let address = TileAddress::new(3, 2);
    let path = tile_path("crimes", &address);
    assert_eq!(path, "crimes/3/2.f32.gz");
    let fullpath = format!("{}/{}", cache.basepath, path);

    // Cache miss
    assert_eq!(cache.read(&path, |_| {}), false);
    assert!(!cache.exists(&path));

    // Write gzip compressed samples
    let rect = PixelRect {
        x: 6,
        y: 4,
        width: 2,
        height: 2,
    };
    let mut tile = Tile::new(address, rect);
    tile.data[1] = 0.5;
    tile.data[2] = 2.0;
    cache.write(&path, &tile.tile_bytevec_gz().unwrap()).unwrap();
    assert!(Path::new(&fullpath).exists());
    assert!(cache.exists(&path));

    // Read from cache
    let mut gz = Vec::new();
    assert!(cache.read(&path, |f| {
        let _ = f.read_to_end(&mut gz);
    }));
    let bytes = Tile::tile_content(gz, false).unwrap();
    let cached = Tile::from_bytes(address, rect, &bytes).unwrap();
    assert!(cached.get(0, 0).unwrap().is_nan());
    assert_eq!(cached.get(1, 0), Some(0.5));
    assert_eq!(cached.get(0, 1), Some(2.0));

    // Remove surface
    cache.remove("crimes").unwrap();
    assert!(!cache.exists(&path));
}

#[test]
fn test_nocache() {
    let cache = Nocache;
    assert!(cache.write("s/0/0.f32.gz", b"data").is_ok());
    assert!(!cache.exists("s/0/0.f32.gz"));
    assert_eq!(cache.read("s/0/0.f32.gz", |_| {}), false);
}

#[test]
fn test_concurrent_writes() {
    use std::thread;

    let dir = env::temp_dir().join("t_rex_heatmap_cache_concurrent");
    let basepath = format!("{}", &dir.display());
    let _ = fs::remove_dir_all(&basepath);
    let cache = Filecache {
        basepath: basepath.clone(),
        baseurl: None,
    };

    let writers: Vec<_> = (0..8u8)
        .map(|i| {
            let cache = cache.clone();
            thread::spawn(move || {
                let content = vec![i; 64 * 1024];
                for _ in 0..10 {
                    cache.write("surface/0/0.f32.gz", &content).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    // Content of exactly one writer
    let mut content = Vec::new();
    assert!(cache.read("surface/0/0.f32.gz", |f| {
        let _ = f.read_to_end(&mut content);
    }));
    assert_eq!(content.len(), 64 * 1024);
    assert!(content.iter().all(|b| *b == content[0]));

    let leftovers: Vec<_> = fs::read_dir(dir.join("surface/0"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "{:?}", leftovers);
    let _ = fs::remove_dir_all(&basepath);
}
