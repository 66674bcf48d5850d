//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::cache::cache::Cache;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

static TMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Tiles stored as files below `basepath`
#[derive(Clone)]
pub struct Filecache {
    pub basepath: String,
    pub baseurl: Option<String>,
}

impl Filecache {
    fn fullpath(&self, path: &str) -> String {
        format!("{}/{}", self.basepath, path)
    }
}

impl Cache for Filecache {
    fn info(&self) -> String {
        format!("Tile cache directory: {}", self.basepath)
    }
    fn baseurl(&self) -> String {
        self.baseurl
            .clone()
            .unwrap_or("http://localhost:6767".to_string())
    }
    fn read<F>(&self, path: &str, mut read: F) -> bool
    where
        F: FnMut(&mut dyn Read),
    {
        let fullpath = self.fullpath(path);
        debug!("Filecache.read {}", fullpath);
        match File::open(&fullpath) {
            Ok(mut f) => {
                read(&mut f);
                true
            }
            Err(_e) => false,
        }
    }
    fn write(&self, path: &str, obj: &[u8]) -> Result<(), io::Error> {
        let fullpath = self.fullpath(path);
        debug!("Filecache.write {}", fullpath);
        if let Some(dir) = Path::new(&fullpath).parent() {
            fs::create_dir_all(dir)?;
        }
        // Write to a temporary file first, concurrent readers never see partial tiles.
        // The name is unique per process and write, concurrent writers of the same tile
        // each rename their own complete file.
        let tmppath = format!(
            "{}.{}.{}.tmp",
            fullpath,
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        {
            let mut f = File::create(&tmppath)?;
            if let Err(e) = f.write_all(obj) {
                let _ = fs::remove_file(&tmppath);
                return Err(e);
            }
        }
        fs::rename(&tmppath, &fullpath).map_err(|e| {
            let _ = fs::remove_file(&tmppath);
            e
        })
    }
    fn exists(&self, path: &str) -> bool {
        Path::new(&self.fullpath(path)).exists()
    }
    fn remove(&self, path: &str) -> Result<(), io::Error> {
        let fullpath = self.fullpath(path);
        let p = Path::new(&fullpath);
        if p.is_dir() {
            info!("Removing cache directory {}", fullpath);
            fs::remove_dir_all(p)
        } else if p.exists() {
            fs::remove_file(p)
        } else {
            Ok(())
        }
    }
}
