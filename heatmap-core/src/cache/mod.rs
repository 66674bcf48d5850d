//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

pub mod arena;
pub mod cache;
pub mod filecache;

#[cfg(test)]
mod filecache_test;

pub use self::arena::TileArena;
pub use self::cache::{metadata_path, tile_path, Cache, Nocache};
pub use self::filecache::Filecache;
use crate::core::ApplicationCfg;
use crate::core::Config;
use std::io;
use std::io::Read;

#[derive(Clone)]
pub enum Tilecache {
    Nocache(Nocache),
    Filecache(Filecache),
}

impl Cache for Tilecache {
    fn info(&self) -> String {
        match self {
            Tilecache::Nocache(cache) => cache.info(),
            Tilecache::Filecache(cache) => cache.info(),
        }
    }
    fn baseurl(&self) -> String {
        match self {
            Tilecache::Nocache(cache) => cache.baseurl(),
            Tilecache::Filecache(cache) => cache.baseurl(),
        }
    }
    fn read<F>(&self, path: &str, read: F) -> bool
    where
        F: FnMut(&mut dyn Read),
    {
        match self {
            Tilecache::Nocache(cache) => cache.read(path, read),
            Tilecache::Filecache(cache) => cache.read(path, read),
        }
    }
    fn write(&self, path: &str, obj: &[u8]) -> Result<(), io::Error> {
        match self {
            Tilecache::Nocache(cache) => cache.write(path, obj),
            Tilecache::Filecache(cache) => cache.write(path, obj),
        }
    }
    fn exists(&self, path: &str) -> bool {
        match self {
            Tilecache::Nocache(cache) => cache.exists(path),
            Tilecache::Filecache(cache) => cache.exists(path),
        }
    }
    fn remove(&self, path: &str) -> Result<(), io::Error> {
        match self {
            Tilecache::Nocache(cache) => cache.remove(path),
            Tilecache::Filecache(cache) => cache.remove(path),
        }
    }
}

impl<'a> Config<'a, ApplicationCfg> for Tilecache {
    fn from_config(config: &ApplicationCfg) -> Result<Self, String> {
        let file_cfg = config.cache.as_ref().and_then(|cache| cache.file.as_ref());
        match file_cfg {
            Some(cfg) => {
                if cfg.base.is_empty() {
                    return Err("Empty cache base directory".to_string());
                }
                Ok(Tilecache::Filecache(Filecache {
                    basepath: cfg.base.clone(),
                    baseurl: cfg.baseurl.clone(),
                }))
            }
            None => Ok(Tilecache::Nocache(Nocache)),
        }
    }
    fn gen_config() -> String {
        let toml = r#"
#[cache.file]
#base = "/tmp/heatmapcache"
#baseurl = "http://example.com/heatmaps"
"#;
        toml.to_string()
    }
    fn gen_runtime_config(&self) -> String {
        match self {
            Tilecache::Filecache(fc) => {
                let mut lines = vec!["\n[cache.file]".to_string()];
                lines.push(format!(r#"base = "{}""#, fc.basepath));
                if let Some(ref url) = fc.baseurl {
                    lines.push(format!(r#"baseurl = "{}""#, url));
                }
                lines.join("\n") + "\n"
            }
            Tilecache::Nocache(_) => Self::gen_config(),
        }
    }
}
