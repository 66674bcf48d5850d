//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use clap::ArgMatches;
use heatmap_core::core::config::{ApplicationCfg, DatasourceCfg};
use heatmap_core::core::Config;
use heatmap_core::datasource::{FeatureDataset, GeoJsonSeqDataset, MemoryDataset};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub enum Datasource {
    Memory(Arc<MemoryDataset>),
    GeoJson(Arc<GeoJsonSeqDataset>),
}

impl Datasource {
    pub fn dataset(&self) -> Arc<dyn FeatureDataset> {
        match self {
            Datasource::Memory(ds) => ds.clone(),
            Datasource::GeoJson(ds) => ds.clone(),
        }
    }
    pub fn name(&self) -> &str {
        match self {
            Datasource::Memory(ds) => &ds.name,
            Datasource::GeoJson(ds) => &ds.name,
        }
    }
}

impl<'a> Config<'a, DatasourceCfg> for Datasource {
    fn from_config(ds_cfg: &DatasourceCfg) -> Result<Self, String> {
        if ds_cfg.points.is_some() {
            MemoryDataset::from_config(ds_cfg).map(|ds| Datasource::Memory(Arc::new(ds)))
        } else if ds_cfg.path.is_some() {
            GeoJsonSeqDataset::from_config(ds_cfg).map(|ds| Datasource::GeoJson(Arc::new(ds)))
        } else {
            Err("Unsupported datasource".to_string())
        }
    }
    fn gen_config() -> String {
        format!(
            "{}{}",
            GeoJsonSeqDataset::gen_config(),
            MemoryDataset::gen_config()
        )
    }
    fn gen_runtime_config(&self) -> String {
        match self {
            Datasource::Memory(ds) => ds.gen_runtime_config(),
            Datasource::GeoJson(ds) => ds.gen_runtime_config(),
        }
    }
}

#[derive(Clone)]
pub struct Datasources {
    pub datasources: HashMap<String, Datasource>,
    /// Names in configuration order
    order: Vec<String>,
    pub default: Option<String>,
}

impl<'a> Config<'a, ApplicationCfg> for Datasources {
    fn from_config(app_cfg: &ApplicationCfg) -> Result<Self, String> {
        let mut datasources = Datasources::new();
        for ds_cfg in &app_cfg.datasource {
            let ds = Datasource::from_config(ds_cfg)?;
            let name = ds_cfg.name.clone().unwrap_or(ds.name().to_string());
            if datasources.datasources.contains_key(&name) {
                return Err(format!("Duplicate datasource name '{}'", name));
            }
            datasources.add(&name, ds);
            if ds_cfg.default.unwrap_or(false) {
                datasources.default = Some(name);
            }
        }
        datasources.setup();
        Ok(datasources)
    }
    fn gen_config() -> String {
        Datasource::gen_config()
    }
    fn gen_runtime_config(&self) -> String {
        let mut config = String::new();
        for name in &self.order {
            if let Some(ds) = self.datasources.get(name) {
                config.push_str(&ds.gen_runtime_config());
                if ds.name() != name {
                    config.push_str(&format!("# registered as \"{}\"\n", name));
                }
                if self.default.as_ref() == Some(name) {
                    config.push_str("default = true\n");
                }
            }
        }
        config
    }
}

impl Datasources {
    pub fn new() -> Self {
        Datasources {
            datasources: HashMap::new(),
            order: Vec::new(),
            default: None,
        }
    }
    pub fn add(&mut self, name: &str, ds: Datasource) {
        if self.datasources.insert(name.to_string(), ds).is_none() {
            self.order.push(name.to_string());
        }
    }
    /// Datasource from command line arguments `--datasource` and `--srid`
    pub fn from_args(args: &ArgMatches) -> Result<Self, String> {
        let mut datasources = Datasources::new();
        if let Some(path) = args.value_of("datasource") {
            let srid = match args.value_of("srid") {
                Some(s) => Some(
                    s.parse::<i32>()
                        .map_err(|_| format!("Error parsing 'srid' {} as integer value", s))?,
                ),
                None => None,
            };
            let cfg = DatasourceCfg {
                name: None,
                default: Some(true),
                path: Some(path.to_string()),
                points: None,
                srid,
                extent: None,
            };
            let mut ds = GeoJsonSeqDataset::from_config(&cfg)?;
            // No configured extent to rely on
            ds.extent = ds.scan_extent()?;
            let name = ds.name.clone();
            datasources.add(&name, Datasource::GeoJson(Arc::new(ds)));
        }
        datasources.setup();
        Ok(datasources)
    }
    /// Finish initialization
    pub fn setup(&mut self) {
        if self.default.is_none() {
            self.default = self.order.first().cloned();
        }
    }
    pub fn datasource(&self, name: &Option<String>) -> Option<&Datasource> {
        let key = name.as_ref().or(self.default.as_ref())?;
        self.datasources.get(key)
    }
    pub fn default(&self) -> Option<&Datasource> {
        self.datasource(&None)
    }
}

#[cfg(test)]
fn ds_from_config(toml: &str) -> Result<Datasource, String> {
    use heatmap_core::core::parse_config;

    let config = parse_config(toml.to_string(), "");
    Datasource::from_config(&config?)
}

#[test]
fn test_datasource_from_config() {
    let toml = r#"
        #[[datasource]]
        path = "../data/crimes.geojsons"
        srid = 4326
        "#;
    let ds = match ds_from_config(toml).unwrap() {
        Datasource::GeoJson(ds) => ds,
        _ => panic!(),
    };
    assert_eq!(ds.name, "crimes");
    assert_eq!(ds.srid, Some(4326));

    let toml = r#"
        #[[datasource]]
        name = "stations"
        points = [[8.54, 47.37], [7.45, 46.95]]
        "#;
    match ds_from_config(toml).unwrap() {
        Datasource::Memory(ds) => assert_eq!(ds.len(), 2),
        _ => panic!(),
    }
}

#[test]
fn test_datasource_config_errors() {
    assert_eq!(
        ds_from_config("").err(),
        Some("Unsupported datasource".to_string())
    );

    let toml = r#"
        #[[datasource]]
        path = true
        "#;
    assert_eq!(
        ds_from_config(toml).err(),
        Some(" - invalid type: boolean `true`, expected a string for key `path`".to_string())
    );
}

#[test]
fn test_default_datasource() {
    use heatmap_core::core::config::read_config;

    let config: ApplicationCfg = read_config("src/test/example.toml").unwrap();
    let datasources = Datasources::from_config(&config).unwrap();
    assert_eq!(datasources.default, Some("crimes".to_string()));
    assert_eq!(datasources.default().map(|ds| ds.name()), Some("crimes"));
    assert!(datasources
        .datasource(&Some("stations".to_string()))
        .is_some());
    assert!(datasources.datasource(&Some("none".to_string())).is_none());
    let runtime_cfg = datasources.gen_runtime_config();
    assert!(runtime_cfg.contains(r#"name = "stations""#));
}
