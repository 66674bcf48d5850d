//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

use clap::{App, AppSettings, ArgMatches, SubCommand};
use dotenv::dotenv;
use env_logger::Builder;
use heatmap_core::cache::Tilecache;
use heatmap_service::HeatmapService;
use log::Record;
use std::env;
use std::io::Write;
use std::process;
use time;

fn init_logger(args: &ArgMatches<'_>) {
    let mut builder = Builder::new();
    builder.format(|buf, record: &Record<'_>| {
        let t = time::now();
        let ts = time::strftime("%Y-%m-%d %H:%M:%S", &t)
            .map(|tm| tm.to_string())
            .unwrap_or_default();
        writeln!(
            buf,
            "{}.{:03} {} {}",
            ts,
            t.tm_nsec / 1000_000,
            record.level(),
            record.args()
        )
    });

    let rust_log = match (args.value_of("loglevel"), env::var("RUST_LOG")) {
        (None, Ok(rust_log_env)) => rust_log_env,
        (loglevel, _) => match loglevel.unwrap_or("info") {
            "debug" => "debug,tokio=info".to_string(),
            loglevel => loglevel.to_string(),
        },
    };
    builder.parse_filters(&rust_log);

    builder.init();
}

fn exit_with_error(msg: &str) -> ! {
    error!("{}", msg);
    println!("Error - {}", msg);
    process::exit(1)
}

fn service(args: &ArgMatches<'_>) -> HeatmapService {
    heatmap_service::service_from_args(args)
        .unwrap_or_else(|err| exit_with_error(&format!("Error reading configuration - {}", err)))
}

fn parse_arg<T: std::str::FromStr>(args: &ArgMatches<'_>, name: &str, what: &str) -> Option<T> {
    args.value_of(name).map(|s| {
        s.parse::<T>().unwrap_or_else(|_| {
            exit_with_error(&format!("Error parsing '{}' as {}", name, what))
        })
    })
}

fn generate(args: &ArgMatches<'_>) {
    let service = service(args);
    if let Tilecache::Nocache(_) = service.cache {
        exit_with_error("Missing configuration entry base in [cache.file]");
    }
    let surface = args.value_of("surface");
    let nodes = parse_arg::<u8>(args, "nodes", "integer value");
    let nodeno = parse_arg::<u8>(args, "nodeno", "integer value");
    let progress = parse_arg::<bool>(args, "progress", "boolean value").unwrap_or(true);
    let overwrite = parse_arg::<bool>(args, "overwrite", "boolean value").unwrap_or(false);
    if let Err(e) = service.generate(surface, nodes, nodeno, progress, overwrite) {
        exit_with_error(&e.to_string());
    }
}

fn drilldown(args: &ArgMatches<'_>) {
    let service = service(args);
    let surface = args.value_of("surface");
    let points: Vec<f64> = match args.value_of("points") {
        Some(numlist) => numlist
            .split(",")
            .map(|v| {
                v.trim().parse().unwrap_or_else(|_| {
                    exit_with_error("Error parsing 'points' as list of float values")
                })
            })
            .collect(),
        None => exit_with_error("Missing 'points' list"),
    };
    let progress = parse_arg::<bool>(args, "progress", "boolean value").unwrap_or(true);
    match service.drilldown(surface, points, progress) {
        Ok(stats) => print!("{}", stats.as_csv()),
        Err(e) => exit_with_error(&e.to_string()),
    }
}

fn main() {
    dotenv().ok();
    let mut app = App::new("t_rex_heatmap")
        .version(crate_version!())
        .author("Pirmin Kalberer <pka@sourcepole.ch>")
        .about("kernel density heatmap tiles from point data")
        .subcommand(SubCommand::with_name("genconfig")
                        .args_from_usage("--datasource=[FILE] 'GeoJSON text sequence file'
                                              --srid=[EPSG] 'Spatial reference system of datasource'
                                              --distance=[DIST] 'Influence radius in datasource CRS units'
                                              --loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'")
                        .about("Generate configuration template"))
        .subcommand(SubCommand::with_name("generate")
                        .setting(AppSettings::AllowLeadingHyphen)
                        .args_from_usage("-c, --config=[FILE] 'Load from custom config file'
                                              --datasource=[FILE] 'GeoJSON text sequence file'
                                              --srid=[EPSG] 'Spatial reference system of datasource'
                                              --distance=[DIST] 'Influence radius in datasource CRS units'
                                              --cache=[DIR] 'Use tile cache in DIR'
                                              --loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'
                                              --surface=[NAME] 'Surface name'
                                              --nodes=[NUM] 'Number of generator nodes'
                                              --nodeno=[NUM] 'Number of this nodes (0 <= n < nodes)'
                                              --progress=[true|false] 'Show progress bar'
                                              --overwrite=[false|true] 'Overwrite previously cached tiles'")
                        .about("Generate tiles for cache"))
        .subcommand(SubCommand::with_name("drilldown")
                        .setting(AppSettings::AllowLeadingHyphen)
                        .args_from_usage("-c, --config=[FILE] 'Load from custom config file'
                                              --datasource=[FILE] 'GeoJSON text sequence file'
                                              --srid=[EPSG] 'Spatial reference system of datasource'
                                              --distance=[DIST] 'Influence radius in datasource CRS units'
                                              --loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'
                                              --surface=[NAME] 'Surface name'
                                              --points=[x1,y1,x2,y2,..] 'Drilldown points in grid CRS'
                                              --progress=[true|false] 'Show progress bar'")
                        .about("Surface statistics"));

    match app.get_matches_from_safe_borrow(env::args()) {
        //app.get_matches() prohibits later call of app.print_help()
        Result::Err(e) => {
            println!("{}", e);
        }
        Result::Ok(matches) => match matches.subcommand() {
            ("genconfig", Some(sub_m)) => {
                init_logger(sub_m);
                match heatmap_service::gen_config(sub_m) {
                    Ok(config) => println!("{}", config),
                    Err(e) => exit_with_error(&e),
                }
            }
            ("generate", Some(sub_m)) => {
                init_logger(sub_m);
                generate(sub_m);
            }
            ("drilldown", Some(sub_m)) => {
                init_logger(sub_m);
                drilldown(sub_m);
            }
            _ => {
                let _ = app.print_help();
                println!("");
            }
        },
    }
}
