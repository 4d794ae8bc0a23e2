use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::process::ExitCode;

use pass_o_mat::config::Config;
use pass_o_mat::predict::{
    evaluate_visibility, PassEngine, Sgp4Provider, TleLoader, TrackedObject, VisibilityOptions,
};
use pass_o_mat::web::{run_server, AppState};

#[derive(Parser)]
#[command(name = "pass-o-mat")]
#[command(about = "Satellite visibility and pass prediction")]
struct Cli {
    /// Station configuration file
    #[arg(short, long, default_value = "pass-o-mat.yaml")]
    config: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List loaded objects
    Objects,
    /// Predict passes for every loaded object
    Passes {
        /// Start time (RFC3339), defaults to now
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// Window length in hours, defaults to the configured horizon
        #[arg(long)]
        hours: Option<f64>,
        /// Minimum elevation in degrees
        #[arg(long)]
        min_elevation: Option<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Look angles of one object
    Look {
        /// Catalog number
        id: String,
        /// Time (RFC3339), defaults to now
        #[arg(long)]
        time: Option<DateTime<Utc>>,
        #[arg(long)]
        json: bool,
    },
    /// Serve the prediction API
    Serve,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config {}: {}", cli.config, e);
            return ExitCode::FAILURE;
        }
    };

    let mut loader = TleLoader::new(config.predict.tle_folder.clone());
    if let Err(e) = loader.load_all() {
        eprintln!("Error loading elements: {}", e);
        return ExitCode::FAILURE;
    }

    match cli.command {
        Commands::Objects => objects(&loader),
        Commands::Passes {
            start,
            hours,
            min_elevation,
            json,
        } => passes(&config, &loader, start, hours, min_elevation, json),
        Commands::Look { id, time, json } => look(&config, &loader, &id, time, json),
        Commands::Serve => serve(config, loader),
    }
}

fn objects(loader: &TleLoader) -> ExitCode {
    for object in loader.objects() {
        println!(
            "{:>6}  {:<24} {:<12} launched {:<6} epoch {}",
            object.id,
            object.name,
            object.category.map(|c| c.to_string()).unwrap_or_default(),
            object
                .elements
                .launch_year()
                .map(|y| y.to_string())
                .unwrap_or_else(|| "?".into()),
            object
                .elements
                .epoch()
                .map(|e| e.to_rfc3339())
                .unwrap_or_else(|| "invalid".into()),
        );
    }
    ExitCode::SUCCESS
}

fn passes(
    config: &Config,
    loader: &TleLoader,
    start: Option<DateTime<Utc>>,
    hours: Option<f64>,
    min_elevation: Option<f64>,
    json: bool,
) -> ExitCode {
    let observer = match config.observer() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut options = match config.scan_options(&observer) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(min_elevation) = min_elevation {
        options = options.with_min_elevation(min_elevation);
    }

    let objects: Vec<TrackedObject> = loader.objects().into_iter().cloned().collect();
    let start = start.unwrap_or_else(Utc::now);
    let hours = hours.unwrap_or_else(|| config.predict.horizon_hours());

    let report = match PassEngine::new(Sgp4Provider)
        .with_options(options)
        .run(&objects, &observer, start, hours)
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if json {
        return print_json(&report);
    }

    for pass in &report.passes {
        println!(
            "{}  {:<24} {} -> {}  max {:>5.1}° at {}  {:>6.1} min  {}{}",
            pass.start_time.format("%Y-%m-%d"),
            pass.object.name,
            pass.start_time.format("%H:%M"),
            pass.end_time.format("%H:%M"),
            pass.peak_elevation_deg,
            pass.peak_time.format("%H:%M"),
            pass.duration_minutes,
            pass.compass_direction,
            if pass.truncated { " (ongoing)" } else { "" },
        );
    }
    for failure in &report.failures {
        eprintln!("skipped {} ({}): {}", failure.object_name, failure.object_id, failure.reason);
    }
    println!("{} passes", report.passes.len());
    ExitCode::SUCCESS
}

fn look(
    config: &Config,
    loader: &TleLoader,
    id: &str,
    time: Option<DateTime<Utc>>,
    json: bool,
) -> ExitCode {
    let Some(object) = loader.get(id) else {
        eprintln!("Unknown object: {}", id);
        return ExitCode::FAILURE;
    };
    let (observer, options) = match config
        .observer()
        .and_then(|o| config.scan_options(&o).map(|s| (o, s)))
    {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let options = VisibilityOptions {
        min_elevation_deg: options.min_elevation_deg,
        aperture: options.aperture,
        strategy: options.strategy,
    };

    let sample = match evaluate_visibility(
        &Sgp4Provider,
        object,
        &observer,
        time.unwrap_or_else(Utc::now),
        &options,
    ) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if json {
        return print_json(&sample);
    }
    println!(
        "{} at {}: az {:.1}° el {:.1}° range {:.0} km, {}",
        object.name,
        sample.time.to_rfc3339(),
        sample.azimuth_deg,
        sample.elevation_deg,
        sample.range_km,
        if sample.visible { "visible" } else { "not visible" }
    );
    ExitCode::SUCCESS
}

fn serve(config: Config, loader: TleLoader) -> ExitCode {
    let state = match AppState::new(config, loader) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(run_server(state)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            ExitCode::FAILURE
        }
    }
}
