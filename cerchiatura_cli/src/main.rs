//! # Cerchiatura CLI
//!
//! Runs a local-intervention verification on a JSON request file and prints
//! a readable report followed by the JSON result.
//!
//! ```text
//! cerchiatura [-v] [--json] [--materials <store.json>] <request.json>
//! cerchiatura materials [--materials <store.json>]
//! cerchiatura calculators
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use cerchiatura_core::analysis::CalculationService;
use cerchiatura_core::materials::{MaterialStore, MaterialsDb};
use cerchiatura_core::project::load_request;
use cerchiatura_core::reinforcement::CalculatorRegistry;

const USAGE: &str = "\
Usage:
  cerchiatura [-v] [--json] [--materials <store.json>] <request.json>
  cerchiatura materials [--materials <store.json>]
  cerchiatura calculators

Options:
  -v, --verbose      log progress (RUST_LOG overrides)
  --json             print only the JSON result
  --materials PATH   custom-materials store (default: $CERCHIATURA_HOME or ~/.cerchiatura)";

#[derive(Debug, Default)]
struct Args {
    verbose: bool,
    json_only: bool,
    materials: Option<PathBuf>,
    command: Command,
}

#[derive(Debug, Default)]
enum Command {
    #[default]
    Help,
    Analyze(PathBuf),
    Materials,
    Calculators,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-v" | "--verbose" => args.verbose = true,
            "--json" => args.json_only = true,
            "--materials" => {
                let path = it.next().context("--materials needs a path")?;
                args.materials = Some(PathBuf::from(path));
            }
            "-h" | "--help" => args.command = Command::Help,
            "materials" => args.command = Command::Materials,
            "calculators" => args.command = Command::Calculators,
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            path => args.command = Command::Analyze(PathBuf::from(path)),
        }
    }
    Ok(args)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn open_materials(path: Option<PathBuf>) -> Result<MaterialsDb> {
    let db = match path {
        Some(path) => MaterialsDb::open(MaterialStore::at(path)),
        None => MaterialsDb::open_default(),
    };
    db.context("Cannot open the custom materials store")
}

fn run_analysis(path: PathBuf, materials: MaterialsDb, json_only: bool) -> Result<bool> {
    let request = load_request(&path).with_context(|| format!("Cannot load {}", path.display()))?;
    let registry = CalculatorRegistry::with_defaults();
    let service = CalculationService::new(&registry, &materials);

    log::info!("Analyzing {} with {} calculators", path.display(), registry.len());
    let result = service.analyze(&request).context("Analysis failed")?;

    if !json_only {
        println!("Cerchiatura - NTC 2018 §8.4.1 local intervention check");
        println!("=======================================================");
        println!();
        println!("{}", result.summary());
        println!();
        println!("JSON Output:");
    }
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(result.is_valid() && result.verification.is_local)
}

fn list_materials(materials: &MaterialsDb) {
    for category in materials.categories() {
        println!("{}", category);
        for (key, m) in materials.by_category(&category) {
            let tag = if m.custom { " [Personalizzato]" } else { "" };
            println!(
                "  {:<22} {}{}  fcm={} tau0={} E={} G={} w={}",
                key, m.name, tag, m.fcm, m.tau0, m.e, m.g, m.w
            );
        }
    }
    if let Some(store) = materials.store() {
        println!();
        println!("Custom materials: {}", store.path().display());
    }
}

fn run(args: Args) -> Result<bool> {
    match args.command {
        Command::Help => {
            println!("{}", USAGE);
            Ok(true)
        }
        Command::Calculators => {
            println!("{}", CalculatorRegistry::with_defaults().info());
            Ok(true)
        }
        Command::Materials => {
            list_materials(&open_materials(args.materials)?);
            Ok(true)
        }
        Command::Analyze(path) => run_analysis(path, open_materials(args.materials)?, args.json_only),
    }
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };
    init_logging(args.verbose);

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("[FAIL] {:#}", e);
            if let Some(calc_err) = e.downcast_ref::<cerchiatura_core::CalcError>() {
                if let Ok(json) = serde_json::to_string_pretty(calc_err) {
                    eprintln!();
                    eprintln!("Error JSON:");
                    eprintln!("{}", json);
                }
            }
            ExitCode::from(2)
        }
    }
}
