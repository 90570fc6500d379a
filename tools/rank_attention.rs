//! Attention Ranking Tool
//!
//! Ranks every instance of an attention tensor by mean value and writes the
//! rank index in the same NumPy format the explorer exports.
//!
//! ## Output Format
//!
//! - **Rank index**: `<output>.npy` - 2-D `int64`, one row per instance:
//!   `[instance (1-based), original shape ids in descending-rank order...]`
//! - **Metadata**: `<output>_metadata.json` - counts and export timestamp
//!
//! # Usage
//!
//! ```bash
//! # Rank an attention file
//! cargo run --release --bin rank_attention -- --attention attention.npy --output ranked.npy
//!
//! # Print the top shapes per instance using saved settings
//! cargo run --release --bin rank_attention -- --attention attention.npy --output ranked.npy \
//!     --config explorer.toml
//!
//! # Generate a default settings file
//! cargo run --release --bin rank_attention -- --generate-config explorer.toml
//! ```

use shape_explorer::{ArrayStore, ExplorerConfig, RankIndex, RankIndexExporter, TensorKind};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
struct Args {
    attention: Option<PathBuf>,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args[0].clone();

    if args.len() < 2 {
        print_usage(&program);
        std::process::exit(1);
    }

    let mut parsed = Args::default();
    let mut rest = args[1..].iter();
    while let Some(flag) = rest.next() {
        let mut value = |name: &str| -> PathBuf {
            match rest.next() {
                Some(v) => PathBuf::from(v),
                None => {
                    eprintln!("Error: {name} requires a path argument");
                    std::process::exit(1);
                }
            }
        };

        match flag.as_str() {
            "--attention" => parsed.attention = Some(value("--attention")),
            "--output" => parsed.output = Some(value("--output")),
            "--config" => parsed.config = Some(value("--config")),
            "--generate-config" => {
                generate_config(&value("--generate-config"));
                return;
            }
            "--help" | "-h" => {
                print_usage(&program);
                return;
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage(&program);
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = run(parsed) {
        eprintln!("❌ Ranking failed: {e}");
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    eprintln!(
        r#"
Attention Ranking Tool

Usage:
    {program} --attention <in.npy> --output <out.npy> [--config <path.toml>]
    {program} --generate-config <path.toml>
    {program} --help

The output holds one row per instance: the 1-based instance id followed by
original shape ids, highest mean attention first.
"#
    );
}

fn generate_config(path: &Path) {
    match ExplorerConfig::default().save_toml(path) {
        Ok(()) => println!("✅ Generated default config: {}", path.display()),
        Err(e) => {
            eprintln!("Error generating config: {e}");
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(attention), Some(output)) = (args.attention, args.output) else {
        return Err("--attention and --output are both required".into());
    };

    let config = match &args.config {
        Some(path) => {
            let c = ExplorerConfig::load_toml(path)?;
            println!("✅ Loaded configuration: {}", path.display());
            c
        }
        None => ExplorerConfig::default(),
    };

    let mut store = ArrayStore::new();
    store.import_npy(TensorKind::Attention, &attention)?;
    let index = RankIndex::from_store(&store)?;

    let top = config.attention.top_count.min(index.shape_count());
    for instance in 0..index.instance_count().min(5) {
        let bars = index.top_bars(instance as i64, top as i64);
        println!("  Instance {}: {:?}", instance + 1, bars.original_ids);
    }
    if index.instance_count() > 5 {
        println!("  ... {} more instances", index.instance_count() - 5);
    }

    let written = RankIndexExporter::new()
        .with_metadata(true)
        .export(&index, &output)?;
    for path in written {
        println!("✅ Wrote {}", path.display());
    }

    Ok(())
}
