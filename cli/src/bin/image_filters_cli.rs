use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use image_filters::{
    Dispatcher, FilterCatalog, FilterEnvironment, ServerConfig, Strictness, logging, test_image,
};
use image_filters_cli::params_to_map;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (.toml or .json); defaults to IMAGE_FILTERS_CONFIG
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Directory for outputs and the test image
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Surface bad inputs and failed saves instead of substituting fallbacks
    #[arg(long, global = true)]
    strict: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply one filter to an image
    Apply {
        /// Filter name, e.g. blur or edge_detection
        filter: String,
        /// Path to the input image
        image_path: String,
        /// Where to save the result
        #[arg(short, long)]
        output: Option<String>,
        /// Filter parameter as name=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    /// List the available filters and their parameters
    List,
    /// Create the gradient test image if it does not exist yet
    CreateTestImage {
        /// Directory to create it in (defaults to the writable directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(logging::env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Apply { filter, image_path, output, params } => {
            let dispatcher = Dispatcher::new(FilterEnvironment::initialize(&load_config(&cli)?));
            let invocation = dispatcher.invoke_named(
                filter,
                image_path,
                output.clone(),
                params_to_map(params)?,
            )?;
            println!("{}", invocation.message());
        }
        Commands::List => list_filters(),
        Commands::CreateTestImage { dir } => {
            let config = load_config(&cli)?;
            let path = match dir {
                Some(dir) => test_image::ensure_test_image(&dir.join(&config.test_image_name))?,
                None => FilterEnvironment::initialize(&config).ensure_test_image()?,
            };
            println!("Test image at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::from_env()?,
    };
    if let Some(dir) = &cli.output_dir {
        config.output_dir = Some(dir.clone());
    }
    if cli.strict {
        config.strictness = Strictness::Strict;
    }
    info!("Running in {} mode", config.strictness);
    Ok(config)
}

fn list_filters() {
    for descriptor in FilterCatalog::new().descriptors() {
        println!("{:<16}{}", descriptor.name, descriptor.description);
        for param in descriptor.parameters {
            println!(
                "{:<16}  --param {}=<{}>  (default {})  {}",
                "",
                param.name,
                param.type_name,
                serde_json::to_string(&param.default).unwrap_or_default(),
                param.description
            );
        }
    }
}
