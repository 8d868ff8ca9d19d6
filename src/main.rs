use clap::{Parser, Subcommand};
use cropflow::api::{ImagePicker, request_json};
use cropflow::crop::CenterCropSurface;
use cropflow::imaging::RustBackend;
use cropflow::local::{FileCamera, FileListSelection, collect_images};
use cropflow::scratch::ScratchDir;
use cropflow::{config, output};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cropflow")]
#[command(about = "Pick, crop, and compress images to a size budget")]
#[command(long_about = "\
Pick, crop, and compress images to a size budget

Each selected image goes through the same pipeline:

  crop (cropEnabled) → circular mask (cropType = \"circular\")
    → scale to fit maxWidth×maxHeight → compress toward maxFileSize

Cropping here is a center crop: square for circular output, the full frame
otherwise. Results land in the scratch directory as CropImage_*.jpg (or .png
for circular output). One failing image never stops the rest.

Run 'cropflow gen-config' to generate a documented options file.
Set RUST_LOG=cropflow=debug to trace pipeline phases and encode attempts.")]
#[command(version)]
struct Cli {
    /// Options file (TOML, camelCase keys)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for intermediate and final images
    #[arg(long, default_value = ".cropflow-scratch", global = true)]
    scratch: PathBuf,

    /// Images processed at once (default: all cores)
    #[arg(long, global = true)]
    jobs: Option<usize>,

    /// Print the bridge JSON response instead of a summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process existing images (directories are searched recursively)
    Pick {
        /// Allow more than one image, overriding multipleImage
        #[arg(long)]
        multiple: bool,

        paths: Vec<PathBuf>,
    },
    /// Process a single photo as if it came from the camera
    Capture { photo: PathBuf },
    /// Print a stock options file with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cropflow=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    let mut overrides = match &cli.config {
        Some(path) => config::load_options_file(path)?,
        None => Value::Object(Map::new()),
    };

    let (selection, camera) = match &cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_options_toml());
            return Ok(());
        }
        Command::Pick { multiple, paths } => {
            if *multiple {
                if let Value::Object(map) = &mut overrides {
                    map.insert("multipleImage".to_string(), Value::Bool(true));
                }
            }
            (FileListSelection::new(collect_images(paths)), FileCamera::new(""))
        }
        Command::Capture { photo } => (FileListSelection::new(Vec::new()), FileCamera::new(photo)),
    };

    let jobs = config::effective_threads(cli.jobs);
    init_thread_pool(jobs);

    let picker = ImagePicker::new(
        RustBackend::new(),
        Arc::new(selection),
        Arc::new(camera),
        Arc::new(CenterCropSurface::new()),
        ScratchDir::new(&cli.scratch)?,
        jobs,
    );
    picker.configure(&overrides);

    let result = match cli.command {
        Command::Capture { .. } => picker.capture_image().await,
        _ => picker.pick_image().await,
    };

    if cli.json {
        let json = request_json(&result, picker.config().multiple_image);
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        match &result {
            Ok(response) => output::print_batch_response(response),
            Err(e) => output::print_request_error(e),
        }
    }

    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

/// Size the rayon pool used inside image transforms to the job count.
fn init_thread_pool(threads: usize) {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
