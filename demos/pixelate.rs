#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use pixiart::{
    export::{self, DEFAULT_SCALE_FACTOR},
    raster, Error, PaletteSize, PipelineConfig, Resolution, Sharpen, MAX_RESOLUTION_INDEX,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
pub struct Options {
    /// Resolution index, the output is 2^(4 + index) pixels wide
    #[arg(short, long, default_value_t = Resolution::DEFAULT.index(), value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_RESOLUTION_INDEX)))]
    resolution: u8,

    /// Number of colors in the palette
    #[arg(short, long, default_value_t = PaletteSize::default(), value_parser = parse_palette_size)]
    k: PaletteSize,

    /// Edge detail in percent
    #[arg(short, long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
    detail: u8,

    /// Upscale factor of the saved image
    #[arg(long, default_value_t = DEFAULT_SCALE_FACTOR)]
    scale: u32,

    /// Seed for the k-means random source
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Worker threads, 0 uses the rayon default
    #[arg(short, long, default_value_t = 0)]
    threads: u8,

    /// Log debug output, unless RUST_LOG is set
    #[arg(long)]
    verbose: bool,

    input: PathBuf,

    #[arg(default_value = "pixi-art.png")]
    output: PathBuf,
}

fn parse_palette_size(s: &str) -> Result<PaletteSize, String> {
    let value: u16 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pixiart=debug,pixelate=debug" } else { "pixiart=info,pixelate=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(options: Options) -> Result<(), Error> {
    let Options { resolution, k, detail, scale, seed, threads, input, output, .. } = options;

    let config = PipelineConfig::new()
        .resolution(Resolution::new(resolution)?)
        .palette_size(k)
        .sharpen(Sharpen::from_percent(detail)?)
        .seed(seed)
        .scale_factor(scale);

    let time = std::time::Instant::now();
    let image = raster::load(&input)?;

    let pixel_art = match threads {
        0 => raster::pixelate_par(&image, &config)?,
        1 => raster::pixelate(&image, &config)?,
        t => match rayon::ThreadPoolBuilder::new().num_threads(t.into()).build() {
            Ok(pool) => pool.install(|| raster::pixelate_par(&image, &config))?,
            Err(e) => {
                tracing::warn!("failed to build thread pool, using the global pool: {e}");
                raster::pixelate_par(&image, &config)?
            }
        },
    };

    tracing::debug!(millis = time.elapsed().as_millis(), "pixelated image");

    export::save_png(&pixel_art, config.scale_factor, &output)
}

fn main() -> ExitCode {
    let options = Options::parse();
    init_tracing(options.verbose);

    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
