//! pifs CLI - fractal compression of grayscale images

use clap::{Parser, Subcommand};
use pifs::{Compressed, Compressor, PifsConfig, PifsError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pifs", about = "Fractal (PIFS) image compression")]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a square image into transform records (JSON)
    Compress {
        /// Input image file
        input: PathBuf,
        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        encode: EncodeArgs,
    },
    /// Reconstruct an image from transform records
    Decompress {
        /// Input JSON file
        input: PathBuf,
        /// Output image file
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Compress and decompress an image, reporting the reconstruction error
    Roundtrip {
        /// Input image file
        input: PathBuf,
        /// Output image file
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        encode: EncodeArgs,
        #[command(flatten)]
        decode: DecodeArgs,
    },
}

#[derive(clap::Args)]
struct EncodeArgs {
    /// JSON configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Range block size in pixels
    #[arg(short, long)]
    range: Option<usize>,
    /// Domain block size in pixels (twice the range size)
    #[arg(short, long)]
    domain: Option<usize>,
    /// Use fixed-contrast fitting instead of least squares
    #[arg(long)]
    simple: bool,
    /// Image channel to compress (0-3)
    #[arg(short, long)]
    channel: Option<usize>,
}

#[derive(clap::Args)]
struct DecodeArgs {
    /// Number of decode iterations
    #[arg(short, long)]
    iterations: Option<usize>,
    /// Seed for the random starting grid
    #[arg(short, long)]
    seed: Option<u64>,
}

impl EncodeArgs {
    fn apply(&self, mut config: PifsConfig) -> Result<PifsConfig, PifsError> {
        if let Some(path) = &self.config {
            config = PifsConfig::from_json_file(path)?;
        }
        if let Some(range) = self.range {
            config.range_block_size = range;
            // keep the 2:1 ratio unless the domain is given explicitly
            config.domain_block_size = 2 * range;
        }
        if let Some(domain) = self.domain {
            config.domain_block_size = domain;
        }
        if self.simple {
            config.use_simple_fit = true;
        }
        if let Some(channel) = self.channel {
            config.channel = channel;
        }
        Ok(config)
    }
}

impl DecodeArgs {
    fn apply(&self, mut config: PifsConfig) -> PifsConfig {
        if let Some(iterations) = self.iterations {
            config.decode_iterations = iterations;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }
}

fn main() -> Result<(), PifsError> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match args.command {
        Command::Compress { input, output, encode } => {
            let compressor = Compressor::from_config(encode.apply(PifsConfig::default())?);
            let compressed = compressor.compress_image(&image::open(&input)?)?;
            compressed.write_json_file(&output)?;
            println!(
                "Wrote {} transform records to {}",
                compressed.records.len(),
                output.display()
            );
        }
        Command::Decompress { input, output, decode } => {
            let compressor = Compressor::from_config(decode.apply(PifsConfig::default()));
            let compressed = Compressed::read_json_file(&input)?;
            compressor.decompress_image(&compressed)?.save(&output)?;
            println!("Wrote {0}x{0} image to {1}", compressed.dimension, output.display());
        }
        Command::Roundtrip { input, output, encode, decode } => {
            let config = decode.apply(encode.apply(PifsConfig::default())?);
            let compressor = Compressor::from_config(config);
            let image = image::open(&input)?;
            let original = pifs::SampleGrid::from_image(&image, compressor.config().channel)?;
            let compressed = compressor.compress(&original)?;
            let restored = compressor.decompress(&compressed)?;
            restored.to_luma8().save(&output)?;
            println!("MSE: {:.6}", restored.mse(&original)?);
        }
    }

    Ok(())
}
