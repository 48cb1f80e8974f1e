use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};

use ifs_core::{
    decode_image, encode_image, inspect, Channels, Compression, DecodeOptions, EncodeOptions, Metadata,
    PixelBuffer,
};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "ifs",
    about = "IFS image containers: delta-coded, compressed, optionally encrypted raw pixels",
    version
)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode raw interleaved 8-bit samples into an IFS container
    Encode {
        /// Raw sample file, row-major and channel-interleaved ("-" reads stdin)
        input: PathBuf,
        /// Destination IFS file
        output: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Samples per pixel: 3 (RGB) or 4 (RGBA)
        #[arg(short, long, default_value_t = 3)]
        channels: u8,
        /// Compression: store | fast | balanced | high-ratio
        #[arg(short = 'z', long, default_value = "fast")]
        compression: Compression,
        /// Encrypt the payload with this password
        #[arg(short, long, env = "IFS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Mark the container as stripped of source metadata (advisory)
        #[arg(long)]
        delete_metadata: bool,
    },
    /// Decode an IFS container back to raw interleaved samples
    Decode {
        /// Source IFS file
        input: PathBuf,
        /// Destination raw sample file ("-" writes to stdout)
        output: PathBuf,
        /// Password for encrypted containers
        #[arg(short, long, env = "IFS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Print the header of an IFS container
    Inspect {
        /// IFS file to inspect
        file: PathBuf,
        /// Emit the metadata as JSON
        #[arg(long)]
        json: bool,
    },
    /// Encode a raw image with every compression option and report sizes
    Compare {
        /// Raw sample file ("-" reads stdin)
        input: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(short, long, default_value_t = 3)]
        channels: u8,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    let buf = if path.to_str() == Some("-") {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        buf
    } else {
        fs::read(path).with_context(|| format!("reading input file {:?}", path))?
    };
    log::debug!("read {} bytes from {:?}", buf.len(), path);
    Ok(buf)
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if path.to_str() == Some("-") {
        let mut out = io::stdout().lock();
        out.write_all(bytes)?;
        out.flush()?;
        Ok(())
    } else {
        fs::write(path, bytes).with_context(|| format!("writing output file {:?}", path))
    }
}

fn load_raw(input: &Path, width: u32, height: u32, channels: u8) -> anyhow::Result<PixelBuffer> {
    let layout = Channels::from_count(channels)
        .with_context(|| format!("unsupported channel count {}, expected 3 or 4", channels))?;
    let samples = read_input(input)?;
    PixelBuffer::new(width, height, layout, samples)
        .with_context(|| format!("interpreting {:?} as {}x{}x{}", input, width, height, channels))
}

fn ratio(raw: usize, packed: usize) -> f64 {
    if packed == 0 {
        return 1.0;
    }
    raw as f64 / packed as f64
}

// ── Subcommand implementations ─────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn run_encode(
    input: PathBuf,
    output: PathBuf,
    width: u32,
    height: u32,
    channels: u8,
    compression: Compression,
    password: Option<String>,
    delete_metadata: bool,
) -> anyhow::Result<()> {
    let image = load_raw(&input, width, height, channels)?;
    let encrypted = password.is_some();
    let options = EncodeOptions {
        password,
        compression,
        delete_metadata,
        ..EncodeOptions::default()
    };

    let t0 = Instant::now();
    let blob = encode_image(&image, &options)?;
    let elapsed = t0.elapsed();
    write_output(&output, &blob)?;

    let raw = image.samples().len();
    eprintln!("  image       : {}x{}x{}", width, height, channels);
    eprintln!("  compression : {} ({})", compression, compression.codec().name());
    eprintln!("  encrypted   : {}", encrypted);
    eprintln!("  raw size    : {}", human_bytes(raw as u64));
    eprintln!("  container   : {}", human_bytes(blob.len() as u64));
    eprintln!("  ratio       : {:.2}x", ratio(raw, blob.len()));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_decode(input: PathBuf, output: PathBuf, password: Option<String>) -> anyhow::Result<()> {
    let blob = read_input(&input)?;
    let t0 = Instant::now();
    let image = decode_image(&blob, &DecodeOptions { password })
        .with_context(|| format!("decoding {:?}", input))?;
    let elapsed = t0.elapsed();
    write_output(&output, image.samples())?;

    eprintln!(
        "  image       : {}x{}x{}",
        image.width(),
        image.height(),
        image.channels().count()
    );
    eprintln!("  raw size    : {}", human_bytes(image.samples().len() as u64));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_inspect(file: PathBuf, json: bool) -> anyhow::Result<()> {
    let blob = read_input(&file)?;
    let meta: Metadata = inspect(&blob).with_context(|| format!("reading header of {:?}", file))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
        return Ok(());
    }

    let raw = meta.sample_count()?;
    println!("=== IFS container: {:?} ===", file);
    println!();
    println!("  dimensions      : {}x{}", meta.width, meta.height);
    println!("  channels        : {} ({:?})", meta.channels.count(), meta.channels);
    println!("  compression     : {} (id={})", meta.compression, meta.compression.id());
    println!("  encrypted       : {}", meta.encrypted);
    if meta.encrypted {
        println!("  kdf rounds      : {}", meta.kdf_iterations);
    }
    println!("  delete metadata : {}", meta.delete_metadata);
    println!("  raw size        : {}", human_bytes(raw as u64));
    println!("  file size       : {}", human_bytes(blob.len() as u64));
    println!("  ratio           : {:.2}x", ratio(raw, blob.len()));
    Ok(())
}

fn run_compare(input: PathBuf, width: u32, height: u32, channels: u8) -> anyhow::Result<()> {
    let image = load_raw(&input, width, height, channels)?;
    let raw = image.samples().len();

    println!();
    println!("=== Compression comparison: {}x{}x{} ({}) ===", width, height, channels, human_bytes(raw as u64));
    println!(
        "  {:>12}  {:>12}  {:>8}  {:>10}  {:>10}",
        "option", "container", "ratio", "encode", "decode"
    );
    println!("  {}", "-".repeat(60));
    for compression in Compression::ALL {
        let options = EncodeOptions::default().with_compression(compression);
        let t0 = Instant::now();
        let blob = encode_image(&image, &options)?;
        let encode_ms = t0.elapsed().as_secs_f64() * 1000.0;

        let t1 = Instant::now();
        let back = decode_image(&blob, &DecodeOptions::default())?;
        let decode_ms = t1.elapsed().as_secs_f64() * 1000.0;
        anyhow::ensure!(back == image, "{} round-trip mismatch", compression);

        println!(
            "  {:>12}  {:>12}  {:>7.2}x  {:>8.2}ms  {:>8.2}ms",
            compression.as_str(),
            human_bytes(blob.len() as u64),
            ratio(raw, blob.len()),
            encode_ms,
            decode_ms
        );
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    match cli.command {
        Commands::Encode {
            input,
            output,
            width,
            height,
            channels,
            compression,
            password,
            delete_metadata,
        } => run_encode(
            input,
            output,
            width,
            height,
            channels,
            compression,
            password,
            delete_metadata,
        ),
        Commands::Decode {
            input,
            output,
            password,
        } => run_decode(input, output, password),
        Commands::Inspect { file, json } => run_inspect(file, json),
        Commands::Compare {
            input,
            width,
            height,
            channels,
        } => run_compare(input, width, height, channels),
    }
}
