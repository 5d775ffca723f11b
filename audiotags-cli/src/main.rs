use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use audiotags::{File, ImageFormat};

#[derive(Parser)]
#[command(
    name = "audiotags",
    about = "Print tags, cover art and audio properties of an audio file"
)]
struct Cli {
    /// Path to the audio file
    input: PathBuf,
    /// Save the embedded cover to this path (PNG)
    #[arg(long, value_name = "PATH")]
    extract_cover: Option<PathBuf>,
    /// Embed this image as the front cover
    #[arg(long, value_name = "IMAGE", conflicts_with = "remove_cover")]
    set_cover: Option<PathBuf>,
    /// Encoding used for --set-cover
    #[arg(long, value_enum, default_value_t = CoverFormat::Jpeg)]
    format: CoverFormat,
    /// Remove every embedded picture
    #[arg(long)]
    remove_cover: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CoverFormat {
    Jpeg,
    Png,
}

impl From<CoverFormat> for ImageFormat {
    fn from(f: CoverFormat) -> Self {
        match f {
            CoverFormat::Jpeg => ImageFormat::Jpeg,
            CoverFormat::Png => ImageFormat::Png,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("error reading file: {0}")]
    Open(audiotags::Error),
    #[error("no supported media in file")]
    NoMedia,
    #[error("error reading cover: {0}")]
    Cover(audiotags::Error),
    #[error("{0}")]
    Tags(#[from] audiotags::Error),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let mut file = File::open(&cli.input).map_err(CliError::Open)?;

    if !file.has_media() {
        return Err(CliError::NoMedia);
    }

    cmd_show(&file)?;

    if let Some(out) = &cli.extract_cover {
        cmd_extract_cover(&file, out)?;
    }
    if let Some(img) = &cli.set_cover {
        cmd_set_cover(&mut file, img, cli.format.into())?;
    }
    if cli.remove_cover {
        file.remove_pictures()?;
        log::info!("removed embedded pictures from {}", cli.input.display());
    }

    file.close();
    Ok(())
}

fn cmd_show(file: &File) -> Result<(), CliError> {
    println!();
    println!("Tags:");
    for (tag, values) in file.read_tags() {
        println!("{tag}: {values:?}");
    }

    if let Some(cover) = file.read_image().map_err(CliError::Cover)? {
        println!("Cover: {}x{}", cover.width(), cover.height());
    }

    let props = file.read_properties();
    println!();
    println!("Props:");
    println!("Bitrate: {}", props.bitrate);
    println!("Length: {}", props.length);
    println!("Samplerate: {}", props.sample_rate);
    println!("Channels: {}", props.channels);
    Ok(())
}

fn cmd_extract_cover(file: &File, out: &Path) -> Result<(), CliError> {
    let Some(cover) = file.read_image().map_err(CliError::Cover)? else {
        log::warn!("no embedded cover to extract");
        return Ok(());
    };
    let png = audiotags::picture::encode(&cover, ImageFormat::Png)?;
    fs::write(out, png).map_err(|source| CliError::Io {
        path: out.to_path_buf(),
        source,
    })?;
    log::info!("wrote cover to {}", out.display());
    Ok(())
}

fn cmd_set_cover(file: &mut File, path: &Path, format: ImageFormat) -> Result<(), CliError> {
    let bytes = fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let img = audiotags::picture::decode(&bytes)?;
    file.write_image(&img, format)?;
    log::info!(
        "embedded {}x{} cover from {}",
        img.width(),
        img.height(),
        path.display()
    );
    Ok(())
}
