//! Command-line interface: inspect PSD files and render them to images.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::{GrayImage, RgbImage, RgbaImage};
use tracing::info;
use tracing_subscriber::EnvFilter;

use flatpsd::{ChannelKind, Psd, PsdError};

#[derive(Parser)]
#[command(name = "flatpsd", version, about = "Parse and flatten Photoshop documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print summary information about a PSD file
    Info {
        /// Path to the PSD file
        psd: PathBuf,
        /// Dump the parsed document as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Flatten the document's layer tree and write it as an image
    Render {
        /// Path to the PSD file
        psd: PathBuf,
        /// Output image path; the format is inferred from the extension
        output: PathBuf,
        /// Replace the output file if it already exists
        #[arg(long)]
        overwrite: bool,
    },
    /// Render each layer to its own image in a folder
    Layers {
        /// Path to the PSD file
        psd: PathBuf,
        /// Output folder
        output_dir: PathBuf,
        /// Output extension
        #[arg(long, default_value = "png")]
        extension: String,
        /// Also render hidden layers
        #[arg(long)]
        include_hidden: bool,
        /// Also render each layer's mask
        #[arg(long)]
        render_masks: bool,
        /// Replace output files that already exist
        #[arg(long)]
        overwrite: bool,
    },
    /// Write the merged image stored in the file's final section
    Merged {
        /// Path to the PSD file
        psd: PathBuf,
        /// Output image path
        output: PathBuf,
        /// Replace the output file if it already exists
        #[arg(long)]
        overwrite: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Info { psd, json } => print_info(&psd, json),
        Command::Render {
            psd,
            output,
            overwrite,
        } => render(&psd, &output, overwrite),
        Command::Layers {
            psd,
            output_dir,
            extension,
            include_hidden,
            render_masks,
            overwrite,
        } => layers(
            &psd,
            &output_dir,
            &extension,
            include_hidden,
            render_masks,
            overwrite,
        ),
        Command::Merged {
            psd,
            output,
            overwrite,
        } => merged(&psd, &output, overwrite),
    }
}

fn print_info(path: &Path, json: bool) -> Result<()> {
    let psd = Psd::from_path(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&psd)?);
        return Ok(());
    }

    println!("path: {}", path.display());
    println!("resolution: {}x{}", psd.width(), psd.height());
    println!("channels: {}", psd.channel_count());
    println!("bits per channel: {}", psd.depth());
    println!("color mode: {:?}", psd.color_mode());
    println!("layers:");
    for layer in psd.layers().iter().rev() {
        println!(
            "- {} [{}]{}",
            layer.name(),
            layer.blend_mode().name(),
            if layer.visible() { "" } else { " (hidden)" },
        );
    }

    Ok(())
}

fn render(path: &Path, output: &Path, overwrite: bool) -> Result<()> {
    let psd = Psd::from_path(path)?;
    let rgba = psd.flatten()?;

    check_overwrite(output, overwrite)?;
    write_rgba(output, psd.width(), psd.height(), rgba)?;
    info!(output = %output.display(), "rendered document");

    Ok(())
}

fn layers(
    path: &Path,
    output_dir: &Path,
    extension: &str,
    include_hidden: bool,
    render_masks: bool,
    overwrite: bool,
) -> Result<()> {
    let psd = Psd::from_path(path)?;
    std::fs::create_dir_all(output_dir)?;

    let extension = extension.trim_start_matches('.');

    for layer in psd.iter_layers() {
        if !layer.visible() && !include_hidden {
            continue;
        }

        let name = sanitize_layer_name(layer.name());
        let layer_path = output_dir.join(format!("{name}.{extension}"));
        check_overwrite(&layer_path, overwrite)?;

        let rgba = layer.rgba()?;
        let (width, height) = (layer.width(), layer.height());

        if layer.has_alpha() {
            write_rgba(&layer_path, width, height, rgba)?;
        } else {
            let rgb = rgba
                .chunks_exact(4)
                .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                .collect();
            let image = RgbImage::from_raw(width, height, rgb)
                .context("layer raster does not match its dimensions")?;
            image.save(&layer_path)?;
        }
        info!(layer = layer.name(), output = %layer_path.display(), "rendered layer");

        if render_masks {
            if let (Some(mask), Some(channel)) = (
                layer.mask(),
                layer.channel(ChannelKind::UserSuppliedLayerMask),
            ) {
                let mask_path = output_dir.join(format!("{name}_mask.{extension}"));
                check_overwrite(&mask_path, overwrite)?;

                let image =
                    GrayImage::from_raw(mask.rect().width(), mask.rect().height(), channel.data().to_vec())
                        .context("mask raster does not match its rect")?;
                image.save(&mask_path)?;
            }
        }
    }

    Ok(())
}

fn merged(path: &Path, output: &Path, overwrite: bool) -> Result<()> {
    let psd = Psd::from_path(path)?;
    let (data, channels) = psd.merged_image()?;

    check_overwrite(output, overwrite)?;
    let (width, height) = (psd.width(), psd.height());

    match channels {
        1 => GrayImage::from_raw(width, height, data)
            .context("merged raster does not match the canvas")?
            .save(output)?,
        3 => RgbImage::from_raw(width, height, data)
            .context("merged raster does not match the canvas")?
            .save(output)?,
        _ => RgbaImage::from_raw(width, height, data)
            .context("merged raster does not match the canvas")?
            .save(output)?,
    }

    Ok(())
}

fn check_overwrite(path: &Path, overwrite: bool) -> Result<()> {
    if !overwrite && path.exists() {
        return Err(PsdError::OutputExists {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

fn write_rgba(path: &Path, width: u32, height: u32, rgba: Vec<u8>) -> Result<()> {
    let image = RgbaImage::from_raw(width, height, rgba)
        .context("raster does not match its dimensions")?;
    image.save(path)?;
    Ok(())
}

/// Keep layer names filesystem-friendly: word characters, '~' and spaces.
fn sanitize_layer_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '~' || *c == '_' || c.is_whitespace())
        .collect()
}
