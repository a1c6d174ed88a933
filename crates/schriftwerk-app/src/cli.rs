// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use schriftwerk_core::config::{PageSize, Theme};
use schriftwerk_core::types::ExportFormat;
use schriftwerk_document::ImageOp;

#[derive(Parser, Debug)]
#[command(name = "schriftwerk")]
#[command(
    author,
    version,
    about = "Extract text from images behind a policy-checked file layer"
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (config.json, usage.json, audit log)
    #[arg(long, global = true, env = "SCHRIFTWERK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recognise the text in one image
    Extract {
        image: PathBuf,

        /// Also write the text to this file
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Export format (txt, docx, pdf, rtf); defaults to the file extension
        #[arg(short, long, value_parser = parse_format)]
        format: Option<ExportFormat>,

        /// Separate recognised lines with blank lines
        #[arg(long)]
        paragraphs: bool,
    },

    /// Recognise the text in many images
    Batch {
        /// Image files, or a single folder to scan
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Write one document per image into this folder
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Export format for --out-dir; defaults to the configured format
        #[arg(short, long, value_parser = parse_format)]
        format: Option<ExportFormat>,

        /// Images processed at the same time
        #[arg(short, long, default_value = "4")]
        jobs: usize,
    },

    /// Convert a UTF-8 text file to a document
    Export {
        input: PathBuf,
        output: PathBuf,

        /// Export format; defaults to the output extension
        #[arg(short, long, value_parser = parse_format)]
        format: Option<ExportFormat>,
    },

    /// Edit an image: crop, rotate, brightness, contrast, grayscale, in that order
    Edit {
        input: PathBuf,
        output: PathBuf,

        /// Rotate clockwise by this many degrees
        #[arg(long, allow_hyphen_values = true)]
        rotate: Option<f32>,

        /// Brightness offset, -255..=255
        #[arg(long, allow_hyphen_values = true)]
        brightness: Option<i32>,

        /// Contrast factor, 1.0 leaves the image unchanged
        #[arg(long)]
        contrast: Option<f32>,

        /// Crop rectangle as x,y,width,height
        #[arg(long, value_parser = parse_crop)]
        crop: Option<ImageOp>,

        /// Convert to grayscale
        #[arg(long)]
        grayscale: bool,
    },

    /// Show what the path policy says about a path
    CheckPath {
        path: PathBuf,

        /// Check as an output path instead of an input image
        #[arg(short, long)]
        write: bool,

        /// Extension the output must have (with --write), e.g. ".pdf"
        #[arg(long, requires = "write")]
        ext: Option<String>,
    },

    /// Print the sanitised form of a file name
    Sanitize { name: String },

    /// Find (and optionally replace) text in a UTF-8 file
    Search {
        file: PathBuf,
        needle: String,

        /// Replace every match with this text
        #[arg(short, long)]
        replace: Option<String>,

        /// Write the replaced text here instead of stdout
        #[arg(short, long, requires = "replace")]
        output: Option<PathBuf>,

        #[arg(short, long)]
        case_sensitive: bool,

        #[arg(short, long)]
        whole_word: bool,
    },

    /// Show usage statistics
    Stats {
        /// Reset the statistics
        #[arg(long)]
        clear: bool,

        /// Show character, word and line counts of a text file instead
        #[arg(long, conflicts_with = "clear")]
        text: Option<PathBuf>,
    },

    /// Show recently processed images
    Recent {
        /// Forget the list
        #[arg(long)]
        clear: bool,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the configuration as JSON
    Show,
    /// Set the colour theme (light or dark)
    Theme {
        #[arg(value_parser = parse_theme)]
        theme: Theme,
    },
    /// Set the default export format
    Format {
        #[arg(value_parser = parse_format)]
        format: ExportFormat,
    },
    /// Set the PDF page size (letter or a4)
    PageSize {
        #[arg(value_parser = parse_page_size)]
        page_size: PageSize,
    },
}

/// The `edit` flags as operations, in application order: crop, rotate,
/// brightness, contrast, grayscale.
pub fn image_ops(
    rotate: Option<f32>,
    brightness: Option<i32>,
    contrast: Option<f32>,
    crop: Option<ImageOp>,
    grayscale: bool,
) -> Vec<ImageOp> {
    let mut ops = Vec::new();
    ops.extend(crop);
    ops.extend(rotate.map(ImageOp::Rotate));
    ops.extend(brightness.map(ImageOp::Brightness));
    ops.extend(contrast.map(ImageOp::Contrast));
    if grayscale {
        ops.push(ImageOp::Grayscale);
    }
    ops
}

fn parse_format(s: &str) -> Result<ExportFormat, String> {
    s.parse::<ExportFormat>()
        .map_err(|_| format!("unknown format {s:?} (txt, docx, pdf, rtf)"))
}

fn parse_theme(s: &str) -> Result<Theme, String> {
    s.parse::<Theme>().map_err(|e| e.to_string())
}

fn parse_page_size(s: &str) -> Result<PageSize, String> {
    s.parse::<PageSize>().map_err(|e| e.to_string())
}

fn parse_crop(s: &str) -> Result<ImageOp, String> {
    let parts: Vec<u32> = s
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("crop values must be whole numbers: {e}"))?;
    match parts[..] {
        [x, y, width, height] if width > 0 && height > 0 => Ok(ImageOp::Crop {
            x,
            y,
            width,
            height,
        }),
        [_, _, _, _] => Err("crop width and height must be positive".into()),
        _ => Err("crop must be x,y,width,height".into()),
    }
}
