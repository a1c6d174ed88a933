// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR engine — text recognition with the `ocrs` crate, a pure-Rust engine
// backed by neural network models executed via `rten`.
//
// # Feature Gate
//
// Only compiled with the `ocr` feature:
//
// ```toml
// schriftwerk-document = { workspace = true, features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine needs two model files in one directory:
//
// - `text-detection.rten` locates text regions in the image.
// - `text-recognition.rten` decodes characters from detected regions.
//
// Running `ocrs-cli` once downloads both to the default cache directory,
// `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`). `ocr.model_dir` in
// `config.json` points elsewhere.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use schriftwerk_core::error::{Result, SchriftwerkError};
use schriftwerk_core::ports::TextExtractor;
use schriftwerk_core::types::ImageInfo;
use tracing::{debug, info, instrument};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Where to find the two model files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Both models inside `dir`, under their well-known file names.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// `model_dir` from the settings, or the default cache directory.
    pub fn from_settings(model_dir: Option<&Path>) -> Self {
        model_dir.map_or_else(Self::default, Self::from_dir)
    }

    /// Both model files must exist before the engine can be built.
    pub fn validate(&self) -> Result<()> {
        for (kind, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.is_file() {
                return Err(SchriftwerkError::MissingDependency(format!(
                    "OCR {kind} model not found; run `ocrs-cli` once to download the models, \
                     or set ocr.model_dir in config.json"
                )));
            }
        }
        Ok(())
    }
}

/// Recognises text in images.
///
/// Model loading is the expensive step. Build the engine once and share it;
/// it is `Send + Sync` and used concurrently by batch extraction.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    /// Load both models and initialise the engine.
    ///
    /// # Performance
    ///
    /// The `ocrs` and `rten` crates must be compiled in release mode. Debug
    /// builds will be extremely slow (10-100x slower).
    #[instrument(skip_all)]
    pub fn new(config: OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            SchriftwerkError::Ocr(format!("failed to load detection model: {err}"))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                SchriftwerkError::Ocr(format!("failed to load recognition model: {err}"))
            })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| SchriftwerkError::Ocr(format!("failed to initialise OCR engine: {err}")))?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    /// Recognised lines in reading order, blank lines dropped.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_lines(&self, image: &DynamicImage) -> Result<Vec<String>> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            SchriftwerkError::Ocr(format!("failed to create image source ({width}x{height}): {err}"))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| SchriftwerkError::Ocr(format!("OCR preprocessing failed: {err}")))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| SchriftwerkError::Ocr(format!("word detection failed: {err}")))?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        debug!(words = word_rects.len(), lines = line_rects.len(), "Layout found");

        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| SchriftwerkError::Ocr(format!("line recognition failed: {err}")))?;

        let lines: Vec<String> = line_texts
            .iter()
            .flatten()
            .map(|line| line.to_string())
            .filter(|text| !text.trim().is_empty())
            .collect();

        info!(recognized_lines = lines.len(), "OCR complete");
        Ok(lines)
    }
}

impl TextExtractor for OcrEngine {
    fn extract_lines(&self, image: &ImageInfo) -> Result<Vec<String>> {
        let decoded = image::open(&image.path)
            .map_err(|err| SchriftwerkError::Image(format!("failed to decode image: {err}")))?;
        self.recognize_lines(&decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_dir() {
        let config = OcrConfig::from_dir("/tmp/my-models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[test]
    fn settings_fall_back_to_default_dir() {
        assert_eq!(OcrConfig::from_settings(None), OcrConfig::default());
        assert_eq!(
            OcrConfig::from_settings(Some(Path::new("/m"))),
            OcrConfig::from_dir("/m")
        );
    }

    #[test]
    fn missing_models_are_a_missing_dependency() {
        let config = OcrConfig::from_dir("/nonexistent/path/ocr-models");
        assert!(matches!(
            config.validate(),
            Err(SchriftwerkError::MissingDependency(_))
        ));
        assert!(matches!(
            OcrEngine::new(config),
            Err(SchriftwerkError::MissingDependency(_))
        ));
    }
}
