//! Command line arguments backing the `ocr-bridge` binary.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::android::{AndroidAbi, DEFAULT_API_LEVEL};

#[derive(Parser, Debug)]
#[command(
  name = "ocr-bridge",
  about = "Run images through the OCR bridge and package it for Android",
  version
)]
pub struct Args {
  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Print version information
  Version,
  /// Run images through the bridge and print one JSON result per line
  Process {
    /// Images to process
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Minimum confidence passed through to the engine
    #[arg(long, default_value_t = 0.5)]
    min_confidence: f32,

    /// Directory holding det.onnx, rec.onnx and dict.txt
    #[arg(long, env = "OCR_BRIDGE_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Text detection model, overrides --model-dir
    #[arg(long, env = "OCR_BRIDGE_DET_MODEL")]
    det_model: Option<PathBuf>,

    /// Text recognition model, overrides --model-dir
    #[arg(long, env = "OCR_BRIDGE_REC_MODEL")]
    rec_model: Option<PathBuf>,

    /// Character dictionary, overrides --model-dir
    #[arg(long, env = "OCR_BRIDGE_DICT")]
    dict: Option<PathBuf>,
  },
  /// Cross-compile the bridge library for Android and install it into jniLibs
  Android {
    /// Target ABIs (default: all supported)
    #[arg(long = "abi", env = "ANDROID_ABI", value_delimiter = ',')]
    abis: Vec<AndroidAbi>,

    /// Android API level, as `24` or `android-24`
    #[arg(long, env = "ANDROID_PLATFORM", default_value_t = DEFAULT_API_LEVEL, value_parser = parse_api_level)]
    platform: u32,

    /// NDK root (default: ANDROID_NDK_HOME, ANDROID_NDK_ROOT, then ANDROID_HOME/ndk)
    #[arg(long)]
    ndk: Option<PathBuf>,

    /// Android source set receiving jniLibs/<abi>/
    #[arg(long, short = 'o', default_value = "android/app/src/main")]
    out: PathBuf,

    /// Cargo target directory holding the build output
    #[arg(long, default_value = "target")]
    target_dir: PathBuf,

    /// Cargo executable
    #[arg(long, env = "CARGO", default_value = "cargo")]
    cargo: String,

    /// Extra features for the bridge crate (e.g. `oar`)
    #[arg(long, value_delimiter = ',')]
    features: Vec<String>,

    /// Print the build plan as JSON without running anything
    #[arg(long)]
    dry_run: bool,
  },
}

fn parse_api_level(value: &str) -> Result<u32, String> {
  value
    .trim()
    .trim_start_matches("android-")
    .parse()
    .map_err(|_| format!("invalid API level `{value}`"))
}
