mod android;
mod artifact;
mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Commands};
use ocr_bridge::{init_logging, serialize_or_fallback, EngineConfig, OcrBridge, OcrEngine};
use tracing::warn;

use android::{AndroidAbi, BuildPlan, NdkToolchain};

fn main() {
  init_logging();

  let args = Args::parse();

  match run(args) {
    Ok(true) => {}
    Ok(false) => std::process::exit(1),
    Err(e) => {
      eprintln!("Error: {:#}", e);
      std::process::exit(1);
    }
  }
}

/// Returns `Ok(false)` when the command ran but produced failures.
fn run(args: Args) -> Result<bool> {
  match args.command {
    Commands::Version => {
      println!("ocr-bridge {}", env!("CARGO_PKG_VERSION"));
      Ok(true)
    }
    Commands::Process {
      images,
      min_confidence,
      model_dir,
      det_model,
      rec_model,
      dict,
    } => {
      let config = EngineConfig {
        model_dir,
        det_model,
        rec_model,
        dict_path: dict,
      };
      Ok(process(&images, min_confidence, config))
    }
    Commands::Android {
      abis,
      platform,
      ndk,
      out,
      target_dir,
      cargo,
      features,
      dry_run,
    } => {
      let toolchain = NdkToolchain::locate(ndk.as_deref(), |key| std::env::var_os(key))
        .context("locating Android NDK")?;
      let abis = if abis.is_empty() { AndroidAbi::ALL.to_vec() } else { abis };

      for abi in abis {
        let plan = BuildPlan::new(&toolchain, abi, platform, &target_dir, &out)?;
        if dry_run {
          println!("{}", serde_json::to_string(&plan)?);
          continue;
        }
        let installed = plan
          .execute(&cargo, &features)
          .with_context(|| format!("packaging {abi}"))?;
        println!("{}", installed.display());
      }
      Ok(true)
    }
  }
}

fn process(images: &[PathBuf], min_confidence: f32, config: EngineConfig) -> bool {
  let bridge = OcrBridge::new(config, OcrEngine::from_config);
  let mut all_ok = true;

  for image in images {
    let result = bridge.process_image(&image.to_string_lossy(), min_confidence);
    if !result.is_success() {
      warn!(image = %image.display(), "OCR returned an error");
      all_ok = false;
    }
    println!("{}", serialize_or_fallback(&result));
  }
  all_ok
}
