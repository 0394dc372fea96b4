//! Cross-compiling the bridge library for Android ABIs with the NDK clang
//! toolchain and dropping it into the host app's `jniLibs` tree.
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::artifact::shared_library_name;

/// Lowest API level with 64-bit ABI support.
pub const MIN_API_LEVEL: u32 = 21;
pub const DEFAULT_API_LEVEL: u32 = 24;
pub const BRIDGE_PACKAGE: &str = "ocr-bridge";

#[derive(Debug, Error)]
pub enum AndroidError {
    #[error("Android NDK not found (set ANDROID_NDK_HOME or pass --ndk)")]
    NdkNotFound,
    #[error("NDK at {} has no prebuilt LLVM toolchain for {host_tag}", .root.display())]
    MissingToolchain { root: PathBuf, host_tag: String },
    #[error("compiler not found: {}", .0.display())]
    MissingCompiler(PathBuf),
    #[error("API level {level} is below the supported minimum of {min}")]
    ApiLevelTooLow { level: u32, min: u32 },
    #[error("cargo build for {target} failed with {status}")]
    BuildFailed { target: String, status: String },
    #[error("built library missing at {}", .0.display())]
    MissingArtifact(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
pub enum AndroidAbi {
    #[value(name = "arm64-v8a")]
    #[serde(rename = "arm64-v8a")]
    Arm64V8a,
    #[value(name = "armeabi-v7a")]
    #[serde(rename = "armeabi-v7a")]
    ArmeabiV7a,
    #[value(name = "x86")]
    #[serde(rename = "x86")]
    X86,
    #[value(name = "x86_64")]
    #[serde(rename = "x86_64")]
    X86_64,
}

impl AndroidAbi {
    pub const ALL: [AndroidAbi; 4] = [
        AndroidAbi::Arm64V8a,
        AndroidAbi::ArmeabiV7a,
        AndroidAbi::X86,
        AndroidAbi::X86_64,
    ];

    /// Directory name under `jniLibs/`.
    pub fn name(self) -> &'static str {
        match self {
            AndroidAbi::Arm64V8a => "arm64-v8a",
            AndroidAbi::ArmeabiV7a => "armeabi-v7a",
            AndroidAbi::X86 => "x86",
            AndroidAbi::X86_64 => "x86_64",
        }
    }

    pub fn rust_target(self) -> &'static str {
        match self {
            AndroidAbi::Arm64V8a => "aarch64-linux-android",
            AndroidAbi::ArmeabiV7a => "armv7-linux-androideabi",
            AndroidAbi::X86 => "i686-linux-android",
            AndroidAbi::X86_64 => "x86_64-linux-android",
        }
    }

    /// Prefix of the API-suffixed clang wrapper in the NDK `bin` directory.
    pub fn clang_prefix(self) -> &'static str {
        match self {
            AndroidAbi::ArmeabiV7a => "armv7a-linux-androideabi",
            other => other.rust_target(),
        }
    }
}

impl fmt::Display for AndroidAbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// NDK prebuilt directory name for the machine running the build.
pub fn host_tag() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows-x86_64"
    } else if cfg!(target_os = "macos") {
        "darwin-x86_64"
    } else {
        "linux-x86_64"
    }
}

/// Highest-versioned subdirectory of `<sdk>/ndk`, if any.
fn newest_side_by_side_ndk(sdk: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(sdk.join("ndk")).ok()?;
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .max_by_key(|p| version_key(p))
}

fn version_key(path: &Path) -> Vec<u64> {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .split('.')
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdkToolchain {
    pub root: PathBuf,
    pub host_tag: String,
}

impl NdkToolchain {
    /// Finds the NDK from, in order: `explicit`, `ANDROID_NDK_HOME`,
    /// `ANDROID_NDK_ROOT`, then the newest `ndk/<version>` under
    /// `ANDROID_HOME` or `ANDROID_SDK_ROOT`.
    pub fn locate<F>(explicit: Option<&Path>, lookup: F) -> Result<Self, AndroidError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let env_path = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        let root = explicit
            .map(Path::to_path_buf)
            .or_else(|| env_path("ANDROID_NDK_HOME"))
            .or_else(|| env_path("ANDROID_NDK_ROOT"))
            .or_else(|| {
                ["ANDROID_HOME", "ANDROID_SDK_ROOT"]
                    .iter()
                    .filter_map(|key| env_path(*key))
                    .find_map(|sdk| newest_side_by_side_ndk(&sdk))
            })
            .ok_or(AndroidError::NdkNotFound)?;

        Self::at(root, host_tag())
    }

    pub fn at(root: PathBuf, host_tag: &str) -> Result<Self, AndroidError> {
        let toolchain = Self {
            root,
            host_tag: host_tag.to_string(),
        };
        if !toolchain.prebuilt().is_dir() {
            return Err(AndroidError::MissingToolchain {
                root: toolchain.root,
                host_tag: toolchain.host_tag,
            });
        }
        debug!(root = %toolchain.root.display(), "using Android NDK");
        Ok(toolchain)
    }

    fn prebuilt(&self) -> PathBuf {
        self.root
            .join("toolchains")
            .join("llvm")
            .join("prebuilt")
            .join(&self.host_tag)
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.prebuilt().join("bin")
    }

    pub fn sysroot(&self) -> PathBuf {
        self.prebuilt().join("sysroot")
    }

    fn is_windows(&self) -> bool {
        self.host_tag.starts_with("windows")
    }

    pub fn clang(&self, abi: AndroidAbi, api_level: u32) -> PathBuf {
        let ext = if self.is_windows() { ".cmd" } else { "" };
        self.bin_dir()
            .join(format!("{}{}-clang{}", abi.clang_prefix(), api_level, ext))
    }

    pub fn ar(&self) -> PathBuf {
        let ext = if self.is_windows() { ".exe" } else { "" };
        self.bin_dir().join(format!("llvm-ar{ext}"))
    }
}

/// Everything needed to build and install the library for one ABI.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub abi: AndroidAbi,
    pub target: String,
    pub api_level: u32,
    pub linker: PathBuf,
    pub env: Vec<(String, String)>,
    pub cargo_args: Vec<String>,
    pub artifact: PathBuf,
    pub destination: PathBuf,
}

impl BuildPlan {
    pub fn new(
        toolchain: &NdkToolchain,
        abi: AndroidAbi,
        api_level: u32,
        target_dir: &Path,
        out_dir: &Path,
    ) -> Result<Self, AndroidError> {
        if api_level < MIN_API_LEVEL {
            return Err(AndroidError::ApiLevelTooLow {
                level: api_level,
                min: MIN_API_LEVEL,
            });
        }

        let target = abi.rust_target();
        let triple_key = target.replace('-', "_");
        let clang = toolchain.clang(abi, api_level);
        let ar = toolchain.ar();
        let lib_name = shared_library_name("android");

        let env = vec![
            (
                format!("CARGO_TARGET_{}_LINKER", triple_key.to_uppercase()),
                clang.display().to_string(),
            ),
            (format!("CC_{triple_key}"), clang.display().to_string()),
            (format!("AR_{triple_key}"), ar.display().to_string()),
            (
                format!("CFLAGS_{triple_key}"),
                format!("--sysroot={}", toolchain.sysroot().display()),
            ),
            (
                "ANDROID_NDK_HOME".to_string(),
                toolchain.root.display().to_string(),
            ),
            ("ANDROID_PLATFORM".to_string(), api_level.to_string()),
        ];

        let cargo_args = [
            "build",
            "--release",
            "--target",
            target,
            "-p",
            BRIDGE_PACKAGE,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        Ok(Self {
            abi,
            target: target.to_string(),
            api_level,
            linker: clang,
            env,
            cargo_args,
            artifact: target_dir.join(target).join("release").join(&lib_name),
            destination: out_dir.join("jniLibs").join(abi.name()).join(&lib_name),
        })
    }

    /// Shell-style rendering, for `--dry-run` and logs.
    pub fn command_line(&self, cargo: &str) -> String {
        let env = self
            .env
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        format!("{env} {cargo} {}", self.cargo_args.join(" "))
    }

    /// Runs the cross build and copies the library into place.
    pub fn execute(&self, cargo: &str, features: &[String]) -> Result<PathBuf, AndroidError> {
        if !self.linker.is_file() {
            return Err(AndroidError::MissingCompiler(self.linker.clone()));
        }

        let mut command = Command::new(cargo);
        command
            .args(&self.cargo_args)
            .envs(self.env.iter().map(|(k, v)| (k, v)));
        if !features.is_empty() {
            command.arg("--features").arg(features.join(","));
        }

        info!(abi = %self.abi, target = %self.target, "building bridge library");
        debug!(command = %self.command_line(cargo), "running cargo");
        let status = command.status()?;
        if !status.success() {
            return Err(AndroidError::BuildFailed {
                target: self.target.clone(),
                status: status.to_string(),
            });
        }

        if !self.artifact.is_file() {
            return Err(AndroidError::MissingArtifact(self.artifact.clone()));
        }
        if let Some(parent) = self.destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&self.artifact, &self.destination)?;
        info!(destination = %self.destination.display(), "installed bridge library");
        Ok(self.destination.clone())
    }
}
