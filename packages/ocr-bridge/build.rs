use std::env;
use std::path::PathBuf;

fn ndk_root() -> Option<PathBuf> {
    ["ANDROID_NDK_HOME", "ANDROID_NDK_ROOT"]
        .iter()
        .filter_map(|var| env::var_os(var))
        .map(PathBuf::from)
        .find(|p| p.is_dir())
}

fn host_tag() -> &'static str {
    let host = env::var("HOST").unwrap_or_default();
    if host.contains("windows") {
        "windows-x86_64"
    } else if host.contains("apple") {
        // The NDK ships a single (universal) darwin-x86_64 toolchain.
        "darwin-x86_64"
    } else {
        "linux-x86_64"
    }
}

fn sysroot_triple(target_arch: &str) -> Option<&'static str> {
    match target_arch {
        "aarch64" => Some("aarch64-linux-android"),
        "arm" => Some("arm-linux-androideabi"),
        "x86" => Some("i686-linux-android"),
        "x86_64" => Some("x86_64-linux-android"),
        _ => None,
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for var in ["ANDROID_NDK_HOME", "ANDROID_NDK_ROOT", "ANDROID_PLATFORM"] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "android" {
        return;
    }

    println!("cargo:rustc-link-lib=dylib=log");

    // ONNX Runtime is built against the shared libc++ from the NDK.
    if env::var_os("CARGO_FEATURE_OAR").is_none() {
        return;
    }
    println!("cargo:rustc-link-lib=dylib=c++_shared");

    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    let (Some(root), Some(triple)) = (ndk_root(), sysroot_triple(&target_arch)) else {
        println!("cargo:warning=ANDROID_NDK_HOME not set, relying on the linker to find libc++_shared");
        return;
    };

    let lib_dir = root
        .join("toolchains/llvm/prebuilt")
        .join(host_tag())
        .join("sysroot/usr/lib")
        .join(triple);
    println!("cargo:rustc-link-search=native={}", lib_dir.display());
}
