/// Stem of the bridge library; the host loads it as `ocr_bridge`.
pub const LIB_STEM: &str = "ocr_bridge";

/// Platform file name of the bridge library for a `target_os` value.
pub fn shared_library_name(target_os: &str) -> String {
    match target_os {
        "windows" => format!("{LIB_STEM}.dll"),
        "macos" | "ios" => format!("lib{LIB_STEM}.dylib"),
        _ => format!("lib{LIB_STEM}.so"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_names() {
        assert_eq!(shared_library_name("windows"), "ocr_bridge.dll");
        assert_eq!(shared_library_name("macos"), "libocr_bridge.dylib");
        assert_eq!(shared_library_name("android"), "libocr_bridge.so");
        assert_eq!(shared_library_name("linux"), "libocr_bridge.so");
    }
}
