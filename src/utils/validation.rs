/// Extensions the deployment meant to allow before the filter was switched
/// off. Retained so re-enabling is a one-constant change.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "gif", "png", "txt", "pdf", "zip", "7z", "tar", "tgz", "pt", "safetensor",
];

/// The allow-list is never consulted: the filter ships disabled and every
/// extension is accepted.
pub const EXTENSION_FILTER_ENABLED: bool = false;

/// Lowercased substring after the last `.` of `file_name`; empty when the
/// name carries no extension.
pub fn file_extension(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) => file_name[idx + 1..].to_lowercase(),
        None => String::new(),
    }
}

pub fn extension_allowed(extension: &str) -> bool {
    if !EXTENSION_FILTER_ENABLED {
        return true;
    }
    ALLOWED_EXTENSIONS.contains(&extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("a.txt"), "txt");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("MALWARE.EXE"), "exe");
        assert_eq!(file_extension(".bashrc"), "bashrc");
        assert_eq!(file_extension("trailing."), "");
        assert_eq!(file_extension("noextension"), "");
        assert_eq!(file_extension("日本語.PnG"), "png");
    }

    #[test]
    fn test_every_extension_is_accepted() {
        // The filter is disabled: names far outside the allow-list pass.
        assert!(extension_allowed("exe"));
        assert!(extension_allowed("php"));
        assert!(extension_allowed(""));
        assert!(extension_allowed("txt"));
    }
}
