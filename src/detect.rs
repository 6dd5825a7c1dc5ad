// src/detect.rs

//! File type probes and magic-byte signatures
//!
//! Type and MIME detection go through the external `file` tool so the
//! diagnostics report carries its output verbatim; the signature helpers
//! read the leading bytes directly.

use crate::tool::run_tool;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// RAR magic: "Rar!" 1A 07
pub const RAR_MAGIC: [u8; 6] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07];
/// ZIP local file header magic: "PK" 03 04
pub const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
/// 7-Zip magic: "7z" BC AF 27 1C
pub const SEVENZ_MAGIC: [u8; 6] = [0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C];

/// Number of leading bytes shown in the diagnostic signature
pub const SIGNATURE_LEN: usize = 16;

/// Human-readable file type from `file -b`, used verbatim in diagnostics.
pub fn detected_type(path: &Path) -> String {
    match run_tool("file", [Path::new("-b").as_os_str(), path.as_os_str()], None) {
        Ok(out) if out.success() => out.stdout.trim().to_string(),
        _ => "unknown (file tool unavailable)".to_string(),
    }
}

/// MIME type from `file -b --mime-type`, used both for diagnostics and to
/// gate the MIME-specific extraction strategies.
pub fn mime_type(path: &Path) -> String {
    let args = [
        Path::new("-b").as_os_str(),
        Path::new("--mime-type").as_os_str(),
        path.as_os_str(),
    ];
    match run_tool("file", args, None) {
        Ok(out) if out.success() => out.stdout.trim().to_string(),
        _ => "unknown".to_string(),
    }
}

/// Read up to the first [`SIGNATURE_LEN`] bytes of a file.
pub fn read_signature(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut buffer = Vec::with_capacity(SIGNATURE_LEN);
    file.take(SIGNATURE_LEN as u64).read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Render bytes as uppercase space-separated hex, e.g. "52 61 72 21".
pub fn format_signature(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn formats_signature_uppercase_space_separated() {
        assert_eq!(format_signature(&RAR_MAGIC), "52 61 72 21 1A 07");
        assert_eq!(format_signature(&ZIP_MAGIC), "50 4B 03 04");
        assert_eq!(format_signature(&SEVENZ_MAGIC), "37 7A BC AF 27 1C");
        assert_eq!(format_signature(&[]), "");
    }

    #[test]
    fn reads_at_most_sixteen_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.cbr");
        let mut f = File::create(&path).unwrap();
        f.write_all(&[0xAA; 100]).unwrap();
        let sig = read_signature(&path).unwrap();
        assert_eq!(sig.len(), SIGNATURE_LEN);
        assert!(sig.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn short_file_yields_short_signature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.cbr");
        std::fs::write(&path, [0x50, 0x4B]).unwrap();
        let sig = read_signature(&path).unwrap();
        assert_eq!(sig, vec![0x50, 0x4B]);
        assert_eq!(format_signature(&sig), "50 4B");
    }
}
