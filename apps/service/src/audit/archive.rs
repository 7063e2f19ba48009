//! Archive codec: gzip, then base64 so archives stay text-safe.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

use super::LogError;

/// Extension of rotated archives
pub const ARCHIVE_EXTENSION: &str = "gz.b64";

/// Compress raw log contents into archive text
pub fn compress(contents: &[u8]) -> Result<String, LogError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(contents)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

/// Recover the original log contents from archive text
pub fn decompress(archive: &str) -> Result<Vec<u8>, LogError> {
    let compressed = STANDARD.decode(archive.trim())?;
    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut contents = Vec::new();
    decoder.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Archive id for a check's log rotated at `rotated_at` (epoch millis)
pub fn archive_id(check_id: &str, rotated_at: i64) -> String {
    format!("{check_id}-{rotated_at}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_preserves_bytes() {
        let samples: [&[u8]; 4] = [
            b"",
            b"{\"state\":\"up\"}\n{\"state\":\"down\"}\n",
            "multi-byte \u{1F600} text\n".as_bytes(),
            &[0, 159, 146, 150, 255, 10],
        ];

        for sample in samples {
            let archived = compress(sample).unwrap();
            assert_eq!(decompress(&archived).unwrap(), sample);
        }
    }

    #[test]
    fn test_archive_is_text_safe() {
        let archived = compress(&[0u8, 1, 2, 255, 254]).unwrap();
        assert!(archived.chars().all(|c| c.is_ascii_alphanumeric() || "+/=".contains(c)));
    }

    #[test]
    fn test_large_input_roundtrip() {
        let line = b"{\"check\":{\"id\":\"12345678901234567890\"},\"alert\":false}\n";
        let contents: Vec<u8> = line.iter().copied().cycle().take(line.len() * 5_000).collect();

        let archived = compress(&contents).unwrap();
        assert!(archived.len() < contents.len());
        assert_eq!(decompress(&archived).unwrap(), contents);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(decompress("not base64!"), Err(LogError::Decode(_))));
        assert!(decompress(&STANDARD.encode(b"not gzip")).is_err());
    }

    #[test]
    fn test_archive_id() {
        assert_eq!(archive_id("abc", 1_700_000_000_000), "abc-1700000000000");
    }
}
