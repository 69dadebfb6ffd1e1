//! Jet/ACE file signature validation.
//!
//! Shamela books are Access-style Jet/ACE databases under two cosmetic
//! extensions, `.bok` and `.accdb`; the bytes are what count. A real book
//! file starts with the little-endian magic `00 01 00 00` and carries an
//! engine signature string a few bytes in. Validation happens before any
//! driver process is spawned, so an unreadable file fails fast with a
//! `SourceOpen` error and touches nothing else.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use crate::{Result, ShamelaError};

/// Anything shorter than this cannot hold a Jet page map plus one table.
pub const MIN_SOURCE_FILE_SIZE: u64 = 50 * 1024;

/// Little-endian value of the leading `00 01 00 00` magic.
const JET_MAGIC: u32 = 0x0000_0100;

/// Byte offset of the engine version tag in the header page.
const VERSION_OFFSET: usize = 0x14;

/// How much of the header page is sniffed for signature strings.
const HEADER_PROBE_LEN: usize = 128;

/// Engine signature strings accepted anywhere in the header probe.
const SIGNATURES: [&[u8]; 3] = [
    b"Standard Jet DB",
    b"Standard ACE DB",
    b"Microsoft Jet DB",
];

/// Checks that `path` names a plausible Jet/ACE database file.
///
/// Fails with [`ShamelaError::SourceOpen`] when the path does not exist,
/// the file is shorter than [`MIN_SOURCE_FILE_SIZE`], or the header carries
/// neither the raw magic nor a recognised signature string. The extension
/// is never consulted.
pub fn validate_source_file(path: &Path) -> Result<()> {
    let display = path.display().to_string();

    if !path.exists() {
        return Err(ShamelaError::source_open(display, "file does not exist"));
    }

    let metadata = std::fs::metadata(path)
        .map_err(|e| ShamelaError::source_open(&display, format!("cannot stat file: {}", e)))?;
    if metadata.len() < MIN_SOURCE_FILE_SIZE {
        return Err(ShamelaError::source_open(
            display,
            format!("file too small ({} bytes) to be a book database", metadata.len()),
        ));
    }

    let mut header = [0u8; HEADER_PROBE_LEN];
    let mut file = File::open(path)
        .map_err(|e| ShamelaError::source_open(&display, format!("cannot open file: {}", e)))?;
    file.read_exact(&mut header)
        .map_err(|e| ShamelaError::source_open(&display, format!("cannot read header: {}", e)))?;

    let has_magic = LittleEndian::read_u32(&header[..4]) == JET_MAGIC;
    let has_signature = SIGNATURES
        .iter()
        .any(|sig| header.windows(sig.len()).any(|w| w == *sig));

    if !has_magic && !has_signature {
        return Err(ShamelaError::source_open(
            display,
            "no Jet/ACE signature in file header",
        ));
    }

    debug!(
        "{}: engine {}",
        path.display(),
        engine_name(LittleEndian::read_u32(&header[VERSION_OFFSET..VERSION_OFFSET + 4]))
    );
    Ok(())
}

fn engine_name(version_tag: u32) -> &'static str {
    match version_tag {
        0x00 => "Jet3",
        0x01 => "Jet4",
        0x02 | 0x03 => "ACE",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    fn book_file(header: &[u8], total_len: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        let mut bytes = vec![0u8; total_len];
        bytes[..header.len()].copy_from_slice(header);
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn jet4_header() -> Vec<u8> {
        // Magic, then the signature string at offset 4 as Jet writes it.
        let mut header = vec![0x00, 0x01, 0x00, 0x00];
        header.extend_from_slice(b"Standard Jet DB");
        header.resize(0x14, 0);
        header.push(0x01);
        header
    }

    #[test]
    fn test_accepts_jet_header() {
        let file = book_file(&jet4_header(), 64 * 1024);
        assert!(validate_source_file(file.path()).is_ok());
    }

    #[test]
    fn test_accepts_ace_signature_without_magic() {
        let mut header = vec![0xFFu8; 4];
        header.extend_from_slice(b"Standard ACE DB");
        let file = book_file(&header, 64 * 1024);
        assert!(validate_source_file(file.path()).is_ok());
    }

    #[test]
    fn test_accepts_raw_magic_alone() {
        let file = book_file(&[0x00, 0x01, 0x00, 0x00], 64 * 1024);
        assert!(validate_source_file(file.path()).is_ok());
    }

    #[test]
    fn test_rejects_missing_file() {
        let err = validate_source_file(Path::new("/nonexistent/book.bok")).unwrap_err();
        assert_eq!(err.kind(), "SourceOpenError");
    }

    #[test]
    fn test_rejects_small_file() {
        // 1 KB with no signature, as in a corrupted download
        let file = book_file(&jet4_header(), 1024);
        let err = validate_source_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), "SourceOpenError");
    }

    #[test]
    fn test_rejects_unrecognised_header() {
        let file = book_file(b"PK\x03\x04 definitely a zip", 64 * 1024);
        let err = validate_source_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), "SourceOpenError");
    }
}
