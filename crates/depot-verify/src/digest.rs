use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::{Hasher, Result, Sha256Hasher, VerifyError};

const BUFFER_SIZE: usize = 64 * 1024;

pub fn digest_bytes(data: &[u8]) -> String { hex::encode(Sha256Hasher::digest(data)) }

/// Hash everything `reader` yields through a fixed-size buffer.
pub fn digest_reader(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha256Hasher::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }
    Ok(hasher.finalize_hex())
}

/// Stream a file through SHA-256. The file is never loaded whole.
pub fn digest_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let read_err = |source| VerifyError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_err)?;
    digest_reader(file).map_err(read_err)
}

/// Check a file against an expected hex digest.
pub fn verify_file(path: impl AsRef<Path>, expected: &str) -> Result<()> {
    let actual = digest_file(path)?;
    if digests_match(expected, &actual) {
        Ok(())
    } else {
        Err(VerifyError::Mismatch {
            expected: expected.trim().to_ascii_lowercase(),
            actual,
        })
    }
}

/// Compare two hex digests, ignoring case and surrounding whitespace.
pub fn digests_match(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}
