use std::fs;
use std::io;

/// Supplies the authoritative bytes for a key when the cache misses.
///
/// Implementations are called outside the cache lock and may block on I/O.
pub trait ContentSource: Send + Sync {
    fn load(&self, key: &str) -> io::Result<Vec<u8>>;
}

/// Treats the key as a filesystem path and reads the whole file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl ContentSource for FsSource {
    fn load(&self, key: &str) -> io::Result<Vec<u8>> {
        fs::read(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn fs_source_reads_raw_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc\n\xffdef").unwrap();

        let path = file.path().to_str().unwrap();
        assert_eq!(FsSource.load(path).unwrap(), b"abc\n\xffdef");
    }

    #[test]
    fn fs_source_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        let err = FsSource.load(missing.to_str().unwrap()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
