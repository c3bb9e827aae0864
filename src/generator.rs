//! Writes the sample text files the server hands out.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;

use rand::Rng;
use tracing::info;

use crate::error::GeneratorError;

/// Name of the `id`-th sample file, `file_<id>.txt`. Ids start at 1.
pub fn sample_file_name(id: u32) -> String {
    format!("file_{id}.txt")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub dir: PathBuf,
    pub files: u32,
    pub lines_per_file: usize,
    pub line_width: usize,
    pub threads: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("files"),
            files: 10,
            // ~50 chars per line, 20k lines per MB
            lines_per_file: 40_000,
            line_width: 50,
            threads: 5,
        }
    }
}

/// Generate `file_1.txt ..= file_N.txt` under `config.dir`.
///
/// Files are split into contiguous chunks, one per writer thread. Each line is
/// `line_width` random lowercase letters and a newline. Returns the paths in
/// id order.
pub fn generate(config: &GeneratorConfig) -> Result<Vec<PathBuf>, GeneratorError> {
    if config.files == 0 {
        return Err(GeneratorError::InvalidConfig(
            "file count must be > 0".into(),
        ));
    }
    if config.threads == 0 {
        return Err(GeneratorError::InvalidConfig(
            "writer thread count must be > 0".into(),
        ));
    }

    fs::create_dir_all(&config.dir)?;

    let paths: Vec<PathBuf> = (1..=config.files)
        .map(|id| config.dir.join(sample_file_name(id)))
        .collect();
    let per_thread = paths.len().div_ceil(config.threads);

    thread::scope(|s| {
        let mut handles = Vec::with_capacity(config.threads);
        for (n, chunk) in paths.chunks(per_thread).enumerate() {
            let handle = thread::Builder::new()
                .name(format!("writer-{}", n + 1))
                .spawn_scoped(s, move || -> io::Result<()> {
                    let mut rng = rand::thread_rng();
                    for path in chunk {
                        write_sample_file(
                            path,
                            config.lines_per_file,
                            config.line_width,
                            &mut rng,
                        )?;
                        info!(path = %path.display(), "created sample file");
                    }
                    Ok(())
                })?;
            handles.push(handle);
        }

        for handle in handles {
            handle.join().map_err(|_| GeneratorError::WriterPanicked)??;
        }
        Ok::<(), GeneratorError>(())
    })?;

    Ok(paths)
}

fn write_sample_file<R: Rng>(
    path: &Path,
    lines: usize,
    width: usize,
    rng: &mut R,
) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    let mut line = vec![b'\n'; width + 1];

    for _ in 0..lines {
        for b in &mut line[..width] {
            *b = rng.gen_range(b'a'..=b'z');
        }
        out.write_all(&line)?;
    }
    out.flush()
}
