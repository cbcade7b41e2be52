use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use zstd::stream::write::Encoder as ZstdEncoder;

/// Output encoding for JSONL files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Jsonl,
    Zst,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Zst => "jsonl.zst",
        }
    }
}

enum Sink {
    Plain(BufWriter<File>),
    Zst(ZstdEncoder<'static, BufWriter<File>>),
}

/// Buffered NDJSON writer, one serialized value per line, optionally zstd-compressed.
pub struct NdjsonWriter {
    path: PathBuf,
    sink: Sink,
    lines: u64,
}

impl NdjsonWriter {
    /// Create (truncate) `path`, creating parent directories.
    pub fn create(path: &Path, format: ExportFormat, buf_bytes: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let w = BufWriter::with_capacity(buf_bytes.max(8 * 1024), f);
        let sink = match format {
            ExportFormat::Jsonl => Sink::Plain(w),
            ExportFormat::Zst => Sink::Zst(ZstdEncoder::new(w, 3).context("zstd encoder")?),
        };
        Ok(Self { path: path.to_path_buf(), sink, lines: 0 })
    }

    pub fn write_value<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let w: &mut dyn Write = match &mut self.sink {
            Sink::Plain(w) => w,
            Sink::Zst(w) => w,
        };
        serde_json::to_writer(&mut *w, value)?;
        w.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    /// Flush (and finish the zstd frame). Returns the number of lines written.
    pub fn finish(self) -> Result<u64> {
        let flushed = match self.sink {
            Sink::Plain(mut w) => w.flush(),
            Sink::Zst(enc) => enc.finish().and_then(|mut w| w.flush()),
        };
        flushed.with_context(|| format!("flush {}", self.path.display()))?;
        Ok(self.lines)
    }
}
