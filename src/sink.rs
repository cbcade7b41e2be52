use crate::assemble::SplitDataset;
use crate::ndjson::{ExportFormat, NdjsonWriter};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Consumer of the finished dataset.
pub trait DatasetSink: Send + Sync {
    fn publish(&self, dataset: &SplitDataset, destination: &str) -> Result<()>;
}

/// Writes `<root>/<destination>/{train,test}.jsonl[.zst]`, one row per line.
#[derive(Clone, Debug)]
pub struct JsonlSink {
    root: PathBuf,
    format: ExportFormat,
    write_buffer_bytes: usize,
}

impl JsonlSink {
    pub fn new(root: impl AsRef<Path>, format: ExportFormat) -> Self {
        Self { root: root.as_ref().to_path_buf(), format, write_buffer_bytes: 256 * 1024 }
    }

    pub fn split_path(&self, destination: &str, split: &str) -> PathBuf {
        self.root.join(destination).join(format!("{}.{}", split, self.format.extension()))
    }
}

impl DatasetSink for JsonlSink {
    fn publish(&self, dataset: &SplitDataset, destination: &str) -> Result<()> {
        anyhow::ensure!(!destination.trim().is_empty(), "empty dataset destination");
        for (name, rows) in [("train", &dataset.train), ("test", &dataset.test)] {
            let path = self.split_path(destination, name);
            let mut w = NdjsonWriter::create(&path, self.format, self.write_buffer_bytes)?;
            for row in rows.iter() {
                w.write_value(row).with_context(|| format!("write {}", path.display()))?;
            }
            let n = w.finish()?;
            tracing::info!(split = name, rows = n, path = %path.display(), "split written");
        }
        Ok(())
    }
}
