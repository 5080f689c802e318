//! Output writers

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use anon_core::Prediction;

use crate::{CorpusError, Result};

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_error(path, e))?;
    }
    let file = File::create(path).map_err(|e| write_error(path, e))?;
    Ok(BufWriter::new(file))
}

fn write_error(path: &Path, source: std::io::Error) -> CorpusError {
    CorpusError::WriteError {
        path: path.display().to_string(),
        source,
    }
}

/// Write predictions as JSON lines, one `{"id", "pred"}` object per line
pub fn write_predictions(path: &Path, predictions: &[Prediction]) -> Result<()> {
    let mut writer = create(path)?;

    for prediction in predictions {
        serde_json::to_writer(&mut writer, prediction)?;
        writer.write_all(b"\n").map_err(|e| write_error(path, e))?;
    }
    writer.flush().map_err(|e| write_error(path, e))?;

    info!(path = %path.display(), count = predictions.len(), "Wrote predictions");
    Ok(())
}

/// Write any report as pretty-printed JSON
pub fn write_json_report<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n").map_err(|e| write_error(path, e))?;
    writer.flush().map_err(|e| write_error(path, e))?;

    info!(path = %path.display(), "Wrote report");
    Ok(())
}
