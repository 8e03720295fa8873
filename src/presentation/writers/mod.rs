use crate::domain::{change_log::ChangeLogPage, ports::OutputWriter};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use self::{html::HtmlWriter, json::JsonWriter};

pub mod html;
pub mod json;

/// Register available writers
pub fn all_writers() -> Vec<Box<dyn OutputWriter>> {
    vec![Box::new(JsonWriter), Box::new(HtmlWriter)]
}

pub fn writer_for(format: &str) -> Option<Box<dyn OutputWriter>> {
    match format {
        "json" => Some(Box::new(JsonWriter)),
        "html" => Some(Box::new(HtmlWriter)),
        _ => None,
    }
}

/// Writes the page to `<dir>/<report_id>.<ext>` and returns the path.
pub fn write_to_file(writer: &dyn OutputWriter, page: &ChangeLogPage, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output dir {}", dir.display()))?;

    let content = writer.format(page)?;
    let path = dir.join(format!("{}.{}", page.report_id, writer.extension()));
    fs::write(&path, &content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
