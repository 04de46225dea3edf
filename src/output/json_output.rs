//! JSON export of crawl results
//!
//! Writes a single document holding the run summary and every crawled page,
//! for consumption by downstream audit tooling.

use crate::crawler::CrawledPage;
use crate::output::traits::{CrawlSummary, OutputHandler, OutputResult};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct CrawlReport<'a> {
    summary: &'a CrawlSummary,
    pages: &'a [CrawledPage],
}

/// Writes the crawl as pretty-printed JSON
pub struct JsonOutput {
    path: PathBuf,
}

impl JsonOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputHandler for JsonOutput {
    fn name(&self) -> &'static str {
        "json"
    }

    fn write(&self, summary: &CrawlSummary, pages: &[CrawledPage]) -> OutputResult<()> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        write_json_report(&mut writer, summary, pages)?;
        writer.flush()?;
        Ok(())
    }
}

/// Serializes the report into any writer
pub fn write_json_report<W: Write>(
    writer: W,
    summary: &CrawlSummary,
    pages: &[CrawledPage],
) -> OutputResult<()> {
    serde_json::to_writer_pretty(writer, &CrawlReport { summary, pages })?;
    Ok(())
}
