#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Builder for `svn log --xml --verbose` style fixtures.
#[derive(Default)]
pub struct SvnLogBuilder {
    body: String,
    next_revision: u64,
}

impl SvnLogBuilder {
    pub fn new() -> Self {
        Self {
            body: String::new(),
            next_revision: 1,
        }
    }

    /// Add an entry with a raw `<date>` text (or none) and the given paths.
    pub fn entry(mut self, date: Option<&str>, paths: &[&str]) -> Self {
        self.body.push_str(&entry_xml(self.next_revision, date, paths));
        self.next_revision += 1;
        self
    }

    pub fn build(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<log>\n{}</log>\n",
            self.body
        )
    }

    pub fn write_to(&self, dir: &Path, filename: &str) -> Result<PathBuf> {
        let file_path = dir.join(filename);
        fs::write(&file_path, self.build())?;
        Ok(file_path)
    }
}

pub fn entry_xml(revision: u64, date: Option<&str>, paths: &[&str]) -> String {
    let mut xml = format!("<logentry revision=\"{revision}\">\n<author>dev</author>\n");
    if let Some(date) = date {
        xml.push_str(&format!("<date>{date}</date>\n"));
    }
    xml.push_str("<paths>\n");
    for path in paths {
        xml.push_str(&format!(
            "<path action=\"M\" prop-mods=\"false\" text-mods=\"true\" kind=\"file\">{path}</path>\n"
        ));
    }
    xml.push_str("</paths>\n<msg>change</msg>\n</logentry>\n");
    xml
}

/// Write a log with `entries` generated entries without building it in memory.
pub fn write_large_log(path: &Path, entries: u64) -> Result<()> {
    let mut out = BufWriter::new(fs::File::create(path)?);
    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<log>")?;
    for i in 0..entries {
        let date = format!("2024-{:02}-{:02}T12:00:00.000000Z", i % 12 + 1, i % 28 + 1);
        let a = format!("/trunk/src/module{}.rs", i % 25);
        let b = format!("/tags/1.{}/README", i % 5);
        out.write_all(entry_xml(i + 1, Some(&date), &[&a, &b]).as_bytes())?;
    }
    writeln!(out, "</log>")?;
    out.flush()?;
    Ok(())
}

/// The three-entry scenario: in-range, out-of-range, unparseable date.
pub fn mixed_scenario() -> SvnLogBuilder {
    SvnLogBuilder::new()
        .entry(Some("2024-01-15T10:30:00.000000Z"), &["/trunk/a.py", "/tags/a.py"])
        .entry(Some("2023-06-01T08:00:00.000000Z"), &["/trunk/a.py"])
        .entry(Some("not a date"), &["/trunk/a.py"])
}
