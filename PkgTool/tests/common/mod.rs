//! Shared fixtures for integration tests
//!
//! `FakeBackend` opens small text files describing a package:
//!
//! ```text
//! title=CUSA00001
//! entries=25
//! fail=3,7
//! panic=5
//! header=fail
//! spawn=late.pkg
//! ```
//!
//! Only `title` and `entries` are required. Failing entries return an error,
//! panicking entries panic, `header=fail` makes the header step fail, and
//! `spawn` writes another valid package next to this one when it is opened.
//! Successful entries write `entry_<index>.txt` into the output directory.

#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pkgtool::extract::{BatchReporter, ExtractProgress, PackageSummary, PackageTask};
use pkgtool::package::{PackageBackend, PackageHandle};
use pkgtool::{Error, PackageError, Result};

pub struct FakeBackend;

impl PackageBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn extension(&self) -> &'static str {
        "pkg"
    }

    fn open(&self, path: &Path) -> Result<Box<dyn PackageHandle>> {
        let text = fs::read_to_string(path)?;
        let handle = FakeHandle::parse(&text)?;

        if let Some(name) = &handle.spawn {
            let sibling = path.with_file_name(name);
            fs::write(sibling, describe("CUSA99999", 1))?;
        }
        Ok(Box::new(handle))
    }
}

pub struct FakeHandle {
    title_id: String,
    entry_count: u32,
    failing: HashSet<u32>,
    panicking: HashSet<u32>,
    header_fails: bool,
    spawn: Option<String>,
    output_dir: Option<PathBuf>,
}

impl FakeHandle {
    fn parse(text: &str) -> Result<Self> {
        let mut title_id = None;
        let mut entry_count = None;
        let mut handle = Self {
            title_id: String::new(),
            entry_count: 0,
            failing: HashSet::new(),
            panicking: HashSet::new(),
            header_fails: false,
            spawn: None,
            output_dir: None,
        };

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "title" => title_id = Some(value.trim().to_string()),
                "entries" => entry_count = value.trim().parse().ok(),
                "fail" => handle.failing = parse_indices(value),
                "panic" => handle.panicking = parse_indices(value),
                "header" => handle.header_fails = value.trim() == "fail",
                "spawn" => handle.spawn = Some(value.trim().to_string()),
                _ => {}
            }
        }

        match (title_id, entry_count) {
            (Some(title_id), Some(entry_count)) => Ok(Self {
                title_id,
                entry_count,
                ..handle
            }),
            _ => Err(Error::InvalidMetadata("not a fake package".to_string())),
        }
    }
}

fn parse_indices(value: &str) -> HashSet<u32> {
    value
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect()
}

impl PackageHandle for FakeHandle {
    fn title_id(&self) -> &str {
        &self.title_id
    }

    fn pkg_size(&self) -> u64 {
        u64::from(self.entry_count) * 16
    }

    fn pkg_flags(&self) -> u32 {
        0
    }

    fn number_of_files(&self) -> u32 {
        self.entry_count
    }

    fn extract_header(&mut self, output_dir: &Path) -> Result<()> {
        if self.header_fails {
            return Err(Error::Io(io::Error::other("simulated header failure")));
        }
        fs::write(output_dir.join("header.txt"), &self.title_id)?;
        self.output_dir = Some(output_dir.to_path_buf());
        Ok(())
    }

    fn extract_entry(&self, index: u32) -> Result<()> {
        let output_dir = self.output_dir.as_ref().ok_or(Error::HeaderNotExtracted)?;
        if self.panicking.contains(&index) {
            panic!("simulated panic in entry {index}");
        }
        if self.failing.contains(&index) {
            return Err(Error::Io(io::Error::other(format!(
                "simulated failure in entry {index}"
            ))));
        }
        fs::write(output_dir.join(format!("entry_{index}.txt")), index.to_string())?;
        Ok(())
    }
}

/// Minimal fake package description
pub fn describe(title_id: &str, entries: u32) -> String {
    format!("title={title_id}\nentries={entries}\n")
}

/// Write a fake package file and return its path
pub fn write_fake(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Reporter that records every event
#[derive(Default)]
pub struct RecordingReporter {
    pub started: Mutex<Vec<PathBuf>>,
    pub progress: Mutex<Vec<ExtractProgress>>,
    pub finished: Mutex<Vec<(PathBuf, bool)>>,
}

impl RecordingReporter {
    pub fn finished(&self) -> Vec<(PathBuf, bool)> {
        self.finished.lock().unwrap().clone()
    }

    pub fn progress_events(&self) -> Vec<ExtractProgress> {
        self.progress.lock().unwrap().clone()
    }
}

impl BatchReporter for RecordingReporter {
    fn package_started(&self, task: &PackageTask, _position: usize, _total: usize) {
        self.started.lock().unwrap().push(task.source_path.clone());
    }

    fn progress(&self, progress: &ExtractProgress) {
        self.progress.lock().unwrap().push(progress.clone());
    }

    fn package_finished(&self, task: &PackageTask, result: &std::result::Result<PackageSummary, PackageError>) {
        let succeeded = result.as_ref().is_ok_and(PackageSummary::is_success);
        self.finished
            .lock()
            .unwrap()
            .push((task.source_path.clone(), succeeded));
    }
}
