//! Delivery of generated files, standing in for a browser download.

use log::*;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;

pub const JSON_MIME: &str = "application/json";

pub trait Exporter {
    fn export(&mut self, file_name: &str, content: &str, mime: &str) -> Result<()>;
}

/// Writes every exported file into one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryExporter {
    dir: PathBuf,
}

impl DirectoryExporter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl Exporter for DirectoryExporter {
    fn export(&mut self, file_name: &str, content: &str, mime: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        fs::write(&path, content)?;
        info!("wrote {} ({}, {} bytes)", path.display(), mime, content.len());
        Ok(())
    }
}

/// Keeps exported files in memory, keyed by name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryExporter {
    pub files: BTreeMap<String, (String, String)>,
}

impl Exporter for MemoryExporter {
    fn export(&mut self, file_name: &str, content: &str, mime: &str) -> Result<()> {
        self.files
            .insert(file_name.to_string(), (content.to_string(), mime.to_string()));
        Ok(())
    }
}
