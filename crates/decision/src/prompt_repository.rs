//! Named strategy templates loaded from a directory of `.txt` files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptTemplate {
    /// File stem.
    pub id: String,
    /// First non-empty line, or the id.
    pub name: String,
    pub content: String,
}

impl PromptTemplate {
    #[must_use]
    pub fn from_content(id: impl Into<String>, content: impl Into<String>) -> Self {
        let id = id.into();
        let content = content.into();
        let name = content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map_or_else(|| id.clone(), str::to_string);
        Self { id, name, content }
    }
}

/// Template store shared between traders.
#[derive(Debug)]
pub struct PromptRepository {
    dir: PathBuf,
    templates: RwLock<HashMap<String, PromptTemplate>>,
}

impl PromptRepository {
    /// Loads every template in `dir`.
    ///
    /// # Errors
    /// Fails when the directory cannot be read. Individual unreadable files
    /// are skipped with a warning.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let templates = read_templates(&dir)?;
        info!(dir = %dir.display(), count = templates.len(), "Loaded prompt templates");
        Ok(Self {
            dir,
            templates: RwLock::new(templates),
        })
    }

    /// Repository with no backing files.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            dir: PathBuf::new(),
            templates: RwLock::new(HashMap::new()),
        }
    }

    /// Adds or replaces a template in memory.
    pub fn insert(&self, template: PromptTemplate) {
        self.templates.write().insert(template.id.clone(), template);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<PromptTemplate> {
        self.templates.read().get(id).cloned()
    }

    /// Template ids, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.templates.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All templates, sorted by id.
    #[must_use]
    pub fn all(&self) -> Vec<PromptTemplate> {
        let mut all: Vec<PromptTemplate> = self.templates.read().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Re-reads the directory, replacing the in-memory set.
    ///
    /// # Errors
    /// Fails when the directory cannot be read; the previous set is kept.
    pub fn reload(&self) -> Result<usize> {
        let templates = read_templates(&self.dir)?;
        let count = templates.len();
        *self.templates.write() = templates;
        info!(dir = %self.dir.display(), count, "Reloaded prompt templates");
        Ok(count)
    }
}

fn read_templates(dir: &Path) -> Result<HashMap<String, PromptTemplate>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read prompt directory {}", dir.display()))?;

    let mut templates = HashMap::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!(id, "Loaded prompt template");
                templates.insert(id.to_string(), PromptTemplate::from_content(id, content));
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable template"),
        }
    }
    Ok(templates)
}
