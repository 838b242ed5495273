// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::path::Path;

use crate::error::{Result, ZenithError};

use super::{FileTarget, WebProject};

/// Owns the project buffers. All mutation goes through [`replace`](Self::replace)
/// and [`patch`](Self::patch).
#[derive(Debug, Clone, Default)]
pub struct ProjectStore {
    project: WebProject,
    version: u64,
}

impl ProjectStore {
    pub fn new(project: WebProject) -> Self {
        Self {
            project,
            version: 0,
        }
    }

    /// Copy of all three buffers
    pub fn snapshot(&self) -> WebProject {
        self.project.clone()
    }

    pub fn read(&self, target: FileTarget) -> &str {
        self.project.get(target)
    }

    /// Bumped on every successful mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Overwrite a buffer
    pub fn replace(&mut self, target: FileTarget, content: impl Into<String>) {
        *self.project.get_mut(target) = content.into();
        self.version += 1;
        tracing::debug!(file = %target, version = self.version, "replaced file");
    }

    /// Replace the single occurrence of `search` in `target`.
    ///
    /// Matching is exact. The search string must occur exactly once; the buffer is
    /// left untouched otherwise.
    pub fn patch(&mut self, target: FileTarget, search: &str, replacement: &str) -> Result<()> {
        if search.is_empty() {
            return Err(ZenithError::InvalidInput(
                "search_string must not be empty".to_string(),
            ));
        }

        let buffer = self.project.get_mut(target);
        let occurrences = count_occurrences(buffer, search);
        match occurrences {
            0 => {
                return Err(ZenithError::PatchNotFound {
                    target: target.to_string(),
                })
            }
            1 => {}
            n => {
                return Err(ZenithError::PatchAmbiguous {
                    target: target.to_string(),
                    occurrences: n,
                })
            }
        }

        *buffer = buffer.replacen(search, replacement, 1);
        self.version += 1;
        tracing::debug!(file = %target, version = self.version, "patched file");
        Ok(())
    }

    /// Load `index.html`, `style.css` and `script.js` from `dir`. Missing files
    /// keep their placeholder content.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut project = WebProject::default();
        for target in FileTarget::ALL {
            let path = dir.join(target.file_name());
            if path.exists() {
                *project.get_mut(target) = std::fs::read_to_string(&path)?;
            }
        }
        Ok(Self::new(project))
    }

    /// Write all three files into `dir`, creating it if needed
    pub fn save_dir(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        for target in FileTarget::ALL {
            std::fs::write(dir.join(target.file_name()), self.project.get(target))?;
        }
        Ok(())
    }
}

/// Every position `needle` starts at, overlapping matches included
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    let mut count = 0;
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        count += 1;
        let start = from + pos;
        // step one char past the match start
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    count
}
