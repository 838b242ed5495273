// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! The three-file web project edited by the agent
//!
//! - [`WebProject`]: the HTML/CSS/JavaScript buffers
//! - [`ProjectStore`]: single-writer owner exposing read/replace/patch
//! - [`ConsoleBuffer`]: bounded log captured from the preview runtime

pub mod console;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ZenithError};

pub use console::{ConsoleBuffer, ConsoleLevel, ConsoleLog};
pub use store::ProjectStore;

/// One of the project's three buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileTarget {
    Html,
    Css,
    Javascript,
}

impl FileTarget {
    pub const ALL: [FileTarget; 3] = [FileTarget::Html, FileTarget::Css, FileTarget::Javascript];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileTarget::Html => "html",
            FileTarget::Css => "css",
            FileTarget::Javascript => "javascript",
        }
    }

    /// File name used when the project is saved to disk
    pub fn file_name(&self) -> &'static str {
        match self {
            FileTarget::Html => "index.html",
            FileTarget::Css => "style.css",
            FileTarget::Javascript => "script.js",
        }
    }
}

impl fmt::Display for FileTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileTarget {
    type Err = ZenithError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "html" => Ok(FileTarget::Html),
            "css" => Ok(FileTarget::Css),
            "javascript" => Ok(FileTarget::Javascript),
            other => Err(ZenithError::InvalidInput(format!(
                "unknown target '{}', expected html, css or javascript",
                other
            ))),
        }
    }
}

/// The project's file contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebProject {
    pub html: String,
    pub css: String,
    pub javascript: String,
}

const DEFAULT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Zenith Project</title>
  <link rel="stylesheet" href="style.css">
</head>
<body>
  <main class="container">
    <h1>Hello from Zenith</h1>
    <p>Describe what you want to build and the agent will edit these files.</p>
    <button id="action">Click me</button>
  </main>
  <script src="script.js"></script>
</body>
</html>
"#;

const DEFAULT_CSS: &str = r#"body {
  font-family: system-ui, sans-serif;
  margin: 0;
  padding: 2rem;
}

.container {
  max-width: 40rem;
  margin: 0 auto;
}

button {
  background: gray;
  color: white;
  border: none;
  padding: 0.5rem 1rem;
  border-radius: 0.25rem;
}
"#;

const DEFAULT_JAVASCRIPT: &str = r#"document.getElementById('action').addEventListener('click', () => {
  console.log('Button clicked');
});
"#;

impl Default for WebProject {
    /// Placeholder project shown before the agent makes any edits
    fn default() -> Self {
        Self {
            html: DEFAULT_HTML.to_string(),
            css: DEFAULT_CSS.to_string(),
            javascript: DEFAULT_JAVASCRIPT.to_string(),
        }
    }
}

impl WebProject {
    pub fn new(
        html: impl Into<String>,
        css: impl Into<String>,
        javascript: impl Into<String>,
    ) -> Self {
        Self {
            html: html.into(),
            css: css.into(),
            javascript: javascript.into(),
        }
    }

    pub fn get(&self, target: FileTarget) -> &str {
        match target {
            FileTarget::Html => &self.html,
            FileTarget::Css => &self.css,
            FileTarget::Javascript => &self.javascript,
        }
    }

    pub(crate) fn get_mut(&mut self, target: FileTarget) -> &mut String {
        match target {
            FileTarget::Html => &mut self.html,
            FileTarget::Css => &mut self.css,
            FileTarget::Javascript => &mut self.javascript,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parse_and_display() {
        for target in FileTarget::ALL {
            assert_eq!(target.as_str().parse::<FileTarget>().unwrap(), target);
            assert_eq!(target.to_string(), target.as_str());
        }
        assert!(matches!(
            "python".parse::<FileTarget>(),
            Err(ZenithError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_target_file_names() {
        assert_eq!(FileTarget::Html.file_name(), "index.html");
        assert_eq!(FileTarget::Css.file_name(), "style.css");
        assert_eq!(FileTarget::Javascript.file_name(), "script.js");
    }

    #[test]
    fn test_default_project_has_single_gray_background() {
        let project = WebProject::default();
        assert_eq!(project.css.matches("background: gray;").count(), 1);
        assert!(project.html.starts_with("<!DOCTYPE html>"));
        assert!(project.html.contains("id=\"action\""));
    }

    #[test]
    fn test_project_serializes_with_target_names() {
        let value = serde_json::to_value(WebProject::new("<p></p>", "p {}", "")).unwrap();
        assert_eq!(value["html"], "<p></p>");
        assert_eq!(value["css"], "p {}");
        assert_eq!(value["javascript"], "");
    }
}
