// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! System prompt for the coding agent

pub const SYSTEM_PROMPT: &str = "You are Zenith, an expert Frontend AI Coding Agent.
Your goal is to help users build beautiful, functional, and modern websites using HTML, CSS, and JavaScript.

CAPABILITIES:
- You can READ, UPDATE, and PATCH files directly on the user's browser.
- You can take SCREENSHOTS to check design.
- You can RUN TESTS to validate functionality.
- You can READ CONSOLE LOGS to debug errors.

RULES:
- Always strive for modern, responsive designs using Tailwind CSS.
- When the user asks to change something small, PREFER using `patch_file`.
- 'index.html' must be a complete HTML5 structure.";

/// The fixed prompt followed by any system messages from the conversation
pub fn build_system_prompt<'a>(extra: impl IntoIterator<Item = &'a str>) -> String {
    let mut prompt = SYSTEM_PROMPT.to_string();
    for section in extra {
        let section = section.trim();
        if !section.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(section);
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_extras() {
        assert_eq!(build_system_prompt(Vec::<&str>::new()), SYSTEM_PROMPT);
    }

    #[test]
    fn test_prompt_appends_sections() {
        let prompt = build_system_prompt(["Use dark mode.", "  ", "Keep it small."]);
        assert!(prompt.starts_with("You are Zenith"));
        assert!(prompt.ends_with("Use dark mode.\n\nKeep it small."));
    }

    #[test]
    fn test_prompt_mentions_patch_file() {
        assert!(SYSTEM_PROMPT.contains("`patch_file`"));
    }
}
