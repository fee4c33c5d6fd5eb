//! CLI output formatting for pages and discovered scripts.
//!
//! # Information-First Display
//!
//! Every entity leads with its positional index and title. Paths, subtitles
//! and actions follow as indented context lines, so the output reads like a
//! menu while still showing where each entry comes from.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! Commands
//! 001 Greet
//!     Subtitle: /home/me/scripts/greet.sh
//!     Actions: Open Command (push)
//! 002 Weather
//!     Accessories: 12°C, Paris
//! ```
//!
//! ## Detail
//!
//! Detail pages print their title followed by the preview text verbatim.
//!
//! ## Form
//!
//! ```text
//! Hello
//! 001 name (textfield)
//! 002 all (checkbox)
//!     Default: true
//! Submit: Say hello (run)
//! ```
//!
//! ## Scripts
//!
//! ```text
//! Scripts
//! 001 Greet
//!     Source: greet.sh
//! 002 Search (interactive)
//!     Source: tools/search.sh
//!     Arguments: <query> [<limit>]
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! previews backed by a command show the command, they don't run it.

use crate::schema::{Action, DetailPage, FormPage, Input, ListPage, Page};
use crate::script::{Mode, Script};
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// `Title (kind)`, with the shortcut key when one is bound.
///
/// ```text
/// Open Command (push)
/// Copy Path (copy, ctrl+c)
/// ```
fn action_label(action: &Action) -> String {
    match &action.key {
        Some(key) => format!("{} ({}, {})", action.title, action.kind, key),
        None => format!("{} ({})", action.title, action.kind),
    }
}

fn actions_line(depth: usize, actions: &[Action]) -> Option<String> {
    if actions.is_empty() {
        return None;
    }
    let labels: Vec<String> = actions.iter().map(action_label).collect();
    Some(format!("{}Actions: {}", indent(depth), labels.join(", ")))
}

// ============================================================================
// Pages
// ============================================================================

/// Format any page for the terminal.
pub fn format_page(page: &Page) -> Vec<String> {
    match page {
        Page::List(list) => format_list(list),
        Page::Detail(detail) => format_detail(detail),
        Page::Form(form) => format_form(form),
    }
}

pub fn print_page(page: &Page) {
    for line in format_page(page) {
        println!("{}", line);
    }
}

fn format_list(list: &ListPage) -> Vec<String> {
    let mut lines = Vec::new();
    if !list.title.is_empty() {
        lines.push(list.title.clone());
    }

    if list.items.is_empty() {
        let empty = list.empty_view.as_ref();
        let text = empty
            .map(|view| view.text.as_str())
            .filter(|text| !text.is_empty())
            .unwrap_or("No items");
        lines.push(format!("{}{}", indent(1), text));
        lines.extend(empty.and_then(|view| actions_line(1, &view.actions)));
    }

    for (i, item) in list.items.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), item.title));
        if !item.subtitle.is_empty() {
            lines.push(format!("{}Subtitle: {}", indent(1), item.subtitle));
        }
        if !item.accessories.is_empty() {
            lines.push(format!(
                "{}Accessories: {}",
                indent(1),
                item.accessories.join(", ")
            ));
        }
        if list.show_preview
            && let Some(preview) = &item.preview
            && !preview.text.is_empty()
        {
            let first = preview.text.lines().next().unwrap_or_default();
            lines.push(format!("{}Preview: {}", indent(1), truncate(first, 60)));
        }
        lines.extend(actions_line(1, &item.actions));
    }

    lines.extend(actions_line(0, &list.actions));
    lines
}

fn format_detail(detail: &DetailPage) -> Vec<String> {
    let mut lines = Vec::new();
    if !detail.title.is_empty() {
        lines.push(detail.title.clone());
    }
    match &detail.preview {
        Some(preview) if preview.text.is_empty() => {
            if let Some(command) = &preview.command {
                lines.push(format!("{}Preview: {}", indent(1), command.args().join(" ")));
            }
        }
        Some(preview) => lines.extend(preview.text.lines().map(str::to_string)),
        None => {}
    }
    lines.extend(actions_line(0, &detail.actions));
    lines
}

fn input_line(index: usize, input: &Input) -> String {
    let kind = serde_json::to_value(input.kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let name = if input.title.is_empty() || input.title == input.name {
        input.name.clone()
    } else {
        format!("{} [{}]", input.title, input.name)
    };
    format!("{} {} ({})", format_index(index), name, kind)
}

fn format_form(form: &FormPage) -> Vec<String> {
    let mut lines = Vec::new();
    if !form.title.is_empty() {
        lines.push(form.title.clone());
    }
    for (i, input) in form.inputs().enumerate() {
        lines.push(input_line(i + 1, input));
        if let Some(placeholder) = &input.placeholder {
            lines.push(format!("{}Placeholder: {}", indent(1), placeholder));
        }
        if let Some(default) = &input.default {
            let shown = match default {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            lines.push(format!("{}Default: {}", indent(1), shown));
        }
        if !input.items.is_empty() {
            let values: Vec<&str> = input.items.iter().map(|item| item.value.as_str()).collect();
            lines.push(format!("{}Choices: {}", indent(1), values.join(", ")));
        }
    }
    if let Some(submit) = &form.submit_action {
        lines.push(format!("Submit: {}", action_label(submit)));
    }
    lines.extend(actions_line(0, &form.actions));
    lines
}

// ============================================================================
// Scripts
// ============================================================================

/// Format discovered scripts, with sources relative to `root`.
pub fn format_scripts(scripts: &[Script], root: &Path) -> Vec<String> {
    let mut lines = vec!["Scripts".to_string()];
    if scripts.is_empty() {
        lines.push(format!("{}No scripts in {}", indent(1), root.display()));
        return lines;
    }

    for (i, script) in scripts.iter().enumerate() {
        let header = match script.metadata.mode {
            Mode::Interactive => format!("{} {} (interactive)", format_index(i + 1), script.title()),
            Mode::Static => format!("{} {}", format_index(i + 1), script.title()),
        };
        lines.push(header);

        let source = script.path.strip_prefix(root).unwrap_or(&script.path);
        lines.push(format!("{}Source: {}", indent(1), source.display()));

        if !script.metadata.arguments.is_empty() {
            let args: Vec<String> = script
                .metadata
                .arguments
                .iter()
                .map(|arg| {
                    if arg.optional {
                        format!("[<{}>]", arg.placeholder)
                    } else {
                        format!("<{}>", arg.placeholder)
                    }
                })
                .collect();
            lines.push(format!("{}Arguments: {}", indent(1), args.join(" ")));
        }
    }
    lines
}

pub fn print_scripts(scripts: &[Script], root: &Path) {
    for line in format_scripts(scripts, root) {
        println!("{}", line);
    }
}
