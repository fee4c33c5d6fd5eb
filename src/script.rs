//! Script metadata parsing and directory discovery.
//!
//! A script is any executable file whose leading comments carry
//! `@sunbeam.<key> <value>` annotations:
//!
//! ```text
//! #!/bin/sh
//! # @sunbeam.schemaVersion 1
//! # @sunbeam.title Search Issues
//! # @sunbeam.mode interactive
//! # @sunbeam.packageName github
//! # @sunbeam.argument1 {"type": "text", "placeholder": "repository"}
//! # @sunbeam.argument2 {"type": "text", "placeholder": "label", "optional": true}
//! ```
//!
//! ## Keys
//!
//! | Key | Required | Meaning |
//! |-----|----------|---------|
//! | `schemaVersion` | yes | Marks the file as a script; must be `1` |
//! | `title` | yes | Display title |
//! | `mode` | no | `static` (default): stdout is shown as text. `interactive`: stdout is a JSON page |
//! | `packageName` | no | Names the support directory; defaults to the parent directory name |
//! | `argumentN` | no | Positional argument `N` (1-based) as JSON |
//!
//! ## Discovery
//!
//! Only the leading block of comment lines (after an optional shebang) is
//! read, and at most [`HEADER_LIMIT`] bytes of it. Annotations further down,
//! in heredocs or strings, are ignored.
//!
//! [`scan_dir`] walks the script root recursively, skipping hidden entries
//! and non-executable files before reading anything.
//! Files without a `schemaVersion` annotation are ignored silently; files
//! with a broken header are skipped with a warning so one bad script does not
//! hide the rest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

const ANNOTATION_PREFIX: &str = "@sunbeam.";
const SCHEMA_VERSION: u32 = 1;
const COMMENT_PREFIXES: [&str; 3] = ["#", "//", "--"];

/// Upper bound on the bytes read from a file while looking for its header.
pub const HEADER_LIMIT: u64 = 64 * 1024;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{path}: {source}")]
    Header {
        path: PathBuf,
        #[source]
        source: HeaderError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("missing @sunbeam.{0}")]
    Missing(&'static str),
    #[error("invalid @sunbeam.{key}: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Static,
    Interactive,
}

/// A positional argument declared by a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptArgument {
    pub placeholder: String,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptMetadata {
    pub title: String,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    pub arguments: Vec<ScriptArgument>,
}

/// A discovered script file with its parsed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub path: PathBuf,
    pub metadata: ScriptMetadata,
}

impl Script {
    /// Read and parse the header of the script at `path`.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let header = read_header(path)?;
        let metadata = parse_metadata(&header).map_err(|source| ScriptError::Header {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            metadata,
        })
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    /// Declared package name, falling back to the containing directory's name.
    pub fn package_name(&self) -> String {
        self.metadata.package_name.clone().unwrap_or_else(|| {
            self.path
                .parent()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| "default".to_string())
        })
    }

    pub fn required_arguments(&self) -> impl Iterator<Item = &ScriptArgument> {
        self.metadata.arguments.iter().filter(|arg| !arg.optional)
    }
}

/// Parse `@sunbeam.*` annotations out of a script's source.
pub fn parse_metadata(source: &str) -> Result<ScriptMetadata, HeaderError> {
    let annotations = collect_annotations(source);

    let version = annotations
        .get("schemaVersion")
        .ok_or(HeaderError::Missing("schemaVersion"))?;
    match version.parse::<u32>() {
        Ok(SCHEMA_VERSION) => {}
        _ => {
            return Err(HeaderError::Invalid {
                key: "schemaVersion".to_string(),
                reason: format!("unsupported version `{version}`"),
            });
        }
    }

    let title = annotations
        .get("title")
        .filter(|t| !t.is_empty())
        .ok_or(HeaderError::Missing("title"))?
        .to_string();

    let mode = match annotations.get("mode").map(String::as_str) {
        None | Some("static") => Mode::Static,
        Some("interactive") => Mode::Interactive,
        Some(other) => {
            return Err(HeaderError::Invalid {
                key: "mode".to_string(),
                reason: format!("expected `static` or `interactive`, got `{other}`"),
            });
        }
    };

    let package_name = annotations
        .get("packageName")
        .filter(|name| !name.is_empty())
        .cloned();

    let mut numbered: BTreeMap<u32, ScriptArgument> = BTreeMap::new();
    for (key, value) in &annotations {
        let Some(index) = key.strip_prefix("argument") else {
            continue;
        };
        let index: u32 = index.parse().map_err(|_| HeaderError::Invalid {
            key: key.clone(),
            reason: "argument index must be a number".to_string(),
        })?;
        let argument: ScriptArgument =
            serde_json::from_str(value).map_err(|e| HeaderError::Invalid {
                key: key.clone(),
                reason: e.to_string(),
            })?;
        numbered.insert(index, argument);
    }

    Ok(ScriptMetadata {
        title,
        mode,
        package_name,
        arguments: numbered.into_values().collect(),
    })
}

/// The leading comment block of the file at `path`, capped at [`HEADER_LIMIT`].
fn read_header(path: &Path) -> std::io::Result<String> {
    let reader = BufReader::new(File::open(path)?.take(HEADER_LIMIT));
    let mut header = String::new();
    for line in reader.split(b'\n') {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        if !is_header_line(&line) {
            break;
        }
        header.push_str(&line);
        header.push('\n');
    }
    Ok(header)
}

/// Blank lines and comments (including a shebang) belong to the header.
fn is_header_line(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || COMMENT_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// First occurrence of each `@sunbeam.<key> <value>` annotation in the
/// leading comment block.
fn collect_annotations(source: &str) -> BTreeMap<String, String> {
    let mut annotations = BTreeMap::new();
    for line in source.lines().take_while(|line| is_header_line(line)) {
        let Some(start) = line.find(ANNOTATION_PREFIX) else {
            continue;
        };
        let rest = &line[start + ANNOTATION_PREFIX.len()..];
        let (key, value) = match rest.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim()),
            None => (rest.trim(), ""),
        };
        if key.is_empty() {
            continue;
        }
        annotations
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }
    annotations
}

/// Find every script under `root`, sorted by path.
pub fn scan_dir(root: &Path) -> Result<Vec<Script>, ScriptError> {
    let mut scripts = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // The root itself must be readable; anything deeper is skipped.
            Err(err) if err.depth() == 0 => return Err(err.into()),
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_executable(path) {
            debug!(path = %path.display(), "not executable, skipping");
            continue;
        }
        match Script::load(path) {
            Ok(script) => scripts.push(script),
            Err(ScriptError::Header {
                source: HeaderError::Missing("schemaVersion"),
                ..
            }) => debug!(path = %path.display(), "not a script"),
            Err(err) => warn!(error = %err, "skipping script"),
        }
    }

    scripts.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(scripts)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}
