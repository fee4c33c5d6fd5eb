//! Shared test utilities: throwaway scripts and session directories.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let path = write_script(
//!     tmp.path(),
//!     "greet.sh",
//!     &format!("{}echo hello\n", script_header("Greet", "static", &[("name", false)])),
//! );
//! let page = local(&path, &tmp).run(&CommandInput::default()).unwrap();
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::command::LocalCommand;
use crate::config::Dirs;
use crate::schema::{Action, ListItem, Page};
use crate::script::Script;

// =========================================================================
// Script fixtures
// =========================================================================

/// A `#!/bin/sh` header declaring `title`, `mode` and `(placeholder, optional)` arguments.
pub fn script_header(title: &str, mode: &str, arguments: &[(&str, bool)]) -> String {
    let mut header = format!(
        "#!/bin/sh\n# @sunbeam.schemaVersion 1\n# @sunbeam.title {title}\n# @sunbeam.mode {mode}\n"
    );
    for (i, (placeholder, optional)) in arguments.iter().enumerate() {
        header.push_str(&format!(
            "# @sunbeam.argument{} {{\"type\": \"text\", \"placeholder\": \"{placeholder}\", \"optional\": {optional}}}\n",
            i + 1
        ));
    }
    header
}

/// Write an executable script into `dir` (created if needed) and return its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}

/// Session directories rooted inside `tmp`.
pub fn test_dirs(tmp: &TempDir) -> Dirs {
    Dirs {
        scripts: tmp.path().to_path_buf(),
        data: tmp.path().join("data"),
    }
}

/// Load the script at `path` as a local command using [`test_dirs`].
pub fn local(path: &Path, tmp: &TempDir) -> LocalCommand {
    LocalCommand::new(Script::load(path).unwrap(), test_dirs(tmp))
}

// =========================================================================
// Page lookups: panic with a clear message on miss
// =========================================================================

/// Find a list item by title. Panics if the page is not a list or has no such item.
pub fn find_item<'a>(page: &'a Page, title: &str) -> &'a ListItem {
    let Page::List(list) = page else {
        panic!("expected a list page, got {}", page.kind());
    };
    list.items
        .iter()
        .find(|item| item.title == title)
        .unwrap_or_else(|| {
            let titles: Vec<&str> = list.items.iter().map(|i| i.title.as_str()).collect();
            panic!("item '{title}' not found. Available: {titles:?}")
        })
}

/// First action of a list item.
pub fn primary_action(item: &ListItem) -> &Action {
    item.actions
        .first()
        .unwrap_or_else(|| panic!("item '{}' has no actions", item.title))
}

/// Detail text of a page. Panics for other page types.
pub fn detail_text(page: &Page) -> &str {
    match page {
        Page::Detail(detail) => detail.text(),
        other => panic!("expected a detail page, got {}", other.kind()),
    }
}
