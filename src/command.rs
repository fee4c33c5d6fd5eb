//! Launcher commands: the things a session can invoke to obtain a page.
//!
//! [`Command`] is a closed set of three kinds, all driven through
//! [`Command::run`] with a [`CommandInput`]:
//!
//! | Kind | Backed by | Output |
//! |------|-----------|--------|
//! | [`LocalCommand`] | a script file | static: stdout as a detail page; interactive: stdout as a JSON page |
//! | [`RemoteCommand`] | an HTTP endpoint | response body as a JSON page |
//! | [`RootCommand`] | the script root | a list of every discovered script |
//!
//! ## Local scripts
//!
//! When fewer positional arguments are supplied than the script requires,
//! the script is not spawned. Instead `run` returns a form with one text
//! field per argument still missing (required and optional alike, from the
//! first unfilled position). Submitting it re-invokes the script with the
//! completed list.
//!
//! Otherwise the script runs in its own directory with the inherited
//! environment plus `CommandInput::environment`. Interactive scripts also get
//! `SUNBEAM_SUPPORT_DIR` and read `CommandInput::query` on stdin.
//!
//! Static and interactive scripts treat failure differently, on purpose:
//! a static script always yields a detail page holding whatever it printed,
//! whatever its exit status. An interactive script that exits non-zero is an
//! error carrying the exit code and its stderr.
//!
//! Detail pages hold text, so static output that is not valid UTF-8 is shown
//! with U+FFFD in place of the bad bytes, and a warning is logged.

use crate::config::{Dirs, SUPPORT_DIR_ENV};
use crate::exec::{self, ExecError};
use crate::schema::{Action, DetailPage, FormPage, Input, ListItem, ListPage, Page};
use crate::script::{self, Mode, Script, ScriptArgument, ScriptError};
use crate::validate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("error while decoding response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    Validation(#[from] ValidationError),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("invalid page reference `{reference}`: {reason}")]
    Reference { reference: String, reason: String },
}

/// What a command is invoked with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInput {
    /// Added on top of the inherited process environment.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Fed to interactive scripts on stdin.
    #[serde(default)]
    pub query: String,
}

impl CommandInput {
    pub fn with_arguments<I, S>(arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            arguments: arguments.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub enum Command {
    Local(LocalCommand),
    Remote(RemoteCommand),
    Root(RootCommand),
}

impl Command {
    pub fn run(&self, input: &CommandInput) -> Result<Page, CommandError> {
        match self {
            Command::Local(local) => local.run(input),
            Command::Remote(remote) => remote.run(input),
            Command::Root(root) => root.run(input),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Command::Local(local) => local.script.title(),
            Command::Remote(remote) => &remote.title,
            Command::Root(_) => RootCommand::TITLE,
        }
    }

    /// Declared positional arguments.
    pub fn arguments(&self) -> &[ScriptArgument] {
        match self {
            Command::Local(local) => &local.script.metadata.arguments,
            Command::Remote(_) | Command::Root(_) => &[],
        }
    }

    pub fn url(&self) -> Url {
        match self {
            Command::Local(local) => fs_url(&local.script.path),
            Command::Remote(remote) => remote.url.clone(),
            Command::Root(_) => fs_url(Path::new("/")),
        }
    }

    /// Directory that relative page references are resolved against.
    fn base_dir(&self, dirs: &Dirs) -> PathBuf {
        match self {
            Command::Local(local) => local
                .script
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dirs.scripts.clone()),
            Command::Root(root) => root.root.clone(),
            Command::Remote(_) => dirs.scripts.clone(),
        }
    }

    /// Turn a `push` page reference into a command.
    ///
    /// `http(s)://` references become remote commands. Anything else is a
    /// script path, resolved against `from`'s directory when relative.
    pub fn resolve(reference: &str, from: &Command, dirs: &Dirs) -> Result<Self, CommandError> {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            let url = Url::parse(reference).map_err(|e| CommandError::Reference {
                reference: reference.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Command::Remote(RemoteCommand::new(url)));
        }

        let raw = reference.strip_prefix("fs://").unwrap_or(reference);
        if raw.is_empty() {
            return Err(CommandError::Reference {
                reference: reference.to_string(),
                reason: "empty path".to_string(),
            });
        }
        let path = Path::new(raw);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            from.base_dir(dirs).join(path)
        };
        let script = Script::load(&path)?;
        Ok(Command::Local(LocalCommand::new(script, dirs.clone())))
    }
}

fn fs_url(path: &Path) -> Url {
    let mut url = Url::parse("fs:///").expect("static url must parse");
    url.set_path(&path.to_string_lossy());
    url
}

// ============================================================================
// Local
// ============================================================================

#[derive(Debug, Clone)]
pub struct LocalCommand {
    pub script: Script,
    dirs: Dirs,
}

impl LocalCommand {
    pub fn new(script: Script, dirs: Dirs) -> Self {
        Self { script, dirs }
    }

    pub fn run(&self, input: &CommandInput) -> Result<Page, CommandError> {
        let required = self.script.required_arguments().count();
        if input.arguments.len() < required {
            debug!(
                script = %self.script.path.display(),
                supplied = input.arguments.len(),
                required,
                "prompting for missing arguments"
            );
            return Ok(Page::Form(self.arguments_form(input.arguments.len())));
        }

        let path = std::path::absolute(&self.script.path)?;
        let interactive = self.script.metadata.mode == Mode::Interactive;

        let mut cmd = process::Command::new(&path);
        cmd.args(&input.arguments).envs(&input.environment);
        if let Some(dir) = path.parent() {
            cmd.current_dir(dir);
        }
        if interactive {
            let package = self.script.package_name();
            cmd.env(SUPPORT_DIR_ENV, self.dirs.support_dir(&package));
        }

        info!(script = %path.display(), args = ?input.arguments, "running script");
        let captured = exec::capture(cmd, interactive.then_some(input.query.as_bytes()))?;

        if !interactive {
            if !captured.status.success() {
                warn!(
                    script = %path.display(),
                    code = captured.code(),
                    "static script exited non-zero, showing its output anyway"
                );
            }
            if std::str::from_utf8(&captured.stdout).is_err() {
                warn!(
                    script = %path.display(),
                    "static output is not valid UTF-8, invalid bytes replaced"
                );
            }
            return Ok(Page::Detail(DetailPage::with_text(captured.stdout_lossy())));
        }

        let captured = captured.check()?;
        let page: Page = serde_json::from_slice(&captured.stdout)?;
        page.validate()?;
        Ok(page)
    }

    /// One text field per declared argument from position `filled` onwards.
    fn arguments_form(&self, filled: usize) -> FormPage {
        let items = self
            .script
            .metadata
            .arguments
            .iter()
            .skip(filled)
            .map(|arg| Input::text_field(&arg.placeholder))
            .collect();
        FormPage {
            title: self.script.title().to_string(),
            items,
            ..FormPage::default()
        }
    }
}

// ============================================================================
// Remote
// ============================================================================

#[derive(Debug, Clone)]
pub struct RemoteCommand {
    pub url: Url,
    pub title: String,
}

impl RemoteCommand {
    pub fn new(url: Url) -> Self {
        let title = url.host_str().unwrap_or(url.as_str()).to_string();
        Self { url, title }
    }

    /// POST the input as JSON and decode the reply as a page.
    ///
    /// A non-2xx status is a [`CommandError::Transport`] even when the body
    /// would decode as a valid page. Endpoints signal success with the status.
    pub fn run(&self, input: &CommandInput) -> Result<Page, CommandError> {
        let transport = |source| CommandError::Transport {
            url: self.url.clone(),
            source,
        };

        info!(url = %self.url, "posting to remote command");
        let response = reqwest::blocking::Client::new()
            .post(self.url.clone())
            .json(input)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(transport)?;
        let body = response.bytes().map_err(transport)?;

        let page: Page = serde_json::from_slice(&body)?;
        page.validate()?;
        Ok(page)
    }
}

// ============================================================================
// Root
// ============================================================================

/// Lists every script under a root directory. Always the first page of a
/// session.
#[derive(Debug, Clone)]
pub struct RootCommand {
    pub root: PathBuf,
}

impl RootCommand {
    pub const TITLE: &'static str = "Commands";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn run(&self, _input: &CommandInput) -> Result<Page, CommandError> {
        let scripts = script::scan_dir(&self.root)?;
        debug!(root = %self.root.display(), count = scripts.len(), "scanned scripts");

        let items = scripts
            .iter()
            .map(|script| {
                let path = script.path.to_string_lossy().to_string();
                ListItem {
                    title: script.title().to_string(),
                    subtitle: path.clone(),
                    actions: vec![Action::push("Open Command", path)],
                    ..ListItem::default()
                }
            })
            .collect();

        Ok(Page::List(ListPage {
            title: Self::TITLE.to_string(),
            items,
            ..ListPage::default()
        }))
    }
}
