//! Page and action data model exchanged with scripts and remote endpoints.
//!
//! Every invocation returns one JSON document describing a page. The page is
//! an internally tagged union on `"type"`:
//!
//! ```json
//! {"type": "list",   "title": "...", "items": [...], "showPreview": true}
//! {"type": "detail", "title": "...", "preview": "plain text"}
//! {"type": "form",   "title": "...", "submitAction": {...}}
//! ```
//!
//! Actions carry their own `"type"` (`copy`, `open`, `push`, `run`, `exit`,
//! `reload`) and only the fields relevant to that type. Structural checks on
//! which fields must be present live in [`crate::validate`].
//!
//! ## Polymorphic fields
//!
//! Two fields accept several literal shapes. Decoding inspects the raw JSON
//! value and dispatches on its shape class:
//!
//! | Field | string | array | object | anything else |
//! |-------|--------|-------|--------|---------------|
//! | `preview` | literal text | error | field mapping | `invalid preview` |
//! | `command` | shell-split argv | literal argv | field mapping | `invalid command` |
//!
//! A [`Command`] never holds an empty argument vector: every decoding path
//! that would produce one fails with `empty command`.

use crate::exec::{self, ExecError};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("empty command")]
    EmptyCommand,
    #[error("invalid command")]
    InvalidCommand,
    #[error("invalid command string: {0}")]
    UnbalancedQuotes(String),
    #[error("invalid command object: {0}")]
    InvalidCommandObject(String),
    #[error("invalid preview")]
    InvalidPreview,
    #[error("invalid preview object: {0}")]
    InvalidPreviewObject(String),
}

// ============================================================================
// Pages
// ============================================================================

/// A navigable page returned by a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Page {
    List(ListPage),
    Detail(DetailPage),
    Form(FormPage),
}

impl Page {
    pub fn title(&self) -> &str {
        match self {
            Page::List(list) => &list.title,
            Page::Detail(detail) => &detail.title,
            Page::Form(form) => &form.title,
        }
    }

    /// Page-level actions, in declaration order.
    pub fn actions(&self) -> &[Action] {
        match self {
            Page::List(list) => &list.actions,
            Page::Detail(detail) => &detail.actions,
            Page::Form(form) => &form.actions,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Page::List(_) => "list",
            Page::Detail(_) => "detail",
            Page::Form(_) => "form",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListPage {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub show_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_view: Option<EmptyView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ListItem>,
}

/// Shown in place of the items when a list has none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmptyView {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailPage {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Preview>,
}

impl DetailPage {
    /// A detail page showing `text` verbatim.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            preview: Some(Preview::text(text)),
            ..Self::default()
        }
    }

    /// Literal preview text, empty when the page has no preview.
    pub fn text(&self) -> &str {
        self.preview.as_ref().map(|p| p.text.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormPage {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    /// Action run with the collected values. When absent, submitting the
    /// form re-invokes the originating command with the values appended to
    /// its positional arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_action: Option<Action>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Input>,
}

impl FormPage {
    /// All fields the form collects: its own items, then the submit action's inputs.
    pub fn inputs(&self) -> impl Iterator<Item = &Input> {
        self.items.iter().chain(
            self.submit_action
                .iter()
                .flat_map(|action| action.inputs.iter()),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Preview>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

impl ListItem {
    /// Selection identity: the explicit id, falling back to the title.
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.title)
    }
}

// ============================================================================
// Preview
// ============================================================================

/// Text shown next to a list item or as the body of a detail page.
///
/// Either literal `text`, or a `command` whose standard output supplies the
/// text. `highlight` names the syntax used to colour the text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Preview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PreviewFields {
    #[serde(alias = "language")]
    highlight: Option<String>,
    text: String,
    command: Option<Command>,
}

impl Preview {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn from_value(raw: Value) -> Result<Self, SchemaError> {
        match raw {
            Value::String(text) => Ok(Self::text(text)),
            raw @ Value::Object(_) => {
                let fields: PreviewFields = serde_json::from_value(raw)
                    .map_err(|e| SchemaError::InvalidPreviewObject(e.to_string()))?;
                Ok(Self {
                    highlight: fields.highlight,
                    text: fields.text,
                    command: fields.command,
                })
            }
            _ => Err(SchemaError::InvalidPreview),
        }
    }

    /// The text to display, running the embedded command when there is one.
    pub fn resolve_text(&self) -> Result<String, ExecError> {
        match &self.command {
            Some(command) => Ok(String::from_utf8_lossy(&command.output()?).into_owned()),
            None => Ok(self.text.clone()),
        }
    }
}

impl<'de> Deserialize<'de> for Preview {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Preview::from_value(raw).map_err(de::Error::custom)
    }
}

// ============================================================================
// Form inputs
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    TextField,
    TextArea,
    DropDown,
    Checkbox,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropDownItem {
    pub title: String,
    pub value: String,
}

/// A form field. `name` is the key the submitted value is stored under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InputType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Mask typed characters (text fields only).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub secure: bool,

    // dropdown
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<DropDownItem>,

    // checkbox
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_substitution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_substitution: Option<String>,
}

/// A value collected for one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Text(String),
    Bool(bool),
}

/// Collected form values keyed by input name.
pub type Values = BTreeMap<String, InputValue>;

impl Input {
    /// A plain text field titled and named after `name`.
    pub fn text_field(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            ..Self::default()
        }
    }

    /// Render a collected value as the string substituted into commands.
    ///
    /// Checkbox booleans use the declared substitutions when present.
    pub fn format_value(&self, value: &InputValue) -> String {
        match value {
            InputValue::Text(text) => text.clone(),
            InputValue::Bool(true) => self
                .true_substitution
                .clone()
                .unwrap_or_else(|| "true".to_string()),
            InputValue::Bool(false) => self
                .false_substitution
                .clone()
                .unwrap_or_else(|| "false".to_string()),
        }
    }

    /// The declared default as a collected value, if it has a usable shape.
    pub fn default_value(&self) -> Option<InputValue> {
        match self.default.as_ref()? {
            Value::String(s) => Some(InputValue::Text(s.clone())),
            Value::Bool(b) => Some(InputValue::Bool(*b)),
            Value::Number(n) => Some(InputValue::Text(n.to_string())),
            _ => None,
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Copy,
    Open,
    Push,
    Run,
    Exit,
    Reload,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionType::Copy => "copy",
            ActionType::Open => "open",
            ActionType::Push => "push",
            ActionType::Run => "run",
            ActionType::Exit => "exit",
            ActionType::Reload => "reload",
        };
        f.write_str(name)
    }
}

/// What to do with a `run` action's output once its command succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnSuccess {
    Open,
    Push,
    Exit,
    Reload,
    Copy,
}

/// A user-selectable action. Which optional fields matter depends on `kind`:
/// `copy` → `text`, `open` → `target`, `push` → `page`,
/// `run` → `command`, `confirm`, `on_success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ActionType,
    /// Key binding hint for the renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Input>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub confirm: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<OnSuccess>,
}

impl Action {
    fn new(kind: ActionType, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind,
            key: None,
            inputs: Vec::new(),
            text: None,
            target: None,
            page: None,
            command: None,
            confirm: false,
            on_success: None,
        }
    }

    pub fn copy(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(ActionType::Copy, title)
        }
    }

    pub fn open(title: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::new(ActionType::Open, title)
        }
    }

    pub fn push(title: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            page: Some(page.into()),
            ..Self::new(ActionType::Push, title)
        }
    }

    pub fn run(title: impl Into<String>, command: Command) -> Self {
        Self {
            command: Some(command),
            ..Self::new(ActionType::Run, title)
        }
    }

    pub fn exit(title: impl Into<String>) -> Self {
        Self::new(ActionType::Exit, title)
    }

    pub fn reload(title: impl Into<String>) -> Self {
        Self::new(ActionType::Reload, title)
    }
}

// ============================================================================
// Command descriptor
// ============================================================================

/// An argument vector with optional stdin payload and working directory.
///
/// The argument vector is never empty; the first element is the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dir: Option<PathBuf>,
}

#[derive(Deserialize)]
struct CommandFields {
    #[serde(default, alias = "Args")]
    args: Vec<String>,
    #[serde(default, alias = "Input")]
    input: Option<String>,
    #[serde(default, alias = "Dir")]
    dir: Option<PathBuf>,
}

impl Command {
    pub fn new<I, S>(args: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if args.is_empty() {
            return Err(SchemaError::EmptyCommand);
        }
        Ok(Self {
            args,
            input: None,
            dir: None,
        })
    }

    /// Split a shell-style command line into an argument vector.
    pub fn parse(line: &str) -> Result<Self, SchemaError> {
        let args =
            shlex::split(line).ok_or_else(|| SchemaError::UnbalancedQuotes(line.to_string()))?;
        Self::new(args)
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn program(&self) -> &str {
        &self.args[0]
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Decode one of the three accepted literal shapes.
    pub fn from_value(raw: Value) -> Result<Self, SchemaError> {
        match raw {
            Value::Array(items) => {
                let args = items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(arg) => Ok(arg),
                        _ => Err(SchemaError::InvalidCommand),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Self::new(args)
            }
            Value::String(line) => Self::parse(&line),
            raw @ Value::Object(_) => {
                let fields: CommandFields = serde_json::from_value(raw)
                    .map_err(|e| SchemaError::InvalidCommandObject(e.to_string()))?;
                let mut command = Self::new(fields.args)?;
                command.input = fields.input;
                command.dir = fields.dir;
                Ok(command)
            }
            _ => Err(SchemaError::InvalidCommand),
        }
    }

    /// Apply `f` to every argument and the stdin payload.
    pub(crate) fn map_strings(&self, f: impl Fn(&str) -> String) -> Self {
        Self {
            args: self.args.iter().map(|arg| f(arg)).collect(),
            input: self.input.as_deref().map(&f),
            dir: self.dir.clone(),
        }
    }

    fn process(&self) -> process::Command {
        let mut cmd = process::Command::new(self.program());
        cmd.args(&self.args[1..]);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run to completion and return the captured standard output.
    pub fn output(&self) -> Result<Vec<u8>, ExecError> {
        let captured = exec::capture(self.process(), self.input.as_deref().map(str::as_bytes))?;
        Ok(captured.check()?.stdout)
    }

    /// Run to completion, discarding output.
    pub fn run(&self) -> Result<(), ExecError> {
        self.output().map(|_| ())
    }
}

impl<'de> Deserialize<'de> for Command {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Command::from_value(raw).map_err(de::Error::custom)
    }
}
