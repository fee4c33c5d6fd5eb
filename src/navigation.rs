//! Navigation state machine driven by the actions on a page.
//!
//! The [`Navigator`] owns a stack of frames. Each frame remembers the page on
//! screen and where it came from, so it can be reloaded. The renderer shows
//! [`Navigator::page`], feeds user choices back in, and performs side effects
//! through an [`Effects`] implementation.
//!
//! ## States
//!
//! ```text
//!            select(copy|open)            select(push|run|reload)
//!   Idle ────────────────────▶ Idle   Idle ─────────────────────▶ Executing
//!     │                                 ▲                            │
//!     │ select(action with inputs)      │ dismiss_error       execute│
//!     ▼                                 │                            ▼
//!   AwaitingInput ──submit──▶ Executing Error ◀──── failure ──── Idle / Exited
//! ```
//!
//! `Idle` and `AwaitingInput` refer to the top frame's page. Blocking work
//! (spawning scripts, HTTP calls) happens only in [`Navigator::execute`], so
//! a renderer can move that call off its UI thread.
//!
//! A failure never discards history: the stack is left untouched and
//! [`Navigator::dismiss_error`] returns to the last good page.
//!
//! ## Input substitution
//!
//! Values collected for an action's inputs replace `${input:<name>}`
//! placeholders in the action's command arguments, command stdin, `text`,
//! `target` and `page`.

use crate::command::{Command, CommandError, CommandInput};
use crate::config::Dirs;
use crate::exec::ExecError;
use crate::schema::{self, Action, ActionType, DetailPage, Input, OnSuccess, Page, Values};
use crate::validate::ValidationError;
use std::collections::BTreeMap;
use std::io;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("output is not a valid page: {0}")]
    Validation(#[from] ValidationError),
    #[error("{kind} action is missing `{field}`")]
    Incomplete {
        kind: ActionType,
        field: &'static str,
    },
    #[error("failed to {effect} `{value}`: {source}")]
    Effect {
        effect: &'static str,
        value: String,
        #[source]
        source: io::Error,
    },
}

/// OS integrations and prompts the navigator delegates to the host.
pub trait Effects {
    fn copy(&mut self, text: &str) -> io::Result<()>;
    fn open(&mut self, target: &str) -> io::Result<()>;
    /// Ask the user to confirm `action`. Returning `false` cancels it.
    fn confirm(&mut self, action: &Action) -> bool;
}

#[derive(Debug)]
pub enum State {
    /// Showing the top frame's page.
    Idle,
    /// Collecting values for the action's inputs over the top frame's page.
    AwaitingInput(Action),
    /// Ready to run; call [`Navigator::execute`].
    Executing(Action),
    Error(NavigationError),
    /// The session is over.
    Exited,
}

/// Where a frame's page came from, for reloading.
#[derive(Debug)]
enum Origin {
    Command { command: Command, input: CommandInput },
    Output(schema::Command),
}

#[derive(Debug)]
struct Frame {
    origin: Origin,
    page: Page,
}

impl Frame {
    fn reload(&self, input: Option<&CommandInput>) -> Result<Page, NavigationError> {
        match &self.origin {
            Origin::Command {
                command,
                input: original,
            } => Ok(command.run(input.unwrap_or(original))?),
            Origin::Output(command) => decode_output(&command.output()?),
        }
    }
}

pub struct Navigator {
    dirs: Dirs,
    home: Command,
    root: Frame,
    stack: Vec<Frame>,
    state: State,
    /// Arguments to rerun the top frame with, set by an argument form.
    pending_input: Option<CommandInput>,
}

impl Navigator {
    /// Run `root` and show its page.
    pub fn start(root: Command, dirs: Dirs) -> Result<Self, NavigationError> {
        let input = CommandInput::default();
        let page = root.run(&input)?;
        Ok(Self {
            dirs,
            home: root.clone(),
            root: Frame {
                origin: Origin::Command {
                    command: root,
                    input,
                },
                page,
            },
            stack: Vec::new(),
            state: State::Idle,
            pending_input: None,
        })
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// The page on screen.
    pub fn page(&self) -> &Page {
        &self.top().page
    }

    /// Number of frames, counting the root.
    pub fn depth(&self) -> usize {
        self.stack.len() + 1
    }

    fn top(&self) -> &Frame {
        self.stack.last().unwrap_or(&self.root)
    }

    fn top_mut(&mut self) -> &mut Frame {
        self.stack.last_mut().unwrap_or(&mut self.root)
    }

    /// Handle the user choosing `action` on the current page.
    ///
    /// Ignored unless the navigator is idle.
    pub fn select(&mut self, action: &Action, effects: &mut impl Effects) -> &State {
        if !matches!(self.state, State::Idle) {
            debug!(state = ?self.state, "ignoring selection while busy");
            return &self.state;
        }
        if action.confirm && !effects.confirm(action) {
            debug!(title = %action.title, "action not confirmed");
            return &self.state;
        }
        if action.inputs.is_empty() {
            self.dispatch(action, &action.inputs, &Values::new(), effects);
        } else {
            self.state = State::AwaitingInput(action.clone());
        }
        &self.state
    }

    /// Provide the values requested by [`State::AwaitingInput`].
    pub fn submit(&mut self, values: &Values, effects: &mut impl Effects) -> &State {
        let State::AwaitingInput(action) = &self.state else {
            return &self.state;
        };
        let action = action.clone();
        self.dispatch(&action, &action.inputs, values, effects);
        &self.state
    }

    /// Abandon input collection.
    pub fn cancel(&mut self) -> &State {
        if matches!(self.state, State::AwaitingInput(_)) {
            self.state = State::Idle;
        }
        &self.state
    }

    /// Submit the values of the form page on screen.
    ///
    /// A form with a submit action runs it with the values. A form without
    /// one (the missing-argument form) re-invokes the frame's command with
    /// the values appended to its arguments, in item order.
    pub fn submit_form(&mut self, values: &Values, effects: &mut impl Effects) -> &State {
        if !matches!(self.state, State::Idle) {
            return &self.state;
        }
        let Page::Form(form) = &self.top().page else {
            debug!("submit_form on a page that is not a form");
            return &self.state;
        };

        if let Some(submit) = form.submit_action.clone() {
            let inputs: Vec<Input> = form.inputs().cloned().collect();
            if submit.confirm && !effects.confirm(&submit) {
                return &self.state;
            }
            self.dispatch(&submit, &inputs, values, effects);
            return &self.state;
        }

        let rendered = render_values(&form.items, values);
        let mut extra: Vec<String> = form
            .items
            .iter()
            .map(|input| rendered.get(&input.name).cloned().unwrap_or_default())
            .collect();
        // Blank optional fields at the end are omitted, not passed as "".
        while extra.last().is_some_and(String::is_empty) {
            extra.pop();
        }
        if let Origin::Command { input, .. } = &self.top().origin {
            let mut input = input.clone();
            input.arguments.extend(extra);
            self.pending_input = Some(input);
        }
        self.state = State::Executing(Action::reload("Submit"));
        &self.state
    }

    /// Perform the blocking work of [`State::Executing`].
    pub fn execute(&mut self, effects: &mut impl Effects) -> &State {
        let State::Executing(action) = &self.state else {
            return &self.state;
        };
        let action = action.clone();
        self.state = match self.perform(&action, effects) {
            Ok(next) => next,
            Err(err) => {
                info!(error = %err, "action failed");
                self.pending_input = None;
                State::Error(err)
            }
        };
        &self.state
    }

    /// Leave the error state, back to the last good page.
    pub fn dismiss_error(&mut self) -> &State {
        if matches!(self.state, State::Error(_)) {
            self.state = State::Idle;
        }
        &self.state
    }

    /// Pop the top frame. The root frame is never popped.
    pub fn back(&mut self) -> bool {
        if !matches!(self.state, State::Idle) || self.stack.is_empty() {
            return false;
        }
        self.stack.pop();
        true
    }

    /// Apply input values, then either act immediately or queue blocking work.
    fn dispatch(
        &mut self,
        action: &Action,
        inputs: &[Input],
        values: &Values,
        effects: &mut impl Effects,
    ) {
        let action = substitute(action, &render_values(inputs, values));
        self.state = match action.kind {
            ActionType::Copy => match action.text.as_deref() {
                Some(text) => settle(effect("copy", text, |v| effects.copy(v))),
                None => State::Error(incomplete(&action, "text")),
            },
            ActionType::Open => match action.target.as_deref() {
                Some(target) => settle(effect("open", target, |v| effects.open(v))),
                None => State::Error(incomplete(&action, "target")),
            },
            ActionType::Exit => State::Exited,
            ActionType::Push | ActionType::Run | ActionType::Reload => State::Executing(action),
        };
    }

    fn perform(
        &mut self,
        action: &Action,
        effects: &mut impl Effects,
    ) -> Result<State, NavigationError> {
        match action.kind {
            ActionType::Push => {
                let reference = action
                    .page
                    .as_deref()
                    .ok_or_else(|| incomplete(action, "page"))?;
                let command = Command::resolve(reference, self.top_command(), &self.dirs)?;
                let input = CommandInput::default();
                info!(title = command.title(), "pushing page");
                let page = command.run(&input)?;
                self.stack.push(Frame {
                    origin: Origin::Command { command, input },
                    page,
                });
                Ok(State::Idle)
            }
            ActionType::Reload => {
                self.reload()?;
                Ok(State::Idle)
            }
            ActionType::Run => {
                let command = action
                    .command
                    .as_ref()
                    .ok_or_else(|| incomplete(action, "command"))?;
                let output = command.output()?;
                self.on_success(action.on_success, command, output, effects)
            }
            // Performed by `dispatch`, never queued.
            ActionType::Copy | ActionType::Open | ActionType::Exit => Ok(State::Idle),
        }
    }

    fn on_success(
        &mut self,
        policy: Option<OnSuccess>,
        command: &schema::Command,
        output: Vec<u8>,
        effects: &mut impl Effects,
    ) -> Result<State, NavigationError> {
        let text = String::from_utf8_lossy(&output);
        match policy {
            None => Ok(State::Idle),
            Some(OnSuccess::Copy) => {
                effect("copy", &text, |v| effects.copy(v))?;
                Ok(State::Idle)
            }
            Some(OnSuccess::Open) => {
                effect("open", text.trim(), |v| effects.open(v))?;
                Ok(State::Idle)
            }
            Some(OnSuccess::Exit) => Ok(State::Exited),
            Some(OnSuccess::Reload) => {
                self.reload()?;
                Ok(State::Idle)
            }
            Some(OnSuccess::Push) => {
                let page = decode_output(&output)?;
                self.stack.push(Frame {
                    origin: Origin::Output(command.clone()),
                    page,
                });
                Ok(State::Idle)
            }
        }
    }

    /// Rerun the top frame and replace its page.
    fn reload(&mut self) -> Result<(), NavigationError> {
        let input = self.pending_input.take();
        let page = self.top().reload(input.as_ref())?;
        let frame = self.top_mut();
        frame.page = page;
        if let (Some(input), Origin::Command { input: current, .. }) = (input, &mut frame.origin) {
            *current = input;
        }
        Ok(())
    }

    /// The command page references are resolved against: the nearest frame
    /// that came from a launcher command.
    fn top_command(&self) -> &Command {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| match &frame.origin {
                Origin::Command { command, .. } => Some(command),
                Origin::Output(_) => None,
            })
            .unwrap_or(&self.home)
    }
}

fn incomplete(action: &Action, field: &'static str) -> NavigationError {
    NavigationError::Incomplete {
        kind: action.kind,
        field,
    }
}

fn effect(
    name: &'static str,
    value: &str,
    f: impl FnOnce(&str) -> io::Result<()>,
) -> Result<(), NavigationError> {
    f(value).map_err(|source| NavigationError::Effect {
        effect: name,
        value: value.to_string(),
        source,
    })
}

fn settle(result: Result<(), NavigationError>) -> State {
    match result {
        Ok(()) => State::Idle,
        Err(err) => State::Error(err),
    }
}

/// Interpret a `run` action's stdout as a page: JSON pages are validated,
/// anything that is not a page is shown as text.
fn decode_output(output: &[u8]) -> Result<Page, NavigationError> {
    match serde_json::from_slice::<Page>(output) {
        Ok(page) => {
            page.validate()?;
            Ok(page)
        }
        Err(_) => Ok(Page::Detail(DetailPage::with_text(
            String::from_utf8_lossy(output).into_owned(),
        ))),
    }
}

/// Render each input's value, falling back to its declared default.
fn render_values(inputs: &[Input], values: &Values) -> BTreeMap<String, String> {
    inputs
        .iter()
        .filter_map(|input| {
            let value = values
                .get(&input.name)
                .cloned()
                .or_else(|| input.default_value())?;
            Some((input.name.clone(), input.format_value(&value)))
        })
        .collect()
}

/// Replace `${input:<name>}` placeholders in one left-to-right pass.
/// Substituted values are never expanded again, and unknown names are kept.
fn expand(template: &str, vars: &BTreeMap<String, String>) -> String {
    const OPEN: &str = "${input:";
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find('}') else {
            rest = &rest[start..];
            break;
        };
        match vars.get(&after[..end]) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..start + OPEN.len() + end + 1]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn substitute(action: &Action, vars: &BTreeMap<String, String>) -> Action {
    if vars.is_empty() {
        return action.clone();
    }
    let expand_opt = |value: &Option<String>| value.as_deref().map(|v| expand(v, vars));
    Action {
        text: expand_opt(&action.text),
        target: expand_opt(&action.target),
        page: expand_opt(&action.page),
        command: action
            .command
            .as_ref()
            .map(|command| command.map_strings(|s| expand(s, vars))),
        ..action.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{InputType, InputValue};

    #[test]
    fn expand_replaces_every_occurrence() {
        let vars = BTreeMap::from([("name".to_string(), "ferris".to_string())]);
        assert_eq!(
            expand("hi ${input:name}, bye ${input:name}", &vars),
            "hi ferris, bye ferris"
        );
        assert_eq!(expand("${input:other}", &vars), "${input:other}");
    }

    #[test]
    fn expanded_values_are_not_expanded_again() {
        let vars = BTreeMap::from([
            ("a".to_string(), "${input:b}".to_string()),
            ("b".to_string(), "SECRET".to_string()),
        ]);
        let action = substitute(&Action::copy("Copy", "${input:a}"), &vars);
        assert_eq!(action.text.as_deref(), Some("${input:b}"));
        assert_eq!(expand("${input:b}${input:a}", &vars), "SECRET${input:b}");
    }

    #[test]
    fn unterminated_placeholder_is_kept() {
        let vars = BTreeMap::from([("a".to_string(), "x".to_string())]);
        assert_eq!(expand("${input:a} ${input:a", &vars), "x ${input:a");
    }

    #[test]
    fn render_values_uses_defaults_and_substitutions() {
        let inputs = vec![
            Input::text_field("query"),
            Input {
                kind: InputType::Checkbox,
                true_substitution: Some("--all".into()),
                ..Input::text_field("all")
            },
            Input {
                default: Some(serde_json::json!("main")),
                ..Input::text_field("branch")
            },
        ];
        let values = Values::from([
            ("query".to_string(), InputValue::Text("bug".into())),
            ("all".to_string(), InputValue::Bool(true)),
        ]);
        let rendered = render_values(&inputs, &values);
        assert_eq!(rendered["query"], "bug");
        assert_eq!(rendered["all"], "--all");
        assert_eq!(rendered["branch"], "main");
    }

    #[test]
    fn substitute_touches_command_and_literals() {
        let action = Action {
            text: Some("copy ${input:x}".into()),
            page: Some("./${input:x}.sh".into()),
            command: Some(
                schema::Command::new(["echo", "${input:x}"])
                    .unwrap()
                    .with_input("stdin ${input:x}"),
            ),
            ..Action::run("Run", schema::Command::new(["true"]).unwrap())
        };
        let vars = BTreeMap::from([("x".to_string(), "42".to_string())]);
        let expanded = substitute(&action, &vars);
        assert_eq!(expanded.text.as_deref(), Some("copy 42"));
        assert_eq!(expanded.page.as_deref(), Some("./42.sh"));
        let command = expanded.command.unwrap();
        assert_eq!(command.args(), ["echo", "42"]);
        assert_eq!(command.input(), Some("stdin 42"));
    }

    #[test]
    fn non_page_output_becomes_detail() {
        let page = decode_output(b"plain text\n").unwrap();
        assert!(matches!(page, Page::Detail(d) if d.text() == "plain text\n"));
    }

    #[test]
    fn page_output_is_decoded_and_validated() {
        let page = decode_output(br#"{"type": "list", "items": [{"title": "a"}]}"#).unwrap();
        assert_eq!(page.kind(), "list");

        let invalid = decode_output(br#"{"type": "form"}"#);
        assert!(matches!(invalid, Err(NavigationError::Validation(_))));
    }

    // =========================================================================
    // Navigator sessions over real scripts
    // =========================================================================

    #[cfg(unix)]
    mod session {
        use super::*;
        use crate::command::{CommandError, RootCommand};
        use crate::test_helpers::*;
        use tempfile::TempDir;

        #[derive(Default)]
        struct Recorder {
            copied: Vec<String>,
            opened: Vec<String>,
            decline: bool,
        }

        impl Effects for Recorder {
            fn copy(&mut self, text: &str) -> io::Result<()> {
                self.copied.push(text.to_string());
                Ok(())
            }
            fn open(&mut self, target: &str) -> io::Result<()> {
                self.opened.push(target.to_string());
                Ok(())
            }
            fn confirm(&mut self, _action: &Action) -> bool {
                !self.decline
            }
        }

        fn start(tmp: &TempDir) -> Navigator {
            let root = Command::Root(RootCommand::new(tmp.path()));
            Navigator::start(root, test_dirs(tmp)).unwrap()
        }

        fn open_item(nav: &mut Navigator, title: &str, fx: &mut Recorder) {
            let action = primary_action(find_item(nav.page(), title)).clone();
            assert!(matches!(nav.select(&action, fx), State::Executing(_)));
            nav.execute(fx);
        }

        #[test]
        fn push_and_back() {
            let tmp = TempDir::new().unwrap();
            let header = script_header("Greet", "static", &[]);
            write_script(tmp.path(), "greet.sh", &format!("{header}echo hello\n"));
            let mut fx = Recorder::default();

            let mut nav = start(&tmp);
            assert_eq!(nav.page().title(), "Commands");
            assert!(!nav.back());

            open_item(&mut nav, "Greet", &mut fx);
            assert!(matches!(nav.state(), State::Idle));
            assert_eq!(nav.depth(), 2);
            assert_eq!(detail_text(nav.page()), "hello\n");

            assert!(nav.back());
            assert_eq!(nav.depth(), 1);
            assert_eq!(nav.page().title(), "Commands");
        }

        #[test]
        fn failure_keeps_the_stack() {
            let tmp = TempDir::new().unwrap();
            let header = script_header("Broken", "interactive", &[]);
            write_script(
                tmp.path(),
                "broken.sh",
                &format!("{header}echo oops >&2\nexit 3\n"),
            );
            let mut fx = Recorder::default();

            let mut nav = start(&tmp);
            open_item(&mut nav, "Broken", &mut fx);
            assert!(matches!(
                nav.state(),
                State::Error(NavigationError::Command(CommandError::Exec(
                    ExecError::Exit { code: 3, .. }
                )))
            ));
            assert_eq!(nav.depth(), 1);
            assert!(!nav.back());

            assert!(matches!(nav.dismiss_error(), State::Idle));
            assert_eq!(nav.page().title(), "Commands");
        }

        #[test]
        fn argument_form_reruns_with_values() {
            let tmp = TempDir::new().unwrap();
            let header = script_header("Hello", "static", &[("name", false)]);
            write_script(tmp.path(), "hello.sh", &format!("{header}echo \"hi $1\"\n"));
            let mut fx = Recorder::default();

            let mut nav = start(&tmp);
            open_item(&mut nav, "Hello", &mut fx);
            let Page::Form(form) = nav.page() else {
                panic!("expected an argument form, got {}", nav.page().kind());
            };
            assert_eq!(form.items[0].name, "name");

            let values = Values::from([("name".to_string(), InputValue::Text("ferris".into()))]);
            assert!(matches!(nav.submit_form(&values, &mut fx), State::Executing(_)));
            nav.execute(&mut fx);
            assert_eq!(detail_text(nav.page()), "hi ferris\n");
            assert_eq!(nav.depth(), 2);
        }

        #[test]
        fn blank_optional_arguments_are_not_passed() {
            let tmp = TempDir::new().unwrap();
            let header = script_header("Count", "static", &[("name", false), ("extra", true)]);
            write_script(tmp.path(), "count.sh", &format!("{header}echo \"$# $1\"\n"));
            let mut fx = Recorder::default();

            let mut nav = start(&tmp);
            open_item(&mut nav, "Count", &mut fx);
            assert!(matches!(nav.page(), Page::Form(_)));

            let values = Values::from([
                ("name".to_string(), InputValue::Text("ferris".into())),
                ("extra".to_string(), InputValue::Text(String::new())),
            ]);
            assert!(matches!(nav.submit_form(&values, &mut fx), State::Executing(_)));
            nav.execute(&mut fx);
            assert_eq!(detail_text(nav.page()), "1 ferris\n");
        }

        #[test]
        fn inputs_are_collected_then_substituted() {
            let tmp = TempDir::new().unwrap();
            let mut fx = Recorder::default();
            let mut nav = start(&tmp);

            let action = Action {
                inputs: vec![Input::text_field("word")],
                ..Action::copy("Copy", "say ${input:word}")
            };
            assert!(matches!(nav.select(&action, &mut fx), State::AwaitingInput(_)));
            assert!(fx.copied.is_empty());

            let values = Values::from([("word".to_string(), InputValue::Text("cheese".into()))]);
            assert!(matches!(nav.submit(&values, &mut fx), State::Idle));
            assert_eq!(fx.copied, ["say cheese"]);
        }

        #[test]
        fn cancel_abandons_input() {
            let tmp = TempDir::new().unwrap();
            let mut fx = Recorder::default();
            let mut nav = start(&tmp);

            let action = Action {
                inputs: vec![Input::text_field("url")],
                ..Action::open("Open", "${input:url}")
            };
            nav.select(&action, &mut fx);
            assert!(matches!(nav.cancel(), State::Idle));
            assert!(fx.opened.is_empty());
        }

        #[test]
        fn declined_confirmation_does_nothing() {
            let tmp = TempDir::new().unwrap();
            let mut fx = Recorder {
                decline: true,
                ..Recorder::default()
            };
            let mut nav = start(&tmp);

            let action = Action {
                confirm: true,
                ..Action::copy("Copy", "secret")
            };
            assert!(matches!(nav.select(&action, &mut fx), State::Idle));
            assert!(fx.copied.is_empty());
        }

        #[test]
        fn run_output_is_pushed_as_detail() {
            let tmp = TempDir::new().unwrap();
            let mut fx = Recorder::default();
            let mut nav = start(&tmp);

            let action = Action {
                on_success: Some(OnSuccess::Push),
                ..Action::run("Run", schema::Command::new(["echo", "from run"]).unwrap())
            };
            nav.select(&action, &mut fx);
            nav.execute(&mut fx);
            assert_eq!(nav.depth(), 2);
            assert_eq!(detail_text(nav.page()), "from run\n");
        }

        #[test]
        fn run_output_is_copied() {
            let tmp = TempDir::new().unwrap();
            let mut fx = Recorder::default();
            let mut nav = start(&tmp);

            let action = Action {
                on_success: Some(OnSuccess::Copy),
                ..Action::run("Run", schema::Command::parse("printf abc").unwrap())
            };
            nav.select(&action, &mut fx);
            assert!(matches!(nav.execute(&mut fx), State::Idle));
            assert_eq!(fx.copied, ["abc"]);
            assert_eq!(nav.depth(), 1);
        }

        #[test]
        fn run_output_is_opened_trimmed() {
            let tmp = TempDir::new().unwrap();
            let mut fx = Recorder::default();
            let mut nav = start(&tmp);

            let command = schema::Command::new(["echo", "https://example.com"]).unwrap();
            let action = Action {
                on_success: Some(OnSuccess::Open),
                ..Action::run("Run", command)
            };
            nav.select(&action, &mut fx);
            nav.execute(&mut fx);
            assert_eq!(fx.opened, ["https://example.com"]);
        }

        #[test]
        fn run_then_exit_or_reload() {
            let tmp = TempDir::new().unwrap();
            let mut fx = Recorder::default();
            let mut nav = start(&tmp);

            let reload = Action {
                on_success: Some(OnSuccess::Reload),
                ..Action::run("Run", schema::Command::new(["true"]).unwrap())
            };
            let header = script_header("Fresh", "static", &[]);
            write_script(tmp.path(), "fresh.sh", &format!("{header}echo fresh\n"));
            nav.select(&reload, &mut fx);
            assert!(matches!(nav.execute(&mut fx), State::Idle));
            find_item(nav.page(), "Fresh");

            let exit = Action {
                on_success: Some(OnSuccess::Exit),
                ..Action::run("Run", schema::Command::new(["true"]).unwrap())
            };
            nav.select(&exit, &mut fx);
            assert!(matches!(nav.execute(&mut fx), State::Exited));
        }

        #[test]
        fn failed_run_is_an_error() {
            let tmp = TempDir::new().unwrap();
            let mut fx = Recorder::default();
            let mut nav = start(&tmp);

            let action = Action {
                on_success: Some(OnSuccess::Copy),
                ..Action::run("Run", schema::Command::new(["false"]).unwrap())
            };
            nav.select(&action, &mut fx);
            assert!(matches!(
                nav.execute(&mut fx),
                State::Error(NavigationError::Exec(ExecError::Exit { code: 1, .. }))
            ));
            assert!(fx.copied.is_empty());
        }

        #[test]
        fn exit_ends_the_session() {
            let tmp = TempDir::new().unwrap();
            let mut fx = Recorder::default();
            let mut nav = start(&tmp);

            assert!(matches!(nav.select(&Action::exit("Quit"), &mut fx), State::Exited));
            assert!(matches!(
                nav.select(&Action::copy("Copy", "late"), &mut fx),
                State::Exited
            ));
            assert!(fx.copied.is_empty());
            assert!(matches!(nav.execute(&mut fx), State::Exited));
            assert!(matches!(nav.submit(&Values::new(), &mut fx), State::Exited));
        }

        #[test]
        fn reload_picks_up_new_scripts() {
            let tmp = TempDir::new().unwrap();
            let mut fx = Recorder::default();
            let mut nav = start(&tmp);
            assert!(matches!(nav.page(), Page::List(list) if list.items.is_empty()));

            let header = script_header("Late", "static", &[]);
            write_script(tmp.path(), "late.sh", &format!("{header}echo late\n"));
            nav.select(&Action::reload("Reload"), &mut fx);
            nav.execute(&mut fx);
            find_item(nav.page(), "Late");
        }
    }
}
