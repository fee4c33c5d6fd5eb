//! Structural validation of decoded pages.
//!
//! Decoding only guarantees that a document has the right shape. A page is
//! trusted once every action carries the field its type depends on and every
//! form input is well formed:
//!
//! - `copy` needs `text`, `open` needs `target`, `push` needs `page`,
//!   `run` needs `command`
//! - `onSuccess` only appears on `run` actions
//! - inputs have a non-empty `name`, unique within their action or form
//! - dropdowns offer at least one item, and their default is one of them
//! - a form page has a submit action or at least one item
//!
//! Errors name the offending element with a dotted path such as
//! `items[2].actions[0].inputs[1]`.

use crate::schema::{Action, ActionType, Input, InputType, Page};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {reason}")]
pub struct ValidationError {
    pub path: String,
    pub reason: String,
}

impl ValidationError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: if path.is_empty() {
                "page".to_string()
            } else {
                path.to_string()
            },
            reason: reason.into(),
        }
    }
}

impl Page {
    /// Check that the populated fields are internally consistent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_actions(self.actions(), "actions")?;
        match self {
            Page::List(list) => {
                if let Some(empty) = &list.empty_view {
                    validate_actions(&empty.actions, "emptyView.actions")?;
                }
                for (i, item) in list.items.iter().enumerate() {
                    validate_actions(&item.actions, &format!("items[{i}].actions"))?;
                }
                Ok(())
            }
            Page::Detail(_) => Ok(()),
            Page::Form(form) => {
                if form.submit_action.is_none() && form.items.is_empty() {
                    return Err(ValidationError::new(
                        "",
                        "form needs a submit action or at least one item",
                    ));
                }
                validate_inputs(&form.items, "items")?;
                if let Some(submit) = &form.submit_action {
                    validate_action(submit, "submitAction")?;
                }
                let mut seen = HashSet::new();
                for input in form.inputs() {
                    if !seen.insert(input.name.as_str()) {
                        return Err(ValidationError::new(
                            "submitAction.inputs",
                            format!("input `{}` is declared twice", input.name),
                        ));
                    }
                }
                Ok(())
            }
        }
    }
}

fn validate_actions(actions: &[Action], path: &str) -> Result<(), ValidationError> {
    for (i, action) in actions.iter().enumerate() {
        validate_action(action, &format!("{path}[{i}]"))?;
    }
    Ok(())
}

/// Check one action's type-specific fields and its inputs.
pub fn validate_action(action: &Action, path: &str) -> Result<(), ValidationError> {
    let missing = |field: &str| {
        ValidationError::new(
            path,
            format!("{} action requires `{field}`", action.kind),
        )
    };
    let is_blank = |value: &Option<String>| value.as_deref().is_none_or(str::is_empty);

    match action.kind {
        ActionType::Copy if is_blank(&action.text) => return Err(missing("text")),
        ActionType::Open if is_blank(&action.target) => return Err(missing("target")),
        ActionType::Push if is_blank(&action.page) => return Err(missing("page")),
        ActionType::Run if action.command.is_none() => return Err(missing("command")),
        _ => {}
    }

    if action.kind != ActionType::Run && action.on_success.is_some() {
        return Err(ValidationError::new(
            path,
            format!("`onSuccess` is not allowed on {} actions", action.kind),
        ));
    }

    validate_inputs(&action.inputs, &format!("{path}.inputs"))
}

fn validate_inputs(inputs: &[Input], path: &str) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    for (i, input) in inputs.iter().enumerate() {
        let at = format!("{path}[{i}]");
        if input.name.is_empty() {
            return Err(ValidationError::new(&at, "input requires a `name`"));
        }
        if !names.insert(input.name.as_str()) {
            return Err(ValidationError::new(
                &at,
                format!("input `{}` is declared twice", input.name),
            ));
        }
        if input.kind == InputType::DropDown {
            if input.items.is_empty() {
                return Err(ValidationError::new(&at, "dropdown requires `items`"));
            }
            if let Some(Value::String(default)) = &input.default
                && !input.items.iter().any(|item| &item.value == default)
            {
                return Err(ValidationError::new(
                    &at,
                    format!("default `{default}` is not one of the dropdown values"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(raw: serde_json::Value) -> Page {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn well_formed_list_passes() {
        let list = page(json!({
            "type": "list",
            "items": [{
                "title": "a",
                "actions": [
                    {"type": "copy", "text": "a"},
                    {"type": "open", "target": "https://example.com"},
                    {"type": "push", "page": "./other.sh"},
                    {"type": "run", "command": ["true"], "onSuccess": "reload"},
                    {"type": "exit"},
                    {"type": "reload"}
                ]
            }]
        }));
        assert_eq!(list.validate(), Ok(()));
    }

    #[test]
    fn bare_detail_passes() {
        assert_eq!(page(json!({"type": "detail"})).validate(), Ok(()));
    }

    #[test]
    fn run_without_command_fails() {
        let list = page(json!({
            "type": "list",
            "items": [{"title": "a", "actions": [{"type": "run"}]}]
        }));
        let err = list.validate().unwrap_err();
        assert_eq!(err.path, "items[0].actions[0]");
        assert!(err.reason.contains("command"));
    }

    #[test]
    fn copy_without_text_fails() {
        let detail = page(json!({"type": "detail", "actions": [{"type": "copy"}]}));
        let err = detail.validate().unwrap_err();
        assert_eq!(err.path, "actions[0]");
        assert_eq!(err.reason, "copy action requires `text`");
    }

    #[test]
    fn push_with_empty_page_fails() {
        let detail = page(json!({"type": "detail", "actions": [{"type": "push", "page": ""}]}));
        assert!(detail.validate().is_err());
    }

    #[test]
    fn on_success_outside_run_fails() {
        let detail = page(json!({
            "type": "detail",
            "actions": [{"type": "copy", "text": "x", "onSuccess": "exit"}]
        }));
        let err = detail.validate().unwrap_err();
        assert!(err.reason.contains("onSuccess"));
    }

    #[test]
    fn empty_form_fails() {
        let form = page(json!({"type": "form"}));
        let err = form.validate().unwrap_err();
        assert_eq!(err.path, "page");
    }

    #[test]
    fn form_with_submit_action_passes() {
        let form = page(json!({
            "type": "form",
            "submitAction": {
                "type": "run",
                "command": ["echo", "${input:name}"],
                "inputs": [{"name": "name", "type": "textfield", "title": "Name"}]
            }
        }));
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn duplicate_input_names_fail() {
        let detail = page(json!({
            "type": "detail",
            "actions": [{
                "type": "run",
                "command": "true",
                "inputs": [
                    {"name": "x", "type": "textfield", "title": "X"},
                    {"name": "x", "type": "textarea", "title": "X again"}
                ]
            }]
        }));
        let err = detail.validate().unwrap_err();
        assert_eq!(err.path, "actions[0].inputs[1]");
    }

    #[test]
    fn form_item_clashing_with_submit_input_fails() {
        let form = page(json!({
            "type": "form",
            "items": [{"name": "x", "type": "textfield", "title": "X"}],
            "submitAction": {
                "type": "run",
                "command": "true",
                "inputs": [{"name": "x", "type": "textfield", "title": "X"}]
            }
        }));
        assert!(form.validate().is_err());
    }

    #[test]
    fn unnamed_input_fails() {
        let form = page(json!({
            "type": "form",
            "items": [{"name": "", "type": "textfield", "title": "Nameless"}]
        }));
        let err = form.validate().unwrap_err();
        assert_eq!(err.path, "items[0]");
    }

    #[test]
    fn dropdown_without_items_fails() {
        let form = page(json!({
            "type": "form",
            "items": [{"name": "pick", "type": "dropdown", "title": "Pick"}]
        }));
        assert!(form.validate().is_err());
    }

    #[test]
    fn dropdown_default_must_be_an_item() {
        let form = page(json!({
            "type": "form",
            "items": [{
                "name": "pick",
                "type": "dropdown",
                "title": "Pick",
                "items": [{"title": "One", "value": "1"}],
                "default": "2"
            }]
        }));
        let err = form.validate().unwrap_err();
        assert!(err.reason.contains("`2`"));
    }

    #[test]
    fn empty_view_actions_are_checked() {
        let list = page(json!({
            "type": "list",
            "emptyView": {"text": "nothing", "actions": [{"type": "open"}]}
        }));
        let err = list.validate().unwrap_err();
        assert_eq!(err.path, "emptyView.actions[0]");
    }
}
