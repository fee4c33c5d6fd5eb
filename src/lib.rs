//! # Sunbeam
//!
//! A launcher protocol for scripts. Any executable that prints JSON describing
//! a page (a list, a detail view or a form) becomes a navigable command. The
//! renderer shows the page, the user picks an action, and the action either
//! runs immediately (copy, open, exit) or invokes another command whose output
//! becomes the next page.
//!
//! # Architecture: Commands Produce Pages
//!
//! ```text
//!   CommandInput ──▶ Command ──▶ Page ──▶ Navigator ──▶ Action
//!        ▲          (local,     (list,     (stack of       │
//!        │           remote,     detail,    frames)        │
//!        │           root)       form)                     │
//!        └─────────────────────────────────────────────────┘
//! ```
//!
//! Commands never talk to the renderer. They get a [`command::CommandInput`]
//! (environment, positional arguments, query) and return a [`schema::Page`].
//! The [`navigation::Navigator`] decides what to run next from the action the
//! user selected.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`schema`] | Page, item, input and action types, and the JSON shapes they decode from |
//! | [`validate`] | Structural checks on decoded pages, reported with a path to the bad element |
//! | [`exec`] | Spawning child processes, feeding stdin and capturing output |
//! | [`script`] | `@sunbeam.*` header parsing and script discovery under a root directory |
//! | [`command`] | Local, remote and root commands, and page reference resolution |
//! | [`navigation`] | The navigation state machine and the `Effects` seam for OS integrations |
//! | [`config`] | `config.toml` loading, validation and directory resolution |
//! | [`output`] | Plain-text rendering of pages and script listings for the CLI |
//!
//! # Design Decisions
//!
//! ## Static vs Interactive Scripts
//!
//! A static script is a plain shell script: whatever it prints is shown as
//! text, even if it fails. An interactive script speaks the protocol: its
//! stdout must be a valid page, and a non-zero exit is reported as an error
//! with its stderr. Keeping static scripts forgiving lets existing scripts be
//! dropped into the root directory without changes.
//!
//! ## Descriptors Are Data
//!
//! The command an action runs ([`schema::Command`]) is part of the page JSON,
//! validated on decode and never passed through a shell. Values collected from
//! inputs are substituted into its arguments, not interpolated into a command
//! line.
//!
//! ## Blocking Work Is Explicit
//!
//! The navigator separates choosing an action from executing it, so the only
//! calls that may block on a child process or the network are
//! [`command::Command::run`] and [`navigation::Navigator::execute`].

pub mod command;
pub mod config;
pub mod exec;
pub mod navigation;
pub mod output;
pub mod schema;
pub mod script;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
