//! `compost_core` is the transpiler behind the `compost` command. It turns
//! component files, plain classes annotated with an attribute directive and
//! containing embedded markup, into custom element definitions.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Component file
//!   -> Lexer (logos token stream, every byte in exactly one token)
//!   -> Markup rewriter (balanced markup blocks become render calls)
//!   -> Span extractor (brace-matched class body, comment/string aware)
//!   -> Directive parser (`// <tag-name attr! flag? .class />` into a ComponentDescriptor)
//!   -> Code generator (accessors, `requiredAttributes`, `customElements.define`)
//!   -> Build orchestrator (prelude + every unit in file name order)
//! ```
//!
//! ## Modules
//!
//! - [`config`] loads `compost.toml` or the `compost` entry of `package.json`.
//! - [`rewriter`] finds and rewrites markup blocks.
//! - [`directive`] parses the attribute directive.
//! - [`codegen`] emits the compiled class.
//! - [`project`] runs builds and checks over a component directory.
//! - [`scaffold`] backs `compost init` and `compost create`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use compost_core::build_project;
//!
//! let report = build_project(Path::new(".")).unwrap();
//! for failure in &report.failures {
//! 	eprintln!("{}: {}", failure.file.display(), failure.error);
//! }
//! ```

pub use codegen::*;
pub use config::*;
pub use directive::*;
pub use error::*;
pub use position::*;
pub use prelude::*;
pub use project::*;
pub use rewriter::*;
pub use scaffold::*;
pub use span::*;

pub mod codegen;
pub mod config;
pub mod directive;
#[allow(unused_assignments)]
mod error;
pub(crate) mod lexer;
mod position;
pub mod prelude;
pub mod project;
pub mod rewriter;
pub mod scaffold;
pub(crate) mod scanner;
mod span;
pub(crate) mod tokens;

#[cfg(test)]
mod __tests;
