//! A small mustache-style template engine.
//!
//! Templates support escaped `{{path}}` and raw `{{{path}}}` placeholders,
//! `{{#if}}`/`{{else}}`, `{{#unless}}` and `{{#each}}` blocks. Rendering never
//! fails: missing values render as nothing and malformed syntax is kept as
//! literal text unless [`Options::strict`] asks for a [`ParseError`] instead.
//!
//! ```
//! use minibars::{Context, render};
//!
//! let context = Context::new().insert("user", "<Ada>").insert("admin", true).to_owned();
//! let output = render("{{#if admin}}Welcome {{user}}{{else}}Hi{{/if}}", &context);
//! assert_eq!(output, "Welcome &lt;Ada&gt;");
//! ```

mod ast;
mod context;
mod engine;
mod error;
mod escape;
mod loader;
mod options;
mod parser;
mod template;
mod value;

// Public exports.
pub use context::Context;
pub use engine::MinibarsEngine;
pub use error::{MinibarsError, MinibarsResult, ParseError, ParseErrorKind};
pub use escape::escape_html;
pub use loader::{DirectorySource, MemorySource, TemplateLoader, TemplateSource};
pub use options::{DEFAULT_MAX_DEPTH, Options};
pub use template::{PathUsage, Template, render, render_with};
pub use value::{Value, is_truthy};
