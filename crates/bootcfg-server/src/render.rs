//! Template rendering
//!
//! Templates are Jinja (minijinja) with strict undefined handling: a
//! reference to a key missing from the context fails the render instead of
//! producing an empty string. Output is not escaped and a trailing newline
//! in the source is kept.
//!
//! Two functions are available to every template:
//!
//! - `indent(spaces, content)` prefixes each line of `content`, the first
//!   included, with a newline and `spaces` blanks
//! - `include(name, data)` renders the named Ignition template with `data`
//!   and returns the text inline
//!
//! ```text
//! systemd:
//!   units:{{ indent(4, include("etcd-unit", data)) }}
//! ```

use crate::context::RenderContext;
use crate::store::{Store, StoreError};
use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior, Value};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Maximum nesting of `include` calls
pub const MAX_INCLUDE_DEPTH: usize = 16;

/// Errors from template rendering
#[derive(Debug, Error)]
pub enum RenderError {
    /// Parse or evaluation failure, including missing context keys
    #[error("template error: {0}")]
    Template(#[source] Error),

    #[error("no include template named: {0}")]
    IncludeNotFound(String),

    #[error("duplicate template fragment: {0}")]
    DuplicateFragment(String),

    #[error("no entry fragment given")]
    MissingEntry,

    #[error("include nesting deeper than {0}")]
    IncludeDepth(usize),

    /// A selector key would shadow a metadata key in the context
    #[error("context key {0} set by both selector and metadata")]
    ContextCollision(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Where `include` finds named templates
pub trait TemplateSource: Send + Sync {
    fn fetch_template(&self, name: &str) -> std::result::Result<String, StoreError>;
}

/// `include` source reading the store's Ignition namespace
pub struct IgnitionTemplates {
    store: Arc<dyn Store>,
}

impl IgnitionTemplates {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl TemplateSource for IgnitionTemplates {
    fn fetch_template(&self, name: &str) -> std::result::Result<String, StoreError> {
        self.store.ignition_get(name)
    }
}

/// A named piece of template source
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub name: String,
    pub source: String,
}

/// Ordered template fragments with one designated entry
///
/// The entry fragment is the one evaluated; the others are reachable from
/// it by name through `{% extends %}`, `{% import %}` or `{% include %}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragments {
    fragments: Vec<Fragment>,
    entry: Option<String>,
}

impl Fragments {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single fragment that is also the entry
    pub fn single(name: impl Into<String>, source: impl Into<String>) -> Self {
        let name = name.into();
        Self::new().with_entry(name, source)
    }

    /// Add a supporting fragment
    pub fn with_fragment(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.fragments.push(Fragment {
            name: name.into(),
            source: source.into(),
        });
        self
    }

    /// Add the fragment to evaluate
    pub fn with_entry(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        let name = name.into();
        self.entry = Some(name.clone());
        self.with_fragment(name, source)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    /// Check names are unique and the entry is present
    fn entry_name(&self) -> Result<&str> {
        let mut seen = HashSet::new();
        for fragment in &self.fragments {
            if !seen.insert(fragment.name.as_str()) {
                return Err(RenderError::DuplicateFragment(fragment.name.clone()));
            }
        }
        self.entry.as_deref().ok_or(RenderError::MissingEntry)
    }
}

/// Failure raised from inside `include`, recovered from the error chain
#[derive(Debug, Error)]
enum IncludeFailure {
    #[error("no include template named: {0}")]
    NotFound(String),
    #[error("include nesting deeper than {0}")]
    Depth(usize),
}

/// Render fragments against a context
pub fn render(
    fragments: &Fragments,
    context: &RenderContext,
    source: Arc<dyn TemplateSource>,
) -> Result<String> {
    let entry = fragments.entry_name()?;

    let mut env = environment(source, 0);
    for fragment in fragments.iter() {
        env.add_template(&fragment.name, &fragment.source)
            .map_err(classify)?;
    }

    let template = env.get_template(entry).map_err(classify)?;
    let output = template
        .render(Value::from_serialize(context))
        .map_err(classify)?;

    debug!(entry, bytes = output.len(), "rendered template");
    Ok(output)
}

/// Render a single template source against a context
pub fn render_str(
    name: &str,
    template: &str,
    context: &RenderContext,
    source: Arc<dyn TemplateSource>,
) -> Result<String> {
    render(&Fragments::single(name, template), context, source)
}

/// Prefix every line, the first included, with a newline and `spaces`
/// blanks
pub fn indent(spaces: usize, content: String) -> String {
    let pad = " ".repeat(spaces);
    let mut out = String::with_capacity(content.len() + (spaces + 1) * 4);
    for line in content.split('\n') {
        out.push('\n');
        out.push_str(&pad);
        out.push_str(line);
    }
    out
}

fn environment<'s>(source: Arc<dyn TemplateSource>, depth: usize) -> Environment<'s> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_keep_trailing_newline(true);
    env.add_function("indent", indent);
    env.add_function("include", move |name: String, data: Value| {
        include(&source, depth + 1, &name, data)
    });
    env
}

fn include(
    source: &Arc<dyn TemplateSource>,
    depth: usize,
    name: &str,
    data: Value,
) -> std::result::Result<String, Error> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(Error::new(ErrorKind::InvalidOperation, "include nested too deeply")
            .with_source(IncludeFailure::Depth(MAX_INCLUDE_DEPTH)));
    }

    let contents = source.fetch_template(name).map_err(|e| {
        if e.is_not_found() {
            Error::new(ErrorKind::InvalidOperation, format!("no include template named: {}", name))
                .with_source(IncludeFailure::NotFound(name.to_string()))
        } else {
            Error::new(ErrorKind::InvalidOperation, format!("cannot fetch include {}", name))
                .with_source(e)
        }
    })?;

    let mut env = environment(source.clone(), depth);
    env.add_template(name, &contents)?;
    env.get_template(name)?.render(data)
}

/// Map a minijinja error onto the render taxonomy
fn classify(err: Error) -> RenderError {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = cause {
        if let Some(failure) = e.downcast_ref::<IncludeFailure>() {
            let mapped = match failure {
                IncludeFailure::NotFound(name) => RenderError::IncludeNotFound(name.clone()),
                IncludeFailure::Depth(max) => RenderError::IncludeDepth(*max),
            };
            warn!(error = %err, "include failed");
            return mapped;
        }
        cause = e.source();
    }
    warn!(error = %err, "template failed");
    RenderError::Template(err)
}
