//! Message codes and rendering.
//!
//! Errors never carry pre-rendered text. Each one produces a [`Message`]
//! (a code plus ordered arguments), and a [`MessageRenderer`] turns that
//! into the final string. [`DefaultMessages`] is the built-in English bundle;
//! applications supply their own renderer to localize output.

use std::collections::HashMap;
use std::fmt::Display;

/// Code used when no template exists for a constraint-specific code.
pub const GENERIC_VIOLATION: &str = "constraint.violation";

/// A message code with its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Template identifier, e.g. `constraint.size`.
    pub code: String,
    /// Arguments substituted for `{0}`, `{1}`, ...
    pub args: Vec<String>,
}

impl Message {
    /// Create a message from a code and displayable arguments.
    pub fn new<I, A>(code: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Display,
    {
        Self {
            code: code.into(),
            args: args.into_iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Renders messages into human readable text.
pub trait MessageRenderer: Send + Sync {
    /// Produce the final text for a message.
    fn render(&self, message: &Message) -> String;
}

/// English message bundle with `{n}` placeholders.
///
/// # Examples
///
/// ```rust
/// use config_validator::message::{DefaultMessages, Message, MessageRenderer};
///
/// let messages = DefaultMessages::new().with_template("greeting", "hello {0}");
/// assert_eq!(messages.render(&Message::new("greeting", ["world"])), "hello world");
/// ```
#[derive(Debug, Clone)]
pub struct DefaultMessages {
    templates: HashMap<String, String>,
}

impl DefaultMessages {
    /// Bundle with the built-in templates.
    pub fn new() -> Self {
        let templates = BUILTIN_TEMPLATES
            .iter()
            .map(|(code, template)| (code.to_string(), template.to_string()))
            .collect();
        Self { templates }
    }

    /// Replace or add the template for a code.
    pub fn with_template(mut self, code: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(code.into(), template.into());
        self
    }

    fn template_for(&self, code: &str) -> Option<&str> {
        if let Some(template) = self.templates.get(code) {
            return Some(template);
        }
        if code.starts_with("constraint.") {
            return self.templates.get(GENERIC_VIOLATION).map(String::as_str);
        }
        None
    }
}

impl Default for DefaultMessages {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRenderer for DefaultMessages {
    fn render(&self, message: &Message) -> String {
        match self.template_for(&message.code) {
            Some(template) => substitute(template, &message.args),
            None => format!("{}: {}", message.code, message.args.join(", ")),
        }
    }
}

/// Replace `{n}` placeholders with the matching argument.
///
/// Placeholders without an argument are left as written.
fn substitute(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let replaced = after.find('}').and_then(|end| {
            let index: usize = after[..end].parse().ok()?;
            let arg = args.get(index)?;
            Some((arg, end))
        });
        match replaced {
            Some((arg, end)) => {
                out.push_str(arg);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("validation.header", "Validation errors:"),
    ("load.no_such_file", "No such file or directory: {0}"),
    ("load.unsupported_format", "Unsupported configuration format: {0}"),
    ("load.failed", "Failed to load '{0}': {1}"),
    ("spec.syntax", "{0}: invalid specification statement: {1}"),
    ("spec.unknown_constraint", "{0}: no such constraint '{1}' for key '{2}'"),
    (
        "spec.invalid_conversion",
        "{0}: cannot convert key '{1}' to unknown type '{2}'",
    ),
    ("spec.invalid_collection_key", "{0}: invalid collection key '{1}'"),
    (
        "conversion.failed",
        "{0}: cannot convert value '{2}' of key '{1}' to {3}: {4}",
    ),
    (
        "constraint.invalid_expectation",
        "{0}: invalid expectation {3} for constraint '{2}' on key '{1}'",
    ),
    (
        "constraint.unsupported_type",
        "{0}: constraint '{2}' does not support value '{3}' of type {4} for key '{1}'",
    ),
    (
        "constraint.invalid_number",
        "{0}: value '{2}' of key '{1}' is not a decimal number (constraint '{3}'); numeric values must have a decimal string form",
    ),
    (
        "constraint.range_type_mismatch",
        "{0}: value '{2}' of key '{1}' has type {3} but range {4} expects {5}",
    ),
    (
        "collection.not_a_collection",
        "{0}: key '{1}' does not refer to a collection",
    ),
    (
        "collection.unsupported_property",
        "{0}: element {2} of collection '{1}' has no property '{3}'",
    ),
    (
        "collection.property_access",
        "{0}: cannot access property '{3}' of element {2} in collection '{1}': {4}",
    ),
    (
        "collection.errors",
        "{0}: validation errors for collection with key '{1}':",
    ),
    ("strict.keys_without_specification", "Keys without specification: [{0}]"),
    (
        GENERIC_VIOLATION,
        "{0}: value '{2}' of key '{1}' violates constraint '{4}' ({3})",
    ),
    ("constraint.size", "{0}: size of value '{2}' of key '{1}' must be {3}"),
    ("constraint.range", "{0}: value '{2}' of key '{1}' must be within {3}"),
    ("constraint.min", "{0}: value '{2}' of key '{1}' must be at least {3}"),
    ("constraint.max", "{0}: value '{2}' of key '{1}' must be at most {3}"),
    (
        "constraint.greaterThan",
        "{0}: value '{2}' of key '{1}' must be greater than {3}",
    ),
    ("constraint.lessThan", "{0}: value '{2}' of key '{1}' must be less than {3}"),
    (
        "constraint.matches",
        "{0}: value '{2}' of key '{1}' must match pattern '{3}'",
    ),
    (
        "constraint.creditCard",
        "{0}: value '{2}' of key '{1}' is not a valid credit card number ({3})",
    ),
    (
        "constraint.inetAddress",
        "{0}: value '{2}' of key '{1}' is not a valid IP address ({3})",
    ),
    ("constraint.email", "{0}: value '{2}' of key '{1}' is not a valid email address"),
    ("constraint.url", "{0}: value '{2}' of key '{1}' is not a valid URL"),
    ("constraint.inList", "{0}: value '{2}' of key '{1}' must be one of {3}"),
    ("constraint.type", "{0}: value '{2}' of key '{1}' must be of type {3}"),
];
