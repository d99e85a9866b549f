//! Parser for the line-oriented specification syntax.
//!
//! ```text
//! # comment
//! // comment
//! "port"(as: Integer, range: 1..65535)
//! "mail.from"(email: {customTLDs: [local]})
//! "items.[*].field"(
//!     matches: "a\\..*",
//!     size: 1..<64,
//! )
//! ```
//!
//! A statement is a key followed by a parenthesized list of
//! `name: expectation` pairs and may span lines while its brackets are open.
//! Expectations are ranges (`1..10`, `0..<8`, `"a".."m"`) or YAML flow
//! values. The `as` name registers a type conversion; every other name is a
//! constraint looked up in the registry.

use crate::constraints::{CollectionKey, Constraint, ConstraintRegistry, MultiKeyConstraint};
use crate::core::{ConfigSpecification, RangeBound, SourceLine, TypeConverter, Value, ValueRange};
use crate::error::ConfigError;
use bigdecimal::BigDecimal;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

/// Directive name for type conversions.
pub const CONVERSION_DIRECTIVE: &str = "as";

/// Parses the text of one specification file.
///
/// Each file gets its own parser; nothing is shared between files except
/// the read-only registry.
#[derive(Debug)]
pub struct SpecificationParser<'a> {
    registry: &'a ConstraintRegistry,
    file: PathBuf,
}

#[derive(Debug, PartialEq)]
struct Statement {
    line: usize,
    text: String,
}

#[derive(Debug, PartialEq)]
struct Declaration {
    key: String,
    arguments: Vec<(String, String)>,
}

impl<'a> SpecificationParser<'a> {
    /// Parser for statements read from `file`.
    pub fn new(registry: &'a ConstraintRegistry, file: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            file: file.into(),
        }
    }

    /// Parse `text` into a specification.
    ///
    /// Syntax problems, unknown constraint names and invalid conversions are
    /// recorded as errors of the returned specification; parsing always
    /// continues with the next statement.
    pub fn parse(&self, text: &str) -> ConfigSpecification {
        let mut converter = TypeConverter::new();
        let mut constraints = Vec::new();
        let mut errors = Vec::new();

        let (statements, unterminated) = split_statements(text);
        for statement in statements {
            let at = SourceLine::new(&self.file, statement.line);
            match parse_declaration(&statement.text) {
                Ok(declaration) => self.declare(
                    declaration,
                    &at,
                    &mut converter,
                    &mut constraints,
                    &mut errors,
                ),
                Err(reason) => errors.push(ConfigError::SpecificationSyntax {
                    defined_at: at,
                    reason,
                }),
            }
        }
        if let Some(line) = unterminated {
            errors.push(ConfigError::SpecificationSyntax {
                defined_at: SourceLine::new(&self.file, line),
                reason: "unterminated statement: missing ')'".to_string(),
            });
        }

        debug!(
            file = %self.file.display(),
            constraints = constraints.len(),
            conversions = converter.len(),
            errors = errors.len(),
            "Parsed specification"
        );
        ConfigSpecification::new(converter, constraints, errors)
    }

    fn declare(
        &self,
        declaration: Declaration,
        at: &SourceLine,
        converter: &mut TypeConverter,
        constraints: &mut Vec<Box<dyn Constraint>>,
        errors: &mut Vec<ConfigError>,
    ) {
        let key = declaration.key;
        let collection_key = if CollectionKey::is_collection_key(&key) {
            match CollectionKey::parse(&key) {
                Some(parsed) => Some(parsed),
                None => {
                    errors.push(ConfigError::InvalidCollectionKey {
                        key,
                        defined_at: at.clone(),
                    });
                    return;
                }
            }
        } else {
            None
        };

        for (name, text) in declaration.arguments {
            let expectation = match parse_expectation(&text) {
                Ok(expectation) => expectation,
                Err(reason) => {
                    errors.push(ConfigError::SpecificationSyntax {
                        defined_at: at.clone(),
                        reason: format!("{}: {}", name, reason),
                    });
                    continue;
                }
            };

            if name == CONVERSION_DIRECTIVE {
                if collection_key.is_some() {
                    errors.push(ConfigError::SpecificationSyntax {
                        defined_at: at.clone(),
                        reason: format!("collection key '{}' cannot be converted", key),
                    });
                    continue;
                }
                let target = match &expectation {
                    Value::String(target) => target.clone(),
                    other => other.to_string(),
                };
                if let Err(error) = converter.register(&key, &target, at.clone()) {
                    errors.push(error);
                }
                continue;
            }

            let factory = match self.registry.by_name(&name) {
                Ok(factory) => factory,
                Err(unknown) => {
                    warn!(key = %key, defined_at = %at, "{}", unknown);
                    errors.push(ConfigError::UnknownConstraint {
                        name,
                        key: key.clone(),
                        defined_at: at.clone(),
                    });
                    continue;
                }
            };
            let constraint = factory.create(&key, expectation, at.clone());
            constraints.push(match &collection_key {
                Some(collection_key) => Box::new(MultiKeyConstraint::new(
                    collection_key.clone(),
                    constraint,
                )) as Box<dyn Constraint>,
                None => constraint,
            });
        }
    }
}

/// Quote and bracket state while scanning statement text.
#[derive(Debug, Default)]
struct Scanner {
    depth: i64,
    quote: Option<char>,
    escaped: bool,
}

impl Scanner {
    /// Advance over `c`; returns whether it is structural (outside quotes).
    fn step(&mut self, c: char) -> bool {
        if let Some(quote) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' && quote == '"' {
                self.escaped = true;
            } else if c == quote {
                self.quote = None;
            }
            return false;
        }
        match c {
            '"' | '\'' => self.quote = Some(c),
            '(' | '[' | '{' => self.depth += 1,
            ')' | ']' | '}' => self.depth -= 1,
            _ => {}
        }
        true
    }
}

/// Join lines into statements, dropping comment and blank lines.
///
/// Returns the statements and, for a statement still open at end of input,
/// its first line.
fn split_statements(text: &str) -> (Vec<Statement>, Option<usize>) {
    let mut statements = Vec::new();
    let mut current: Option<(usize, String)> = None;
    let mut scanner = Scanner::default();

    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
            continue;
        }
        let (_, buffer) = current.get_or_insert_with(|| (index + 1, String::new()));
        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(trimmed);
        for c in trimmed.chars() {
            scanner.step(c);
        }
        // quotes never continue onto the next line
        scanner.quote = None;
        scanner.escaped = false;

        if scanner.depth <= 0 {
            if let Some((line, text)) = current.take() {
                statements.push(Statement { line, text });
            }
            scanner = Scanner::default();
        }
    }
    (statements, current.map(|(line, _)| line))
}

/// Byte offsets of structural `delimiter` characters at bracket depth zero.
///
/// Fails when a closing bracket has no opening partner.
fn top_level(text: &str, delimiter: char) -> Result<Vec<usize>, String> {
    let mut scanner = Scanner::default();
    let mut positions = Vec::new();
    for (offset, c) in text.char_indices() {
        let depth_before = scanner.depth;
        if scanner.step(c) && depth_before == 0 && c == delimiter {
            positions.push(offset);
        }
        if scanner.depth < 0 {
            return Err(format!("unbalanced '{}'", c));
        }
    }
    if scanner.depth != 0 {
        return Err("unbalanced brackets".to_string());
    }
    if scanner.quote.is_some() {
        return Err("unterminated string".to_string());
    }
    Ok(positions)
}

fn split_top_level(text: &str, delimiter: char) -> Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut start = 0;
    for position in top_level(text, delimiter)? {
        parts.push(&text[start..position]);
        start = position + delimiter.len_utf8();
    }
    parts.push(&text[start..]);
    Ok(parts)
}

fn parse_declaration(text: &str) -> Result<Declaration, String> {
    let (key, rest) = parse_key(text.trim())?;
    let inner = rest
        .trim_start()
        .strip_prefix('(')
        .and_then(|rest| rest.trim_end().strip_suffix(')'))
        .ok_or_else(|| format!("expected '(name: expectation, ...)' after key '{}'", key))?;

    let mut parts = split_top_level(inner, ',')?;
    if parts.last().is_some_and(|last| last.trim().is_empty()) {
        parts.pop();
    }
    if parts.is_empty() {
        return Err(format!("no constraints declared for key '{}'", key));
    }

    let arguments = parts
        .into_iter()
        .map(parse_argument)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Declaration { key, arguments })
}

fn parse_key(text: &str) -> Result<(String, &str), String> {
    let mut chars = text.char_indices();
    let key_and_rest = match chars.next() {
        Some((_, quote @ ('"' | '\''))) => {
            let mut key = String::new();
            let mut escaped = false;
            let mut end = None;
            for (offset, c) in chars {
                if escaped {
                    key.push(c);
                    escaped = false;
                } else if c == '\\' && quote == '"' {
                    escaped = true;
                } else if c == quote {
                    end = Some(offset + c.len_utf8());
                    break;
                } else {
                    key.push(c);
                }
            }
            let end = end.ok_or_else(|| "unterminated key".to_string())?;
            (key, &text[end..])
        }
        Some(_) => {
            let end = text.find('(').unwrap_or(text.len());
            let key = text[..end].trim();
            if key.contains(char::is_whitespace) {
                return Err(format!("invalid key '{}'", key));
            }
            (key.to_string(), &text[end..])
        }
        None => return Err("empty statement".to_string()),
    };
    if key_and_rest.0.trim().is_empty() {
        return Err("empty key".to_string());
    }
    Ok(key_and_rest)
}

fn parse_argument(text: &str) -> Result<(String, String), String> {
    let text = text.trim();
    let colon = top_level(text, ':')?
        .first()
        .copied()
        .ok_or_else(|| format!("expected 'name: expectation', found '{}'", text))?;
    let name = text[..colon].trim();
    let expectation = text[colon + 1..].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid constraint name '{}'", name));
    }
    if expectation.is_empty() {
        return Err(format!("missing expectation for '{}'", name));
    }
    Ok((name.to_string(), expectation.to_string()))
}

/// Parse one expectation literal.
pub(crate) fn parse_expectation(text: &str) -> Result<Value, String> {
    if let Some(range) = parse_range(text)? {
        return Ok(Value::Range(range));
    }
    serde_yaml::from_str::<serde_yaml::Value>(text)
        .map(Value::from)
        .map_err(|e| format!("invalid expectation '{}': {}", text, e))
}

fn parse_range(text: &str) -> Result<Option<ValueRange>, String> {
    let mut scanner = Scanner::default();
    let mut previous_dot = None;
    let mut operator = None;
    for (offset, c) in text.char_indices() {
        let depth_before = scanner.depth;
        let structural = scanner.step(c);
        if structural && depth_before == 0 && c == '.' {
            if previous_dot == Some(offset.wrapping_sub(1)) {
                operator = Some(offset - 1);
                break;
            }
            previous_dot = Some(offset);
        }
    }
    let Some(operator) = operator else {
        return Ok(None);
    };

    let from = text[..operator].trim();
    let rest = &text[operator + 2..];
    let (to, exclusive_end) = match rest.strip_prefix('<') {
        Some(to) => (to.trim(), true),
        None => (rest.trim(), false),
    };
    if from.is_empty() || to.is_empty() {
        return Err(format!("incomplete range '{}'", text));
    }

    let (from, to) = match (parse_bound(from)?, parse_bound(to)?) {
        (RangeBound::Integer(a), RangeBound::Decimal(b)) => {
            (RangeBound::Decimal(BigDecimal::from(a)), RangeBound::Decimal(b))
        }
        (RangeBound::Decimal(a), RangeBound::Integer(b)) => {
            (RangeBound::Decimal(a), RangeBound::Decimal(BigDecimal::from(b)))
        }
        (from, to) if from.type_name() != to.type_name() => {
            return Err(format!("range bounds of '{}' differ in type", text));
        }
        bounds => bounds,
    };
    Ok(Some(ValueRange {
        from,
        to,
        exclusive_end,
    }))
}

fn parse_bound(text: &str) -> Result<RangeBound, String> {
    let quoted = text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')));
    if quoted {
        return match serde_yaml::from_str::<serde_yaml::Value>(text) {
            Ok(serde_yaml::Value::String(s)) => Ok(RangeBound::Text(s)),
            _ => Err(format!("invalid range bound {}", text)),
        };
    }
    if let Ok(i) = text.parse::<i64>() {
        return Ok(RangeBound::Integer(i));
    }
    BigDecimal::from_str(text)
        .map(RangeBound::Decimal)
        .map_err(|_| format!("invalid range bound '{}'", text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use serde_json::json;

    fn parse(text: &str) -> ConfigSpecification {
        let registry = ConstraintRegistry::with_builtins();
        SpecificationParser::new(&registry, "app.spec").parse(text)
    }

    #[test]
    fn test_split_statements() {
        let text = "# header\n\"a\"(max: 1)\n\n// note\n\"b\"(\n  size: 1..3,\n  # inside\n  matches: \"(x\"\n)\n\"c\"(max: 2)";
        let (statements, unterminated) = split_statements(text);
        assert_eq!(unterminated, None);
        let lines: Vec<_> = statements.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![2, 5, 10]);
        assert_eq!(statements[1].text, "\"b\"(\nsize: 1..3,\nmatches: \"(x\"\n)");
    }

    #[test]
    fn test_unterminated_statement() {
        let (statements, unterminated) = split_statements("\"a\"(max: 1)\n\"b\"(max: 2,\n");
        assert_eq!(statements.len(), 1);
        assert_eq!(unterminated, Some(2));
    }

    #[test]
    fn test_parse_declaration() {
        let declaration =
            parse_declaration(r#""mail.from"(email: {customTLDs: [local, corp]}, size: 1..<64,)"#)
                .unwrap();
        assert_eq!(declaration.key, "mail.from");
        assert_eq!(
            declaration.arguments,
            vec![
                ("email".to_string(), "{customTLDs: [local, corp]}".to_string()),
                ("size".to_string(), "1..<64".to_string()),
            ]
        );

        let bare = parse_declaration("server.port(max: 10)").unwrap();
        assert_eq!(bare.key, "server.port");

        let escaped = parse_declaration(r#""we\"ird"(max: 1)"#).unwrap();
        assert_eq!(escaped.key, "we\"ird");
    }

    #[test]
    fn test_parse_declaration_errors() {
        for text in [
            "\"a\"",
            "\"a\"()",
            "\"a\"(max)",
            "\"a\"(: 1)",
            "\"a\"(max: )",
            "\"a\"(max: 1) (min: 0)",
            "\"a(max: 1)",
            "two words(max: 1)",
            "\"\"(max: 1)",
        ] {
            assert!(parse_declaration(text).is_err(), "{}", text);
        }
    }

    #[test]
    fn test_parse_expectations() {
        assert_eq!(parse_expectation("true"), Ok(Value::Bool(true)));
        assert_eq!(parse_expectation("42"), Ok(Value::Integer(42)));
        assert_eq!(parse_expectation("Integer"), Ok(Value::from("Integer")));
        assert_eq!(parse_expectation(r#""a\\..*""#), Ok(Value::from("a\\..*")));
        assert_eq!(parse_expectation("[a, b]"), Ok(Value::from(vec!["a", "b"])));
        assert_eq!(
            parse_expectation("{local: true, customTLDs: [corp]}"),
            Ok(Value::from(json!({"local": true, "customTLDs": ["corp"]})))
        );
        assert_eq!(parse_expectation("{}"), Ok(Value::Map(Default::default())));
    }

    #[test]
    fn test_parse_ranges() {
        assert_eq!(
            parse_expectation("1..65535"),
            Ok(Value::Range(ValueRange::integers(1, 65535)))
        );
        let exclusive = parse_expectation("0 ..< 8").unwrap();
        assert_eq!(exclusive.to_string(), "0..<8");

        let decimals = parse_expectation("0..1.5").unwrap();
        let Value::Range(range) = decimals else {
            panic!("expected range");
        };
        assert_eq!(range.bound_type(), "Decimal");

        let text = parse_expectation(r#""a".."m""#).unwrap();
        assert_eq!(text.to_string(), "'a'..'m'");

        assert_eq!(parse_expectation("-10..-1").unwrap().to_string(), "-10..-1");
        assert!(parse_expectation("1..").is_err());
        assert!(parse_expectation("1..\"z\"").is_err());
        assert!(parse_expectation("x..y").is_err());
        // dots inside strings and lists are not range operators
        assert_eq!(parse_expectation("\"a..b\""), Ok(Value::from("a..b")));
        assert!(matches!(parse_expectation("[1.5]"), Ok(Value::List(_))));
    }

    #[test]
    fn test_parse_builds_constraints_and_conversions() {
        let spec = parse(
            r#"
"port"(as: Integer, range: 1..65535)
"name"(size: 1..10, matches: "[a-z]+")
"items.[*].field"(matches: "a\\..*")
"#,
        );
        assert!(spec.errors().is_empty(), "{:?}", spec.errors());
        assert_eq!(spec.type_converter().keys().collect::<Vec<_>>(), vec!["port"]);
        let summary: Vec<_> = spec
            .constraints()
            .iter()
            .map(|c| (c.key(), c.name(), c.defined_at().line()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("items.[*].field", "matches", 4),
                ("name", "matches", 3),
                ("name", "size", 3),
                ("port", "range", 2),
            ]
        );
        assert_eq!(spec.constraints()[0].defined_at().file(), std::path::Path::new("app.spec"));
    }

    #[test]
    fn test_collection_constraint_is_expanded() {
        let spec = parse(r#""items.[*].field"(matches: "a\\..*")"#);
        let config = Config::single("items", Value::from(json!([{"field": "a.b"}, {"field": "bad"}])));
        let error = spec.constraints()[0].validate(&config);
        let Some(ConfigError::Multi(multi)) = error else {
            panic!("expected grouped error, got {:?}", error);
        };
        assert_eq!(multi.errors.len(), 1);
        assert_eq!(multi.errors[0].0, 1);
    }

    #[test]
    fn test_errors_do_not_stop_parsing() {
        let spec = parse(
            r#"
"a"(doesNotExist: 1, max: 5)
"b"(as: Object)
"c"(max 5)
"d.[x]"(max: 1)
"e.[*]"(as: Integer)
"f"(max: 1..x)
"g"(min: 0)
"h"(max: 1,
"#,
        );
        let errors = spec.errors();
        assert_eq!(errors.len(), 7, "{:?}", errors);
        assert!(matches!(
            &errors[0],
            ConfigError::UnknownConstraint { name, key, .. } if name == "doesNotExist" && key == "a"
        ));
        assert!(matches!(&errors[1], ConfigError::InvalidConversion { target, .. } if target == "Object"));
        assert!(matches!(&errors[2], ConfigError::SpecificationSyntax { defined_at, .. } if defined_at.line() == 4));
        assert!(matches!(&errors[3], ConfigError::InvalidCollectionKey { key, .. } if key == "d.[x]"));
        assert!(matches!(&errors[4], ConfigError::SpecificationSyntax { .. }));
        assert!(matches!(&errors[5], ConfigError::SpecificationSyntax { .. }));
        assert!(matches!(&errors[6], ConfigError::SpecificationSyntax { defined_at, .. } if defined_at.line() == 9));

        let keys: Vec<_> = spec.constraints().iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["a", "g"]);
    }
}
