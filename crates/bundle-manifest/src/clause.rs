//! Header clause grammar shared by `Export-Package`, `Import-Package`,
//! `Require-Bundle` and `Bundle-SymbolicName`.
//!
//! ```text
//! header    = clause ( ',' clause )*
//! clause    = name ( ';' name )* ( ';' parameter )*
//! parameter = key '=' value        (attribute)
//!           | key ':=' value       (directive)
//! ```
//!
//! Several names in one clause share its parameters, so
//! `a;b;version=1.0` declares both `a` and `b` at version `1.0`. Values may
//! be double-quoted, in which case they can contain `,` and `;`.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// One clause of a manifest header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Clause {
    /// The principal tokens (package or bundle names) sharing this clause.
    pub names: Vec<String>,
    /// `key=value` parameters, quotes removed.
    pub attributes: BTreeMap<String, String>,
    /// `key:=value` parameters, quotes removed.
    pub directives: BTreeMap<String, String>,
}

impl Clause {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn directive(&self, key: &str) -> Option<&str> {
        self.directives.get(key).map(String::as_str)
    }
}

/// Parse the value of `header` into clauses.
///
/// `header` is only used for error messages.
pub fn parse_clauses(header: &str, value: &str) -> Result<Vec<Clause>> {
    let mut clauses = Vec::new();
    for raw in split_unquoted(header, value, ',')? {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::header(header, "empty clause"));
        }
        clauses.push(parse_clause(header, raw)?);
    }
    Ok(clauses)
}

fn parse_clause(header: &str, raw: &str) -> Result<Clause> {
    let mut clause = Clause::default();

    for part in split_unquoted(header, raw, ';')? {
        let part = part.trim();
        if part.is_empty() {
            return Err(Error::header(header, format!("empty element in clause '{raw}'")));
        }

        match find_unquoted(part, '=') {
            Some(eq) => {
                let (key, value) = (&part[..eq], &part[eq + 1..]);
                let (key, directive) = match key.strip_suffix(':') {
                    Some(key) => (key.trim(), true),
                    None => (key.trim(), false),
                };
                if key.is_empty() {
                    return Err(Error::header(header, format!("parameter without a name in '{raw}'")));
                }
                let value = unquote(value.trim()).to_string();
                let target = if directive {
                    &mut clause.directives
                } else {
                    &mut clause.attributes
                };
                target.insert(key.to_string(), value);
            }
            None => {
                if !clause.attributes.is_empty() || !clause.directives.is_empty() {
                    return Err(Error::header(
                        header,
                        format!("name '{part}' follows a parameter in '{raw}'"),
                    ));
                }
                clause.names.push(part.to_string());
            }
        }
    }

    if clause.names.is_empty() {
        return Err(Error::header(header, format!("clause '{raw}' has no name")));
    }
    Ok(clause)
}

/// Split on `sep`, ignoring separators inside double quotes.
fn split_unquoted<'a>(header: &str, text: &'a str, sep: char) -> Result<Vec<&'a str>> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        if c == '"' {
            quoted = !quoted;
        } else if c == sep && !quoted {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    if quoted {
        return Err(Error::header(header, format!("unterminated quote in '{text}'")));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

fn find_unquoted(text: &str, needle: char) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        if c == '"' {
            quoted = !quoted;
        } else if c == needle && !quoted {
            return Some(i);
        }
    }
    None
}

/// Strip one pair of surrounding double quotes, if present.
pub(crate) fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}
