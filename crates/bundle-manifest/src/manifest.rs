//! Raw `MANIFEST.MF` headers.
//!
//! Only the main section is read: parsing stops at the first blank line
//! after a header has been seen, so per-entry sections are ignored. Lines
//! starting with a single space continue the previous header's value.

use crate::error::{Error, Result};

/// Ordered manifest headers with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    headers: Vec<(String, String)>,
}

impl Manifest {
    /// Parse manifest text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers: Vec<(String, String)> = Vec::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                if headers.is_empty() {
                    continue;
                }
                break;
            }

            if let Some(continuation) = line.strip_prefix(' ') {
                match headers.last_mut() {
                    Some((_, value)) => value.push_str(continuation),
                    None => {
                        return Err(Error::header(
                            "manifest",
                            "continuation line before any header",
                        ));
                    }
                }
                continue;
            }

            let Some((name, value)) = line.split_once(':') else {
                return Err(Error::header("manifest", format!("line is not a header: '{line}'")));
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::header("manifest", format!("header without a name: '{line}'")));
            }
            headers.push((name.to_string(), value.trim_start().to_string()));
        }

        for (_, value) in &mut headers {
            let trimmed = value.trim_end().len();
            value.truncate(trimmed);
        }

        Ok(Self { headers })
    }

    /// Build a manifest from already-split headers.
    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into().trim().to_string()))
                .collect(),
        }
    }

    /// Value of the first header named `name`, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}
