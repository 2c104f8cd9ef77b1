//! Resource URI templates.
//!
//! A template such as `weather://{city}/forecast` matches concrete URIs by
//! placeholder position. `{name}` matches one path segment; `{*name}`
//! matches the rest of the URI, slashes included.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use crate::error::{Error, Result};

/// A compiled URI template.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    template: String,
    params: Vec<String>,
    pattern: Regex,
}

impl UriTemplate {
    /// Compile a template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UriTemplate`] for unbalanced braces, empty or
    /// repeated placeholder names, or names that are not identifiers.
    pub fn parse(template: &str) -> Result<Self> {
        let mut params = Vec::new();
        let mut regex = String::from("^");
        let mut rest = template;

        while let Some(open) = rest.find(['{', '}']) {
            if rest[open..].starts_with('}') {
                return Err(Error::uri_template(template, "unmatched '}'"));
            }
            regex.push_str(&regex::escape(&rest[..open]));
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| Error::uri_template(template, "unclosed placeholder"))?;
            let raw = &after[..close];
            let (name, greedy) = match raw.strip_prefix('*') {
                Some(name) => (name, true),
                None => (raw, false),
            };

            if !is_identifier(name) {
                return Err(Error::uri_template(
                    template,
                    format!("invalid placeholder name '{raw}'"),
                ));
            }
            if params.iter().any(|p| p == name) {
                return Err(Error::uri_template(
                    template,
                    format!("placeholder '{name}' appears twice"),
                ));
            }

            regex.push_str(&format!(
                "(?P<{name}>{})",
                if greedy { ".+" } else { "[^/]+" }
            ));
            params.push(name.to_string());
            rest = &after[close + 1..];
        }
        regex.push_str(&regex::escape(rest));
        regex.push('$');

        let pattern = Regex::new(&regex).map_err(|e| Error::uri_template(template, e.to_string()))?;
        Ok(Self {
            template: template.to_string(),
            params,
            pattern,
        })
    }

    /// The template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Placeholder names, in order of appearance.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Whether the template has placeholders.
    pub fn is_template(&self) -> bool {
        !self.params.is_empty()
    }

    /// Match a concrete URI, returning the placeholder values.
    pub fn matches(&self, uri: &str) -> Option<BTreeMap<String, String>> {
        let captures = self.pattern.captures(uri)?;
        Some(
            self.params
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
