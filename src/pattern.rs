//! Path patterns.
//!
//! Patterns accept `:name` or `{name}` placeholders. Matching itself is done
//! by a single-route [`matchit`] tree per pattern; this module only
//! translates syntax and decides between exact and prefix matching.

use std::collections::HashMap;

use matchit::{InsertError, Router as MatchitRouter};
use percent_encoding::percent_decode_str;

/// Catch-all parameter used for prefix patterns; never exposed to handlers.
const REST: &str = "__weft_rest";

/// A compiled path pattern.
pub struct PathPattern {
    source: String,
    tree: MatchitRouter<()>,
}

impl PathPattern {
    /// Matches the path exactly: `/users/:id` matches `/users/7` only.
    pub fn exact(path: &str) -> Result<Self, InsertError> {
        let mut tree = MatchitRouter::new();
        tree.insert(to_matchit(path), ())?;
        Ok(Self { source: path.to_owned(), tree })
    }

    /// Matches the path and everything below it: `/api` matches `/api`,
    /// `/api/` and `/api/users/7`.
    pub fn prefix(path: &str) -> Result<Self, InsertError> {
        let base = to_matchit(path);
        let rest = if base.ends_with('/') {
            format!("{base}{{*{REST}}}")
        } else {
            format!("{base}/{{*{REST}}}")
        };
        let mut tree = MatchitRouter::new();
        tree.insert(rest, ())?;
        if base != "/" {
            tree.insert(format!("{}/", base.trim_end_matches('/')), ())?;
        }
        tree.insert(base, ())?;
        Ok(Self { source: path.to_owned(), tree })
    }

    pub fn as_str(&self) -> &str { &self.source }

    /// Returns the extracted parameters on a match, percent-decoded.
    /// A value that does not decode to UTF-8 is kept as it arrived.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let matched = self.tree.at(path).ok()?;
        Some(
            matched
                .params
                .iter()
                .filter(|(k, _)| *k != REST)
                .map(|(k, v)| (k.to_owned(), decode_segment(v)))
                .collect(),
        )
    }
}

fn decode_segment(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_owned(),
    }
}

/// Whether `path` already declares a placeholder.
pub fn has_parameter(path: &str) -> bool {
    path.split('/').any(|seg| seg.starts_with(':') || seg.contains('{'))
}

/// Appends one segment to `path`: `join("/users", ":id")` is `/users/:id`.
pub fn join(path: &str, segment: &str) -> String {
    if path.ends_with('/') {
        format!("{path}{segment}")
    } else {
        format!("{path}/{segment}")
    }
}

/// Rewrites `:name` segments into matchit's `{name}` syntax.
fn to_matchit(path: &str) -> String {
    let path = if path.starts_with('/') { path.to_owned() } else { format!("/{path}") };
    path.split('/')
        .map(|seg| match seg.strip_prefix(':') {
            Some(name) => format!("{{{name}}}"),
            None => seg.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
