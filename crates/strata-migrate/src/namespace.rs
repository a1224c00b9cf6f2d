//! Default-namespace rewriting for install and upgrade scripts.
//!
//! Scripts are written against the default schema name. Installing under
//! another name rewrites three surface forms of that name:
//!
//! | form          | example (default `stareau`) | install | upgrade |
//! |---------------|-----------------------------|---------|---------|
//! | prefix        | `stareau_valeur`            | yes     | yes     |
//! | qualifier     | `stareau.metadata`          | yes     | yes     |
//! | statement end | ` stareau;`                 | yes     | no      |
//!
//! A prefix or qualifier match only counts when the character before it is
//! not part of an identifier, so `mystareau.x` is left alone. Quoted
//! identifiers (`"stareau".x`) are not recognised.

use strata_core::SchemaName;

/// Which surface forms to rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteMode {
    /// Prefix, qualifier and statement-end forms
    Install,
    /// Prefix and qualifier forms only
    Upgrade,
}

/// Rewrites scripts from the default namespace to a target namespace.
#[derive(Debug, Clone)]
pub struct NamespaceRewriter {
    patterns: Vec<(String, String)>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl NamespaceRewriter {
    /// Build a rewriter from `default` to `target`.
    pub fn new(default: &SchemaName, target: &SchemaName, mode: RewriteMode) -> Self {
        let mut patterns = Vec::new();
        if default != target {
            patterns.push((format!("{default}_"), format!("{target}_")));
            patterns.push((format!("{default}."), format!("{target}.")));
            if mode == RewriteMode::Install {
                patterns.push((format!(" {default};"), format!(" {target};")));
            }
        }
        Self { patterns }
    }

    /// True when the target equals the default and scripts pass through.
    pub fn is_identity(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Rewrite `sql` in a single left-to-right pass.
    pub fn rewrite(&self, sql: &str) -> String {
        if self.is_identity() {
            return sql.to_string();
        }

        let mut out = String::with_capacity(sql.len());
        let mut prev: Option<char> = None;
        let mut rest = sql;
        while !rest.is_empty() {
            let at_boundary = !prev.is_some_and(is_ident_char);
            let matched = self.patterns.iter().find(|(from, _)| {
                rest.starts_with(from.as_str()) && (at_boundary || from.starts_with(' '))
            });
            if let Some((from, to)) = matched {
                out.push_str(to);
                prev = from.chars().next_back();
                rest = &rest[from.len()..];
                continue;
            }
            let Some(ch) = rest.chars().next() else {
                break;
            };
            out.push(ch);
            prev = Some(ch);
            rest = &rest[ch.len_utf8()..];
        }
        out
    }
}
