//! Structured GraphQL query documents.
//!
//! Queries are assembled as a tree of [`Selection`]s and rendered to text in
//! one place, so caller-supplied values (account keys, limits) only ever
//! reach the wire as escaped argument literals or validated aliases.

use std::fmt::Write;

use crate::request::GraphQlRequest;

/// A typed GraphQL argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Int(u64),
    /// Rendered as a quoted, escaped string literal.
    String(String),
    /// Rendered bare, e.g. `RECEIVEDTIME_DESC`.
    Enum(String),
}

impl Argument {
    fn render(&self, out: &mut String) {
        match self {
            Self::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Self::Enum(e) => out.push_str(e),
            Self::String(s) => {
                out.push('"');
                for c in s.chars() {
                    match c {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        '\t' => out.push_str("\\t"),
                        c if c.is_control() => {
                            let _ = write!(out, "\\u{:04x}", c as u32);
                        }
                        c => out.push(c),
                    }
                }
                out.push('"');
            }
        }
    }
}

/// One field of a selection set, with optional alias, arguments and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<(String, Argument)>,
    pub children: Vec<Selection>,
}

impl Selection {
    /// A bare leaf field.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
            arguments: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A list of leaf fields, in order.
    pub fn fields(names: &[&str]) -> Vec<Self> {
        names.iter().map(|n| Self::field(*n)).collect()
    }

    /// Set the response key for this field.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Append an argument.
    pub fn arg(mut self, name: impl Into<String>, value: Argument) -> Self {
        self.arguments.push((name.into(), value));
        self
    }

    /// Append child selections.
    pub fn select(mut self, children: impl IntoIterator<Item = Selection>) -> Self {
        self.children.extend(children);
        self
    }

    /// The key this field appears under in the response.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    fn render(&self, out: &mut String, depth: usize) {
        indent(out, depth);
        if let Some(alias) = &self.alias {
            out.push_str(alias);
            out.push_str(": ");
        }
        out.push_str(&self.name);
        if !self.arguments.is_empty() {
            out.push('(');
            for (i, (name, value)) in self.arguments.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(name);
                out.push_str(": ");
                value.render(out);
            }
            out.push(')');
        }
        if !self.children.is_empty() {
            out.push_str(" {\n");
            for child in &self.children {
                child.render(out, depth + 1);
            }
            indent(out, depth);
            out.push('}');
        }
        out.push('\n');
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// Returns `true` if `s` matches the GraphQL `Name` grammar
/// (`[_A-Za-z][_0-9A-Za-z]*`) and can therefore be used as an alias.
pub fn is_valid_alias(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// A named `query` operation made of top-level selections.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDocument {
    pub operation_name: String,
    pub selections: Vec<Selection>,
}

impl QueryDocument {
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            selections: Vec::new(),
        }
    }

    /// Append a top-level selection.
    pub fn push(&mut self, selection: Selection) {
        self.selections.push(selection);
    }

    /// Render the document as GraphQL source text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("query ");
        out.push_str(&self.operation_name);
        out.push_str(" {\n");
        for selection in &self.selections {
            selection.render(&mut out, 1);
        }
        out.push_str("}\n");
        out
    }

    /// Wrap the rendered document in the POST envelope.
    pub fn to_request(&self) -> GraphQlRequest {
        GraphQlRequest::new(self.operation_name.clone(), self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_selection() {
        let mut doc = QueryDocument::new("Fetch");
        doc.push(
            Selection::field("blocks")
                .arg("limit", Argument::Int(10))
                .arg("sortBy", Argument::Enum("RECEIVEDTIME_DESC".into()))
                .select(Selection::fields(&["blockHeight", "stateHash"])),
        );
        assert_eq!(
            doc.render(),
            "query Fetch {\n  blocks(limit: 10, sortBy: RECEIVEDTIME_DESC) {\n    blockHeight\n    stateHash\n  }\n}\n"
        );
    }

    #[test]
    fn renders_alias_and_escapes_strings() {
        let sel = Selection::field("account")
            .alias("acct")
            .arg("publicKey", Argument::String("a\"b\\c\n".into()))
            .select([Selection::field("leafHash")]);
        let mut out = String::new();
        sel.render(&mut out, 0);
        assert_eq!(
            out,
            "acct: account(publicKey: \"a\\\"b\\\\c\\n\") {\n  leafHash\n}\n"
        );
        assert_eq!(sel.response_key(), "acct");
    }

    #[test]
    fn alias_grammar() {
        assert!(is_valid_alias("B62qiy32p8kAKnny8ZFwoMhYpBppM1DWVCqAPBYNcXnsAHhnfAAuXgg"));
        assert!(is_valid_alias("_x1"));
        assert!(!is_valid_alias(""));
        assert!(!is_valid_alias("1abc"));
        assert!(!is_valid_alias("abc) { evil }"));
        assert!(!is_valid_alias("ab-c"));
    }

    #[test]
    fn request_envelope_uses_operation_name() {
        let doc = QueryDocument::new("Query");
        let req = doc.to_request();
        assert_eq!(req.operation_name, "Query");
        assert_eq!(req.query, "query Query {\n}\n");
    }
}
