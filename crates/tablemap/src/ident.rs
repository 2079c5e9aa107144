//! Safe T-SQL identifier handling.
//!
//! [`Ident`] represents a schema/table/column name, supporting dotted notation
//! and bracket-quoted parts. Rendering always brackets every part.
//!
//! - Unquoted parts are validated against: `[A-Za-z_@#][A-Za-z0-9_@#$]*`
//! - Bracketed parts allow any characters except NUL and escape `]` as `]]`
//!
//! # Example
//! ```
//! use tablemap::Ident;
//!
//! let t = Ident::parse("dbo.Employee")?;
//! assert_eq!(t.to_sql(), "[dbo].[Employee]");
//! let c = Ident::parse("[Sales Data].[Order]")?;
//! assert_eq!(c.to_sql(), "[Sales Data].[Order]");
//! # Ok::<(), tablemap::MapError>(())
//! ```

use crate::error::{MapError, MapResult};

/// A T-SQL identifier (column, table, or schema name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<String>,
}

impl Ident {
    /// Parse an identifier string, supporting dotted and bracketed forms.
    ///
    /// - Dotted: `schema.table`
    /// - Bracketed: `[My Schema].[Order]`
    /// - Mixed: `dbo.[Order Lines]`
    pub fn parse(s: &str) -> MapResult<Self> {
        if s.is_empty() {
            return Err(MapError::configuration("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(MapError::configuration(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(MapError::configuration("Trailing '.' in identifier"));
                        }
                    }
                    Some(c) => {
                        return Err(MapError::configuration(format!(
                            "Expected '.' between identifier parts, got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'[') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some(']') => {
                            // Escaped bracket: ]]
                            if chars.peek() == Some(&']') {
                                chars.next();
                                name.push(']');
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => return Err(MapError::configuration("Unclosed bracketed identifier")),
                    }
                }
                if name.is_empty() {
                    return Err(MapError::configuration("Empty bracketed identifier"));
                }
                parts.push(name);
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let valid = if name.is_empty() {
                    c == '_' || c == '@' || c == '#' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '@' || c == '#' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !valid {
                    return Err(MapError::configuration(format!(
                        "Invalid character in identifier: '{c}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(MapError::configuration("Empty identifier segment"));
            }
            parts.push(name);
        }

        if parts.is_empty() {
            return Err(MapError::configuration("Empty identifier"));
        }

        Ok(Self { parts })
    }

    /// Render the identifier as bracketed SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            write_bracketed(&mut out, part);
        }
        out
    }
}

/// Bracket-quote a single name.
pub fn quote(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_bracketed(&mut out, name);
    out
}

fn write_bracketed(out: &mut String, name: &str) {
    out.push('[');
    for ch in name.chars() {
        if ch == ']' {
            out.push_str("]]");
        } else {
            out.push(ch);
        }
    }
    out.push(']');
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoIdent {
    fn into_ident(self) -> MapResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> MapResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> MapResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> MapResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> MapResult<Ident> {
        Ident::parse(&self)
    }
}
