//! Signature canonicalization.
//!
//! Turns the loose pieces of a function declaration (return prefix, name,
//! parameter list, trailing qualifiers) into a comparable key. The key
//! ignores parameter names, default values, attributes, comments,
//! whitespace and the order of cv-qualifiers, and keeps only the trailing
//! qualifiers that change a member's identity.
//!
//! Canonicalization never fails: malformed input produces an approximate
//! key, which is good enough for a duplicate filter.

use crate::decl;
use crate::text::{collapse_ws, find_top_level, is_identifier, split_top_level, strip_noise};
use std::fmt;

/// Trailing qualifiers that survive canonicalization, in key order.
const QUALIFIER_ORDER: [&str; 4] = ["const", "noexcept", "override", "final"];

const CV: [&str; 2] = ["const", "volatile"];

/// Declaration specifiers that are not part of the return type.
const DECL_SPECIFIERS: &[&str] = &[
    "virtual", "static", "inline", "explicit", "constexpr", "consteval", "friend", "extern",
];

/// Keywords that may precede a type name without being the type itself.
const TYPE_LEAD_INS: &[&str] = &["const", "volatile", "struct", "class", "enum", "union", "typename"];

/// Built-in type keywords; a trailing one is never a parameter name.
const FUNDAMENTAL: &[&str] = &[
    "void", "bool", "char", "wchar_t", "char8_t", "char16_t", "char32_t", "short", "int", "long",
    "float", "double", "signed", "unsigned", "auto",
];

/// Canonical identity of one function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub prefix: String,
    pub name: String,
    pub params: Vec<String>,
    pub qualifiers: Vec<&'static str>,
}

impl Signature {
    pub fn from_parts(prefix: &str, name: &str, params: &str, qualifiers: &str) -> Self {
        Signature {
            prefix: canonical_prefix(prefix),
            name: collapse_ws(name),
            params: canonical_params(params),
            qualifiers: canonical_qualifiers(qualifiers),
        }
    }

    /// Parse a whole declaration such as `int Get(int a = 0) const;`.
    pub fn parse(declaration: &str) -> Option<Self> {
        let parts = decl::split_declaration(declaration)?;
        let name = parts.name?;
        Some(Signature::from_parts(
            &parts.prefix,
            &name,
            &parts.params,
            &parts.qualifiers,
        ))
    }

    /// Exact-match identity key.
    pub fn key(&self) -> String {
        collapse_ws(&format!(
            "{} {}({}) {}",
            self.prefix,
            self.name,
            self.params.join(", "),
            self.qualifiers.join(" ")
        ))
    }

    /// Same name, parameters and qualifiers; return prefix not compared.
    pub fn matches_ignoring_prefix(&self, other: &Signature) -> bool {
        self.name == other.name && self.params == other.params && self.qualifiers == other.qualifiers
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Canonical return prefix: specifiers dropped, cv-qualifiers first.
pub fn canonical_prefix(prefix: &str) -> String {
    let tokens: Vec<String> = tokenize(&strip_noise(prefix))
        .into_iter()
        .filter(|t| !DECL_SPECIFIERS.contains(&t.as_str()))
        .collect();
    cv_first(tokens).join(" ")
}

/// Canonical parameter type list. `(void)` is the empty list.
pub fn canonical_params(params: &str) -> Vec<String> {
    let cleaned = strip_noise(params);
    if cleaned.is_empty() || cleaned == "void" {
        return Vec::new();
    }
    split_top_level(&cleaned, ',')
        .into_iter()
        .map(canonical_type)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Canonical type of one parameter: default value and name dropped.
pub fn canonical_type(param: &str) -> String {
    let cleaned = strip_noise(param);
    let without_default = match find_top_level(&cleaned, '=') {
        Some(eq) => &cleaned[..eq],
        None => cleaned.as_str(),
    };
    let mut tokens = tokenize(without_default);
    let dims = tokens.iter().rev().take_while(|t| t.starts_with('[')).count();
    let extents = tokens.split_off(tokens.len() - dims);
    if ends_with_parameter_name(&tokens) {
        tokens.pop();
    }
    tokens.extend(extents);
    cv_first(tokens).join(" ")
}

/// Known trailing qualifiers, deduplicated, in fixed order.
pub fn canonical_qualifiers(qualifiers: &str) -> Vec<&'static str> {
    let cleaned = strip_noise(qualifiers);
    let words: Vec<&str> = cleaned
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect();
    QUALIFIER_ORDER
        .iter()
        .copied()
        .filter(|q| words.contains(q))
        .collect()
}

/// Parameter list with default values removed and names kept, for
/// out-of-line definitions.
pub fn strip_defaults(params: &str) -> String {
    let cleaned = strip_noise(params);
    if cleaned.is_empty() {
        return String::new();
    }
    split_top_level(&cleaned, ',')
        .into_iter()
        .map(|p| match find_top_level(p, '=') {
            Some(eq) => p[..eq].trim(),
            None => p.trim(),
        })
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Canonical type with pointer/reference markers re-attached to the token
/// before them: `const Foo &` -> `const Foo&`.
pub fn display_type(canonical: &str) -> String {
    canonical.replace(" &", "&").replace(" *", "*")
}

fn cv_first(tokens: Vec<String>) -> Vec<String> {
    let (mut cv, rest): (Vec<String>, Vec<String>) =
        tokens.into_iter().partition(|t| CV.contains(&t.as_str()));
    cv.sort();
    cv.extend(rest);
    cv
}

fn ends_with_parameter_name(tokens: &[String]) -> bool {
    let Some((last, before)) = tokens.split_last() else {
        return false;
    };
    is_identifier(last)
        && !FUNDAMENTAL.contains(&last.as_str())
        && !CV.contains(&last.as_str())
        && before.iter().any(|t| !TYPE_LEAD_INS.contains(&t.as_str()))
}

/// Split a cleaned type string into tokens.
///
/// `*`, `&` and `&&` are tokens of their own; template argument lists stay
/// glued to the name they follow and are canonicalized recursively;
/// parenthesized and bracketed groups become single opaque tokens.
fn tokenize(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    fn flush(current: &mut String, tokens: &mut Vec<String>) {
        if !current.is_empty() {
            tokens.push(std::mem::take(current));
        }
    }

    while i < chars.len() {
        let c = chars[i];
        match c {
            _ if c.is_whitespace() => {
                flush(&mut current, &mut tokens);
                i += 1;
            }
            '*' => {
                flush(&mut current, &mut tokens);
                tokens.push("*".to_string());
                i += 1;
            }
            '&' => {
                flush(&mut current, &mut tokens);
                if chars.get(i + 1) == Some(&'&') {
                    tokens.push("&&".to_string());
                    i += 2;
                } else {
                    tokens.push("&".to_string());
                    i += 1;
                }
            }
            '<' => {
                if current.is_empty() {
                    if let Some(prev) = tokens.last() {
                        if !matches!(prev.as_str(), "*" | "&" | "&&") {
                            current = tokens.pop().unwrap_or_default();
                        }
                    }
                }
                let close = matching_angle(&chars, i);
                let inner: String = chars[i + 1..close.unwrap_or(chars.len())].iter().collect();
                let args: Vec<String> = split_top_level(&inner, ',')
                    .into_iter()
                    .map(|a| cv_first(tokenize(a)).join(" "))
                    .collect();
                current.push('<');
                current.push_str(&args.join(", "));
                if close.is_some() {
                    current.push('>');
                }
                i = close.map_or(chars.len(), |c| c + 1);
            }
            '(' | '[' => {
                flush(&mut current, &mut tokens);
                let closer = if c == '(' { ')' } else { ']' };
                let mut depth = 0usize;
                let mut j = i;
                while j < chars.len() {
                    if chars[j] == c {
                        depth += 1;
                    } else if chars[j] == closer {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    j += 1;
                }
                let end = (j + 1).min(chars.len());
                let group: String = chars[i..end].iter().collect();
                tokens.push(collapse_ws(&group).replace("( ", "(").replace(" )", ")"));
                i = end;
            }
            _ => {
                current.push(c);
                i += 1;
            }
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}

fn matching_angle(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (j, &c) in chars.iter().enumerate().skip(open) {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j);
                }
            }
            _ => {}
        }
    }
    None
}
