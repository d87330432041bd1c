//! Lenient declaration matching.
//!
//! This is the only module that pattern-matches C++ declaration syntax.
//! Everything above it (canonicalization, duplicate detection, insertion)
//! consumes [`Candidate`]s and [`DeclParts`], so a real tokenizer could
//! replace the heuristics here without touching the rest of the crate.
//!
//! Candidate scans expect masked text (see [`crate::text::mask_non_code`]):
//! names, braces and parentheses inside comments and literals are invisible.

use crate::signature::Signature;
use crate::text::{find_matching, find_top_level, floor_boundary, is_ident_char, strip_noise};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// How far past the closing parenthesis trailing qualifiers are looked for.
const QUALIFIER_WINDOW: usize = 200;

static RE_ACCESS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:public|private|protected)\s*:").unwrap());

static RE_TRAILING_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(~?[A-Za-z_]\w*)\s*$").unwrap());

static RE_ANY_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"~?[A-Za-z_]\w*\s*\(").unwrap());

/// A declaration split into its loose textual parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclParts {
    pub prefix: String,
    /// Last identifier before the parameter list, if any.
    pub name: Option<String>,
    pub params: String,
    pub qualifiers: String,
}

/// Split `ret name(params) quals;` into parts.
///
/// Returns `None` for empty input. Text without a parameter list yields
/// parts with no name and the whole text as prefix.
pub fn split_declaration(declaration: &str) -> Option<DeclParts> {
    let cleaned = strip_access_labels(&strip_noise(declaration));
    let cleaned = cleaned.trim().trim_end_matches(';').trim();
    if cleaned.is_empty() {
        return None;
    }

    let Some(open) = find_top_level(cleaned, '(') else {
        return Some(DeclParts {
            prefix: cleaned.to_string(),
            ..Default::default()
        });
    };
    let close = find_matching(cleaned, open).unwrap_or(cleaned.len());
    let head = &cleaned[..open];
    let params = &cleaned[(open + 1).min(cleaned.len())..close];
    let qualifiers = cleaned.get(close + 1..).unwrap_or("");

    let (prefix, name) = match RE_TRAILING_IDENT.captures(head) {
        Some(caps) => {
            let m = caps.get(1).map_or(0..0, |m| m.range());
            (head[..m.start].trim().to_string(), Some(head[m].to_string()))
        }
        None => (head.trim().to_string(), None),
    };

    Some(DeclParts {
        prefix,
        name,
        params: params.trim().to_string(),
        qualifiers: qualifiers.trim().to_string(),
    })
}

/// Blank out `public:` / `private:` / `protected:` labels (not `::`).
pub fn strip_access_labels(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut cursor = 0;
    for m in RE_ACCESS_LABEL.find_iter(s) {
        if s[m.end()..].starts_with(':') {
            continue;
        }
        out.push_str(&s[cursor..m.start()]);
        out.push(' ');
        cursor = m.end();
    }
    out.push_str(&s[cursor..]);
    out
}

/// Which function names a candidate scan looks for.
pub struct NameQuery {
    find: Regex,
    filter: Option<Regex>,
    exclude_qualified: bool,
}

impl NameQuery {
    /// One bare member name; `X::name(` uses are excluded.
    pub fn exact(name: &str) -> Self {
        NameQuery {
            find: name_call_regex(name),
            filter: None,
            exclude_qualified: true,
        }
    }

    /// A fully qualified name such as `ns::Class::method`.
    pub fn qualified(name: &str) -> Self {
        NameQuery {
            find: name_call_regex(name),
            filter: None,
            exclude_qualified: false,
        }
    }

    /// Every identifier fully matching the user pattern.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(NameQuery {
            find: RE_ANY_CALL.clone(),
            filter: Some(Regex::new(&format!("^(?:{pattern})$"))?),
            exclude_qualified: true,
        })
    }
}

fn name_call_regex(name: &str) -> Regex {
    let escaped = regex::escape(name.trim());
    // An escaped literal is always a valid pattern
    Regex::new(&format!(r"{escaped}\s*\(")).unwrap()
}

/// One place where a queried name is followed by a parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    /// Text between the previous `;`, `{` or `}` and the name.
    pub prefix: String,
    pub params: String,
    pub qualifiers: String,
    /// `;`, `{` or `}` that ended the qualifier scan, if any was found.
    pub terminator: Option<char>,
    /// From the first non-blank prefix byte to the end of the terminator.
    pub range: Range<usize>,
}

impl Candidate {
    pub fn signature(&self) -> Signature {
        Signature::from_parts(&self.prefix, &self.name, &self.params, &self.qualifiers)
    }

    pub fn is_declaration(&self) -> bool {
        self.terminator == Some(';')
    }
}

/// Find every use of the queried name followed by `(` in masked text.
pub fn find_candidates(masked: &str, query: &NameQuery) -> Vec<Candidate> {
    let mut out = Vec::new();

    for m in query.find.find_iter(masked) {
        let start = m.start();
        let Some(open) = masked[start..m.end()].rfind('(').map(|i| start + i) else {
            continue;
        };
        let name = masked[start..open].trim_end();

        if let Some(prev) = masked[..start].chars().next_back() {
            if is_ident_char(prev) || (prev == '~' && !name.starts_with('~')) {
                continue;
            }
        }
        if let Some(filter) = &query.filter {
            if !filter.is_match(name.trim_start_matches('~')) && !filter.is_match(name) {
                continue;
            }
        }
        let before = masked[..start].trim_end();
        if query.exclude_qualified && before.ends_with("::") {
            continue;
        }
        // Member access is a call, not a declaration
        if before.ends_with('.') || before.ends_with("->") {
            continue;
        }

        let Some(close) = find_matching(masked, open) else {
            continue;
        };

        let cut = masked[..start]
            .rfind([';', '{', '}'])
            .map_or(0, |i| i + 1);
        let head = &masked[cut..start];
        let prefix = strip_access_labels(head);
        let after_label = RE_ACCESS_LABEL
            .find_iter(head)
            .filter(|m| !head[m.end()..].starts_with(':'))
            .last()
            .map_or(0, |m| m.end());
        let lead = &head[after_label..];
        let decl_start = cut + after_label + (lead.len() - lead.trim_start().len());

        let window_end = floor_boundary(masked, close + 1 + QUALIFIER_WINDOW);
        let window = &masked[close + 1..window_end];
        let (qualifiers, terminator, end) = match window.find([';', '{', '}']) {
            Some(i) => {
                let t = window[i..].chars().next();
                (&window[..i], t, close + 1 + i + 1)
            }
            None => (window, None, close + 1),
        };

        out.push(Candidate {
            name: name.to_string(),
            prefix: prefix.trim().to_string(),
            params: masked[open + 1..close].to_string(),
            qualifiers: qualifiers.trim().to_string(),
            terminator,
            range: decl_start..end,
        });
    }

    out
}

/// What kind of brace scope encloses a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    TopLevel,
    Namespace,
    Class,
    /// Function bodies, initializers, lambdas and anything unrecognised.
    Other,
}

static RE_CLASS_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:class|struct|union)\b").unwrap());
static RE_NAMESPACE_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bnamespace\b|\bextern\s*$").unwrap());

/// Classify the innermost unclosed `{` before `pos` in masked text.
pub fn enclosing_scope(masked: &str, pos: usize) -> ScopeKind {
    let bytes = masked.as_bytes();
    let mut depth = 0usize;
    let mut i = pos;
    while i > 0 {
        i -= 1;
        match bytes[i] {
            b'}' => depth += 1,
            b'{' if depth > 0 => depth -= 1,
            b'{' => {
                let head_start = masked[..i].rfind([';', '{', '}']).map_or(0, |j| j + 1);
                let head = &masked[head_start..i];
                if head.contains('(') || head.contains('=') {
                    return ScopeKind::Other;
                }
                if RE_NAMESPACE_HEAD.is_match(head.trim_end()) {
                    return ScopeKind::Namespace;
                }
                if RE_CLASS_HEAD.is_match(head) {
                    return ScopeKind::Class;
                }
                return ScopeKind::Other;
            }
            _ => {}
        }
    }
    ScopeKind::TopLevel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::mask_non_code;

    #[test]
    fn split_simple_declaration() {
        let parts = split_declaration("virtual int Get(int a = 0) const override;").unwrap();
        assert_eq!(parts.prefix, "virtual int");
        assert_eq!(parts.name.as_deref(), Some("Get"));
        assert_eq!(parts.params, "int a = 0");
        assert_eq!(parts.qualifiers, "const override");
    }

    #[test]
    fn split_without_parameter_list() {
        let parts = split_declaration("int value_;").unwrap();
        assert_eq!(parts.name, None);
        assert_eq!(parts.prefix, "int value_");
        assert!(split_declaration("  ;").is_none());
    }

    #[test]
    fn split_template_return_type() {
        let parts = split_declaration("std::function<void(int)> Make(int n)").unwrap();
        assert_eq!(parts.name.as_deref(), Some("Make"));
        assert_eq!(parts.prefix, "std::function<void(int)>");
    }

    #[test]
    fn access_labels_removed_but_scope_kept() {
        assert_eq!(strip_access_labels("public: void").trim(), "void");
        assert_eq!(strip_access_labels("Base::public::x"), "Base::public::x");
    }

    #[test]
    fn candidates_recover_prefix_and_qualifiers() {
        let body = "\npublic:\n    /** Send(x) */\n    virtual void Send(int n) const override;\n    int other;\n";
        let masked = mask_non_code(body);
        let found = find_candidates(&masked, &NameQuery::exact("Send"));
        assert_eq!(found.len(), 1);
        let c = &found[0];
        assert_eq!(c.prefix, "virtual void");
        assert_eq!(c.params, "int n");
        assert_eq!(c.qualifiers, "const override");
        assert!(c.is_declaration());
        assert!(body[c.range.clone()].starts_with("virtual void Send"));
        assert!(body[c.range.clone()].ends_with(';'));
    }

    #[test]
    fn qualified_and_member_uses_are_skipped() {
        let text = "void Radio::Send();\nvoid f() { r.Send(); p->Send(); }\nvoid Resend();";
        let masked = mask_non_code(text);
        assert!(find_candidates(&masked, &NameQuery::exact("Send")).is_empty());
    }

    #[test]
    fn qualifier_scan_stops_at_terminator() {
        let text = "void A(); int B() const;";
        let found = find_candidates(text, &NameQuery::exact("A"));
        assert_eq!(found[0].qualifiers, "");
    }

    #[test]
    fn fully_qualified_query() {
        let text = "#include \"r.hpp\"\n\nvoid ns::Radio::Send(int n) {\n}\n";
        let masked = mask_non_code(text);
        let found = find_candidates(&masked, &NameQuery::qualified("ns::Radio::Send"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].prefix, "void");
        assert_eq!(found[0].terminator, Some('{'));
    }

    #[test]
    fn pattern_query_matches_whole_identifiers() {
        let text = "void setA(int); void setB(); void reset();";
        let query = NameQuery::pattern("set.*").unwrap();
        let names: Vec<String> = find_candidates(text, &query).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["setA", "setB"]);
    }

    #[test]
    fn scope_classification() {
        let text = "namespace a {\nclass B {\n  void f() { g(); }\n  void h();\n};\nvoid k();\n}\nvoid top();";
        assert_eq!(enclosing_scope(text, text.find("g()").unwrap()), ScopeKind::Other);
        assert_eq!(enclosing_scope(text, text.find("void h").unwrap()), ScopeKind::Class);
        assert_eq!(enclosing_scope(text, text.find("void k").unwrap()), ScopeKind::Namespace);
        assert_eq!(enclosing_scope(text, text.find("void top").unwrap()), ScopeKind::TopLevel);
    }
}
