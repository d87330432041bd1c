//! Class-body locator.
//!
//! Finds `class <Name> ... {` (or `struct`) and the brace that closes it
//! with a plain depth counter over masked text, so braces inside comments,
//! literals and nested scopes (lambdas, nested types) never confuse it.

use crate::model::Visibility;
use crate::text::find_matching;
use regex::Regex;
use std::ops::Range;

/// Which keyword introduced the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKey {
    Class,
    Struct,
}

impl ClassKey {
    /// Access level of members before the first label.
    pub fn default_visibility(self) -> Visibility {
        match self {
            ClassKey::Class => Visibility::Private,
            ClassKey::Struct => Visibility::Public,
        }
    }
}

/// Byte offsets of a located class definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassBounds {
    /// Start of the `class` / `struct` keyword.
    pub keyword_start: usize,
    /// Position of the opening `{`.
    pub open: usize,
    /// Position of the matching `}`.
    pub close: usize,
    pub key: ClassKey,
}

impl ClassBounds {
    /// Half-open range strictly between the braces.
    pub fn body_range(&self) -> Range<usize> {
        self.open + 1..self.close
    }
}

/// Locate the definition of class `name` in masked text (see
/// [`crate::text::mask_non_code`]).
///
/// Skips forward declarations, `enum class`, qualified uses like
/// `class Foo::Bar` and elaborated type specifiers in declarations. Returns
/// `None` if no definition is found or its braces never balance.
pub fn find_class_bounds(masked: &str, name: &str) -> Option<ClassBounds> {
    let re = Regex::new(&format!(r"\b(class|struct)\s+{}\b", regex::escape(name.trim()))).ok()?;

    for caps in re.captures_iter(masked) {
        let (Some(whole), Some(keyword)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if masked[whole.end()..].trim_start().starts_with("::") {
            continue;
        }
        let before = masked[..whole.start()].trim_end();
        if before.ends_with("::") || before.ends_with("enum") {
            continue;
        }

        let rest = &masked[whole.end()..];
        let Some(brace) = rest.find(['{', ';']) else {
            continue;
        };
        if rest.as_bytes()[brace] == b';' {
            tracing::debug!(class = name, "skipping forward declaration");
            continue;
        }
        // `struct Foo f(x) { ... }` or `class Foo x = ...` are not definitions
        if rest[..brace].contains(['(', ')', '=']) {
            continue;
        }

        let open = whole.end() + brace;
        let close = find_matching(masked, open)?;
        let key = if keyword.as_str() == "struct" {
            ClassKey::Struct
        } else {
            ClassKey::Class
        };
        return Some(ClassBounds {
            keyword_start: whole.start(),
            open,
            close,
            key,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::mask_non_code;

    fn locate(text: &str, name: &str) -> Option<ClassBounds> {
        find_class_bounds(&mask_non_code(text), name)
    }

    fn body<'a>(text: &'a str, name: &str) -> &'a str {
        let b = locate(text, name).expect("class located");
        &text[b.body_range()]
    }

    #[test]
    fn simple_class() {
        let text = "class Radio { public: void Send(); };";
        assert_eq!(body(text, "Radio"), " public: void Send(); ");
    }

    #[test]
    fn nested_braces_do_not_end_the_class() {
        let text = "class Radio {\n  struct Inner { int x; };\n  void f() { auto l = [] { return 1; }; }\n  int tail;\n};\nint after;\n";
        let b = locate(text, "Radio").unwrap();
        assert_eq!(&text[b.close..b.close + 2], "};");
        assert!(text[b.body_range()].contains("int tail;"));
        assert!(!text[b.body_range()].contains("after"));
    }

    #[test]
    fn braces_in_comments_and_literals_are_ignored() {
        let text = "class Radio {\n  // } stray\n  const char* s = \"}\";\n  /* { */ int x;\n};\n";
        let b = locate(text, "Radio").unwrap();
        assert!(text[b.body_range()].contains("int x;"));
    }

    #[test]
    fn forward_declarations_and_similar_names_are_skipped() {
        let text = "class Radio;\nclass RadioExt { };\nclass Radio : public Base {\n int x;\n};\n";
        let b = locate(text, "Radio").unwrap();
        assert!(text[b.keyword_start..].starts_with("class Radio : public Base"));
    }

    #[test]
    fn enum_class_and_qualified_uses_are_skipped() {
        let text = "enum class Mode { A, B };\nclass Outer::Mode;\nstruct Mode { int v; };\n";
        let b = locate(text, "Mode").unwrap();
        assert_eq!(b.key, ClassKey::Struct);
        assert_eq!(b.key.default_visibility(), Visibility::Public);
    }

    #[test]
    fn missing_or_unbalanced_class_is_none() {
        assert!(locate("class Other {};", "Radio").is_none());
        assert!(locate("class Radio { void f() {", "Radio").is_none());
        assert!(locate("class Radio", "Radio").is_none());
    }
}
