//! Duplicate detection for declarations (header) and definitions (source).
//!
//! Both sides compare canonical [`Signature`] keys. A candidate whose
//! return type could not be recovered is never merged with the target,
//! even when everything else matches; it is reported with `warn!`.

use crate::decl::{find_candidates, Candidate, NameQuery};
use crate::signature::Signature;
use crate::text::{is_ident_char, mask_non_code, squash};

/// Whether `target` is already declared in the masked class body.
pub fn declaration_exists(body_masked: &str, target: &Signature) -> bool {
    let candidates = find_candidates(body_masked, &NameQuery::exact(&target.name));
    any_matches(&candidates, target)
}

/// Whether a definition of `target` (whose name is fully qualified) is
/// already in `source`.
///
/// `rendered_head` is the definition head this tool would write, such as
/// `ns::Radio::Get(int a) const`. Its whitespace-free form counts as a match
/// when it starts a name in the code and is followed by a `{`.
pub fn definition_exists(source: &str, target: &Signature, rendered_head: &str) -> bool {
    let masked = mask_non_code(source);
    if head_opens_body(&masked, &squash(rendered_head)) {
        tracing::debug!(head = rendered_head, "definition found verbatim");
        return true;
    }
    let candidates = find_candidates(&masked, &NameQuery::qualified(&target.name));
    any_matches(&candidates, target)
}

/// Whether `needle` occurs in whitespace-free `masked` right before a `{`,
/// not preceded by an identifier character or `:` in the original text.
fn head_opens_body(masked: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut squashed = String::with_capacity(masked.len());
    let mut offsets = Vec::with_capacity(masked.len());
    for (i, c) in masked.char_indices() {
        if c.is_whitespace() {
            continue;
        }
        squashed.push(c);
        offsets.extend((0..c.len_utf8()).map(|k| i + k));
    }
    squashed.match_indices(needle).any(|(at, _)| {
        let bounded = masked[..offsets[at]]
            .chars()
            .next_back()
            .map_or(true, |c| !is_ident_char(c) && c != ':');
        bounded && squashed[at + needle.len()..].starts_with('{')
    })
}

fn any_matches(candidates: &[Candidate], target: &Signature) -> bool {
    let target_key = target.key();
    for candidate in candidates {
        let found = candidate.signature();
        if found.key() == target_key {
            tracing::debug!(key = %target_key, "matching signature found");
            return true;
        }
        if found.prefix.is_empty() && !target.prefix.is_empty() && found.matches_ignoring_prefix(target) {
            tracing::warn!(
                candidate = %found,
                target = %target_key,
                "signature matches except for a missing return type; treating as distinct"
            );
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(decl: &str) -> Signature {
        Signature::parse(decl).unwrap()
    }

    #[test]
    fn declaration_found_despite_spelling_differences() {
        let body = mask_non_code("\npublic:\n    virtual void Load(std::string const & path /* abs */) const override;\n");
        assert!(declaration_exists(&body, &sig("virtual void Load(const std::string& p) const override")));
        assert!(declaration_exists(&body, &sig("void Load(const std::string&) override const")));
        assert!(!declaration_exists(&body, &sig("void Load(const std::string&)")));
        assert!(!declaration_exists(&body, &sig("bool Load(const std::string&) const override")));
    }

    #[test]
    fn overloads_are_distinct() {
        let body = mask_non_code("void Set(int v);\nvoid Set(double v);\n");
        assert!(declaration_exists(&body, &sig("void Set(double)")));
        assert!(!declaration_exists(&body, &sig("void Set(float)")));
    }

    #[test]
    fn qualified_and_commented_uses_do_not_count() {
        let body = mask_non_code("// void Receive();\nfriend void Other::Receive();\nconst char* s = \"void Receive();\";\n");
        assert!(!declaration_exists(&body, &sig("void Receive()")));
    }

    #[test]
    fn call_without_return_type_is_not_a_duplicate() {
        let body = mask_non_code("void Send() { Receive(); }\n");
        assert!(!declaration_exists(&body, &sig("void Receive()")));
    }

    #[test]
    fn definition_fast_path_ignores_whitespace() {
        let source = "#include \"radio.hpp\"\n\nvoid ns::Radio::Get( int a )  const {\n}\n";
        let target = Signature::from_parts("void", "ns::Radio::Get", "int a", "const");
        assert!(definition_exists(source, &target, "ns::Radio::Get(int a) const"));
    }

    #[test]
    fn definition_found_by_signature() {
        let source = "int ns::Radio::Get(int count,\n                   bool /*unused*/) const\n{\n    return 0;\n}\n";
        let target = Signature::from_parts("int", "ns::Radio::Get", "int n, bool flag = false", "const");
        assert!(definition_exists(source, &target, "ns::Radio::Get(int n, bool flag) const"));

        let other = Signature::from_parts("int", "ns::Radio::Get", "int n", "const");
        assert!(!definition_exists(source, &other, "ns::Radio::Get(int n) const"));
    }

    #[test]
    fn longer_class_names_and_calls_are_not_definitions() {
        let target = Signature::from_parts("void", "Radio::Receive", "", "");
        assert!(!definition_exists("void MyRadio::Receive() {\n}\n", &target, "Radio::Receive()"));
        assert!(!definition_exists(
            "void Radio::Send() {\n    Radio::Receive();\n}\n",
            &target,
            "Radio::Receive()"
        ));
        assert!(definition_exists("void Radio::Receive()\n{\n}\n", &target, "Radio::Receive()"));
    }

    #[test]
    fn commented_out_definition_does_not_count() {
        let source = "/*\nvoid Radio::Reset(int level) {}\n*/\n";
        let target = Signature::from_parts("void", "Radio::Reset", "int", "");
        assert!(!definition_exists(source, &target, "Radio::Reset(int)"));
    }
}
