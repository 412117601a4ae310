//! Constructs tree-sitter-python accepts but Python 3 rejects
//!
//! The grammar still carries Python 2 statements and skips several checks
//! CPython performs while building its AST. Any of these makes the whole
//! source unparseable.

use tree_sitter::Node;

/// Why `node` is not valid Python 3, if it isn't
pub(super) fn rejected_construct(node: Node, source: &[u8]) -> Option<&'static str> {
    match node.kind() {
        "print_statement" => Some("print statement"),
        "exec_statement" => Some("exec statement"),
        "except_clause" if has_token(node, ",") => Some("comma form of except"),
        "raise_statement" if has_child(node, "expression_list") => Some("comma form of raise"),
        "comparison_operator" if has_token(node, "<>") => Some("<> operator"),
        "for_in_clause" if has_token(node, ",") => Some("unparenthesized tuple in comprehension"),
        "parameters" | "lambda_parameters" => parameter_order(node),
        "delete_statement" => {
            let mut cursor = node.walk();
            let ok = node
                .named_children(&mut cursor)
                .filter(|c| !c.is_extra())
                .all(deletable);
            (!ok).then_some("del of a non-target expression")
        }
        "integer" => node.utf8_text(source).ok().and_then(legacy_integer),
        "string_start" => node.utf8_text(source).ok().and_then(string_prefix),
        _ => None,
    }
}

fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

fn has_child(node: Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}

/// Positional parameters without a default may not follow defaulted ones
/// until `*` or `*args`. Tuple parameters are gone.
fn parameter_order(node: Node) -> Option<&'static str> {
    let mut cursor = node.walk();
    let mut seen_default = false;
    let mut keyword_only = false;

    for param in node.named_children(&mut cursor) {
        match param.kind() {
            "tuple_pattern" => return Some("tuple parameter"),
            "default_parameter" | "typed_default_parameter" => {
                if param
                    .child_by_field_name("name")
                    .is_some_and(|n| n.kind() == "tuple_pattern")
                {
                    return Some("tuple parameter");
                }
                seen_default = true;
            }
            "list_splat_pattern" | "keyword_separator" => keyword_only = true,
            "typed_parameter" => match param.named_child(0).map(|c| c.kind()) {
                Some("list_splat_pattern") => keyword_only = true,
                Some("dictionary_splat_pattern") => {}
                _ if seen_default && !keyword_only => {
                    return Some("non-default parameter after default parameter")
                }
                _ => {}
            },
            "identifier" if seen_default && !keyword_only => {
                return Some("non-default parameter after default parameter")
            }
            _ => {}
        }
    }
    None
}

/// Names, attributes, subscripts and groupings of those
fn deletable(node: Node) -> bool {
    match node.kind() {
        "identifier" | "keyword_identifier" | "attribute" | "subscript" => true,
        "tuple" | "list" | "parenthesized_expression" | "expression_list" => {
            let mut cursor = node.walk();
            let ok = node
                .named_children(&mut cursor)
                .filter(|c| !c.is_extra())
                .all(deletable);
            ok
        }
        _ => false,
    }
}

/// `10L` and `0777`
fn legacy_integer(text: &str) -> Option<&'static str> {
    if text.ends_with(['l', 'L']) {
        return Some("long integer suffix");
    }
    if text.ends_with(['j', 'J']) {
        return None;
    }

    let rest = text.strip_prefix('0')?;
    let decimal = !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit() || b == b'_');
    let nonzero = rest.bytes().any(|b| matches!(b, b'1'..=b'9'));
    (decimal && nonzero).then_some("leading zeros in decimal integer")
}

/// Backtick repr and prefixes such as `ur`
fn string_prefix(text: &str) -> Option<&'static str> {
    if text.contains('`') {
        return Some("backtick repr");
    }

    let prefix = text.trim_end_matches(['"', '\'']).to_ascii_lowercase();
    match prefix.as_str() {
        "" | "r" | "u" | "b" | "br" | "rb" | "f" | "fr" | "rf" | "t" | "tr" | "rt" => None,
        _ => Some("string prefix"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_integer() {
        assert!(legacy_integer("10L").is_some());
        assert!(legacy_integer("0777").is_some());
        assert!(legacy_integer("0_7").is_some());
        assert_eq!(legacy_integer("0"), None);
        assert_eq!(legacy_integer("00"), None);
        assert_eq!(legacy_integer("0_0"), None);
        assert_eq!(legacy_integer("0x1F"), None);
        assert_eq!(legacy_integer("0o17"), None);
        assert_eq!(legacy_integer("07j"), None);
        assert_eq!(legacy_integer("1_000"), None);
    }

    #[test]
    fn test_string_prefix() {
        assert!(string_prefix("`").is_some());
        assert!(string_prefix("ur\"").is_some());
        assert_eq!(string_prefix("\"\"\""), None);
        assert_eq!(string_prefix("Rb'"), None);
        assert_eq!(string_prefix("f\""), None);
        assert_eq!(string_prefix("U'"), None);
    }
}
