//! Syntax-tree checks on generated Python code
//!
//! Source that fails to parse cleanly is treated as defining nothing: a
//! malformed file never reports a function as present.

use tree_sitter::{Node, Parser, Tree};

use super::strict::rejected_construct;

fn parse_python(code: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
    if let Err(e) = parser.set_language(&language) {
        tracing::warn!(error = %e, "Failed to load Python grammar");
        return None;
    }

    let tree = parser.parse(code, None)?;
    if tree.root_node().has_error() {
        return None;
    }

    let source = code.as_bytes();
    let mut rejected = None;
    walk(&tree, |node| {
        rejected = rejected_construct(node, source);
        rejected.is_some()
    });
    if let Some(construct) = rejected {
        tracing::debug!(construct, "Source is not valid Python 3");
        return None;
    }
    Some(tree)
}

/// `def` definitions only; `async def` is a different construct.
fn is_plain_function(node: &Node) -> bool {
    if node.kind() != "function_definition" {
        return false;
    }
    let mut cursor = node.walk();
    let is_async = node.children(&mut cursor).any(|c| c.kind() == "async");
    !is_async
}

/// Visit every node in the tree in document order
fn walk<'t>(tree: &'t Tree, mut visit: impl FnMut(Node<'t>) -> bool) -> bool {
    let mut cursor = tree.walk();
    loop {
        if visit(cursor.node()) {
            return true;
        }
        if cursor.goto_first_child() || cursor.goto_next_sibling() {
            continue;
        }
        loop {
            if !cursor.goto_parent() {
                return false;
            }
            if cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

/// Names of every function defined anywhere in `code`.
///
/// Includes nested functions, methods and decorated definitions.
/// Returns `None` when the code does not parse.
pub fn function_names(code: &str) -> Option<Vec<String>> {
    let tree = parse_python(code)?;
    let source = code.as_bytes();
    let mut names = Vec::new();

    walk(&tree, |node| {
        if is_plain_function(&node) {
            if let Some(name) = node
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source).ok())
            {
                names.push(name.to_string());
            }
        }
        false
    });

    Some(names)
}

/// Check whether `code` defines a function named exactly `func_name`.
///
/// The comparison is case-sensitive. Parse failures yield `false`.
pub fn has_function(code: &str, func_name: &str) -> bool {
    let Some(tree) = parse_python(code) else {
        return false;
    };
    let source = code.as_bytes();

    walk(&tree, |node| {
        is_plain_function(&node)
            && node
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source).ok())
                == Some(func_name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_function() {
        assert!(has_function("def foo():\n  pass", "foo"));
    }

    #[test]
    fn test_other_name_not_found() {
        assert!(!has_function("def foo():\n  pass", "bar"));
    }

    #[test]
    fn test_malformed_code_is_absent() {
        assert!(!has_function("def foo(:", "foo"));
    }

    #[test]
    fn test_python2_and_rejected_python3_is_absent() {
        let cases = [
            "def foo():\n    print \"hi\"\n",
            "def foo():\n    print >>sys.stderr, \"hi\"\n",
            "def foo():\n    exec \"x = 1\"\n",
            "def foo():\n    try:\n        pass\n    except ValueError, e:\n        pass\n",
            "def foo():\n    raise ValueError, \"bad\"\n",
            "def foo():\n    return `x`\n",
            "def foo():\n    return a <> b\n",
            "def foo():\n    return 0777 + 10L\n",
            "def foo():\n    return ur\"x\"\n",
            "def foo(a=1, b):\n    pass\n",
            "def foo((a, b)):\n    pass\n",
            "def foo():\n    del f()\n",
            "def foo():\n    return f(x for x in y, 1)\n",
            "def foo():\n    return [x for x in y,]\n",
            "bar = lambda a=1, b: 0\ndef foo():\n    pass\n",
            "def foo():\n    f() = 1\n",
        ];
        for code in cases {
            assert!(!has_function(code, "foo"), "accepted: {:?}", code);
        }
    }

    #[test]
    fn test_valid_python3_still_found() {
        let code = "\
def foo(a, /, b=2, *args: int, c, d=4, **kw: int):
    print(\"hi\", file=sys.stderr)
    exec(\"x = 1\")
    del a, b[0], c.d, (e, [f])
    pairs = [x for x, y in zip(a, b) if x]
    total = sum(x for x in (1, 2))
    try:
        pass
    except (ValueError, TypeError) as e:
        raise ValueError(\"bad\") from e
    return rb\"x\" + f\"{a}\" + 0x1F + 0o17 + 00 + 1_000 + 07j
";
        assert!(has_function(code, "foo"));
        assert!(has_function("def foo(*, a=1, b):\n    pass\n", "foo"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!has_function("def Foo():\n    return 1\n", "foo"));
    }

    #[test]
    fn test_nested_and_method_definitions() {
        let code = "\
class Sorter:
    def merge(self, a, b):
        def helper(x):
            return x
        return helper(a + b)
";
        assert!(has_function(code, "merge"));
        assert!(has_function(code, "helper"));
        assert!(!has_function(code, "Sorter"));
    }

    #[test]
    fn test_decorated_definition() {
        let code = "import functools\n\n@functools.lru_cache\ndef fib(n):\n    return n\n";
        assert!(has_function(code, "fib"));
    }

    #[test]
    fn test_async_def_does_not_count() {
        assert!(!has_function("async def fetch():\n    pass\n", "fetch"));
    }

    #[test]
    fn test_name_in_call_only() {
        assert!(!has_function("result = gcd(4, 6)\n", "gcd"));
    }

    #[test]
    fn test_function_names() {
        let code = "def a():\n    pass\n\ndef b():\n    def c():\n        pass\n";
        assert_eq!(
            function_names(code),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(function_names("def broken(:"), None);
        assert_eq!(function_names(""), Some(vec![]));
    }
}
