//! Tree-sitter boundary extraction.
//!
//! The splitter never cuts inside a line when an AST boundary is available, so every
//! boundary is snapped back to the start of the line holding the node.

use tree_sitter::{Node, Parser};

use crate::error::{IndexError, Result};
use crate::languages::Lang;

/// Candidate split offsets derived from a parsed source file, coarsest level first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Boundaries {
    /// Starts of the root's named children (items, top-level statements, comments).
    pub top: Vec<usize>,
    /// Starts of entity nodes nested below the top level (methods, inner classes).
    pub nested: Vec<usize>,
}

/// Parse `source` and collect entity boundaries.
///
/// Returns `Ok(None)` when no grammar is compiled in for `lang`.
///
/// # Errors
///
/// Returns [`IndexError::Parse`] if the grammar cannot be loaded or parsing fails.
pub fn boundaries(source: &str, lang: Lang) -> Result<Option<Boundaries>> {
    let Some(grammar) = lang.grammar() else {
        return Ok(None);
    };

    let mut parser = Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|e| IndexError::Parse(format!("set_language failed: {e}")))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| IndexError::Parse(format!("parse failed for {} source", lang.id())))?;
    let root = tree.root_node();

    let mut top = Vec::new();
    let child_count = u32::try_from(root.named_child_count()).unwrap_or(u32::MAX);
    for i in 0..child_count {
        let Some(child) = root.named_child(i) else {
            continue;
        };
        top.push(line_start(source, child.start_byte()));
    }

    let kinds = lang.entity_node_kinds();
    let mut nested = Vec::new();
    let mut stack: Vec<Node> = Vec::new();
    for i in 0..child_count {
        if let Some(child) = root.named_child(i) {
            push_children(&child, &mut stack);
        }
    }
    while let Some(node) = stack.pop() {
        if kinds.contains(&node.kind()) {
            nested.push(line_start(source, node.start_byte()));
        }
        push_children(&node, &mut stack);
    }

    Ok(Some(Boundaries {
        top: normalize(top),
        nested: normalize(nested),
    }))
}

fn push_children<'t>(node: &Node<'t>, stack: &mut Vec<Node<'t>>) {
    let count = u32::try_from(node.named_child_count()).unwrap_or(u32::MAX);
    for i in 0..count {
        if let Some(child) = node.named_child(i) {
            stack.push(child);
        }
    }
}

/// Offset of the first byte of the line containing `offset`.
fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |i| i + 1)
}

fn normalize(mut offsets: Vec<usize>) -> Vec<usize> {
    offsets.sort_unstable();
    offsets.dedup();
    offsets.retain(|&o| o > 0);
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_start_snaps_back() {
        let src = "ab\n  cd\nef";
        assert_eq!(line_start(src, 5), 3);
        assert_eq!(line_start(src, 1), 0);
        assert_eq!(line_start(src, 8), 8);
    }

    #[test]
    fn normalize_sorts_dedups_and_drops_zero() {
        assert_eq!(normalize(vec![9, 0, 3, 9, 3]), vec![3, 9]);
    }

    #[test]
    fn no_grammar_returns_none() {
        assert_eq!(boundaries("# Title\n", Lang::Markdown).unwrap(), None);
    }

    #[cfg(feature = "lang-python")]
    #[test]
    fn python_top_and_nested_boundaries() {
        let src = "import os\n\nclass A:\n    def f(self):\n        pass\n\n    def g(self):\n        pass\n\ndef h():\n    return 1\n";
        let b = boundaries(src, Lang::Python).unwrap().unwrap();
        let class_at = src.find("class A").unwrap();
        let h_at = src.find("def h").unwrap();
        assert_eq!(b.top, vec![class_at, h_at]);

        let f_line = src.find("    def f").unwrap();
        let g_line = src.find("    def g").unwrap();
        assert!(b.nested.contains(&f_line));
        assert!(b.nested.contains(&g_line));
    }

    #[cfg(feature = "lang-rust")]
    #[test]
    fn rust_impl_methods_are_nested_boundaries() {
        let src = "struct S;\n\nimpl S {\n    fn a(&self) {}\n\n    fn b(&self) {}\n}\n";
        let b = boundaries(src, Lang::Rust).unwrap().unwrap();
        assert_eq!(b.top, vec![src.find("impl S").unwrap()]);
        assert!(b.nested.contains(&src.find("    fn a").unwrap()));
        assert!(b.nested.contains(&src.find("    fn b").unwrap()));
    }

    #[cfg(feature = "lang-go")]
    #[test]
    fn boundaries_are_line_starts() {
        let src = "package main\n\nfunc a() {}\n\nfunc b() {}\n";
        let b = boundaries(src, Lang::Go).unwrap().unwrap();
        for offset in b.top.iter().chain(&b.nested) {
            assert_eq!(&src[offset - 1..*offset], "\n");
        }
    }
}
