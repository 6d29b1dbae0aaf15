//! Generic helpers for walking a fixed-shape syntax tree.
//!
//! The grammar puts optional modifiers at rigid, well-known paths (for
//! example `BinaryExpr -> BinModifiers -> GroupModifiers -> OnOrIgnoring`),
//! and represents lists as left-nested wrapper nodes. The helpers here let
//! the resolvers follow those paths without re-deriving grammar structure at
//! every call site. Absence is never a fault: a missing step simply yields
//! `None` or an empty collection, since most of these paths describe
//! modifiers that are valid to omit.

use crate::tree::{Node, NodeKind};

/// Starting at `node`, descend through the first child matching each
/// expected kind in turn. Returns the final node, or `None` as soon as a
/// step has no matching child.
pub fn walk_through<'t>(node: Node<'t>, path: &[NodeKind]) -> Option<Node<'t>> {
    let mut current = node;
    for &kind in path {
        current = current.child_of_kind(kind)?;
    }
    Some(current)
}

/// Collect every `item_kind` node reachable through nested `list_kind`
/// wrappers beneath `root`, in document order.
///
/// The grammar nests lists to the left (`List -> List? Item`), so the
/// innermost wrapper holds the first item; recursing into the nested wrapper
/// before taking the current item restores source order.
pub fn retrieve_all_recursive_nodes<'t>(
    root: Option<Node<'t>>,
    list_kind: NodeKind,
    item_kind: NodeKind,
) -> Vec<Node<'t>> {
    let mut items = Vec::new();
    if let Some(root) = root {
        collect(root, list_kind, item_kind, &mut items);
    }
    items
}

fn collect<'t>(node: Node<'t>, list_kind: NodeKind, item_kind: NodeKind, items: &mut Vec<Node<'t>>) {
    if let Some(nested) = node.child_of_kind(list_kind) {
        collect(nested, list_kind, item_kind, items);
    }
    if let Some(last) = node.last_child() {
        if last.kind() == item_kind {
            items.push(last);
        }
    }
}

/// True iff any direct child of `node` has one of the given kinds.
pub fn contains_at_least_one_child(node: Node<'_>, kinds: &[NodeKind]) -> bool {
    node.children().any(|c| kinds.contains(&c.kind()))
}
