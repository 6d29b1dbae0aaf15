//! Vector-matching resolution for binary expressions.
//!
//! Given a `BinaryExpr` node and the query text, derive how series on the
//! two sides are paired: the matching labels (`on`/`ignoring`), the
//! cardinality (`group_left`/`group_right`, or many-to-many for set
//! operators), and the labels carried over from the lower-cardinality side.
//! The result is computed fresh on every call and never cached.

use crate::tree::{Node, NodeKind};
use crate::walk::{contains_at_least_one_child, retrieve_all_recursive_nodes, walk_through};

/// How many series on one side a single series on the other side may pair
/// with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorMatchCardinality {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl VectorMatchCardinality {
    /// The spelling Prometheus uses, as seen in diagnostics and on the
    /// JSON boundary.
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorMatchCardinality::OneToOne => "one-to-one",
            VectorMatchCardinality::ManyToOne => "many-to-one",
            VectorMatchCardinality::OneToMany => "one-to-many",
            VectorMatchCardinality::ManyToMany => "many-to-many",
        }
    }
}

/// The label-matching configuration of one binary expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorMatching {
    /// How series on each side pair up
    pub card: VectorMatchCardinality,
    /// Labels the series have to match on, in document order
    pub matching_labels: Vec<String>,
    /// True when `matching_labels` is an inclusion list (`on`), false when
    /// it is an exclusion list (`ignoring`)
    pub on: bool,
    /// Labels copied over from the "one" side with `group_left`/`group_right`
    pub include: Vec<String>,
}

const SET_OPERATORS: &[NodeKind] = &[NodeKind::And, NodeKind::Or, NodeKind::Unless];

fn grouping_label_names(src: &str, root: Option<Node<'_>>) -> Vec<String> {
    retrieve_all_recursive_nodes(root, NodeKind::GroupingLabelList, NodeKind::LabelName)
        .iter()
        .map(|label| label.text(src).to_string())
        .collect()
}

/// Derive the [`VectorMatching`] of a binary expression node.
///
/// Returns `None` when `node` is absent or not a `BinaryExpr` — callers
/// routinely probe nodes whose kind they have not checked yet, so this is a
/// neutral answer, not a fault.
///
/// With no modifiers the result is one-to-one with empty label sets; a set
/// operator (`and`/`or`/`unless`) without explicit grouping defaults to
/// many-to-many. When a query combines a set operator with an explicit
/// `group_left`/`group_right` the explicit cardinality wins: this resolver
/// only computes the structure that is literally written, and leaves
/// flagging the (unusual) combination to the lint pass.
pub fn resolve_vector_matching(src: &str, node: Option<Node<'_>>) -> Option<VectorMatching> {
    let node = node?;
    if node.kind() != NodeKind::BinaryExpr {
        return None;
    }

    let mut matching = VectorMatching {
        card: VectorMatchCardinality::OneToOne,
        matching_labels: Vec::new(),
        on: false,
        include: Vec::new(),
    };

    use NodeKind::*;

    let on = walk_through(node, &[BinModifiers, GroupModifiers, OnOrIgnoring, On]);
    let ignoring = walk_through(node, &[BinModifiers, GroupModifiers, OnOrIgnoring, Ignoring]);
    if on.is_some() || ignoring.is_some() {
        matching.on = on.is_some();
        let labels = walk_through(
            node,
            &[BinModifiers, GroupModifiers, OnOrIgnoring, GroupingLabels],
        );
        matching.matching_labels = grouping_label_names(src, labels);
    }

    let group_left = walk_through(node, &[BinModifiers, GroupModifiers, GroupLeft]);
    let group_right = walk_through(node, &[BinModifiers, GroupModifiers, GroupRight]);
    if group_left.is_some() || group_right.is_some() {
        matching.card = if group_left.is_some() {
            VectorMatchCardinality::ManyToOne
        } else {
            VectorMatchCardinality::OneToMany
        };
        let include = walk_through(node, &[BinModifiers, GroupModifiers, MaybeGroupingLabels]);
        matching.include = grouping_label_names(src, include);
    }

    if contains_at_least_one_child(node, SET_OPERATORS)
        && matching.card == VectorMatchCardinality::OneToOne
    {
        matching.card = VectorMatchCardinality::ManyToMany;
    }

    Some(matching)
}
