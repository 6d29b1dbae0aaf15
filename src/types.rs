//! Static type inference over a parsed expression tree.

use crate::functions::lookup_function;
use crate::tree::{Node, NodeKind};
use crate::walk::walk_through;

/// The semantic value type of an expression node.
///
/// Every evaluable node has exactly one of these; [`ValueType::None`] is the
/// traversal default for nodes that do not produce a value (and for absent
/// nodes), never a valid query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    None,
    Scalar,
    /// Instant vector: one sample per series at a single instant
    Vector,
    /// Range vector: a window of samples per series
    Matrix,
    String,
}

impl ValueType {
    /// The lowercase spelling Prometheus uses, as seen in diagnostics and
    /// on the JSON boundary.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::None => "none",
            ValueType::Scalar => "scalar",
            ValueType::Vector => "instant vector",
            ValueType::Matrix => "range vector",
            ValueType::String => "string",
        }
    }
}

/// Infer the value type of `node`.
///
/// Total over any node reachable from a parsed expression: absent and
/// non-value-producing nodes resolve to [`ValueType::None`] instead of
/// failing, since the input may be a partial query mid-edit.
///
/// # Examples
///
/// `1 + 1` resolves to scalar, `my_metric + 1` to an instant vector,
/// `rate(my_metric[5m])` to the registry return type of `rate`.
pub fn resolve_type(node: Option<Node<'_>>) -> ValueType {
    let node = match node {
        Some(node) => node,
        None => return ValueType::None,
    };

    match node.kind() {
        // wrappers and operators that keep their operand's type
        NodeKind::Expr | NodeKind::UnaryExpr | NodeKind::OffsetExpr => {
            resolve_type(node.first_child())
        }
        NodeKind::AggregateExpr | NodeKind::VectorSelector => ValueType::Vector,
        NodeKind::NumberLiteral => ValueType::Scalar,
        NodeKind::StringLiteral => ValueType::String,
        NodeKind::MatrixSelector | NodeKind::SubqueryExpr => ValueType::Matrix,
        NodeKind::ParenExpr => resolve_type(walk_through(node, &[NodeKind::Expr])),
        NodeKind::BinaryExpr => {
            // scalar op scalar is the only combination yielding a bare
            // number; any vector operand promotes the result to vector
            let lt = resolve_type(node.first_child());
            let rt = resolve_type(node.last_child());
            if lt == ValueType::Scalar && rt == ValueType::Scalar {
                ValueType::Scalar
            } else {
                ValueType::Vector
            }
        }
        NodeKind::FunctionCall => {
            let ident = node.first_child().and_then(|c| c.first_child());
            match ident.map(|n| n.kind()) {
                Some(NodeKind::Function(func)) => lookup_function(func).return_type,
                _ => ValueType::None,
            }
        }
        _ => ValueType::None,
    }
}
