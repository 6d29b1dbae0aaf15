//! Semantic validation of parsed expressions.
//!
//! A recursive type-checking pass over the tree, mirroring Prometheus' own
//! query checker: it infers types the same way as
//! [`resolve_type`](crate::types::resolve_type) while recording every rule
//! violation it passes, and never fails — malformed or partial input simply
//! yields diagnostics (or none, when the relevant structure is absent).
//! Rendering the diagnostics is the caller's job; this module only returns
//! them as data.

use regex::Regex;

use crate::functions::{AggregateOp, lookup_function};
use crate::matching::resolve_vector_matching;
use crate::tree::{Node, NodeKind};
use crate::walk::{contains_at_least_one_child, retrieve_all_recursive_nodes, walk_through};
use crate::types::ValueType;

/// One rule violation, located by byte range in the query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub from: usize,
    pub to: usize,
    pub message: String,
}

const COMPARISON_OPERATORS: &[NodeKind] = &[
    NodeKind::Eql,
    NodeKind::Neq,
    NodeKind::Gte,
    NodeKind::Gtr,
    NodeKind::Lte,
    NodeKind::Lss,
];

const SET_OPERATORS: &[NodeKind] = &[NodeKind::And, NodeKind::Or, NodeKind::Unless];

const BINARY_OPERATORS: &[NodeKind] = &[
    NodeKind::Add,
    NodeKind::Sub,
    NodeKind::Mul,
    NodeKind::Div,
    NodeKind::Mod,
    NodeKind::Pow,
    NodeKind::Atan2,
    NodeKind::Eql,
    NodeKind::Neq,
    NodeKind::Gte,
    NodeKind::Gtr,
    NodeKind::Lte,
    NodeKind::Lss,
    NodeKind::And,
    NodeKind::Or,
    NodeKind::Unless,
];

/// Type-check the expression rooted at `node` and collect every semantic
/// rule violation, in traversal order.
pub fn check_expr(src: &str, node: Node<'_>) -> Vec<Diagnostic> {
    let mut linter = Linter {
        src,
        diagnostics: Vec::new(),
    };
    linter.check(Some(node));
    linter.diagnostics
}

struct Linter<'a> {
    src: &'a str,
    diagnostics: Vec<Diagnostic>,
}

impl Linter<'_> {
    fn diagnostic(&mut self, node: Node<'_>, message: String) {
        self.diagnostics.push(Diagnostic {
            from: node.from(),
            to: node.to(),
            message,
        });
    }

    /// Infer the type of `node`, recording violations along the way.
    ///
    /// Agrees with `resolve_type` on every input; the only difference is the
    /// recorded diagnostics.
    fn check(&mut self, node: Option<Node<'_>>) -> ValueType {
        let node = match node {
            Some(node) => node,
            None => return ValueType::None,
        };

        match node.kind() {
            NodeKind::Expr | NodeKind::OffsetExpr => self.check(node.first_child()),
            NodeKind::ParenExpr => self.check(walk_through(node, &[NodeKind::Expr])),
            NodeKind::UnaryExpr => self.check_unary(node),
            NodeKind::BinaryExpr => self.check_binary(node),
            NodeKind::FunctionCall => self.check_call(node),
            NodeKind::AggregateExpr => self.check_aggregation(node),
            NodeKind::SubqueryExpr => self.check_subquery(node),
            NodeKind::MatrixSelector => self.check_matrix_selector(node),
            NodeKind::VectorSelector => {
                self.check_vector_selector(node);
                ValueType::Vector
            }
            NodeKind::NumberLiteral => ValueType::Scalar,
            NodeKind::StringLiteral => ValueType::String,
            _ => ValueType::None,
        }
    }

    /// Check a child and require a specific type of it, in a named context.
    fn expect_type(&mut self, node: Option<Node<'_>>, want: ValueType, context: &str) {
        let node = match node {
            Some(node) => node,
            None => return,
        };
        let got = self.check(Some(node));
        if got != want {
            self.diagnostic(
                node,
                format!(
                    "expected type {} in {}, got {}",
                    want.as_str(),
                    context,
                    got.as_str()
                ),
            );
        }
    }

    fn check_unary(&mut self, node: Node<'_>) -> ValueType {
        let t = self.check(node.first_child());
        if t != ValueType::Scalar && t != ValueType::Vector {
            self.diagnostic(
                node,
                format!(
                    "unary expression only allowed on expressions of type scalar or instant vector, got {}",
                    t.as_str()
                ),
            );
        }
        t
    }

    fn check_subquery(&mut self, node: Node<'_>) -> ValueType {
        let t = self.check(node.first_child());
        if t != ValueType::Vector {
            self.diagnostic(
                node,
                format!("subquery is only allowed on instant vector, got {}", t.as_str()),
            );
        }
        ValueType::Matrix
    }

    fn check_matrix_selector(&mut self, node: Node<'_>) -> ValueType {
        let t = self.check(node.first_child());
        if t != ValueType::Vector {
            self.diagnostic(node, "ranges only allowed for vector selectors".to_string());
        }
        ValueType::Matrix
    }

    fn check_binary(&mut self, node: Node<'_>) -> ValueType {
        let lhs = node.first_child();
        let rhs = node.last_child();
        let lt = self.check(lhs);
        let rt = self.check(rhs);

        let bool_used = walk_through(node, &[NodeKind::BinModifiers, NodeKind::Bool]).is_some();
        let is_comparison = contains_at_least_one_child(node, COMPARISON_OPERATORS);
        let is_set_operator = contains_at_least_one_child(node, SET_OPERATORS);

        if bool_used && !is_comparison {
            self.diagnostic(
                node,
                "bool modifier can only be used on comparison operators".to_string(),
            );
        }
        if !bool_used && is_comparison && lt == ValueType::Scalar && rt == ValueType::Scalar {
            self.diagnostic(
                node,
                "comparisons between scalars must use BOOL modifier".to_string(),
            );
        }

        if lt != ValueType::Scalar && lt != ValueType::Vector {
            self.diagnostic(
                lhs.unwrap_or(node),
                "binary expression must contain only scalar and instant vector types".to_string(),
            );
        }
        if rt != ValueType::Scalar && rt != ValueType::Vector {
            self.diagnostic(
                rhs.unwrap_or(node),
                "binary expression must contain only scalar and instant vector types".to_string(),
            );
        }

        if let Some(matching) = resolve_vector_matching(self.src, Some(node)) {
            if matching.on {
                for label in &matching.matching_labels {
                    if matching.include.contains(label) {
                        self.diagnostic(
                            node,
                            format!(
                                "label \"{label}\" must not occur in ON and GROUP clause at once"
                            ),
                        );
                    }
                }
            }

            if (lt != ValueType::Vector || rt != ValueType::Vector)
                && !matching.matching_labels.is_empty()
            {
                self.diagnostic(
                    node,
                    "vector matching only allowed between instant vectors".to_string(),
                );
            }

            if is_set_operator {
                let op = self.operator_name(node);
                if lt == ValueType::Scalar || rt == ValueType::Scalar {
                    self.diagnostic(
                        node,
                        format!("set operator \"{op}\" not allowed in binary scalar expression"),
                    );
                }
                // the matching resolver deliberately honors an explicit
                // group_left/group_right here; flagging the combination is
                // this pass's job
                let grouped = walk_through(
                    node,
                    &[NodeKind::BinModifiers, NodeKind::GroupModifiers, NodeKind::GroupLeft],
                )
                .or_else(|| {
                    walk_through(
                        node,
                        &[NodeKind::BinModifiers, NodeKind::GroupModifiers, NodeKind::GroupRight],
                    )
                });
                if grouped.is_some() {
                    self.diagnostic(node, format!("no grouping allowed for \"{op}\" operation"));
                }
            }
        }

        if lt == ValueType::Scalar && rt == ValueType::Scalar {
            ValueType::Scalar
        } else {
            ValueType::Vector
        }
    }

    fn operator_name(&self, node: Node<'_>) -> String {
        node.children()
            .find(|c| BINARY_OPERATORS.contains(&c.kind()))
            .map(|c| c.text(self.src).to_string())
            .unwrap_or_default()
    }

    fn check_call(&mut self, node: Node<'_>) -> ValueType {
        let ident = node.first_child().and_then(|c| c.first_child());
        let func = match ident.map(|n| n.kind()) {
            Some(NodeKind::Function(func)) => func,
            // partial input while editing; nothing to check yet
            _ => return ValueType::None,
        };
        let signature = lookup_function(func);
        let args = retrieve_all_recursive_nodes(
            walk_through(node, &[NodeKind::FunctionCallBody]),
            NodeKind::FunctionCallArgs,
            NodeKind::Expr,
        );

        let nargs = signature.arg_types.len();
        if signature.variadic == 0 {
            if args.len() != nargs {
                self.diagnostic(
                    node,
                    format!(
                        "expected {} argument(s) in call to \"{}\", got {}",
                        nargs,
                        signature.name,
                        args.len()
                    ),
                );
            }
        } else {
            let required = nargs.saturating_sub(1);
            if required > args.len() {
                self.diagnostic(
                    node,
                    format!(
                        "expected at least {} argument(s) in call to \"{}\", got {}",
                        required,
                        signature.name,
                        args.len()
                    ),
                );
            } else if signature.variadic > 0 && required + (signature.variadic as usize) < args.len()
            {
                self.diagnostic(
                    node,
                    format!(
                        "expected at most {} argument(s) in call to \"{}\", got {}",
                        required + signature.variadic as usize,
                        signature.name,
                        args.len()
                    ),
                );
            }
        }

        if !signature.arg_types.is_empty() {
            let context = format!("call to \"{}\"", signature.name);
            for (i, arg) in args.iter().enumerate() {
                // trailing variadic arguments take the last declared type
                let j = i.min(nargs - 1);
                if i >= nargs && signature.variadic == 0 {
                    break;
                }
                self.expect_type(Some(*arg), signature.arg_types[j], &context);
            }
        }

        signature.return_type
    }

    fn check_aggregation(&mut self, node: Node<'_>) -> ValueType {
        let op = node.children().find_map(|c| match c.kind() {
            NodeKind::AggregateOp(op) => Some(op),
            _ => None,
        });
        let op = match op {
            Some(op) => op,
            // partial input while editing
            None => return ValueType::Vector,
        };
        let args = retrieve_all_recursive_nodes(
            node.child_of_kind(NodeKind::FunctionCallBody),
            NodeKind::FunctionCallArgs,
            NodeKind::Expr,
        );

        let expected = if op.takes_param() { 2 } else { 1 };
        if args.len() != expected {
            self.diagnostic(
                node,
                format!(
                    "wrong number of arguments for aggregate expression provided, expected {}, got {}",
                    expected,
                    args.len()
                ),
            );
            return ValueType::Vector;
        }

        if op.takes_param() {
            let want = if op == AggregateOp::CountValues {
                ValueType::String
            } else {
                ValueType::Scalar
            };
            self.expect_type(args.first().copied(), want, "aggregation parameter");
        }
        self.expect_type(args.last().copied(), ValueType::Vector, "aggregation expression");

        ValueType::Vector
    }

    fn check_vector_selector(&mut self, node: Node<'_>) {
        let name = node
            .child_of_kind(NodeKind::Identifier)
            .map(|n| n.text(self.src))
            .unwrap_or("");
        let matchers = retrieve_all_recursive_nodes(
            node.child_of_kind(NodeKind::LabelMatchers),
            NodeKind::LabelMatchList,
            NodeKind::LabelMatcher,
        );

        // a bare metric name is itself a non-empty __name__ matcher
        let mut has_non_empty_matcher = !name.is_empty();

        for matcher in &matchers {
            let label = matcher
                .child_of_kind(NodeKind::LabelName)
                .map(|n| n.text(self.src))
                .unwrap_or("");
            let value = matcher
                .child_of_kind(NodeKind::StringLiteral)
                .map(|n| unquote(n.text(self.src)))
                .unwrap_or_default();
            let op = matcher.children().map(|c| c.kind()).find(|k| {
                matches!(
                    k,
                    NodeKind::EqlSingle | NodeKind::Neq | NodeKind::EqlRegex | NodeKind::NeqRegex
                )
            });

            if label == "__name__" && !name.is_empty() {
                self.diagnostic(
                    *matcher,
                    format!("metric name must not be set twice: \"{name}\" or \"{value}\""),
                );
            }

            match op {
                Some(NodeKind::EqlSingle) => {
                    if !value.is_empty() {
                        has_non_empty_matcher = true;
                    }
                }
                Some(NodeKind::Neq) => {
                    if value.is_empty() {
                        has_non_empty_matcher = true;
                    }
                }
                Some(NodeKind::EqlRegex) | Some(NodeKind::NeqRegex) => {
                    // matchers are fully anchored, as in Prometheus
                    match Regex::new(&format!("^(?:{value})$")) {
                        Ok(re) => {
                            let matches_empty = re.is_match("");
                            let negated = op == Some(NodeKind::NeqRegex);
                            if matches_empty == negated {
                                has_non_empty_matcher = true;
                            }
                        }
                        Err(err) => {
                            self.diagnostic(
                                *matcher,
                                format!("invalid regular expression for label \"{label}\": {err}"),
                            );
                        }
                    }
                }
                _ => {}
            }
        }

        if !has_non_empty_matcher {
            self.diagnostic(
                node,
                "vector selector must contain at least one non-empty matcher".to_string(),
            );
        }
    }
}

/// Strip the surrounding quotes from a string-literal token.
fn unquote(text: &str) -> String {
    let mut chars = text.chars();
    match (chars.next(), text.chars().last()) {
        (Some(q1), Some(q2)) if text.len() >= 2 && (q1 == '"' || q1 == '\'') && q1 == q2 => {
            text[1..text.len() - 1].to_string()
        }
        _ => text.to_string(),
    }
}
