//! # PromQL Syntax Tree
//!
//! This module defines the syntax-tree data model shared by every analysis
//! in this crate. The tree itself is produced by an external parser — this
//! crate never parses query text — and handed over as a [`RawNode`]
//! hierarchy, which [`Tree::from_raw`] freezes into an immutable arena with
//! parent links.
//!
//! ## Architecture Overview
//!
//! - **[`NodeKind`]** - closed set of grammar productions, one discriminant
//!   per node
//! - **[`RawNode`]** - the hand-over format a parser produces
//! - **[`Tree`]** - frozen, immutable arena owning all nodes
//! - **[`Node`]** - a cheap `Copy` handle for navigating a frozen tree
//!
//! ## Core Concepts
//!
//! ### Nodes
//!
//! Every node carries a kind and a byte range `[from, to)` into the source
//! text it was parsed from. Children are kept in document order, so any
//! traversal that walks children left to right observes source order.
//!
//! ### Ownership
//!
//! The tree is owned by whoever drove the parse (an editor session, a lint
//! pass); the analyses in [`types`](crate::types), [`matching`](crate::matching)
//! and [`lint`](crate::lint) only hold [`Node`] borrows scoped to a single
//! call. Nothing in this crate mutates a frozen tree.
//!
//! ## Grammar Shape
//!
//! The navigator paths used by the resolvers assume the upstream grammar's
//! nesting, most importantly:
//!
//! ```text
//! BinaryExpr        -> Expr <op> BinModifiers? Expr
//! BinModifiers      -> Bool? GroupModifiers?
//! GroupModifiers    -> OnOrIgnoring? (GroupLeft|GroupRight)? MaybeGroupingLabels?
//! OnOrIgnoring      -> (On|Ignoring) GroupingLabels
//! GroupingLabels    -> GroupingLabelList?
//! GroupingLabelList -> GroupingLabelList? LabelName     (left-nested list)
//! FunctionCall      -> FunctionIdentifier FunctionCallBody
//! FunctionCallArgs  -> FunctionCallArgs? Expr           (left-nested list)
//! ```
//!
//! Lists are represented as left-nested wrapper nodes; see
//! [`retrieve_all_recursive_nodes`](crate::walk::retrieve_all_recursive_nodes)
//! for the matching traversal.

use crate::functions::{AggregateOp, Function};

/// The grammar production a syntax node belongs to.
///
/// This is a closed set: an external parser may only hand over kinds listed
/// here, which is what lets the registry and the resolvers match on node
/// kinds exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Generic expression wrapper around every concrete expression node
    Expr,

    // Literals and selectors
    NumberLiteral,
    StringLiteral,
    VectorSelector,
    MatrixSelector,
    SubqueryExpr,
    OffsetExpr,
    ParenExpr,
    UnaryExpr,
    BinaryExpr,
    AggregateExpr,
    FunctionCall,

    // Function calls
    FunctionIdentifier,
    /// The concrete built-in function token inside a `FunctionIdentifier`
    Function(Function),
    FunctionCallBody,
    FunctionCallArgs,

    // Aggregations
    /// The concrete aggregation operator token inside an `AggregateExpr`
    AggregateOp(AggregateOp),
    AggregateModifier,
    By,
    Without,

    // Binary operator modifiers
    BinModifiers,
    Bool,
    GroupModifiers,
    OnOrIgnoring,
    On,
    Ignoring,
    GroupLeft,
    GroupRight,
    MaybeGroupingLabels,
    GroupingLabels,
    GroupingLabelList,
    LabelName,

    // Vector selector internals
    Identifier,
    LabelMatchers,
    LabelMatchList,
    LabelMatcher,
    EqlSingle,
    EqlRegex,
    NeqRegex,

    // Misc tokens
    Duration,

    // Binary operator tokens (direct children of BinaryExpr)
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Atan2,
    Eql,
    Neq,
    Gte,
    Gtr,
    Lte,
    Lss,
    And,
    Or,
    Unless,
}

/// One node of an unfrozen parse result, as handed over by a parser.
///
/// `from`/`to` are byte offsets into the source text; `children` must be in
/// document order.
#[derive(Debug, Clone)]
pub struct RawNode {
    pub kind: NodeKind,
    pub from: usize,
    pub to: usize,
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn new(kind: NodeKind, from: usize, to: usize) -> Self {
        RawNode {
            kind,
            from,
            to,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, from: usize, to: usize, children: Vec<RawNode>) -> Self {
        RawNode {
            kind,
            from,
            to,
            children,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(u32);

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    from: usize,
    to: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A frozen syntax tree.
///
/// Built once from a [`RawNode`] hierarchy and read-only afterwards. All
/// navigation goes through [`Node`] handles obtained from [`Tree::root`].
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<NodeData>,
}

impl Tree {
    /// Freeze a raw parse result into an arena, computing parent links.
    pub fn from_raw(root: RawNode) -> Self {
        let mut tree = Tree { nodes: Vec::new() };
        tree.insert(root, None);
        tree
    }

    fn insert(&mut self, raw: RawNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind: raw.kind,
            from: raw.from,
            to: raw.to,
            parent,
            children: Vec::new(),
        });
        for child in raw.children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0 as usize].children.push(child_id);
        }
        id
    }

    /// The root node of the tree.
    pub fn root(&self) -> Node<'_> {
        Node {
            tree: self,
            id: NodeId(0),
        }
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }
}

/// A borrowed handle to one node of a frozen [`Tree`].
///
/// Handles are `Copy` and only valid for the lifetime of the tree they point
/// into; navigation never allocates.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> Node<'t> {
    pub fn kind(&self) -> NodeKind {
        self.tree.data(self.id).kind
    }

    /// Start of the node's byte range in the source text.
    pub fn from(&self) -> usize {
        self.tree.data(self.id).from
    }

    /// End (exclusive) of the node's byte range in the source text.
    pub fn to(&self) -> usize {
        self.tree.data(self.id).to
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        let parent = self.tree.data(self.id).parent?;
        Some(Node {
            tree: self.tree,
            id: parent,
        })
    }

    /// Direct children in document order.
    pub fn children(&self) -> impl Iterator<Item = Node<'t>> + '_ {
        self.tree
            .data(self.id)
            .children
            .iter()
            .map(|&id| Node {
                tree: self.tree,
                id,
            })
    }

    pub fn first_child(&self) -> Option<Node<'t>> {
        let &id = self.tree.data(self.id).children.first()?;
        Some(Node {
            tree: self.tree,
            id,
        })
    }

    pub fn last_child(&self) -> Option<Node<'t>> {
        let &id = self.tree.data(self.id).children.last()?;
        Some(Node {
            tree: self.tree,
            id,
        })
    }

    /// First direct child of the given kind, if any.
    pub fn child_of_kind(&self, kind: NodeKind) -> Option<Node<'t>> {
        self.children().find(|c| c.kind() == kind)
    }

    /// Slice this node's text out of the source it was parsed from.
    ///
    /// An out-of-range span (a tree frozen against different text) yields
    /// `""` rather than a panic, consistent with how every analysis here
    /// treats structural absence.
    pub fn text<'s>(&self, src: &'s str) -> &'s str {
        src.get(self.from()..self.to()).unwrap_or("")
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node({:?} [{}, {}))",
            self.kind(),
            self.from(),
            self.to()
        )
    }
}
