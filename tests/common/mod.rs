//! Test-support PromQL expression parser.
//!
//! The crate under test deliberately never parses query text — it consumes
//! trees an external parser hands over as `RawNode`s. The integration suites
//! still want to assert semantics against real queries, so this module
//! provides a small expression parser producing trees with the exact grammar
//! shape the resolvers are specified against (`Expr` wrappers, left-nested
//! argument and label lists, modifier nesting). It panics on malformed
//! input: every query in the suites is expected to parse.

use promql_semantics::functions::{AggregateOp, Function};
use promql_semantics::tree::{NodeKind, RawNode, Tree};

/// Parse a PromQL expression into a frozen tree rooted at an `Expr` node.
pub fn parse(src: &str) -> Tree {
    let mut parser = Parser {
        src,
        tokens: lex(src),
        pos: 0,
    };
    let root = parser.parse_expr();
    parser.expect(TokKind::Eof);
    Tree::from_raw(wrap_expr(root))
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokKind {
    Ident,
    Number,
    Str,
    Duration,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eql,       // ==
    EqlSingle, // =
    Neq,       // !=
    Gtr,
    Gte,
    Lss,
    Lte,
    EqlRegex, // =~
    NeqRegex, // !~
    Eof,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokKind,
    from: usize,
    to: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_duration_unit(c: char) -> bool {
    matches!(c, 's' | 'm' | 'h' | 'd' | 'w' | 'y')
}

fn lex(src: &str) -> Vec<Token> {
    let bytes: Vec<char> = src.chars().collect();
    // queries in the suites are plain ASCII, so char index == byte index
    assert_eq!(bytes.len(), src.len(), "test queries must be ASCII");

    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let from = i;
        let kind = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '(' => {
                i += 1;
                TokKind::LParen
            }
            ')' => {
                i += 1;
                TokKind::RParen
            }
            '{' => {
                i += 1;
                TokKind::LBrace
            }
            '}' => {
                i += 1;
                TokKind::RBrace
            }
            '[' => {
                i += 1;
                TokKind::LBracket
            }
            ']' => {
                i += 1;
                TokKind::RBracket
            }
            ',' => {
                i += 1;
                TokKind::Comma
            }
            ':' => {
                i += 1;
                TokKind::Colon
            }
            '+' => {
                i += 1;
                TokKind::Add
            }
            '-' => {
                i += 1;
                TokKind::Sub
            }
            '*' => {
                i += 1;
                TokKind::Mul
            }
            '/' => {
                i += 1;
                TokKind::Div
            }
            '%' => {
                i += 1;
                TokKind::Mod
            }
            '^' => {
                i += 1;
                TokKind::Pow
            }
            '=' => {
                i += 1;
                if bytes.get(i) == Some(&'=') {
                    i += 1;
                    TokKind::Eql
                } else if bytes.get(i) == Some(&'~') {
                    i += 1;
                    TokKind::EqlRegex
                } else {
                    TokKind::EqlSingle
                }
            }
            '!' => {
                i += 1;
                match bytes.get(i) {
                    Some('=') => {
                        i += 1;
                        TokKind::Neq
                    }
                    Some('~') => {
                        i += 1;
                        TokKind::NeqRegex
                    }
                    other => panic!("unexpected character after '!': {:?}", other),
                }
            }
            '>' => {
                i += 1;
                if bytes.get(i) == Some(&'=') {
                    i += 1;
                    TokKind::Gte
                } else {
                    TokKind::Gtr
                }
            }
            '<' => {
                i += 1;
                if bytes.get(i) == Some(&'=') {
                    i += 1;
                    TokKind::Lte
                } else {
                    TokKind::Lss
                }
            }
            '"' | '\'' => {
                let quote = c;
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
                assert!(i < bytes.len(), "unterminated string literal");
                i += 1;
                TokKind::Str
            }
            c if c.is_ascii_digit() => {
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == '.') {
                    i += 1;
                }
                if i < bytes.len() && is_duration_unit(bytes[i]) {
                    // 5m, 1h30m, ...
                    while i < bytes.len() && (bytes[i].is_ascii_digit() || is_duration_unit(bytes[i]))
                    {
                        i += 1;
                    }
                    TokKind::Duration
                } else {
                    TokKind::Number
                }
            }
            c if is_ident_start(c) => {
                while i < bytes.len() && is_ident_char(bytes[i]) {
                    i += 1;
                }
                TokKind::Ident
            }
            other => panic!("unexpected character {:?} at offset {}", other, i),
        };
        tokens.push(Token { kind, from, to: i });
    }
    tokens.push(Token {
        kind: TokKind::Eof,
        from: bytes.len(),
        to: bytes.len(),
    });
    tokens
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

fn wrap_expr(node: RawNode) -> RawNode {
    let (from, to) = (node.from, node.to);
    RawNode::with_children(NodeKind::Expr, from, to, vec![node])
}

fn leaf(kind: NodeKind, tok: Token) -> RawNode {
    RawNode::new(kind, tok.from, tok.to)
}

/// Fold nodes into the grammar's left-nested list shape
/// (`List -> List? Item`).
fn nest_list(list_kind: NodeKind, items: Vec<RawNode>) -> Option<RawNode> {
    let mut list: Option<RawNode> = None;
    for item in items {
        let from = list.as_ref().map(|l| l.from).unwrap_or(item.from);
        let to = item.to;
        let mut children = Vec::new();
        if let Some(prev) = list.take() {
            children.push(prev);
        }
        children.push(item);
        list = Some(RawNode::with_children(list_kind, from, to, children));
    }
    list
}

impl Parser<'_> {
    fn peek(&self) -> Token {
        self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos];
        if tok.kind != TokKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokKind) -> Token {
        let tok = self.advance();
        assert_eq!(
            tok.kind, kind,
            "expected {:?}, got {:?} ({:?}) in {:?}",
            kind,
            tok.kind,
            &self.src[tok.from..tok.to],
            self.src
        );
        tok
    }

    fn text(&self, tok: Token) -> &str {
        &self.src[tok.from..tok.to]
    }

    fn at_ident(&self, keyword: &str) -> bool {
        let tok = self.peek();
        tok.kind == TokKind::Ident && self.text(tok) == keyword
    }

    fn parse_expr(&mut self) -> RawNode {
        self.parse_binary(1)
    }

    /// Operator precedence, or `None` when the next token is not a binary
    /// operator. Higher binds tighter; `^` is right-associative.
    fn peek_operator(&self) -> Option<(NodeKind, u8, bool)> {
        let tok = self.peek();
        let entry = match tok.kind {
            TokKind::Ident => match self.text(tok) {
                "or" => (NodeKind::Or, 1, false),
                "and" => (NodeKind::And, 2, false),
                "unless" => (NodeKind::Unless, 2, false),
                "atan2" => (NodeKind::Atan2, 5, false),
                _ => return None,
            },
            TokKind::Eql => (NodeKind::Eql, 3, false),
            TokKind::Neq => (NodeKind::Neq, 3, false),
            TokKind::Gtr => (NodeKind::Gtr, 3, false),
            TokKind::Gte => (NodeKind::Gte, 3, false),
            TokKind::Lss => (NodeKind::Lss, 3, false),
            TokKind::Lte => (NodeKind::Lte, 3, false),
            TokKind::Add => (NodeKind::Add, 4, false),
            TokKind::Sub => (NodeKind::Sub, 4, false),
            TokKind::Mul => (NodeKind::Mul, 5, false),
            TokKind::Div => (NodeKind::Div, 5, false),
            TokKind::Mod => (NodeKind::Mod, 5, false),
            TokKind::Pow => (NodeKind::Pow, 6, true),
            _ => return None,
        };
        Some(entry)
    }

    fn parse_binary(&mut self, min_prec: u8) -> RawNode {
        let mut lhs = self.parse_unary();
        loop {
            let (op_kind, prec, right_assoc) = match self.peek_operator() {
                Some(entry) if entry.1 >= min_prec => entry,
                _ => break,
            };
            let op_tok = self.advance();
            let op_node = leaf(op_kind, op_tok);
            let mut modifiers = self.parse_bin_modifiers();
            let next_min = if right_assoc { prec } else { prec + 1 };
            let rhs = self.parse_binary(next_min);
            // modifiers written after the right operand (accepted here so
            // suites can exercise that edge too) land in the same place
            if modifiers.is_none() {
                modifiers = self.parse_bin_modifiers();
            }
            let (from, to) = (lhs.from, modifiers.as_ref().map(|m| m.to).max(Some(rhs.to)).unwrap());
            let mut children = vec![wrap_expr(lhs), op_node];
            if let Some(modifiers) = modifiers {
                children.push(modifiers);
            }
            children.push(wrap_expr(rhs));
            lhs = RawNode::with_children(NodeKind::BinaryExpr, from, to, children);
        }
        lhs
    }

    /// `bool`? (`on` | `ignoring`)(...)? (`group_left` | `group_right`)(...)?
    fn parse_bin_modifiers(&mut self) -> Option<RawNode> {
        let mut children = Vec::new();

        if self.at_ident("bool") {
            children.push(leaf(NodeKind::Bool, self.advance()));
        }

        let mut group_children = Vec::new();
        if self.at_ident("on") || self.at_ident("ignoring") {
            let kw = self.advance();
            let kw_kind = if self.text(kw) == "on" {
                NodeKind::On
            } else {
                NodeKind::Ignoring
            };
            let labels = self.parse_grouping_labels();
            group_children.push(RawNode::with_children(
                NodeKind::OnOrIgnoring,
                kw.from,
                labels.to,
                vec![leaf(kw_kind, kw), labels],
            ));
        }
        if self.at_ident("group_left") || self.at_ident("group_right") {
            let kw = self.advance();
            let kw_kind = if self.text(kw) == "group_left" {
                NodeKind::GroupLeft
            } else {
                NodeKind::GroupRight
            };
            group_children.push(leaf(kw_kind, kw));
            if self.peek().kind == TokKind::LParen {
                let lparen = self.expect(TokKind::LParen);
                let (list, rparen) = self.parse_label_name_list();
                let mut maybe_children = Vec::new();
                if let Some(list) = list {
                    maybe_children.push(list);
                }
                group_children.push(RawNode::with_children(
                    NodeKind::MaybeGroupingLabels,
                    lparen.from,
                    rparen.to,
                    maybe_children,
                ));
            }
        }

        if !group_children.is_empty() {
            let from = group_children.first().map(|n| n.from).unwrap();
            let to = group_children.last().map(|n| n.to).unwrap();
            children.push(RawNode::with_children(
                NodeKind::GroupModifiers,
                from,
                to,
                group_children,
            ));
        }

        if children.is_empty() {
            return None;
        }
        let from = children.first().map(|n| n.from).unwrap();
        let to = children.last().map(|n| n.to).unwrap();
        Some(RawNode::with_children(
            NodeKind::BinModifiers,
            from,
            to,
            children,
        ))
    }

    /// `( label, label, ... )` into `GroupingLabels > GroupingLabelList`.
    fn parse_grouping_labels(&mut self) -> RawNode {
        let lparen = self.expect(TokKind::LParen);
        let (list, rparen) = self.parse_label_name_list();
        let mut children = Vec::new();
        if let Some(list) = list {
            children.push(list);
        }
        RawNode::with_children(NodeKind::GroupingLabels, lparen.from, rparen.to, children)
    }

    /// Comma-separated label names up to the closing paren.
    fn parse_label_name_list(&mut self) -> (Option<RawNode>, Token) {
        let mut labels = Vec::new();
        while self.peek().kind != TokKind::RParen {
            let tok = self.expect(TokKind::Ident);
            labels.push(leaf(NodeKind::LabelName, tok));
            if self.peek().kind == TokKind::Comma {
                self.advance();
            }
        }
        let rparen = self.expect(TokKind::RParen);
        (nest_list(NodeKind::GroupingLabelList, labels), rparen)
    }

    fn parse_unary(&mut self) -> RawNode {
        let tok = self.peek();
        if tok.kind == TokKind::Add || tok.kind == TokKind::Sub {
            let op = self.advance();
            let operand = self.parse_unary();
            let to = operand.to;
            return RawNode::with_children(
                NodeKind::UnaryExpr,
                op.from,
                to,
                vec![wrap_expr(operand)],
            );
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> RawNode {
        let mut node = self.parse_atom();
        loop {
            if self.peek().kind == TokKind::LBracket {
                let lbracket = self.advance();
                let range = self.expect(TokKind::Duration);
                if self.peek().kind == TokKind::Colon {
                    self.advance();
                    let mut children =
                        vec![wrap_expr(node), leaf(NodeKind::Duration, range)];
                    if self.peek().kind == TokKind::Duration {
                        children.push(leaf(NodeKind::Duration, self.advance()));
                    }
                    let rbracket = self.expect(TokKind::RBracket);
                    let from = children[0].from.min(lbracket.from);
                    node = RawNode::with_children(
                        NodeKind::SubqueryExpr,
                        from,
                        rbracket.to,
                        children,
                    );
                } else {
                    let rbracket = self.expect(TokKind::RBracket);
                    let from = node.from;
                    node = RawNode::with_children(
                        NodeKind::MatrixSelector,
                        from,
                        rbracket.to,
                        vec![wrap_expr(node), leaf(NodeKind::Duration, range)],
                    );
                }
            } else if self.at_ident("offset") {
                self.advance();
                let duration = self.expect(TokKind::Duration);
                let from = node.from;
                node = RawNode::with_children(
                    NodeKind::OffsetExpr,
                    from,
                    duration.to,
                    vec![wrap_expr(node), leaf(NodeKind::Duration, duration)],
                );
            } else {
                break;
            }
        }
        node
    }

    fn parse_atom(&mut self) -> RawNode {
        let tok = self.peek();
        match tok.kind {
            TokKind::Number => leaf(NodeKind::NumberLiteral, self.advance()),
            TokKind::Str => leaf(NodeKind::StringLiteral, self.advance()),
            TokKind::LParen => {
                let lparen = self.advance();
                let inner = self.parse_expr();
                let rparen = self.expect(TokKind::RParen);
                RawNode::with_children(
                    NodeKind::ParenExpr,
                    lparen.from,
                    rparen.to,
                    vec![wrap_expr(inner)],
                )
            }
            TokKind::LBrace => {
                let matchers = self.parse_label_matchers();
                let (from, to) = (matchers.from, matchers.to);
                RawNode::with_children(NodeKind::VectorSelector, from, to, vec![matchers])
            }
            TokKind::Ident => {
                let name = self.text(tok).to_string();
                if let Some(func) = Function::from_name(&name) {
                    if self.tokens[self.pos + 1].kind == TokKind::LParen {
                        return self.parse_function_call(func);
                    }
                }
                if let Some(op) = AggregateOp::from_name(&name) {
                    return self.parse_aggregation(op);
                }
                self.parse_vector_selector()
            }
            other => panic!("unexpected token {:?} in {:?}", other, self.src),
        }
    }

    fn parse_function_call(&mut self, func: Function) -> RawNode {
        let ident = self.advance();
        let identifier = RawNode::with_children(
            NodeKind::FunctionIdentifier,
            ident.from,
            ident.to,
            vec![leaf(NodeKind::Function(func), ident)],
        );
        let body = self.parse_call_body();
        let to = body.to;
        RawNode::with_children(
            NodeKind::FunctionCall,
            ident.from,
            to,
            vec![identifier, body],
        )
    }

    /// `( expr, expr, ... )` into `FunctionCallBody > FunctionCallArgs`.
    fn parse_call_body(&mut self) -> RawNode {
        let lparen = self.expect(TokKind::LParen);
        let mut args = Vec::new();
        while self.peek().kind != TokKind::RParen {
            args.push(wrap_expr(self.parse_expr()));
            if self.peek().kind == TokKind::Comma {
                self.advance();
            }
        }
        let rparen = self.expect(TokKind::RParen);
        let mut children = Vec::new();
        if let Some(list) = nest_list(NodeKind::FunctionCallArgs, args) {
            children.push(list);
        }
        RawNode::with_children(NodeKind::FunctionCallBody, lparen.from, rparen.to, children)
    }

    fn parse_aggregation(&mut self, op: AggregateOp) -> RawNode {
        let ident = self.advance();
        let mut children = vec![leaf(NodeKind::AggregateOp(op), ident)];
        if self.at_ident("by") || self.at_ident("without") {
            children.push(self.parse_aggregate_modifier());
            children.push(self.parse_call_body());
        } else {
            children.push(self.parse_call_body());
            if self.at_ident("by") || self.at_ident("without") {
                children.push(self.parse_aggregate_modifier());
            }
        }
        let from = ident.from;
        let to = children.last().map(|n| n.to).unwrap();
        RawNode::with_children(NodeKind::AggregateExpr, from, to, children)
    }

    fn parse_aggregate_modifier(&mut self) -> RawNode {
        let kw = self.advance();
        let kw_kind = if self.text(kw) == "by" {
            NodeKind::By
        } else {
            NodeKind::Without
        };
        let labels = self.parse_grouping_labels();
        let to = labels.to;
        RawNode::with_children(
            NodeKind::AggregateModifier,
            kw.from,
            to,
            vec![leaf(kw_kind, kw), labels],
        )
    }

    fn parse_vector_selector(&mut self) -> RawNode {
        let name = self.advance();
        let mut children = vec![leaf(NodeKind::Identifier, name)];
        let mut to = name.to;
        if self.peek().kind == TokKind::LBrace {
            let matchers = self.parse_label_matchers();
            to = matchers.to;
            children.push(matchers);
        }
        RawNode::with_children(NodeKind::VectorSelector, name.from, to, children)
    }

    /// `{ label op "value", ... }` into `LabelMatchers > LabelMatchList`.
    fn parse_label_matchers(&mut self) -> RawNode {
        let lbrace = self.expect(TokKind::LBrace);
        let mut matchers = Vec::new();
        while self.peek().kind != TokKind::RBrace {
            let label = self.expect(TokKind::Ident);
            let op = self.advance();
            let op_kind = match op.kind {
                TokKind::EqlSingle => NodeKind::EqlSingle,
                TokKind::Neq => NodeKind::Neq,
                TokKind::EqlRegex => NodeKind::EqlRegex,
                TokKind::NeqRegex => NodeKind::NeqRegex,
                other => panic!("unexpected label matcher operator {:?}", other),
            };
            let value = self.expect(TokKind::Str);
            matchers.push(RawNode::with_children(
                NodeKind::LabelMatcher,
                label.from,
                value.to,
                vec![
                    leaf(NodeKind::LabelName, label),
                    leaf(op_kind, op),
                    leaf(NodeKind::StringLiteral, value),
                ],
            ));
            if self.peek().kind == TokKind::Comma {
                self.advance();
            }
        }
        let rbrace = self.expect(TokKind::RBrace);
        let mut children = Vec::new();
        if let Some(list) = nest_list(NodeKind::LabelMatchList, matchers) {
            children.push(list);
        }
        RawNode::with_children(NodeKind::LabelMatchers, lbrace.from, rbrace.to, children)
    }
}
