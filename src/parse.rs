//! Recursive-descent parser: token stream → [`Node`] trees.
//!
//! Indentation is threaded through every grammar function as `tab_expect`,
//! the number of leading `TAB` tokens a line must carry to still belong to
//! the current block. `statement` is the only function that actually reads
//! `NEWLINE`/`TAB`; everything below it forwards `tab_expect` unchanged so
//! that an `if`/`for`/`while` nested inside an expression can still open its
//! own indented body at the right depth.
//!
//! Failures are not `Result`s: a sub-parse that fails returns a
//! `Node::Error` sentinel, and every caller checks `is_error()` and
//! short-circuits by returning that same sentinel upward. This mirrors how
//! the evaluator's own top-level loop aborts a whole program on the first
//! `Node::Error` it finds, so there is nothing to recover by propagating a
//! typed error instead.

use std::rc::Rc;

use smol_str::SmolStr;

use crate::ast::{AlgoDef, Literal, Node, StructDef};
use crate::position::Span;
use crate::token::{builtin_const_value, Token, TokenKind};

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

pub fn parse(tokens: Vec<Token>) -> Vec<Node> {
    let mut parser = Parser { tokens, pos: 0 };
    let nodes = parser.statement(0);
    tracing::debug!("parsed {} top-level statement(s): {:#?}", nodes.len(), nodes);
    nodes
}

impl Parser {
    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn span(&self) -> Span {
        self.current().span.clone()
    }

    /// Consume and return the current token, clamped at the trailing
    /// `TokenKind::None` sentinel rather than running off the end.
    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn error_here(&self, msg: impl Into<String>) -> Node {
        Node::Error(msg.into(), self.current().span.clone())
    }

    /// A block body: zero or more statements, each on its own line at
    /// exactly `tab_expect` tabs of indentation. Returns on dedent (without
    /// consuming the triggering `NEWLINE`, so the caller can reconsume it)
    /// or on the first statement that fails to parse.
    fn statement(&mut self, tab_expect: usize) -> Vec<Node> {
        let mut ret = Vec::new();
        loop {
            while matches!(self.current().kind, TokenKind::Newline) {
                let newline_pos = self.pos;
                self.bump();
                let mut tab_count = 0usize;
                while matches!(self.current().kind, TokenKind::Tab) {
                    self.bump();
                    tab_count += 1;
                }
                if matches!(self.current().kind, TokenKind::Newline) {
                    continue;
                }
                if tab_count < tab_expect {
                    self.pos = newline_pos;
                    return ret;
                }
                if tab_count > tab_expect {
                    return vec![self.error_here(format!("Expected {tab_expect} tabs"))];
                }
                break;
            }

            while matches!(self.current().kind, TokenKind::Semicolon) {
                self.bump();
            }

            if !matches!(self.current().kind, TokenKind::None | TokenKind::Newline) {
                let node = self.expr(tab_expect);
                if node.is_error() {
                    return vec![node];
                }
                tracing::trace!(tab_expect, "parsed statement: {node:?}");
                ret.push(node);
            }

            if !matches!(self.current().kind, TokenKind::Newline | TokenKind::Semicolon) {
                break;
            }
        }
        ret
    }

    fn expr(&mut self, tab_expect: usize) -> Node {
        let mut left = self.comp_expr(tab_expect);
        if left.is_error() {
            return left;
        }
        loop {
            if !(self.current().is_keyword("and") || self.current().is_keyword("or")) {
                break;
            }
            let op_tok = self.bump();
            let right = self.comp_expr(tab_expect);
            if right.is_error() {
                return right;
            }
            left = Node::BinOp(Box::new(left), Box::new(right), op_tok);
        }
        left
    }

    fn comp_expr(&mut self, tab_expect: usize) -> Node {
        if self.current().is_keyword("not") {
            let op_tok = self.bump();
            let operand = self.comp_expr(tab_expect);
            if operand.is_error() {
                return operand;
            }
            return Node::UnaryOp(Box::new(operand), op_tok);
        }
        let mut left = self.arith_expr(tab_expect);
        if left.is_error() {
            return left;
        }
        loop {
            let is_cmp = matches!(
                self.current().kind,
                TokenKind::Equal
                    | TokenKind::NotEqual
                    | TokenKind::Less
                    | TokenKind::Greater
                    | TokenKind::LessEq
                    | TokenKind::GreaterEq
            );
            if !is_cmp {
                break;
            }
            let op_tok = self.bump();
            let right = self.arith_expr(tab_expect);
            if right.is_error() {
                return right;
            }
            left = Node::BinOp(Box::new(left), Box::new(right), op_tok);
        }
        left
    }

    fn arith_expr(&mut self, tab_expect: usize) -> Node {
        let mut left = self.term(tab_expect);
        if left.is_error() {
            return left;
        }
        loop {
            if !matches!(self.current().kind, TokenKind::Add | TokenKind::Sub) {
                break;
            }
            let op_tok = self.bump();
            let right = self.term(tab_expect);
            if right.is_error() {
                return right;
            }
            left = Node::BinOp(Box::new(left), Box::new(right), op_tok);
        }
        left
    }

    fn term(&mut self, tab_expect: usize) -> Node {
        let mut left = self.factor(tab_expect);
        if left.is_error() {
            return left;
        }
        loop {
            if !matches!(self.current().kind, TokenKind::Mul | TokenKind::Div | TokenKind::Mod) {
                break;
            }
            let op_tok = self.bump();
            let right = self.factor(tab_expect);
            if right.is_error() {
                return right;
            }
            left = Node::BinOp(Box::new(left), Box::new(right), op_tok);
        }
        left
    }

    fn factor(&mut self, tab_expect: usize) -> Node {
        if matches!(self.current().kind, TokenKind::Add | TokenKind::Sub) {
            let op_tok = self.bump();
            let operand = self.factor(tab_expect);
            if operand.is_error() {
                return operand;
            }
            return Node::UnaryOp(Box::new(operand), op_tok);
        }
        self.pow_expr(tab_expect)
    }

    /// Right-leaning: `2 ^ 3 ^ 2` parses as `2 ^ (3 ^ 2)` because the
    /// right-hand side recurses through `factor` rather than `call`.
    fn pow_expr(&mut self, tab_expect: usize) -> Node {
        let mut left = self.call_expr(tab_expect);
        if left.is_error() {
            return left;
        }
        while matches!(self.current().kind, TokenKind::Pow) {
            let op_tok = self.bump();
            let right = self.factor(tab_expect);
            if right.is_error() {
                return right;
            }
            left = Node::BinOp(Box::new(left), Box::new(right), op_tok);
        }
        left
    }

    /// `atom` followed by any chain of `.member`, `(args)` and `[index]`,
    /// with a trailing `<- expr` turning the whole chain into an assignment
    /// to its last access. A bare identifier's own `<- expr` shortcut is
    /// handled inside `atom` instead, so it never reaches here.
    fn call_expr(&mut self, tab_expect: usize) -> Node {
        let mut at = self.atom(tab_expect);
        if at.is_error() {
            return at;
        }

        while matches!(self.current().kind, TokenKind::Dot) {
            self.bump();
            let name = match &self.current().kind {
                TokenKind::Identifier(n) => n.clone(),
                _ => return self.error_here("Expected a member name after '.'"),
            };
            let span = self.span();
            self.bump();
            at = Node::MemAccess(Box::new(at), name, span);
        }

        if matches!(self.current().kind, TokenKind::Assign) {
            let span = self.span();
            self.bump();
            let rhs = self.expr(tab_expect);
            if rhs.is_error() {
                return rhs;
            }
            return Node::ArrAssign(Box::new(at), Box::new(rhs), span);
        }

        if !matches!(self.current().kind, TokenKind::LeftParen | TokenKind::LeftSquare) {
            return at;
        }

        loop {
            match self.current().kind {
                TokenKind::LeftParen => {
                    let span = self.span();
                    self.bump();
                    let mut args = Vec::new();
                    if !matches!(self.current().kind, TokenKind::RightParen) {
                        loop {
                            let arg = self.expr(tab_expect);
                            if arg.is_error() {
                                return arg;
                            }
                            args.push(arg);
                            if matches!(self.current().kind, TokenKind::Comma) {
                                self.bump();
                                continue;
                            }
                            break;
                        }
                    }
                    if !matches!(self.current().kind, TokenKind::RightParen) {
                        return self.error_here("Expected ')'");
                    }
                    self.bump();
                    at = Node::AlgoCall(Box::new(at), args, span);
                }
                TokenKind::LeftSquare => {
                    let span = self.span();
                    self.bump();
                    let index = self.expr(tab_expect);
                    if index.is_error() {
                        return index;
                    }
                    if !matches!(self.current().kind, TokenKind::RightSquare) {
                        return self.error_here("Expected ']'");
                    }
                    self.bump();
                    at = Node::ArrAccess(Box::new(at), Box::new(index), span);
                }
                _ => break,
            }
        }

        if matches!(self.current().kind, TokenKind::Assign) {
            let span = self.span();
            self.bump();
            let rhs = self.expr(tab_expect);
            if rhs.is_error() {
                return rhs;
            }
            return Node::ArrAssign(Box::new(at), Box::new(rhs), span);
        }

        at
    }

    fn atom(&mut self, tab_expect: usize) -> Node {
        let span = self.span();
        match self.current().kind.clone() {
            TokenKind::Int(v) => {
                self.bump();
                Node::Value(Literal::Int(v), span)
            }
            TokenKind::Float(v) => {
                self.bump();
                Node::Value(Literal::Float(v), span)
            }
            TokenKind::String(s) => {
                self.bump();
                Node::Value(Literal::String(s), span)
            }
            TokenKind::BuiltinConst(name) => {
                let value = builtin_const_value(&name).expect("classified BuiltinConst");
                self.bump();
                Node::Value(Literal::Int(value), span)
            }
            TokenKind::BuiltinAlgo(name) => {
                self.bump();
                Node::VarAccess(name, span)
            }
            TokenKind::LeftParen => {
                self.bump();
                let inner = self.expr(tab_expect);
                if inner.is_error() {
                    return inner;
                }
                if !matches!(self.current().kind, TokenKind::RightParen) {
                    return self.error_here("Expected ')'");
                }
                self.bump();
                inner
            }
            TokenKind::LeftBrace => self.array_expr(tab_expect, span),
            TokenKind::Identifier(name) => {
                self.bump();
                if matches!(self.current().kind, TokenKind::Assign) {
                    self.bump();
                    let rhs = self.expr(tab_expect);
                    if rhs.is_error() {
                        return rhs;
                    }
                    Node::VarAssign(name, Box::new(rhs), span)
                } else {
                    Node::VarAccess(name, span)
                }
            }
            TokenKind::Keyword(k) if k == "self" => {
                self.bump();
                Node::VarAccess(SmolStr::new("self"), span)
            }
            TokenKind::Keyword(k) if k == "if" => {
                self.bump();
                self.if_expr(tab_expect)
            }
            TokenKind::Keyword(k) if k == "for" => {
                self.bump();
                self.for_expr(tab_expect)
            }
            TokenKind::Keyword(k) if k == "while" => {
                self.bump();
                self.while_expr(tab_expect)
            }
            TokenKind::Keyword(k) if k == "repeat" => {
                self.bump();
                self.repeat_expr(tab_expect)
            }
            TokenKind::Keyword(k) if k == "Algorithm" => {
                self.bump();
                self.algo_def(tab_expect)
            }
            TokenKind::Keyword(k) if k == "Struct" => {
                self.bump();
                self.struct_def(tab_expect)
            }
            TokenKind::Keyword(k) if k == "return" => {
                self.bump();
                if matches!(
                    self.current().kind,
                    TokenKind::Newline | TokenKind::Semicolon | TokenKind::None
                ) {
                    Node::Return(None, span)
                } else {
                    let value = self.expr(tab_expect);
                    if value.is_error() {
                        return value;
                    }
                    Node::Return(Some(Box::new(value)), span)
                }
            }
            _ => self.error_here(format!("Unexpected token {}", self.current().describe())),
        }
    }

    fn array_expr(&mut self, tab_expect: usize, span: Span) -> Node {
        self.bump();
        let mut elements = Vec::new();
        if !matches!(self.current().kind, TokenKind::RightBrace) {
            loop {
                let el = self.expr(tab_expect);
                if el.is_error() {
                    return el;
                }
                elements.push(el);
                if matches!(self.current().kind, TokenKind::Comma) {
                    self.bump();
                    continue;
                }
                break;
            }
        }
        if !matches!(self.current().kind, TokenKind::RightBrace) {
            return self.error_here("Expected '}'");
        }
        self.bump();
        Node::Array(elements, span)
    }

    fn if_expr(&mut self, tab_expect: usize) -> Node {
        let span = self.span();
        let cond = self.expr(tab_expect);
        if cond.is_error() {
            return cond;
        }
        if !self.current().is_keyword("then") {
            return self.error_here("Expected 'then'");
        }
        self.bump();

        let then_body = if matches!(self.current().kind, TokenKind::Newline) {
            self.statement(tab_expect + 1)
        } else {
            let e = self.expr(tab_expect);
            if e.is_error() {
                return e;
            }
            vec![e]
        };
        if let [Node::Error(_, _)] = then_body.as_slice() {
            return then_body.into_iter().next().unwrap();
        }

        // `else` can follow directly on the same line as an inline
        // then-body (`if c then 1 else 2`), or on a following line at the
        // same indentation as the `if` itself.
        let else_body = if self.current().is_keyword("else") {
            self.bump();
            match self.else_body(tab_expect) {
                Ok(eb) => eb,
                Err(err) => return err,
            }
        } else if matches!(self.current().kind, TokenKind::Newline) {
            let newline_pos = self.pos;
            self.bump();
            for _ in 0..tab_expect {
                self.bump();
            }
            if self.current().is_keyword("else") {
                self.bump();
                match self.else_body(tab_expect) {
                    Ok(eb) => eb,
                    Err(err) => return err,
                }
            } else {
                // No `else` at this indentation: rewind to the `then`
                // body's trailing NEWLINE so the enclosing block can
                // reconsume it.
                self.pos = newline_pos;
                None
            }
        } else {
            None
        };

        Node::If {
            cond: Box::new(cond),
            then_body,
            else_body,
            span,
        }
    }

    /// The body of an `else` clause, having already consumed the `else`
    /// keyword: `else if ...` recurses, a `NEWLINE` opens an indented
    /// block, anything else is a single inline expression.
    fn else_body(&mut self, tab_expect: usize) -> Result<Option<Vec<Node>>, Node> {
        if self.current().is_keyword("if") {
            self.bump();
            let elif = self.if_expr(tab_expect);
            if elif.is_error() {
                return Err(elif);
            }
            Ok(Some(vec![elif]))
        } else if matches!(self.current().kind, TokenKind::Newline) {
            let eb = self.statement(tab_expect + 1);
            if let [Node::Error(_, _)] = eb.as_slice() {
                return Err(eb.into_iter().next().unwrap());
            }
            Ok(Some(eb))
        } else {
            let e = self.expr(tab_expect);
            if e.is_error() {
                return Err(e);
            }
            Ok(Some(vec![e]))
        }
    }

    fn for_expr(&mut self, tab_expect: usize) -> Node {
        let span = self.span();
        let var = match &self.current().kind {
            TokenKind::Identifier(n) => n.clone(),
            _ => return self.error_here("Expected a loop variable name"),
        };
        self.bump();
        if !matches!(self.current().kind, TokenKind::Assign) {
            return self.error_here("Expected '<-'");
        }
        self.bump();
        let start = self.expr(tab_expect);
        if start.is_error() {
            return start;
        }
        if !self.current().is_keyword("to") {
            return self.error_here("Expected 'to'");
        }
        self.bump();
        let end = self.expr(tab_expect);
        if end.is_error() {
            return end;
        }
        let step = if self.current().is_keyword("step") {
            self.bump();
            let s = self.expr(tab_expect);
            if s.is_error() {
                return s;
            }
            Some(Box::new(s))
        } else {
            None
        };
        if !self.current().is_keyword("do") {
            return self.error_here("Expected 'do'");
        }
        self.bump();
        let body = self.statement(tab_expect + 1);
        if let [Node::Error(_, _)] = body.as_slice() {
            return body.into_iter().next().unwrap();
        }
        Node::For {
            var,
            start: Box::new(start),
            end: Box::new(end),
            step,
            body,
            span,
        }
    }

    fn while_expr(&mut self, tab_expect: usize) -> Node {
        let span = self.span();
        let cond = self.expr(tab_expect);
        if cond.is_error() {
            return cond;
        }
        if !self.current().is_keyword("do") {
            return self.error_here("Expected 'do'");
        }
        self.bump();
        let body = self.statement(tab_expect + 1);
        if let [Node::Error(_, _)] = body.as_slice() {
            return body.into_iter().next().unwrap();
        }
        Node::While {
            cond: Box::new(cond),
            body,
            span,
        }
    }

    fn repeat_expr(&mut self, tab_expect: usize) -> Node {
        let span = self.span();
        let body = self.statement(tab_expect + 1);
        if let [Node::Error(_, _)] = body.as_slice() {
            return body.into_iter().next().unwrap();
        }
        if !self.current().is_keyword("until") {
            return self.error_here("Expected 'until'");
        }
        self.bump();
        let cond = self.expr(tab_expect);
        if cond.is_error() {
            return cond;
        }
        Node::Repeat {
            body,
            cond: Box::new(cond),
            span,
        }
    }

    /// Resolves one of: `Name::method`, `Name method` (struct-prefixed,
    /// first name discarded), `operator OP`, a bare `Name`, or no name at
    /// all (stored as `"Anonymous"`, immediately followed by `(`).
    fn algo_def(&mut self, tab_expect: usize) -> Node {
        let span = self.span();
        let name: SmolStr = match &self.current().kind {
            TokenKind::Identifier(first) => {
                let first = first.clone();
                self.bump();
                if matches!(self.current().kind, TokenKind::ScopeRes) {
                    self.bump();
                    let method = match &self.current().kind {
                        TokenKind::Identifier(m) => m.clone(),
                        _ => return self.error_here("Expected a method name after '::'"),
                    };
                    self.bump();
                    SmolStr::new(format!("{first}::{method}"))
                } else if let TokenKind::Identifier(second) = &self.current().kind {
                    let second = second.clone();
                    self.bump();
                    second
                } else {
                    first
                }
            }
            TokenKind::Keyword(k) if k == "operator" => {
                self.bump();
                let op = self
                    .current()
                    .operator_symbol()
                    .map(str::to_string)
                    .or_else(|| self.current().name().map(str::to_string));
                let op = match op {
                    Some(op) => op,
                    None => return self.error_here("Expected an operator after 'operator'"),
                };
                self.bump();
                SmolStr::new(format!("operator {op}"))
            }
            TokenKind::LeftParen => SmolStr::new("Anonymous"),
            _ => {
                return self.error_here("Expected an identifier, 'operator', or '(' after 'Algorithm'")
            }
        };

        if !matches!(self.current().kind, TokenKind::LeftParen) {
            return self.error_here("Expected '('");
        }
        self.bump();
        let mut params = Vec::new();
        if !matches!(self.current().kind, TokenKind::RightParen) {
            loop {
                let pname = match &self.current().kind {
                    TokenKind::Identifier(n) => n.clone(),
                    _ => return self.error_here("Expected a parameter name"),
                };
                self.bump();
                params.push(pname);
                if matches!(self.current().kind, TokenKind::Comma) {
                    self.bump();
                    continue;
                }
                break;
            }
        }
        if !matches!(self.current().kind, TokenKind::RightParen) {
            return self.error_here("Expected ')'");
        }
        self.bump();
        if !matches!(self.current().kind, TokenKind::Colon) {
            return self.error_here("Expected ':'");
        }
        self.bump();

        let body = self.statement(tab_expect + 1);
        if let [Node::Error(_, _)] = body.as_slice() {
            return body.into_iter().next().unwrap();
        }
        Node::AlgoDef(
            Rc::new(AlgoDef {
                name,
                params,
                body,
                span: span.clone(),
            }),
            span,
        )
    }

    /// A struct's own body: declared member names and inline method
    /// definitions, each at exactly `tab_expect + 1` tabs. Dedent rewinds to
    /// the block's first `NEWLINE`, same as `statement`.
    fn struct_def(&mut self, tab_expect: usize) -> Node {
        let span = self.span();
        let name = match &self.current().kind {
            TokenKind::Identifier(n) => n.clone(),
            _ => return self.error_here("Expected a struct name"),
        };
        self.bump();
        if !matches!(self.current().kind, TokenKind::Colon) {
            return self.error_here("Expected ':'");
        }
        self.bump();

        let mut members = Vec::new();
        let mut methods = Vec::new();

        while matches!(self.current().kind, TokenKind::Newline) {
            let newline_pos = self.pos;
            self.bump();
            let mut tab_count = 0usize;
            while matches!(self.current().kind, TokenKind::Tab) {
                self.bump();
                tab_count += 1;
            }
            if matches!(self.current().kind, TokenKind::Newline) {
                continue;
            }
            if tab_count < tab_expect + 1 {
                self.pos = newline_pos;
                break;
            }
            if tab_count > tab_expect + 1 {
                return self.error_here(format!("Expected {} tabs", tab_expect + 1));
            }
            match &self.current().kind {
                TokenKind::Identifier(member) => {
                    members.push(member.clone());
                    self.bump();
                }
                TokenKind::Keyword(k) if k == "Algorithm" => {
                    self.bump();
                    let def = self.algo_def(tab_expect + 1);
                    if def.is_error() {
                        return def;
                    }
                    if let Node::AlgoDef(algo, _) = def {
                        methods.push(algo);
                    }
                }
                TokenKind::Newline | TokenKind::None => {}
                _ => return self.error_here("Expected an identifier or 'Algorithm' inside struct"),
            }
        }

        Node::StructDef(
            Rc::new(StructDef {
                name,
                members,
                methods,
                span: span.clone(),
            }),
            span,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::lex_all;

    fn parse_src(src: &str) -> Vec<Node> {
        parse(lex_all(src, Rc::from("test")))
    }

    #[test]
    fn assignment_and_arithmetic_precedence() {
        let nodes = parse_src("x <- 1 + 2 * 3\n");
        assert_eq!(nodes.len(), 1);
        match &nodes[0] {
            Node::VarAssign(name, rhs, _) => {
                assert_eq!(name.as_str(), "x");
                match rhs.as_ref() {
                    Node::BinOp(lhs, _, op) => {
                        assert!(matches!(lhs.as_ref(), Node::Value(Literal::Int(1), _)));
                        assert!(matches!(op.kind, TokenKind::Add));
                    }
                    other => panic!("expected BinOp, got {other:?}"),
                }
            }
            other => panic!("expected VarAssign, got {other:?}"),
        }
    }

    #[test]
    fn if_then_else_same_indentation_is_attached() {
        let nodes = parse_src("if x then\n\ty <- 1\nelse\n\ty <- 2\n");
        assert_eq!(nodes.len(), 1);
        match &nodes[0] {
            Node::If {
                then_body,
                else_body,
                ..
            } => {
                assert_eq!(then_body.len(), 1);
                assert!(else_body.is_some());
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn if_without_else_does_not_swallow_next_statement() {
        let nodes = parse_src("if x then\n\ty <- 1\nz <- 2\n");
        assert_eq!(nodes.len(), 2);
        assert!(matches!(nodes[0], Node::If { .. }));
        assert!(matches!(nodes[1], Node::VarAssign(_, _, _)));
    }

    #[test]
    fn for_loop_parses_bounds_and_body() {
        let nodes = parse_src("for i <- 1 to 10 do\n\tprint(i)\n");
        match &nodes[0] {
            Node::For { var, body, step, .. } => {
                assert_eq!(var.as_str(), "i");
                assert!(step.is_none());
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected For, got {other:?}"),
        }
    }

    #[test]
    fn array_literal_and_indexing() {
        let nodes = parse_src("a <- {1, 2, 3}\nb <- a[1]\n");
        assert!(matches!(&nodes[0], Node::VarAssign(_, rhs, _) if matches!(rhs.as_ref(), Node::Array(elems, _) if elems.len() == 3)));
        assert!(matches!(&nodes[1], Node::VarAssign(_, rhs, _) if matches!(rhs.as_ref(), Node::ArrAccess(_, _, _))));
    }

    #[test]
    fn algorithm_qualified_method_name() {
        let nodes = parse_src("Algorithm Pair::sum():\n\treturn self.a + self.b\n");
        match &nodes[0] {
            Node::AlgoDef(def, _) => assert_eq!(def.name.as_str(), "Pair::sum"),
            other => panic!("expected AlgoDef, got {other:?}"),
        }
    }

    #[test]
    fn algorithm_operator_overload_name() {
        let nodes = parse_src("Algorithm operator +(other):\n\treturn self.x\n");
        match &nodes[0] {
            Node::AlgoDef(def, _) => assert_eq!(def.name.as_str(), "operator +"),
            other => panic!("expected AlgoDef, got {other:?}"),
        }
    }

    #[test]
    fn struct_def_collects_members_and_methods() {
        let nodes =
            parse_src("Struct Pair:\n\ta\n\tb\n\tAlgorithm sum():\n\t\treturn self.a + self.b\n");
        match &nodes[0] {
            Node::StructDef(def, _) => {
                assert_eq!(def.members.len(), 2);
                assert_eq!(def.methods.len(), 1);
                assert_eq!(def.methods[0].name.as_str(), "sum");
            }
            other => panic!("expected StructDef, got {other:?}"),
        }
    }

    #[test]
    fn member_assignment_chain() {
        let nodes = parse_src("p.x <- 5\n");
        assert!(
            matches!(&nodes[0], Node::ArrAssign(lhs, _, _) if matches!(lhs.as_ref(), Node::MemAccess(_, _, _)))
        );
    }

    #[test]
    fn dedent_deeper_than_expected_is_an_error() {
        let nodes = parse_src("if x then\n\t\ty <- 1\n");
        assert!(nodes[0].is_error());
    }

    #[test]
    fn inline_if_then_else_on_one_line() {
        let nodes = parse_src("if n <= 1 then 1 else n * 2\n");
        match &nodes[0] {
            Node::If { then_body, else_body, .. } => {
                assert_eq!(then_body.len(), 1);
                assert!(matches!(then_body[0], Node::Value(Literal::Int(1), _)));
                let else_body = else_body.as_ref().expect("inline else attached");
                assert_eq!(else_body.len(), 1);
                assert!(matches!(else_body[0], Node::BinOp(_, _, _)));
            }
            other => panic!("expected If, got {other:?}"),
        }
    }
}
