//! Query parser implementation.

use num_bigint::BigInt;
use tracing::debug;

use super::convert;
use super::error::{ErrorCode, ParseError};
use super::node::{ParseKind, ParseNode};
use super::precedence::{infix_precedence, prefix_precedence, SET_OP_PRECEDENCE};
use crate::ast::{Expr, SqlDataType};
use crate::error::Result;
use crate::lexer::{Keyword, Lexer, Operator, Span, Token, TokenKind};
use crate::value::Value;

/// Default bound on expression nesting.
pub const DEFAULT_MAX_DEPTH: usize = 200;

/// Function names always parsed as aggregates.
const AGGREGATES: &[&str] = &["count", "sum", "avg", "min", "max"];

/// Date parts accepted by `EXTRACT`.
const DATE_PARTS: &[&str] = &[
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "second",
    "timezone_hour",
    "timezone_minute",
];

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest expression nesting accepted before failing with
    /// [`ErrorCode::NestingTooDeep`].
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Query parser.
pub struct Parser<'a> {
    input: &'a str,
    options: ParseOptions,
    tokens: Vec<Token>,
    pos: usize,
    /// Parameter counter for ? placeholders.
    param_counter: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self::with_options(input, ParseOptions::default())
    }

    /// Creates a parser with explicit options.
    #[must_use]
    pub fn with_options(input: &'a str, options: ParseOptions) -> Self {
        Self {
            input,
            options,
            tokens: vec![Token::new(TokenKind::Eof, None, Span::default())],
            pos: 0,
            param_counter: 0,
            depth: 0,
        }
    }

    /// Parses a single statement into an AST.
    ///
    /// # Errors
    ///
    /// Returns a lexer or parse error if the input is not a valid
    /// statement.
    pub fn parse_statement(&mut self) -> Result<Expr> {
        let tree = self.parse_tree()?;
        let expr = convert::to_expr(tree)?;
        debug!(
            tokens = self.tokens.len(),
            parameters = self.param_counter,
            "parsed statement"
        );
        Ok(expr)
    }

    /// Parses a single statement into the intermediate parse tree.
    ///
    /// # Errors
    ///
    /// Returns a lexer or parse error if the input is not a valid
    /// statement.
    pub fn parse_tree(&mut self) -> Result<ParseNode> {
        self.tokens = Lexer::new(self.input).tokenize()?;
        self.pos = 0;
        self.param_counter = 0;
        self.depth = 0;
        Ok(self.parse_top_level()?)
    }

    fn parse_top_level(&mut self) -> Result<ParseNode, ParseError> {
        let node = match self.current().kind {
            TokenKind::Keyword(Keyword::Insert | Keyword::Set | Keyword::Remove) => {
                let op = self.parse_dml_op()?;
                ParseNode::new(ParseKind::Dml, None, vec![op])
            }
            TokenKind::Keyword(Keyword::Update) => self.parse_update()?,
            TokenKind::Keyword(Keyword::Delete) => self.parse_delete()?,
            TokenKind::Keyword(Keyword::From) => self.parse_from_dml()?,
            TokenKind::Keyword(Keyword::Create) => self.parse_create()?,
            TokenKind::Keyword(Keyword::Drop) => self.parse_drop()?,
            _ => self.parse_expression(0)?,
        };

        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        if !self.current().is_eof() {
            return Err(ParseError::unexpected("end of input", self.current()));
        }
        Ok(node)
    }

    // --- Data manipulation and definition ---

    /// Parses `INSERT`, `SET` or `REMOVE`.
    fn parse_dml_op(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Keyword(Keyword::Insert) => {
                self.advance();
                self.expect_keyword(Keyword::Into)?;
                let target = self.parse_term()?;
                if self.check_keyword(Keyword::Value) {
                    self.advance();
                    let value = self.parse_expression(0)?;
                    let mut children = vec![target, value];
                    if self.check(&TokenKind::At) {
                        self.advance();
                        children.push(self.parse_expression(0)?);
                    }
                    Ok(ParseNode::new(ParseKind::InsertValue, Some(token), children))
                } else {
                    let values = self.parse_expression(0)?;
                    Ok(ParseNode::new(
                        ParseKind::Insert,
                        Some(token),
                        vec![target, values],
                    ))
                }
            }
            TokenKind::Keyword(Keyword::Set) => {
                self.advance();
                let mut assignments = Vec::new();
                loop {
                    let target = self.parse_term()?;
                    let eq = self.expect(&TokenKind::Operator(Operator::Eq))?;
                    let value = self.parse_expression(0)?;
                    assignments.push(ParseNode::new(
                        ParseKind::Assignment,
                        Some(eq),
                        vec![target, value],
                    ));
                    if !self.check(&TokenKind::Comma) {
                        break;
                    }
                    self.advance();
                }
                Ok(ParseNode::new(ParseKind::Set, Some(token), assignments))
            }
            TokenKind::Keyword(Keyword::Remove) => {
                self.advance();
                let target = self.parse_term()?;
                Ok(ParseNode::new(ParseKind::Remove, Some(token), vec![target]))
            }
            _ => Err(ParseError::unexpected("INSERT, SET or REMOVE", &token)),
        }
    }

    /// Parses `UPDATE source SET ... [WHERE e]`.
    fn parse_update(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.advance();
        let source = self.parse_from_source_item()?;
        if !self.check_keyword(Keyword::Set) {
            return Err(ParseError::unexpected("SET", self.current()));
        }
        let op = self.parse_dml_op()?;
        let mut children = vec![op, ParseNode::new(ParseKind::From, None, vec![source])];
        children.extend(self.parse_optional_where()?);
        Ok(ParseNode::new(ParseKind::Dml, Some(token), children))
    }

    /// Parses `DELETE FROM source [WHERE e]`.
    fn parse_delete(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.advance();
        let from = self.expect_keyword(Keyword::From)?;
        let source = self.parse_from_source_item()?;
        let mut children = vec![
            ParseNode::leaf(ParseKind::Delete, token.clone()),
            ParseNode::new(ParseKind::From, Some(from), vec![source]),
        ];
        children.extend(self.parse_optional_where()?);
        Ok(ParseNode::new(ParseKind::Dml, Some(token), children))
    }

    /// Parses `FROM sources [WHERE e]` followed by a DML operation.
    fn parse_from_dml(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.advance();
        let sources = self.parse_from_sources()?;
        let where_clause = self.parse_optional_where()?;
        let op = self.parse_dml_op()?;
        let mut children = vec![op, ParseNode::new(ParseKind::From, Some(token.clone()), vec![sources])];
        children.extend(where_clause);
        Ok(ParseNode::new(ParseKind::Dml, Some(token), children))
    }

    /// Parses `CREATE TABLE name` or `CREATE INDEX ON name (key, ...)`.
    fn parse_create(&mut self) -> Result<ParseNode, ParseError> {
        self.advance();
        if self.check_keyword(Keyword::Table) {
            self.advance();
            let name = self.expect_name()?;
            return Ok(ParseNode::leaf(ParseKind::CreateTable, name));
        }
        self.expect_keyword(Keyword::Index)?;
        self.expect_keyword(Keyword::On)?;
        let table = self.expect_name()?;
        self.expect(&TokenKind::LeftParen)?;
        let mut keys = Vec::new();
        loop {
            keys.push(self.parse_term()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(ParseNode::new(ParseKind::CreateIndex, Some(table), keys))
    }

    /// Parses `DROP TABLE name` or `DROP INDEX name ON table`.
    fn parse_drop(&mut self) -> Result<ParseNode, ParseError> {
        self.advance();
        if self.check_keyword(Keyword::Table) {
            self.advance();
            let name = self.expect_name()?;
            return Ok(ParseNode::leaf(ParseKind::DropTable, name));
        }
        self.expect_keyword(Keyword::Index)?;
        let index = self.expect_name()?;
        self.expect_keyword(Keyword::On)?;
        let table = self.expect_name()?;
        Ok(ParseNode::new(
            ParseKind::DropIndex,
            Some(table),
            vec![ParseNode::leaf(ParseKind::Atom, index)],
        ))
    }

    // --- Queries ---

    /// Parses `SELECT ...` or `PIVOT ...` with its clauses.
    fn parse_select(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.advance();
        let projection = if token.kind == TokenKind::Keyword(Keyword::Pivot) {
            let value = self.parse_expression(SET_OP_PRECEDENCE)?;
            self.expect(&TokenKind::At)?;
            let key = self.parse_expression(SET_OP_PRECEDENCE)?;
            ParseNode::new(ParseKind::PivotProjection, None, vec![value, key])
        } else {
            let distinct = if self.check_keyword(Keyword::Distinct) {
                Some(self.advance())
            } else {
                if self.check_keyword(Keyword::All) {
                    self.advance();
                }
                None
            };
            let projection = if self.check_keyword(Keyword::Value) {
                let value_token = self.advance();
                let value = self.parse_expression(SET_OP_PRECEDENCE)?;
                ParseNode::new(ParseKind::SelectValue, Some(value_token), vec![value])
            } else {
                self.parse_select_list()?
            };
            match distinct {
                Some(d) => ParseNode::new(ParseKind::Distinct, Some(d), vec![projection]),
                None => projection,
            }
        };

        if !self.check_keyword(Keyword::From) {
            let found = self.current();
            let mut err = ParseError::new(
                ErrorCode::MissingClause,
                format!("{} requires a FROM clause", token.kind.describe().to_uppercase()),
                found.span,
            );
            err.expected = Some("from".into());
            err.found = Some(found.kind);
            return Err(err);
        }
        let from = self.advance();
        let sources = self.parse_from_sources()?;
        let mut children = vec![
            projection,
            ParseNode::new(ParseKind::From, Some(from), vec![sources]),
        ];

        children.extend(self.parse_optional_where()?);

        if self.check_keyword(Keyword::Group) || self.check_keyword(Keyword::GroupPartial) {
            children.push(self.parse_group_by()?);
        }

        if self.check_keyword(Keyword::Having) {
            let having = self.advance();
            let cond = self.parse_expression(SET_OP_PRECEDENCE)?;
            children.push(ParseNode::new(ParseKind::Having, Some(having), vec![cond]));
        }

        if self.check_keyword(Keyword::Limit) {
            let limit = self.advance();
            let count = self.parse_expression(SET_OP_PRECEDENCE)?;
            children.push(ParseNode::new(ParseKind::Limit, Some(limit), vec![count]));
        }

        Ok(ParseNode::new(ParseKind::Select, Some(token), children))
    }

    /// Parses the select list after `SELECT [DISTINCT]`.
    fn parse_select_list(&mut self) -> Result<ParseNode, ParseError> {
        if self.check(&TokenKind::Star) {
            let star = self.advance();
            if self.check(&TokenKind::Comma) {
                return Err(ParseError::new(
                    ErrorCode::UnexpectedToken,
                    "'*' must be the only item in a select list",
                    self.current().span,
                ));
            }
            return Ok(ParseNode::new(
                ParseKind::SelectList,
                None,
                vec![ParseNode::leaf(ParseKind::Star, star)],
            ));
        }

        let mut items = Vec::new();
        loop {
            let expr = self.parse_expression(SET_OP_PRECEDENCE)?;
            let item = Self::inspect_projection(expr)?;
            let item = if item.kind == ParseKind::ProjectAll {
                item
            } else {
                self.parse_optional_as_alias(item)?
            };
            items.push(item);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        Ok(ParseNode::new(ParseKind::SelectList, None, items))
    }

    /// Turns a select item path ending in `.*` into `ProjectAll`.
    ///
    /// `.*` is only allowed as the final step, and not together with `[*]`.
    fn inspect_projection(node: ParseNode) -> Result<ParseNode, ParseError> {
        if node.kind != ParseKind::Path {
            return Ok(node);
        }
        let steps = &node.children[1..];
        let last = steps.len().saturating_sub(1);
        if let Some((_, step)) = steps
            .iter()
            .enumerate()
            .find(|(i, s)| s.kind == ParseKind::PathUnpivot && *i != last)
        {
            return Err(ParseError::new(
                ErrorCode::InvalidPathComponent,
                "'.*' is only allowed at the end of a select list path",
                step.span().unwrap_or_default(),
            ));
        }
        if steps.last().map(|s| s.kind) != Some(ParseKind::PathUnpivot) {
            return Ok(node);
        }
        if let Some(wildcard) = steps.iter().find(|s| s.kind == ParseKind::PathWildcard) {
            return Err(ParseError::new(
                ErrorCode::InvalidPathComponent,
                "'[*]' cannot be combined with a trailing '.*' in a select list",
                wildcard.span().unwrap_or_default(),
            ));
        }

        let mut children = node.children;
        children.pop();
        let target = if children.len() == 1 {
            children.remove(0)
        } else {
            ParseNode::new(ParseKind::Path, node.token, children)
        };
        Ok(ParseNode::new(ParseKind::ProjectAll, None, vec![target]))
    }

    /// Parses `GROUP [PARTIAL] BY e [AS a], ... [GROUP AS g]`.
    fn parse_group_by(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.advance();
        let kind = if token.kind == TokenKind::Keyword(Keyword::GroupPartial) {
            ParseKind::GroupPartial
        } else {
            ParseKind::Group
        };
        self.expect(&TokenKind::By)?;

        let mut children = Vec::new();
        loop {
            let expr = self.parse_expression(SET_OP_PRECEDENCE)?;
            children.push(self.parse_optional_as_alias(expr)?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        if self.check_keyword(Keyword::Group) && self.peek(1).kind == TokenKind::As {
            self.advance();
            self.advance();
            let name = self.expect_name()?;
            children.push(ParseNode::leaf(ParseKind::GroupName, name));
        }
        Ok(ParseNode::new(kind, Some(token), children))
    }

    fn parse_optional_where(&mut self) -> Result<Option<ParseNode>, ParseError> {
        if !self.check_keyword(Keyword::Where) {
            return Ok(None);
        }
        let token = self.advance();
        let cond = self.parse_expression(SET_OP_PRECEDENCE)?;
        Ok(Some(ParseNode::new(ParseKind::Where, Some(token), vec![cond])))
    }

    /// Parses comma- and join-separated sources into a left-deep join tree.
    fn parse_from_sources(&mut self) -> Result<ParseNode, ParseError> {
        let mut levels = 0;
        let result = self.parse_join_chain(&mut levels);
        self.depth -= levels;
        result
    }

    fn parse_join_chain(&mut self, levels: &mut usize) -> Result<ParseNode, ParseError> {
        let mut left = self.parse_from_source_item()?;
        loop {
            if matches!(self.current().kind, TokenKind::Comma)
                || self.current().as_keyword().is_some_and(is_join_keyword)
            {
                self.descend()?;
                *levels += 1;
            }
            let kind = self.current().kind;
            match kind {
                TokenKind::Comma => {
                    let comma = self.advance();
                    let right = self.parse_from_source_item()?;
                    left = ParseNode::new(ParseKind::InnerJoin, Some(comma), vec![left, right]);
                }
                TokenKind::Keyword(keyword) => {
                    let (join_kind, cross) = match keyword {
                        Keyword::Join | Keyword::InnerJoin => (ParseKind::InnerJoin, false),
                        Keyword::CrossJoin => (ParseKind::InnerJoin, true),
                        Keyword::LeftJoin => (ParseKind::LeftJoin, false),
                        Keyword::LeftCrossJoin => (ParseKind::LeftJoin, true),
                        Keyword::RightJoin => (ParseKind::RightJoin, false),
                        Keyword::RightCrossJoin => (ParseKind::RightJoin, true),
                        Keyword::OuterJoin => (ParseKind::OuterJoin, false),
                        Keyword::OuterCrossJoin => (ParseKind::OuterJoin, true),
                        _ => break,
                    };
                    let token = self.advance();
                    let right = self.parse_from_source_item()?;
                    let mut children = vec![left, right];
                    if self.check_keyword(Keyword::On) {
                        if cross {
                            return Err(ParseError::new(
                                ErrorCode::MalformedJoin,
                                "a cross join does not take an ON condition",
                                self.current().span,
                            ));
                        }
                        self.advance();
                        children.push(self.parse_expression(SET_OP_PRECEDENCE)?);
                    } else if !cross && join_kind != ParseKind::InnerJoin {
                        return Err(ParseError::new(
                            ErrorCode::MalformedJoin,
                            format!(
                                "{} requires an ON condition",
                                keyword.as_str().replace('_', " ").to_uppercase()
                            ),
                            token.span,
                        ));
                    }
                    left = ParseNode::new(join_kind, Some(token), children);
                }
                _ => break,
            }
        }
        Ok(left)
    }

    /// Parses one source with its aliases, or a parenthesized join group.
    fn parse_from_source_item(&mut self) -> Result<ParseNode, ParseError> {
        if self.opens_join_group() {
            self.descend()?;
            self.advance();
            let group = self.parse_from_sources();
            self.depth -= 1;
            let group = group?;
            self.expect(&TokenKind::RightParen)?;
            return Ok(group);
        }

        let source = if self.check_keyword(Keyword::Unpivot) {
            let token = self.advance();
            let expr = self.parse_expression(SET_OP_PRECEDENCE)?;
            ParseNode::new(ParseKind::Unpivot, Some(token), vec![expr])
        } else {
            self.parse_expression(SET_OP_PRECEDENCE)?
        };

        let mut node = self.parse_optional_as_alias(source)?;
        if self.check(&TokenKind::At) {
            self.advance();
            let name = self.expect_name()?;
            node = ParseNode::new(ParseKind::AtAlias, Some(name), vec![node]);
        }
        if self.check(&TokenKind::By) {
            self.advance();
            let name = self.expect_name()?;
            node = ParseNode::new(ParseKind::ByAlias, Some(name), vec![node]);
        }
        Ok(node)
    }

    /// Returns true if the cursor is on a `(` whose contents are sources
    /// joined by a comma or a join keyword, possibly inside redundant
    /// parentheses. Anything else in that position is an expression.
    fn opens_join_group(&self) -> bool {
        let mut open = self.pos;
        loop {
            if self.tokens[open].kind != TokenKind::LeftParen {
                return false;
            }
            let Some(close) = self.matching_close(open) else {
                return false;
            };
            let inner = &self.tokens[open + 1..close];
            if matches!(
                inner.first().map(|t| t.kind),
                Some(TokenKind::Keyword(Keyword::Select | Keyword::Pivot))
            ) {
                return false;
            }

            let mut nesting = 0_usize;
            for token in inner {
                match token.kind {
                    kind if opens_bracket(kind) => nesting += 1,
                    kind if closes_bracket(kind) => nesting = nesting.saturating_sub(1),
                    TokenKind::Comma if nesting == 0 => return true,
                    TokenKind::Keyword(keyword) if nesting == 0 && is_join_keyword(keyword) => {
                        return true
                    }
                    _ => {}
                }
            }

            // `( ( ... ) )`: look through the outer pair. Past the nesting
            // bound either reading fails, so stop scanning there.
            if open - self.pos >= self.options.max_depth {
                return false;
            }
            if self.matching_close(open + 1) == Some(close - 1) {
                open += 1;
            } else {
                return false;
            }
        }
    }

    /// Index of the bracket closing the one at `open`, if the input has it.
    fn matching_close(&self, open: usize) -> Option<usize> {
        if !self.tokens.get(open).is_some_and(|t| opens_bracket(t.kind)) {
            return None;
        }
        let mut nesting = 0_usize;
        for (index, token) in self.tokens.iter().enumerate().skip(open) {
            if opens_bracket(token.kind) {
                nesting += 1;
            } else if closes_bracket(token.kind) {
                nesting -= 1;
                if nesting == 0 {
                    return Some(index);
                }
            }
        }
        None
    }

    /// Wraps `node` in an `AsAlias` if `AS name` or a bare name follows.
    fn parse_optional_as_alias(&mut self, node: ParseNode) -> Result<ParseNode, ParseError> {
        let name = if self.check(&TokenKind::As) {
            self.advance();
            self.expect_name()?
        } else if matches!(
            self.current().kind,
            TokenKind::Identifier | TokenKind::QuotedIdentifier
        ) {
            self.advance()
        } else {
            return Ok(node);
        };
        Ok(ParseNode::new(ParseKind::AsAlias, Some(name), vec![node]))
    }

    // --- Expressions ---

    /// Parses an expression by precedence climbing.
    ///
    /// Only infix operators whose precedence exceeds `min_prec` are
    /// consumed, which makes every binary operator left-associative.
    fn parse_expression(&mut self, min_prec: u8) -> Result<ParseNode, ParseError> {
        self.descend()?;
        let mut levels = 1;
        let result = self.parse_infix(min_prec, &mut levels);
        self.depth -= levels;
        result
    }

    /// Counts one more level of tree height against the nesting bound.
    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= self.options.max_depth {
            return Err(ParseError::new(
                ErrorCode::NestingTooDeep,
                format!("expression nesting exceeds {} levels", self.options.max_depth),
                self.current().span,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Each operator folded into `lhs` deepens the tree by one, so it
    /// counts against the nesting bound through `levels`.
    fn parse_infix(&mut self, min_prec: u8, levels: &mut usize) -> Result<ParseNode, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let kind = self.current().kind;
            let Some(prec) = infix_precedence(&kind) else {
                break;
            };
            if prec <= min_prec {
                break;
            }
            self.descend()?;
            *levels += 1;
            let op = self.advance();

            lhs = match kind {
                TokenKind::Operator(Operator::Between | Operator::NotBetween) => {
                    let low = self.parse_expression(prec)?;
                    self.expect(&TokenKind::Operator(Operator::And))?;
                    let high = self.parse_expression(prec)?;
                    ParseNode::new(ParseKind::Ternary, Some(op), vec![lhs, low, high])
                }
                TokenKind::Operator(Operator::Like | Operator::NotLike) => {
                    let pattern = self.parse_expression(prec)?;
                    if self.check_keyword(Keyword::Escape) {
                        self.advance();
                        let escape = self.parse_expression(prec)?;
                        ParseNode::new(ParseKind::Ternary, Some(op), vec![lhs, pattern, escape])
                    } else {
                        ParseNode::new(ParseKind::Binary, Some(op), vec![lhs, pattern])
                    }
                }
                TokenKind::Operator(Operator::Is | Operator::IsNot) => {
                    let ty = self.parse_type()?;
                    ParseNode::new(ParseKind::IsType, Some(op), vec![lhs, ty])
                }
                _ => {
                    let rhs = self.parse_expression(prec)?;
                    ParseNode::new(ParseKind::Binary, Some(op), vec![lhs, rhs])
                }
            };
        }

        Ok(lhs)
    }

    /// Parses a prefix expression.
    fn parse_prefix(&mut self) -> Result<ParseNode, ParseError> {
        let kind = self.current().kind;
        if kind == TokenKind::Operator(Operator::AtSign) {
            let at = self.advance();
            let name = self.expect_name()?;
            let node = ParseNode::new(
                ParseKind::LocalsFirst,
                Some(at),
                vec![ParseNode::leaf(ParseKind::Atom, name)],
            );
            return self.parse_path_steps(node);
        }
        let Some(prec) = prefix_precedence(&kind) else {
            return self.parse_term();
        };

        let op = self.advance();
        let operand = self.parse_expression(prec)?;
        if kind == TokenKind::Operator(Operator::Not) {
            Ok(ParseNode::new(ParseKind::Unary, Some(op), vec![operand]))
        } else {
            Ok(fold_sign(op, operand))
        }
    }

    /// Parses a primary expression followed by any path steps.
    fn parse_term(&mut self) -> Result<ParseNode, ParseError> {
        let primary = self.parse_primary()?;
        self.parse_path_steps(primary)
    }

    /// Parses a primary expression.
    fn parse_primary(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Literal
            | TokenKind::IonLiteral
            | TokenKind::Null
            | TokenKind::Missing
            | TokenKind::QuotedIdentifier => {
                self.advance();
                Ok(ParseNode::leaf(ParseKind::Atom, token))
            }
            TokenKind::Identifier => {
                if self.peek(1).kind == TokenKind::LeftParen {
                    self.parse_function_call()
                } else {
                    self.advance();
                    Ok(ParseNode::leaf(ParseKind::Atom, token))
                }
            }
            TokenKind::Question => {
                self.advance();
                self.param_counter += 1;
                let numbered = Token::new(
                    TokenKind::Question,
                    Some(Value::from(BigInt::from(self.param_counter))),
                    token.span,
                );
                Ok(ParseNode::leaf(ParseKind::Parameter, numbered))
            }
            TokenKind::LeftParen => self.parse_parenthesized(),
            TokenKind::LeftBracket => {
                self.advance();
                let items = self.parse_items_until(TokenKind::RightBracket)?;
                Ok(ParseNode::new(ParseKind::List, Some(token), items))
            }
            TokenKind::LeftDoubleAngle => {
                self.advance();
                let items = self.parse_items_until(TokenKind::RightDoubleAngle)?;
                Ok(ParseNode::new(ParseKind::Bag, Some(token), items))
            }
            TokenKind::LeftCurly => self.parse_struct(),
            TokenKind::Keyword(Keyword::Case) => self.parse_case(),
            TokenKind::Keyword(Keyword::Cast) => self.parse_cast(),
            TokenKind::Keyword(Keyword::Substring) => self.parse_substring(),
            TokenKind::Keyword(Keyword::Trim) => self.parse_trim(),
            TokenKind::Keyword(Keyword::Extract) => self.parse_extract(),
            TokenKind::Keyword(Keyword::Select | Keyword::Pivot) => self.parse_select(),
            _ => Err(ParseError::unexpected("expression", &token)),
        }
    }

    /// Parses `( e )`, `( e, ... )` or `()`.
    fn parse_parenthesized(&mut self) -> Result<ParseNode, ParseError> {
        let open = self.advance();
        if self.check(&TokenKind::RightParen) {
            self.advance();
            return Ok(ParseNode::new(ParseKind::List, Some(open), Vec::new()));
        }
        let first = self.parse_expression(0)?;
        if !self.check(&TokenKind::Comma) {
            self.expect(&TokenKind::RightParen)?;
            return Ok(first);
        }
        self.advance();
        let mut items = vec![first];
        items.extend(self.parse_items_until(TokenKind::RightParen)?);
        Ok(ParseNode::new(ParseKind::List, Some(open), items))
    }

    /// Parses comma-separated expressions up to and including `close`.
    fn parse_items_until(&mut self, close: TokenKind) -> Result<Vec<ParseNode>, ParseError> {
        let mut items = Vec::new();
        if self.check(&close) {
            self.advance();
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression(0)?);
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            self.expect(&close)?;
            return Ok(items);
        }
    }

    /// Parses `.name`, `."name"`, `.*`, `[e]` and `[*]` steps.
    fn parse_path_steps(&mut self, root: ParseNode) -> Result<ParseNode, ParseError> {
        let mut steps = Vec::new();
        loop {
            match self.current().kind {
                TokenKind::Dot => {
                    self.advance();
                    let token = self.current().clone();
                    match token.kind {
                        TokenKind::Identifier | TokenKind::QuotedIdentifier => {
                            self.advance();
                            steps.push(ParseNode::leaf(ParseKind::PathField, token));
                        }
                        TokenKind::Star => {
                            self.advance();
                            steps.push(ParseNode::leaf(ParseKind::PathUnpivot, token));
                        }
                        _ => {
                            return Err(ParseError::new(
                                ErrorCode::InvalidPathComponent,
                                "expected a field name or '*' after '.'",
                                token.span,
                            ));
                        }
                    }
                }
                TokenKind::LeftBracket => {
                    let open = self.advance();
                    if self.check(&TokenKind::Star) && self.peek(1).kind == TokenKind::RightBracket {
                        self.advance();
                        self.advance();
                        steps.push(ParseNode::leaf(ParseKind::PathWildcard, open));
                    } else {
                        let index = self.parse_expression(0)?;
                        self.expect(&TokenKind::RightBracket)?;
                        steps.push(ParseNode::new(ParseKind::PathIndex, Some(open), vec![index]));
                    }
                }
                _ => break,
            }
        }

        if steps.is_empty() {
            return Ok(root);
        }
        let mut children = Vec::with_capacity(steps.len() + 1);
        children.push(root);
        children.extend(steps);
        Ok(ParseNode::new(ParseKind::Path, None, children))
    }

    /// Parses a call to a named function, aggregate or sequence constructor.
    fn parse_function_call(&mut self) -> Result<ParseNode, ParseError> {
        let name = self.advance();
        self.expect(&TokenKind::LeftParen)?;
        let key = name.key().unwrap_or_default();

        if self.check(&TokenKind::Star) {
            if key != "count" {
                return Err(ParseError::unexpected("expression", self.current()));
            }
            self.advance();
            self.expect(&TokenKind::RightParen)?;
            return Ok(ParseNode::leaf(ParseKind::CallAggWildcard, name));
        }

        let quantified = if self.check_keyword(Keyword::Distinct) {
            Some(ParseKind::CallDistinctAgg)
        } else if self.check_keyword(Keyword::All) {
            Some(ParseKind::CallAgg)
        } else {
            None
        };
        if let Some(kind) = quantified {
            self.advance();
            let arg = self.parse_expression(0)?;
            self.expect(&TokenKind::RightParen)?;
            return Ok(ParseNode::new(kind, Some(name), vec![arg]));
        }

        let args = self.parse_items_until(TokenKind::RightParen)?;
        if AGGREGATES.contains(&key.as_str()) {
            if args.len() != 1 {
                return Err(ParseError::new(
                    ErrorCode::ArityMismatch,
                    format!("{key} takes exactly one argument, found {}", args.len()),
                    name.span,
                ));
            }
            return Ok(ParseNode::new(ParseKind::CallAgg, Some(name), args));
        }
        let kind = match key.as_str() {
            "list" => ParseKind::List,
            "bag" => ParseKind::Bag,
            "sexp" => ParseKind::Sexp,
            _ => ParseKind::Call,
        };
        Ok(ParseNode::new(kind, Some(name), args))
    }

    /// Parses `CAST(e AS type)`.
    fn parse_cast(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.advance();
        self.expect(&TokenKind::LeftParen)?;
        let expr = self.parse_expression(0)?;
        self.expect(&TokenKind::As)?;
        let ty = self.parse_type()?;
        self.expect(&TokenKind::RightParen)?;
        Ok(ParseNode::new(ParseKind::Cast, Some(token), vec![expr, ty]))
    }

    /// Parses `SUBSTRING(s FROM a [FOR b])` or `SUBSTRING(s, a [, b])`.
    fn parse_substring(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.advance();
        self.expect(&TokenKind::LeftParen)?;
        let mut args = vec![self.parse_expression(0)?];
        if self.check_keyword(Keyword::From) {
            self.advance();
            args.push(self.parse_expression(0)?);
            if self.check(&TokenKind::For) {
                self.advance();
                args.push(self.parse_expression(0)?);
            }
        } else if self.check(&TokenKind::Comma) {
            self.advance();
            args.push(self.parse_expression(0)?);
            if self.check(&TokenKind::Comma) {
                self.advance();
                args.push(self.parse_expression(0)?);
            }
        } else {
            return Err(ParseError::unexpected("FROM or ','", self.current()));
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(ParseNode::new(ParseKind::Call, Some(token), args))
    }

    /// Parses `TRIM([[BOTH|LEADING|TRAILING] [chars] FROM] s)`.
    ///
    /// The trim specification becomes a symbol literal argument.
    fn parse_trim(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.advance();
        self.expect(&TokenKind::LeftParen)?;
        let mut args = Vec::new();

        let spec = match self.current().as_keyword() {
            Some(kw @ (Keyword::Both | Keyword::Leading | Keyword::Trailing)) => {
                let spec_token = self.advance();
                Some(ParseNode::symbol_atom(kw.as_str(), spec_token.span))
            }
            _ => None,
        };

        if let Some(spec) = spec {
            args.push(spec);
            if self.check_keyword(Keyword::From) {
                self.advance();
            } else {
                args.push(self.parse_expression(0)?);
                self.expect_keyword(Keyword::From)?;
            }
            args.push(self.parse_expression(0)?);
        } else {
            args.push(self.parse_expression(0)?);
            if self.check_keyword(Keyword::From) {
                self.advance();
                args.push(self.parse_expression(0)?);
            }
        }

        self.expect(&TokenKind::RightParen)?;
        Ok(ParseNode::new(ParseKind::Call, Some(token), args))
    }

    /// Parses `EXTRACT(part FROM e)`.
    fn parse_extract(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.advance();
        self.expect(&TokenKind::LeftParen)?;
        let part = self.current().clone();
        let key = part.key().filter(|k| DATE_PARTS.contains(&k.as_str()));
        let Some(key) = key.filter(|_| part.kind == TokenKind::Identifier) else {
            return Err(ParseError::unexpected("date part", &part));
        };
        self.advance();
        self.expect_keyword(Keyword::From)?;
        let expr = self.parse_expression(0)?;
        self.expect(&TokenKind::RightParen)?;
        Ok(ParseNode::new(
            ParseKind::Call,
            Some(token),
            vec![ParseNode::symbol_atom(&key, part.span), expr],
        ))
    }

    /// Parses a simple or searched `CASE` expression.
    fn parse_case(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.advance();
        let mut children = Vec::new();
        let simple = !self.check_keyword(Keyword::When);
        if simple {
            children.push(self.parse_expression(0)?);
        }

        if !self.check_keyword(Keyword::When) {
            return Err(ParseError::unexpected("WHEN", self.current()));
        }
        while self.check_keyword(Keyword::When) {
            let when = self.advance();
            let cond = self.parse_expression(0)?;
            self.expect_keyword(Keyword::Then)?;
            let result = self.parse_expression(0)?;
            children.push(ParseNode::new(ParseKind::When, Some(when), vec![cond, result]));
        }

        if self.check_keyword(Keyword::Else) {
            let else_token = self.advance();
            let default = self.parse_expression(0)?;
            children.push(ParseNode::new(ParseKind::Else, Some(else_token), vec![default]));
        }
        self.expect_keyword(Keyword::End)?;

        let kind = if simple {
            ParseKind::SimpleCase
        } else {
            ParseKind::SearchedCase
        };
        Ok(ParseNode::new(kind, Some(token), children))
    }

    /// Parses `{ key: value, ... }`.
    fn parse_struct(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.advance();
        let mut members = Vec::new();
        if self.check(&TokenKind::RightCurly) {
            self.advance();
            return Ok(ParseNode::new(ParseKind::Struct, Some(token), members));
        }
        loop {
            let key = self.parse_expression(0)?;
            let colon = self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression(0)?;
            members.push(ParseNode::new(ParseKind::Member, Some(colon), vec![key, value]));
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            self.expect(&TokenKind::RightCurly)?;
            break;
        }
        Ok(ParseNode::new(ParseKind::Struct, Some(token), members))
    }

    /// Parses a data type name with optional integer arguments.
    fn parse_type(&mut self) -> Result<ParseNode, ParseError> {
        let token = self.current().clone();
        let name = match token.kind {
            TokenKind::Identifier => token.key(),
            TokenKind::Null => Some("null".to_string()),
            TokenKind::Missing => Some("missing".to_string()),
            _ => None,
        };
        let Some(sql_type) = name.as_deref().and_then(SqlDataType::from_name) else {
            return Err(ParseError::unexpected("type name", &token));
        };
        self.advance();

        let mut args = Vec::new();
        if self.check(&TokenKind::LeftParen) {
            self.advance();
            loop {
                let arg = self.current().clone();
                let valid = arg.kind == TokenKind::Literal
                    && arg
                        .value
                        .as_ref()
                        .and_then(Value::as_i64)
                        .is_some_and(|n| u32::try_from(n).is_ok());
                if !valid {
                    return Err(ParseError::new(
                        ErrorCode::InvalidTypeParameter,
                        format!("{sql_type} arguments must be non-negative integers"),
                        arg.span,
                    ));
                }
                self.advance();
                args.push(ParseNode::leaf(ParseKind::Atom, arg));
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
            self.expect(&TokenKind::RightParen)?;
        }

        if !sql_type.accepts_args(args.len()) {
            return Err(ParseError::new(
                ErrorCode::ArityMismatch,
                format!("{sql_type} does not accept {} arguments", args.len()),
                token.span,
            ));
        }
        let canonical = Token::new(
            TokenKind::Identifier,
            Some(Value::symbol(sql_type.name())),
            token.span,
        );
        Ok(ParseNode::new(ParseKind::Type, Some(canonical), args))
    }

    // --- Helper methods ---

    fn peek(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)]
    }

    fn current(&self) -> &Token {
        self.peek(0)
    }

    /// Advances to the next token, returning the one consumed.
    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    /// Checks if the current token is of the given kind.
    fn check(&self, kind: &TokenKind) -> bool {
        self.current().kind == *kind
    }

    /// Checks if the current token is the given keyword.
    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.check(&TokenKind::Keyword(keyword))
    }

    /// Expects the current token to be the given kind.
    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected(kind.describe(), self.current()))
        }
    }

    /// Expects the current token to be the given keyword.
    fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, ParseError> {
        self.expect(&TokenKind::Keyword(keyword))
    }

    /// Expects and returns an identifier or quoted identifier.
    fn expect_name(&mut self) -> Result<Token, ParseError> {
        match self.current().kind {
            TokenKind::Identifier | TokenKind::QuotedIdentifier => Ok(self.advance()),
            _ => Err(ParseError::unexpected("identifier", self.current())),
        }
    }
}

const fn is_join_keyword(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::Join
            | Keyword::InnerJoin
            | Keyword::CrossJoin
            | Keyword::LeftJoin
            | Keyword::LeftCrossJoin
            | Keyword::RightJoin
            | Keyword::RightCrossJoin
            | Keyword::OuterJoin
            | Keyword::OuterCrossJoin
    )
}

const fn opens_bracket(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::LeftParen
            | TokenKind::LeftBracket
            | TokenKind::LeftCurly
            | TokenKind::LeftDoubleAngle
    )
}

const fn closes_bracket(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::RightParen
            | TokenKind::RightBracket
            | TokenKind::RightCurly
            | TokenKind::RightDoubleAngle
    )
}

/// Folds a sign into a numeric literal operand; otherwise builds a unary
/// node.
fn fold_sign(op: Token, operand: ParseNode) -> ParseNode {
    let negate = op.kind == TokenKind::Operator(Operator::Minus);
    if operand.kind == ParseKind::Atom {
        if let Some(literal) = operand
            .token
            .as_ref()
            .filter(|t| t.kind == TokenKind::Literal)
        {
            let folded = match &literal.value {
                Some(v) if v.is_numeric() && negate => v.negate(),
                Some(v) if v.is_numeric() => Some(v.clone()),
                _ => None,
            };
            if let Some(value) = folded {
                let span = op.span.cover(literal.span);
                return ParseNode::leaf(
                    ParseKind::Atom,
                    Token::new(TokenKind::Literal, Some(value), span),
                );
            }
        }
    }
    ParseNode::new(ParseKind::Unary, Some(op), vec![operand])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(sql: &str) -> ParseNode {
        Parser::new(sql).parse_tree().unwrap()
    }

    fn parse_error(sql: &str) -> ParseError {
        match Parser::new(sql).parse_tree() {
            Err(crate::Error::Parse(e)) => e,
            other => panic!("expected parse error for {sql}, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence_builds_nested_binary() {
        let node = tree("1 + 2 * 3");
        assert_eq!(node.kind, ParseKind::Binary);
        assert_eq!(node.token.unwrap().kind, TokenKind::Operator(Operator::Plus));
        assert_eq!(node.children[1].kind, ParseKind::Binary);
        assert_eq!(node.children[1].token.as_ref().unwrap().kind, TokenKind::Star);
    }

    #[test]
    fn test_left_associativity() {
        let node = tree("10 - 3 - 2");
        assert_eq!(node.children[0].kind, ParseKind::Binary);
        assert_eq!(node.children[1].kind, ParseKind::Atom);
    }

    #[test]
    fn test_between_binds_its_and() {
        let node = tree("x BETWEEN 1 AND 2 AND y");
        assert_eq!(node.token.unwrap().kind, TokenKind::Operator(Operator::And));
        assert_eq!(node.children[0].kind, ParseKind::Ternary);
        assert_eq!(node.children[0].children.len(), 3);
    }

    #[test]
    fn test_negative_literal_is_folded() {
        let node = tree("-5");
        assert_eq!(node.kind, ParseKind::Atom);
        assert_eq!(node.token.unwrap().value, Some(Value::int(-5)));
        assert_eq!(tree("-x").kind, ParseKind::Unary);
    }

    #[test]
    fn test_prefix_operators_bind_by_precedence() {
        // NOT sits below comparison, so it takes the whole `a = b`.
        let node = tree("NOT a = b");
        assert_eq!(node.kind, ParseKind::Unary);
        assert_eq!(node.children[0].kind, ParseKind::Binary);

        // Unary minus binds tighter than `*`.
        let node = tree("-x * y");
        assert_eq!(node.kind, ParseKind::Binary);
        assert_eq!(node.token.unwrap().kind, TokenKind::Star);
        assert_eq!(node.children[0].kind, ParseKind::Unary);

        assert_eq!(tree("@x").kind, ParseKind::LocalsFirst);
    }

    #[test]
    fn test_parameters_are_numbered() {
        let node = tree("? + ?");
        let numbers: Vec<_> = node
            .children
            .iter()
            .map(|c| c.token.as_ref().and_then(|t| t.value.clone()))
            .collect();
        assert_eq!(numbers, vec![Some(Value::int(1)), Some(Value::int(2))]);
    }

    #[test]
    fn test_select_clause_order() {
        let node = tree("SELECT a FROM t WHERE b GROUP BY c HAVING d LIMIT 1");
        let kinds: Vec<_> = node.children.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParseKind::SelectList,
                ParseKind::From,
                ParseKind::Where,
                ParseKind::Group,
                ParseKind::Having,
                ParseKind::Limit,
            ]
        );
    }

    #[test]
    fn test_trailing_unpivot_becomes_project_all() {
        let node = tree("SELECT t.a.* FROM t");
        let item = &node.children[0].children[0];
        assert_eq!(item.kind, ParseKind::ProjectAll);
        assert_eq!(item.children[0].kind, ParseKind::Path);
        assert_eq!(item.children[0].children.len(), 2);
    }

    #[test]
    fn test_missing_from() {
        let err = parse_error("SELECT a");
        assert_eq!(err.code, ErrorCode::MissingClause);
    }

    #[test]
    fn test_nesting_limit() {
        let sql = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        let err = match Parser::with_options(&sql, ParseOptions { max_depth: 10 }).parse_tree() {
            Err(crate::Error::Parse(e)) => e,
            other => panic!("expected nesting error, got {other:?}"),
        };
        assert_eq!(err.code, ErrorCode::NestingTooDeep);
        assert!(Parser::with_options(&sql, ParseOptions { max_depth: 60 })
            .parse_tree()
            .is_ok());
    }

    #[test]
    fn test_parenthesized_join_group() {
        let node = tree("SELECT * FROM (a CROSS JOIN b), c");
        let from = &node.children[1];
        assert_eq!(from.children[0].kind, ParseKind::InnerJoin);
        assert_eq!(from.children[0].children[0].kind, ParseKind::InnerJoin);
    }

    #[test]
    fn test_redundant_parentheses_around_join_group() {
        let node = tree("SELECT * FROM ((a JOIN b ON true))");
        assert_eq!(node.children[1].children[0].kind, ParseKind::InnerJoin);

        let node = tree("SELECT * FROM (a), (SELECT x, y FROM t)");
        let join = &node.children[1].children[0];
        assert_eq!(join.kind, ParseKind::InnerJoin);
        assert_eq!(join.children[1].kind, ParseKind::Select);
    }

    #[test]
    fn test_from_source_nesting_limit() {
        let sql = format!("SELECT * FROM {}a{}", "(".repeat(300), ")".repeat(300));
        assert_eq!(parse_error(&sql).code, ErrorCode::NestingTooDeep);

        let sql = format!("SELECT * FROM {}a, b{}", "(".repeat(210), ")".repeat(210));
        assert_eq!(parse_error(&sql).code, ErrorCode::NestingTooDeep);

        let sql = format!("SELECT * FROM {}a{}", "(".repeat(20), ")".repeat(20));
        assert!(Parser::new(&sql).parse_tree().is_ok());
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse_error("1 2");
        assert_eq!(err.code, ErrorCode::UnexpectedToken);
        assert!(Parser::new("1;").parse_tree().is_ok());
    }
}
