//! SQL subset → `LogicalPlan`.
//!
//! ```text
//! SELECT select_list FROM view
//!   [WHERE expr] [GROUP BY col, ...] [ORDER BY col [ASC|DESC], ...] [LIMIT n] [;]
//! ```
//!
//! Keywords are case-insensitive. Identifiers are bare, `` `quoted` `` or
//! `"quoted"`; string literals use single quotes with `''` as the escape.
//! Error positions are byte offsets into the query text.

use tabkit_core::dag::{AggExpr, Aggregation, LogicalPlan, ProjectItem, SortKey};
use tabkit_core::expr::{col, CompareOp, Expr};
use tabkit_core::types::Scalar;

use crate::error::{Error, Result};

const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "GROUP", "BY", "ORDER", "ASC", "DESC", "LIMIT", "AS", "AND", "OR",
    "NOT", "TRUE", "FALSE", "NULL", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "CROSS", "ON",
];

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    /// Bare word; may be a keyword.
    Word(String),
    /// Backtick or double-quoted identifier; never a keyword.
    Quoted(String),
    Str(String),
    Int(i64),
    Float(f64),
    Op(CompareOp),
    Comma,
    LParen,
    RParen,
    Star,
    Minus,
    Semi,
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    pos: usize,
}

fn parse_err(pos: usize, msg: impl Into<String>) -> Error {
    Error::Parse {
        pos,
        msg: msg.into(),
    }
}

fn tokenize(src: &str) -> Result<Vec<Token>> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let tok = match c {
            b',' => {
                i += 1;
                Tok::Comma
            }
            b'(' => {
                i += 1;
                Tok::LParen
            }
            b')' => {
                i += 1;
                Tok::RParen
            }
            b'*' => {
                i += 1;
                Tok::Star
            }
            b'-' => {
                i += 1;
                Tok::Minus
            }
            b';' => {
                i += 1;
                Tok::Semi
            }
            b'=' => {
                i += if bytes.get(i + 1) == Some(&b'=') { 2 } else { 1 };
                Tok::Op(CompareOp::Eq)
            }
            b'!' if bytes.get(i + 1) == Some(&b'=') => {
                i += 2;
                Tok::Op(CompareOp::NotEq)
            }
            b'<' => match bytes.get(i + 1) {
                Some(b'=') => {
                    i += 2;
                    Tok::Op(CompareOp::LtEq)
                }
                Some(b'>') => {
                    i += 2;
                    Tok::Op(CompareOp::NotEq)
                }
                _ => {
                    i += 1;
                    Tok::Op(CompareOp::Lt)
                }
            },
            b'>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    Tok::Op(CompareOp::GtEq)
                } else {
                    i += 1;
                    Tok::Op(CompareOp::Gt)
                }
            }
            b'\'' => {
                let (s, next) = quoted(src, i, b'\'', true)?;
                i = next;
                Tok::Str(s)
            }
            b'`' | b'"' => {
                let (s, next) = quoted(src, i, c, false)?;
                if s.is_empty() {
                    return Err(parse_err(start, "empty quoted identifier"));
                }
                i = next;
                Tok::Quoted(s)
            }
            b'0'..=b'9' => {
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let is_float = bytes.get(i) == Some(&b'.')
                    && bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
                if is_float {
                    i += 1;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                    let text = &src[start..i];
                    Tok::Float(
                        text.parse()
                            .map_err(|_| parse_err(start, format!("bad number '{text}'")))?,
                    )
                } else {
                    let text = &src[start..i];
                    Tok::Int(
                        text.parse()
                            .map_err(|_| parse_err(start, format!("integer out of range '{text}'")))?,
                    )
                }
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                Tok::Word(src[start..i].to_string())
            }
            _ => {
                let ch = src[start..].chars().next().unwrap_or('?');
                return Err(parse_err(start, format!("unexpected character '{ch}'")));
            }
        };
        out.push(Token { tok, pos: start });
    }
    out.push(Token {
        tok: Tok::Eof,
        pos: src.len(),
    });
    Ok(out)
}

/// Read a quoted run starting at the opening quote. A doubled quote inside
/// is a literal quote. Returns the content and the index after the close.
fn quoted(src: &str, open: usize, quote: u8, is_string: bool) -> Result<(String, usize)> {
    let bytes = src.as_bytes();
    let mut out = String::new();
    let mut i = open + 1;
    let mut run = i;
    while i < bytes.len() {
        if bytes[i] == quote {
            out.push_str(&src[run..i]);
            if bytes.get(i + 1) == Some(&quote) {
                out.push(quote as char);
                i += 2;
                run = i;
                continue;
            }
            return Ok((out, i + 1));
        }
        i += 1;
    }
    let what = if is_string { "string literal" } else { "quoted identifier" };
    Err(parse_err(open, format!("unterminated {what}")))
}

enum SelectItem {
    Column { name: String, alias: Option<String> },
    Agg(AggExpr),
}

struct Parser {
    tokens: Vec<Token>,
    idx: usize,
}

impl Parser {
    fn new(src: &str) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(src)?,
            idx: 0,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.idx.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Tok {
        let i = (self.idx + offset).min(self.tokens.len() - 1);
        &self.tokens[i].tok
    }

    fn bump(&mut self) -> Token {
        let t = self.peek().clone();
        if self.idx < self.tokens.len() - 1 {
            self.idx += 1;
        }
        t
    }

    fn error(&self, msg: impl Into<String>) -> Error {
        parse_err(self.peek().pos, msg)
    }

    fn describe(&self) -> String {
        match &self.peek().tok {
            Tok::Word(w) => format!("'{w}'"),
            Tok::Quoted(q) => format!("identifier `{q}`"),
            Tok::Str(s) => format!("string '{s}'"),
            Tok::Int(i) => i.to_string(),
            Tok::Float(f) => f.to_string(),
            Tok::Op(op) => format!("'{}'", op.symbol()),
            Tok::Comma => "','".into(),
            Tok::LParen => "'('".into(),
            Tok::RParen => "')'".into(),
            Tok::Star => "'*'".into(),
            Tok::Minus => "'-'".into(),
            Tok::Semi => "';'".into(),
            Tok::Eof => "end of input".into(),
        }
    }

    fn at_keyword(&self, kw: &str) -> bool {
        matches!(&self.peek().tok, Tok::Word(w) if w.eq_ignore_ascii_case(kw))
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.at_keyword(kw) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.error(format!("expected {kw}, found {}", self.describe())))
        }
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if &self.peek().tok == tok {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Tok, what: &str) -> Result<()> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}, found {}", self.describe())))
        }
    }

    fn ident(&mut self, what: &str) -> Result<String> {
        match &self.peek().tok {
            Tok::Quoted(q) => {
                let q = q.clone();
                self.bump();
                Ok(q)
            }
            Tok::Word(w) if !is_keyword(w) => {
                let w = w.clone();
                self.bump();
                Ok(w)
            }
            _ => Err(self.error(format!("expected {what}, found {}", self.describe()))),
        }
    }

    fn end(&mut self) -> Result<()> {
        self.eat(&Tok::Semi);
        if self.peek().tok == Tok::Eof {
            Ok(())
        } else {
            Err(self.error(format!("unexpected {}", self.describe())))
        }
    }

    fn select_list(&mut self) -> Result<Option<Vec<SelectItem>>> {
        if self.eat(&Tok::Star) {
            return Ok(None);
        }
        let mut items = vec![self.select_item()?];
        while self.eat(&Tok::Comma) {
            items.push(self.select_item()?);
        }
        Ok(Some(items))
    }

    fn select_item(&mut self) -> Result<SelectItem> {
        let func = match &self.peek().tok {
            Tok::Word(w) if *self.peek_at(1) == Tok::LParen => Some(w.to_ascii_uppercase()),
            _ => None,
        };
        let item = match func {
            Some(func) => {
                let pos = self.peek().pos;
                self.bump();
                self.bump();
                let agg = match func.as_str() {
                    "COUNT" if self.eat(&Tok::Star) => Aggregation::Count,
                    "COUNT" => Aggregation::CountColumn(self.ident("column")?),
                    "SUM" => Aggregation::Sum(self.ident("column")?),
                    "AVG" => Aggregation::Avg(self.ident("column")?),
                    "MIN" => Aggregation::Min(self.ident("column")?),
                    "MAX" => Aggregation::Max(self.ident("column")?),
                    other => {
                        return Err(parse_err(pos, format!("unknown function '{other}'")));
                    }
                };
                self.expect(&Tok::RParen, "')'")?;
                SelectItem::Agg(AggExpr::new(agg))
            }
            None => SelectItem::Column {
                name: self.ident("column")?,
                alias: None,
            },
        };
        if !self.eat_keyword("AS") {
            return Ok(item);
        }
        let alias = self.ident("alias")?;
        Ok(match item {
            SelectItem::Column { name, .. } => SelectItem::Column {
                name,
                alias: Some(alias),
            },
            SelectItem::Agg(agg) => SelectItem::Agg(agg.alias(alias)),
        })
    }

    fn from_view(&mut self) -> Result<String> {
        let view = self.ident("view name")?;
        let is_join = matches!(self.peek().tok, Tok::Comma)
            || ["JOIN", "INNER", "LEFT", "RIGHT", "FULL", "CROSS"]
                .iter()
                .any(|kw| self.at_keyword(kw));
        if is_join {
            return Err(self.error("joins are not supported; query a single view"));
        }
        Ok(view)
    }

    fn column_list(&mut self) -> Result<Vec<String>> {
        let mut cols = vec![self.ident("column")?];
        while self.eat(&Tok::Comma) {
            cols.push(self.ident("column")?);
        }
        Ok(cols)
    }

    fn sort_keys(&mut self) -> Result<Vec<SortKey>> {
        let mut keys = Vec::new();
        loop {
            let column = self.order_target()?;
            let key = if self.eat_keyword("DESC") {
                SortKey::desc(column)
            } else {
                self.eat_keyword("ASC");
                SortKey::asc(column)
            };
            keys.push(key);
            if !self.eat(&Tok::Comma) {
                return Ok(keys);
            }
        }
    }

    /// ORDER BY accepts an output column name or an aggregate call, which
    /// names the aggregate's default output column.
    fn order_target(&mut self) -> Result<String> {
        if matches!(self.peek().tok, Tok::Word(_)) && *self.peek_at(1) == Tok::LParen {
            return match self.select_item()? {
                SelectItem::Agg(agg) => Ok(agg.output_name()),
                SelectItem::Column { name, .. } => Ok(name),
            };
        }
        self.ident("column")
    }

    fn limit(&mut self) -> Result<usize> {
        match self.peek().tok.clone() {
            Tok::Int(n) if n >= 0 => {
                self.bump();
                usize::try_from(n).map_err(|_| self.error("limit out of range"))
            }
            _ => Err(self.error(format!(
                "expected non-negative integer, found {}",
                self.describe()
            ))),
        }
    }

    fn expr(&mut self) -> Result<Expr> {
        let mut left = self.conjunction()?;
        while self.eat_keyword("OR") {
            left = left.or(self.conjunction()?);
        }
        Ok(left)
    }

    fn conjunction(&mut self) -> Result<Expr> {
        let mut left = self.negation()?;
        while self.eat_keyword("AND") {
            left = left.and(self.negation()?);
        }
        Ok(left)
    }

    fn negation(&mut self) -> Result<Expr> {
        if self.eat_keyword("NOT") {
            return Ok(self.negation()?.not());
        }
        if self.eat(&Tok::LParen) {
            let inner = self.expr()?;
            self.expect(&Tok::RParen, "')'")?;
            return Ok(inner);
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let left = self.operand()?;
        let Tok::Op(op) = self.peek().tok.clone() else {
            return Ok(left);
        };
        self.bump();
        let right = self.operand()?;
        Ok(Expr::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn operand(&mut self) -> Result<Expr> {
        let token = self.peek().clone();
        let expr = match token.tok {
            Tok::Str(s) => Expr::Literal(Scalar::Str(s)),
            Tok::Int(i) => Expr::Literal(Scalar::Int(i)),
            Tok::Float(f) => Expr::Literal(Scalar::Float(f)),
            Tok::Minus => {
                self.bump();
                return match self.peek().tok.clone() {
                    Tok::Int(i) => {
                        self.bump();
                        Ok(Expr::Literal(Scalar::Int(-i)))
                    }
                    Tok::Float(f) => {
                        self.bump();
                        Ok(Expr::Literal(Scalar::Float(-f)))
                    }
                    _ => Err(self.error("expected number after '-'")),
                };
            }
            Tok::Quoted(name) => col(name),
            Tok::Word(w) if w.eq_ignore_ascii_case("TRUE") => Expr::Literal(Scalar::Bool(true)),
            Tok::Word(w) if w.eq_ignore_ascii_case("FALSE") => Expr::Literal(Scalar::Bool(false)),
            Tok::Word(w) if w.eq_ignore_ascii_case("NULL") => Expr::Literal(Scalar::Null),
            Tok::Word(w) if !is_keyword(&w) => col(w),
            _ => {
                return Err(self.error(format!("expected operand, found {}", self.describe())));
            }
        };
        self.bump();
        Ok(expr)
    }
}

fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|kw| kw.eq_ignore_ascii_case(word))
}

/// Parse a standalone predicate such as `income = '>50K' AND age > 30`.
pub fn parse_expr(src: &str) -> Result<Expr> {
    let mut p = Parser::new(src)?;
    let e = p.expr()?;
    p.end()?;
    Ok(e)
}

/// Parse a query into a linear logical plan:
/// `Scan → [Filter] → [Aggregate] → [Project] → [Sort] → [Limit]`.
pub fn parse_sql(src: &str) -> Result<LogicalPlan> {
    let mut p = Parser::new(src)?;
    p.expect_keyword("SELECT")?;
    let select_pos = p.peek().pos;
    let items = p.select_list()?;
    p.expect_keyword("FROM")?;
    let view = p.from_view()?;

    let predicate = if p.eat_keyword("WHERE") {
        Some(p.expr()?)
    } else {
        None
    };
    let group_by = if p.eat_keyword("GROUP") {
        p.expect_keyword("BY")?;
        p.column_list()?
    } else {
        Vec::new()
    };
    let order_by = if p.eat_keyword("ORDER") {
        p.expect_keyword("BY")?;
        p.sort_keys()?
    } else {
        Vec::new()
    };
    let limit = if p.eat_keyword("LIMIT") {
        Some(p.limit()?)
    } else {
        None
    };
    p.end()?;

    let mut plan = LogicalPlan::Scan { view };
    if let Some(predicate) = predicate {
        plan = LogicalPlan::Filter {
            input: Box::new(plan),
            predicate,
        };
    }

    let has_aggs = items
        .as_ref()
        .is_some_and(|items| items.iter().any(|i| matches!(i, SelectItem::Agg(_))));
    match items {
        None if !group_by.is_empty() => {
            return Err(Error::Unsupported(
                "SELECT * cannot be combined with GROUP BY".into(),
            ));
        }
        None => {}
        Some(items) if has_aggs || !group_by.is_empty() => {
            plan = aggregate_plan(plan, items, group_by)?;
        }
        Some(items) => {
            let project = items
                .into_iter()
                .map(|item| match item {
                    SelectItem::Column { name, alias } => Ok(ProjectItem {
                        column: name,
                        alias,
                    }),
                    SelectItem::Agg(_) => Err(parse_err(select_pos, "unexpected aggregate")),
                })
                .collect::<Result<Vec<_>>>()?;
            plan = LogicalPlan::Project {
                input: Box::new(plan),
                items: project,
            };
        }
    }

    if !order_by.is_empty() {
        plan = LogicalPlan::Sort {
            input: Box::new(plan),
            keys: order_by,
        };
    }
    if let Some(n) = limit {
        plan = LogicalPlan::Limit {
            input: Box::new(plan),
            n,
        };
    }
    Ok(plan)
}

fn aggregate_plan(
    input: LogicalPlan,
    items: Vec<SelectItem>,
    group_by: Vec<String>,
) -> Result<LogicalPlan> {
    let mut aggs = Vec::new();
    let mut project = Vec::with_capacity(items.len());
    for item in items {
        match item {
            SelectItem::Column { name, alias } => {
                if !group_by.contains(&name) {
                    return Err(Error::Unsupported(format!(
                        "column '{name}' must appear in GROUP BY or inside an aggregate"
                    )));
                }
                project.push(ProjectItem {
                    column: name,
                    alias,
                });
            }
            SelectItem::Agg(agg) => {
                project.push(ProjectItem::new(agg.output_name()));
                aggs.push(agg);
            }
        }
    }

    // Skip the projection when the select list is exactly the aggregate's
    // natural output (group columns, then aggregates).
    let natural: Vec<String> = group_by
        .iter()
        .cloned()
        .chain(aggs.iter().map(AggExpr::output_name))
        .collect();
    let is_natural = project.len() == natural.len()
        && project
            .iter()
            .zip(&natural)
            .all(|(p, n)| p.alias.is_none() && &p.column == n);

    let plan = LogicalPlan::Aggregate {
        input: Box::new(input),
        group_by,
        aggs,
    };
    Ok(if is_natural {
        plan
    } else {
        LogicalPlan::Project {
            input: Box::new(plan),
            items: project,
        }
    })
}
