//! Recursive-descent parser for the component subset
//!
//! Statements outside the subset (`if`, `interface`, `class`, ...) are
//! skipped with bracket balancing. Expressions outside the subset become
//! [`Expr::Opaque`] with their source text, so only genuinely broken input
//! (unbalanced JSX, unterminated strings, stray closers) is a syntax error.

use std::sync::Arc;

use super::ast::*;

/// A syntax error with its 1-based line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Words that begin a new statement when seen after a line break
const STATEMENT_WORDS: &[&str] = &[
    "const",
    "let",
    "var",
    "function",
    "return",
    "throw",
    "render",
    "export",
    "import",
    "if",
    "for",
    "while",
    "switch",
    "try",
    "class",
    "interface",
    "type",
    "async",
    "useEffect",
];

/// Statements parsed only far enough to skip them
const SKIPPED_WORDS: &[&str] = &[
    "if",
    "for",
    "while",
    "do",
    "switch",
    "try",
    "class",
    "interface",
    "type",
    "enum",
    "import",
    "export",
    "void",
    "declare",
    "namespace",
    "abstract",
    "break",
    "continue",
    "debugger",
];

/// Brackets, JSX elements, blocks and templates open inside each other
/// before the parser gives up
const MAX_NESTING: usize = 128;

/// Words after a primary expression that continue it as an operator
const OPERATOR_WORDS: &[&str] = &["instanceof", "in", "as", "satisfies"];

/// Parse a script into a [`Program`]
pub fn parse(source: &str) -> ParseResult<Program> {
    let mut parser = Parser::new(source);
    let mut body = Vec::new();
    loop {
        parser.skip_trivia()?;
        if parser.eof() {
            break;
        }
        if parser.peek() == Some('}') {
            return Err(parser.error("Unexpected token '}'"));
        }
        if let Some(stmt) = parser.parse_statement()? {
            body.push(stmt);
        }
    }
    Ok(Program { body })
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    nesting: usize,
    /// Function bodies the cursor is inside of
    functions: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            nesting: 0,
            functions: 0,
        }
    }

    /// Run `f` one nesting level deeper
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error("Maximum nesting depth exceeded"));
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    // ------------------------------------------------------------------
    // Cursor primitives
    // ------------------------------------------------------------------

    fn eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        let mut i = self.pos;
        for c in s.chars() {
            if self.chars.get(i) != Some(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.chars().count();
            true
        } else {
            false
        }
    }

    fn line_at(&self, pos: usize) -> usize {
        self.chars[..pos.min(self.chars.len())]
            .iter()
            .filter(|c| **c == '\n')
            .count()
            + 1
    }

    fn line(&self) -> usize {
        self.line_at(self.pos)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            line: self.line(),
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(c) => self.error(format!("Unexpected token '{}'", c)),
            None => self.error("Unexpected end of input"),
        }
    }

    fn expect(&mut self, c: char) -> ParseResult<()> {
        self.skip_trivia()?;
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Skip whitespace and comments; returns whether a line break was crossed
    fn skip_trivia(&mut self) -> ParseResult<bool> {
        let mut newline = false;
        loop {
            match self.peek() {
                Some('\n') => {
                    newline = true;
                    self.pos += 1;
                }
                Some(c) if c.is_whitespace() => self.pos += 1,
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        if self.eof() {
                            self.pos = start;
                            return Err(self.error("Unterminated comment"));
                        }
                        if self.eat_str("*/") {
                            break;
                        }
                        if self.bump() == Some('\n') {
                            newline = true;
                        }
                    }
                }
                _ => return Ok(newline),
            }
        }
    }

    fn is_ident_start(c: char) -> bool {
        c.is_alphabetic() || c == '_' || c == '$'
    }

    fn is_ident_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_' || c == '$'
    }

    fn peek_word(&self) -> Option<String> {
        let first = self.peek()?;
        if !Self::is_ident_start(first) {
            return None;
        }
        let mut end = self.pos;
        while self.chars.get(end).is_some_and(|c| Self::is_ident_char(*c)) {
            end += 1;
        }
        Some(self.chars[self.pos..end].iter().collect())
    }

    fn ident(&mut self) -> Option<String> {
        let word = self.peek_word()?;
        self.pos += word.chars().count();
        Some(word)
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        self.skip_trivia()?;
        self.ident().ok_or_else(|| self.unexpected())
    }

    fn at_statement_word(&self) -> bool {
        self.peek_word()
            .is_some_and(|w| STATEMENT_WORDS.contains(&w.as_str()))
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self) -> ParseResult<Option<Stmt>> {
        let line = self.line();
        let word = self.peek_word();

        match word.as_deref() {
            Some("const" | "let" | "var") => {
                self.ident();
                self.parse_declaration(line).map(Some)
            }
            Some("function") => self.parse_function_declaration(line).map(Some),
            Some("async") => {
                let save = self.pos;
                self.ident();
                self.skip_trivia()?;
                if self.peek_word().as_deref() == Some("function") {
                    self.parse_function_declaration(line).map(Some)
                } else {
                    self.pos = save;
                    self.parse_expression_statement(line).map(Some)
                }
            }
            Some("return") => {
                self.ident();
                let newline = self.skip_trivia()?;
                let value = if newline || self.eof() || matches!(self.peek(), Some(';' | '}')) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.finish_statement()?;
                Ok(Some(Stmt::Return { value, line }))
            }
            Some("throw") => {
                self.ident();
                let value = self.parse_expr()?;
                self.finish_statement()?;
                Ok(Some(Stmt::Throw { value, line }))
            }
            Some("if") if self.functions > 0 => self.nested(|p| p.parse_if(line)).map(Some),
            Some(w) if SKIPPED_WORDS.contains(&w) => {
                let start = self.pos;
                self.skip_statement()?;
                if self.functions > 0 && self.contains_return(start) {
                    return Ok(Some(Stmt::Unsupported {
                        keyword: w.to_string(),
                        line,
                    }));
                }
                Ok(None)
            }
            Some(_) => self.parse_expression_statement(line).map(Some),
            None => match self.peek() {
                Some(';') => {
                    self.pos += 1;
                    Ok(None)
                }
                Some('{') => {
                    self.skip_statement()?;
                    Ok(None)
                }
                _ => self.parse_expression_statement(line).map(Some),
            },
        }
    }

    /// `if (test) ... else ...`, with `else if` chains nesting in `otherwise`
    fn parse_if(&mut self, line: usize) -> ParseResult<Stmt> {
        self.ident();
        self.expect('(')?;
        let test = self.parse_expr()?;
        self.expect(')')?;
        let then = self.parse_branch()?;
        let save = self.pos;
        self.skip_trivia()?;
        let otherwise = if self.peek_word().as_deref() == Some("else") {
            self.ident();
            self.parse_branch()?
        } else {
            self.pos = save;
            Vec::new()
        };
        Ok(Stmt::If {
            test,
            then,
            otherwise,
            line,
        })
    }

    fn parse_branch(&mut self) -> ParseResult<Vec<Stmt>> {
        self.skip_trivia()?;
        if self.peek() == Some('{') {
            return self.parse_block();
        }
        Ok(self.parse_statement()?.into_iter().collect())
    }

    /// Whether the source from `start` to the cursor has a `return` keyword
    fn contains_return(&self, start: usize) -> bool {
        let span = &self.chars[start..self.pos];
        let word: Vec<char> = "return".chars().collect();
        span.windows(word.len()).enumerate().any(|(i, w)| {
            w == word.as_slice()
                && (i == 0 || !Self::is_ident_char(span[i - 1]))
                && span
                    .get(i + word.len())
                    .map_or(true, |c| !Self::is_ident_char(*c))
        })
    }

    fn parse_expression_statement(&mut self, line: usize) -> ParseResult<Stmt> {
        let expr = self.parse_expr()?;
        self.finish_statement()?;
        Ok(Stmt::Expr { expr, line })
    }

    fn finish_statement(&mut self) -> ParseResult<()> {
        let save = self.pos;
        self.skip_trivia()?;
        if !self.eat(';') {
            self.pos = save;
        }
        Ok(())
    }

    fn parse_declaration(&mut self, line: usize) -> ParseResult<Stmt> {
        let mut decls = Vec::new();
        loop {
            self.skip_trivia()?;
            let pattern = self.parse_pattern()?;
            self.skip_trivia()?;
            if self.eat('!') {
                self.skip_trivia()?;
            }
            if self.eat(':') {
                self.skip_type(&['=', ',', ';'], false)?;
            }
            self.skip_trivia()?;
            let init = if self.peek() == Some('=') && self.peek_at(1) != Some('=') {
                self.pos += 1;
                Some(self.parse_expr()?)
            } else {
                None
            };
            decls.push((pattern, init));

            let save = self.pos;
            self.skip_trivia()?;
            if !self.eat(',') {
                self.pos = save;
                break;
            }
        }
        self.finish_statement()?;
        Ok(Stmt::Declare { decls, line })
    }

    fn parse_function_declaration(&mut self, line: usize) -> ParseResult<Stmt> {
        self.ident();
        self.skip_trivia()?;
        self.eat('*');
        let name = self.expect_ident()?;
        let func = self.parse_function_rest()?;
        Ok(Stmt::Function {
            name,
            func: Arc::new(func),
            line,
        })
    }

    /// Parameters, optional return type and block body of a `function`
    fn parse_function_rest(&mut self) -> ParseResult<Function> {
        self.skip_trivia()?;
        if self.peek() == Some('<') {
            self.skip_angle_group()?;
        }
        self.expect('(')?;
        let params = self.parse_params()?;
        self.skip_trivia()?;
        if self.eat(':') {
            self.skip_type(&['{'], false)?;
        }
        let body = self.parse_function_block()?;
        Ok(Function {
            params,
            body: FunctionBody::Block(body),
        })
    }

    fn parse_function_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.functions += 1;
        let body = self.parse_block();
        self.functions -= 1;
        body
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect('{')?;
        let mut body = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat('}') {
                return Ok(body);
            }
            if self.eof() {
                return Err(self.error("Unexpected end of input"));
            }
            if let Some(stmt) = self.parse_statement()? {
                body.push(stmt);
            }
        }
    }

    /// Skip a statement outside the subset
    ///
    /// Ends after a `;` at depth zero, after a closing `}` that returns to
    /// depth zero (unless `else`/`catch`/... continues it), before a `}` that
    /// closes the enclosing block, or at a line break followed by a
    /// statement keyword.
    fn skip_statement(&mut self) -> ParseResult<()> {
        let mut depth: usize = 0;
        let mut started = false;
        loop {
            let newline = self.skip_trivia()?;
            let Some(c) = self.peek() else {
                if depth > 0 {
                    return Err(self.error("Unexpected end of input"));
                }
                return Ok(());
            };
            if started && depth == 0 && newline && self.at_statement_word() {
                return Ok(());
            }
            started = true;
            match c {
                '(' | '[' | '{' => {
                    depth += 1;
                    self.pos += 1;
                }
                ')' | ']' => {
                    if depth == 0 {
                        return Err(self.unexpected());
                    }
                    depth -= 1;
                    self.pos += 1;
                }
                '}' => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 {
                        let save = self.pos;
                        self.skip_trivia()?;
                        let continues = matches!(self.peek(), Some(')' | '.' | ',' | '='))
                            || matches!(
                                self.peek_word().as_deref(),
                                Some("else" | "catch" | "finally" | "while")
                            );
                        self.pos = save;
                        if !continues {
                            return Ok(());
                        }
                    }
                }
                ';' if depth == 0 => {
                    self.pos += 1;
                    return Ok(());
                }
                '\'' | '"' => self.skip_line_string(c),
                '`' => {
                    self.parse_template()?;
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Skip a quoted string if it closes on this line, else just the quote
    fn skip_line_string(&mut self, quote: char) {
        let mut j = self.pos + 1;
        while let Some(&c) = self.chars.get(j) {
            match c {
                '\\' => j += 2,
                '\n' => break,
                c if c == quote => {
                    self.pos = j + 1;
                    return;
                }
                _ => j += 1,
            }
        }
        self.pos += 1;
    }

    /// Skip a type annotation up to one of `stops` at depth zero
    ///
    /// `=>` belongs to function types unless `stop_at_arrow` is set, which is
    /// how an arrow function's return annotation ends.
    fn skip_type(&mut self, stops: &[char], stop_at_arrow: bool) -> ParseResult<()> {
        let mut depth: usize = 0;
        loop {
            self.skip_trivia()?;
            let Some(c) = self.peek() else {
                return Ok(());
            };
            if self.starts_with("=>") {
                if stop_at_arrow && depth == 0 {
                    return Ok(());
                }
                self.pos += 2;
                continue;
            }
            if depth == 0 && (stops.contains(&c) || matches!(c, ')' | ']' | '}')) {
                return Ok(());
            }
            match c {
                '(' | '[' | '{' | '<' => depth += 1,
                ')' | ']' | '}' | '>' => depth = depth.saturating_sub(1),
                '\'' | '"' => {
                    self.skip_line_string(c);
                    continue;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn skip_angle_group(&mut self) -> ParseResult<()> {
        let mut depth: usize = 0;
        loop {
            match self.bump() {
                Some('<') => depth += 1,
                Some('>') => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => {}
                None => return Err(self.error("Unexpected end of input")),
            }
        }
    }

    // ------------------------------------------------------------------
    // Patterns and parameters
    // ------------------------------------------------------------------

    fn parse_pattern(&mut self) -> ParseResult<Pattern> {
        self.skip_trivia()?;
        match self.peek() {
            Some('[') => {
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    self.skip_trivia()?;
                    if self.eat(']') {
                        break;
                    }
                    if self.eat(',') {
                        items.push(None);
                        continue;
                    }
                    self.eat_str("...");
                    let name = self.expect_ident()?;
                    self.skip_trivia()?;
                    if self.eat('=') {
                        self.parse_expr()?;
                        self.skip_trivia()?;
                    }
                    items.push(Some(name));
                    if !self.eat(',') {
                        self.expect(']')?;
                        break;
                    }
                }
                Ok(Pattern::Array(items))
            }
            Some('{') => {
                self.pos += 1;
                let mut props = Vec::new();
                let mut rest = None;
                loop {
                    self.skip_trivia()?;
                    if self.eat('}') {
                        break;
                    }
                    if self.eat_str("...") {
                        rest = Some(self.expect_ident()?);
                    } else {
                        let key = self.expect_ident()?;
                        self.skip_trivia()?;
                        let binding = if self.eat(':') {
                            self.expect_ident()?
                        } else {
                            key.clone()
                        };
                        self.skip_trivia()?;
                        let default = if self.eat('=') {
                            Some(self.parse_expr()?)
                        } else {
                            None
                        };
                        props.push(PropBinding {
                            key,
                            binding,
                            default,
                        });
                    }
                    self.skip_trivia()?;
                    if !self.eat(',') {
                        self.expect('}')?;
                        break;
                    }
                }
                Ok(Pattern::Object { props, rest })
            }
            _ => self
                .ident()
                .map(Pattern::Ident)
                .ok_or_else(|| self.error("Invalid destructuring assignment target")),
        }
    }

    /// Parameter list after the opening parenthesis, through the closing one
    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat(')') {
                return Ok(params);
            }
            self.eat_str("...");
            let pattern = self.parse_pattern()?;
            self.skip_trivia()?;
            self.eat('?');
            self.skip_trivia()?;
            if self.eat(':') {
                self.skip_type(&[',', '='], false)?;
            }
            self.skip_trivia()?;
            let default = if self.eat('=') {
                Some(self.parse_expr()?)
            } else {
                None
            };
            params.push(Param { pattern, default });
            self.skip_trivia()?;
            if !self.eat(',') {
                self.expect(')')?;
                return Ok(params);
            }
        }
    }

    /// Try `(params) =>` at the cursor; restores the cursor on failure
    fn try_arrow_params(&mut self) -> Option<Vec<Param>> {
        let save = self.pos;
        let attempt = (|| -> ParseResult<Option<Vec<Param>>> {
            self.pos += 1;
            let params = self.parse_params()?;
            self.skip_trivia()?;
            if self.peek() == Some(':') {
                self.pos += 1;
                self.skip_type(&[], true)?;
                self.skip_trivia()?;
            }
            Ok(self.eat_str("=>").then_some(params))
        })();
        match attempt {
            Ok(Some(params)) => Some(params),
            _ => {
                self.pos = save;
                None
            }
        }
    }

    fn parse_arrow_body(&mut self, params: Vec<Param>) -> ParseResult<Expr> {
        self.skip_trivia()?;
        let body = if self.peek() == Some('{') {
            FunctionBody::Block(self.parse_function_block()?)
        } else {
            FunctionBody::Expr(Box::new(self.parse_expr()?))
        };
        Ok(Expr::Arrow(Arc::new(Function { params, body })))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.skip_trivia()?;
        let start = self.pos;
        if !self.at_primary_start() {
            return self.parse_opaque(start);
        }
        let expr = self.parse_postfix()?;
        let save = self.pos;
        self.skip_trivia()?;
        if self.at_operator() {
            return self.parse_opaque(start);
        }
        self.pos = save;
        Ok(expr)
    }

    fn at_primary_start(&self) -> bool {
        match self.peek() {
            Some(c) if Self::is_ident_start(c) => true,
            Some(c) if c.is_ascii_digit() => true,
            Some('-') | Some('.') => self.peek_at(1).is_some_and(|c| c.is_ascii_digit()),
            Some('<' | '(' | '\'' | '"' | '`' | '{' | '[') => true,
            _ => false,
        }
    }

    fn at_operator(&self) -> bool {
        match self.peek() {
            Some('+' | '-' | '*' | '/' | '%' | '?' | '&' | '|' | '=' | '<' | '>' | '!' | '^'
            | '[') => !self.starts_with("=>"),
            _ => self
                .peek_word()
                .is_some_and(|w| OPERATOR_WORDS.contains(&w.as_str())),
        }
    }

    /// Capture source text from `start` up to the end of the expression
    fn parse_opaque(&mut self, start: usize) -> ParseResult<Expr> {
        self.pos = start;
        let mut depth: usize = 0;
        let mut prev: Option<char> = None;
        loop {
            let Some(c) = self.peek() else {
                if depth > 0 {
                    return Err(self.error("Unexpected end of input"));
                }
                break;
            };
            if depth == 0 && matches!(c, ',' | ';' | ')' | ']' | '}') {
                break;
            }
            match c {
                '(' | '[' | '{' => {
                    depth += 1;
                    self.pos += 1;
                }
                ')' | ']' | '}' => {
                    depth -= 1;
                    self.pos += 1;
                }
                '\'' | '"' => self.skip_line_string(c),
                '`' => {
                    self.parse_template()?;
                }
                '/' if matches!(self.peek_at(1), Some('/' | '*')) => {
                    self.skip_trivia()?;
                    continue;
                }
                '<' if Self::jsx_may_follow(prev)
                    && self
                        .peek_at(1)
                        .is_some_and(|n| n == '>' || Self::is_ident_start(n)) =>
                {
                    self.parse_jsx()?;
                }
                '\n' if depth == 0 => {
                    self.pos += 1;
                    let save = self.pos;
                    self.skip_trivia()?;
                    let stop = self.at_statement_word();
                    self.pos = save;
                    if stop {
                        break;
                    }
                    continue;
                }
                _ => self.pos += 1,
            }
            if !c.is_whitespace() {
                prev = Some(c);
            }
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(self.unexpected());
        }
        Ok(Expr::Opaque(raw.to_string()))
    }

    fn jsx_may_follow(prev: Option<char>) -> bool {
        matches!(
            prev,
            None | Some('(' | ',' | '=' | '?' | ':' | '&' | '|' | '{' | '[' | '>' | '!')
        )
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let save = self.pos;
            self.skip_trivia()?;
            if self.peek() == Some('.') && self.peek_at(1).is_some_and(Self::is_ident_start) {
                self.pos += 1;
                let property = self.expect_ident()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                };
            } else if self.starts_with("?.") && self.peek_at(2).is_some_and(Self::is_ident_start)
            {
                self.pos += 2;
                let property = self.expect_ident()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                };
            } else if self.peek() == Some('(') {
                self.pos += 1;
                let args = self.parse_args(')')?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else if self.peek() == Some('<') && expr.path().is_some() && self.generic_call_follows()
            {
                self.skip_angle_group()?;
            } else {
                self.pos = save;
                return Ok(expr);
            }
        }
    }

    /// `useState<Type>(` style explicit type arguments
    fn generic_call_follows(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        while let Some(&c) = self.chars.get(i) {
            match c {
                '<' => depth += 1,
                '>' => {
                    depth -= 1;
                    if depth == 0 {
                        return self.chars.get(i + 1) == Some(&'(');
                    }
                }
                '\n' | ';' | '{' | '}' => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    /// Comma separated expressions up to `close`
    fn parse_args(&mut self, close: char) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat(close) {
                return Ok(args);
            }
            if self.eat(',') {
                continue;
            }
            if self.starts_with("...") {
                let start = self.pos;
                self.pos += 3;
                self.parse_expr()?;
                let raw: String = self.chars[start..self.pos].iter().collect();
                args.push(Expr::Opaque(raw));
            } else {
                args.push(self.parse_expr()?);
            }
            self.skip_trivia()?;
            if !self.eat(',') {
                self.expect(close)?;
                return Ok(args);
            }
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Err(self.unexpected());
        };
        match c {
            '<' => Ok(Expr::Jsx(Box::new(self.parse_jsx()?))),
            '(' => self.nested(|p| {
                if let Some(params) = p.try_arrow_params() {
                    return p.parse_arrow_body(params);
                }
                p.pos += 1;
                let inner = p.parse_expr()?;
                p.expect(')')?;
                Ok(inner)
            }),
            '\'' | '"' => self.parse_string(c).map(Expr::Str),
            '`' => self.parse_template(),
            '{' => self.parse_object(start),
            '[' => self.nested(|p| {
                p.pos += 1;
                Ok(Expr::Array(p.parse_args(']')?))
            }),
            c if c.is_ascii_digit() || c == '-' || c == '.' => self.parse_number(),
            _ => {
                let word = self.ident().ok_or_else(|| self.unexpected())?;
                match word.as_str() {
                    "true" => Ok(Expr::Bool(true)),
                    "false" => Ok(Expr::Bool(false)),
                    "null" => Ok(Expr::Null),
                    "undefined" => Ok(Expr::Undefined),
                    "new" => {
                        let mut callee = self.expect_ident()?;
                        while self.peek() == Some('.') {
                            self.pos += 1;
                            callee.push('.');
                            callee.push_str(&self.expect_ident()?);
                        }
                        let save = self.pos;
                        self.skip_trivia()?;
                        let args = if self.eat('(') {
                            self.parse_args(')')?
                        } else {
                            self.pos = save;
                            Vec::new()
                        };
                        Ok(Expr::New { callee, args })
                    }
                    "function" => {
                        self.skip_trivia()?;
                        self.ident();
                        let func = self.parse_function_rest()?;
                        Ok(Expr::Arrow(Arc::new(func)))
                    }
                    "async" => {
                        self.skip_trivia()?;
                        if self.at_primary_start() {
                            self.parse_primary()
                        } else {
                            Ok(Expr::Ident(word))
                        }
                    }
                    "typeof" | "void" | "await" | "delete" | "yield" => self.parse_opaque(start),
                    _ => {
                        let save = self.pos;
                        self.skip_trivia()?;
                        if self.eat_str("=>") {
                            let params = vec![Param {
                                pattern: Pattern::Ident(word),
                                default: None,
                            }];
                            return self.parse_arrow_body(params);
                        }
                        self.pos = save;
                        Ok(Expr::Ident(word))
                    }
                }
            }
        }
    }

    fn parse_number(&mut self) -> ParseResult<Expr> {
        let start = self.pos;
        let negative = self.eat('-');
        let body_start = self.pos;
        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, '+' | '-')
                && matches!(self.chars.get(self.pos - 1), Some('e' | 'E'))
                && !self.chars[body_start..self.pos].starts_with(&['0', 'x']);
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[body_start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();
        let value = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            i64::from_str_radix(hex, 16).ok().map(|v| v as f64)
        } else {
            text.parse::<f64>().ok()
        };
        match value {
            Some(v) => Ok(Expr::Num(if negative { -v } else { v })),
            None => {
                self.pos = start;
                Err(self.error("Invalid or unexpected token"))
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> ParseResult<String> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("Invalid or unexpected token")),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('\n') => {}
                    Some(c) => out.push(c),
                    None => return Err(self.error("Invalid or unexpected token")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    /// Template literal; interpolated templates stay opaque
    fn parse_template(&mut self) -> ParseResult<Expr> {
        self.nested(Self::parse_template_literal)
    }

    fn parse_template_literal(&mut self) -> ParseResult<Expr> {
        let start = self.pos;
        let line = self.line();
        self.pos += 1;
        let mut out = String::new();
        let mut interpolated = false;
        loop {
            match self.bump() {
                None => {
                    return Err(ParseError {
                        message: "Unterminated template literal".into(),
                        line,
                    })
                }
                Some('\\') => {
                    if let Some(c) = self.bump() {
                        out.push(c);
                    }
                }
                Some('`') => break,
                Some('$') if self.peek() == Some('{') => {
                    interpolated = true;
                    self.pos += 1;
                    let mut depth = 1usize;
                    while depth > 0 {
                        match self.bump() {
                            Some('{') => depth += 1,
                            Some('}') => depth -= 1,
                            Some('`') => {
                                self.pos -= 1;
                                self.parse_template()?;
                            }
                            Some(_) => {}
                            None => {
                                return Err(ParseError {
                                    message: "Unterminated template literal".into(),
                                    line,
                                })
                            }
                        }
                    }
                }
                Some(c) => out.push(c),
            }
        }
        if interpolated {
            Ok(Expr::Opaque(self.chars[start..self.pos].iter().collect()))
        } else {
            Ok(Expr::Str(out))
        }
    }

    /// Object literal; shapes outside the subset become opaque
    fn parse_object(&mut self, start: usize) -> ParseResult<Expr> {
        self.nested(|p| p.parse_object_entries(start))
    }

    fn parse_object_entries(&mut self, start: usize) -> ParseResult<Expr> {
        self.pos += 1;
        let mut entries = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat('}') {
                return Ok(Expr::Object(entries));
            }
            if self.eof() {
                return Err(self.error("Unexpected end of input"));
            }
            if self.eat_str("...") {
                entries.push(ObjectEntry::Spread(self.parse_expr()?));
            } else {
                let key = match self.peek() {
                    Some(q @ ('\'' | '"')) => self.parse_string(q)?,
                    Some(c) if c.is_ascii_digit() => match self.parse_number()? {
                        Expr::Num(n) => format_number(n),
                        _ => return self.parse_opaque(start),
                    },
                    _ => match self.ident() {
                        Some(k) => k,
                        None => return self.parse_opaque(start),
                    },
                };
                self.skip_trivia()?;
                if self.eat(':') {
                    entries.push(ObjectEntry::Prop(key, self.parse_expr()?));
                } else if matches!(self.peek(), Some(',' | '}')) {
                    entries.push(ObjectEntry::Prop(key.clone(), Expr::Ident(key)));
                } else {
                    return self.parse_opaque(start);
                }
            }
            self.skip_trivia()?;
            if !self.eat(',') {
                self.expect('}')?;
                return Ok(Expr::Object(entries));
            }
        }
    }

    // ------------------------------------------------------------------
    // JSX
    // ------------------------------------------------------------------

    fn jsx_name(&mut self) -> Option<String> {
        let first = self.peek()?;
        if !Self::is_ident_start(first) {
            return None;
        }
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| Self::is_ident_char(c) || matches!(c, '.' | '-' | ':'))
        {
            self.pos += 1;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    fn parse_jsx(&mut self) -> ParseResult<JsxNode> {
        self.nested(Self::parse_jsx_element)
    }

    fn parse_jsx_element(&mut self) -> ParseResult<JsxNode> {
        let line = self.line();
        self.pos += 1;
        self.skip_trivia()?;
        if self.eat('>') {
            let children = self.parse_jsx_children(None, line)?;
            return Ok(JsxNode::Fragment(children));
        }
        let name = self.jsx_name().ok_or_else(|| self.unexpected())?;

        let mut attrs = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat_str("/>") {
                return Ok(JsxNode::Element(JsxElement {
                    name,
                    attrs,
                    children: Vec::new(),
                    line,
                }));
            }
            if self.eat('>') {
                break;
            }
            if self.eof() {
                return Err(ParseError {
                    message: "Unterminated JSX contents".into(),
                    line,
                });
            }
            if self.eat('{') {
                self.skip_trivia()?;
                if !self.eat_str("...") {
                    return Err(self.unexpected());
                }
                let expr = self.parse_expr()?;
                self.expect('}')?;
                attrs.push(JsxAttr::Spread(expr));
                continue;
            }
            let attr = self.jsx_name().ok_or_else(|| self.unexpected())?;
            self.skip_trivia()?;
            let value = if self.eat('=') {
                self.skip_trivia()?;
                Some(self.parse_jsx_attr_value()?)
            } else {
                None
            };
            attrs.push(JsxAttr::Named { name: attr, value });
        }

        let children = self.parse_jsx_children(Some(&name), line)?;
        Ok(JsxNode::Element(JsxElement {
            name,
            attrs,
            children,
            line,
        }))
    }

    fn parse_jsx_attr_value(&mut self) -> ParseResult<Expr> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != q) {
                    self.pos += 1;
                }
                if self.eof() {
                    return Err(self.error("Unterminated string constant"));
                }
                let value: String = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                Ok(Expr::Str(value))
            }
            Some('{') => {
                self.pos += 1;
                self.skip_trivia()?;
                if self.peek() == Some('}') {
                    return Err(
                        self.error("JSX attributes must only be assigned a non-empty expression")
                    );
                }
                let expr = self.parse_expr()?;
                self.expect('}')?;
                Ok(expr)
            }
            Some('<') => Ok(Expr::Jsx(Box::new(self.parse_jsx()?))),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_jsx_children(
        &mut self,
        closing: Option<&str>,
        open_line: usize,
    ) -> ParseResult<Vec<JsxChild>> {
        let mut children = Vec::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(ParseError {
                    message: "Unterminated JSX contents".into(),
                    line: open_line,
                });
            };
            if self.starts_with("</") {
                self.pos += 2;
                self.skip_trivia()?;
                let name = self.jsx_name().unwrap_or_default();
                self.expect('>')?;
                if Some(name.as_str()) != closing.or(Some("")) {
                    let expected = closing.unwrap_or("");
                    return Err(self.error(format!(
                        "Expected corresponding JSX closing tag for <{}>",
                        expected
                    )));
                }
                return Ok(children);
            }
            match c {
                '<' => children.push(JsxChild::Node(self.parse_jsx()?)),
                '{' => {
                    self.pos += 1;
                    self.skip_trivia()?;
                    if self.eat('}') {
                        continue;
                    }
                    self.eat_str("...");
                    let expr = self.parse_expr()?;
                    self.expect('}')?;
                    children.push(JsxChild::Expr(expr));
                }
                _ => {
                    let start = self.pos;
                    while self.peek().is_some_and(|c| c != '<' && c != '{') {
                        self.pos += 1;
                    }
                    let raw: String = self.chars[start..self.pos].iter().collect();
                    let text = clean_jsx_text(&raw);
                    if !text.is_empty() {
                        children.push(JsxChild::Text(text));
                    }
                }
            }
        }
    }
}

/// Collapse JSX text the way JSX compilers do
///
/// Lines are trimmed where they touch a line break, whitespace-only lines
/// disappear, and the remaining lines join with single spaces.
pub fn clean_jsx_text(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').collect();
    let last = lines.len() - 1;
    let mut parts: Vec<&str> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let mut piece = *line;
        if i > 0 {
            piece = piece.trim_start();
        }
        if i < last {
            piece = piece.trim_end();
        }
        if piece.trim().is_empty() && lines.len() > 1 {
            continue;
        }
        if !piece.is_empty() {
            parts.push(piece);
        }
    }
    parts.join(" ")
}

/// JavaScript-style number to string
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
