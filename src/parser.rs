use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::error::{Span, TallyError};
use crate::lexer::{Lexer, Token, TokenKind};

/// Anything the parser can pull tokens from, one at a time.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Token, TallyError>;
}

impl TokenSource for Lexer {
    fn next_token(&mut self) -> Result<Token, TallyError> {
        Lexer::next_token(self)
    }
}

/// Replays a prepared token list, then reports `EOF` forever.
pub struct TokenStream {
    tokens: std::vec::IntoIter<Token>,
    last_line: usize,
    last_end: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter(),
            last_line: 1,
            last_end: 0,
        }
    }
}

impl TokenSource for TokenStream {
    fn next_token(&mut self) -> Result<Token, TallyError> {
        match self.tokens.next() {
            Some(token) => {
                self.last_line = token.line;
                self.last_end = token.span.end;
                Ok(token)
            }
            None => Ok(Token::new(
                TokenKind::Eof,
                None,
                self.last_line,
                Span::single(self.last_end),
            )),
        }
    }
}

pub struct Parser<S: TokenSource = Lexer> {
    source: S,
    current_token: Token,
}

impl Parser<Lexer> {
    pub fn from_source(text: &str) -> Result<Self, TallyError> {
        Self::new(Lexer::new(text))
    }
}

impl<S: TokenSource> Parser<S> {
    /// Pulls the first token right away so there is always one of lookahead.
    pub fn new(mut source: S) -> Result<Self, TallyError> {
        let current_token = source.next_token()?;
        Ok(Self {
            source,
            current_token,
        })
    }

    pub fn parse(&mut self) -> Result<Program, TallyError> {
        let mut statements = Vec::new();

        while self.current_token.kind != TokenKind::Eof {
            if self.current_token.kind == TokenKind::Newline {
                self.eat(TokenKind::Newline)?;
                continue;
            }
            statements.push(self.statement()?);
        }

        Ok(Program { statements })
    }

    /// Consumes the current token if it has the expected kind and returns it.
    fn eat(&mut self, expected: TokenKind) -> Result<Token, TallyError> {
        if self.current_token.kind != expected {
            return Err(TallyError::parse_error(
                self.current_token.span,
                self.current_token.line,
                format!(
                    "Unexpected token type: expected {}, got {}",
                    expected, self.current_token.kind
                ),
            ));
        }
        let next = self.source.next_token()?;
        Ok(std::mem::replace(&mut self.current_token, next))
    }

    fn statement(&mut self) -> Result<Stmt, TallyError> {
        match self.current_token.kind {
            TokenKind::Identifier => self.assignment(),
            TokenKind::Print => self.print_statement(),
            _ => Err(unexpected(&self.current_token, "statement")
                .with_help("Statements are either 'name = expression' or 'print expression'.")),
        }
    }

    fn assignment(&mut self) -> Result<Stmt, TallyError> {
        let name = self.eat(TokenKind::Identifier)?;
        self.eat(TokenKind::Assign)?;
        let expression = self.expression()?;
        let span = name.span.to(*expression.span());

        Ok(Stmt::Assignment {
            identifier: name.value.unwrap_or_default(),
            expression,
            span,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt, TallyError> {
        let keyword = self.eat(TokenKind::Print)?;
        let expression = self.expression()?;
        let span = keyword.span.to(*expression.span());

        Ok(Stmt::Print { expression, span })
    }

    /// Takes every token up to the end of the line and resolves the run.
    fn expression(&mut self) -> Result<Expr, TallyError> {
        let mut run = Vec::new();
        while !matches!(
            self.current_token.kind,
            TokenKind::Newline | TokenKind::Eof
        ) {
            let kind = self.current_token.kind;
            run.push(self.eat(kind)?);
        }
        resolve(&run, &self.current_token)
    }
}

fn unexpected(token: &Token, context: &str) -> TallyError {
    TallyError::parse_error(
        token.span,
        token.line,
        format!("Unexpected token in {}: found {}", context, token.kind),
    )
}

/// Resolves a token run into an expression. `terminator` is the token that
/// ended the run and is blamed when the run is empty.
pub fn resolve(run: &[Token], terminator: &Token) -> Result<Expr, TallyError> {
    let (first, last) = match (run.first(), run.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(unexpected(terminator, "expression")
                .with_help("An expression is missing here."))
        }
    };

    if run.len() == 1 {
        return term(first);
    }

    validate_operators(run, first, last)?;
    additive(run)
}

fn validate_operators(run: &[Token], first: &Token, last: &Token) -> Result<(), TallyError> {
    if last.is_operator() {
        return Err(unexpected(last, "binary operation")
            .with_help("Binary operators need an operand on both sides."));
    }
    if first.is_operator() && first.operator().and_then(UnaryOp::from_symbol).is_none() {
        return Err(unexpected(first, "binary operation")
            .with_help("Only '+' and '-' may start an expression."));
    }
    for token in run {
        if token.is_operator() && token.operator().and_then(BinaryOp::from_symbol).is_none() {
            return Err(unexpected(token, "binary operation"));
        }
    }
    for pair in run.windows(2) {
        if pair[0].is_operator() && pair[1].is_operator() {
            return Err(unexpected(&pair[1], "binary operation")
                .with_help("Two operators cannot follow each other."));
        }
    }
    Ok(())
}

const ADDITIVE: u8 = 1;
const MULTIPLICATIVE: u8 = 2;

fn additive(run: &[Token]) -> Result<Expr, TallyError> {
    fold_level(run, ADDITIVE, multiplicative)
}

fn multiplicative(run: &[Token]) -> Result<Expr, TallyError> {
    fold_level(run, MULTIPLICATIVE, operand)
}

/// Splits a validated run on every operator of one precedence level and folds
/// the pieces left to right. A sign at index 0 is never a split point, so no
/// piece is empty.
fn fold_level(
    run: &[Token],
    level: u8,
    lower: fn(&[Token]) -> Result<Expr, TallyError>,
) -> Result<Expr, TallyError> {
    let mut piece_start = 0;
    let mut expr: Option<Expr> = None;
    let mut pending: Option<BinaryOp> = None;

    for (index, token) in run.iter().enumerate().skip(1) {
        let operator = match token.operator().and_then(BinaryOp::from_symbol) {
            Some(operator) if operator.precedence() == level => operator,
            _ => continue,
        };
        let piece = lower(&run[piece_start..index])?;
        expr = Some(combine(expr, pending, piece));
        pending = Some(operator);
        piece_start = index + 1;
    }

    let piece = lower(&run[piece_start..])?;
    Ok(combine(expr, pending, piece))
}

fn combine(left: Option<Expr>, operator: Option<BinaryOp>, right: Expr) -> Expr {
    match (left, operator) {
        (Some(left), Some(operator)) => {
            let span = left.span().to(*right.span());
            Expr::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                span,
            }
        }
        _ => right,
    }
}

fn operand(run: &[Token]) -> Result<Expr, TallyError> {
    match run {
        [single] => term(single),
        _ => signed_term(run),
    }
}

/// A run with no binary split: only `<sign> <term>` is valid.
fn signed_term(run: &[Token]) -> Result<Expr, TallyError> {
    let sign = run[0].operator().and_then(UnaryOp::from_symbol);

    match (sign, run.len()) {
        (Some(operator), 2) => {
            let argument = term(&run[1])?;
            let span = run[0].span.to(*argument.span());
            Ok(Expr::Unary {
                operator,
                argument: Box::new(argument),
                span,
            })
        }
        (Some(_), _) => Err(unexpected(&run[2], "expression")
            .with_help("Separate terms with an operator.")),
        (None, _) => Err(unexpected(&run[1], "expression")
            .with_help("Separate terms with an operator.")),
    }
}

fn term(token: &Token) -> Result<Expr, TallyError> {
    match (token.kind, token.value.as_deref()) {
        (TokenKind::Number, Some(digits)) => {
            let value = digits.parse::<i64>().map_err(|_| {
                TallyError::parse_error(
                    token.span,
                    token.line,
                    format!("Integer literal out of range: {}", digits),
                )
                .with_help("Values are 64-bit signed integers.")
            })?;
            Ok(Expr::Literal {
                value,
                span: token.span,
            })
        }
        (TokenKind::Identifier, Some(name)) => Ok(Expr::Identifier {
            name: name.to_string(),
            span: token.span,
        }),
        _ => Err(unexpected(token, "term")),
    }
}
