use crate::error::Span;
use std::fmt;

// Owned syntax tree. Every node belongs to exactly one parent.

#[derive(Debug, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug)]
pub enum Stmt {
    Assignment {
        identifier: String,
        expression: Expr,
        span: Span,
    },
    Print {
        expression: Expr,
        span: Span,
    },
}

#[derive(Debug)]
pub enum Expr {
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },
    Unary {
        operator: UnaryOp,
        argument: Box<Expr>,
        span: Span,
    },
    Literal {
        value: i64,
        span: Span,
    },
    Identifier {
        name: String,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Binary { span, .. } => span,
            Expr::Unary { span, .. } => span,
            Expr::Literal { span, .. } => span,
            Expr::Identifier { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(BinaryOp::Add),
            '-' => Some(BinaryOp::Subtract),
            '*' => Some(BinaryOp::Multiply),
            '/' => Some(BinaryOp::Divide),
            _ => None,
        }
    }

    /// Higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Subtract => 1,
            BinaryOp::Multiply | BinaryOp::Divide => 2,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

impl UnaryOp {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(UnaryOp::Plus),
            '-' => Some(UnaryOp::Minus),
            _ => None,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Minus => write!(f, "-"),
        }
    }
}

/// Chains are left-deep and can be as long as a source line, so children are
/// moved onto a heap stack instead of being dropped recursively.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        take_children(self, &mut pending);
        while let Some(mut expr) = pending.pop() {
            take_children(&mut expr, &mut pending);
        }
    }
}

fn take_children(expr: &mut Expr, pending: &mut Vec<Expr>) {
    let mut take = |child: &mut Box<Expr>| {
        let leaf = Expr::Literal {
            value: 0,
            span: Span::default(),
        };
        pending.push(std::mem::replace(&mut **child, leaf));
    };
    match expr {
        Expr::Binary { left, right, .. } => {
            take(left);
            take(right);
        }
        Expr::Unary { argument, .. } => take(argument),
        Expr::Literal { .. } | Expr::Identifier { .. } => {}
    }
}

// S-expression rendering, spans omitted. Iterative for the same reason as Drop.

enum Piece<'a> {
    Node(&'a Expr),
    Text(&'static str),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut stack = vec![Piece::Node(self)];

        while let Some(piece) = stack.pop() {
            match piece {
                Piece::Text(text) => f.write_str(text)?,
                Piece::Node(Expr::Binary {
                    left,
                    operator,
                    right,
                    ..
                }) => {
                    write!(f, "({} ", operator)?;
                    stack.push(Piece::Text(")"));
                    stack.push(Piece::Node(right));
                    stack.push(Piece::Text(" "));
                    stack.push(Piece::Node(left));
                }
                Piece::Node(Expr::Unary {
                    operator, argument, ..
                }) => {
                    write!(f, "({} ", operator)?;
                    stack.push(Piece::Text(")"));
                    stack.push(Piece::Node(argument));
                }
                Piece::Node(Expr::Literal { value, .. }) => write!(f, "{}", value)?,
                Piece::Node(Expr::Identifier { name, .. }) => f.write_str(name)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::Assignment {
                identifier,
                expression,
                ..
            } => write!(f, "(= {} {})", identifier, expression),
            Stmt::Print { expression, .. } => write!(f, "(print {})", expression),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(value: i64) -> Box<Expr> {
        Box::new(Expr::Literal {
            value,
            span: Span::default(),
        })
    }

    #[test]
    fn renders_nested_expressions() {
        let expr = Expr::Binary {
            left: lit(2),
            operator: BinaryOp::Add,
            right: Box::new(Expr::Binary {
                left: lit(3),
                operator: BinaryOp::Multiply,
                right: Box::new(Expr::Unary {
                    operator: UnaryOp::Minus,
                    argument: lit(4),
                    span: Span::default(),
                }),
                span: Span::default(),
            }),
            span: Span::default(),
        };
        assert_eq!(expr.to_string(), "(+ 2 (* 3 (- 4)))");
    }

    #[test]
    fn renders_program_one_statement_per_line() {
        let program = Program {
            statements: vec![
                Stmt::Assignment {
                    identifier: "a".to_string(),
                    expression: *lit(1),
                    span: Span::default(),
                },
                Stmt::Print {
                    expression: Expr::Identifier {
                        name: "a".to_string(),
                        span: Span::default(),
                    },
                    span: Span::default(),
                },
            ],
        };
        assert_eq!(program.to_string(), "(= a 1)\n(print a)");
    }

    #[test]
    fn deep_chains_render_and_drop() {
        let mut expr = *lit(0);
        for value in 1..=100_000 {
            expr = Expr::Binary {
                left: Box::new(expr),
                operator: BinaryOp::Subtract,
                right: lit(value),
                span: Span::default(),
            };
        }
        let rendered = expr.to_string();
        assert!(rendered.starts_with("(- (- (- "));
        assert!(rendered.ends_with(" 99999) 100000)"));
        drop(expr);
    }

    #[test]
    fn precedence_levels() {
        assert!(BinaryOp::Multiply.precedence() > BinaryOp::Add.precedence());
        assert_eq!(
            BinaryOp::Divide.precedence(),
            BinaryOp::Multiply.precedence()
        );
        assert_eq!(BinaryOp::from_symbol('/'), Some(BinaryOp::Divide));
        assert_eq!(UnaryOp::from_symbol('*'), None);
    }
}
