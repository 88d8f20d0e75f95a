use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::error::{Span, TallyError};
use std::collections::HashMap;
use std::io::{self, Write};

/// Variable bindings for a single run.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, i64>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    /// Creates the binding or overwrites the previous value.
    pub fn assign(&mut self, name: &str, value: i64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub struct Interpreter<W: Write = io::Stdout> {
    environment: Environment,
    output: W,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(output: W) -> Self {
        Self {
            environment: Environment::new(),
            output,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn interpret(&mut self, program: &Program) -> Result<(), TallyError> {
        for statement in &program.statements {
            self.execute_statement(statement)?;
        }
        self.output
            .flush()
            .map_err(|error| TallyError::output(Span::default(), &error))
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<(), TallyError> {
        match stmt {
            Stmt::Assignment {
                identifier,
                expression,
                ..
            } => {
                let value = self.evaluate_expression(expression)?;
                self.environment.assign(identifier, value);
                Ok(())
            }
            Stmt::Print { expression, span } => {
                let value = self.evaluate_expression(expression)?;
                writeln!(self.output, "{}", value).map_err(|error| TallyError::output(*span, &error))
            }
        }
    }

    /// Left operand first, depth first. Walks with an explicit task stack so
    /// long operator chains do not grow the call stack.
    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<i64, TallyError> {
        let mut tasks = vec![Task::Eval(expr)];
        let mut values: Vec<i64> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Eval(Expr::Literal { value, .. }) => values.push(*value),
                Task::Eval(Expr::Identifier { name, span }) => {
                    let value = self
                        .environment
                        .get(name)
                        .ok_or_else(|| TallyError::undefined_variable(*span, name))?;
                    values.push(value);
                }
                Task::Eval(Expr::Binary {
                    left,
                    operator,
                    right,
                    span,
                }) => {
                    tasks.push(Task::Binary(*operator, span));
                    tasks.push(Task::Eval(right));
                    tasks.push(Task::Eval(left));
                }
                Task::Eval(Expr::Unary {
                    operator,
                    argument,
                    span,
                }) => {
                    tasks.push(Task::Unary(*operator, span));
                    tasks.push(Task::Eval(argument));
                }
                Task::Binary(operator, span) => {
                    let (Some(right), Some(left)) = (values.pop(), values.pop()) else {
                        unreachable!("binary operator without two operands")
                    };
                    values.push(evaluate_binary_op(operator, left, right, span)?);
                }
                Task::Unary(operator, span) => {
                    let Some(value) = values.pop() else {
                        unreachable!("unary operator without an operand")
                    };
                    values.push(evaluate_unary_op(operator, value, span)?);
                }
            }
        }

        match values.pop() {
            Some(value) => Ok(value),
            None => unreachable!("expression produced no value"),
        }
    }
}

enum Task<'a> {
    Eval(&'a Expr),
    Binary(BinaryOp, &'a Span),
    Unary(UnaryOp, &'a Span),
}

fn evaluate_binary_op(
    operator: BinaryOp,
    left: i64,
    right: i64,
    span: &Span,
) -> Result<i64, TallyError> {
    let result = match operator {
        BinaryOp::Add => left.checked_add(right),
        BinaryOp::Subtract => left.checked_sub(right),
        BinaryOp::Multiply => left.checked_mul(right),
        BinaryOp::Divide => {
            if right == 0 {
                return Err(TallyError::divide_by_zero(*span));
            }
            // truncates toward zero
            left.checked_div(right)
        }
    };

    result.ok_or_else(|| {
        TallyError::overflow(
            *span,
            format!("Integer overflow in {} {} {}", left, operator, right),
        )
    })
}

fn evaluate_unary_op(operator: UnaryOp, value: i64, span: &Span) -> Result<i64, TallyError> {
    match operator {
        UnaryOp::Plus => Ok(value),
        UnaryOp::Minus => value
            .checked_neg()
            .ok_or_else(|| TallyError::overflow(*span, format!("Integer overflow in -{}", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, RuntimeErrorKind};
    use crate::parser::Parser;

    fn run(source: &str) -> (Result<(), TallyError>, String, Environment) {
        let program = Parser::from_source(source).unwrap().parse().unwrap();
        let mut interpreter = Interpreter::with_output(Vec::new());
        let result = interpreter.interpret(&program);
        let environment = interpreter.environment().clone();
        let buffer = interpreter.into_output();
        (result, String::from_utf8(buffer).unwrap(), environment)
    }

    fn output_of(source: &str) -> String {
        let (result, output, _) = run(source);
        result.unwrap();
        output
    }

    #[test]
    fn assignment_and_print() {
        assert_eq!(output_of("a = 1\nb = 1 + 2\nprint b + 3"), "6\n");
        assert_eq!(output_of("x = 10\ny = x - 4\nprint y"), "6\n");
        assert_eq!(output_of("num = 5\ntotal = num + num + 5\nprint total"), "15\n");
    }

    #[test]
    fn precedence_and_truncation() {
        assert_eq!(output_of("print 2 + 3 * 4"), "14\n");
        // 2 + 6 - 0 + 7
        assert_eq!(output_of("print 2 + 3 * 4 / 2 - 5 / 6 + 7"), "15\n");
        assert_eq!(output_of("print 7 / 2\nprint -7 / 2"), "3\n-3\n");
        assert_eq!(output_of("print 10 - 4 - 3"), "3\n");
    }

    #[test]
    fn reassignment_overwrites() {
        let (result, output, environment) = run("a=1\na=2\nprint a");
        result.unwrap();
        assert_eq!(output, "2\n");
        assert_eq!(environment.get("a"), Some(2));
        assert_eq!(environment.len(), 1);
    }

    #[test]
    fn unary_minus_in_chain() {
        let (result, _, environment) = run("a = -2\nb = -1 + 2 - 4 + a");
        result.unwrap();
        assert_eq!(environment.get("b"), Some(-5));
        assert_eq!(output_of("a = 3\nprint +a"), "3\n");
    }

    #[test]
    fn undefined_variable() {
        let (result, output, _) = run("print unknownVar");
        let error = result.unwrap_err();
        assert_eq!(
            error.kind,
            ErrorKind::Runtime(RuntimeErrorKind::UndefinedVariable)
        );
        assert_eq!(error.to_string(), "Undefined variable: unknownVar");
        assert!(output.is_empty());
    }

    #[test]
    fn divide_by_zero_aborts() {
        let (result, output, environment) = run("a = 10 / 0\nprint 1");
        let error = result.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Runtime(RuntimeErrorKind::DivideByZero));
        assert_eq!(error.message, "Attempted to divide by zero");
        assert!(output.is_empty());
        assert!(environment.is_empty());
    }

    #[test]
    fn output_before_error_is_kept() {
        let (result, output, _) = run("print 1\nb = 2\nprint b / z\nprint 3");
        assert!(result.is_err());
        assert_eq!(output, "1\n");
    }

    #[test]
    fn left_operand_is_evaluated_first() {
        let (result, _, _) = run("print first + second");
        assert_eq!(result.unwrap_err().message, "Undefined variable: first");
    }

    #[test]
    fn overflow_is_reported() {
        let (result, _, _) = run("a = 9223372036854775807\nprint a + 1");
        let error = result.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Runtime(RuntimeErrorKind::Overflow));

        let (result, _, _) = run("a = 9223372036854775807\nb = -a - 1\nprint -b");
        assert_eq!(
            result.unwrap_err().message,
            "Integer overflow in --9223372036854775808"
        );
    }

    #[test]
    fn evaluate_expression_directly() {
        let program = Parser::from_source("print 6 * 7").unwrap().parse().unwrap();
        let mut interpreter = Interpreter::with_output(Vec::new());
        let value = match &program.statements[0] {
            Stmt::Print { expression, .. } => interpreter.evaluate_expression(expression),
            Stmt::Assignment { .. } => unreachable!(),
        };
        assert_eq!(value.unwrap(), 42);
        assert!(interpreter.into_output().is_empty());
    }

    #[test]
    fn long_chains_evaluate_without_deep_recursion() {
        let mut source = String::from("print 1");
        for _ in 0..50_000 {
            source.push_str(" + 1");
        }
        assert_eq!(output_of(&source), "50001\n");

        let mut source = String::from("x = 3\nprint -x");
        for _ in 0..25_000 {
            source.push_str(" * 1 - x");
        }
        assert_eq!(output_of(&source), "-75003\n");
    }

    #[test]
    fn stdout_interpreter_starts_empty() {
        let program = Parser::from_source("a = 4\nb = a * a").unwrap().parse().unwrap();

        let mut interpreter = Interpreter::new();
        assert!(interpreter.environment().is_empty());
        interpreter.interpret(&program).unwrap();
        assert_eq!(interpreter.environment().get("b"), Some(16));

        let defaulted = Interpreter::default();
        assert!(defaulted.environment().is_empty());
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_become_runtime_errors() {
        let program = Parser::from_source("print 1").unwrap().parse().unwrap();
        let error = Interpreter::with_output(FailingWriter)
            .interpret(&program)
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Runtime(RuntimeErrorKind::Output));
    }
}
