use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use std::ops::Range;

/// Character offsets into the source, half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    UndefinedVariable,
    DivideByZero,
    Overflow,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    Runtime(RuntimeErrorKind),
}

impl ErrorKind {
    /// Lex and parse errors are reported against a source line.
    pub fn is_syntax(&self) -> bool {
        matches!(self, ErrorKind::Lex | ErrorKind::Parse)
    }
}

#[derive(Debug, Clone)]
pub struct TallyError {
    pub kind: ErrorKind,
    pub span: Span,
    pub line: usize,
    pub message: String,
    pub help: Option<String>,
}

impl TallyError {
    pub fn new(kind: ErrorKind, span: Span, line: usize, message: String) -> Self {
        Self {
            kind,
            span,
            line,
            message,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn lex_error(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::Lex, span, line, message)
    }

    pub fn parse_error(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::Parse, span, line, message)
    }

    pub fn undefined_variable(span: Span, name: &str) -> Self {
        Self::new(
            ErrorKind::Runtime(RuntimeErrorKind::UndefinedVariable),
            span,
            0,
            format!("Undefined variable: {}", name),
        )
        .with_help(format!("Assign a value first, e.g. '{} = 0'.", name))
    }

    pub fn divide_by_zero(span: Span) -> Self {
        Self::new(
            ErrorKind::Runtime(RuntimeErrorKind::DivideByZero),
            span,
            0,
            "Attempted to divide by zero".to_string(),
        )
    }

    pub fn overflow(span: Span, message: String) -> Self {
        Self::new(
            ErrorKind::Runtime(RuntimeErrorKind::Overflow),
            span,
            0,
            message,
        )
        .with_help("Values are 64-bit signed integers.")
    }

    pub fn output(span: Span, cause: &std::io::Error) -> Self {
        Self::new(
            ErrorKind::Runtime(RuntimeErrorKind::Output),
            span,
            0,
            format!("Failed to write output: {}", cause),
        )
    }

    /// Character range to underline, kept inside `source`. EOF tokens sit one
    /// past the last character, so they fall back to the final character.
    fn label_range(&self, source: &str) -> Range<usize> {
        let len = source.chars().count();
        let start = self.span.start.min(len);
        let end = self.span.end.min(len).max(start);

        if start < end {
            start..end
        } else if start < len {
            start..start + 1
        } else {
            len.saturating_sub(1)..len
        }
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<input>");

        let color = match self.kind {
            ErrorKind::Lex => Color::Red,
            ErrorKind::Parse => Color::Yellow,
            ErrorKind::Runtime(_) => Color::Magenta,
        };

        let kind_str = match self.kind {
            ErrorKind::Lex => "Lexical Error",
            ErrorKind::Parse => "Parse Error",
            ErrorKind::Runtime(_) => "Runtime Error",
        };

        let range = self.label_range(source);

        let mut report_builder = Report::build(ReportKind::Error, filename, range.start)
            .with_message(format!("{}: {}", kind_str.fg(color), self.message))
            .with_label(
                Label::new((filename, range))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        if let Err(error) = report_builder
            .finish()
            .eprint((filename, Source::from(source)))
        {
            eprintln!("{}", self);
            eprintln!("(failed to render diagnostic: {})", error);
        }
    }
}

impl fmt::Display for TallyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.kind.is_syntax() {
            write!(f, "At line {}:\n{}", self.line, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for TallyError {}
