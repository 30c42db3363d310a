// Parser for the Cotton language.
// Statements are parsed by recursive descent, expressions by precedence
// climbing over the operator table in `cotton_ast::OpId`.

mod parser;

pub use parser::Parser;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Lexer error: {0}")]
    LexerError(String),

    #[error("{message}")]
    UnexpectedToken {
        message: String,
        span: std::ops::Range<usize>,
    },

    #[error("{message}")]
    UnexpectedEof { message: String },
}

impl ParseError {
    /// Span of the offending token, or an empty span at end of input.
    pub fn span(&self) -> std::ops::Range<usize> {
        match self {
            ParseError::LexerError(_) => 0..0,
            ParseError::UnexpectedToken { span, .. } => span.clone(),
            ParseError::UnexpectedEof { .. } => usize::MAX..usize::MAX,
        }
    }
}
