use logos::Logos;

/// Helper function to unescape string and character literals
fn unescape_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('0') => result.push('\0'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some('\\') => result.push('\\'),
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Token types for the Cotton programming language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // Keywords
    #[token("function")]
    Function,
    #[token("type")]
    Type,
    #[token("method")]
    Method,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("continue")]
    Continue,
    #[token("break")]
    Break,
    #[token("return")]
    Return,
    #[token("unscoped")]
    Unscoped,

    // Word operators
    #[token("and")]
    And,
    #[token("or")]
    Or,

    // Literal keywords
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nothing")]
    Nothing,

    // Compound assignment operators (must come BEFORE single operators)
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,

    // Increment/Decrement
    #[token("++")]
    Increment,
    #[token("--")]
    Decrement,

    // Operators
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<<")]
    LShift,
    #[token(">>")]
    RShift,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("!")]
    Not,
    #[token("~")]
    Tilde,
    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("@")]
    At,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token(".")]
    Dot,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    // Literals
    // Real literal with optional scientific notation: 3.14, 1.5e10, 2.0E-5
    // Must come before IntLiteral so "3.14" is not split at the dot
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse().ok())]
    RealLiteral(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse().ok())]
    IntLiteral(i64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len()-1])
    })]
    StringLiteral(String),

    #[regex(r"'([^'\\]|\\.)'", |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len()-1]).chars().next()
    })]
    CharLiteral(char),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/", logos::skip)]
    BlockComment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}

pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
        }
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<TokenSpan, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.inner.next()?;
        let span = self.inner.span();

        match token {
            Ok(tok) => Some(Ok(TokenSpan { token: tok, span })),
            Err(_) => Some(Err(LexError::InvalidToken { span: span.clone() })),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("Invalid token at {span:?}")]
    InvalidToken { span: std::ops::Range<usize> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        let source = "function type method while unscoped return";
        let mut lexer = Lexer::new(source);

        assert_eq!(lexer.next().unwrap().unwrap().token, Token::Function);
        assert_eq!(lexer.next().unwrap().unwrap().token, Token::Type);
        assert_eq!(lexer.next().unwrap().unwrap().token, Token::Method);
        assert_eq!(lexer.next().unwrap().unwrap().token, Token::While);
        assert_eq!(lexer.next().unwrap().unwrap().token, Token::Unscoped);
        assert_eq!(lexer.next().unwrap().unwrap().token, Token::Return);
    }

    #[test]
    fn test_literals() {
        let source = r#"42 3.14 'a' "hello" true nothing"#;
        let mut lexer = Lexer::new(source);

        assert_eq!(lexer.next().unwrap().unwrap().token, Token::IntLiteral(42));
        assert_eq!(
            lexer.next().unwrap().unwrap().token,
            Token::RealLiteral(3.14)
        );
        assert_eq!(lexer.next().unwrap().unwrap().token, Token::CharLiteral('a'));
        assert_eq!(
            lexer.next().unwrap().unwrap().token,
            Token::StringLiteral("hello".to_string())
        );
        assert_eq!(lexer.next().unwrap().unwrap().token, Token::True);
        assert_eq!(lexer.next().unwrap().unwrap().token, Token::Nothing);
    }

    #[test]
    fn test_string_escapes() {
        let source = r#""line\nbreak\t\"quoted\"""#;
        let mut lexer = Lexer::new(source);

        assert_eq!(
            lexer.next().unwrap().unwrap().token,
            Token::StringLiteral("line\nbreak\t\"quoted\"".to_string())
        );
    }

    #[test]
    fn test_compound_operators() {
        let source = "+= ++ + == = >> >";
        let tokens: Vec<_> = Lexer::new(source).map(|r| r.unwrap().token).collect();

        assert_eq!(
            tokens,
            vec![
                Token::PlusEq,
                Token::Increment,
                Token::Plus,
                Token::EqEq,
                Token::Eq,
                Token::RShift,
                Token::Gt,
            ]
        );
    }

    #[test]
    fn test_word_operators_vs_identifiers() {
        let source = "a and andy or order";
        let tokens: Vec<_> = Lexer::new(source).map(|r| r.unwrap().token).collect();

        assert_eq!(tokens[0], Token::Ident("a".to_string()));
        assert_eq!(tokens[1], Token::And);
        assert_eq!(tokens[2], Token::Ident("andy".to_string()));
        assert_eq!(tokens[3], Token::Or);
        assert_eq!(tokens[4], Token::Ident("order".to_string()));
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "x // trailing\n/* block */ y";
        let tokens: Vec<_> = Lexer::new(source).map(|r| r.unwrap().token).collect();

        assert_eq!(
            tokens,
            vec![Token::Ident("x".to_string()), Token::Ident("y".to_string())]
        );
    }

    #[test]
    fn test_spans() {
        let source = "x = 15;";
        let spans: Vec<_> = Lexer::new(source).map(|r| r.unwrap().span).collect();

        assert_eq!(spans, vec![0..1, 2..3, 4..6, 6..7]);
    }

    #[test]
    fn test_method_call_chain() {
        let source = "p.sum();";
        let tokens: Vec<_> = Lexer::new(source).map(|r| r.unwrap().token).collect();

        assert_eq!(tokens[0], Token::Ident("p".to_string()));
        assert_eq!(tokens[1], Token::Dot);
        assert_eq!(tokens[2], Token::Ident("sum".to_string()));
        assert_eq!(tokens[3], Token::LParen);
        assert_eq!(tokens[4], Token::RParen);
        assert_eq!(tokens[5], Token::Semicolon);
    }
}
