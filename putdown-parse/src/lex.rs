use core::fmt::{self, Display};
use logos::{Lexer, Logos};

#[derive(Logos, Debug, PartialEq)]
pub enum Token<'s> {
    #[token("(")]
    LPar,

    #[token(")")]
    RPar,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("{*")]
    LFormula,

    #[token("*}")]
    RFormula,

    #[token("[")]
    LBrk,

    #[token("]")]
    RBrk,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    /// `+{ ... }`, including the leading `+`
    #[token("+{", attributes)]
    Attributes(&'s str),

    /// marks the preceding environment as a blatant instantiation hint
    #[token("<<")]
    Bih,

    #[regex("✔\u{FE0E}?", priority = 5)]
    Check,

    #[regex("✗", priority = 5)]
    Cross,

    #[regex("//[^\n]*", |lex| &lex.slice()[2..], priority = 4)]
    Comment(&'s str),

    #[regex(r"-?[0-9]+(\.[0-9]+)?", |lex| lex.slice(), priority = 3)]
    Number(&'s str),

    #[regex(r#"[^\s(){}\[\],:"]+"#, |lex| lex.slice(), priority = 1)]
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    Symbol(&'s str),

    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    #[error]
    Error,
}

impl<'s> Display for Token<'s> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::LPar => "(",
            Self::RPar => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LFormula => "{*",
            Self::RFormula => "*}",
            Self::LBrk => "[",
            Self::RBrk => "]",
            Self::Colon => ":",
            Self::Comma => ",",
            Self::Attributes(s) | Self::Number(s) | Self::Symbol(s) => s,
            Self::Bih => "<<",
            Self::Check => "\u{2714}\u{FE0E}",
            Self::Cross => "✗",
            Self::Comment(s) => return write!(f, "//{}", s),
            Self::Error => return Err(Default::default()),
        };
        s.fmt(f)
    }
}

/// Consume a JSON object whose opening brace has just been lexed.
///
/// Braces inside JSON strings do not count.
fn attributes<'s>(lex: &mut Lexer<'s, Token<'s>>) -> Option<&'s str> {
    let mut open = 1;
    let mut in_string = false;
    let mut escaped = false;
    let mut len = 0;
    for c in lex.remainder().chars() {
        len += c.len_utf8();
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => (),
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => open += 1,
            '}' => {
                open -= 1;
                if open == 0 {
                    lex.bump(len);
                    return Some(lex.slice());
                }
            }
            _ => (),
        }
    }
    None
}

#[test]
fn tokens() {
    let toks: alloc::vec::Vec<_> = Token::lexer("(+ 1 -6 x) +{\"a\": {\"b\": \"}\"}} // hi").collect();
    assert_eq!(
        toks,
        [
            Token::LPar,
            Token::Symbol("+"),
            Token::Number("1"),
            Token::Number("-6"),
            Token::Symbol("x"),
            Token::RPar,
            Token::Attributes("+{\"a\": {\"b\": \"}\"}}"),
            Token::Comment(" hi"),
        ]
    );
}

#[test]
fn markers() {
    let toks: alloc::vec::Vec<_> = Token::lexer("{* :A *} { B } << ✔︎ ✗ <<< \"s t\"").collect();
    assert_eq!(
        toks,
        [
            Token::LFormula,
            Token::Colon,
            Token::Symbol("A"),
            Token::RFormula,
            Token::LBrace,
            Token::Symbol("B"),
            Token::RBrace,
            Token::Bih,
            Token::Check,
            Token::Cross,
            Token::Symbol("<<<"),
            Token::Symbol("\"s t\""),
        ]
    );
}
