//! Text → token stream, including indentation (`TAB`) and `NEWLINE` tokens.
//!
//! Tokens are produced eagerly: [`lex_all`] drains the whole source up front
//! and returns a finite vector terminated by a [`TokenKind::None`] sentinel,
//! mirroring the original interpreter's `Lexer`, which hands the parser a
//! fully materialised token list rather than a pull-based stream.

mod string;

use std::rc::Rc;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, one_of},
    combinator::{map, recognize, value},
    sequence::tuple,
    IResult,
};
use smol_str::SmolStr;

use crate::position::{Position, Span};
use crate::token::{builtin_const_value, Token, TokenKind, BUILTIN_ALGOS, BUILTIN_CONSTS, KEYWORDS};

use self::string::lex_string;

/// Lex the whole of `source`, tagging every token's span with `file_name`.
pub fn lex_all(source: &str, file_name: Rc<str>) -> Vec<Token> {
    let mut pos = Position::start(file_name);
    let mut input = source;
    let mut tokens = Vec::new();

    loop {
        input = skip_ignored(input, &mut pos);

        if input.is_empty() {
            let here = pos.clone();
            tokens.push(Token::none(Span::new(here.clone(), here)));
            return tokens;
        }

        let start = pos.clone();
        match lex_one(input) {
            Ok((rest, kind)) => {
                let consumed_len = input.len() - rest.len();
                pos.advance_by(&input[..consumed_len]);
                tokens.push(Token::new(kind, Span::new(start, pos.clone())));
                input = rest;
            }
            Err(_) => {
                let mut chars = input.chars();
                let bad = chars.next().expect("input is non-empty");
                pos.advance(bad);
                let msg = format!("unexpected character {bad:?}");
                tokens.push(Token::new(TokenKind::Error(msg), Span::new(start, pos.clone())));
                input = chars.as_str();
            }
        }
    }
}

/// Skip spaces, carriage returns and `#` line comments. `\t` and `\n` are
/// significant (they become `TAB`/`NEWLINE` tokens) and are not skipped here.
fn skip_ignored<'a>(mut input: &'a str, pos: &mut Position) -> &'a str {
    loop {
        if let Some(rest) = input.strip_prefix(' ') {
            pos.advance(' ');
            input = rest;
        } else if let Some(rest) = input.strip_prefix('\r') {
            pos.advance('\r');
            input = rest;
        } else if input.starts_with('#') {
            let end = input.find('\n').unwrap_or(input.len());
            let (comment, rest) = input.split_at(end);
            pos.advance_by(comment);
            input = rest;
        } else {
            return input;
        }
    }
}

fn lex_one(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::Newline, char('\n')),
        value(TokenKind::Tab, char('\t')),
        lex_string,
        lex_number,
        lex_word,
        lex_operator,
    ))(input)
}

fn lex_number(input: &str) -> IResult<&str, TokenKind> {
    alt((lex_float, lex_int))(input)
}

fn lex_int(input: &str) -> IResult<&str, TokenKind> {
    map(digit1, |s: &str| {
        TokenKind::Int(s.parse().expect("digit1 yields a valid integer"))
    })(input)
}

fn lex_float(input: &str) -> IResult<&str, TokenKind> {
    map(recognize(tuple((digit1, char('.'), digit1))), |s: &str| {
        TokenKind::Float(s.parse().expect("recognised float literal"))
    })(input)
}

fn lex_word(input: &str) -> IResult<&str, TokenKind> {
    let mut indices = input.char_indices();
    match indices.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Alpha,
            )))
        }
    }
    let end = indices
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    let (word, rest) = input.split_at(end);
    Ok((rest, classify_word(word)))
}

fn classify_word(word: &str) -> TokenKind {
    if KEYWORDS.contains(&word) {
        TokenKind::Keyword(SmolStr::new(word))
    } else if BUILTIN_ALGOS.contains(&word) {
        TokenKind::BuiltinAlgo(SmolStr::new(word))
    } else if BUILTIN_CONSTS.contains(&word) {
        debug_assert!(builtin_const_value(word).is_some());
        TokenKind::BuiltinConst(SmolStr::new(word))
    } else {
        TokenKind::Identifier(SmolStr::new(word))
    }
}

fn lex_operator(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::Assign, tag("<-")),
        value(TokenKind::ScopeRes, tag("::")),
        value(TokenKind::NotEqual, tag("!=")),
        value(TokenKind::LessEq, tag("<=")),
        value(TokenKind::GreaterEq, tag(">=")),
        map(recognize(one_of("+-*/%^=<>(){}[],:;.")), single_char_op),
    ))(input)
}

fn single_char_op(s: &str) -> TokenKind {
    match s {
        "+" => TokenKind::Add,
        "-" => TokenKind::Sub,
        "*" => TokenKind::Mul,
        "/" => TokenKind::Div,
        "%" => TokenKind::Mod,
        "^" => TokenKind::Pow,
        "=" => TokenKind::Equal,
        "<" => TokenKind::Less,
        ">" => TokenKind::Greater,
        "(" => TokenKind::LeftParen,
        ")" => TokenKind::RightParen,
        "{" => TokenKind::LeftBrace,
        "}" => TokenKind::RightBrace,
        "[" => TokenKind::LeftSquare,
        "]" => TokenKind::RightSquare,
        "," => TokenKind::Comma,
        ":" => TokenKind::Colon,
        ";" => TokenKind::Semicolon,
        "." => TokenKind::Dot,
        _ => unreachable!("one_of restricts the character class"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex_all(src, Rc::from("test"))
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_assignment_and_arithmetic() {
        let kinds = kinds("x <- 1 + 2\n");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Assign,
                TokenKind::Int(1),
                TokenKind::Add,
                TokenKind::Int(2),
                TokenKind::Newline,
                TokenKind::None,
            ]
        );
    }

    #[test]
    fn leading_tabs_become_tab_tokens() {
        let kinds = kinds("if x then\n\ty <- 1\n");
        assert!(matches!(kinds[5], TokenKind::Tab));
    }

    #[test]
    fn keywords_and_builtins_are_reclassified() {
        let kinds = kinds("if TRUE then print(1)\n");
        assert_eq!(kinds[0], TokenKind::Keyword("if".into()));
        assert_eq!(kinds[1], TokenKind::BuiltinConst("TRUE".into()));
        assert!(matches!(kinds[3], TokenKind::BuiltinAlgo(_)));
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        let kinds = kinds("x <- 1 # comment\ny <- 2\n");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Assign,
                TokenKind::Int(1),
                TokenKind::Newline,
                TokenKind::Identifier("y".into()),
                TokenKind::Assign,
                TokenKind::Int(2),
                TokenKind::Newline,
                TokenKind::None,
            ]
        );
    }

    #[test]
    fn string_escapes_decode() {
        let kinds = kinds(r#""a\nb""#);
        match &kinds[0] {
            TokenKind::String(s) => assert_eq!(s.as_bytes(), b"a\nb"),
            other => panic!("expected string token, got {other:?}"),
        }
    }

    #[test]
    fn unknown_character_yields_error_token() {
        let kinds = kinds("@");
        assert!(matches!(kinds[0], TokenKind::Error(_)));
    }
}
