#![cfg(test)]
use rstest::rstest;

use super::{Tokenizer, TokenizerOptions};
use crate::error::TomlError;
use crate::token::{Token, TokenKind};
type TestReturn = Result<(), String>;

fn tokens(text: &str) -> Result<Vec<Token>, String> {
    Tokenizer::new(text).tokenize().map_err(|e| e.to_string())
}

fn kinds(text: &str) -> Result<Vec<TokenKind>, String> {
    Ok(tokens(text)?.iter().map(Token::kind).collect())
}

fn ident(s: &str) -> Token {
    Token::Identifier(s.to_string())
}

fn key(s: &str) -> Token {
    Token::Key(s.to_string())
}

#[test]
fn empty_input() -> TestReturn {
    assert!(tokens("")?.is_empty());
    assert!(tokens("\n\n  \t\n")?.is_empty());
    Ok(())
}

#[test]
fn key_values() -> TestReturn {
    let out = tokens("title = \"TOML Example\"\nport = 8080 # inline\n")?;
    assert_eq!(
        vec![
            key("title"),
            ident("TOML Example"),
            key("port"),
            Token::IntegerNumber(8080)
        ],
        out
    );
    Ok(())
}

#[test]
fn headers() -> TestReturn {
    let out = tokens("[a . \"b.c\" . 'd']\n[[fruit]]\n")?;
    assert_eq!(
        vec![
            Token::TableBegin,
            ident("a"),
            Token::TableSep,
            ident("b.c"),
            Token::TableSep,
            ident("d"),
            Token::TableEnd,
            Token::TableArrayBegin,
            ident("fruit"),
            Token::TableArrayEnd,
        ],
        out
    );
    Ok(())
}

#[test]
fn nested_arrays_balance() -> TestReturn {
    use TokenKind::*;
    let out = kinds("a = [[1, 2], [3, [4]], []]\nb = 1")?;
    assert_eq!(
        vec![
            Key,
            ArrayBegin,
            ArrayBegin,
            IntegerNumber,
            IntegerNumber,
            ArrayEnd,
            ArrayBegin,
            IntegerNumber,
            ArrayBegin,
            IntegerNumber,
            ArrayEnd,
            ArrayEnd,
            ArrayBegin,
            ArrayEnd,
            ArrayEnd,
            Key,
            IntegerNumber,
        ],
        out
    );
    Ok(())
}

#[test]
fn multiline_arrays() -> TestReturn {
    let text = "a = [\n  1, # one\n  2,\n  # done\n]\n";
    assert_eq!(
        vec![
            key("a"),
            Token::ArrayBegin,
            Token::IntegerNumber(1),
            Token::IntegerNumber(2),
            Token::ArrayEnd
        ],
        tokens(text)?
    );
    Ok(())
}

#[test]
fn inline_tables() -> TestReturn {
    let out = tokens("point = { x = 1, y.z = 'two' }")?;
    assert_eq!(
        vec![
            key("point"),
            Token::InlineTableBegin,
            key("x"),
            Token::IntegerNumber(1),
            key("y.z"),
            ident("two"),
            Token::InlineTableEnd,
        ],
        out
    );
    assert_eq!(
        vec![TokenKind::Key, TokenKind::InlineTableBegin, TokenKind::InlineTableEnd],
        kinds("empty = {}")?
    );
    Ok(())
}

#[test]
fn strings() -> TestReturn {
    let text = concat!(
        "a = \"\"\"\nRoses are red\nViolets are blue\"\"\"\n",
        "b = '''\n\\n stays'''\n",
        "c = ''\n",
        "d = \"tab\\there\"\n",
    );
    assert_eq!(
        vec![
            key("a"),
            ident("Roses are red\nViolets are blue"),
            key("b"),
            ident("\\n stays"),
            key("c"),
            ident(""),
            key("d"),
            ident("tab\there"),
        ],
        tokens(text)?
    );
    Ok(())
}

#[test]
fn comments_are_retained_on_request() -> TestReturn {
    let text = "# top\na = 1 # trailing\n#";
    let options = TokenizerOptions::default().retain_comments(true);
    let out = Tokenizer::with_options(text, options)
        .tokenize()
        .map_err(|e| e.to_string())?;
    assert_eq!(
        vec![
            Token::Comment("top".to_string()),
            key("a"),
            Token::IntegerNumber(1),
            Token::Comment("trailing".to_string()),
        ],
        out
    );
    Ok(())
}

#[rstest]
#[case("a = [1 2]")]
#[case("a = [1,,2]")]
#[case("a = [,]")]
#[case("a = [1, 2")]
#[case("a = \"unterminated")]
#[case("a = \"unterminated\nb = 1")]
#[case("a = = 1")]
#[case("a = 1 b = 2")]
#[case("a =")]
#[case("a")]
#[case("[a[b]]")]
#[case("[a#b]")]
#[case("[[a]")]
#[case("[a")]
#[case("a = 1979-05-27T")]
#[case("a = { b = 1 c = 2 }")]
#[case("a = { b = 1,\n c = 2 }")]
#[case("a = 01")]
#[case("a = \"bad \\q escape\"")]
fn rejects(#[case] text: &str) {
    assert!(Tokenizer::new(text).tokenize().is_err(), "{text:?}");
}

#[test]
fn errors_are_located() {
    match Tokenizer::new("a = 1\nb = = 2").tokenize() {
        Err(TomlError::Syntax { line, column, .. }) => {
            assert_eq!(2, line);
            assert_eq!(5, column);
        }
        other => panic!("Expected a located syntax error, got {other:?}"),
    }
}

#[test]
fn columns_count_graphemes() {
    // `é` spelled with a combining accent is one column
    match Tokenizer::new("\"e\u{301}\" = 1 x").tokenize() {
        Err(TomlError::Syntax { line, column, .. }) => {
            assert_eq!(1, line);
            assert_eq!(9, column);
        }
        other => panic!("Expected a located syntax error, got {other:?}"),
    }
}

#[test]
fn number_errors_keep_their_kind() {
    assert!(matches!(
        Tokenizer::new("a = 99999999999999999999").tokenize(),
        Err(TomlError::InvalidNumberFormat(_))
    ));
    assert!(matches!(
        Tokenizer::new("a = 1979-02-30").tokenize(),
        Err(TomlError::InvalidDateFormat(_))
    ));
}

#[test]
fn depth_limit() -> TestReturn {
    let deep = format!("a = {}{}", "[".repeat(50), "]".repeat(50));
    tokens(&deep)?;
    let options = TokenizerOptions::default().max_depth(Some(16));
    match Tokenizer::with_options(&deep, options).tokenize() {
        Err(TomlError::Syntax { message, .. }) => {
            assert!(message.contains("maximum depth"));
            Ok(())
        }
        other => Err(format!("Expected a depth error, got {other:?}")),
    }
}
