// Module Declarations
mod error; // Every way a parse can fail
mod grammar; // The lexical rule table, one rule list per context
mod parsedtoml; // The completely-parsed TOML table.
mod strings; // Escape decoding and key splitting
mod token; // What the tokenizer hands to the builder
mod tokenizer; // Context-stack tokenizer
mod tomlparse; // Token stream -> table
mod tomltypes; // Rust representations of TOML types

// Imports
use std::path::Path;

pub use error::{TomlError, TomlResult};
pub use grammar::{Context, Grammar, Producer, Rule, GRAMMAR};
pub use parsedtoml::ParsedTOML;
pub use token::{Token, TokenKind};
pub use tokenizer::{Tokenizer, TokenizerOptions};
pub use tomlparse::TOMLParser;
pub use tomltypes::{TOMLTable, TOMLType, TableOps};

/// Parse TOML text.
///
/// ```
/// let parsed = tomlctx::parse("[my_table]\nkey.is_dotted.example = true").unwrap();
/// assert_eq!(Some(true), parsed.bool(&["my_table", "key", "is_dotted", "example"]));
/// ```
pub fn parse(text: &str) -> TomlResult<ParsedTOML> {
    parse_with(text, TokenizerOptions::default())
}

/// Parse TOML text with explicit tokenizer options.
pub fn parse_with(text: &str, options: TokenizerOptions) -> TomlResult<ParsedTOML> {
    let table = TOMLParser::init(text).with_options(options).parse_toml()?;
    Ok(ParsedTOML::from(table))
}

/// The interface to the TOML parser for files.
/// Takes a path that is either absolute or relative to the current working directory.
/// The file must have extension `.toml`.
pub fn load(file: impl AsRef<Path>) -> TomlResult<ParsedTOML> {
    let table = TOMLParser::from_file(file)?.parse_toml()?;
    Ok(ParsedTOML::from(table))
}
