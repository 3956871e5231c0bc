//! Building the document from the token stream.

//////////
// Imports
//////////

// stdlib imports
use std::collections::{HashSet, VecDeque};
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
// third-party imports
use tracing::{debug, trace};
// my imports
use crate::error::{describe_path, TomlError, TomlResult};
use crate::strings::split_key;
use crate::token::{Token, TokenKind};
use crate::tokenizer::{Tokenizer, TokenizerOptions};
use crate::tomltypes::{TOMLTable, TOMLType, TableOps};

/// Parses TOML text into a [`TOMLTable`].
#[derive(Debug, Clone)]
pub struct TOMLParser {
    source: String,
    options: TokenizerOptions,
}

impl TOMLParser {
    ////////////////////////
    // Creation/Modification
    ////////////////////////
    pub fn init(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            options: TokenizerOptions::default(),
        }
    }

    /// Read the parser input from a `.toml` file.
    pub fn from_file(file_path: impl AsRef<Path>) -> TomlResult<Self> {
        let file_path = file_path.as_ref();
        Self::validate_file(file_path)?;
        Ok(Self::init(fs::read_to_string(file_path)?))
    }

    pub fn with_options(mut self, options: TokenizerOptions) -> Self {
        self.options = options;
        self
    }

    fn validate_file(input: &Path) -> TomlResult<()> {
        let toml_ext: &OsStr = OsStr::new("toml");
        match input.extension() {
            Some(ext) if ext == toml_ext => Ok(()),
            _ => Err(TomlError::FileExtension(format!(
                "`{}` must have extension `.toml`",
                input.display()
            ))),
        }
    }

    ////////////////////
    // Parsing Functions
    ////////////////////

    /// Tokenize the whole input, then build the document from the tokens.
    pub fn parse_toml(&self) -> TomlResult<TOMLTable> {
        debug!(bytes = self.source.len(), "parsing TOML");
        let tokens = Tokenizer::with_options(&self.source, self.options).tokenize()?;
        debug!(tokens = tokens.len(), "tokenized");

        let mut table = TOMLTable::new();
        TableBuilder::new(&mut table).build(tokens)?;
        debug!(keys = table.len(), "parsed TOML");
        Ok(table)
    }
}

/// Writes values into a table while walking a token stream.
///
/// Keys are resolved against `key_path`, the path of the table opened by the
/// most recent header (empty at the top level).
#[derive(Debug)]
pub(crate) struct TableBuilder<'doc> {
    doc: &'doc mut TOMLTable,
    key_path: Vec<String>,
    /// Paths of the tables opened with a `[header]`
    declared: HashSet<Vec<String>>,
}

impl<'doc> TableBuilder<'doc> {
    pub(crate) fn new(doc: &'doc mut TOMLTable) -> Self {
        Self {
            doc,
            key_path: Vec::new(),
            declared: HashSet::new(),
        }
    }

    /// Consume every token. The first failure aborts the build.
    ///
    /// Returns the paths of every `[header]` declared along the way.
    pub(crate) fn build(
        mut self,
        tokens: impl Into<VecDeque<Token>>,
    ) -> TomlResult<HashSet<Vec<String>>> {
        let mut tokens = tokens.into();
        while !tokens.is_empty() {
            self.dispatch(&mut tokens)?;
        }
        Ok(self.declared)
    }

    fn dispatch(&mut self, tokens: &mut VecDeque<Token>) -> TomlResult<()> {
        let Some(token) = tokens.pop_front() else {
            return Ok(());
        };
        match token {
            Token::Key(raw) => self.parse_keyval(&raw, tokens),
            Token::TableBegin => self.parse_table_header(tokens),
            Token::TableArrayBegin => self.parse_table_array(tokens),
            Token::Comment(_) => Ok(()),
            other => Err(TomlError::SyntaxError(format!(
                "Unexpected {:?} outside of a key/value pair",
                other.kind()
            ))),
        }
    }

    /// Handle `key = value`, creating the tables named by a dotted key.
    fn parse_keyval(&mut self, raw: &str, tokens: &mut VecDeque<Token>) -> TomlResult<()> {
        let segments = split_key(raw)?;
        let Some((last, prefix)) = segments.split_last() else {
            return Err(TomlError::SyntaxError(format!("Invalid key: {raw}")));
        };

        let mut path = self.key_path.clone();
        // A dotted key may only create tables, or extend ones made by other dotted keys.
        for segment in prefix {
            path.push(segment.clone());
            match self.doc.lookup(&path) {
                None | Some(TOMLType::DKTable(_)) => (),
                Some(_) => return Err(TomlError::DuplicateKey(describe_path(&path))),
            }
        }
        if !prefix.is_empty() {
            self.doc.set_table(&path, TOMLType::DKTable)?;
        }
        path.push(last.clone());

        let value = read_value(tokens, &path)?;
        if self.doc.has_key(&path, true) {
            return Err(TomlError::DuplicateKey(describe_path(&path)));
        }
        trace!(path = ?path, kind = value.type_name(), "set value");
        self.doc.set(&path, value)
    }

    /// Handle `[table]`. The keys that follow belong to the table until the next header.
    fn parse_table_header(&mut self, tokens: &mut VecDeque<Token>) -> TomlResult<()> {
        let (path, consumed) = header_path(tokens.iter())?;
        tokens.drain(..consumed);

        let defined_elsewhere = match self.doc.lookup(&path) {
            Some(TOMLType::HTable(_)) | None => false,
            Some(_) => true,
        };
        if defined_elsewhere || self.declared.contains(&path) {
            return Err(TomlError::DuplicateKey(format!(
                "Table header `{}` is already defined",
                describe_path(&path)
            )));
        }
        self.doc.set_table(&path, TOMLType::HTable)?;
        debug!(path = ?path, "table declared");
        self.declared.insert(path.clone());
        self.key_path = path;
        Ok(())
    }

    /// Handle `[[table]]`: build one element from its body and append it.
    fn parse_table_array(&mut self, tokens: &mut VecDeque<Token>) -> TomlResult<()> {
        let (path, consumed) = header_path(tokens.iter())?;
        tokens.drain(..consumed);

        let body = take_element_body(tokens, &path)?;
        let mut element = TOMLTable::new();
        let nested = TableBuilder::new(&mut element).build(body)?;

        match self.doc.lookup_mut(&path) {
            Some(TOMLType::AoT(tables)) => {
                tables.push(element);
                debug!(path = ?path, len = tables.len(), "array of tables element appended");
            }
            Some(_) => {
                return Err(TomlError::DuplicateKey(format!(
                    "`{}` is not an array of tables",
                    describe_path(&path)
                )))
            }
            None => {
                if let Some((_, parent)) = path.split_last() {
                    self.doc.set_table(parent, TOMLType::HTable)?;
                }
                self.doc.set(&path, TOMLType::AoT(vec![element]))?;
                debug!(path = ?path, "array of tables created");
            }
        }
        // Headers under `path` now name tables of the new element.
        self.declared
            .retain(|declared| !(declared.len() > path.len() && declared.starts_with(&path)));
        self.declared.extend(nested.into_iter().map(|relative| {
            let mut absolute = path.clone();
            absolute.extend(relative);
            absolute
        }));
        // only another header can follow the element body
        self.key_path.clear();
        Ok(())
    }
}

/// The next value token(s), converted.
fn read_value(tokens: &mut VecDeque<Token>, path: &[String]) -> TomlResult<TOMLType> {
    match tokens.pop_front() {
        Some(Token::ArrayBegin) => collect_array(tokens, path),
        Some(Token::InlineTableBegin) => inline_table(tokens),
        Some(token) if token.kind().is_scalar() => TOMLType::try_from(token),
        Some(token) => Err(TomlError::SyntaxError(format!(
            "Expected a value for {}, found {:?}",
            describe_path(path),
            token.kind()
        ))),
        None => Err(TomlError::SyntaxError(format!(
            "Missing value for {}",
            describe_path(path)
        ))),
    }
}

/// Collect array elements up to the matching `ArrayEnd`.
///
/// Every element must be of the same kind as the first one. Nested arrays all
/// count as one kind, whatever they contain.
fn collect_array(tokens: &mut VecDeque<Token>, path: &[String]) -> TomlResult<TOMLType> {
    let mut elements: Vec<TOMLType> = Vec::new();
    loop {
        let token = tokens
            .pop_front()
            .ok_or_else(|| TomlError::SyntaxError("Unterminated array".to_string()))?;
        let element = match token {
            Token::ArrayEnd => break,
            Token::Comment(_) => continue,
            Token::ArrayBegin => collect_array(tokens, path)?,
            Token::InlineTableBegin => inline_table(tokens)?,
            other => TOMLType::try_from(other)?,
        };
        if let Some(first) = elements.first() {
            if first.type_name() != element.type_name() {
                return Err(TomlError::HeterogeneousArray {
                    path: describe_path(path),
                    expected: first.type_name(),
                    found: element.type_name(),
                });
            }
        }
        elements.push(element);
    }
    Ok(TOMLType::Array(elements))
}

/// Build a sealed table from the tokens up to the matching `InlineTableEnd`.
fn inline_table(tokens: &mut VecDeque<Token>) -> TomlResult<TOMLType> {
    let mut depth = 0_usize;
    let end = tokens
        .iter()
        .position(|token| match token.kind() {
            TokenKind::InlineTableBegin => {
                depth += 1;
                false
            }
            TokenKind::InlineTableEnd if depth == 0 => true,
            TokenKind::InlineTableEnd => {
                depth -= 1;
                false
            }
            _ => false,
        })
        .ok_or_else(|| TomlError::SyntaxError("Unterminated inline table".to_string()))?;

    let mut body: VecDeque<Token> = tokens.drain(..=end).collect();
    body.pop_back();
    let mut table = TOMLTable::new();
    TableBuilder::new(&mut table).build(body)?;
    Ok(TOMLType::InlineTable(table))
}

/// Read a header path from the tokens following `[` or `[[`.
///
/// Returns the path along with the number of tokens it spans, closing bracket
/// included.
fn header_path<'t>(tokens: impl Iterator<Item = &'t Token>) -> TomlResult<(Vec<String>, usize)> {
    let mut path = Vec::new();
    let mut expect_segment = true;
    for (i, token) in tokens.enumerate() {
        match token {
            Token::Identifier(segment) if expect_segment => {
                path.push(segment.clone());
                expect_segment = false;
            }
            Token::Identifier(segment) => {
                return Err(TomlError::SyntaxError(format!(
                    "Table name segments must be separated by `.` (found `{segment}`)"
                )))
            }
            Token::TableSep if !expect_segment => expect_segment = true,
            Token::TableEnd | Token::TableArrayEnd if path.is_empty() => {
                return Err(TomlError::SyntaxError(
                    "Table name must not be blank".to_string(),
                ))
            }
            Token::TableSep | Token::TableEnd | Token::TableArrayEnd if expect_segment => {
                return Err(TomlError::SyntaxError(
                    "Must not have un-named implicit tables".to_string(),
                ))
            }
            Token::TableEnd | Token::TableArrayEnd => return Ok((path, i + 1)),
            _ => break,
        }
    }
    Err(TomlError::SyntaxError(
        "Table must contain at least a closing bracket".to_string(),
    ))
}

/// Take the body of a `[[path]]` element.
///
/// The body runs up to the next header that is not nested under `path`.
/// Nested headers (ex. `[path.sub]`) are kept and rewritten relative to the
/// element so that they land in it.
fn take_element_body(tokens: &mut VecDeque<Token>, path: &[String]) -> TomlResult<VecDeque<Token>> {
    let mut body = VecDeque::new();
    while let Some(token) = tokens.front() {
        let kind = token.kind();
        if !kind.is_header() {
            body.extend(tokens.pop_front());
            continue;
        }

        let (header, consumed) = header_path(tokens.iter().skip(1))?;
        if header.len() <= path.len() || !header.starts_with(path) {
            break;
        }
        tokens.drain(..=consumed);
        let (begin, end) = if kind == TokenKind::TableBegin {
            (Token::TableBegin, Token::TableEnd)
        } else {
            (Token::TableArrayBegin, Token::TableArrayEnd)
        };
        body.push_back(begin);
        for (i, segment) in header[path.len()..].iter().enumerate() {
            if i > 0 {
                body.push_back(Token::TableSep);
            }
            body.push_back(Token::Identifier(segment.clone()));
        }
        body.push_back(end);
    }
    Ok(body)
}

#[cfg(test)]
mod tests;
