//! The declarative lexical grammar.
//!
//! Each [`Context`] owns an ordered list of [`Rule`]s. For a given context and
//! offset the first rule whose pattern matches wins and later rules are never
//! tried, so the order of every list below is part of the grammar.

//////////
// Imports
//////////

// stdlib imports
use std::collections::HashMap;
use std::sync::Mutex;
// third-party imports
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
// my imports
use crate::error::{TomlError, TomlResult};
use crate::strings::{decode_escapes, split_key, trim_leading_newline};
use crate::token::Token;

////////////
// Patterns
////////////

const BARE_KEY: &str = r"[A-Za-z0-9_-]+";
const BASIC_KEY: &str = r##""(?:[^"\\\x00-\x08\x0A-\x1F\x7F]|\\.)*""##;
const LITERAL_KEY: &str = r"'[^'\x00-\x08\x0A-\x1F\x7F]*'";

const BASIC_BODY: &str = r##"(?:[^"\\\x00-\x08\x0A-\x1F\x7F]|\\.)+"##;
const LITERAL_BODY: &str = r"[^'\x00-\x08\x0A-\x1F\x7F]+";
// Body and closing delimiter in one match so that up to two quotes may
// directly precede the delimiter.
const MULTILINE_BODY: &str = r##"(?:[^"\\\x00-\x08\x0B\x0C\x0E-\x1F\x7F]|\\(?s:.)|"{1,2}(?:[^"\\\x00-\x08\x0B\x0C\x0E-\x1F\x7F]|\\(?s:.)))*"{0,2}""""##;
const MULTILINE_LITERAL_BODY: &str =
    r"(?:[^'\x00-\x08\x0B\x0C\x0E-\x1F\x7F]|'{1,2}[^'\x00-\x08\x0B\x0C\x0E-\x1F\x7F])*'{0,2}'''";
const COMMENT_BODY: &str = r"[^\x00-\x08\x0A-\x1F\x7F]*";

const DATE: &str = r"[0-9]{4}-[0-9]{2}-[0-9]{2}";
const TIME: &str = r"[0-9]{2}:[0-9]{2}:[0-9]{2}";
const FRACTION: &str = r"\.[0-9]+";
const OFFSET: &str = r"(?:[Zz]|[+-][0-9]{2}:[0-9]{2})";

const DEC_INT: &str = r"[+-]?(?:0|[1-9](?:_?[0-9])*)";
const DIGITS: &str = r"[0-9](?:_?[0-9])*";

const TABLE_NAME_ERROR: &str = "Invalid table name declaration";

/////////////////
// Pattern cache
/////////////////

static PATTERN_CACHE: Lazy<Mutex<HashMap<String, Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Compile `pattern` anchored at the start of the haystack.
///
/// Compiled expressions are shared process-wide, one per distinct pattern.
pub fn compile(pattern: &str) -> Regex {
    // A poisoned lock still guards a valid map: entries are only ever inserted whole.
    let mut cache = PATTERN_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(regex) = cache.get(pattern) {
        return regex.clone();
    }
    // EXPECT justification: grammar patterns are fixed at compile time and every
    // one of them is compiled by the grammar tests.
    let regex = Regex::new(&format!("^(?:{pattern})")).expect("grammar pattern must compile");
    cache.insert(pattern.to_string(), regex.clone());
    regex
}

////////////
// Contexts
////////////

/// A lexical mode of the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    /// Keys, table headers and top-level dispatch.
    Root,
    /// Whatever may follow a complete key/value pair or header on its line.
    LineEnd,
    Comment,
    String,
    LiteralString,
    MultilineString,
    MultilineLiteralString,
    /// `[...]` header.
    TableName,
    /// `[[...]]` header.
    TableArray,
    /// Exactly one value after a key.
    Value,
    /// Expecting an element or the closing bracket.
    Array,
    /// Expecting a comma or the closing bracket.
    ArrayTail,
    /// Expecting a key or the closing brace.
    InlineTable,
    /// Expecting a comma or the closing brace.
    InlineTableTail,
}

impl Context {
    pub const ALL: [Context; 14] = [
        Self::Root,
        Self::LineEnd,
        Self::Comment,
        Self::String,
        Self::LiteralString,
        Self::MultilineString,
        Self::MultilineLiteralString,
        Self::TableName,
        Self::TableArray,
        Self::Value,
        Self::Array,
        Self::ArrayTail,
        Self::InlineTable,
        Self::InlineTableTail,
    ];

    /// Contexts that the end of input closes on its own.
    pub fn closes_at_eof(self) -> bool {
        matches!(self, Self::LineEnd | Self::Comment)
    }
}

/////////
// Rules
/////////

/// Turns the matched text into a token, no token, or a failure.
pub type Producer = fn(&str) -> TomlResult<Option<Token>>;

/// One pattern of a context along with its effect.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: String,
    regex: Regex,
    produce: Producer,
    push: Vec<Context>,
    pop: bool,
    multiline: bool,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, produce: Producer) -> Self {
        let pattern = pattern.into();
        let regex = compile(&pattern);
        Self {
            pattern,
            regex,
            produce,
            push: Vec::new(),
            pop: false,
            multiline: false,
        }
    }

    /// Contexts entered after a match, in order.
    fn pushing(mut self, contexts: &[Context]) -> Self {
        self.push.extend_from_slice(contexts);
        self
    }

    /// Leave the current context after a match.
    fn popping(mut self) -> Self {
        self.pop = true;
        self
    }

    /// Allow the match to run past the end of the current line.
    fn spanning_lines(mut self) -> Self {
        self.multiline = true;
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn push(&self) -> &[Context] {
        &self.push
    }

    pub fn pop(&self) -> bool {
        self.pop
    }

    pub fn multiline(&self) -> bool {
        self.multiline
    }

    /// The text matched at the very start of `haystack`, if any.
    pub fn find<'t>(&self, haystack: &'t str) -> Option<&'t str> {
        self.regex.find(haystack).map(|m| m.as_str())
    }

    pub fn produce(&self, matched: &str) -> TomlResult<Option<Token>> {
        (self.produce)(matched)
    }
}

///////////
// Grammar
///////////

/// The compiled grammar shared by every tokenizer.
pub static GRAMMAR: Lazy<Grammar> = Lazy::new(Grammar::new);

#[derive(Debug)]
pub struct Grammar {
    contexts: HashMap<Context, Vec<Rule>>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    pub fn new() -> Self {
        let contexts = Context::ALL
            .into_iter()
            .map(|context| (context, rules_for(context)))
            .collect();
        Self { contexts }
    }

    /// The ordered rules of `context`.
    pub fn rules(&self, context: Context) -> &[Rule] {
        self.contexts
            .get(&context)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn rules_for(context: Context) -> Vec<Rule> {
    match context {
        Context::Root => root_rules(),
        Context::LineEnd => line_end_rules(),
        Context::Comment => comment_rules(),
        Context::String => string_rules(),
        Context::LiteralString => literal_string_rules(),
        Context::MultilineString => multiline_string_rules(),
        Context::MultilineLiteralString => multiline_literal_string_rules(),
        Context::TableName => header_rules(false),
        Context::TableArray => header_rules(true),
        Context::Value => value_rules(&[]),
        Context::Array => array_rules(),
        Context::ArrayTail => array_tail_rules(),
        Context::InlineTable => inline_table_rules(),
        Context::InlineTableTail => inline_table_tail_rules(),
    }
}

fn skip(_: &str) -> TomlResult<Option<Token>> {
    Ok(None)
}

fn with(then: &[Context], last: Context) -> Vec<Context> {
    let mut contexts = then.to_vec();
    contexts.push(last);
    contexts
}

fn root_rules() -> Vec<Rule> {
    let mut rules = vec![
        Rule::new(r"[ \t\r\n]+", skip).spanning_lines(),
        Rule::new("#", skip).pushing(&[Context::Comment]),
    ];
    rules.extend(key_rules(false, &[Context::LineEnd, Context::Value]));
    rules.extend([
        // `[[` must be tried before `[`
        Rule::new(r"\[\[", |_| Ok(Some(Token::TableArrayBegin))).pushing(&[Context::TableArray]),
        Rule::new(r"\[", |_| Ok(Some(Token::TableBegin))).pushing(&[Context::TableName]),
    ]);
    rules
}

fn line_end_rules() -> Vec<Rule> {
    vec![
        Rule::new(r"[ \t]+", skip),
        Rule::new("#", skip).popping().pushing(&[Context::Comment]),
        Rule::new(r"\r?\n", skip).popping(),
    ]
}

fn comment_rules() -> Vec<Rule> {
    vec![Rule::new(COMMENT_BODY, |r| {
        Ok(Some(Token::Comment(r.trim().to_string())))
    })
    .popping()]
}

/// Key rules shared by the root and inline tables.
///
/// Quoted keys come before the bare key, and the dotted key before all of them.
fn key_rules(replace: bool, then: &[Context]) -> Vec<Rule> {
    let segment = format!("(?:{BARE_KEY}|{BASIC_KEY}|{LITERAL_KEY})");
    let patterns = [
        format!(r"{segment}(?:[ \t]*\.[ \t]*{segment})+[ \t]*="),
        format!(r"{BASIC_KEY}[ \t]*="),
        format!(r"{LITERAL_KEY}[ \t]*="),
        format!(r"{BARE_KEY}[ \t]*="),
    ];
    patterns
        .into_iter()
        .map(|pattern| {
            let rule = Rule::new(pattern, key).pushing(then);
            if replace {
                rule.popping()
            } else {
                rule
            }
        })
        .collect()
}

fn key(matched: &str) -> TomlResult<Option<Token>> {
    let raw = matched[..matched.len() - 1].trim();
    // validate the segments here so a bad escape is reported where it was written
    split_key(raw)?;
    Ok(Some(Token::Key(raw.to_string())))
}

fn string_rules() -> Vec<Rule> {
    vec![
        Rule::new("\"", skip).popping(),
        Rule::new(BASIC_BODY, |r| {
            Ok(Some(Token::Identifier(decode_escapes(r, false)?)))
        }),
    ]
}

fn literal_string_rules() -> Vec<Rule> {
    vec![
        Rule::new("'", skip).popping(),
        Rule::new(LITERAL_BODY, |r| Ok(Some(Token::Identifier(r.to_string())))),
    ]
}

fn multiline_string_rules() -> Vec<Rule> {
    vec![Rule::new(MULTILINE_BODY, |r| {
        let body = trim_leading_newline(&r[..r.len() - 3]);
        Ok(Some(Token::Identifier(decode_escapes(body, true)?)))
    })
    .popping()
    .spanning_lines()]
}

fn multiline_literal_string_rules() -> Vec<Rule> {
    vec![Rule::new(MULTILINE_LITERAL_BODY, |r| {
        let body = trim_leading_newline(&r[..r.len() - 3]);
        Ok(Some(Token::Identifier(body.to_string())))
    })
    .popping()
    .spanning_lines()]
}

fn header_rules(table_array: bool) -> Vec<Rule> {
    let mut rules = vec![
        Rule::new(r"[ \t]+", skip),
        Rule::new("\"\"", |_| Ok(Some(Token::Identifier(String::new())))),
        Rule::new("\"", skip).pushing(&[Context::String]),
        Rule::new("''", |_| Ok(Some(Token::Identifier(String::new())))),
        Rule::new("'", skip).pushing(&[Context::LiteralString]),
        Rule::new(r"\.", |_| Ok(Some(Token::TableSep))),
        // opening brackets and hashes are prohibited directly within a header
        Rule::new(r"\[", |_| Err(TomlError::SyntaxError(TABLE_NAME_ERROR.to_string()))),
        Rule::new("#", |_| Err(TomlError::SyntaxError(TABLE_NAME_ERROR.to_string()))),
        Rule::new(BARE_KEY, |r| Ok(Some(Token::Identifier(r.to_string())))),
    ];
    let close = if table_array {
        Rule::new(r"\]\]", |_| Ok(Some(Token::TableArrayEnd)))
    } else {
        Rule::new(r"\]", |_| Ok(Some(Token::TableEnd)))
    };
    rules.push(close.popping().pushing(&[Context::LineEnd]));
    rules
}

/// Rules for exactly one value.
///
/// Every rule but the blank one leaves the current context and enters `then`,
/// followed by the context of the construct it opened, if any.
fn value_rules(then: &[Context]) -> Vec<Rule> {
    let mut rules = vec![
        Rule::new(r"[ \t]+", skip),
        Rule::new(r"\[", |_| Ok(Some(Token::ArrayBegin)))
            .popping()
            .pushing(&with(then, Context::Array)),
        Rule::new(r"\{", |_| Ok(Some(Token::InlineTableBegin)))
            .popping()
            .pushing(&with(then, Context::InlineTable)),
    ];
    rules.extend(string_value_rules(then));
    let scalars = date_value_rules()
        .into_iter()
        .chain(special_float_value_rules())
        .chain(float_value_rules())
        .chain(integer_value_rules())
        .chain(boolean_value_rules());
    rules.extend(scalars.map(|rule| rule.popping().pushing(then)));
    rules
}

fn string_value_rules(then: &[Context]) -> Vec<Rule> {
    vec![
        // multi-line delimiters must come before the single-line ones
        Rule::new("\"\"\"", skip)
            .popping()
            .pushing(&with(then, Context::MultilineString)),
        Rule::new("'''", skip)
            .popping()
            .pushing(&with(then, Context::MultilineLiteralString)),
        // empty single-line strings
        Rule::new("\"\"", |_| Ok(Some(Token::Identifier(String::new()))))
            .popping()
            .pushing(then),
        Rule::new("''", |_| Ok(Some(Token::Identifier(String::new()))))
            .popping()
            .pushing(then),
        Rule::new("\"", skip)
            .popping()
            .pushing(&with(then, Context::String)),
        Rule::new("'", skip)
            .popping()
            .pushing(&with(then, Context::LiteralString)),
    ]
}

fn date_value_rules() -> Vec<Rule> {
    vec![
        // Offset Date-Time: RFC 3339 w/ fractional seconds
        Rule::new(format!("{DATE}[Tt ]{TIME}{FRACTION}{OFFSET}"), |r| {
            offset_datetime(r, "####-##-##T##:##:##.###+/-##:##")
        }),
        // Offset Date-Time: RFC 3339 w/o fractional seconds
        Rule::new(format!("{DATE}[Tt ]{TIME}{OFFSET}"), |r| {
            offset_datetime(r, "####-##-##T##:##:##+/-##:##")
        }),
        Rule::new(format!("{DATE}[Tt ]{TIME}{FRACTION}"), |r| {
            local_datetime(r, "####-##-##T##:##:##.###")
        }),
        Rule::new(format!("{DATE}[Tt ]{TIME}"), |r| {
            local_datetime(r, "####-##-##T##:##:##")
        }),
        Rule::new(format!("{TIME}{FRACTION}"), |r| local_time(r, "##:##:##.###")),
        Rule::new(TIME, |r| local_time(r, "##:##:##")),
        Rule::new(DATE, local_date),
    ]
}

fn special_float_value_rules() -> Vec<Rule> {
    vec![
        Rule::new(r"\+?inf", |_| Ok(Some(Token::DoubleNumber(f64::INFINITY)))),
        Rule::new("-inf", |_| Ok(Some(Token::DoubleNumber(f64::NEG_INFINITY)))),
        Rule::new("[+-]?nan", |_| Ok(Some(Token::DoubleNumber(f64::NAN)))),
    ]
}

fn float_value_rules() -> Vec<Rule> {
    vec![
        // with exponent
        Rule::new(format!(r"{DEC_INT}(?:\.{DIGITS})?[eE][+-]?{DIGITS}"), float),
        // without exponent
        Rule::new(format!(r"{DEC_INT}\.{DIGITS}"), float),
    ]
}

fn integer_value_rules() -> Vec<Rule> {
    vec![
        Rule::new("0x[0-9A-Fa-f](?:_?[0-9A-Fa-f])*", |r| {
            radix_integer(r, 16, "hexadecimal")
        }),
        Rule::new("0o[0-7](?:_?[0-7])*", |r| radix_integer(r, 8, "octal")),
        Rule::new("0b[01](?:_?[01])*", |r| radix_integer(r, 2, "binary")),
        Rule::new(DEC_INT, |r| {
            r.replace('_', "")
                .parse::<i64>()
                .map(|n| Some(Token::IntegerNumber(n)))
                .map_err(|_| TomlError::InvalidNumberFormat(format!("Invalid integer: {r}")))
        }),
    ]
}

fn boolean_value_rules() -> Vec<Rule> {
    vec![
        Rule::new("true", |_| Ok(Some(Token::Boolean(true)))),
        Rule::new("false", |_| Ok(Some(Token::Boolean(false)))),
    ]
}

fn array_rules() -> Vec<Rule> {
    let mut rules = vec![
        Rule::new(r"[ \t\r\n]+", skip).spanning_lines(),
        Rule::new("#", skip).pushing(&[Context::Comment]),
        Rule::new(r"\]", |_| Ok(Some(Token::ArrayEnd))).popping(),
    ];
    // an element hands over to the tail so a comma is required before the next one
    rules.extend(value_rules(&[Context::ArrayTail]));
    rules
}

fn array_tail_rules() -> Vec<Rule> {
    vec![
        Rule::new(r"[ \t\r\n]+", skip).spanning_lines(),
        Rule::new("#", skip).pushing(&[Context::Comment]),
        Rule::new(",", skip).popping().pushing(&[Context::Array]),
        Rule::new(r"\]", |_| Ok(Some(Token::ArrayEnd))).popping(),
    ]
}

fn inline_table_rules() -> Vec<Rule> {
    let mut rules = vec![
        Rule::new(r"[ \t]+", skip),
        Rule::new(r"\}", |_| Ok(Some(Token::InlineTableEnd))).popping(),
    ];
    rules.extend(key_rules(
        true,
        &[Context::InlineTableTail, Context::Value],
    ));
    rules
}

fn inline_table_tail_rules() -> Vec<Rule> {
    vec![
        Rule::new(r"[ \t]+", skip),
        Rule::new(",", skip).popping().pushing(&[Context::InlineTable]),
        Rule::new(r"\}", |_| Ok(Some(Token::InlineTableEnd))).popping(),
    ]
}

/////////////
// Producers
/////////////

fn float(text: &str) -> TomlResult<Option<Token>> {
    text.replace('_', "")
        .parse::<f64>()
        .map(|n| Some(Token::DoubleNumber(n)))
        .map_err(|_| TomlError::InvalidNumberFormat(format!("Invalid float: {text}")))
}

fn radix_integer(text: &str, radix: u32, name: &str) -> TomlResult<Option<Token>> {
    let digits = text[2..].replace('_', "");
    i64::from_str_radix(&digits, radix)
        .map(|n| Some(Token::IntegerNumber(n)))
        .map_err(|_| TomlError::InvalidNumberFormat(format!("Invalid {name}: {text}")))
}

/// Rewrite the date/time separator and offset designator in RFC 3339 form.
fn normalize_datetime(text: &str) -> String {
    // the date part is always ten ASCII digits and dashes
    format!("{}T{}", &text[..10], &text[11..]).replace('z', "Z")
}

fn offset_datetime(text: &str, expected: &str) -> TomlResult<Option<Token>> {
    DateTime::parse_from_rfc3339(&normalize_datetime(text))
        .map(|dt| Some(Token::DateTime(dt)))
        .map_err(|_| TomlError::InvalidDateFormat(format!("{expected} ({text})")))
}

fn local_datetime(text: &str, expected: &str) -> TomlResult<Option<Token>> {
    NaiveDateTime::parse_from_str(&normalize_datetime(text), "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| Some(Token::LocalDateTime(dt)))
        .map_err(|_| TomlError::InvalidDateFormat(format!("{expected} ({text})")))
}

fn local_time(text: &str, expected: &str) -> TomlResult<Option<Token>> {
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .map(|t| Some(Token::LocalTime(t)))
        .map_err(|_| TomlError::InvalidDateFormat(format!("{expected} ({text})")))
}

fn local_date(text: &str) -> TomlResult<Option<Token>> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|d| Some(Token::LocalDate(d)))
        .map_err(|_| TomlError::InvalidDateFormat(format!("####-##-## ({text})")))
}
