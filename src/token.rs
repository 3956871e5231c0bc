//////////
// Imports
//////////

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

/////////////////
// Implementation
/////////////////

/// A lexical token produced by the tokenizer.
///
/// Structural markers carry no payload; scalar tokens carry exactly one
/// decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A string scalar, or one segment of a table header.
    Identifier(String),
    /// A key as written in the source, quotes included (ex. `a."b.c"`).
    Key(String),
    IntegerNumber(i64),
    DoubleNumber(f64),
    Boolean(bool),
    // Dates
    DateTime(DateTime<FixedOffset>),
    LocalDate(NaiveDate),
    LocalTime(NaiveTime),
    LocalDateTime(NaiveDateTime),
    // Structure
    ArrayBegin,
    ArrayEnd,
    TableArrayBegin,
    TableArrayEnd,
    InlineTableBegin,
    InlineTableEnd,
    TableBegin,
    TableSep,
    TableEnd,
    Comment(String),
}

/// The payload-free discriminant of a [`Token`].
///
/// Two tokens of the same kind compare equal here regardless of payload;
/// this is only used for dispatch and diagnostics, never as value equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Key,
    IntegerNumber,
    DoubleNumber,
    Boolean,
    DateTime,
    LocalDate,
    LocalTime,
    LocalDateTime,
    ArrayBegin,
    ArrayEnd,
    TableArrayBegin,
    TableArrayEnd,
    InlineTableBegin,
    InlineTableEnd,
    TableBegin,
    TableSep,
    TableEnd,
    Comment,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Identifier(_) => TokenKind::Identifier,
            Self::Key(_) => TokenKind::Key,
            Self::IntegerNumber(_) => TokenKind::IntegerNumber,
            Self::DoubleNumber(_) => TokenKind::DoubleNumber,
            Self::Boolean(_) => TokenKind::Boolean,
            Self::DateTime(_) => TokenKind::DateTime,
            Self::LocalDate(_) => TokenKind::LocalDate,
            Self::LocalTime(_) => TokenKind::LocalTime,
            Self::LocalDateTime(_) => TokenKind::LocalDateTime,
            Self::ArrayBegin => TokenKind::ArrayBegin,
            Self::ArrayEnd => TokenKind::ArrayEnd,
            Self::TableArrayBegin => TokenKind::TableArrayBegin,
            Self::TableArrayEnd => TokenKind::TableArrayEnd,
            Self::InlineTableBegin => TokenKind::InlineTableBegin,
            Self::InlineTableEnd => TokenKind::InlineTableEnd,
            Self::TableBegin => TokenKind::TableBegin,
            Self::TableSep => TokenKind::TableSep,
            Self::TableEnd => TokenKind::TableEnd,
            Self::Comment(_) => TokenKind::Comment,
        }
    }
}

impl TokenKind {
    /// True for tokens that carry a scalar value.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::Identifier
                | Self::IntegerNumber
                | Self::DoubleNumber
                | Self::Boolean
                | Self::DateTime
                | Self::LocalDate
                | Self::LocalTime
                | Self::LocalDateTime
        )
    }

    /// True for the tokens that open a table header.
    pub fn is_header(self) -> bool {
        matches!(self, Self::TableBegin | Self::TableArrayBegin)
    }
}
