//////////
// Imports
//////////

// stdlib imports
use std::collections::BTreeMap;
// third-party imports
use chrono::{offset::FixedOffset, DateTime, NaiveDate, NaiveDateTime, NaiveTime};
// my imports
use crate::error::{describe_path, TomlError, TomlResult};
use crate::token::Token;

/////////////////
// Implementation
/////////////////

/// Alias for the table type.
pub type TOMLTable = BTreeMap<String, TOMLType>;

/// The Rust representation of TOML value types.
#[derive(Debug, Clone, PartialEq)]
pub enum TOMLType {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    // Dates
    /// Offset date-time
    TimeStamp(DateTime<FixedOffset>),
    NaiveDateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    // Collections
    Array(Vec<Self>),
    /// Table defined via table header syntax `[table]`, or implicitly by one
    /// (ex. `[a.b]` creates `a`)
    HTable(TOMLTable),
    /// Table defined via dotted key (ex. `apple.color = "red"`)
    DKTable(TOMLTable),
    // Needed because InlineTables are to be self-contained and non-modifiable after definition
    InlineTable(TOMLTable),
    /// Array of Tables
    AoT(Vec<TOMLTable>),
}

impl TOMLType {
    /// Name of the value kind, as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::TimeStamp(_) => "offset date-time",
            Self::NaiveDateTime(_) => "local date-time",
            Self::Date(_) => "local date",
            Self::Time(_) => "local time",
            Self::Array(_) => "array",
            Self::HTable(_) | Self::DKTable(_) | Self::InlineTable(_) => "table",
            Self::AoT(_) => "array of tables",
        }
    }

    /// Gets a reference to the underlying string
    pub fn str(&self) -> Option<&str> {
        if let Self::Str(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    pub fn i64(&self) -> Option<i64> {
        if let Self::Int(n) = *self {
            Some(n)
        } else {
            None
        }
    }

    pub fn f64(&self) -> Option<f64> {
        if let Self::Float(n) = *self {
            Some(n)
        } else {
            None
        }
    }

    pub fn bool(&self) -> Option<bool> {
        if let Self::Bool(b) = *self {
            Some(b)
        } else {
            None
        }
    }

    pub fn datetime(&self) -> Option<&DateTime<FixedOffset>> {
        if let Self::TimeStamp(dt) = self {
            Some(dt)
        } else {
            None
        }
    }

    pub fn local_datetime(&self) -> Option<&NaiveDateTime> {
        if let Self::NaiveDateTime(dt) = self {
            Some(dt)
        } else {
            None
        }
    }

    pub fn date(&self) -> Option<&NaiveDate> {
        if let Self::Date(d) = self {
            Some(d)
        } else {
            None
        }
    }

    pub fn time(&self) -> Option<&NaiveTime> {
        if let Self::Time(t) = self {
            Some(t)
        } else {
            None
        }
    }

    pub fn array(&self) -> Option<&Vec<Self>> {
        if let Self::Array(arr) = self {
            Some(arr)
        } else {
            None
        }
    }

    /// Any table, however it was defined.
    pub fn table(&self) -> Option<&TOMLTable> {
        match self {
            Self::HTable(t) | Self::DKTable(t) | Self::InlineTable(t) => Some(t),
            _ => None,
        }
    }

    pub fn aot(&self) -> Option<&Vec<TOMLTable>> {
        if let Self::AoT(tables) = self {
            Some(tables)
        } else {
            None
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Self::HTable(_) | Self::DKTable(_) | Self::InlineTable(_))
    }

    /// The table a key path continues into when reading.
    ///
    /// An array of tables resolves to its most recent element.
    fn readable_table(&self) -> Option<&TOMLTable> {
        match self {
            Self::AoT(tables) => tables.last(),
            other => other.table(),
        }
    }

    /// The table a key path continues into when writing.
    ///
    /// Inline tables are sealed and never hand out their contents.
    fn writable_table(&mut self) -> Option<&mut TOMLTable> {
        match self {
            Self::HTable(t) | Self::DKTable(t) => Some(t),
            Self::AoT(tables) => tables.last_mut(),
            _ => None,
        }
    }
}

impl TryFrom<Token> for TOMLType {
    type Error = TomlError;

    /// Convert a scalar token into its value.
    fn try_from(token: Token) -> Result<Self, Self::Error> {
        let value = match token {
            Token::Identifier(s) => Self::Str(s),
            Token::IntegerNumber(n) => Self::Int(n),
            Token::DoubleNumber(n) => Self::Float(n),
            Token::Boolean(b) => Self::Bool(b),
            Token::DateTime(dt) => Self::TimeStamp(dt),
            Token::LocalDate(d) => Self::Date(d),
            Token::LocalTime(t) => Self::Time(t),
            Token::LocalDateTime(dt) => Self::NaiveDateTime(dt),
            other => {
                return Err(TomlError::SyntaxError(format!(
                    "Expected a value, found {:?}",
                    other.kind()
                )))
            }
        };
        Ok(value)
    }
}

/// Key-path operations on a table.
///
/// A path is a sequence of key segments, outermost first. Segments are opaque:
/// `["site", "google.com"]` addresses one key named `google.com`.
///
/// Ex.
/// ```
/// use tomlctx::{TableOps, TOMLTable, TOMLType};
/// let mut table = TOMLTable::new();
/// table.set(&["my_table", "is_dotted"], TOMLType::Bool(true)).unwrap();
/// assert_eq!(Some(true), table.lookup(&["my_table", "is_dotted"]).and_then(TOMLType::bool));
/// assert!(table.has_table(&["my_table"]));
/// ```
pub trait TableOps {
    /// The value at `path`, descending through the last element of any array
    /// of tables on the way.
    fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&TOMLType>;

    /// Mutable counterpart of [`TableOps::lookup`].
    fn lookup_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut TOMLType>;

    /// Whether `path` holds a value. Tables only count when `include_tables`
    /// is set.
    fn has_key<S: AsRef<str>>(&self, path: &[S], include_tables: bool) -> bool;

    fn has_table<S: AsRef<str>>(&self, path: &[S]) -> bool;

    /// Make sure a table exists at `path`, creating every missing table with
    /// `make`. A table (or array of tables) already there is left untouched.
    fn set_table<S: AsRef<str>>(
        &mut self,
        path: &[S],
        make: fn(TOMLTable) -> TOMLType,
    ) -> TomlResult<()>;

    /// Store `value` at `path`, replacing what was there.
    ///
    /// Missing ancestors are created as dotted-key tables. An ancestor that is
    /// not a table, or is an inline table, is an error.
    fn set<S: AsRef<str>>(&mut self, path: &[S], value: TOMLType) -> TomlResult<()>;
}

impl TableOps for TOMLTable {
    fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&TOMLType> {
        let (last, parents) = path.split_last()?;
        let mut table = self;
        for key in parents {
            table = table.get(key.as_ref())?.readable_table()?;
        }
        table.get(last.as_ref())
    }

    fn lookup_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut TOMLType> {
        let (last, parents) = path.split_last()?;
        let mut table = self;
        for key in parents {
            table = match table.get_mut(key.as_ref())? {
                TOMLType::HTable(t) | TOMLType::DKTable(t) | TOMLType::InlineTable(t) => t,
                TOMLType::AoT(tables) => tables.last_mut()?,
                _ => return None,
            };
        }
        table.get_mut(last.as_ref())
    }

    fn has_key<S: AsRef<str>>(&self, path: &[S], include_tables: bool) -> bool {
        self.lookup(path)
            .is_some_and(|value| include_tables || !value.is_table())
    }

    fn has_table<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.lookup(path).is_some_and(TOMLType::is_table)
    }

    fn set_table<S: AsRef<str>>(
        &mut self,
        path: &[S],
        make: fn(TOMLTable) -> TOMLType,
    ) -> TomlResult<()> {
        let mut table = self;
        for (depth, key) in path.iter().enumerate() {
            let key = key.as_ref();
            let entry = table
                .entry(key.to_string())
                .or_insert_with(|| make(TOMLTable::new()));
            table = entry
                .writable_table()
                .ok_or_else(|| TomlError::DuplicateKey(describe_path(&path[..=depth])))?;
        }
        Ok(())
    }

    fn set<S: AsRef<str>>(&mut self, path: &[S], value: TOMLType) -> TomlResult<()> {
        let Some((last, parents)) = path.split_last() else {
            return Err(TomlError::SyntaxError("Empty key path".to_string()));
        };
        let mut table = self;
        for (depth, key) in parents.iter().enumerate() {
            let entry = table
                .entry(key.as_ref().to_string())
                .or_insert_with(|| TOMLType::DKTable(TOMLTable::new()));
            table = entry
                .writable_table()
                .ok_or_else(|| TomlError::DuplicateKey(describe_path(&path[..=depth])))?;
        }
        table.insert(last.as_ref().to_string(), value);
        Ok(())
    }
}
