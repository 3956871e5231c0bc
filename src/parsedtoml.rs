//////////
// Imports
//////////

// stdlib imports
use std::fmt::{self, Write};
// third-party imports
use chrono::{offset::FixedOffset, DateTime, NaiveDate, NaiveDateTime, NaiveTime};
// my imports
use crate::tomltypes::{TOMLTable, TOMLType, TableOps};

/// The Rust representation of the complete read-only TOML table.
///
/// Queries take the key path as segments, so `["site", "google.com"]` finds
/// the key written `site."google.com"`. A path that passes through an array
/// of tables continues into its most recent element.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTOML {
    table: TOMLTable,
}

impl From<TOMLTable> for ParsedTOML {
    fn from(table: TOMLTable) -> Self {
        Self { table }
    }
}

impl ParsedTOML {
    /// Retrieve a view into the value of a given key-value pair
    /// if it exists.
    pub fn get(&self, path: &[&str]) -> Option<&TOMLType> {
        self.table.lookup(path)
    }

    pub fn str(&self, path: &[&str]) -> Option<&str> {
        self.get(path).and_then(TOMLType::str)
    }

    pub fn i64(&self, path: &[&str]) -> Option<i64> {
        self.get(path).and_then(TOMLType::i64)
    }

    pub fn f64(&self, path: &[&str]) -> Option<f64> {
        self.get(path).and_then(TOMLType::f64)
    }

    pub fn bool(&self, path: &[&str]) -> Option<bool> {
        self.get(path).and_then(TOMLType::bool)
    }

    pub fn datetime(&self, path: &[&str]) -> Option<&DateTime<FixedOffset>> {
        self.get(path).and_then(TOMLType::datetime)
    }

    pub fn local_datetime(&self, path: &[&str]) -> Option<&NaiveDateTime> {
        self.get(path).and_then(TOMLType::local_datetime)
    }

    pub fn date(&self, path: &[&str]) -> Option<&NaiveDate> {
        self.get(path).and_then(TOMLType::date)
    }

    pub fn time(&self, path: &[&str]) -> Option<&NaiveTime> {
        self.get(path).and_then(TOMLType::time)
    }

    pub fn array(&self, path: &[&str]) -> Option<&Vec<TOMLType>> {
        self.get(path).and_then(TOMLType::array)
    }

    /// A table at `path`, or the most recent element of an array of tables.
    pub fn table(&self, path: &[&str]) -> Option<&TOMLTable> {
        match self.get(path)? {
            TOMLType::AoT(tables) => tables.last(),
            other => other.table(),
        }
    }

    /// Whether `path` holds a non-table value.
    pub fn has_key(&self, path: &[&str]) -> bool {
        self.table.has_key(path, false)
    }

    pub fn has_table(&self, path: &[&str]) -> bool {
        self.table.has_table(path)
    }

    /// The top-level table.
    pub fn tables(&self) -> &TOMLTable {
        &self.table
    }

    pub fn into_inner(self) -> TOMLTable {
        self.table
    }

    /// Write the document back out as TOML text.
    ///
    /// Parsing the output yields an equal document.
    pub fn to_toml(&self) -> String {
        TomlText(&self.table).to_string()
    }

    /// A function for recursively descending and printing the TOML table.
    /// Takes inspiration from the `tree` program.
    fn tree(&self) -> String {
        let mut outstr = ".".to_string();
        Self::tree_iter(&self.table, "", &mut outstr);
        outstr
    }

    fn tree_iter(table: &TOMLTable, indent: &str, outstr: &mut String) {
        const TERMINATING_CONNECTOR: &str = "└── ";
        const NONTERMINATING_CONNECTOR: &str = "├── ";
        const VERTICAL_EXTENDER: &str = "│";
        const SPACING: &str = "   "; // three spaces

        let mut entries = table.iter().peekable();
        while let Some((key, toml_val)) = entries.next() {
            let last = entries.peek().is_none();
            let (connector, extender) = if last {
                (TERMINATING_CONNECTOR, " ")
            } else {
                (NONTERMINATING_CONNECTOR, VERTICAL_EXTENDER)
            };
            let child_indent = format!("{indent}{extender}{SPACING}");
            outstr.push('\n');
            outstr.push_str(indent);
            outstr.push_str(connector);
            outstr.push_str(&format_key(key));

            match toml_val {
                TOMLType::HTable(t) | TOMLType::DKTable(t) | TOMLType::InlineTable(t) => {
                    Self::tree_iter(t, &child_indent, outstr)
                }
                TOMLType::AoT(tables) => {
                    let mut elements = tables.iter().enumerate().peekable();
                    while let Some((i, t)) = elements.next() {
                        let (connector, extender) = if elements.peek().is_none() {
                            (TERMINATING_CONNECTOR, " ")
                        } else {
                            (NONTERMINATING_CONNECTOR, VERTICAL_EXTENDER)
                        };
                        // infallible: writing to a String
                        let _ = write!(outstr, "\n{child_indent}{connector}[{i}]");
                        Self::tree_iter(t, &format!("{child_indent}{extender}{SPACING}"), outstr);
                    }
                }
                // If we reach here, there's a value that we're just labeling instead of expanding.
                value => {
                    let _ = write!(outstr, " = {}", TomlValue(value));
                }
            }
        }
    }
}

impl fmt::Display for ParsedTOML {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree())
    }
}

/////////////////
// Serialization
/////////////////

/// A table written out as a TOML document.
struct TomlText<'a>(&'a TOMLTable);

/// A single value written inline.
struct TomlValue<'a>(&'a TOMLType);

impl fmt::Display for TomlText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pairs(f, self.0, &mut Vec::new())?;
        write_sections(f, self.0, &mut Vec::new())
    }
}

/// Whether a table has lines of its own, as opposed to only sub-sections.
fn has_pairs(table: &TOMLTable) -> bool {
    table.is_empty()
        || table
            .values()
            .any(|v| !matches!(v, TOMLType::HTable(_) | TOMLType::AoT(_)))
}

/// `key = value` lines. Dotted-key tables are flattened into dotted keys.
fn write_pairs<'a>(
    f: &mut fmt::Formatter<'_>,
    table: &'a TOMLTable,
    prefix: &mut Vec<&'a str>,
) -> fmt::Result {
    for (key, value) in table {
        match value {
            TOMLType::HTable(_) | TOMLType::AoT(_) => (),
            TOMLType::DKTable(inner) => {
                prefix.push(key);
                write_pairs(f, inner, prefix)?;
                prefix.pop();
            }
            value => {
                for segment in prefix.iter() {
                    write!(f, "{}.", format_key(segment))?;
                }
                writeln!(f, "{} = {}", format_key(key), TomlValue(value))?;
            }
        }
    }
    Ok(())
}

/// `[table]` and `[[array]]` sections below `path`.
fn write_sections<'a>(
    f: &mut fmt::Formatter<'_>,
    table: &'a TOMLTable,
    path: &mut Vec<&'a str>,
) -> fmt::Result {
    for (key, value) in table {
        path.push(key);
        match value {
            TOMLType::HTable(inner) => {
                // tables holding only sub-sections are created implicitly by them
                if has_pairs(inner) {
                    writeln!(f, "\n[{}]", format_path(path))?;
                    write_pairs(f, inner, &mut Vec::new())?;
                }
                write_sections(f, inner, path)?;
            }
            TOMLType::DKTable(inner) => write_sections(f, inner, path)?,
            TOMLType::AoT(elements) => {
                for element in elements {
                    writeln!(f, "\n[[{}]]", format_path(path))?;
                    write_pairs(f, element, &mut Vec::new())?;
                    write_sections(f, element, path)?;
                }
            }
            _ => (),
        }
        path.pop();
    }
    Ok(())
}

impl fmt::Display for TomlValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            TOMLType::Str(s) => write_basic_string(f, s),
            TOMLType::Int(n) => write!(f, "{n}"),
            TOMLType::Float(n) if n.is_nan() => f.write_str("nan"),
            TOMLType::Float(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "inf" } else { "-inf" })
            }
            TOMLType::Float(n) => write!(f, "{n:?}"),
            TOMLType::Bool(b) => write!(f, "{b}"),
            TOMLType::TimeStamp(dt) => f.write_str(&dt.to_rfc3339()),
            TOMLType::NaiveDateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            TOMLType::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            TOMLType::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            TOMLType::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", TomlValue(value))?;
                }
                f.write_str("]")
            }
            TOMLType::HTable(t) | TOMLType::DKTable(t) | TOMLType::InlineTable(t) => {
                write_inline_table(f, t)
            }
            TOMLType::AoT(tables) => {
                f.write_str("[")?;
                for (i, table) in tables.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_inline_table(f, table)?;
                }
                f.write_str("]")
            }
        }
    }
}

fn write_inline_table(f: &mut fmt::Formatter<'_>, table: &TOMLTable) -> fmt::Result {
    if table.is_empty() {
        return f.write_str("{}");
    }
    f.write_str("{ ")?;
    let mut first = true;
    write_inline_pairs(f, table, &mut Vec::new(), &mut first)?;
    f.write_str(" }")
}

fn write_inline_pairs<'a>(
    f: &mut fmt::Formatter<'_>,
    table: &'a TOMLTable,
    prefix: &mut Vec<&'a str>,
    first: &mut bool,
) -> fmt::Result {
    for (key, value) in table {
        if let TOMLType::DKTable(inner) = value {
            prefix.push(key);
            write_inline_pairs(f, inner, prefix, first)?;
            prefix.pop();
            continue;
        }
        if !*first {
            f.write_str(", ")?;
        }
        *first = false;
        for segment in prefix.iter() {
            write!(f, "{}.", format_key(segment))?;
        }
        write!(f, "{} = {}", format_key(key), TomlValue(value))?;
    }
    Ok(())
}

fn write_basic_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\u{0008}' => f.write_str("\\b")?,
            '\t' => f.write_str("\\t")?,
            '\n' => f.write_str("\\n")?,
            '\u{000C}' => f.write_str("\\f")?,
            '\r' => f.write_str("\\r")?,
            c if c.is_control() => write!(f, "\\u{:04X}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

/// A key segment, quoted unless it is a valid bare key.
fn format_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        key.to_string()
    } else {
        let mut quoted = String::new();
        // infallible: writing to a String
        let _ = write!(quoted, "{}", TomlValue(&TOMLType::Str(key.to_string())));
        quoted
    }
}

fn format_path(path: &[&str]) -> String {
    path.iter()
        .map(|segment| format_key(segment))
        .collect::<Vec<_>>()
        .join(".")
}
