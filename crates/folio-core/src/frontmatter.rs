//! Frontmatter parsing for content files.
//!
//! A frontmatter block is split from the body, decoded into a format-neutral
//! [`Frontmatter`] field map, and individual fields are then converted with the
//! typed parsers ([`parse_written`], [`parse_topics`], [`parse_flag`]).

use std::{collections::BTreeMap, path::Path, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::error::{CoreError, Result};

/// Date format accepted by the `written` field.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

// chrono accepts unpadded month and day fields, so the shape is checked first.
static ISO_DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// A single frontmatter value, independent of the block format it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Native date value (TOML dates and date-times).
    Date(NaiveDate),
    List(Vec<FieldValue>),
    Table(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Human-readable type name used in parse errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::List(_) => "list",
            Self::Table(_) => "table",
        }
    }

    /// Text form of a scalar value; `None` for null, lists and tables.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Date(d) => Some(d.format(ISO_DATE_FORMAT).to_string()),
            Self::Null | Self::List(_) | Self::Table(_) => None,
        }
    }
}

impl From<serde_yaml::Value> for FieldValue {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::String(s),
            Value::Sequence(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Mapping(mapping) => Self::Table(
                mapping
                    .into_iter()
                    .filter_map(|(k, v)| yaml_key(&k).map(|k| (k, Self::from(v))))
                    .collect(),
            ),
            Value::Tagged(tagged) => Self::from(tagged.value),
        }
    }
}

impl From<toml::Value> for FieldValue {
    fn from(value: toml::Value) -> Self {
        use toml::Value;

        match value {
            Value::String(s) => Self::String(s),
            Value::Integer(i) => Self::Integer(i),
            Value::Float(f) => Self::Float(f),
            Value::Boolean(b) => Self::Bool(b),
            Value::Datetime(dt) => dt
                .date
                .and_then(|d| {
                    NaiveDate::from_ymd_opt(i32::from(d.year), u32::from(d.month), u32::from(d.day))
                })
                .map_or_else(|| Self::String(dt.to_string()), Self::Date),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Table(table) => {
                Self::Table(table.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// Mapping keys must be scalars; anything else is dropped.
fn yaml_key(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decoded frontmatter fields of one content file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    fields: BTreeMap<String, FieldValue>,
}

impl Frontmatter {
    /// Get a field value.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Check if a field is present.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the block had no fields (or there was no block).
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Insert a field, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    /// Ensure every listed field is present.
    pub fn require(&self, fields: &[String], path: &Path) -> Result<()> {
        match fields.iter().find(|f| !self.contains(f)) {
            Some(missing) => Err(CoreError::parse(
                path,
                format!("Missing required frontmatter field: {missing}"),
            )),
            None => Ok(()),
        }
    }
}

impl FromIterator<(String, FieldValue)> for Frontmatter {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Delimiter types for frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    /// YAML frontmatter delimited by `---`.
    Yaml,
    /// TOML frontmatter delimited by `+++`.
    Toml,
}

impl FrontmatterFormat {
    /// Get the delimiter string for this format.
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }

    /// Detect the format from the first line of the content.
    fn detect(content: &str) -> Option<Self> {
        let first_line = content.lines().next()?.trim_end();
        match first_line {
            "---" => Some(Self::Yaml),
            "+++" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Split content into frontmatter and body.
///
/// Both delimiters must sit on their own line. Returns `None` when the content
/// has no complete frontmatter block.
pub fn split_frontmatter(content: &str) -> Option<(FrontmatterFormat, &str, &str)> {
    let content = content.trim_start();
    let format = FrontmatterFormat::detect(content)?;
    let delimiter = format.delimiter();

    let first_line_end = content.find('\n')?;
    let rest = &content[first_line_end + 1..];

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == delimiter {
            let frontmatter = &rest[..offset];
            let body = rest[offset + line.len()..].trim_start();
            return Some((format, frontmatter, body));
        }
        offset += line.len();
    }

    None
}

/// Parse frontmatter from a string.
///
/// Content without a frontmatter block yields an empty field map and the full
/// content as body. An opened but unterminated block is an error.
pub fn parse_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let Some((format, fm_str, body)) = split_frontmatter(content) else {
        if FrontmatterFormat::detect(content.trim_start()).is_some() {
            return Err(CoreError::frontmatter(path, "unterminated frontmatter block"));
        }
        return Ok((Frontmatter::default(), content.to_string()));
    };

    let frontmatter = match format {
        FrontmatterFormat::Yaml => {
            let value: serde_yaml::Value = serde_yaml::from_str(fm_str)
                .map_err(|e| CoreError::frontmatter(path, e.to_string()))?;
            match FieldValue::from(value) {
                FieldValue::Null => Frontmatter::default(),
                FieldValue::Table(fields) => Frontmatter { fields },
                other => {
                    return Err(CoreError::frontmatter(
                        path,
                        format!(
                            "frontmatter did not parse as a mapping (found {})",
                            other.type_name()
                        ),
                    ));
                }
            }
        }
        FrontmatterFormat::Toml => {
            let table: toml::Table =
                toml::from_str(fm_str).map_err(|e| CoreError::frontmatter(path, e.to_string()))?;
            table
                .into_iter()
                .map(|(k, v)| (k, FieldValue::from(v)))
                .collect()
        }
    };

    Ok((frontmatter, body.to_string()))
}

/// Parse the `written` field: an ISO `YYYY-MM-DD` string or a native date.
pub fn parse_written(value: &FieldValue, path: &Path) -> Result<NaiveDate> {
    match value {
        FieldValue::String(s) => {
            let invalid = || {
                CoreError::parse(
                    path,
                    format!(
                        "Invalid date format in 'written' field: '{s}'. Expected ISO format 'YYYY-MM-DD'."
                    ),
                )
            };
            let text = s.trim();
            if !ISO_DATE_SHAPE.is_match(text) {
                return Err(invalid());
            }
            NaiveDate::parse_from_str(text, ISO_DATE_FORMAT).map_err(|_| invalid())
        }
        FieldValue::Date(d) => Ok(*d),
        other => Err(CoreError::parse(
            path,
            format!(
                "Invalid type for 'written' field: {}. Expected string (YYYY-MM-DD) or date.",
                other.type_name()
            ),
        )),
    }
}

/// Parse the `topics` field: a comma-separated string or a list of strings.
///
/// Entries are trimmed, empty entries dropped, and repeated entries collapsed
/// keeping the first occurrence.
pub fn parse_topics(value: &FieldValue, path: &Path) -> Result<Vec<String>> {
    let raw: Vec<String> = match value {
        FieldValue::String(s) => s.split(',').map(str::to_string).collect(),
        FieldValue::List(items) => items
            .iter()
            .map(|item| {
                item.as_text().ok_or_else(|| {
                    CoreError::parse(
                        path,
                        format!(
                            "Invalid entry in 'topics' field: {}. Expected string.",
                            item.type_name()
                        ),
                    )
                })
            })
            .collect::<Result<_>>()?,
        other => {
            return Err(CoreError::parse(
                path,
                format!(
                    "Invalid type for 'topics' field: {}. Expected string or list.",
                    other.type_name()
                ),
            ));
        }
    };

    let mut topics: Vec<String> = Vec::with_capacity(raw.len());
    for topic in raw {
        let topic = topic.trim();
        if !topic.is_empty() && !topics.iter().any(|t| t == topic) {
            topics.push(topic.to_string());
        }
    }
    Ok(topics)
}

/// Parse a boolean flag such as `disabled`.
pub fn parse_flag(value: &FieldValue, field: &str, path: &Path) -> Result<bool> {
    match value {
        FieldValue::Bool(b) => Ok(*b),
        FieldValue::Null => Ok(false),
        FieldValue::Integer(i) => Ok(*i != 0),
        FieldValue::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" | "" => Ok(false),
            _ => Err(CoreError::parse(
                path,
                format!("Invalid value for '{field}' field: '{s}'. Expected boolean."),
            )),
        },
        other => Err(CoreError::parse(
            path,
            format!(
                "Invalid type for '{field}' field: {}. Expected boolean.",
                other.type_name()
            ),
        )),
    }
}
