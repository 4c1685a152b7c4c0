//! Splits documents into YAML front matter and a markdown body, and
//! normalizes the front matter fields the rest of the pipeline depends on.
//!
//! Front matter is optional and never fatal: a document that doesn't begin
//! with the `---` fence, lacks the closing fence, or carries YAML that doesn't
//! parse is treated as having no metadata at all. The one fatal condition is a
//! `date` string that isn't a calendar date (see [`normalize_date`]).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_yaml::{Mapping, Value};

/// The marker opening and closing the front matter block.
pub const FENCE: &str = "---";

/// The raw value of a `date` field, classified by shape.
#[derive(Clone, Debug, PartialEq)]
pub enum DateValue {
    /// A date string, optionally followed by a `T` and a time component.
    Text(String),

    /// A full timestamp carrying a UTC offset.
    Zoned(DateTime<FixedOffset>),

    /// A full timestamp without an offset.
    Naive(NaiveDateTime),

    /// Absent, null, or any other YAML type.
    Other,
}

impl From<Option<&Value>> for DateValue {
    fn from(value: Option<&Value>) -> DateValue {
        match value {
            Some(Value::String(s)) => classify_date_string(s),
            _ => DateValue::Other,
        }
    }
}

// YAML timestamps written with a space separator (`2025-06-01 10:30:00+02:00`)
// are structured timestamps; everything else stays a date string.
fn classify_date_string(s: &str) -> DateValue {
    const ZONED: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f %:z"];
    const NAIVE: &str = "%Y-%m-%d %H:%M:%S%.f";

    let s = s.trim();
    if !s.contains(' ') {
        return DateValue::Text(s.to_owned());
    }
    let zulu = s.strip_suffix('Z').map(|rest| format!("{}+00:00", rest));
    let candidate = zulu.as_deref().unwrap_or(s);
    for format in ZONED {
        if let Ok(dt) = DateTime::parse_from_str(candidate, format) {
            return DateValue::Zoned(dt);
        }
    }
    match NaiveDateTime::parse_from_str(s, NAIVE) {
        Ok(dt) => DateValue::Naive(dt),
        Err(_) => DateValue::Text(s.to_owned()),
    }
}

/// Normalizes a [`DateValue`] into a timezone-naive timestamp. Time zones are
/// stripped, never converted. Absent or unrecognized values fall back to
/// `now`, the build timestamp.
pub fn normalize_date(value: &DateValue, now: NaiveDateTime) -> Result<NaiveDateTime, Error> {
    match value {
        DateValue::Text(s) => {
            let date = s.split('T').next().unwrap_or_default();
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(|date| date.and_time(NaiveTime::MIN))
                .map_err(|source| Error::MalformedDate {
                    value: s.clone(),
                    source,
                })
        }
        DateValue::Zoned(dt) => Ok(dt.naive_local()),
        DateValue::Naive(dt) => Ok(*dt),
        DateValue::Other => Ok(now),
    }
}

/// Renders a timestamp as it's displayed on pages, e.g. `June 01, 2025`.
pub fn display_date(date: &NaiveDateTime) -> String {
    date.format("%B %d, %Y").to_string()
}

/// The recognized front matter fields before defaults are applied.
#[derive(Clone, Debug, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: DateValue,
    pub tags: Vec<String>,
    pub draft: Option<bool>,
}

impl Default for FrontMatter {
    fn default() -> Self {
        FrontMatter {
            title: None,
            author: None,
            date: DateValue::Other,
            tags: Vec::new(),
            draft: None,
        }
    }
}

impl From<&Mapping> for FrontMatter {
    fn from(m: &Mapping) -> FrontMatter {
        FrontMatter {
            title: m.get("title").and_then(scalar_to_string),
            author: m.get("author").and_then(scalar_to_string),
            date: DateValue::from(m.get("date")),
            tags: match m.get("tags") {
                Some(Value::Sequence(tags)) => tags.iter().filter_map(scalar_to_string).collect(),
                Some(tag) => scalar_to_string(tag).into_iter().collect(),
                None => Vec::new(),
            },
            draft: m.get("draft").and_then(Value::as_bool),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Field defaults applied when front matter omits a field.
pub struct Defaults<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub now: NaiveDateTime,
}

/// Front matter with every default applied.
#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub author: String,
    pub date: NaiveDateTime,
    pub tags: Vec<String>,
    pub draft: bool,
}

impl FrontMatter {
    pub fn into_metadata(self, defaults: &Defaults) -> Result<Metadata, Error> {
        Ok(Metadata {
            date: normalize_date(&self.date, defaults.now)?,
            title: self.title.unwrap_or_else(|| defaults.title.to_owned()),
            author: self.author.unwrap_or_else(|| defaults.author.to_owned()),
            tags: self.tags,
            draft: self.draft.unwrap_or(false),
        })
    }
}

/// A document split into front matter and body.
#[derive(Debug, PartialEq)]
pub struct Document<'a> {
    pub front_matter: FrontMatter,
    pub body: &'a str,
}

/// Splits `input` on the first two occurrences of [`FENCE`]. The text between
/// them is parsed as YAML; the remainder, trimmed, is the body. This never
/// fails: without both fences, or with YAML that doesn't parse, the front
/// matter is empty and all of `input` is the body.
pub fn extract(input: &str) -> Document<'_> {
    let no_metadata = Document {
        front_matter: FrontMatter::default(),
        body: input,
    };

    let (yaml, body) = match fence_indices(input) {
        None => return no_metadata,
        Some((yaml_start, yaml_stop, body_start)) => {
            (&input[yaml_start..yaml_stop], input[body_start..].trim())
        }
    };

    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(m)) => Document {
            front_matter: FrontMatter::from(&m),
            body,
        },
        Ok(_) => Document {
            front_matter: FrontMatter::default(),
            body,
        },
        Err(e) => {
            log::warn!("ignoring malformed front matter: {}", e);
            no_metadata
        }
    }
}

fn fence_indices(input: &str) -> Option<(usize, usize, usize)> {
    if !input.starts_with(FENCE) {
        return None;
    }
    input[FENCE.len()..].find(FENCE).map(|offset| {
        (
            FENCE.len(),                        // yaml_start
            FENCE.len() + offset,               // yaml_stop
            FENCE.len() + offset + FENCE.len(), // body_start
        )
    })
}

/// Represents an error normalizing front matter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a `date` string isn't `YYYY-MM-DD` once any time
    /// component is removed.
    #[error("malformed date `{value}`, expected YYYY-MM-DD")]
    MalformedDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_extract() {
        let doc = extract("---\ntitle: Hello\ntags: [fpga, 486]\ndraft: true\n---\n\n# Body\n");
        assert_eq!(Some("Hello".to_owned()), doc.front_matter.title);
        assert_eq!(vec!["fpga", "486"], doc.front_matter.tags);
        assert_eq!(Some(true), doc.front_matter.draft);
        assert_eq!("# Body", doc.body);
    }

    #[test]
    fn test_extract_without_front_matter() {
        let input = "Just text.\n\n---\nnot: yaml\n---\n";
        let doc = extract(input);
        assert_eq!(FrontMatter::default(), doc.front_matter);
        assert_eq!(input, doc.body);
    }

    #[test]
    fn test_extract_missing_end_fence() {
        let input = "---\ntitle: Hello\n\nbody";
        let doc = extract(input);
        assert_eq!(FrontMatter::default(), doc.front_matter);
        assert_eq!(input, doc.body);
    }

    #[test]
    fn test_extract_malformed_yaml() {
        let input = "---\ntitle: [unclosed\n---\nbody";
        let doc = extract(input);
        assert_eq!(FrontMatter::default(), doc.front_matter);
        assert_eq!(input, doc.body);
    }

    #[test]
    fn test_defaults() -> Result<(), Error> {
        let meta = extract("no front matter").front_matter.into_metadata(&Defaults {
            title: "my-slug",
            author: "nand2mario",
            now: now(),
        })?;
        assert_eq!(
            Metadata {
                title: "my-slug".into(),
                author: "nand2mario".into(),
                date: now(),
                tags: Vec::new(),
                draft: false,
            },
            meta
        );
        Ok(())
    }

    #[test]
    fn test_normalize_date_string() -> Result<(), Error> {
        let text = |s: &str| DateValue::Text(s.into());
        assert_eq!(midnight(2025, 6, 1), normalize_date(&text("2025-06-01"), now())?);
        assert_eq!(
            midnight(2025, 6, 1),
            normalize_date(&text("2025-06-01T10:20:30+08:00"), now())?
        );
        Ok(())
    }

    #[test]
    fn test_normalize_date_malformed() {
        let result = normalize_date(&DateValue::Text("June 1st".into()), now());
        assert!(matches!(result, Err(Error::MalformedDate { .. })));
    }

    #[test]
    fn test_normalize_date_strips_zone() -> Result<(), Error> {
        let value = DateValue::from(Some(&Value::String("2025-06-01 23:30:00+09:00".into())));
        let expected = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(23, 30, 0)
            .unwrap();
        assert!(matches!(value, DateValue::Zoned(_)));
        assert_eq!(expected, normalize_date(&value, now())?);
        Ok(())
    }

    #[test]
    fn test_normalize_date_naive_timestamp() -> Result<(), Error> {
        let value = DateValue::from(Some(&Value::String("2025-06-01 08:00:00".into())));
        assert!(matches!(value, DateValue::Naive(_)));
        assert_eq!(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            normalize_date(&value, now())?
        );
        Ok(())
    }

    #[test]
    fn test_normalize_date_fallback() -> Result<(), Error> {
        assert_eq!(now(), normalize_date(&DateValue::Other, now())?);
        let number = Value::Number(2025.into());
        assert_eq!(now(), normalize_date(&DateValue::from(Some(&number)), now())?);
        Ok(())
    }

    #[test]
    fn test_display_date() {
        assert_eq!("June 01, 2025", display_date(&midnight(2025, 6, 1)));
    }
}
