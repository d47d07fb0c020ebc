//! Structured-text decoder.
//!
//! The extraction prompt asks the model for a brace-free answer: `field: value`
//! lines, with lists written as numbered or bulleted items. Models follow that
//! loosely, so decoding happens in two passes:
//!
//! 1. [`decode_loose`] reads the answer line by line into a loose JSON object
//!    (scalars, lists of strings, lists of small objects). It never fails;
//!    lines it cannot place are skipped.
//! 2. [`into_record`] maps that object onto a typed [`ResumeRecord`],
//!    tolerating key aliases, placeholder values and mixed item shapes.
//!
//! Line rules for pass 1:
//! - An unindented `key: value` line sets a scalar. An empty value (or `-`)
//!   opens a list under `key`.
//! - Headings open lists too: `## Education`, a line wrapped in emphasis
//!   (`**Work Experience**`), or a bare line naming a list field (`Education`).
//! - `-`, `*`, `•`, `1.` and `1)` start a list item under the latest key.
//!   Items whose text begins with a known entry key (`company: Acme, ...`)
//!   become objects; anything else stays a plain string. Items never replace
//!   a scalar unless the key names a list field.
//! - Lines indented deeper than the open item continue it: `key: value`
//!   lines add pairs, nested bullets and wrapped prose extend the last value.
//! - A pair separator is a colon followed by whitespace or the end of the
//!   line, so URLs and times (`10:30`) stay intact.
//! - Emphasis (`**`, `__`, backticks) is only stripped when it wraps a token;
//!   `a__b__c` inside a URL is left alone.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::resume::{Certification, Education, Interest, ResumeRecord, WorkExperience};

/// `key: value` at the start of a segment. Keys are at most three words.
static PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_]*(?: [A-Za-z0-9_]+){0,2})\s*:(?:\s+(.*))?$")
        .expect("pair pattern is valid")
});

/// A bare key, as used by markdown headings.
static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9_]*(?: [A-Za-z0-9_]+){0,2})\s*:?$")
        .expect("bare key pattern is valid")
});

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•]\s*|\d+[.)](?:\s+|$))(.*)$").expect("list item pattern is valid")
});

/// Paired emphasis markers. Whether they wrap a whole token is checked separately.
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*([^*]+?)\*\*|__([^_]+?)__|`([^`]+)`").expect("emphasis pattern is valid")
});

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("integer pattern is valid"));

/// Keys that mark an item as a structured entry rather than free text.
const ITEM_KEYS: &[&str] = &[
    "interest",
    "description",
    "details",
    "company",
    "employer",
    "organization",
    "position",
    "title",
    "role",
    "job_title",
    "start_date",
    "end_date",
    "dates",
    "duration",
    "school",
    "institution",
    "university",
    "college",
    "degree",
    "field_of_study",
    "field",
    "major",
    "graduation_year",
    "year",
    "name",
    "certification",
    "issuer",
    "date_earned",
    "date",
    "url",
];

const PLACEHOLDERS: &[&str] = &[
    "",
    "-",
    "n/a",
    "na",
    "none",
    "null",
    "nil",
    "unknown",
    "not provided",
    "not specified",
    "not available",
    "not mentioned",
];

/// Key an item's leading free text is stored under once it gains pairs.
const TEXT_KEY: &str = "text";

// Accepted spellings of each record field, first match wins.
const NAME_KEYS: &[&str] = &["name", "full_name"];
const AGE_KEYS: &[&str] = &["age"];
const LOCATION_KEYS: &[&str] = &["location", "address", "city"];
const EMAIL_KEYS: &[&str] = &["email", "email_address", "contact_email"];
const PHONE_KEYS: &[&str] = &["phone", "phone_number", "mobile", "contact_phone"];
const STYLE_KEYS: &[&str] = &["resume_style_notes", "style_notes", "notes"];
const LINK_KEYS: &[&str] = &["links", "urls", "websites", "profiles"];
const INTEREST_KEYS: &[&str] = &["interests", "hobbies"];
const WORK_KEYS: &[&str] = &["work_experience", "experience", "work_history", "employment"];
const EDUCATION_KEYS: &[&str] = &["education"];
const CERTIFICATION_KEYS: &[&str] = &[
    "certifications",
    "certificates",
    "licenses_and_certifications",
];

const SCALAR_FIELDS: &[&[&str]] = &[
    NAME_KEYS,
    AGE_KEYS,
    LOCATION_KEYS,
    EMAIL_KEYS,
    PHONE_KEYS,
    STYLE_KEYS,
];
const LIST_FIELDS: &[&[&str]] = &[
    LINK_KEYS,
    INTEREST_KEYS,
    WORK_KEYS,
    EDUCATION_KEYS,
    CERTIFICATION_KEYS,
];

fn is_list_key(key: &str) -> bool {
    LIST_FIELDS.iter().any(|keys| keys.contains(&key))
}

fn is_record_key(key: &str) -> bool {
    is_list_key(key) || SCALAR_FIELDS.iter().any(|keys| keys.contains(&key))
}

/// Decodes a model answer straight into a typed record.
pub fn decode(text: &str) -> ResumeRecord {
    into_record(&decode_loose(text))
}

/// First pass: model answer to a loose JSON object.
pub fn decode_loose(text: &str) -> Map<String, Value> {
    let mut decoder = Decoder::default();
    for raw in text.lines() {
        decoder.feed(raw);
    }
    decoder.out
}

#[derive(Default)]
struct Decoder {
    out: Map<String, Value>,
    current_key: Option<String>,
    /// Indentation of the line that opened the newest list item, while one is open.
    item_indent: Option<usize>,
    /// Key most recently written into the open object item.
    last_item_key: Option<String>,
    /// Set while fields arrive as bullets (`- name: Ada`) rather than lines.
    flat: bool,
}

impl Decoder {
    fn feed(&mut self, raw: &str) {
        let emphasized = is_emphasized(raw.trim());
        let line = clean_line(raw);
        let body = line.trim();
        if body.is_empty() || is_rule(body) {
            return;
        }
        let indent = line.len() - line.trim_start().len();
        let item = LIST_ITEM
            .captures(body)
            .map(|c| c.get(1).map_or("", |m| m.as_str()).trim().to_string());

        if self.item_indent.is_some_and(|open| indent > open) {
            match item {
                Some(text) => self.append_to_item(&text, "\n"),
                None => self.continue_item(body),
            }
            return;
        }

        if let Some(heading) = body.strip_prefix('#') {
            let heading = heading.trim_start_matches('#').trim();
            if let Some(caps) = BARE_KEY.captures(heading) {
                self.set_field(normalize_key(&caps[1]), "");
            }
            return;
        }

        if let Some(text) = item {
            self.push_item(&text, indent);
        } else if let Some((key, value)) = split_pair(body) {
            self.set_field(key, value);
        } else if let Some(key) = bare_heading(body, emphasized) {
            self.set_field(key, "");
        } else {
            debug!("structured-text decoder skipped line: {body}");
        }
    }

    fn set_field(&mut self, key: String, value: &str) {
        let value = value.trim();
        let slot = if value.is_empty() || value == "-" {
            Value::Array(Vec::new())
        } else {
            Value::String(value.to_string())
        };
        self.out.insert(key.clone(), slot);
        self.current_key = Some(key);
        self.item_indent = None;
        self.last_item_key = None;
        self.flat = false;
    }

    fn push_item(&mut self, text: &str, indent: usize) {
        // Some answers are a flat bullet list of fields. Inside an open list
        // only a lone pair naming a record field starts the next field.
        if self.current_key.is_none() || self.flat {
            let in_list = self.current_is_list();
            if let Some((key, value)) = split_pair(text) {
                if !in_list || (is_record_key(&key) && split_pairs(text).len() <= 1) {
                    self.set_field(key, value);
                    self.flat = true;
                    return;
                }
            } else if !in_list {
                debug!("structured-text decoder dropped stray item: {text}");
                return;
            }
        }
        let Some(key) = self.current_key.clone() else {
            return;
        };

        let list_key = is_list_key(&key);
        let slot = self
            .out
            .entry(key)
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            if !list_key {
                debug!("structured-text decoder dropped item under scalar field: {text}");
                return;
            }
            *slot = Value::Array(Vec::new());
        }
        let (value, last_key) = parse_item(text);
        if let Value::Array(items) = slot {
            items.push(value);
        }
        self.item_indent = Some(indent);
        self.last_item_key = last_key;
    }

    /// Indented line under an open item: more pairs, or wrapped prose.
    fn continue_item(&mut self, body: &str) {
        let pairs = split_pairs(body);
        if pairs.is_empty() {
            self.append_to_item(body, " ");
            return;
        }

        let Some(item) = self.last_item_mut() else {
            return;
        };
        if let Value::String(text) = item {
            let text = std::mem::take(text);
            let mut obj = Map::new();
            if !text.is_empty() {
                obj.insert(TEXT_KEY.to_string(), Value::String(text));
            }
            *item = Value::Object(obj);
        }

        let mut last_key = None;
        if let Value::Object(obj) = item {
            for (key, value) in pairs {
                obj.insert(key.clone(), Value::String(value));
                last_key = Some(key);
            }
        }
        self.last_item_key = last_key;
    }

    fn append_to_item(&mut self, text: &str, sep: &str) {
        let last_key = self.last_item_key.clone();
        let Some(item) = self.last_item_mut() else {
            return;
        };
        match item {
            Value::String(s) => join_into(s, text, sep),
            Value::Object(obj) => {
                if let Some(key) = last_key.as_deref() {
                    if let Some(Value::String(s)) = obj.get_mut(key) {
                        join_into(s, text, sep);
                    }
                }
            }
            _ => {}
        }
    }

    fn current_is_list(&self) -> bool {
        self.current_key
            .as_deref()
            .and_then(|key| self.out.get(key))
            .is_some_and(Value::is_array)
    }

    fn last_item_mut(&mut self) -> Option<&mut Value> {
        let key = self.current_key.as_deref()?;
        match self.out.get_mut(key)? {
            Value::Array(items) => items.last_mut(),
            _ => None,
        }
    }
}

/// Drops emphasis markers that wrap a whole token.
fn clean_line(raw: &str) -> String {
    let line = raw.trim_end_matches(['\r', ' ', '\t']);
    EMPHASIS
        .replace_all(line, |caps: &Captures| {
            let Some(whole) = caps.get(0) else {
                return String::new();
            };
            let touches_word = |c: Option<char>| c.is_some_and(char::is_alphanumeric);
            if touches_word(line[..whole.start()].chars().next_back())
                || touches_word(line[whole.end()..].chars().next())
            {
                return whole.as_str().to_string();
            }
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map_or_else(String::new, |inner| inner.as_str().to_string())
        })
        .into_owned()
}

/// Whole line wrapped in `**` or `__`.
fn is_emphasized(body: &str) -> bool {
    ["**", "__"]
        .iter()
        .any(|m| body.len() > 2 * m.len() && body.starts_with(m) && body.ends_with(m))
}

/// Horizontal rules and code fences.
fn is_rule(body: &str) -> bool {
    body.starts_with("```") || body.chars().all(|c| matches!(c, '-' | '*' | '=' | '_' | '~'))
}

/// A colon-less line that reads as a section heading.
fn bare_heading(body: &str, emphasized: bool) -> Option<String> {
    let caps = BARE_KEY.captures(body)?;
    let key = normalize_key(&caps[1]);
    (emphasized || is_list_key(&key)).then_some(key)
}

fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

fn join_into(s: &mut String, text: &str, sep: &str) {
    if !s.is_empty() {
        s.push_str(sep);
    }
    s.push_str(text);
}

/// Splits a single `key: value` segment. URLs (`https://...`) are not pairs.
fn split_pair(segment: &str) -> Option<(String, &str)> {
    let caps = PAIR.captures(segment)?;
    let value = caps.get(2).map_or("", |m| m.as_str());
    Some((normalize_key(&caps[1]), value.trim()))
}

/// Splits `a: 1, b: 2, c: 3` into pairs. A comma only separates pairs when a
/// new `key:` follows it, so values keep their own commas. Returns nothing
/// unless the text starts with a pair.
fn split_pairs(text: &str) -> Vec<(String, String)> {
    let mut starts = vec![0];
    for (idx, _) in text.match_indices(',') {
        if split_pair(&text[idx + 1..]).is_some() {
            starts.push(idx + 1);
        }
    }

    let mut pairs = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).map_or(text.len(), |&next| next - 1);
        match split_pair(&text[start..end]) {
            Some((key, value)) => pairs.push((key, value.to_string())),
            None => return Vec::new(),
        }
    }
    pairs
}

/// An item is an object when it leads with a known entry key; otherwise the
/// raw text is kept so labels like `GitHub: https://...` survive intact.
fn parse_item(text: &str) -> (Value, Option<String>) {
    let pairs = split_pairs(text);
    match pairs.first() {
        Some((key, _)) if ITEM_KEYS.contains(&key.as_str()) => {
            let last_key = pairs.last().map(|(k, _)| k.clone());
            let obj: Map<String, Value> = pairs
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            (Value::Object(obj), last_key)
        }
        _ => (Value::String(text.to_string()), None),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Second pass: loose object → ResumeRecord
// ────────────────────────────────────────────────────────────────────────────

/// Maps a loose object onto the typed record. Unknown keys are ignored.
pub fn into_record(map: &Map<String, Value>) -> ResumeRecord {
    ResumeRecord {
        name: lookup(map, NAME_KEYS).and_then(text),
        age: lookup(map, AGE_KEYS).and_then(number),
        location: lookup(map, LOCATION_KEYS).and_then(text),
        email: lookup(map, EMAIL_KEYS).and_then(text),
        phone: lookup(map, PHONE_KEYS).and_then(text),
        links: items(lookup(map, LINK_KEYS)).filter_map(link).collect(),
        interests: items(lookup(map, INTEREST_KEYS))
            .filter_map(interest)
            .collect(),
        work_experience: items(lookup(map, WORK_KEYS))
            .filter_map(work_experience)
            .collect(),
        education: items(lookup(map, EDUCATION_KEYS))
            .filter_map(education)
            .collect(),
        certifications: items(lookup(map, CERTIFICATION_KEYS))
            .filter_map(certification)
            .collect(),
        resume_style_notes: lookup(map, STYLE_KEYS).and_then(text),
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k))
}

/// List-valued fields; a lone scalar counts as a one-item list.
fn items(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    let slice: &[Value] = match value {
        Some(Value::Array(items)) => items,
        Some(v @ Value::String(_)) => std::slice::from_ref(v),
        _ => &[],
    };
    slice.iter()
}

fn text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().filter_map(text).collect::<Vec<_>>().join(", "),
        _ => return None,
    };
    if is_placeholder(&s) {
        None
    } else {
        Some(s)
    }
}

fn number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => INTEGER.find(s).and_then(|m| m.as_str().parse().ok()),
        _ => None,
    }
}

/// Last integer in the text, so `2015 - 2019` yields the end of the range.
fn last_number(value: &Value) -> Option<u32> {
    match value {
        Value::String(s) => INTEGER
            .find_iter(s)
            .last()
            .and_then(|m| m.as_str().parse().ok()),
        other => number(other),
    }
}

fn is_placeholder(s: &str) -> bool {
    let lowered = s.trim().trim_end_matches('.').to_lowercase();
    PLACEHOLDERS.contains(&lowered.as_str())
}

fn field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(text))
}

/// Splits `Label: detail` or `Label - detail` free text.
fn split_label(s: &str) -> (Option<String>, Option<String>) {
    let (label, detail) = s
        .split_once(": ")
        .or_else(|| s.split_once(" - "))
        .or_else(|| s.split_once(" – "))
        .unwrap_or((s, ""));
    let keep = |part: &str| Some(part.trim().to_string()).filter(|p| !is_placeholder(p));
    (keep(label), keep(detail))
}

fn link(value: &Value) -> Option<String> {
    match value {
        Value::Object(obj) => field(obj, &["url", "link", TEXT_KEY]).or_else(|| {
            let (key, value) = obj.iter().next()?;
            Some(format!("{key}: {}", text(value)?))
        }),
        other => text(other),
    }
}

fn interest(value: &Value) -> Option<Interest> {
    let entry = match value {
        Value::Object(obj) => Interest {
            interest: field(obj, &["interest", "name", "title", TEXT_KEY]),
            description: field(obj, &["description", "details"]),
        },
        other => {
            let (interest, description) = split_label(&text(other)?);
            Interest {
                interest,
                description,
            }
        }
    };
    Some(entry).filter(|e| e != &Interest::default())
}

fn work_experience(value: &Value) -> Option<WorkExperience> {
    let entry = match value {
        Value::Object(obj) => {
            let mut entry = WorkExperience {
                company: field(obj, &["company", "employer", "organization", TEXT_KEY]),
                position: field(obj, &["position", "title", "role", "job_title"]),
                start_date: field(obj, &["start_date", "start", "from"]),
                end_date: field(obj, &["end_date", "end", "to"]),
                description: field(
                    obj,
                    &["description", "details", "summary", "responsibilities"],
                ),
            };
            if entry.start_date.is_none() && entry.end_date.is_none() {
                if let Some(range) = field(obj, &["dates", "duration", "period"]) {
                    let (start, end) = split_date_range(&range);
                    entry.start_date = start;
                    entry.end_date = end;
                }
            }
            entry
        }
        other => WorkExperience {
            company: text(other),
            ..Default::default()
        },
    };
    Some(entry).filter(|e| e != &WorkExperience::default())
}

fn split_date_range(range: &str) -> (Option<String>, Option<String>) {
    let (start, end) = range
        .split_once(" - ")
        .or_else(|| range.split_once(" – "))
        .or_else(|| range.split_once(" to "))
        .unwrap_or((range, ""));
    let keep = |part: &str| Some(part.trim().to_string()).filter(|p| !is_placeholder(p));
    (keep(start), keep(end))
}

fn education(value: &Value) -> Option<Education> {
    let entry = match value {
        Value::Object(obj) => Education {
            school: field(
                obj,
                &["school", "institution", "university", "college", TEXT_KEY],
            ),
            degree: field(obj, &["degree"]),
            field_of_study: field(obj, &["field_of_study", "field", "major"]),
            graduation_year: ["graduation_year", "year", "end_date", "graduated"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(last_number)),
        },
        other => Education {
            school: text(other),
            ..Default::default()
        },
    };
    Some(entry).filter(|e| e != &Education::default())
}

fn certification(value: &Value) -> Option<Certification> {
    let entry = match value {
        Value::Object(obj) => Certification {
            name: field(obj, &["name", "certification", "title", TEXT_KEY]),
            organization: field(
                obj,
                &["organization", "issuer", "issuing_organization", "authority"],
            ),
            date_earned: field(obj, &["date_earned", "date", "issued", "date_issued"]),
        },
        other => Certification {
            name: text(other),
            ..Default::default()
        },
    };
    Some(entry).filter(|e| e != &Certification::default())
}
