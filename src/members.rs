//! Member directory: normalization plus the year-key guessing heuristic.
//!
//! Records carry their admission year under an unpredictable key (`year`,
//! `batch`, `profile.year`, ...), sometimes as a string. The directory scans
//! a sample of records for year-plausible numeric values, prefers a fixed
//! list of known keys, and falls back to showing everyone when nothing
//! matches.

use crate::shape;
use serde_json::Value;
use std::collections::BTreeSet;

/// Keys favored when several year-plausible paths are found, in order.
pub const PREFERRED_YEAR_KEYS: [&str; 8] = [
    "year",
    "entryYear",
    "admitYear",
    "batch",
    "generation",
    "classYear",
    "profile.year",
    "student.year",
];

const YEAR_MIN: i64 = 1950;
const YEAR_MAX: i64 = 2600;
const SCAN_SAMPLE: usize = 200;
const SCAN_DEPTH: usize = 2;

#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub student_id: String,
    raw: Value,
}

impl Member {
    pub fn from_record(raw: Value) -> Self {
        Self {
            name: pick_name(&raw),
            student_id: pick_id(&raw),
            raw,
        }
    }

    pub fn year_at(&self, key_path: &str) -> Option<i64> {
        read_by_path(&self.raw, key_path).and_then(year_value)
    }
}

fn pick_name(record: &Value) -> String {
    if let Some(name) = shape::first_string(
        record,
        &["name", "fullname", "fullName", "displayName", "username", "email"],
    ) {
        return name.to_string();
    }
    record
        .get("profile")
        .and_then(|p| shape::first_string(p, &["name", "fullname"]))
        .unwrap_or(shape::UNKNOWN_AUTHOR)
        .to_string()
}

fn pick_id(record: &Value) -> String {
    for key in ["studentId", "stdId", "sid", "id", "_id", "email"] {
        match record.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    "-".to_string()
}

/// A numeric value (or numeric string) plausible as an admission year.
fn year_value(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (YEAR_MIN..=YEAR_MAX).contains(&n).then_some(n)
}

/// Follow a dot-joined path into nested objects.
pub fn read_by_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Scan a sample of records for paths holding year-plausible values.
/// Returns the candidate paths sorted.
pub fn collect_year_candidates(records: &[Value]) -> Vec<String> {
    let mut keys = BTreeSet::new();
    for record in records.iter().take(SCAN_SAMPLE) {
        visit(record, String::new(), 0, &mut keys);
    }
    keys.into_iter().collect()
}

fn visit(value: &Value, prefix: String, depth: usize, out: &mut BTreeSet<String>) {
    let Some(obj) = value.as_object() else { return };
    for (key, v) in obj {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if year_value(v).is_some() {
            out.insert(path);
        } else if v.is_object() && depth < SCAN_DEPTH {
            visit(v, path, depth + 1, out);
        }
    }
}

/// Pick the year key to filter by: first preferred key present among the
/// candidates, else the first candidate, else none (show everyone).
pub fn auto_year_key(candidates: &[String]) -> Option<String> {
    PREFERRED_YEAR_KEYS
        .iter()
        .find(|k| candidates.iter().any(|c| c == *k))
        .map(|k| k.to_string())
        .or_else(|| candidates.first().cloned())
}

/// Normalized member roster with the detected year key.
#[derive(Debug, Default)]
pub struct MemberDirectory {
    members: Vec<Member>,
    candidates: Vec<String>,
    year_key: Option<String>,
}

impl MemberDirectory {
    pub fn from_records(records: Vec<Value>) -> Self {
        let candidates = collect_year_candidates(&records);
        let year_key = auto_year_key(&candidates);
        let members = records.into_iter().map(Member::from_record).collect();
        Self {
            members,
            candidates,
            year_key,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn year_key(&self) -> Option<&str> {
        self.year_key.as_deref()
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Rotate to the next candidate year key (manual override when the
    /// auto-pick guessed wrong).
    pub fn cycle_year_key(&mut self) {
        if self.candidates.is_empty() {
            return;
        }
        let next = match &self.year_key {
            None => 0,
            Some(current) => self
                .candidates
                .iter()
                .position(|c| c == current)
                .map(|i| (i + 1) % self.candidates.len())
                .unwrap_or(0),
        };
        self.year_key = Some(self.candidates[next].clone());
    }

    /// Members matching `year` through the detected key. With no detected
    /// key the whole roster is returned, so the page is never blank just
    /// because the heuristic failed.
    pub fn filtered(&self, year: i64) -> Vec<&Member> {
        let Some(key) = &self.year_key else {
            return self.members.iter().collect();
        };
        self.members
            .iter()
            .filter(|m| m.year_at(key) == Some(year))
            .collect()
    }

    /// Distinct years present under the detected key, newest first.
    pub fn existing_years(&self) -> Vec<i64> {
        let Some(key) = &self.year_key else {
            return Vec::new();
        };
        let mut years: Vec<i64> = self
            .members
            .iter()
            .filter_map(|m| m.year_at(key))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        years.reverse();
        years
    }
}
