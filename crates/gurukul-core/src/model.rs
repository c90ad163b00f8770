//! Core data model types for gurukul.
//!
//! Documents are schema-less maps from field name to [`FieldValue`]. The
//! typed records (`ProgressRecord`, `ClassSummary`, ...) convert to and from
//! those maps; field names follow the camelCase names already present in
//! the stored collections.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Collection names used by the analytics core.
pub mod collections {
    pub const STUDENT_PROGRESS: &str = "student_progress";
    pub const CLASS_ANALYTICS: &str = "class_analytics";
    pub const ANALYTICS_EVENTS: &str = "analytics_events";
    pub const USERS: &str = "users";
    pub const SUBMISSIONS: &str = "assignment_submissions";
}

/// Field map of a single document.
pub type Fields = BTreeMap<String, FieldValue>;

/// A single typed value stored in a document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Map(Fields),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value as a float. Whole numbers are often stored as integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            FieldValue::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// Rank of the value's type in the cross-type sort order.
    fn type_rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Bool(_) => 1,
            FieldValue::Integer(_) | FieldValue::Double(_) => 2,
            FieldValue::Timestamp(_) => 3,
            FieldValue::String(_) => 4,
            FieldValue::Array(_) => 5,
            FieldValue::Map(_) => 6,
        }
    }

    /// Total order used for `order_by` queries.
    ///
    /// Values of different types sort by type (null, bool, number,
    /// timestamp, string, array, map); integers and doubles compare
    /// numerically with each other.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (a @ (FieldValue::Integer(_) | FieldValue::Double(_)), b)
                if b.type_rank() == 2 =>
            {
                let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                x.total_cmp(&y)
            }
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            (FieldValue::String(a), FieldValue::String(b)) => a.cmp(b),
            (FieldValue::Array(a), FieldValue::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.compare(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (FieldValue::Map(a), FieldValue::Map(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let ord = ka.cmp(kb).then_with(|| va.compare(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::Array(value)
    }
}

impl From<Fields> for FieldValue {
    fn from(value: Fields) -> Self {
        FieldValue::Map(value)
    }
}

/// Address of a document: collection name plus document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub collection: String,
    pub id: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Check that both path segments are non-empty and contain no `/`.
    pub fn validate(&self) -> Result<(), StoreError> {
        for segment in [&self.collection, &self.id] {
            if segment.is_empty() || segment.contains('/') {
                return Err(StoreError::InvalidKey(self.to_string()));
            }
        }
        Ok(())
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document as returned by a store read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Typed field lookups that report a `Malformed` error naming the document.
pub struct FieldReader<'a> {
    key: String,
    fields: &'a Fields,
}

impl<'a> FieldReader<'a> {
    pub fn new(key: impl fmt::Display, fields: &'a Fields) -> Self {
        Self {
            key: key.to_string(),
            fields,
        }
    }

    fn require(&self, name: &str) -> Result<&'a FieldValue, StoreError> {
        self.fields
            .get(name)
            .ok_or_else(|| StoreError::malformed(&self.key, format!("missing field `{name}`")))
    }

    fn wrong_type(&self, name: &str, expected: &str) -> StoreError {
        StoreError::malformed(&self.key, format!("field `{name}` is not {expected}"))
    }

    pub fn string(&self, name: &str) -> Result<String, StoreError> {
        self.require(name)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.wrong_type(name, "a string"))
    }

    pub fn optional_string(&self, name: &str) -> Result<Option<String>, StoreError> {
        match self.fields.get(name) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(_) => self.string(name).map(Some),
        }
    }

    pub fn count(&self, name: &str) -> Result<u32, StoreError> {
        let value = self.require(name)?;
        let number = match value {
            FieldValue::Integer(i) => *i,
            // Whole doubles show up when another client wrote the field.
            FieldValue::Double(d) if d.fract() == 0.0 => *d as i64,
            _ => return Err(self.wrong_type(name, "an integer")),
        };
        u32::try_from(number).map_err(|_| self.wrong_type(name, "a non-negative count"))
    }

    pub fn number(&self, name: &str) -> Result<f64, StoreError> {
        self.require(name)?
            .as_f64()
            .ok_or_else(|| self.wrong_type(name, "a number"))
    }

    pub fn optional_number(&self, name: &str) -> Result<Option<f64>, StoreError> {
        match self.fields.get(name) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(_) => self.number(name).map(Some),
        }
    }

    pub fn timestamp(&self, name: &str) -> Result<DateTime<Utc>, StoreError> {
        self.require(name)?
            .as_timestamp()
            .ok_or_else(|| self.wrong_type(name, "a timestamp"))
    }

    pub fn optional_timestamp(&self, name: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        match self.fields.get(name) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(_) => self.timestamp(name).map(Some),
        }
    }

    pub fn map(&self, name: &str) -> Result<Fields, StoreError> {
        match self.fields.get(name) {
            None | Some(FieldValue::Null) => Ok(Fields::new()),
            Some(value) => value
                .as_map()
                .cloned()
                .ok_or_else(|| self.wrong_type(name, "a map")),
        }
    }
}

// ---------------------------------------------------------------------------
// Progress records
// ---------------------------------------------------------------------------

/// Running statistics for one student in one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub student_id: String,
    pub class_id: String,
    pub assignments_completed: u32,
    /// Written as 0 on creation and never updated afterwards.
    pub assignments_total: u32,
    /// Weighted running mean of every grade supplied so far.
    pub average_grade: f64,
    pub last_active: DateTime<Utc>,
}

impl ProgressRecord {
    /// Document key for a (student, class) pair: `student_progress/{student}_{class}`.
    pub fn key(student_id: &str, class_id: &str) -> DocumentKey {
        DocumentKey::new(
            collections::STUDENT_PROGRESS,
            format!("{student_id}_{class_id}"),
        )
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("studentId".into(), self.student_id.as_str().into());
        fields.insert("classId".into(), self.class_id.as_str().into());
        fields.insert(
            "assignmentsCompleted".into(),
            self.assignments_completed.into(),
        );
        fields.insert("assignmentsTotal".into(), self.assignments_total.into());
        fields.insert("averageGrade".into(), self.average_grade.into());
        fields.insert("lastActive".into(), self.last_active.into());
        fields
    }

    pub fn from_document(collection: &str, doc: &Document) -> Result<Self, StoreError> {
        let reader = FieldReader::new(DocumentKey::new(collection, &doc.id), &doc.fields);
        Ok(Self {
            student_id: reader.string("studentId")?,
            class_id: reader.string("classId")?,
            assignments_completed: reader.count("assignmentsCompleted")?,
            assignments_total: reader.count("assignmentsTotal")?,
            average_grade: reader.number("averageGrade")?,
            last_active: reader.timestamp("lastActive")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Class summaries
// ---------------------------------------------------------------------------

/// Class-wide statistics, recomputed in full on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub class_id: String,
    /// Roster size, including students without a progress record.
    pub total_students: u32,
    pub active_students: u32,
    pub average_grade: f64,
    pub completion_rate: f64,
    pub last_updated: DateTime<Utc>,
}

impl ClassSummary {
    pub fn key(class_id: &str) -> DocumentKey {
        DocumentKey::new(collections::CLASS_ANALYTICS, class_id)
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("classId".into(), self.class_id.as_str().into());
        fields.insert("totalStudents".into(), self.total_students.into());
        fields.insert("activeStudents".into(), self.active_students.into());
        fields.insert("averageGrade".into(), self.average_grade.into());
        fields.insert("completionRate".into(), self.completion_rate.into());
        fields.insert("lastUpdated".into(), self.last_updated.into());
        fields
    }

    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let reader = FieldReader::new(
            DocumentKey::new(collections::CLASS_ANALYTICS, &doc.id),
            &doc.fields,
        );
        Ok(Self {
            class_id: reader.string("classId")?,
            total_students: reader.count("totalStudents")?,
            active_students: reader.count("activeStudents")?,
            average_grade: reader.number("averageGrade")?,
            completion_rate: reader.number("completionRate")?,
            last_updated: reader.timestamp("lastUpdated")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Analytics events
// ---------------------------------------------------------------------------

/// A logged user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub id: String,
    pub user_id: String,
    pub event_type: String,
    #[serde(default)]
    pub event_data: Fields,
    pub created_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let reader = FieldReader::new(
            DocumentKey::new(collections::ANALYTICS_EVENTS, &doc.id),
            &doc.fields,
        );
        Ok(Self {
            id: doc.id.clone(),
            user_id: reader.string("userId")?,
            event_type: reader.string("eventType")?,
            event_data: reader.map("eventData")?,
            created_at: reader.timestamp("createdAt")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

/// A student's answer to an assignment, optionally graded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub assignment_id: String,
    pub student_id: String,
    pub content: String,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn key(submission_id: &str) -> DocumentKey {
        DocumentKey::new(collections::SUBMISSIONS, submission_id)
    }

    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let reader = FieldReader::new(Self::key(&doc.id), &doc.fields);
        Ok(Self {
            id: doc.id.clone(),
            assignment_id: reader.string("assignmentId")?,
            student_id: reader.string("studentId")?,
            content: reader.string("content")?,
            grade: reader.optional_number("grade")?,
            feedback: reader.optional_string("feedback")?,
            submitted_at: reader.optional_timestamp("submittedAt")?,
            graded_at: reader.optional_timestamp("gradedAt")?,
        })
    }
}
