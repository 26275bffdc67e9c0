//! Course data model
//!
//! [`CourseRecord`] mirrors the on-disk per-faculty files (upper-case keys,
//! loosely typed numbers, empty strings for missing values). [`Course`] is the
//! strongly typed, immutable record the catalog hands out after load.

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Dense course identifier, assigned at load time in catalog order.
/// Row `i` of every feature matrix belongs to `CourseId(i)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub u32);

impl CourseId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for CourseId {
    fn from(index: usize) -> Self {
        CourseId(index as u32)
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generated course ratings, each on a 0-10 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ratings {
    #[serde(default, deserialize_with = "lenient::rating")]
    pub theoretical_vs_practical: u8,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub usefulness: u8,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub interest: u8,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub stem_vs_humanities: u8,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub abstract_vs_specific: u8,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub difficulty: u8,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub multidisciplinary: u8,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub project_based: u8,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub creative: u8,
}

/// Raw course record as found in the catalog files
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CourseRecord {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub faculty: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub semester: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub credits: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub teachers: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub completion: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub prerequisites: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub fields_of_study: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub type_of_study: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub lectures_seminars_homework: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub syllabus: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub objectives: Option<String>,
    #[serde(default, rename = "TEXT_PREREQUISITS", deserialize_with = "lenient::text")]
    pub text_prerequisites: Option<String>,
    #[serde(default, rename = "ASSESMENT_METHODS", deserialize_with = "lenient::text")]
    pub assessment_methods: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub teaching_methods: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub teacher_info: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub learning_outcomes: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub literature: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub students_enrolled: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub students_passed: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub average_grade: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub followup_courses: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default)]
    pub ratings: Option<Ratings>,
}

impl CourseRecord {
    /// Minimal record, mostly useful for fixtures
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// An immutable course, owned by the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<u32>,
    pub teachers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields_of_study: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_of_study: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lectures_seminars_homework: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syllabus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objectives: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_prerequisites: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_methods: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teaching_methods: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_outcomes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub students_enrolled: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub students_passed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_grade: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_courses: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Ratings>,
}

impl Course {
    /// Build a course from its raw record. Codes are trimmed; the teacher list
    /// is split on `-`, which is how the catalog files join instructor names.
    pub fn from_record(id: CourseId, record: CourseRecord) -> Self {
        let teachers = record
            .teachers
            .as_deref()
            .map(|raw| {
                raw.split('-')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id,
            code: record.code.trim().to_string(),
            name: record.name.trim().to_string(),
            faculty: record.faculty,
            department: record.department,
            language: record.language,
            semester: record.semester,
            credits: record.credits.map(|c| c.max(0.0) as u32),
            teachers,
            completion: record.completion,
            prerequisites: record.prerequisites,
            fields_of_study: record.fields_of_study,
            type_of_study: record.type_of_study,
            lectures_seminars_homework: record.lectures_seminars_homework,
            syllabus: record.syllabus,
            objectives: record.objectives,
            text_prerequisites: record.text_prerequisites,
            assessment_methods: record.assessment_methods,
            teaching_methods: record.teaching_methods,
            teacher_info: record.teacher_info,
            learning_outcomes: record.learning_outcomes,
            literature: record.literature,
            students_enrolled: record.students_enrolled.map(|n| n.max(0.0) as u32),
            students_passed: record.students_passed.map(|n| n.max(0.0) as u32),
            average_grade: record.average_grade.map(|g| g as f32),
            followup_courses: record.followup_courses,
            description: record.description,
            keywords: record.keywords,
            ratings: record.ratings,
        }
    }

    /// The first `limit` instructors; only the leading names are treated as
    /// the course's actual teachers
    pub fn lead_teachers(&self, limit: usize) -> &[String] {
        &self.teachers[..self.teachers.len().min(limit)]
    }

    /// Keyword set used for overlap computation: lowercased, with every word
    /// reduced to its English stem so "graph" and "Graphs" coincide
    pub fn keyword_set(&self) -> ahash::AHashSet<String> {
        let stemmer = Stemmer::create(Algorithm::English);
        self.keywords
            .iter()
            .map(|k| {
                k.to_lowercase()
                    .split_whitespace()
                    .map(|word| stemmer.stem(word).into_owned())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// Deserializers that tolerate the loose typing of scraped catalog files
mod lenient {
    use super::*;

    /// Empty or whitespace-only strings become `None`
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Numbers may arrive as JSON numbers or numeric strings
    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().replace(',', ".").parse().ok(),
            _ => None,
        })
    }

    pub fn rating<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(number(deserializer)?
            .map(|n| n.clamp(0.0, 10.0).round() as u8)
            .unwrap_or(0))
    }
}
