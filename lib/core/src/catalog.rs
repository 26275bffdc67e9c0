use crate::course::{Course, CourseId, CourseRecord};
use crate::{Error, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How to treat a course code that appears more than once across catalog files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first record seen, drop later ones with a warning
    #[default]
    FirstWins,
    /// Refuse to build the catalog
    Reject,
}

/// In-memory index of every course, addressable by code or dense id.
///
/// Built once and never mutated; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct Catalog {
    courses: Vec<Course>,
    by_code: AHashMap<String, CourseId>,
}

impl Catalog {
    /// Build a catalog from raw records in load order.
    ///
    /// Ids are assigned densely in the order records are accepted, so feature
    /// files must be aligned to that order.
    pub fn from_records<I>(records: I, policy: DuplicatePolicy) -> Result<Self>
    where
        I: IntoIterator<Item = CourseRecord>,
    {
        let mut courses = Vec::new();
        let mut by_code = AHashMap::new();
        let mut dropped = 0usize;

        for record in records {
            let code = record.code.trim();
            if code.is_empty() {
                debug!("Skipping course record without a code");
                continue;
            }

            if by_code.contains_key(code) {
                match policy {
                    DuplicatePolicy::Reject => return Err(Error::DuplicateCode(code.to_string())),
                    DuplicatePolicy::FirstWins => {
                        warn!("Duplicate course code {}, keeping first occurrence", code);
                        dropped += 1;
                        continue;
                    }
                }
            }

            let id = CourseId::from(courses.len());
            let course = Course::from_record(id, record);
            by_code.insert(course.code.clone(), id);
            courses.push(course);
        }

        if dropped > 0 {
            warn!("Dropped {} duplicate course records", dropped);
        }

        Ok(Self { courses, by_code })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn lookup_by_code(&self, code: &str) -> Option<&Course> {
        self.by_code
            .get(code.trim())
            .map(|id| &self.courses[id.index()])
    }

    pub fn lookup_by_id(&self, id: CourseId) -> Option<&Course> {
        self.courses.get(id.index())
    }

    pub fn id_of(&self, code: &str) -> Option<CourseId> {
        self.by_code.get(code.trim()).copied()
    }

    /// Resolve codes to ids, silently dropping unknown codes. Order is kept
    /// and repeated codes resolve once.
    pub fn resolve_codes<S: AsRef<str>>(&self, codes: &[S]) -> Vec<CourseId> {
        let mut ids: Vec<CourseId> = Vec::with_capacity(codes.len());
        for code in codes {
            if let Some(id) = self.id_of(code.as_ref()) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    /// All courses, ordered by id
    pub fn all(&self) -> &[Course] {
        &self.courses
    }

    pub fn iter(&self) -> impl Iterator<Item = &Course> {
        self.courses.iter()
    }

    /// Case-insensitive substring search over code, name, faculty and department
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Course> {
        let needle = query.trim().to_lowercase();
        let matches = |field: Option<&str>| {
            field
                .map(|f| f.to_lowercase().contains(&needle))
                .unwrap_or(false)
        };

        self.courses
            .iter()
            .filter(|c| {
                needle.is_empty()
                    || matches(Some(&c.code))
                    || matches(Some(&c.name))
                    || matches(c.faculty.as_deref())
                    || matches(c.department.as_deref())
            })
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, name: &str, faculty: &str) -> CourseRecord {
        let mut r = CourseRecord::new(code, name);
        r.faculty = Some(faculty.to_string());
        r
    }

    fn sample() -> Catalog {
        Catalog::from_records(
            vec![
                record("IB111", "Foundations of Programming", "FI"),
                record("MB151", "Linear Models", "FI"),
                record("BPV_APH1", "Applied Philosophy", "FSS"),
            ],
            DuplicatePolicy::FirstWins,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_both_ways() {
        let catalog = sample();
        assert_eq!(catalog.len(), 3);

        let course = catalog.lookup_by_code("MB151").unwrap();
        assert_eq!(course.id, CourseId(1));
        assert_eq!(catalog.lookup_by_id(CourseId(1)).unwrap().code, "MB151");
        assert!(catalog.lookup_by_code("NOPE").is_none());
        assert!(catalog.lookup_by_id(CourseId(99)).is_none());
    }

    #[test]
    fn test_resolve_codes_drops_unknown_and_keeps_order() {
        let catalog = sample();
        let ids = catalog.resolve_codes(&["BPV_APH1", "UNKNOWN", "IB111", "BPV_APH1"]);
        assert_eq!(ids, vec![CourseId(2), CourseId(0)]);

        let empty: Vec<CourseId> = catalog.resolve_codes::<&str>(&[]);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_all_is_ordered_by_id() {
        let catalog = sample();
        let ids: Vec<_> = catalog.all().iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_duplicate_first_wins() {
        let catalog = Catalog::from_records(
            vec![
                record("IB111", "First", "FI"),
                record("IB111", "Second", "FI"),
                record("IB000", "Other", "FI"),
            ],
            DuplicatePolicy::FirstWins,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup_by_code("IB111").unwrap().name, "First");
        assert_eq!(catalog.lookup_by_code("IB000").unwrap().id, CourseId(1));
    }

    #[test]
    fn test_duplicate_reject() {
        let result = Catalog::from_records(
            vec![record("IB111", "First", "FI"), record("IB111", "Second", "FI")],
            DuplicatePolicy::Reject,
        );
        assert!(matches!(result, Err(Error::DuplicateCode(code)) if code == "IB111"));
    }

    #[test]
    fn test_search() {
        let catalog = sample();
        let hits = catalog.search("fi", 10);
        assert_eq!(hits.len(), 2);

        let hits = catalog.search("philosophy", 10);
        assert_eq!(hits[0].code, "BPV_APH1");

        assert_eq!(catalog.search("", 2).len(), 2);
    }
}
