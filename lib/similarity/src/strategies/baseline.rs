use crate::strategy::{Provenance, RankContext, RankQuery, Ranked, RankingStrategy};
use ahash::AHashSet;
use courserec_core::{Course, CourseId, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Only the leading instructors of a course count as its teachers
const LEAD_TEACHERS: usize = 2;

const TEACHER_WEIGHT: f32 = 0.5;
const FACULTY_WEIGHT: f32 = 0.25;
const DEPARTMENT_WEIGHT: f32 = 0.25;

/// Features collected from the liked courses
#[derive(Default)]
struct Profile<'a> {
    teachers: AHashSet<&'a str>,
    faculties: AHashSet<&'a str>,
    departments: AHashSet<&'a str>,
}

impl<'a> Profile<'a> {
    fn from_courses(courses: impl IntoIterator<Item = &'a Course>) -> Self {
        let mut profile = Self::default();
        for course in courses {
            profile
                .teachers
                .extend(course.lead_teachers(LEAD_TEACHERS).iter().map(String::as_str));
            if let Some(faculty) = course.faculty.as_deref() {
                profile.faculties.insert(faculty.trim());
            }
            if let Some(department) = course.department.as_deref() {
                profile.departments.insert(department.trim());
            }
        }
        profile
    }

    fn score(&self, course: &Course) -> f32 {
        let mut score = 0.0;
        if course
            .lead_teachers(LEAD_TEACHERS)
            .iter()
            .any(|t| self.teachers.contains(t.as_str()))
        {
            score += TEACHER_WEIGHT;
        }
        if course
            .faculty
            .as_deref()
            .is_some_and(|f| self.faculties.contains(f.trim()))
        {
            score += FACULTY_WEIGHT;
        }
        if course
            .department
            .as_deref()
            .is_some_and(|d| self.departments.contains(d.trim()))
        {
            score += DEPARTMENT_WEIGHT;
        }
        score
    }
}

/// Non-embedding fallback: fixed weights for a shared lead teacher, faculty
/// and department with any liked course.
///
/// Only candidates with a positive score are returned. Candidates with equal
/// scores are shuffled before truncation, seeded by
/// [`RecommendParams::seed`](crate::RecommendParams) when given.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBaselineStrategy;

impl RankingStrategy for FeatureBaselineStrategy {
    fn name(&self) -> &'static str {
        "baseline"
    }

    fn score(&self, query: &RankQuery<'_>, ctx: &RankContext<'_>) -> Result<Vec<Ranked>> {
        let catalog = ctx.catalog;
        let profile = Profile::from_courses(query.liked.iter().filter_map(|&id| catalog.lookup_by_id(id)));

        Ok(catalog
            .iter()
            .filter(|c| !query.excluded.contains(&c.id))
            .filter_map(|c| {
                let score = profile.score(c);
                (score > 0.0).then(|| Ranked::new(c.id, score))
            })
            .collect())
    }

    /// Liked courses that share at least one feature with the recommendation,
    /// strongest first
    fn explain(&self, ranked: &mut [Ranked], query: &RankQuery<'_>, ctx: &RankContext<'_>) {
        let catalog = ctx.catalog;
        for item in ranked.iter_mut() {
            let Some(course) = catalog.lookup_by_id(item.id) else {
                continue;
            };
            let mut matches: Vec<(CourseId, f32)> = query
                .liked
                .iter()
                .filter_map(|&l| {
                    let liked = catalog.lookup_by_id(l)?;
                    let shared = Profile::from_courses([liked]).score(course);
                    (shared > 0.0).then_some((l, shared))
                })
                .collect();
            matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            item.provenance = matches.into_iter().take(2).map(|(l, _)| l).collect::<Provenance>();
        }
    }

    fn rank(&self, query: &RankQuery<'_>, ctx: &RankContext<'_>) -> Result<Vec<Ranked>> {
        if query.liked.is_empty() || query.count == 0 {
            return Ok(Vec::new());
        }

        let mut scored = self.score(query, ctx)?;
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let mut rng = match query.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut start = 0;
        while start < scored.len() {
            let score = scored[start].score;
            let end = scored[start..]
                .iter()
                .position(|r| r.score != score)
                .map_or(scored.len(), |offset| start + offset);
            scored[start..end].shuffle(&mut rng);
            start = end;
        }

        scored.truncate(query.count);
        self.explain(&mut scored, query, ctx);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, OwnedQuery};
    use courserec_core::{CourseRecord, CsrMatrix};

    fn record(code: &str, teachers: &str, faculty: &str, department: &str) -> CourseRecord {
        let mut r = CourseRecord::new(code, code);
        r.teachers = (!teachers.is_empty()).then(|| teachers.to_string());
        r.faculty = Some(faculty.to_string());
        r.department = Some(department.to_string());
        r
    }

    fn fixture() -> Fixture {
        let records = vec![
            record("LIKED", "Novak - Svoboda - Dvorak", "FI", "KTI"),
            record("SAME_ALL", "Svoboda", "FI", "KTI"),
            record("THIRD_TEACHER", "Dvorak", "FI", "KPSB"),
            record("TEACHER_ONLY", "Novak", "PrF", "KOP"),
            record("NOTHING", "Cerny", "PrF", "KOP"),
            record("FAC_1", "", "FI", "KPSB"),
            record("FAC_2", "", "FI", "KPSB"),
            record("FAC_3", "", "FI", "KPSB"),
        ];
        let size = records.len();
        Fixture::build(records, vec![vec![1.0]; size], CsrMatrix::zeros(size))
    }

    #[test]
    fn test_weights_and_lead_teachers() {
        let fx = fixture();
        let mut query = OwnedQuery::new(fx.ids(&["LIKED"]), vec![], 10);
        query.params.seed = Some(7);
        let ranked = FeatureBaselineStrategy.rank(&query.as_query(), &fx.ctx()).unwrap();

        let scores: Vec<(String, f32)> = ranked
            .iter()
            .map(|r| (fx.codes([r.id]).remove(0), r.score))
            .collect();

        assert_eq!(scores[0], ("SAME_ALL".to_string(), 1.0));
        assert_eq!(scores[1], ("TEACHER_ONLY".to_string(), 0.5));
        // third teacher is ignored, so only faculty matches
        assert!(scores.contains(&("THIRD_TEACHER".to_string(), 0.25)));
        assert!(!scores.iter().any(|(c, _)| c == "NOTHING"));
        assert_eq!(ranked.len(), 6);
        assert_eq!(fx.codes(ranked[0].provenance.iter().copied()), vec!["LIKED"]);
    }

    #[test]
    fn test_shuffle_only_within_equal_scores() {
        let fx = fixture();
        let mut seen = AHashSet::new();
        for seed in 0..20 {
            let mut query = OwnedQuery::new(fx.ids(&["LIKED"]), vec![], 10);
            query.params.seed = Some(seed);
            let ranked = FeatureBaselineStrategy.rank(&query.as_query(), &fx.ctx()).unwrap();

            assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
            seen.insert(fx.codes(ranked.iter().map(|r| r.id)));
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let fx = fixture();
        let mut query = OwnedQuery::new(fx.ids(&["LIKED"]), vec![], 3);
        query.params.seed = Some(42);

        let a = FeatureBaselineStrategy.rank(&query.as_query(), &fx.ctx()).unwrap();
        let b = FeatureBaselineStrategy.rank(&query.as_query(), &fx.ctx()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }
}
