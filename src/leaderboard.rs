use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{AchievementRow, RatingRow, SkillSummary, StudentScore};
use crate::score::{self, AchievementRecord, ScoreError, SkillRating};

struct StudentInputs<'a> {
    name: &'a str,
    email: &'a str,
    cohort: &'a str,
    achievements: Vec<AchievementRecord>,
    ratings: Vec<SkillRating>,
}

/// Scores every student present in either collection. `achievements` must
/// already be limited to achieved objectives.
pub fn score_students(
    achievements: &[AchievementRow],
    ratings: &[RatingRow],
) -> Result<Vec<StudentScore>, ScoreError> {
    let mut students: HashMap<Uuid, StudentInputs<'_>> = HashMap::new();

    for row in achievements {
        students
            .entry(row.student_id)
            .or_insert_with(|| StudentInputs {
                name: &row.student_name,
                email: &row.student_email,
                cohort: &row.cohort,
                achievements: Vec::new(),
                ratings: Vec::new(),
            })
            .achievements
            .push(row.record());
    }

    for row in ratings {
        students
            .entry(row.student_id)
            .or_insert_with(|| StudentInputs {
                name: &row.student_name,
                email: &row.student_email,
                cohort: &row.cohort,
                achievements: Vec::new(),
                ratings: Vec::new(),
            })
            .ratings
            .push(row.rating());
    }

    let mut scores = Vec::with_capacity(students.len());
    for inputs in students.into_values() {
        let breakdown = score::explain_score(&inputs.achievements, &inputs.ratings)?;
        scores.push(StudentScore {
            student_name: inputs.name.to_string(),
            student_email: inputs.email.to_string(),
            cohort: inputs.cohort.to_string(),
            raw_total: breakdown.raw_total,
            adjustment: breakdown.adjustment,
            score: breakdown.score,
            achievement_count: inputs.achievements.len(),
            rating_count: inputs.ratings.len(),
        });
    }

    scores.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.student_name.cmp(&b.student_name))
            .then_with(|| a.student_email.cmp(&b.student_email))
    });
    Ok(scores)
}

pub fn summarize_skills(ratings: &[RatingRow]) -> Vec<SkillSummary> {
    let mut map: HashMap<&str, (usize, i64)> = HashMap::new();

    for rating in ratings {
        let entry = map.entry(rating.skill.as_str()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += i64::from(rating.level);
    }

    let mut summaries: Vec<SkillSummary> = map
        .into_iter()
        .map(|(skill, (count, total_level))| SkillSummary {
            skill: skill.to_string(),
            count,
            avg_level: total_level as f64 / count as f64,
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.skill.cmp(&b.skill)));
    summaries
}
