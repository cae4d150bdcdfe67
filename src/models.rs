use chrono::NaiveDate;
use uuid::Uuid;

use crate::score::{AchievementRecord, Adjustment, SkillRating};

#[derive(Debug, Clone)]
pub struct AchievementRow {
    pub student_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub cohort: String,
    pub objective_code: String,
    pub weight: i64,
    pub reviewed_on: NaiveDate,
}

impl AchievementRow {
    pub fn record(&self) -> AchievementRecord {
        AchievementRecord {
            weight: self.weight,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RatingRow {
    pub student_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub cohort: String,
    pub skill: String,
    pub level: i32,
}

impl RatingRow {
    pub fn rating(&self) -> SkillRating {
        SkillRating {
            level: i64::from(self.level),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StudentScore {
    pub student_name: String,
    pub student_email: String,
    pub cohort: String,
    pub raw_total: i64,
    pub adjustment: Adjustment,
    pub score: i64,
    pub achievement_count: usize,
    pub rating_count: usize,
}

#[derive(Debug, Clone)]
pub struct SkillSummary {
    pub skill: String,
    pub count: usize,
    pub avg_level: f64,
}
