use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{AchievementRow, SkillSummary, StudentScore};
use crate::score::Adjustment;

pub fn describe_adjustment(adjustment: &Adjustment) -> String {
    match adjustment {
        Adjustment::NoRatings => "no skill ratings".to_string(),
        Adjustment::HasRatings { mean } => {
            format!("mean level {:.1}, x{:.2}", mean, adjustment.multiplier())
        }
    }
}

pub fn build_report(
    scope: Option<&str>,
    generated_on: NaiveDate,
    scores: &[StudentScore],
    skills: &[SkillSummary],
    achievements: &[AchievementRow],
) -> String {
    let mut output = String::new();
    let scope_label = scope.unwrap_or("all cohorts");

    let _ = writeln!(output, "# Bootcamp Score Report");
    let _ = writeln!(output, "Generated for {} on {}", scope_label, generated_on);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Leaderboard");

    if scores.is_empty() {
        let _ = writeln!(output, "No students with achievements or ratings yet.");
    } else {
        for (rank, score) in scores.iter().take(10).enumerate() {
            let _ = writeln!(
                output,
                "{}. {} ({}, {}) score {} from {} points across {} objectives and {} ratings ({})",
                rank + 1,
                score.student_name,
                score.student_email,
                score.cohort,
                score.score,
                score.raw_total,
                score.achievement_count,
                score.rating_count,
                describe_adjustment(&score.adjustment)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Core Skill Mix");

    if skills.is_empty() {
        let _ = writeln!(output, "No skill ratings recorded.");
    } else {
        for summary in skills {
            let _ = writeln!(
                output,
                "- {}: {} ratings (avg level {:.1})",
                summary.skill, summary.count, summary.avg_level
            );
        }
    }

    let unrated: Vec<&StudentScore> = scores
        .iter()
        .filter(|score| score.adjustment == Adjustment::NoRatings)
        .collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Awaiting Skill Ratings");

    if unrated.is_empty() {
        let _ = writeln!(output, "Every scored student has at least one skill rating.");
    } else {
        for score in unrated {
            let _ = writeln!(
                output,
                "- {} ({}) scored on raw points only",
                score.student_name, score.student_email
            );
        }
    }

    let mut recent: Vec<&AchievementRow> = achievements.iter().collect();
    recent.sort_by(|a, b| b.reviewed_on.cmp(&a.reviewed_on));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Achievements");

    if recent.is_empty() {
        let _ = writeln!(output, "No objectives achieved yet.");
    } else {
        for achievement in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} achieved {} (+{}) on {}",
                achievement.student_name,
                achievement.objective_code,
                achievement.weight,
                achievement.reviewed_on
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn student(name: &str, score: i64, adjustment: Adjustment) -> StudentScore {
        StudentScore {
            student_name: name.to_string(),
            student_email: format!("{}@example.com", name.to_lowercase()),
            cohort: "2026-web".to_string(),
            raw_total: 100,
            adjustment,
            score,
            achievement_count: 4,
            rating_count: 2,
        }
    }

    fn generated_on() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn report_lists_ranked_students() {
        let scores = vec![
            student("Ben", 150, Adjustment::HasRatings { mean: 5.0 }),
            student("Ada", 100, Adjustment::NoRatings),
        ];
        let skills = vec![SkillSummary {
            skill: "communication".to_string(),
            count: 2,
            avg_level: 5.0,
        }];

        let achievements = vec![
            AchievementRow {
                student_id: Uuid::new_v4(),
                student_name: "Ada".to_string(),
                student_email: "ada@example.com".to_string(),
                cohort: "2026-web".to_string(),
                objective_code: "git-basics".to_string(),
                weight: 10,
                reviewed_on: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            },
            AchievementRow {
                student_id: Uuid::new_v4(),
                student_name: "Ben".to_string(),
                student_email: "ben@example.com".to_string(),
                cohort: "2026-web".to_string(),
                objective_code: "http-apis".to_string(),
                weight: 25,
                reviewed_on: NaiveDate::from_ymd_opt(2026, 2, 9).unwrap(),
            },
        ];

        let report = build_report(
            Some("2026-web"),
            generated_on(),
            &scores,
            &skills,
            &achievements,
        );

        assert!(report.contains("Generated for 2026-web on 2026-03-02"));
        assert!(report.contains(
            "1. Ben (ben@example.com, 2026-web) score 150 from 100 points across 4 objectives and 2 ratings (mean level 5.0, x1.50)"
        ));
        assert!(report.contains("2. Ada"));
        assert!(report.contains("- communication: 2 ratings (avg level 5.0)"));
        assert!(report.contains("- Ada (ada@example.com) scored on raw points only"));
        assert!(!report.contains("- Ben (ben@example.com) scored"));

        let ben = report.find("- Ben achieved http-apis (+25) on 2026-02-09").unwrap();
        let ada = report.find("- Ada achieved git-basics (+10) on 2026-02-02").unwrap();
        assert!(ben < ada);
    }

    #[test]
    fn report_caps_leaderboard_and_recent_achievements() {
        let scores: Vec<StudentScore> = (1..=11)
            .map(|n| student(&format!("Student{n:02}"), 200 - n, Adjustment::NoRatings))
            .collect();
        let achievements: Vec<AchievementRow> = (1..=6)
            .map(|day| AchievementRow {
                student_id: Uuid::new_v4(),
                student_name: format!("Student{day:02}"),
                student_email: format!("student{day:02}@example.com"),
                cohort: "2026-web".to_string(),
                objective_code: format!("objective-{day}"),
                weight: 5,
                reviewed_on: NaiveDate::from_ymd_opt(2026, 2, day).unwrap(),
            })
            .collect();

        let report = build_report(None, generated_on(), &scores, &[], &achievements);

        assert!(report.contains("10. Student10"));
        assert!(!report.contains("11. Student11"));
        assert!(report.contains("- Student06 achieved objective-6"));
        assert!(report.contains("- Student02 achieved objective-2"));
        assert!(!report.contains("achieved objective-1 "));
        assert_eq!(report.matches(" achieved ").count(), 5);
    }

    #[test]
    fn empty_report_has_placeholders() {
        let report = build_report(None, generated_on(), &[], &[], &[]);
        assert!(report.contains("Generated for all cohorts"));
        assert!(report.contains("No students with achievements or ratings yet."));
        assert!(report.contains("No skill ratings recorded."));
        assert!(report.contains("Every scored student has at least one skill rating."));
        assert!(report.contains("No objectives achieved yet."));
    }
}
