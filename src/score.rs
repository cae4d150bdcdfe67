//! Composite score for a single learner.
//!
//! The score is the sum of achieved objective weights scaled by
//! `1 + mean_level / 10`, where `mean_level` is the mean of the learner's
//! core skill ratings. Learners without ratings keep their raw total.
//!
//! Halfway results round to even (`22.5 -> 22`, `23.5 -> 24`). The
//! arithmetic is done on exact integers so ties are never misjudged.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementRecord {
    pub weight: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillRating {
    pub level: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreError {
    #[error("invalid {field} value {value:?}: expected an integer")]
    InvalidInput { field: &'static str, value: String },
}

/// How the skill ratings adjust the raw total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    NoRatings,
    HasRatings { mean: f64 },
}

impl Adjustment {
    pub fn from_ratings(skills: &[SkillRating]) -> Self {
        Self::from_totals(level_totals(skills))
    }

    fn from_totals(totals: Option<(i128, i128)>) -> Self {
        match totals {
            None => Adjustment::NoRatings,
            Some((count, level_sum)) => Adjustment::HasRatings {
                mean: level_sum as f64 / count as f64,
            },
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Adjustment::NoRatings => 1.0,
            Adjustment::HasRatings { mean } => 1.0 + mean / 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub raw_total: i64,
    pub adjustment: Adjustment,
    pub score: i64,
}

pub fn compute_score(
    achievements: &[AchievementRecord],
    skills: &[SkillRating],
) -> Result<i64, ScoreError> {
    explain_score(achievements, skills).map(|breakdown| breakdown.score)
}

pub fn explain_score(
    achievements: &[AchievementRecord],
    skills: &[SkillRating],
) -> Result<ScoreBreakdown, ScoreError> {
    let raw: i128 = achievements.iter().map(|a| a.weight as i128).sum();
    let totals = level_totals(skills);
    let adjustment = Adjustment::from_totals(totals);

    let adjusted = match totals {
        None => raw,
        Some((count, level_sum)) => {
            // raw * (1 + sum / (10 * n)) == raw * (10n + sum) / 10n
            let numerator = raw
                .checked_mul(10 * count + level_sum)
                .ok_or_else(|| out_of_range(raw))?;
            div_round_half_even(numerator, 10 * count)
        }
    };

    Ok(ScoreBreakdown {
        raw_total: narrow(raw)?,
        adjustment,
        score: narrow(adjusted)?,
    })
}

pub fn parse_weight(raw: &str) -> Result<AchievementRecord, ScoreError> {
    parse_integer("weight", raw).map(|weight| AchievementRecord { weight })
}

/// Levels outside 1..=10 are accepted; only non-integers are rejected.
pub fn parse_level(raw: &str) -> Result<SkillRating, ScoreError> {
    parse_integer("level", raw).map(|level| SkillRating { level })
}

fn parse_integer(field: &'static str, raw: &str) -> Result<i64, ScoreError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ScoreError::InvalidInput {
            field,
            value: raw.to_string(),
        })
}

/// `(count, level_sum)` of the ratings, or `None` when there are none.
fn level_totals(skills: &[SkillRating]) -> Option<(i128, i128)> {
    if skills.is_empty() {
        return None;
    }
    let level_sum: i128 = skills.iter().map(|s| s.level as i128).sum();
    Some((skills.len() as i128, level_sum))
}

fn narrow(value: i128) -> Result<i64, ScoreError> {
    i64::try_from(value).map_err(|_| out_of_range(value))
}

fn out_of_range(value: i128) -> ScoreError {
    ScoreError::InvalidInput {
        field: "score",
        value: value.to_string(),
    }
}

/// `denominator` must be positive.
fn div_round_half_even(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator.div_euclid(denominator);
    let remainder = numerator.rem_euclid(denominator);
    match (2 * remainder).cmp(&denominator) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => {
            if quotient % 2 == 0 {
                quotient
            } else {
                quotient + 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn achievements(weights: &[i64]) -> Vec<AchievementRecord> {
        weights.iter().map(|&weight| AchievementRecord { weight }).collect()
    }

    fn ratings(levels: &[i64]) -> Vec<SkillRating> {
        levels.iter().map(|&level| SkillRating { level }).collect()
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(compute_score(&[], &[]), Ok(0));
    }

    #[test]
    fn no_ratings_keeps_raw_total() {
        assert_eq!(compute_score(&achievements(&[10, 5]), &[]), Ok(15));
        assert_eq!(compute_score(&achievements(&[7, 7, 7]), &[]), Ok(21));
    }

    #[test]
    fn half_point_rounds_to_even() {
        assert_eq!(
            compute_score(&achievements(&[10, 5]), &ratings(&[5])),
            Ok(22)
        );
        assert_eq!(compute_score(&achievements(&[7]), &ratings(&[5])), Ok(10));
        assert_eq!(compute_score(&achievements(&[9]), &ratings(&[5])), Ok(14));
    }

    #[test]
    fn zero_raw_total_ignores_ratings() {
        assert_eq!(compute_score(&[], &ratings(&[8, 2])), Ok(0));
    }

    #[test]
    fn mean_of_ratings_drives_multiplier() {
        assert_eq!(
            compute_score(&achievements(&[100]), &ratings(&[1, 9])),
            Ok(150)
        );
    }

    #[test]
    fn top_and_zero_levels_bound_the_multiplier() {
        let earned = achievements(&[13, 4, 1]);
        assert_eq!(compute_score(&earned, &ratings(&[10, 10, 10])), Ok(36));
        assert_eq!(compute_score(&earned, &ratings(&[0, 0])), Ok(18));
    }

    #[test]
    fn non_half_fractions_round_to_nearest() {
        // 10 * (1 + 3.333..) / 10 -> 13.33
        assert_eq!(
            compute_score(&achievements(&[10]), &ratings(&[3, 3, 4])),
            Ok(13)
        );
        // 3 * 1.9 = 5.7
        assert_eq!(compute_score(&achievements(&[3]), &ratings(&[9])), Ok(6));
    }

    #[test]
    fn negative_totals_round_half_even() {
        // -15 * 1.5 = -22.5
        assert_eq!(
            compute_score(&achievements(&[-10, -5]), &ratings(&[5])),
            Ok(-22)
        );
        // -7 * 1.5 = -10.5
        assert_eq!(compute_score(&achievements(&[-7]), &ratings(&[5])), Ok(-10));
    }

    #[test]
    fn order_does_not_matter() {
        let forward = compute_score(&achievements(&[3, 8, 1, 20]), &ratings(&[2, 7, 9]));
        let reversed = compute_score(&achievements(&[20, 1, 8, 3]), &ratings(&[9, 7, 2]));
        assert_eq!(forward, reversed);
    }

    #[test]
    fn duplicate_weights_are_all_counted() {
        assert_eq!(compute_score(&achievements(&[5, 5, 5]), &[]), Ok(15));
    }

    #[test]
    fn breakdown_reports_adjustment() {
        let breakdown = explain_score(&achievements(&[100]), &ratings(&[4, 6])).unwrap();
        assert_eq!(breakdown.raw_total, 100);
        assert_eq!(breakdown.adjustment, Adjustment::HasRatings { mean: 5.0 });
        assert_eq!(breakdown.score, 150);

        let bare = explain_score(&achievements(&[100]), &[]).unwrap();
        assert_eq!(bare.adjustment, Adjustment::NoRatings);
        assert_eq!(bare.adjustment.multiplier(), 1.0);
    }

    #[test]
    fn adjustment_matches_breakdown() {
        let skills = ratings(&[3, 3, 4]);
        let breakdown = explain_score(&achievements(&[10]), &skills).unwrap();
        assert_eq!(breakdown.adjustment, Adjustment::from_ratings(&skills));
        assert_eq!(Adjustment::from_ratings(&[]), Adjustment::NoRatings);
        assert_eq!(breakdown.score, 13);
    }

    #[test]
    fn overflow_is_invalid_input() {
        let result = compute_score(&achievements(&[i64::MAX, i64::MAX]), &[]);
        assert!(matches!(
            result,
            Err(ScoreError::InvalidInput { field: "score", .. })
        ));
    }

    #[test]
    fn parses_integer_fields() {
        assert_eq!(parse_weight(" 12 "), Ok(AchievementRecord { weight: 12 }));
        assert_eq!(parse_level("11"), Ok(SkillRating { level: 11 }));
        assert_eq!(parse_level("-3"), Ok(SkillRating { level: -3 }));
    }

    #[test]
    fn rejects_non_integer_fields() {
        for raw in ["", "abc", "2.5", "1e3"] {
            assert_eq!(
                parse_weight(raw),
                Err(ScoreError::InvalidInput {
                    field: "weight",
                    value: raw.to_string(),
                })
            );
        }
        assert!(matches!(
            parse_level("ten"),
            Err(ScoreError::InvalidInput { field: "level", .. })
        ));
    }
}
