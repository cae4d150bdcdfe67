use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{AchievementRow, RatingRow};
use crate::score;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("migrations applied");
    Ok(())
}

/// One objective review from an achievements CSV, with numbers validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewImport {
    pub full_name: String,
    pub email: String,
    pub cohort: String,
    pub objective_code: String,
    pub objective_title: String,
    pub weight: i64,
    pub achieved: bool,
    pub reviewed_on: NaiveDate,
    pub source_key: Option<String>,
}

/// One skill rating from a ratings CSV, with the level validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingImport {
    pub full_name: String,
    pub email: String,
    pub cohort: String,
    pub skill: String,
    pub level: i32,
    pub rated_on: NaiveDate,
    pub source_key: Option<String>,
}

pub fn read_reviews<R: Read>(input: R) -> anyhow::Result<Vec<ReviewImport>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        cohort: String,
        objective_code: String,
        objective_title: String,
        weight: String,
        achieved: bool,
        reviewed_on: NaiveDate,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_reader(input);
    let mut rows = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("malformed review on line {line}"))?;
        let record = score::parse_weight(&row.weight)
            .with_context(|| format!("review on line {line}"))?;

        rows.push(ReviewImport {
            full_name: row.full_name,
            email: row.email,
            cohort: row.cohort,
            objective_code: row.objective_code,
            objective_title: row.objective_title,
            weight: record.weight,
            achieved: row.achieved,
            reviewed_on: row.reviewed_on,
            source_key: row.source_key.filter(|key| !key.is_empty()),
        });
    }

    Ok(rows)
}

pub fn read_ratings<R: Read>(input: R) -> anyhow::Result<Vec<RatingImport>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        cohort: String,
        skill: String,
        level: String,
        rated_on: NaiveDate,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_reader(input);
    let mut rows = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("malformed rating on line {line}"))?;
        let rating = score::parse_level(&row.level)
            .with_context(|| format!("rating on line {line}"))?;
        // the schema only stores levels 1..=10
        anyhow::ensure!(
            (1..=10).contains(&rating.level),
            "rating on line {line}: level {} is outside 1..=10",
            rating.level
        );

        rows.push(RatingImport {
            full_name: row.full_name,
            email: row.email,
            cohort: row.cohort,
            skill: row.skill,
            level: rating.level as i32,
            rated_on: row.rated_on,
            source_key: row.source_key.filter(|key| !key.is_empty()),
        });
    }

    Ok(rows)
}

async fn upsert_student(
    conn: &mut PgConnection,
    full_name: &str,
    email: &str,
    cohort: &str,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO bootcamp_scores.students (id, full_name, email, cohort)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name, cohort = EXCLUDED.cohort
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(full_name)
    .bind(email)
    .bind(cohort)
    .fetch_one(&mut *conn)
    .await
    .with_context(|| format!("failed to upsert student {email}"))?
    .get("id");

    Ok(id)
}

async fn insert_review(conn: &mut PgConnection, review: &ReviewImport) -> anyhow::Result<bool> {
    let student_id =
        upsert_student(conn, &review.full_name, &review.email, &review.cohort).await?;

    sqlx::query(
        r#"
        INSERT INTO bootcamp_scores.learning_objectives (code, title, weight)
        VALUES ($1, $2, $3)
        ON CONFLICT (code) DO UPDATE
        SET title = EXCLUDED.title, weight = EXCLUDED.weight
        "#,
    )
    .bind(&review.objective_code)
    .bind(&review.objective_title)
    .bind(review.weight)
    .execute(&mut *conn)
    .await?;

    let source_key = review
        .source_key
        .clone()
        .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

    let result = sqlx::query(
        r#"
        INSERT INTO bootcamp_scores.objective_reviews
        (id, student_id, objective_code, achieved, reviewed_on, source_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(&review.objective_code)
    .bind(review.achieved)
    .bind(review.reviewed_on)
    .bind(&source_key)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        debug!(%source_key, "review already imported");
    }
    Ok(result.rows_affected() > 0)
}

async fn insert_rating(conn: &mut PgConnection, rating: &RatingImport) -> anyhow::Result<bool> {
    let student_id =
        upsert_student(conn, &rating.full_name, &rating.email, &rating.cohort).await?;

    let source_key = rating
        .source_key
        .clone()
        .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

    let result = sqlx::query(
        r#"
        INSERT INTO bootcamp_scores.skill_ratings
        (id, student_id, skill, level, rated_on, source_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(&rating.skill)
    .bind(rating.level)
    .bind(rating.rated_on)
    .bind(&source_key)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        debug!(%source_key, "rating already imported");
    }
    Ok(result.rows_affected() > 0)
}

pub async fn import_reviews_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let reviews = read_reviews(file)?;
    info!(rows = reviews.len(), path = %csv_path.display(), "importing objective reviews");
    import_reviews(pool, &reviews).await
}

/// Inserts all reviews in one transaction; a failure leaves nothing behind.
pub async fn import_reviews(pool: &PgPool, reviews: &[ReviewImport]) -> anyhow::Result<usize> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;
    for review in reviews {
        if insert_review(&mut tx, review).await? {
            inserted += 1;
        }
    }
    tx.commit().await?;
    Ok(inserted)
}

pub async fn import_ratings_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let ratings = read_ratings(file)?;
    info!(rows = ratings.len(), path = %csv_path.display(), "importing skill ratings");
    import_ratings(pool, &ratings).await
}

/// Inserts all ratings in one transaction; a failure leaves nothing behind.
pub async fn import_ratings(pool: &PgPool, ratings: &[RatingImport]) -> anyhow::Result<usize> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;
    for rating in ratings {
        if insert_rating(&mut tx, rating).await? {
            inserted += 1;
        }
    }
    tx.commit().await?;
    Ok(inserted)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let date = |month, day| {
        NaiveDate::from_ymd_opt(2026, month, day).context("invalid seed date")
    };
    let student = |name: &str, email: &str, cohort: &str| {
        (name.to_string(), email.to_string(), cohort.to_string())
    };

    let avery = student("Avery Lee", "avery.lee@bootcamp.dev", "2026-web");
    let jules = student("Jules Moreno", "jules.moreno@bootcamp.dev", "2026-web");
    let kiara = student("Kiara Patel", "kiara.patel@bootcamp.dev", "2026-data");

    let objectives = [
        ("git-basics", "Commit, branch and open a pull request", 10),
        ("http-apis", "Build and consume a JSON HTTP API", 25),
        ("sql-joins", "Write multi-table SQL queries", 15),
    ];

    let reviews = [
        ("seed-r-001", &avery, 0, true, date(2, 2)?),
        ("seed-r-002", &avery, 1, true, date(2, 9)?),
        ("seed-r-003", &jules, 0, true, date(2, 3)?),
        ("seed-r-004", &jules, 1, false, date(2, 10)?),
        ("seed-r-005", &kiara, 2, true, date(2, 4)?),
    ];

    let mut review_rows = Vec::with_capacity(reviews.len());
    for (source_key, (full_name, email, cohort), objective, achieved, reviewed_on) in reviews {
        let (code, title, weight) = objectives[objective];
        review_rows.push(ReviewImport {
            full_name: full_name.clone(),
            email: email.clone(),
            cohort: cohort.clone(),
            objective_code: code.to_string(),
            objective_title: title.to_string(),
            weight,
            achieved,
            reviewed_on,
            source_key: Some(source_key.to_string()),
        });
    }
    import_reviews(pool, &review_rows).await?;

    let ratings = [
        ("seed-s-001", &avery, "communication", 7, date(2, 12)?),
        ("seed-s-002", &avery, "teamwork", 8, date(2, 12)?),
        ("seed-s-003", &jules, "communication", 5, date(2, 13)?),
        ("seed-s-004", &kiara, "problem solving", 9, date(2, 14)?),
    ];

    let mut rating_rows = Vec::with_capacity(ratings.len());
    for (source_key, (full_name, email, cohort), skill, level, rated_on) in ratings {
        rating_rows.push(RatingImport {
            full_name: full_name.clone(),
            email: email.clone(),
            cohort: cohort.clone(),
            skill: skill.to_string(),
            level,
            rated_on,
            source_key: Some(source_key.to_string()),
        });
    }
    import_ratings(pool, &rating_rows).await?;

    Ok(())
}

fn scope_filter(query: &mut String, cohort: Option<&str>, email: Option<&str>) {
    if cohort.is_some() {
        query.push_str(" AND st.cohort = $1");
    } else if email.is_some() {
        query.push_str(" AND st.email = $1");
    }
}

/// Achieved objectives only; unachieved reviews never reach the calculator.
pub async fn fetch_achievements(
    pool: &PgPool,
    cohort: Option<&str>,
    email: Option<&str>,
) -> anyhow::Result<Vec<AchievementRow>> {
    let mut query = String::from(
        "SELECT st.id AS student_id, st.full_name, st.email, st.cohort, \
         r.objective_code, o.weight, r.reviewed_on \
         FROM bootcamp_scores.objective_reviews r \
         JOIN bootcamp_scores.students st ON st.id = r.student_id \
         JOIN bootcamp_scores.learning_objectives o ON o.code = r.objective_code \
         WHERE r.achieved",
    );
    scope_filter(&mut query, cohort, email);

    let mut rows = sqlx::query(&query);
    if let Some(value) = cohort.or(email) {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    debug!(count = records.len(), "fetched achieved objectives");

    Ok(records
        .into_iter()
        .map(|row| AchievementRow {
            student_id: row.get("student_id"),
            student_name: row.get("full_name"),
            student_email: row.get("email"),
            cohort: row.get("cohort"),
            objective_code: row.get("objective_code"),
            weight: row.get("weight"),
            reviewed_on: row.get("reviewed_on"),
        })
        .collect())
}

pub async fn fetch_ratings(
    pool: &PgPool,
    cohort: Option<&str>,
    email: Option<&str>,
) -> anyhow::Result<Vec<RatingRow>> {
    let mut query = String::from(
        "SELECT st.id AS student_id, st.full_name, st.email, st.cohort, \
         s.skill, s.level \
         FROM bootcamp_scores.skill_ratings s \
         JOIN bootcamp_scores.students st ON st.id = s.student_id \
         WHERE TRUE",
    );
    scope_filter(&mut query, cohort, email);

    let mut rows = sqlx::query(&query);
    if let Some(value) = cohort.or(email) {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    debug!(count = records.len(), "fetched skill ratings");

    Ok(records
        .into_iter()
        .map(|row| RatingRow {
            student_id: row.get("student_id"),
            student_name: row.get("full_name"),
            student_email: row.get("email"),
            cohort: row.get("cohort"),
            skill: row.get("skill"),
            level: row.get("level"),
        })
        .collect())
}
