//! Composite learner scores for bootcamp cohorts.
//!
//! [`score::compute_score`] is the pure core; the other modules load
//! records from Postgres and present the results.

pub mod db;
pub mod leaderboard;
pub mod models;
pub mod report;
pub mod score;
