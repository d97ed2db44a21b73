/// Rating models for both directions of a finalized session
///
/// Ratings are append-only and keyed by request: at most one learner
/// rating (tutor -> learner) and one tutor rating (learner -> tutor) can
/// exist per request, enforced by unique constraints. Inserts take a
/// connection rather than a pool so the lifecycle operations can run them
/// inside their transactions.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE session_outcome AS ENUM ('success', 'partial', 'cancelled');
///
/// CREATE TABLE tutor_ratings (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     request_id UUID NOT NULL UNIQUE REFERENCES tutoring_requests(id) ON DELETE CASCADE,
///     learner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     tutor_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     stars SMALLINT NOT NULL CHECK (stars BETWEEN 1 AND 5),
///     comment TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE learner_ratings (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     request_id UUID NOT NULL UNIQUE REFERENCES tutoring_requests(id) ON DELETE CASCADE,
///     tutor_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     learner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     stars SMALLINT NOT NULL CHECK (stars BETWEEN 1 AND 5),
///     outcome session_outcome NOT NULL,
///     comment TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Lowest star value a rating accepts
pub const MIN_STARS: i16 = 1;

/// Highest star value a rating accepts
pub const MAX_STARS: i16 = 5;

/// How the tutor reports a finalized session went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_outcome", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    /// Session was held as planned
    Success,

    /// Session was held but cut short or incomplete
    Partial,

    /// Session did not actually happen
    Cancelled,
}

impl SessionOutcome {
    /// Outcome as its database string
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::Success => "success",
            SessionOutcome::Partial => "partial",
            SessionOutcome::Cancelled => "cancelled",
        }
    }
}

/// A learner's rating of a tutor
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TutorRating {
    pub id: Uuid,
    pub request_id: Uuid,
    pub learner_id: Uuid,
    pub tutor_id: Uuid,
    pub stars: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A tutor's rating of a learner, with the session outcome
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LearnerRating {
    pub id: Uuid,
    pub request_id: Uuid,
    pub tutor_id: Uuid,
    pub learner_id: Uuid,
    pub stars: i16,
    pub outcome: SessionOutcome,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a tutor rating
#[derive(Debug, Clone)]
pub struct CreateTutorRating {
    pub request_id: Uuid,
    pub learner_id: Uuid,
    pub tutor_id: Uuid,
    pub stars: i16,
    pub comment: Option<String>,
}

/// Input for inserting a learner rating
#[derive(Debug, Clone)]
pub struct CreateLearnerRating {
    pub request_id: Uuid,
    pub tutor_id: Uuid,
    pub learner_id: Uuid,
    pub stars: i16,
    pub outcome: SessionOutcome,
    pub comment: Option<String>,
}

/// A received tutor rating with the author's name, for profile pages
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TutorReview {
    pub stars: i16,
    pub comment: Option<String>,
    pub learner_name: String,
    pub created_at: DateTime<Utc>,
}

/// A received learner rating with the author's name, for profile pages
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LearnerReview {
    pub stars: i16,
    pub outcome: SessionOutcome,
    pub comment: Option<String>,
    pub tutor_name: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregated rating figures for one tutor
///
/// `average_stars` is None when `rating_count` is zero; rounding to one
/// decimal happens in the `reputation` module, not here.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct RatingSummary {
    pub average_stars: Option<f64>,
    pub rating_count: i64,
}

impl TutorRating {
    /// Inserts a rating row
    ///
    /// Runs on a plain connection so `TutoringRequest::rate_tutor` can
    /// call it inside its transaction. A second rating for the same
    /// request violates the unique constraint on `request_id`.
    pub async fn insert(
        conn: &mut PgConnection,
        data: CreateTutorRating,
    ) -> Result<Self, sqlx::Error> {
        let rating = sqlx::query_as::<_, TutorRating>(
            r#"
            INSERT INTO tutor_ratings (request_id, learner_id, tutor_id, stars, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, request_id, learner_id, tutor_id, stars, comment, created_at
            "#,
        )
        .bind(data.request_id)
        .bind(data.learner_id)
        .bind(data.tutor_id)
        .bind(data.stars)
        .bind(data.comment)
        .fetch_one(conn)
        .await?;

        Ok(rating)
    }

    /// Lists the ratings a tutor has received, newest first
    pub async fn list_for_tutor(
        pool: &PgPool,
        tutor_id: Uuid,
    ) -> Result<Vec<TutorReview>, sqlx::Error> {
        let reviews = sqlx::query_as::<_, TutorReview>(
            r#"
            SELECT r.stars, r.comment, u.display_name AS learner_name, r.created_at
            FROM tutor_ratings r
            JOIN users u ON u.id = r.learner_id
            WHERE r.tutor_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(tutor_id)
        .fetch_all(pool)
        .await?;

        Ok(reviews)
    }

    /// Aggregates a tutor's received ratings
    pub async fn summary_for_tutor(
        pool: &PgPool,
        tutor_id: Uuid,
    ) -> Result<RatingSummary, sqlx::Error> {
        let summary = sqlx::query_as::<_, RatingSummary>(
            r#"
            SELECT AVG(stars)::float8 AS average_stars, COUNT(id) AS rating_count
            FROM tutor_ratings
            WHERE tutor_id = $1
            "#,
        )
        .bind(tutor_id)
        .fetch_one(pool)
        .await?;

        Ok(summary)
    }
}

impl LearnerRating {
    /// Inserts a rating row
    ///
    /// Runs on a plain connection so
    /// `TutoringRequest::finalize_and_rate_learner` can call it inside its
    /// transaction.
    pub async fn insert(
        conn: &mut PgConnection,
        data: CreateLearnerRating,
    ) -> Result<Self, sqlx::Error> {
        let rating = sqlx::query_as::<_, LearnerRating>(
            r#"
            INSERT INTO learner_ratings (request_id, tutor_id, learner_id, stars, outcome, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, request_id, tutor_id, learner_id, stars, outcome, comment, created_at
            "#,
        )
        .bind(data.request_id)
        .bind(data.tutor_id)
        .bind(data.learner_id)
        .bind(data.stars)
        .bind(data.outcome)
        .bind(data.comment)
        .fetch_one(conn)
        .await?;

        Ok(rating)
    }

    /// Lists the ratings a learner has received, newest first
    pub async fn list_for_learner(
        pool: &PgPool,
        learner_id: Uuid,
    ) -> Result<Vec<LearnerReview>, sqlx::Error> {
        let reviews = sqlx::query_as::<_, LearnerReview>(
            r#"
            SELECT r.stars, r.outcome, r.comment, u.display_name AS tutor_name, r.created_at
            FROM learner_ratings r
            JOIN users u ON u.id = r.tutor_id
            WHERE r.learner_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(learner_id)
        .fetch_all(pool)
        .await?;

        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_as_str() {
        assert_eq!(SessionOutcome::Success.as_str(), "success");
        assert_eq!(SessionOutcome::Partial.as_str(), "partial");
        assert_eq!(SessionOutcome::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_outcome_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SessionOutcome::Success).unwrap(),
            "\"success\""
        );
        let outcome: SessionOutcome = serde_json::from_str("\"partial\"").unwrap();
        assert_eq!(outcome, SessionOutcome::Partial);
    }

    #[test]
    fn test_star_bounds() {
        assert_eq!(MIN_STARS, 1);
        assert_eq!(MAX_STARS, 5);
    }
}
