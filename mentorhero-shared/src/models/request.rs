/// Tutoring request model and lifecycle operations
///
/// A request is created by a learner against a tutor and a subject, then
/// advanced by the owning tutor along a fixed status graph:
///
/// ```text
/// pending -> accepted -> finalized
/// pending -> rejected
/// pending | accepted -> cancelled
/// ```
///
/// `rejected`, `finalized`, and `cancelled` are terminal. Every transition
/// runs as a single guarded UPDATE whose WHERE clause checks id, owning
/// tutor, and current status at once; zero rows affected means the caller
/// learns only that the transition did not happen, not which guard failed.
/// Finalization is a dedicated operation because it must insert the
/// tutor's rating of the learner in the same transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE request_status AS ENUM
///     ('pending', 'accepted', 'rejected', 'finalized', 'cancelled');
///
/// CREATE TABLE tutoring_requests (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     learner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     tutor_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     subject_id INTEGER NOT NULL REFERENCES subjects(id),
///     topics TEXT NOT NULL,
///     scheduled_date DATE NOT NULL,
///     scheduled_time TIME NOT NULL,
///     duration_minutes INTEGER NOT NULL CHECK (duration_minutes BETWEEN 60 AND 120),
///     status request_status NOT NULL DEFAULT 'pending',
///     tutor_message TEXT,
///     rated_by_learner BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use mentorhero_shared::models::request::{CreateRequest, RequestStatus, TutoringRequest};
/// use mentorhero_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example(learner_id: uuid::Uuid, tutor_id: uuid::Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let request = TutoringRequest::create(&pool, CreateRequest {
///     learner_id,
///     tutor_id,
///     subject_id: 2,
///     topics: "Recursión y pilas de llamadas".to_string(),
///     scheduled_date: chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
///     scheduled_time: chrono::NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
///     duration_minutes: 90,
/// }).await?;
///
/// // Only the owning tutor can accept it
/// let accepted = TutoringRequest::transition_status(
///     &pool, request.id, tutor_id, RequestStatus::Accepted, None,
/// ).await?;
/// assert!(accepted.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::rating::{
    CreateLearnerRating, CreateTutorRating, LearnerRating, SessionOutcome, TutorRating,
};

/// Shortest session a learner may request, in minutes
pub const MIN_DURATION_MINUTES: i32 = 60;

/// Longest session a learner may request, in minutes
pub const MAX_DURATION_MINUTES: i32 = 120;

/// Lifecycle states of a tutoring request
///
/// Stored as the PostgreSQL `request_status` enum and serialized in
/// lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Created by a learner, awaiting the tutor's decision
    Pending,

    /// Tutor agreed to hold the session
    Accepted,

    /// Tutor declined; terminal
    Rejected,

    /// Session happened and the tutor rated the learner; terminal
    Finalized,

    /// Called off before the session; terminal
    Cancelled,
}

impl RequestStatus {
    /// Status as its database string
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Finalized => "finalized",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition can leave this status
    pub fn is_terminal(&self) -> bool {
        match self {
            RequestStatus::Pending | RequestStatus::Accepted => false,
            RequestStatus::Rejected | RequestStatus::Finalized | RequestStatus::Cancelled => true,
        }
    }

    /// Whether the status graph permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        match (self, next) {
            (RequestStatus::Pending, RequestStatus::Accepted)
            | (RequestStatus::Pending, RequestStatus::Rejected)
            | (RequestStatus::Pending, RequestStatus::Cancelled)
            | (RequestStatus::Accepted, RequestStatus::Finalized)
            | (RequestStatus::Accepted, RequestStatus::Cancelled) => true,
            _ => false,
        }
    }
}

/// Tutoring request model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TutoringRequest {
    /// Unique request ID
    pub id: Uuid,

    /// Learner who created the request
    pub learner_id: Uuid,

    /// Tutor the request is addressed to; only this user may advance it
    pub tutor_id: Uuid,

    /// Subject the session is about
    pub subject_id: i32,

    /// Free-text description of what the learner wants to cover
    pub topics: String,

    /// Requested session date
    pub scheduled_date: NaiveDate,

    /// Requested session start time
    pub scheduled_time: NaiveTime,

    /// Session length in minutes, 60 through 120
    pub duration_minutes: i32,

    /// Current lifecycle status
    pub status: RequestStatus,

    /// Optional note the tutor attached when transitioning
    pub tutor_message: Option<String>,

    /// Set once the learner has rated the tutor for this session
    pub rated_by_learner: bool,

    /// When the request was created
    pub created_at: DateTime<Utc>,

    /// When the request was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a tutoring request
///
/// Duration bounds are checked at the API boundary; the schema CHECK is
/// the backstop.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub learner_id: Uuid,
    pub tutor_id: Uuid,
    pub subject_id: i32,
    pub topics: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_minutes: i32,
}

/// One request in a tutor's queue, with the learner and subject names
/// joined in for display
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TutorQueueEntry {
    pub id: Uuid,
    pub learner_id: Uuid,
    pub learner_name: String,
    pub subject_id: i32,
    pub subject_name: String,
    pub topics: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: RequestStatus,
    pub tutor_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One of a learner's requests, with the tutor and subject names joined
/// in for display
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LearnerRequestEntry {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub tutor_name: String,
    pub subject_id: i32,
    pub subject_name: String,
    pub topics: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: RequestStatus,
    pub tutor_message: Option<String>,
    pub rated_by_learner: bool,
    pub created_at: DateTime<Utc>,
}

impl TutoringRequest {
    /// Creates a new request in `pending` status
    pub async fn create(pool: &PgPool, data: CreateRequest) -> Result<Self, sqlx::Error> {
        let request = sqlx::query_as::<_, TutoringRequest>(
            r#"
            INSERT INTO tutoring_requests (learner_id, tutor_id, subject_id, topics,
                                           scheduled_date, scheduled_time, duration_minutes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, learner_id, tutor_id, subject_id, topics,
                      scheduled_date, scheduled_time, duration_minutes,
                      status, tutor_message, rated_by_learner, created_at, updated_at
            "#,
        )
        .bind(data.learner_id)
        .bind(data.tutor_id)
        .bind(data.subject_id)
        .bind(data.topics)
        .bind(data.scheduled_date)
        .bind(data.scheduled_time)
        .bind(data.duration_minutes)
        .fetch_one(pool)
        .await?;

        Ok(request)
    }

    /// Finds a request by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, TutoringRequest>(
            r#"
            SELECT id, learner_id, tutor_id, subject_id, topics,
                   scheduled_date, scheduled_time, duration_minutes,
                   status, tutor_message, rated_by_learner, created_at, updated_at
            FROM tutoring_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// Lists a tutor's queue, oldest first
    ///
    /// The queue models an inbox: by default only `pending` and `accepted`
    /// requests appear, in FIFO order so the longest-waiting learner
    /// surfaces first. With `include_all` the full history comes back in
    /// the same order.
    pub async fn list_for_tutor(
        pool: &PgPool,
        tutor_id: Uuid,
        include_all: bool,
    ) -> Result<Vec<TutorQueueEntry>, sqlx::Error> {
        let entries = sqlx::query_as::<_, TutorQueueEntry>(
            r#"
            SELECT r.id, r.learner_id, u.display_name AS learner_name,
                   r.subject_id, s.name AS subject_name,
                   r.topics, r.scheduled_date, r.scheduled_time, r.duration_minutes,
                   r.status, r.tutor_message, r.created_at
            FROM tutoring_requests r
            JOIN users u ON u.id = r.learner_id
            JOIN subjects s ON s.id = r.subject_id
            WHERE r.tutor_id = $1
              AND ($2 OR r.status IN ('pending', 'accepted'))
            ORDER BY r.created_at ASC
            "#,
        )
        .bind(tutor_id)
        .bind(include_all)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Lists a learner's requests, most recent first
    pub async fn list_for_learner(
        pool: &PgPool,
        learner_id: Uuid,
    ) -> Result<Vec<LearnerRequestEntry>, sqlx::Error> {
        let entries = sqlx::query_as::<_, LearnerRequestEntry>(
            r#"
            SELECT r.id, r.tutor_id, u.display_name AS tutor_name,
                   r.subject_id, s.name AS subject_name,
                   r.topics, r.scheduled_date, r.scheduled_time, r.duration_minutes,
                   r.status, r.tutor_message, r.rated_by_learner, r.created_at
            FROM tutoring_requests r
            JOIN users u ON u.id = r.tutor_id
            JOIN subjects s ON s.id = r.subject_id
            WHERE r.learner_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(learner_id)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Moves a request to `accepted`, `rejected`, or `cancelled`
    ///
    /// The WHERE clause enforces everything at once: the request must
    /// exist, belong to `tutor_id`, and sit in a status the target is
    /// reachable from (`accepted`/`rejected` from `pending`, `cancelled`
    /// from `pending` or `accepted`). An optional message is stored
    /// alongside the new status.
    ///
    /// # Returns
    ///
    /// The updated request, or None when no row matched. Callers cannot
    /// tell a missing request from one they don't own or one already past
    /// the transition; they all look the same on purpose.
    pub async fn transition_status(
        pool: &PgPool,
        request_id: Uuid,
        tutor_id: Uuid,
        new_status: RequestStatus,
        message: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, TutoringRequest>(
            r#"
            UPDATE tutoring_requests
            SET status = $3,
                tutor_message = COALESCE($4, tutor_message),
                updated_at = NOW()
            WHERE id = $1
              AND tutor_id = $2
              AND (
                    ($3 IN ('accepted', 'rejected') AND status = 'pending')
                 OR ($3 = 'cancelled' AND status IN ('pending', 'accepted'))
              )
            RETURNING id, learner_id, tutor_id, subject_id, topics,
                      scheduled_date, scheduled_time, duration_minutes,
                      status, tutor_message, rated_by_learner, created_at, updated_at
            "#,
        )
        .bind(request_id)
        .bind(tutor_id)
        .bind(new_status)
        .bind(message)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// Finalizes an accepted request and records the tutor's rating of
    /// the learner, atomically
    ///
    /// The status flip and the rating insert share one transaction: a
    /// `finalized` request always has exactly one learner rating, and a
    /// failure in either half persists nothing. The guarded UPDATE runs
    /// first, so an unknown, unowned, or not-yet-accepted request returns
    /// None without touching the ratings table.
    pub async fn finalize_and_rate_learner(
        pool: &PgPool,
        request_id: Uuid,
        tutor_id: Uuid,
        stars: i16,
        outcome: SessionOutcome,
        comment: Option<String>,
    ) -> Result<Option<(Self, LearnerRating)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let request = sqlx::query_as::<_, TutoringRequest>(
            r#"
            UPDATE tutoring_requests
            SET status = 'finalized', updated_at = NOW()
            WHERE id = $1 AND tutor_id = $2 AND status = 'accepted'
            RETURNING id, learner_id, tutor_id, subject_id, topics,
                      scheduled_date, scheduled_time, duration_minutes,
                      status, tutor_message, rated_by_learner, created_at, updated_at
            "#,
        )
        .bind(request_id)
        .bind(tutor_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = request else {
            return Ok(None);
        };

        let rating = LearnerRating::insert(
            &mut *tx,
            CreateLearnerRating {
                request_id: request.id,
                tutor_id: request.tutor_id,
                learner_id: request.learner_id,
                stars,
                outcome,
                comment,
            },
        )
        .await?;

        tx.commit().await?;

        Ok(Some((request, rating)))
    }

    /// Records the learner's rating of the tutor for a finalized request
    ///
    /// Marks the request as rated and inserts the rating in one
    /// transaction. The guarded UPDATE requires the caller to be the
    /// request's learner and the request to be `finalized`; the unique
    /// constraint on the ratings table stops a second rating for the same
    /// request, surfacing as a database error the API maps to a conflict.
    pub async fn rate_tutor(
        pool: &PgPool,
        request_id: Uuid,
        learner_id: Uuid,
        stars: i16,
        comment: Option<String>,
    ) -> Result<Option<TutorRating>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let request = sqlx::query_as::<_, TutoringRequest>(
            r#"
            UPDATE tutoring_requests
            SET rated_by_learner = TRUE, updated_at = NOW()
            WHERE id = $1 AND learner_id = $2 AND status = 'finalized'
            RETURNING id, learner_id, tutor_id, subject_id, topics,
                      scheduled_date, scheduled_time, duration_minutes,
                      status, tutor_message, rated_by_learner, created_at, updated_at
            "#,
        )
        .bind(request_id)
        .bind(learner_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = request else {
            return Ok(None);
        };

        let rating = TutorRating::insert(
            &mut *tx,
            CreateTutorRating {
                request_id: request.id,
                learner_id: request.learner_id,
                tutor_id: request.tutor_id,
                stars,
                comment,
            },
        )
        .await?;

        tx.commit().await?;

        Ok(Some(rating))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(RequestStatus::Pending.as_str(), "pending");
        assert_eq!(RequestStatus::Accepted.as_str(), "accepted");
        assert_eq!(RequestStatus::Rejected.as_str(), "rejected");
        assert_eq!(RequestStatus::Finalized.as_str(), "finalized");
        assert_eq!(RequestStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RequestStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&RequestStatus::Finalized).unwrap(),
            "\"finalized\""
        );
    }

    #[test]
    fn test_status_deserializes_lowercase() {
        let status: RequestStatus = serde_json::from_str("\"accepted\"").unwrap();
        assert_eq!(status, RequestStatus::Accepted);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::Accepted.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(RequestStatus::Finalized.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_transitions_from_pending() {
        let from = RequestStatus::Pending;
        assert!(from.can_transition_to(RequestStatus::Accepted));
        assert!(from.can_transition_to(RequestStatus::Rejected));
        assert!(from.can_transition_to(RequestStatus::Cancelled));
        assert!(!from.can_transition_to(RequestStatus::Finalized));
        assert!(!from.can_transition_to(RequestStatus::Pending));
    }

    #[test]
    fn test_transitions_from_accepted() {
        let from = RequestStatus::Accepted;
        assert!(from.can_transition_to(RequestStatus::Finalized));
        assert!(from.can_transition_to(RequestStatus::Cancelled));
        assert!(!from.can_transition_to(RequestStatus::Accepted));
        assert!(!from.can_transition_to(RequestStatus::Rejected));
        assert!(!from.can_transition_to(RequestStatus::Pending));
    }

    #[test]
    fn test_terminal_statuses_allow_nothing() {
        for from in [
            RequestStatus::Rejected,
            RequestStatus::Finalized,
            RequestStatus::Cancelled,
        ] {
            for next in [
                RequestStatus::Pending,
                RequestStatus::Accepted,
                RequestStatus::Rejected,
                RequestStatus::Finalized,
                RequestStatus::Cancelled,
            ] {
                assert!(!from.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_duration_bounds() {
        assert_eq!(MIN_DURATION_MINUTES, 60);
        assert_eq!(MAX_DURATION_MINUTES, 120);
    }
}
