/// Tutoring request endpoints
///
/// This module drives the request lifecycle over HTTP. Every endpoint is
/// authenticated and additionally gated by role: learners create, list
/// their own, and rate tutors; tutors work their queue, transition
/// statuses, and finalize with a rating.
///
/// Ownership is never checked here separately from status: the model's
/// guarded updates do both at once, and a miss comes back as the same
/// 403 regardless of which guard failed.
///
/// # Endpoints
///
/// - `POST /api/solicitudes/` - Create a request
/// - `GET /api/solicitudes/tutor` - Tutor's queue (oldest first)
/// - `GET /api/solicitudes/aprendiz` - Learner's requests (newest first)
/// - `PATCH /api/solicitudes/:id/status` - Accept, reject, or cancel
/// - `POST /api/solicitudes/finalizar` - Finalize and rate the learner
/// - `POST /api/solicitudes/calificar-tutor` - Rate the tutor

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, NaiveTime};
use mentorhero_shared::{
    auth::middleware::AuthContext,
    models::{
        rating::{SessionOutcome, TutorRating},
        request::{
            CreateRequest, LearnerRequestEntry, RequestStatus, TutorQueueEntry, TutoringRequest,
            MAX_DURATION_MINUTES, MIN_DURATION_MINUTES,
        },
        user::{User, UserRole},
        LearnerRating,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create request body
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequestBody {
    /// Tutor the session is requested from
    pub tutor_id: Uuid,

    /// Subject to cover
    pub subject_id: i32,

    /// What the learner wants help with
    #[validate(length(min = 1, message = "Topics are required"))]
    pub topics: String,

    /// Session date (YYYY-MM-DD)
    pub scheduled_date: NaiveDate,

    /// Session start time (HH:MM:SS)
    pub scheduled_time: NaiveTime,

    /// Session length in minutes
    #[validate(range(
        min = 60,
        max = 120,
        message = "Duration must be between 60 and 120 minutes"
    ))]
    pub duration_minutes: i32,
}

/// Query parameters for the tutor queue
#[derive(Debug, Default, Deserialize)]
pub struct TutorQueueQuery {
    /// Include terminal requests too, not just pending and accepted
    #[serde(default)]
    pub all: bool,
}

/// Status transition body
#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    /// Target status: accepted, rejected, or cancelled
    pub status: RequestStatus,

    /// Optional note for the learner
    pub message: Option<String>,
}

/// Finalize body
#[derive(Debug, Deserialize, Validate)]
pub struct FinalizeBody {
    /// Request to finalize
    pub request_id: Uuid,

    /// Stars for the learner
    #[validate(range(min = 1, max = 5, message = "Stars must be between 1 and 5"))]
    pub stars: i16,

    /// How the session went
    pub outcome: SessionOutcome,

    /// Optional comment
    pub comment: Option<String>,
}

/// Finalize response
#[derive(Debug, Serialize)]
pub struct FinalizeResponse {
    /// The finalized request
    pub request: TutoringRequest,

    /// The rating that was recorded with it
    pub rating: LearnerRating,
}

/// Rate-tutor body
#[derive(Debug, Deserialize, Validate)]
pub struct RateTutorBody {
    /// Finalized request being rated
    pub request_id: Uuid,

    /// Stars for the tutor
    #[validate(range(min = 1, max = 5, message = "Stars must be between 1 and 5"))]
    pub stars: i16,

    /// Optional comment
    pub comment: Option<String>,
}

/// Create a tutoring request
///
/// # Endpoint
///
/// ```text
/// POST /api/solicitudes/
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// {
///   "tutor_id": "uuid",
///   "subject_id": 2,
///   "topics": "Recursión y pilas de llamadas",
///   "scheduled_date": "2025-03-10",
///   "scheduled_time": "16:00:00",
///   "duration_minutes": 90
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or duration out of range
/// - `401 Unauthorized`: Missing or invalid token
/// - `403 Forbidden`: Caller is not a learner
/// - `404 Not Found`: No tutor with that id
pub async fn create_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateRequestBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TutoringRequest>)> {
    require_learner(&auth)?;

    let Json(body) = payload.map_err(bad_json)?;
    body.validate()?;

    // The directory hands out tutor ids, but re-check the target is
    // actually a tutor so a learner id pasted in doesn't become the
    // recipient of a request
    User::find_by_id(&state.db, body.tutor_id)
        .await?
        .filter(|user| user.role == UserRole::Tutor)
        .ok_or_else(|| ApiError::NotFound("Tutor not found".to_string()))?;

    let request = TutoringRequest::create(
        &state.db,
        CreateRequest {
            learner_id: auth.user_id,
            tutor_id: body.tutor_id,
            subject_id: body.subject_id,
            topics: body.topics,
            scheduled_date: body.scheduled_date,
            scheduled_time: body.scheduled_time,
            duration_minutes: body.duration_minutes,
        },
    )
    .await?;

    tracing::info!(request_id = %request.id, tutor_id = %request.tutor_id, "tutoring request created");

    Ok((StatusCode::CREATED, Json(request)))
}

/// Tutor queue handler
///
/// Oldest first, so the longest-waiting learner is at the top. Pass
/// `?all=true` to include rejected, finalized, and cancelled requests.
///
/// # Endpoint
///
/// ```text
/// GET /api/solicitudes/tutor?all=true
/// Authorization: Bearer <token>
/// ```
pub async fn list_for_tutor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<TutorQueueQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TutorQueueEntry>>> {
    require_tutor(&auth)?;

    let Query(query) = query.map_err(|_| {
        ApiError::BadRequest("Invalid query parameters".to_string())
    })?;

    let entries = TutoringRequest::list_for_tutor(&state.db, auth.user_id, query.all).await?;

    Ok(Json(entries))
}

/// Learner request list handler
///
/// # Endpoint
///
/// ```text
/// GET /api/solicitudes/aprendiz
/// Authorization: Bearer <token>
/// ```
pub async fn list_for_learner(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<LearnerRequestEntry>>> {
    require_learner(&auth)?;

    let entries = TutoringRequest::list_for_learner(&state.db, auth.user_id).await?;

    Ok(Json(entries))
}

/// Status transition handler
///
/// Accept, reject, or cancel one of the caller's requests. Finalization
/// is not reachable from here; it has its own endpoint because it
/// carries a rating.
///
/// # Endpoint
///
/// ```text
/// PATCH /api/solicitudes/:id/status
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// {
///   "status": "accepted",
///   "message": "Nos vemos en la biblioteca"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid id, body, or target status
/// - `401 Unauthorized`: Missing or invalid token
/// - `403 Forbidden`: The request doesn't exist, isn't the caller's, or
///   can't move to the target status; the response doesn't say which
pub async fn transition_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TransitionBody>, JsonRejection>,
) -> ApiResult<Json<TutoringRequest>> {
    require_tutor(&auth)?;

    let Path(request_id) = path.map_err(|_| {
        ApiError::BadRequest("Request id must be a valid UUID".to_string())
    })?;
    let Json(body) = payload.map_err(bad_json)?;

    ensure_transition_target(body.status)?;

    let request =
        TutoringRequest::transition_status(&state.db, request_id, auth.user_id, body.status, body.message)
            .await?
            .ok_or_else(|| ApiError::Forbidden("Operation not allowed".to_string()))?;

    tracing::info!(request_id = %request.id, status = ?request.status, "request transitioned");

    Ok(Json(request))
}

/// Finalize handler
///
/// Flips an accepted request to finalized and records the tutor's rating
/// of the learner in the same transaction.
///
/// # Endpoint
///
/// ```text
/// POST /api/solicitudes/finalizar
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// {
///   "request_id": "uuid",
///   "stars": 5,
///   "outcome": "success",
///   "comment": "Muy buena disposición"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or stars out of range
/// - `401 Unauthorized`: Missing or invalid token
/// - `403 Forbidden`: The request doesn't exist, isn't the caller's, or
///   isn't in accepted status; the response doesn't say which
pub async fn finalize(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<FinalizeBody>, JsonRejection>,
) -> ApiResult<Json<FinalizeResponse>> {
    require_tutor(&auth)?;

    let Json(body) = payload.map_err(bad_json)?;
    body.validate()?;

    let (request, rating) = TutoringRequest::finalize_and_rate_learner(
        &state.db,
        body.request_id,
        auth.user_id,
        body.stars,
        body.outcome,
        body.comment,
    )
    .await?
    .ok_or_else(|| ApiError::Forbidden("Operation not allowed".to_string()))?;

    tracing::info!(request_id = %request.id, "request finalized");

    Ok(Json(FinalizeResponse { request, rating }))
}

/// Rate-tutor handler
///
/// Learner-side rating of a finalized session. A request can be rated
/// once; a second attempt answers 409.
///
/// # Endpoint
///
/// ```text
/// POST /api/solicitudes/calificar-tutor
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// {
///   "request_id": "uuid",
///   "stars": 4,
///   "comment": "Explica muy bien"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or stars out of range
/// - `401 Unauthorized`: Missing or invalid token
/// - `403 Forbidden`: The request doesn't exist, isn't the caller's, or
///   isn't finalized; the response doesn't say which
/// - `409 Conflict`: This session was already rated
pub async fn rate_tutor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<RateTutorBody>, JsonRejection>,
) -> ApiResult<Json<TutorRating>> {
    require_learner(&auth)?;

    let Json(body) = payload.map_err(bad_json)?;
    body.validate()?;

    let rating = TutoringRequest::rate_tutor(
        &state.db,
        body.request_id,
        auth.user_id,
        body.stars,
        body.comment,
    )
    .await?
    .ok_or_else(|| ApiError::Forbidden("Operation not allowed".to_string()))?;

    tracing::info!(request_id = %rating.request_id, "tutor rated");

    Ok(Json(rating))
}

fn bad_json(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

fn require_tutor(auth: &AuthContext) -> Result<(), ApiError> {
    match auth.role {
        UserRole::Tutor => Ok(()),
        UserRole::Learner | UserRole::Admin => Err(ApiError::Forbidden(
            "Only tutors can perform this operation".to_string(),
        )),
    }
}

fn require_learner(auth: &AuthContext) -> Result<(), ApiError> {
    match auth.role {
        UserRole::Learner => Ok(()),
        UserRole::Tutor | UserRole::Admin => Err(ApiError::Forbidden(
            "Only learners can perform this operation".to_string(),
        )),
    }
}

/// The generic transition endpoint covers exactly three targets
fn ensure_transition_target(status: RequestStatus) -> Result<(), ApiError> {
    match status {
        RequestStatus::Accepted | RequestStatus::Rejected | RequestStatus::Cancelled => Ok(()),
        RequestStatus::Pending | RequestStatus::Finalized => Err(ApiError::BadRequest(
            "Status must be accepted, rejected, or cancelled".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_as(role: UserRole) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "test".to_string(),
            role,
        }
    }

    fn create_body(duration_minutes: i32) -> CreateRequestBody {
        CreateRequestBody {
            tutor_id: Uuid::new_v4(),
            subject_id: 1,
            topics: "Integrales por partes".to_string(),
            scheduled_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            duration_minutes,
        }
    }

    #[test]
    fn test_duration_boundaries() {
        assert!(create_body(59).validate().is_err());
        assert!(create_body(MIN_DURATION_MINUTES).validate().is_ok());
        assert!(create_body(90).validate().is_ok());
        assert!(create_body(MAX_DURATION_MINUTES).validate().is_ok());
        assert!(create_body(121).validate().is_err());
    }

    #[test]
    fn test_empty_topics_rejected() {
        let mut body = create_body(90);
        body.topics = String::new();
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_stars_boundaries() {
        for (stars, ok) in [(0, false), (1, true), (5, true), (6, false)] {
            let body = RateTutorBody {
                request_id: Uuid::new_v4(),
                stars,
                comment: None,
            };
            assert_eq!(body.validate().is_ok(), ok, "stars = {}", stars);
        }
    }

    #[test]
    fn test_role_gates() {
        assert!(require_tutor(&auth_as(UserRole::Tutor)).is_ok());
        assert!(require_tutor(&auth_as(UserRole::Learner)).is_err());
        assert!(require_tutor(&auth_as(UserRole::Admin)).is_err());

        assert!(require_learner(&auth_as(UserRole::Learner)).is_ok());
        assert!(require_learner(&auth_as(UserRole::Tutor)).is_err());
        assert!(require_learner(&auth_as(UserRole::Admin)).is_err());
    }

    #[test]
    fn test_transition_targets() {
        assert!(ensure_transition_target(RequestStatus::Accepted).is_ok());
        assert!(ensure_transition_target(RequestStatus::Rejected).is_ok());
        assert!(ensure_transition_target(RequestStatus::Cancelled).is_ok());
        assert!(ensure_transition_target(RequestStatus::Pending).is_err());
        assert!(ensure_transition_target(RequestStatus::Finalized).is_err());
    }

    #[test]
    fn test_transition_body_parses_lowercase_status() {
        let body: TransitionBody =
            serde_json::from_str(r#"{"status": "accepted", "message": "ok"}"#).unwrap();
        assert_eq!(body.status, RequestStatus::Accepted);
        assert_eq!(body.message.as_deref(), Some("ok"));
    }

    #[test]
    fn test_unknown_status_fails_to_parse() {
        let result: Result<TransitionBody, _> =
            serde_json::from_str(r#"{"status": "archived"}"#);
        assert!(result.is_err());
    }
}
