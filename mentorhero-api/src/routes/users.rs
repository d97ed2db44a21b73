/// User profile endpoints
///
/// This module provides the authenticated profile views:
/// - Own profile (shape depends on role)
/// - Profile updates (semester and/or image, nothing else is mutable)
/// - The tutor directory with aggregated reputation
/// - A single tutor's public profile
///
/// # Endpoints
///
/// - `GET /api/users/profile` - Own profile
/// - `PATCH /api/users/update-profile` - Update semester and/or image
/// - `GET /api/users/tutors` - Tutor directory
/// - `GET /api/users/profile/:id` - A tutor's public profile

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use chrono::NaiveDate;
use mentorhero_shared::{
    auth::middleware::AuthContext,
    models::{
        rating::{LearnerRating, LearnerReview, RatingSummary, TutorRating, TutorReview},
        user::{UpdateProfile, User, UserRole},
        Major, Subject,
    },
    reputation::{self, Reputation},
};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Own profile response
///
/// Tutors see their declared subjects, reputation, and received reviews;
/// learners see the feedback tutors left them. Fields that don't apply to
/// the role are omitted from the JSON.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// User's ID
    pub user_id: Uuid,

    /// Full display name
    pub display_name: String,

    /// Login name
    pub username: String,

    /// Account role
    pub role: UserRole,

    /// Date of birth
    pub date_of_birth: NaiveDate,

    /// Institution
    pub institution: String,

    /// Current semester
    pub semester: i16,

    /// Hosted profile image URL
    pub profile_image_url: Option<String>,

    /// Enrolled major
    pub major: Major,

    /// Subjects offered (tutors only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<Subject>>,

    /// Aggregated reputation (tutors only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reputation: Option<Reputation>,

    /// Reviews received from learners (tutors only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<TutorReview>>,

    /// Feedback received from tutors (learners only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Vec<LearnerReview>>,
}

/// Update profile response
#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    /// User's ID
    pub user_id: Uuid,

    /// Semester after the update
    pub semester: i16,

    /// Image URL after the update
    pub profile_image_url: Option<String>,
}

/// One tutor in the directory listing
#[derive(Debug, Serialize)]
pub struct TutorDirectoryResponse {
    /// Tutor's ID, used to create requests against them
    pub tutor_id: Uuid,

    /// Full display name
    pub display_name: String,

    /// Login name
    pub username: String,

    /// Hosted profile image URL
    pub profile_image_url: Option<String>,

    /// Current semester
    pub semester: i16,

    /// Name of the tutor's major
    pub major_name: String,

    /// Subjects this tutor offers
    pub subjects: Vec<Subject>,

    /// Aggregated reputation
    pub reputation: Reputation,
}

/// A tutor's public profile
#[derive(Debug, Serialize)]
pub struct TutorProfileResponse {
    /// Tutor's ID
    pub tutor_id: Uuid,

    /// Full display name
    pub display_name: String,

    /// Login name
    pub username: String,

    /// Institution
    pub institution: String,

    /// Current semester
    pub semester: i16,

    /// Hosted profile image URL
    pub profile_image_url: Option<String>,

    /// Enrolled major
    pub major: Major,

    /// Subjects this tutor offers
    pub subjects: Vec<Subject>,

    /// Aggregated reputation
    pub reputation: Reputation,

    /// Reviews received from learners, newest first
    pub reviews: Vec<TutorReview>,
}

/// Own profile handler
///
/// # Endpoint
///
/// ```text
/// GET /api/users/profile
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: Account no longer exists
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let major = Major::find_by_id(&state.db, user.major_id)
        .await?
        .ok_or_else(|| {
            ApiError::InternalError(format!("user {} references missing major", user.id))
        })?;

    let (subjects, reputation, reviews, feedback) = match user.role {
        UserRole::Tutor => {
            let subjects = Subject::list_for_tutor(&state.db, user.id).await?;
            let summary = TutorRating::summary_for_tutor(&state.db, user.id).await?;
            let reviews = TutorRating::list_for_tutor(&state.db, user.id).await?;
            (
                Some(subjects),
                Some(reputation::compute(&summary)),
                Some(reviews),
                None,
            )
        }
        UserRole::Learner => {
            let feedback = LearnerRating::list_for_learner(&state.db, user.id).await?;
            (None, None, None, Some(feedback))
        }
        UserRole::Admin => (None, None, None, None),
    };

    Ok(Json(ProfileResponse {
        user_id: user.id,
        display_name: user.display_name,
        username: user.username,
        role: user.role,
        date_of_birth: user.date_of_birth,
        institution: user.institution,
        semester: user.semester,
        profile_image_url: user.profile_image_url,
        major,
        subjects,
        reputation,
        reviews,
        feedback,
    }))
}

/// Profile update handler
///
/// Multipart so a new image can ride along; both fields are optional but
/// at least one must be present.
///
/// # Endpoint
///
/// ```text
/// PATCH /api/users/update-profile
/// Authorization: Bearer <token>
/// Content-Type: multipart/form-data
///
/// semester=7
/// image=<optional file>
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Nothing to update, or semester out of range
/// - `401 Unauthorized`: Missing or invalid token
/// - `503 Service Unavailable`: Image supplied but no image host configured
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> ApiResult<Json<UpdateProfileResponse>> {
    let mut semester: Option<i16> = None;
    let mut image: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Malformed multipart form".to_string()))?
    {
        let Some(name) = field.name().map(|n| n.to_string()) else {
            continue;
        };

        match name.as_str() {
            "semester" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest("Malformed multipart form".to_string()))?;
                let parsed = raw.parse::<i16>().ok().filter(|s| (1..=8).contains(s));
                let Some(parsed) = parsed else {
                    return Err(ApiError::BadRequest(
                        "Semester must be a number between 1 and 8".to_string(),
                    ));
                };
                semester = Some(parsed);
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("profile").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::BadRequest("Malformed multipart form".to_string()))?;
                if !data.is_empty() {
                    image = Some((file_name, data));
                }
            }
            _ => {}
        }
    }

    if semester.is_none() && image.is_none() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }

    let profile_image_url = match image {
        Some((file_name, data)) => match &state.media {
            Some(store) => Some(store.upload(&file_name, data).await?),
            None => {
                return Err(ApiError::ServiceUnavailable(
                    "Profile image uploads are not configured".to_string(),
                ))
            }
        },
        None => None,
    };

    let user = User::update_profile(
        &state.db,
        auth.user_id,
        UpdateProfile {
            semester,
            profile_image_url,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UpdateProfileResponse {
        user_id: user.id,
        semester: user.semester,
        profile_image_url: user.profile_image_url,
    }))
}

/// Tutor directory handler
///
/// Returns every tutor with subjects and reputation in two queries
/// total, not one pair per tutor.
///
/// # Endpoint
///
/// ```text
/// GET /api/users/tutors
/// Authorization: Bearer <token>
/// ```
pub async fn list_tutors(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TutorDirectoryResponse>>> {
    let tutors = User::list_tutors(&state.db).await?;

    let mut subjects_by_tutor: HashMap<Uuid, Vec<Subject>> = HashMap::new();
    for declaration in Subject::list_all_tutor_subjects(&state.db).await? {
        subjects_by_tutor
            .entry(declaration.tutor_id)
            .or_default()
            .push(declaration.subject);
    }

    let directory = tutors
        .into_iter()
        .map(|tutor| {
            let reputation = reputation::compute(&RatingSummary {
                average_stars: tutor.average_stars,
                rating_count: tutor.rating_count,
            });

            TutorDirectoryResponse {
                tutor_id: tutor.id,
                display_name: tutor.display_name,
                username: tutor.username,
                profile_image_url: tutor.profile_image_url,
                semester: tutor.semester,
                major_name: tutor.major_name,
                subjects: subjects_by_tutor.remove(&tutor.id).unwrap_or_default(),
                reputation,
            }
        })
        .collect();

    Ok(Json(directory))
}

/// Public tutor profile handler
///
/// Only tutors have public profiles; asking for a learner's or an
/// unknown id answers 404 either way.
///
/// # Endpoint
///
/// ```text
/// GET /api/users/profile/:id
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: No tutor with that id
pub async fn get_tutor_profile(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TutorProfileResponse>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .filter(|user| user.role == UserRole::Tutor)
        .ok_or_else(|| ApiError::NotFound("Tutor not found".to_string()))?;

    let major = Major::find_by_id(&state.db, user.major_id)
        .await?
        .ok_or_else(|| {
            ApiError::InternalError(format!("user {} references missing major", user.id))
        })?;

    let subjects = Subject::list_for_tutor(&state.db, user.id).await?;
    let summary = TutorRating::summary_for_tutor(&state.db, user.id).await?;
    let reviews = TutorRating::list_for_tutor(&state.db, user.id).await?;

    Ok(Json(TutorProfileResponse {
        tutor_id: user.id,
        display_name: user.display_name,
        username: user.username,
        institution: user.institution,
        semester: user.semester,
        profile_image_url: user.profile_image_url,
        major,
        subjects,
        reputation: reputation::compute(&summary),
        reviews,
    }))
}
