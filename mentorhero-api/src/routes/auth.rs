/// Authentication endpoints
///
/// This module provides account creation and login:
/// - Registration (multipart form, because it carries an optional image)
/// - Login (JSON)
///
/// All field validation happens here, eagerly, before anything touches
/// the database or the image host. Plaintext passwords are hashed
/// immediately and never stored or logged.
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new learner or tutor
/// - `POST /api/auth/login` - Login and get a session token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use mentorhero_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User, UserRole},
    models::Subject,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Youngest age allowed to register
const MINIMUM_AGE: u32 = 17;

/// How many distinct subjects a tutor must declare
const MIN_TUTOR_SUBJECTS: usize = 3;

/// Raw registration form, straight out of the multipart body
///
/// Everything is optional and stringly-typed at this stage; validation
/// turns it into a [`ValidatedRegistration`] or a 400.
#[derive(Debug, Default)]
struct RegisterForm {
    display_name: Option<String>,
    date_of_birth: Option<String>,
    username: Option<String>,
    password: Option<String>,
    password_confirmation: Option<String>,
    role: Option<String>,
    institution: Option<String>,
    semester: Option<String>,
    major_id: Option<String>,
    subject_ids: Vec<String>,
    image: Option<(String, Bytes)>,
}

/// Registration input after every field check has passed
#[derive(Debug)]
struct ValidatedRegistration {
    display_name: String,
    date_of_birth: NaiveDate,
    username: String,
    password: String,
    role: UserRole,
    institution: String,
    semester: i16,
    major_id: i32,
    subject_ids: Vec<i32>,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// New user's ID
    pub user_id: Uuid,

    /// Login name
    pub username: String,

    /// Account role
    pub role: UserRole,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login name
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// User's ID
    pub user_id: Uuid,

    /// Login name
    pub username: String,

    /// Account role
    pub role: UserRole,

    /// Signed session token, valid for 30 days
    pub token: String,
}

/// Register a new user
///
/// Accepts a multipart form because the profile image rides along with
/// the text fields. Tutors must declare at least three distinct subjects;
/// the user row and the subject rows are inserted in one transaction.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: multipart/form-data
///
/// display_name=Ana García
/// date_of_birth=2003-04-12
/// username=ana1
/// password=secreta123
/// password_confirmation=secreta123
/// role=Tutor
/// institution=Universidad Central
/// semester=6
/// major_id=1
/// subject_ids=1,2,5
/// image=<optional file>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "user_id": "uuid",
///   "username": "ana1",
///   "role": "Tutor"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing or invalid fields
/// - `409 Conflict`: Username already in use
/// - `503 Service Unavailable`: Image supplied but no image host configured
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let mut form = parse_register_form(multipart).await?;
    let image = form.image.take();

    let today = Utc::now().date_naive();
    let registration = validate_registration(form, today)?;

    // Subject ids must exist before we try the insert, so unknown ids get
    // a clean message instead of a foreign key error
    if registration.role == UserRole::Tutor {
        let existing = Subject::count_existing(&state.db, &registration.subject_ids).await?;
        if existing != registration.subject_ids.len() as i64 {
            return Err(ApiError::BadRequest(
                "One or more subject ids do not exist".to_string(),
            ));
        }
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

    let password_hash = password::hash_password(&registration.password)?;

    let user = User::register(
        &state.db,
        CreateUser {
            display_name: registration.display_name,
            date_of_birth: registration.date_of_birth,
            username: registration.username,
            password_hash,
            role: registration.role,
            institution: registration.institution,
            semester: registration.semester,
            profile_image_url,
            major_id: registration.major_id,
        },
        &registration.subject_ids,
    )
    .await?;

    tracing::info!(username = %user.username, role = ?user.role, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            username: user.username,
            role: user.role,
        }),
    ))
}

/// Login endpoint
///
/// Authenticates a user and returns a 30-day session token. Unknown
/// usernames and wrong passwords produce the same response.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// {
///   "username": "ana1",
///   "password": "secreta123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "user_id": "uuid",
///   "username": "ana1",
///   "role": "Tutor",
///   "token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing fields
/// - `401 Unauthorized`: Invalid credentials
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let claims = jwt::Claims::new(user.id, user.username.clone(), user.role);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::debug!(username = %user.username, "user logged in");

    Ok(Json(LoginResponse {
        user_id: user.id,
        username: user.username,
        role: user.role,
        token,
    }))
}

/// Reads the multipart body into a [`RegisterForm`]
///
/// Unknown fields are ignored; `subject_ids` may repeat or hold a
/// comma-separated list. An empty image part (a file input left blank)
/// counts as no image.
async fn parse_register_form(mut multipart: Multipart) -> Result<RegisterForm, ApiError> {
    let mut form = RegisterForm::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed_form)? {
        let Some(name) = field.name().map(|n| n.to_string()) else {
            continue;
        };

        match name.as_str() {
            "display_name" => form.display_name = Some(field_text(field).await?),
            "date_of_birth" => form.date_of_birth = Some(field_text(field).await?),
            "username" => form.username = Some(field_text(field).await?),
            "password" => form.password = Some(field_text(field).await?),
            "password_confirmation" => {
                form.password_confirmation = Some(field_text(field).await?)
            }
            "role" => form.role = Some(field_text(field).await?),
            "institution" => form.institution = Some(field_text(field).await?),
            "semester" => form.semester = Some(field_text(field).await?),
            "major_id" => form.major_id = Some(field_text(field).await?),
            "subject_ids" => {
                let raw = field_text(field).await?;
                form.subject_ids.extend(
                    raw.split(',')
                        .map(|token| token.trim().to_string())
                        .filter(|token| !token.is_empty()),
                );
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("profile").to_string();
                let data = field.bytes().await.map_err(malformed_form)?;
                if !data.is_empty() {
                    form.image = Some((file_name, data));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn field_text(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(malformed_form)
}

fn malformed_form<E>(_: E) -> ApiError {
    ApiError::BadRequest("Malformed multipart form".to_string())
}

/// Checks every registration field and produces typed values
///
/// `today` is passed in so the age rule is testable.
fn validate_registration(
    form: RegisterForm,
    today: NaiveDate,
) -> Result<ValidatedRegistration, ApiError> {
    let display_name = require_text(form.display_name, "Display name is required")?;
    if !is_name_like(&display_name) {
        return Err(ApiError::BadRequest(
            "Display name may only contain letters and spaces".to_string(),
        ));
    }

    let institution = require_text(form.institution, "Institution is required")?;
    if !is_name_like(&institution) {
        return Err(ApiError::BadRequest(
            "Institution may only contain letters and spaces".to_string(),
        ));
    }

    let username = require_text(form.username, "Username is required")?;
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::BadRequest(
            "Username may only contain letters and numbers".to_string(),
        ));
    }

    let date_raw = require_text(form.date_of_birth, "Date of birth is required")?;
    let date_of_birth = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest("Date of birth must be a valid YYYY-MM-DD date".to_string())
    })?;
    let age = today.years_since(date_of_birth).ok_or_else(|| {
        ApiError::BadRequest("Date of birth cannot be in the future".to_string())
    })?;
    if age < MINIMUM_AGE {
        return Err(ApiError::BadRequest(format!(
            "You must be at least {} years old to register",
            MINIMUM_AGE
        )));
    }

    let password = require_text(form.password, "Password is required")?;
    password::validate_password_policy(&password).map_err(ApiError::BadRequest)?;
    let confirmation =
        require_text(form.password_confirmation, "Password confirmation is required")?;
    if password != confirmation {
        return Err(ApiError::BadRequest("Passwords do not match".to_string()));
    }

    let role_raw = require_text(form.role, "Role is required")?;
    let role = match role_raw.as_str() {
        "Learner" => UserRole::Learner,
        "Tutor" => UserRole::Tutor,
        "Admin" => UserRole::Admin,
        _ => {
            return Err(ApiError::BadRequest(
                "Role must be Learner or Tutor".to_string(),
            ))
        }
    };
    if !role.is_registrable() {
        return Err(ApiError::BadRequest(
            "Role must be Learner or Tutor".to_string(),
        ));
    }

    let semester_raw = require_text(form.semester, "Semester is required")?;
    let semester = semester_raw.parse::<i16>().ok().filter(|s| (1..=8).contains(s));
    let Some(semester) = semester else {
        return Err(ApiError::BadRequest(
            "Semester must be a number between 1 and 8".to_string(),
        ));
    };

    let major_raw = require_text(form.major_id, "Major is required")?;
    let major_id = major_raw
        .parse::<i32>()
        .map_err(|_| ApiError::BadRequest("Major id must be an integer".to_string()))?;

    let mut subject_ids = Vec::with_capacity(form.subject_ids.len());
    for token in &form.subject_ids {
        let id = token
            .parse::<i32>()
            .map_err(|_| ApiError::BadRequest("Subject ids must be integers".to_string()))?;
        subject_ids.push(id);
    }
    subject_ids.sort_unstable();
    subject_ids.dedup();

    if role == UserRole::Tutor && subject_ids.len() < MIN_TUTOR_SUBJECTS {
        return Err(ApiError::BadRequest(format!(
            "Tutors must declare at least {} distinct subjects",
            MIN_TUTOR_SUBJECTS
        )));
    }

    Ok(ValidatedRegistration {
        display_name,
        date_of_birth,
        username,
        password,
        role,
        institution,
        semester,
        major_id,
        subject_ids,
    })
}

fn require_text(value: Option<String>, message: &str) -> Result<String, ApiError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ApiError::BadRequest(message.to_string())),
    }
}

/// Letters and spaces only; covers accented names like "José Pérez"
fn is_name_like(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_alphabetic() || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn valid_form() -> RegisterForm {
        RegisterForm {
            display_name: Some("Ana García".to_string()),
            date_of_birth: Some("2003-04-12".to_string()),
            username: Some("ana1".to_string()),
            password: Some("secreta123".to_string()),
            password_confirmation: Some("secreta123".to_string()),
            role: Some("Tutor".to_string()),
            institution: Some("Universidad Central".to_string()),
            semester: Some("6".to_string()),
            major_id: Some("1".to_string()),
            subject_ids: vec!["1".to_string(), "2".to_string(), "5".to_string()],
            image: None,
        }
    }

    fn error_message(err: ApiError) -> String {
        match err {
            ApiError::BadRequest(msg) => msg,
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_tutor_registration() {
        let registration = validate_registration(valid_form(), today()).unwrap();

        assert_eq!(registration.username, "ana1");
        assert_eq!(registration.role, UserRole::Tutor);
        assert_eq!(registration.subject_ids, vec![1, 2, 5]);
        assert_eq!(registration.semester, 6);
    }

    #[test]
    fn test_valid_learner_needs_no_subjects() {
        let mut form = valid_form();
        form.role = Some("Learner".to_string());
        form.subject_ids = vec![];

        let registration = validate_registration(form, today()).unwrap();
        assert_eq!(registration.role, UserRole::Learner);
        assert!(registration.subject_ids.is_empty());
    }

    #[test]
    fn test_name_rejects_digits() {
        let mut form = valid_form();
        form.display_name = Some("Ana2 García".to_string());

        let msg = error_message(validate_registration(form, today()).unwrap_err());
        assert!(msg.contains("letters and spaces"));
    }

    #[test]
    fn test_accented_names_are_accepted() {
        let mut form = valid_form();
        form.display_name = Some("José Pérez Ñáñez".to_string());

        assert!(validate_registration(form, today()).is_ok());
    }

    #[test]
    fn test_username_rejects_symbols_and_spaces() {
        for bad in ["ana 1", "ana-1", "ana_1", "aná1"] {
            let mut form = valid_form();
            form.username = Some(bad.to_string());

            let msg = error_message(validate_registration(form, today()).unwrap_err());
            assert!(msg.contains("letters and numbers"), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_minimum_age_boundary() {
        // Turns 17 exactly on `today`
        let mut form = valid_form();
        form.date_of_birth = Some("2008-01-15".to_string());
        assert!(validate_registration(form, today()).is_ok());

        // One day short of 17
        let mut form = valid_form();
        form.date_of_birth = Some("2008-01-16".to_string());
        let msg = error_message(validate_registration(form, today()).unwrap_err());
        assert!(msg.contains("at least 17"));
    }

    #[test]
    fn test_future_date_of_birth_rejected() {
        let mut form = valid_form();
        form.date_of_birth = Some("2026-01-01".to_string());

        let msg = error_message(validate_registration(form, today()).unwrap_err());
        assert!(msg.contains("future"));
    }

    #[test]
    fn test_malformed_date_rejected() {
        let mut form = valid_form();
        form.date_of_birth = Some("12/04/2003".to_string());

        let msg = error_message(validate_registration(form, today()).unwrap_err());
        assert!(msg.contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_password_confirmation_must_match() {
        let mut form = valid_form();
        form.password_confirmation = Some("otracosa123".to_string());

        let msg = error_message(validate_registration(form, today()).unwrap_err());
        assert!(msg.contains("do not match"));
    }

    #[test]
    fn test_short_password_rejected() {
        let mut form = valid_form();
        form.password = Some("corta12".to_string());
        form.password_confirmation = Some("corta12".to_string());

        let msg = error_message(validate_registration(form, today()).unwrap_err());
        assert!(msg.contains("at least 8"));
    }

    #[test]
    fn test_admin_role_not_registrable() {
        let mut form = valid_form();
        form.role = Some("Admin".to_string());

        let msg = error_message(validate_registration(form, today()).unwrap_err());
        assert!(msg.contains("Learner or Tutor"));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let mut form = valid_form();
        form.role = Some("Profesor".to_string());

        let msg = error_message(validate_registration(form, today()).unwrap_err());
        assert!(msg.contains("Learner or Tutor"));
    }

    #[test]
    fn test_semester_bounds() {
        for bad in ["0", "9", "abc"] {
            let mut form = valid_form();
            form.semester = Some(bad.to_string());

            let msg = error_message(validate_registration(form, today()).unwrap_err());
            assert!(msg.contains("between 1 and 8"), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_tutor_needs_three_distinct_subjects() {
        // Two subjects
        let mut form = valid_form();
        form.subject_ids = vec!["1".to_string(), "2".to_string()];
        let msg = error_message(validate_registration(form, today()).unwrap_err());
        assert!(msg.contains("at least 3"));

        // Three entries but only two distinct
        let mut form = valid_form();
        form.subject_ids = vec!["1".to_string(), "1".to_string(), "2".to_string()];
        let msg = error_message(validate_registration(form, today()).unwrap_err());
        assert!(msg.contains("at least 3"));
    }

    #[test]
    fn test_subject_ids_accept_comma_separated_token() {
        // parse_register_form splits commas; validation handles pre-split
        // tokens either way
        let mut form = valid_form();
        form.subject_ids = vec!["1".to_string(), "2".to_string(), "5".to_string()];

        let registration = validate_registration(form, today()).unwrap();
        assert_eq!(registration.subject_ids, vec![1, 2, 5]);
    }

    #[test]
    fn test_subject_ids_must_be_integers() {
        let mut form = valid_form();
        form.subject_ids = vec!["1".to_string(), "dos".to_string(), "3".to_string()];

        let msg = error_message(validate_registration(form, today()).unwrap_err());
        assert!(msg.contains("integers"));
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let mut form = valid_form();
        form.institution = None;

        let msg = error_message(validate_registration(form, today()).unwrap_err());
        assert!(msg.contains("Institution is required"));
    }
}
