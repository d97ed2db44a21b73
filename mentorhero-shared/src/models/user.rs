/// User model and database operations
///
/// Accounts for learners, tutors, and administrators. Tutors additionally
/// own rows in `tutor_subjects` (written only by the registration
/// transaction) and appear in the public directory.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('learner', 'tutor', 'admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     display_name VARCHAR(255) NOT NULL,
///     date_of_birth DATE NOT NULL,
///     username VARCHAR(50) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL,
///     institution VARCHAR(255) NOT NULL,
///     semester SMALLINT NOT NULL CHECK (semester BETWEEN 1 AND 8),
///     profile_image_url VARCHAR(512),
///     major_id INTEGER NOT NULL REFERENCES majors(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use mentorhero_shared::models::user::{CreateUser, User, UserRole};
/// use mentorhero_shared::db::pool::{create_pool, DatabaseConfig};
/// use chrono::NaiveDate;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     display_name: "Ana García".to_string(),
///     date_of_birth: NaiveDate::from_ymd_opt(2003, 4, 12).unwrap(),
///     username: "ana1".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::Tutor,
///     institution: "Universidad Central".to_string(),
///     semester: 6,
///     profile_image_url: None,
///     major_id: 1,
/// };
///
/// // Tutors register with their declared subjects in one transaction
/// let user = User::register(&pool, new_user, &[1, 2, 5]).await?;
/// println!("Created user: {}", user.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Account roles
///
/// Stored as the PostgreSQL `user_role` enum; serialized with the
/// capitalized names clients display. Admin accounts exist but cannot be
/// created through registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRole {
    /// Requests tutoring sessions ("Aprendiz")
    Learner,

    /// Offers tutoring in declared subjects
    Tutor,

    /// Operational access; not registrable
    Admin,
}

impl UserRole {
    /// Role as its database string
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Learner => "learner",
            UserRole::Tutor => "tutor",
            UserRole::Admin => "admin",
        }
    }

    /// Whether this role may be chosen at registration
    pub fn is_registrable(&self) -> bool {
        match self {
            UserRole::Learner | UserRole::Tutor => true,
            UserRole::Admin => false,
        }
    }
}

/// User model representing an account
///
/// The password hash never leaves the server: it is excluded from
/// serialization, and handlers build dedicated response types anyway.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Full display name (letters and spaces only)
    pub display_name: String,

    /// Date of birth; registration requires an age of at least 17
    pub date_of_birth: NaiveDate,

    /// Login name, unique and alphanumeric
    pub username: String,

    /// Argon2id password hash (PHC string)
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Account role; immutable after creation
    pub role: UserRole,

    /// Institution the student belongs to
    pub institution: String,

    /// Current semester, 1 through 8
    pub semester: i16,

    /// Hosted profile image URL, if one was uploaded
    pub profile_image_url: Option<String>,

    /// Major ("carrera") this student is enrolled in
    pub major_id: i32,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
///
/// All field validation (character classes, age, semester range) happens
/// at the API boundary before this struct is built; `password_hash` is
/// already hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub display_name: String,
    pub date_of_birth: NaiveDate,
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
    pub institution: String,
    pub semester: i16,
    pub profile_image_url: Option<String>,
    pub major_id: i32,
}

/// Input for the profile update operation
///
/// Only non-None fields are written; role and identity fields are not
/// updatable.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    /// New semester (1..8, validated at the boundary)
    pub semester: Option<i16>,

    /// New hosted profile image URL
    pub profile_image_url: Option<String>,
}

/// One row of the tutor directory
///
/// Aggregates the tutor's received ratings in SQL; `average_stars` is NULL
/// (None) for tutors nobody has rated yet.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TutorDirectoryEntry {
    pub id: Uuid,
    pub display_name: String,
    pub username: String,
    pub profile_image_url: Option<String>,
    pub semester: i16,
    pub major_name: String,
    pub average_stars: Option<f64>,
    pub rating_count: i64,
}

impl User {
    /// Registers a new user, with declared subjects for tutors
    ///
    /// The user insert and the `tutor_subjects` inserts run in one
    /// transaction: a Tutor row never exists without its subject rows.
    /// `subject_ids` is ignored for learners.
    ///
    /// # Errors
    ///
    /// Returns a unique-constraint violation when the username is taken,
    /// and a foreign-key violation when a subject or major id is unknown;
    /// either way nothing persists.
    pub async fn register(
        pool: &PgPool,
        data: CreateUser,
        subject_ids: &[i32],
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (display_name, date_of_birth, username, password_hash,
                               role, institution, semester, profile_image_url, major_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, display_name, date_of_birth, username, password_hash,
                      role, institution, semester, profile_image_url, major_id,
                      created_at, updated_at
            "#,
        )
        .bind(data.display_name)
        .bind(data.date_of_birth)
        .bind(data.username)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.institution)
        .bind(data.semester)
        .bind(data.profile_image_url)
        .bind(data.major_id)
        .fetch_one(&mut *tx)
        .await?;

        if user.role == UserRole::Tutor {
            for subject_id in subject_ids {
                sqlx::query(
                    "INSERT INTO tutor_subjects (tutor_id, subject_id) VALUES ($1, $2)",
                )
                .bind(user.id)
                .bind(subject_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(user)
    }

    /// Finds a user by ID
    ///
    /// # Returns
    ///
    /// The user if found, None otherwise
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, display_name, date_of_birth, username, password_hash,
                   role, institution, semester, profile_image_url, major_id,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by username (exact match; usernames are stored as
    /// submitted and are alphanumeric)
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, display_name, date_of_birth, username, password_hash,
                   role, institution, semester, profile_image_url, major_id,
                   created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates the mutable profile fields
    ///
    /// Only non-None fields in `data` are written; `updated_at` is bumped
    /// on any write.
    ///
    /// # Returns
    ///
    /// The updated user if found, None if the id doesn't exist
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build the update dynamically from the fields that are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.semester.is_some() {
            bind_count += 1;
            query.push_str(&format!(", semester = ${}", bind_count));
        }
        if data.profile_image_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", profile_image_url = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, display_name, date_of_birth, username, \
             password_hash, role, institution, semester, profile_image_url, major_id, \
             created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(semester) = data.semester {
            q = q.bind(semester);
        }
        if let Some(image_url) = data.profile_image_url {
            q = q.bind(image_url);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Lists every tutor with their aggregated reputation
    ///
    /// The average comes back NULL for unrated tutors; presentation
    /// rounding happens in the `reputation` module.
    pub async fn list_tutors(pool: &PgPool) -> Result<Vec<TutorDirectoryEntry>, sqlx::Error> {
        let tutors = sqlx::query_as::<_, TutorDirectoryEntry>(
            r#"
            SELECT u.id, u.display_name, u.username, u.profile_image_url, u.semester,
                   m.name AS major_name,
                   AVG(r.stars)::float8 AS average_stars,
                   COUNT(r.id) AS rating_count
            FROM users u
            JOIN majors m ON m.id = u.major_id
            LEFT JOIN tutor_ratings r ON r.tutor_id = u.id
            WHERE u.role = 'tutor'
            GROUP BY u.id, u.display_name, u.username, u.profile_image_url,
                     u.semester, m.name
            ORDER BY u.display_name ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(tutors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(UserRole::Learner.as_str(), "learner");
        assert_eq!(UserRole::Tutor.as_str(), "tutor");
        assert_eq!(UserRole::Admin.as_str(), "admin");
    }

    #[test]
    fn test_role_registrable() {
        assert!(UserRole::Learner.is_registrable());
        assert!(UserRole::Tutor.is_registrable());
        assert!(!UserRole::Admin.is_registrable());
    }

    #[test]
    fn test_role_serializes_capitalized() {
        assert_eq!(
            serde_json::to_string(&UserRole::Learner).unwrap(),
            "\"Learner\""
        );
        assert_eq!(serde_json::to_string(&UserRole::Tutor).unwrap(), "\"Tutor\"");
    }

    #[test]
    fn test_role_deserializes_capitalized() {
        let role: UserRole = serde_json::from_str("\"Tutor\"").unwrap();
        assert_eq!(role, UserRole::Tutor);
    }

    #[test]
    fn test_update_profile_default_is_empty() {
        let update = UpdateProfile::default();
        assert!(update.semester.is_none());
        assert!(update.profile_image_url.is_none());
    }

    // Integration tests for database operations live in the API crate's
    // tests/ directory.
}
