/// Subject ("materia") catalog model and tutor declarations
///
/// Subjects are a read-only catalog seeded by migration. The
/// `tutor_subjects` join table records which subjects a tutor offers; it
/// is written only inside the registration transaction and read by the
/// directory and profile endpoints.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subjects (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL UNIQUE
/// );
///
/// CREATE TABLE tutor_subjects (
///     tutor_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     subject_id INTEGER NOT NULL REFERENCES subjects(id),
///     PRIMARY KEY (tutor_id, subject_id)
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A subject tutoring can be requested for
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subject {
    /// Catalog ID
    pub id: i32,

    /// Display name, e.g. "Cálculo Diferencial e Integral"
    pub name: String,
}

/// A tutor's subject declaration, used when loading subjects for a whole
/// directory page in one query
#[derive(Debug, Clone)]
pub struct TutorSubject {
    pub tutor_id: Uuid,
    pub subject: Subject,
}

impl Subject {
    /// Lists the full catalog in id order
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let subjects = sqlx::query_as::<_, Subject>(
            "SELECT id, name FROM subjects ORDER BY id ASC",
        )
        .fetch_all(pool)
        .await?;

        Ok(subjects)
    }

    /// Counts how many of the given ids exist in the catalog
    ///
    /// Registration uses this to reject unknown subject ids with a clean
    /// message instead of surfacing a foreign-key violation.
    pub async fn count_existing(pool: &PgPool, ids: &[i32]) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM subjects WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Lists the subjects a tutor declared at registration
    pub async fn list_for_tutor(pool: &PgPool, tutor_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let subjects = sqlx::query_as::<_, Subject>(
            r#"
            SELECT s.id, s.name
            FROM subjects s
            JOIN tutor_subjects ts ON ts.subject_id = s.id
            WHERE ts.tutor_id = $1
            ORDER BY s.id ASC
            "#,
        )
        .bind(tutor_id)
        .fetch_all(pool)
        .await?;

        Ok(subjects)
    }

    /// Lists subject declarations for every tutor at once
    ///
    /// The directory endpoint groups these by `tutor_id` client-side
    /// instead of issuing one query per tutor.
    pub async fn list_all_tutor_subjects(pool: &PgPool) -> Result<Vec<TutorSubject>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (Uuid, i32, String)>(
            r#"
            SELECT ts.tutor_id, s.id, s.name
            FROM tutor_subjects ts
            JOIN subjects s ON s.id = ts.subject_id
            ORDER BY ts.tutor_id, s.id ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(tutor_id, id, name)| TutorSubject {
                tutor_id,
                subject: Subject { id, name },
            })
            .collect())
    }
}
