/// Major ("carrera") catalog model
///
/// Read-only catalog seeded by migration. Registration references majors
/// by their integer id.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE majors (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL UNIQUE
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A major students can be enrolled in
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Major {
    /// Catalog ID
    pub id: i32,

    /// Display name, e.g. "Ingeniería de Software"
    pub name: String,
}

impl Major {
    /// Lists the full catalog in id order
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let majors = sqlx::query_as::<_, Major>(
            "SELECT id, name FROM majors ORDER BY id ASC",
        )
        .fetch_all(pool)
        .await?;

        Ok(majors)
    }

    /// Finds a major by ID
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let major = sqlx::query_as::<_, Major>(
            "SELECT id, name FROM majors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(major)
    }
}
