/// Catalog endpoints
///
/// Read-only reference data the registration and request forms need
/// before a session exists, so both endpoints are public.
///
/// # Endpoints
///
/// - `GET /api/catalog/majors` - List majors ("carreras")
/// - `GET /api/catalog/subjects` - List subjects ("materias")

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use mentorhero_shared::models::{Major, Subject};

/// Lists every major in the catalog
///
/// # Response
///
/// ```json
/// [
///   { "id": 1, "name": "Ingeniería de Software" },
///   { "id": 2, "name": "Marketing Digital" }
/// ]
/// ```
pub async fn list_majors(State(state): State<AppState>) -> ApiResult<Json<Vec<Major>>> {
    let majors = Major::list(&state.db).await?;
    Ok(Json(majors))
}

/// Lists every subject in the catalog
///
/// # Response
///
/// ```json
/// [
///   { "id": 1, "name": "Cálculo Diferencial e Integral" },
///   { "id": 2, "name": "Fundamentos de Programación" }
/// ]
/// ```
pub async fn list_subjects(State(state): State<AppState>) -> ApiResult<Json<Vec<Subject>>> {
    let subjects = Subject::list(&state.db).await?;
    Ok(Json(subjects))
}
