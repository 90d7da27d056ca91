use axum::{extract::State, http::StatusCode, Form, Json};

use crate::association::service::{self, CreateAssociationForm};
use crate::errors::AppError;
use crate::models::association::Association;
use crate::state::AppState;

/// POST /v1/associations
pub async fn handle_create_association(
    State(state): State<AppState>,
    Form(form): Form<CreateAssociationForm>,
) -> Result<(StatusCode, Json<Association>), AppError> {
    let association = service::create_association(state.store.as_ref(), form).await?;
    Ok((StatusCode::CREATED, Json(association)))
}
