use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;

use crate::models::NewEmployee;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn add_employee(
    State(state): State<AppState>,
    payload: Result<Json<NewEmployee>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(submission) = payload?;
    let employee = state.service.add_employee(submission).await?;
    Ok(created(employee, "Employee data submitted successfully!"))
}

pub async fn get_employee(
    State(state): State<AppState>,
    Path(emp_id): Path<String>,
) -> Result<Response, AppError> {
    match state.service.find_employee(&emp_id).await? {
        Some(employee) => Ok(success(employee, "Employee found")),
        None => Err(AppError::NotFound(format!(
            "Employee with id '{}' was not found",
            emp_id
        ))),
    }
}
