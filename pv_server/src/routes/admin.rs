//! Admin panel and record actions. Mounted behind `require_session`.

use axum::extract::{Path, State};
use axum::response::{Json, Redirect};
use axum::{Extension, Form};
use serde::{Deserialize, Serialize};

use super::{notify, PvState};
use crate::error::PvError;
use crate::models::record::{Record, Status};
use crate::services::record_service;
use crate::session::{AuthenticatedUser, Notice, PvSession};

#[derive(Debug, Serialize)]
pub struct AdminView {
    pub username: String,
    pub counter: i64,
    pub entries: Vec<Record>,
    /// Values accepted by `/update_status/{id}`.
    pub statuses: [Status; 3],
    pub notices: Vec<Notice>,
}

pub async fn admin_view(
    State(state): State<PvState>,
    session: PvSession,
    Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>,
) -> Result<Json<AdminView>, PvError> {
    let snapshot = record_service::admin_snapshot(state.store.as_ref()).await?;

    Ok(Json(AdminView {
        username,
        counter: snapshot.counter,
        entries: snapshot.entries,
        statuses: Status::ALL,
        notices: session.take_notices().await?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AddEntryForm {
    pub date: String,
    pub caidat: String,
}

pub async fn add_entry(
    State(state): State<PvState>,
    session: PvSession,
    Form(form): Form<AddEntryForm>,
) -> Result<Redirect, PvError> {
    let result = record_service::add(state.store.as_ref(), &form.date, &form.caidat).await;
    notify(&session, result, |_| "Entry added.".to_string()).await?;
    Ok(Redirect::to("/admin"))
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

pub async fn update_status(
    State(state): State<PvState>,
    session: PvSession,
    Path(id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, PvError> {
    let result = match form.status.parse::<Status>() {
        Ok(status) => record_service::set_status(state.store.as_ref(), id, status).await,
        Err(e) => Err(e.into()),
    };
    notify(&session, result, |_| "Status updated.".to_string()).await?;
    Ok(Redirect::to("/admin"))
}

pub async fn delete_entry(
    State(state): State<PvState>,
    session: PvSession,
    Path(id): Path<i64>,
) -> Result<Redirect, PvError> {
    let result = record_service::remove(state.store.as_ref(), id).await;
    notify(&session, result, |_| "Entry deleted.".to_string()).await?;
    Ok(Redirect::to("/admin"))
}

#[derive(Debug, Deserialize)]
pub struct CounterForm {
    pub counter: String,
}

pub async fn update_counter(
    State(state): State<PvState>,
    session: PvSession,
    Form(form): Form<CounterForm>,
) -> Result<Redirect, PvError> {
    let result = record_service::set_counter(state.store.as_ref(), &form.counter).await;
    notify(&session, result, |value| format!("Counter set to {value}.")).await?;
    Ok(Redirect::to("/admin"))
}
