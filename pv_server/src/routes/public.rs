//! Routes reachable without a session: public view, login, logout.

use axum::extract::State;
use axum::response::{Json, Redirect};
use axum::Form;
use serde::{Deserialize, Serialize};

use super::{notify, PvState};
use crate::error::PvError;
use crate::models::record::Record;
use crate::services::{auth_service, record_service};
use crate::session::{Notice, NoticeLevel, PvSession};

#[derive(Debug, Serialize)]
pub struct IndexView {
    pub counter: i64,
    pub processed: Vec<Record>,
    pub notices: Vec<Notice>,
}

pub async fn index(
    State(state): State<PvState>,
    session: PvSession,
) -> Result<Json<IndexView>, PvError> {
    let snapshot = record_service::public_snapshot(state.store.as_ref()).await?;

    Ok(Json(IndexView {
        counter: snapshot.counter,
        processed: snapshot.processed,
        notices: session.take_notices().await?,
    }))
}

#[derive(Debug, Serialize)]
pub struct LoginView {
    /// Set when the caller is already logged in.
    pub username: Option<String>,
    pub notices: Vec<Notice>,
}

pub async fn login_form(session: PvSession) -> Result<Json<LoginView>, PvError> {
    Ok(Json(LoginView {
        username: session.user().await?,
        notices: session.take_notices().await?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<PvState>,
    session: PvSession,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, PvError> {
    let result = auth_service::authenticate(&state.credentials, &form.username, &form.password)
        .map(str::to_string);

    match notify(&session, result, |_| "Logged in.".to_string()).await? {
        Some(username) => {
            session.login(&username).await?;
            Ok(Redirect::to("/admin"))
        }
        None => Ok(Redirect::to("/login")),
    }
}

pub async fn logout(session: PvSession) -> Result<Redirect, PvError> {
    if let Some(username) = session.user().await? {
        tracing::info!(username = %username, "Logged out");
    }
    session.logout().await?;
    session
        .flash(NoticeLevel::Success, "You are logged out.")
        .await?;
    Ok(Redirect::to("/"))
}

pub async fn health() -> &'static str {
    "ok"
}
