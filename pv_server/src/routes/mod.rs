//! PV HTTP routes — public view, login/logout, admin panel and actions.
//!
//! Views are served as JSON view-models; form posts answer with a `303`
//! redirect and leave their outcome as a flash notice in the session.

pub mod admin;
pub mod public;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::PvError;
use crate::services::auth_service::Credentials;
use crate::session::{self, NoticeLevel, PvSession, SessionSettings};
use crate::store::PvStore;

/// Shared state for PV route handlers.
#[derive(Clone)]
pub struct PvState {
    pub store: Arc<dyn PvStore>,
    pub credentials: Arc<Credentials>,
    pub sessions: SessionSettings,
}

/// Build the application router.
pub fn pv_router(state: PvState) -> Router {
    let protected = Router::new()
        .route("/admin", get(admin::admin_view))
        .route("/add_entry", post(admin::add_entry))
        .route("/update_status/{id}", post(admin::update_status))
        .route("/delete_entry/{id}", post(admin::delete_entry))
        .route("/update_counter", post(admin::update_counter))
        .route_layer(middleware::from_fn(session::require_session));

    Router::new()
        .route("/", get(public::index))
        .route("/login", get(public::login_form).post(public::login))
        .route("/logout", get(public::logout))
        .route("/health", get(public::health))
        .merge(protected)
        .layer(session::session_manager(&state.sessions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Turn a service outcome into a flash notice.
///
/// User-level failures become error notices; store and session failures are
/// returned so the request fails with a 500.
async fn notify<T>(
    session: &PvSession,
    result: Result<T, PvError>,
    success: impl FnOnce(&T) -> String,
) -> Result<Option<T>, PvError> {
    match result {
        Ok(value) => {
            session.flash(NoticeLevel::Success, success(&value)).await?;
            Ok(Some(value))
        }
        Err(e) if e.is_notice() => {
            session.flash(NoticeLevel::Error, e.to_string()).await?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
