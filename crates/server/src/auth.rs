//! Session resolution and the role gate in front of `/user` and `/admin`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use catalog_core::domain::principal::{Principal, Role};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::session::session_id_from_headers;
use crate::web::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const NOT_AUTHORIZED_PATH: &str = "/notAuthorized";

/// Per-request data attached by [`gate`] to every routed request.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub correlation_id: String,
    pub user: Option<Principal>,
}

impl RequestContext {
    pub fn user(&self) -> Option<&Principal> {
        self.user.as_ref()
    }
}

/// Role a path prefix demands, if any.
pub fn required_role(path: &str) -> Option<Role> {
    let under = |prefix: &str| {
        path.strip_prefix(prefix).is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    };

    if under("/admin") {
        Some(Role::Admin)
    } else if under("/user") {
        Some(Role::User)
    } else {
        None
    }
}

pub async fn gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let user = if state.auth.enabled {
        match session_id_from_headers(request.headers()) {
            Some(session) => state.sessions.get(&session).await,
            None => None,
        }
    } else {
        Some(Principal::anonymous())
    };

    let path = request.uri().path().to_string();
    if let Some(role) = required_role(&path) {
        match &user {
            None => return Redirect::to(LOGIN_PATH).into_response(),
            Some(principal) if !principal.has_role(role) => {
                warn!(
                    event_name = "catalog.session.forbidden",
                    correlation_id = %correlation_id,
                    username = %principal.username,
                    required_role = role.as_str(),
                    path = %path,
                    "principal lacks required role"
                );
                return Redirect::to(NOT_AUTHORIZED_PATH).into_response();
            }
            Some(_) => {}
        }
    }

    let span = info_span!(
        "request",
        correlation_id = %correlation_id,
        method = %request.method(),
        path = %path,
    );
    request.extensions_mut().insert(RequestContext { correlation_id, user });
    next.run(request).instrument(span).await
}
