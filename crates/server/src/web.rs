//! HTML routes for the product catalog.
//!
//! - `GET  /`                    - redirect to the product list
//! - `GET  /user/index`          - product list
//! - `GET  /user/search`         - product list filtered by `keyword`
//! - `GET  /admin/newProduct`    - creation form
//! - `POST /admin/saveProduct`   - create, or redisplay the form with errors
//! - `GET  /admin/editProduct`   - edit form for `id`
//! - `POST /admin/updateProduct` - overwrite, or redisplay the form with errors
//! - `POST /admin/delete`        - delete `id`
//! - `GET  /login`, `POST /login`, `GET /logout`, `GET /notAuthorized`

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use catalog_core::config::AuthConfig;
use catalog_core::domain::product::{ProductForm, ProductId};
use catalog_core::errors::{ApplicationError, InterfaceError};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::auth::{self, RequestContext};
use crate::catalog::{CatalogOutcome, CatalogService, PRODUCT_LIST_PATH};
use crate::session::{clear_session_cookie, session_cookie, session_id_from_headers, SessionStore};
use crate::views::Views;

type PageResult = Result<Response, (StatusCode, Html<String>)>;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub sessions: Arc<dyn SessionStore>,
    pub auth: Arc<AuthConfig>,
    pub views: Views,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
}

#[derive(Debug, Deserialize)]
pub struct IdParam {
    pub id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/user/index", get(list_products))
        .route("/user/search", get(search_products))
        .route("/admin/newProduct", get(new_product))
        .route("/admin/saveProduct", post(save_product))
        .route("/admin/editProduct", get(edit_product))
        .route("/admin/updateProduct", post(update_product))
        .route("/admin/delete", post(delete_product))
        .route("/notAuthorized", get(not_authorized))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .layer(middleware::from_fn_with_state(state.clone(), auth::gate))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Catalog handlers
// ---------------------------------------------------------------------------

async fn home(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> PageResult {
    state.respond(&ctx, Ok(state.catalog.home()))
}

async fn list_products(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> PageResult {
    let outcome = state.catalog.list().await;
    state.respond(&ctx, outcome)
}

async fn search_products(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<SearchQuery>,
) -> PageResult {
    let outcome = state.catalog.search(&query.keyword).await;
    state.respond(&ctx, outcome)
}

async fn new_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> PageResult {
    let outcome = state.catalog.new_product_form();
    state.respond(&ctx, Ok(outcome))
}

async fn save_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ProductForm>,
) -> PageResult {
    let outcome = state.catalog.save_product(form).await;
    state.respond(&ctx, outcome)
}

async fn edit_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(param): Query<IdParam>,
) -> PageResult {
    let outcome = state.catalog.edit_product_form(ProductId(param.id)).await;
    state.respond(&ctx, outcome)
}

async fn update_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<ProductForm>,
) -> PageResult {
    let outcome = state.catalog.update_product(form).await;
    state.respond(&ctx, outcome)
}

async fn delete_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Form(param): Form<IdParam>,
) -> PageResult {
    let outcome = state.catalog.delete(ProductId(param.id)).await;
    state.respond(&ctx, outcome)
}

// ---------------------------------------------------------------------------
// Session handlers
// ---------------------------------------------------------------------------

async fn not_authorized(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> PageResult {
    let html = state.views.not_authorized(ctx.user()).map_err(|e| state.render_failure(&ctx, e))?;
    Ok(Html(html).into_response())
}

async fn login_page(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> PageResult {
    let html = state.views.login("", None, None).map_err(|e| state.render_failure(&ctx, e))?;
    Ok(Html(html).into_response())
}

async fn login(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> PageResult {
    let Some(principal) = state.auth.authenticate(&form.username, &form.password) else {
        warn!(
            event_name = "catalog.session.rejected",
            correlation_id = %ctx.correlation_id,
            username = %form.username,
            "login rejected"
        );
        let html = state
            .views
            .login(&form.username, Some("Invalid username or password."), None)
            .map_err(|e| state.render_failure(&ctx, e))?;
        return Ok((StatusCode::UNAUTHORIZED, Html(html)).into_response());
    };

    // a fresh login replaces whatever session the browser still holds
    if let Some(previous) = session_id_from_headers(&headers) {
        state.sessions.end(&previous).await;
    }
    let username = principal.username.clone();
    let session = state.sessions.start(principal).await;
    info!(
        event_name = "catalog.session.started",
        correlation_id = %ctx.correlation_id,
        username = %username,
        "session started"
    );

    Ok((
        [(header::SET_COOKIE, session_cookie(&session))],
        Redirect::to(PRODUCT_LIST_PATH),
    )
        .into_response())
}

async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    headers: HeaderMap,
) -> PageResult {
    if let Some(session) = session_id_from_headers(&headers) {
        state.sessions.end(&session).await;
        info!(
            event_name = "catalog.session.ended",
            correlation_id = %ctx.correlation_id,
            username = ctx.user().map(|p| p.username.as_str()).unwrap_or("unknown"),
            "session ended"
        );
    }

    let html = state
        .views
        .login("", None, Some("You have been logged out."))
        .map_err(|e| state.render_failure(&ctx, e))?;
    Ok(([(header::SET_COOKIE, clear_session_cookie())], Html(html)).into_response())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

impl AppState {
    fn respond(
        &self,
        ctx: &RequestContext,
        outcome: Result<CatalogOutcome, ApplicationError>,
    ) -> PageResult {
        let outcome = outcome.map_err(|e| self.failure(ctx, e.into_interface(&ctx.correlation_id)))?;
        let user = ctx.user();

        let rendered = match outcome {
            CatalogOutcome::Redirect(to) => return Ok(Redirect::to(to).into_response()),
            CatalogOutcome::ProductList { products, keyword } => {
                self.views.products(user, &products, keyword.as_deref())
            }
            CatalogOutcome::NewProductForm { form, errors } => {
                self.views.new_product(user, &form, &errors)
            }
            CatalogOutcome::EditProductForm { form, errors } => {
                self.views.edit_product(user, &form, &errors)
            }
        };

        let html = rendered.map_err(|e| self.render_failure(ctx, e))?;
        Ok(Html(html).into_response())
    }

    fn render_failure(&self, ctx: &RequestContext, error: tera::Error) -> (StatusCode, Html<String>) {
        self.failure(
            ctx,
            InterfaceError::Internal {
                message: format!("template rendering failed: {error}"),
                correlation_id: ctx.correlation_id.clone(),
            },
        )
    }

    fn failure(&self, ctx: &RequestContext, error: InterfaceError) -> (StatusCode, Html<String>) {
        let status = match error {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!(
            event_name = "catalog.request.failed",
            correlation_id = %error.correlation_id(),
            username = ctx.user().map(|p| p.username.as_str()).unwrap_or("anonymous"),
            status = status.as_u16(),
            error = %error,
            "request failed"
        );

        let html = self.views.error(error.user_message(), error.correlation_id()).unwrap_or_else(
            |_| {
                format!(
                    "<h1>Error</h1><p>{}</p><p>Reference: {}</p>",
                    error.user_message(),
                    error.correlation_id()
                )
            },
        );
        (status, Html(html))
    }
}
