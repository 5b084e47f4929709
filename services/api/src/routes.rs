//! API service routes

use auth::{SessionStore, UserContext};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::{
    error::ServiceError,
    middleware::{cleared_session_cookie, session_cookie, session_middleware},
    models::{
        BuyItemRequest, Category, Contributor, CreateItemRequest, CreateListRequest, CreatedItem,
        HealthResponse, Item, ItemView, ListItemsQuery, ListSummary, LoginRequest, LoginResponse,
        ShareListRequest, ShoppingList, SignupRequest,
    },
    repositories::Store,
    service::Authenticated,
    state::AppState,
};

/// Create the router for the API service
pub fn create_router<S: Store, C: SessionStore>(state: AppState<S, C>) -> Router {
    let protected_routes = Router::new()
        .route("/logout", post(logout::<S, C>))
        .route("/list", post(create_list::<S, C>).get(get_lists::<S, C>))
        .route("/item", post(create_item::<S, C>).get(get_list_items::<S, C>))
        .route("/buy", post(buy_item::<S, C>))
        .route("/share", post(share_list::<S, C>))
        .route("/categories", get(get_all_categories::<S, C>))
        .route("/delete/list/:list_id", post(delete_list::<S, C>))
        .route("/delete/item/:item_id", post(delete_item::<S, C>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware::<S, C>,
        ));

    Router::new()
        .route("/ping", get(ping))
        .route("/health", get(health_check::<S, C>))
        .route("/signup", post(signup::<S, C>))
        .route("/login", post(login::<S, C>))
        .merge(protected_routes)
        .with_state(state)
}

/// Attach the rotated session token to a successful result
fn respond<T: Serialize, S: Store, C: SessionStore>(
    state: &AppState<S, C>,
    jar: CookieJar,
    outcome: Authenticated<T>,
) -> (CookieJar, Json<T>) {
    let cookie = session_cookie(outcome.session_token, state.session_ttl());
    (jar.add(cookie), Json(outcome.value))
}

/// Liveness probe
pub async fn ping() -> &'static str {
    "pong"
}

/// Health check endpoint
pub async fn health_check<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
) -> impl IntoResponse {
    let (database, cache) = state.service.health().await;
    let healthy = database && cache;

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        database,
        cache,
        checked_at: Utc::now(),
    };

    (status, Json(body))
}

/// Register a new account
pub async fn signup<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.service.signup(payload).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in and set the session cookie
pub async fn login<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ServiceError> {
    let outcome = state.service.login(payload).await?;
    let ttl = state.session_ttl();

    let response = LoginResponse {
        user: outcome.value,
        expires_in: ttl.as_secs(),
    };
    Ok((
        jar.add(session_cookie(outcome.session_token, ttl)),
        Json(response),
    ))
}

/// Log out and clear the session cookie
pub async fn logout<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
    Extension(ctx): Extension<UserContext>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ServiceError> {
    state.service.logout(&ctx).await?;

    Ok((
        jar.add(cleared_session_cookie()),
        Json(json!({"message": "Logged out"})),
    ))
}

/// Create a list
pub async fn create_list<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
    Extension(ctx): Extension<UserContext>,
    jar: CookieJar,
    Json(payload): Json<CreateListRequest>,
) -> Result<(CookieJar, Json<ShoppingList>), ServiceError> {
    let outcome = state.service.create_list(&ctx, payload).await?;

    Ok(respond(&state, jar, outcome))
}

/// Get every list the caller contributes to
pub async fn get_lists<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
    Extension(ctx): Extension<UserContext>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Vec<ListSummary>>), ServiceError> {
    let outcome = state.service.get_lists(&ctx).await?;

    Ok(respond(&state, jar, outcome))
}

/// Add an item to a list
pub async fn create_item<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
    Extension(ctx): Extension<UserContext>,
    jar: CookieJar,
    Json(payload): Json<CreateItemRequest>,
) -> Result<(CookieJar, Json<CreatedItem>), ServiceError> {
    let outcome = state.service.create_item(&ctx, payload).await?;

    Ok(respond(&state, jar, outcome))
}

/// Get the items of one list
pub async fn get_list_items<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
    Extension(ctx): Extension<UserContext>,
    jar: CookieJar,
    Query(query): Query<ListItemsQuery>,
) -> Result<(CookieJar, Json<Vec<ItemView>>), ServiceError> {
    let outcome = state.service.get_list_items(&ctx, query.list_id).await?;

    Ok(respond(&state, jar, outcome))
}

/// Mark an item bought
pub async fn buy_item<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
    Extension(ctx): Extension<UserContext>,
    jar: CookieJar,
    Json(payload): Json<BuyItemRequest>,
) -> Result<(CookieJar, Json<Item>), ServiceError> {
    let outcome = state.service.buy_item(&ctx, payload).await?;

    Ok(respond(&state, jar, outcome))
}

/// Share a list with another user
pub async fn share_list<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
    Extension(ctx): Extension<UserContext>,
    jar: CookieJar,
    Json(payload): Json<ShareListRequest>,
) -> Result<(CookieJar, Json<Contributor>), ServiceError> {
    let outcome = state.service.share_list(&ctx, payload).await?;

    Ok(respond(&state, jar, outcome))
}

/// Get every category
pub async fn get_all_categories<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
    Extension(ctx): Extension<UserContext>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Vec<Category>>), ServiceError> {
    let outcome = state.service.get_all_categories(&ctx).await?;

    Ok(respond(&state, jar, outcome))
}

/// Soft-delete a list
pub async fn delete_list<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
    Extension(ctx): Extension<UserContext>,
    jar: CookieJar,
    Path(list_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state.service.delete_list(&ctx, list_id).await?;
    let cookie = session_cookie(outcome.session_token, state.session_ttl());

    Ok((
        jar.add(cookie),
        Json(json!({"message": "List deleted", "list_id": list_id})),
    ))
}

/// Soft-delete an item
pub async fn delete_item<S: Store, C: SessionStore>(
    State(state): State<AppState<S, C>>,
    Extension(ctx): Extension<UserContext>,
    jar: CookieJar,
    Path(item_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state.service.delete_item(&ctx, item_id).await?;
    let cookie = session_cookie(outcome.session_token, state.session_ttl());

    Ok((
        jar.add(cookie),
        Json(json!({"message": "Item deleted", "item_id": item_id})),
    ))
}
