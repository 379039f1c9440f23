use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use tracing::instrument;

use super::{
    dto::{CreateUserRequest, UpdateUserRequest},
    extractors::ValidatedJson,
    repo_types::PublicUser,
};
use crate::{response::Reply, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Reply<Vec<PublicUser>> {
    state.users.list().await
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> Reply<PublicUser> {
    state.users.create(payload).await
}

#[instrument(skip(state))]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Reply<PublicUser> {
    state.users.get_by_id(&id).await
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> Reply<PublicUser> {
    state.users.update(&id, payload).await
}

#[instrument(skip(state))]
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> Reply<()> {
    state.users.delete(&id).await
}
