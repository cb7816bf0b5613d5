//! Axum router construction for the lobby server.

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router: profile, party, provisioning, counters, and
/// the notification socket. See [`handlers`] for the route table.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let party = Router::new()
        .route("/parties", post(handlers::create_party))
        .route(
            "/parties/{party_id}",
            get(handlers::get_party).patch(handlers::patch_party),
        )
        .route(
            "/parties/{party_id}/members/{member_id}",
            delete(handlers::remove_member),
        )
        .route(
            "/parties/{party_id}/members/{member_id}/meta",
            patch(handlers::patch_member_meta),
        )
        .route(
            "/parties/{party_id}/members/{member_id}/join",
            post(handlers::join_party),
        )
        .route("/user/{account_id}", get(handlers::user_parties))
        .route(
            "/user/{account_id}/pings/{friend_id}/parties",
            get(handlers::friend_party_pings),
        );

    Router::new()
        // Profiles
        .route(
            "/fortnite/api/game/v2/profile/{account_id}/client/{action}",
            post(handlers::profile_command),
        )
        .route(
            "/fortnite/api/game/v2/profile/{account_id}/dedicated_server/{action}",
            post(handlers::dedicated_server_profile),
        )
        .route("/api/accounts", post(handlers::provision_account))
        // Parties
        .nest("/party/api/v1/Fortnite", party)
        // Counters
        .route("/api/count/party", get(handlers::party_count))
        .route("/api/count/players", get(handlers::player_count))
        // Notification socket
        .route("/ws/{account_id}", get(ws::ws_connect))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
