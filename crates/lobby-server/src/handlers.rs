//! REST endpoint handlers.
//!
//! The authentication collaborator sits in front of this server and passes
//! the caller's account in the `x-account-id` header.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/fortnite/api/game/v2/profile/{accountId}/client/{action}` | Run a profile command |
//! | `POST` | `/fortnite/api/game/v2/profile/{accountId}/dedicated_server/{action}` | Read-only profile projection |
//! | `POST` | `/party/api/v1/Fortnite/parties` | Create a party |
//! | `GET` | `/party/api/v1/Fortnite/parties/{partyId}` | Get a party |
//! | `PATCH` | `/party/api/v1/Fortnite/parties/{partyId}` | Patch party meta |
//! | `PATCH` | `/party/api/v1/Fortnite/parties/{partyId}/members/{memberId}/meta` | Patch member meta |
//! | `POST` | `/party/api/v1/Fortnite/parties/{partyId}/members/{memberId}/join` | Join a party |
//! | `DELETE` | `/party/api/v1/Fortnite/parties/{partyId}/members/{memberId}` | Remove a member |
//! | `GET` | `/party/api/v1/Fortnite/user/{accountId}` | Caller's party, created on demand |
//! | `GET` | `/party/api/v1/Fortnite/user/{accountId}/pings/{friendId}/parties` | A friend's party |
//! | `POST` | `/api/accounts` | Provision an account |
//! | `GET` | `/api/count/party` | Number of live parties |
//! | `GET` | `/api/count/players` | Number of connected sockets |

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use lobby_party::{CreatePartyRequest, JoinRequest, MetaPatch, PatchPartyRequest};
use lobby_types::{AccountId, Party, PartyId, ProfileId};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the authenticated account id.
pub const ACCOUNT_HEADER: &str = "x-account-id";

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Caller(pub AccountId);

impl Caller {
    /// Reject unless the caller is `account_id`.
    fn require(&self, account_id: &str) -> Result<(), ApiError> {
        if self.0.as_str() == account_id {
            Ok(())
        } else {
            Err(ApiError::Unauthorized(format!(
                "{} cannot act for {account_id}",
                self.0
            )))
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ACCOUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| Self(AccountId::from(v)))
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {ACCOUNT_HEADER} header")))
    }
}

/// Reject unless `caller` is a member of `party_id`; returns the party.
async fn require_member(
    state: &AppState,
    party_id: &PartyId,
    caller: &AccountId,
) -> Result<Party, ApiError> {
    let party = state.parties.get_party(party_id).await?;
    if party.contains(caller) {
        Ok(party)
    } else {
        Err(ApiError::Forbidden(format!("{caller} is not in party {party_id}")))
    }
}

/// Decode a JSON body, treating an empty body as `{}`.
fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    let result = if body.is_empty() {
        serde_json::from_value(Value::Object(serde_json::Map::new()))
    } else {
        serde_json::from_slice(body)
    };
    result.map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Query parameters of the profile routes.
#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    /// Target profile.
    #[serde(rename = "profileId", default = "default_profile_id")]
    pub profile_id: String,
    /// Revision the client last saw.
    #[serde(default)]
    pub rvn: Option<i64>,
}

fn default_profile_id() -> String {
    ProfileId::Athena.as_str().to_owned()
}

/// Run one profile command for the caller.
pub async fn profile_command(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((account_id, action)): Path<(String, String)>,
    Query(query): Query<ProfileQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    caller.require(&account_id)?;
    let body: Value = decode(&body)?;
    let response = state
        .profiles
        .handle(
            &caller.0,
            &ProfileId::from(query.profile_id),
            &action,
            body,
            query.rvn,
        )
        .await?;
    Ok(Json(response))
}

/// Read any account's profile for a dedicated server.
pub async fn dedicated_server_profile(
    State(state): State<Arc<AppState>>,
    Path((account_id, _action)): Path<(String, String)>,
    Query(query): Query<ProfileQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state
        .profiles
        .read_profile(&AccountId::from(account_id), &ProfileId::from(query.profile_id))
        .await?;
    Ok(Json(response))
}

/// Body of the account provisioning route.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    /// Account id; generated when absent.
    #[serde(default)]
    pub account_id: Option<String>,
    /// Display name.
    pub display_name: String,
}

/// Provision an account with its profiles and loadouts.
pub async fn provision_account(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: ProvisionRequest = decode(&body)?;
    let account_id = request
        .account_id
        .map_or_else(AccountId::generate, AccountId::from);
    let account = state
        .profiles
        .provision(&account_id, &request.display_name)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

// ---------------------------------------------------------------------------
// Party
// ---------------------------------------------------------------------------

/// Create a party captained by the caller.
pub async fn create_party(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: CreatePartyRequest = decode(&body)?;
    let display_name = state.display_name(&caller.0).await;
    let party = state
        .parties
        .create_party(&caller.0, &display_name, request)
        .await?;
    Ok(Json(party))
}

/// Get a party by id.
pub async fn get_party(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Path(party_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let party = state.parties.get_party(&PartyId::from(party_id)).await?;
    Ok(Json(party))
}

/// Patch a party's meta. Any member may patch.
pub async fn patch_party(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(party_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let party_id = PartyId::from(party_id);
    require_member(&state, &party_id, &caller.0).await?;
    let request: PatchPartyRequest = decode(&body)?;
    let party = state.parties.patch_party(&party_id, request).await?;
    Ok(Json(party))
}

/// Patch one member's meta. Only that member may patch it.
pub async fn patch_member_meta(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((party_id, member_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    caller.require(&member_id)?;
    let party_id = PartyId::from(party_id);
    require_member(&state, &party_id, &caller.0).await?;
    let patch: MetaPatch = decode(&body)?;
    let party = state
        .parties
        .patch_member_meta(&party_id, &caller.0, &patch)
        .await?;
    Ok(Json(party))
}

/// Move the caller into a party, leaving its current one first.
pub async fn join_party(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((party_id, member_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    caller.require(&member_id)?;
    let request: JoinRequest = decode(&body)?;
    let party_id = PartyId::from(party_id);

    state.parties.leave_current(&caller.0).await?;
    state
        .parties
        .join_member(&party_id, &caller.0, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"status": "JOINED", "party_id": party_id})),
    ))
}

/// Remove a member from a party: the member leaving, or the captain kicking.
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((party_id, member_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let party_id = PartyId::from(party_id);
    let party = require_member(&state, &party_id, &caller.0).await?;
    let is_captain = party.captain().is_some_and(|c| c.account_id == caller.0);
    if caller.0.as_str() != member_id && !is_captain {
        return Err(ApiError::Forbidden(format!(
            "only the captain can remove {member_id}"
        )));
    }
    let party = state
        .parties
        .remove_member(&party_id, &AccountId::from(member_id))
        .await?;
    Ok(Json(party))
}

/// The caller's party summary, creating a party when it has none.
pub async fn user_parties(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    caller.require(&account_id)?;
    let display_name = state.display_name(&caller.0).await;
    let party = state
        .parties
        .get_or_create(&caller.0, &display_name)
        .await?;
    Ok(Json(json!({
        "current": [party],
        "pending": [],
        "invites": [],
        "pings": [],
    })))
}

/// The party a friend is in.
pub async fn friend_party_pings(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Path((_account_id, friend_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let party = state.parties.party_of(&AccountId::from(friend_id)).await?;
    Ok(Json(vec![party]))
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Number of live parties.
pub async fn party_count(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "count": state.parties.party_count().await }))
}

/// Number of connected notification sockets.
pub async fn player_count(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "count": state.hub.connected() }))
}
