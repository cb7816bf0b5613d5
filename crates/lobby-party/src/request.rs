//! Request bodies accepted by the coordinator.

use serde::Deserialize;
use serde_json::{Map, Value};

use lobby_types::PartyConfig;

use crate::meta::MetaPatch;

/// Connection descriptor sent by a joining client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionInfo {
    /// Connection id (usually a JID).
    #[serde(default)]
    pub id: String,
    /// Platform and transport meta.
    #[serde(default)]
    pub meta: Map<String, Value>,
}

/// Join information carried by a create request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinInfo {
    /// The creator's connection.
    #[serde(default)]
    pub connection: ConnectionInfo,
    /// The creator's member meta.
    #[serde(default)]
    pub meta: Map<String, Value>,
}

/// Body of a create-party request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePartyRequest {
    /// Requested configuration. The join policy fields are overridden.
    #[serde(default)]
    pub config: PartyConfig,
    /// Creator's join information.
    #[serde(default)]
    pub join_info: JoinInfo,
    /// Initial party meta.
    #[serde(default)]
    pub meta: Map<String, Value>,
}

/// Body of a party patch request. Any `config` sent is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchPartyRequest {
    /// Party meta patch.
    #[serde(default)]
    pub meta: MetaPatch,
}

/// Body of a join request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinRequest {
    /// The joiner's connection.
    #[serde(default)]
    pub connection: ConnectionInfo,
    /// The joiner's member meta.
    #[serde(default)]
    pub meta: Map<String, Value>,
}
