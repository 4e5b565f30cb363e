use std::fmt;

use serde::{Deserialize, Serialize};

/// Host-assigned identifier of a space, stable for the space's lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(pub String);

impl SpaceId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for SpaceId {
    fn from(id: &str) -> Self { Self(id.to_string()) }
}

/// Host window identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub String);

impl WindowId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for WindowId {
    fn from(id: &str) -> Self { Self(id.to_string()) }
}

/// One virtual desktop as reported by the host.
///
/// Field names are the wire contract with the host-side Lua; they must stay
/// in sync with the record shape built in `remote::spaces`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: SpaceId,
    pub name: String,
    pub screen_id: String,
    pub screen_name: String,
    /// True for exactly one space per screen; recomputed on every refresh
    /// and updated optimistically on navigation.
    pub is_current: bool,
}

/// One application window as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
    pub application: String,
    pub is_minimized: bool,
    pub is_fullscreen: bool,
    /// Base64 data-URI of the window's appearance, populated lazily or
    /// inline during listing depending on configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
}

/// A running GUI application and its bundle path, used to resolve icons.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPath {
    pub name: String,
    pub path: String,
}
