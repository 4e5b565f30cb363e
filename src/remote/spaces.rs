//! Space operations.

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::host::{HostBridge, HostError};
use crate::model::{Space, SpaceId};
use crate::remote::{Remote, parse_records};

/// Outcome of [`Remote::remove_current_space`]: the space that was removed
/// and the predecessor the host was navigated to.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedSpace {
    pub removed: SpaceId,
    pub previous: SpaceId,
}

impl<B: HostBridge> Remote<B> {
    /// Enumerate all spaces across all screens. Exactly the host's focused
    /// space comes back marked current.
    #[instrument(skip(self))]
    pub async fn list_spaces(&self) -> Result<Vec<Space>, HostError> {
        let reply = self.bridge.execute(LIST_SPACES).await?;
        parse_records(&reply)
    }

    /// Add a space to the active screen and navigate to it. The host API
    /// does not return the new space's id, so it is inferred positionally
    /// as the last element of the screen's post-creation space list. That
    /// holds because new spaces are appended; if the host ever reorders a
    /// screen's space list this inference breaks.
    #[instrument(skip(self))]
    pub async fn create_space(&self) -> Result<SpaceId, HostError> {
        let reply = self.bridge.execute(CREATE_SPACE).await?;
        let id = SpaceId::new(reply.trim());
        debug!(space = %id, "created space, navigating to it");
        self.goto_space(&id).await?;
        Ok(id)
    }

    /// Remove a space by id. The host raises if the space is current or
    /// cannot be removed; that surfaces as [`HostError::Host`].
    #[instrument(skip(self))]
    pub async fn remove_space(&self, id: &SpaceId) -> Result<(), HostError> {
        self.bridge.execute(&remove_space_payload(id)).await?;
        Ok(())
    }

    /// Remove the currently focused space. Removing the space the UI is
    /// anchored on directly is unsafe, so the host first navigates to the
    /// immediately preceding space on the same screen, we wait for the
    /// switch to settle, and only then remove the original id. Fails if no
    /// predecessor exists (the only space on a screen cannot be removed).
    #[instrument(skip(self))]
    pub async fn remove_current_space(&self) -> Result<RemovedSpace, HostError> {
        let reply = self.bridge.execute(REMOVE_CURRENT_SPACE).await?;
        let outcome: RemovedSpace = serde_json::from_str(reply.trim())?;
        debug!(removed = %outcome.removed, previous = %outcome.previous, "navigated to predecessor");

        tokio::time::sleep(self.settle_delay).await;
        self.remove_space(&outcome.removed).await?;
        Ok(outcome)
    }

    /// Navigate to a space.
    #[instrument(skip(self))]
    pub async fn goto_space(&self, id: &SpaceId) -> Result<(), HostError> {
        self.bridge.execute(&goto_space_payload(id)).await?;
        Ok(())
    }
}

const LIST_SPACES: &str = r#"
local spaces = {}
local currentSpace = hs.spaces.focusedSpace()
local spaceNames = hs.spaces.missionControlSpaceNames()

local screenInfo = {}
for _, screen in ipairs(hs.screen.allScreens()) do
    screenInfo[screen:getUUID()] = screen:name()
end

for screenUUID, screenSpaces in pairs(spaceNames) do
    for spaceId, spaceName in pairs(screenSpaces) do
        table.insert(spaces, {
            id = tostring(spaceId),
            name = spaceName,
            screenId = screenUUID,
            screenName = screenInfo[screenUUID] or "Unknown Screen",
            isCurrent = spaceId == currentSpace
        })
    end
end

return hs.json.encode(spaces)
"#;

const CREATE_SPACE: &str = r#"
local currentScreen = hs.screen.mainScreen()
hs.spaces.addSpaceToScreen(currentScreen, false)

local allSpaces = hs.spaces.spacesForScreen(currentScreen)
local newSpaceId = allSpaces[#allSpaces]
return tostring(newSpaceId)
"#;

const REMOVE_CURRENT_SPACE: &str = r#"
local currentScreen = hs.screen.mainScreen()
local currentSpace = hs.spaces.activeSpaceOnScreen(currentScreen)
local spacesOnScreen = hs.spaces.spacesForScreen(currentScreen)

local prevSpaceId = nil
for i, id in ipairs(spacesOnScreen) do
    if id == currentSpace and i > 1 then
        prevSpaceId = spacesOnScreen[i - 1]
        break
    end
end

if not prevSpaceId then
    error("No previous space found, cannot remove current space.")
end

local ok, err = hs.spaces.gotoSpace(prevSpaceId)
if not ok then
    error("Failed to go to space: " .. tostring(err))
end

return hs.json.encode({
    removed = tostring(currentSpace),
    previous = tostring(prevSpaceId)
})
"#;

fn remove_space_payload(id: &SpaceId) -> String {
    format!(
        r#"
local ok, err = hs.spaces.removeSpace({id})
if not ok then
    error("Failed to remove space: " .. tostring(err))
end
"#
    )
}

fn goto_space_payload(id: &SpaceId) -> String {
    format!(
        r#"
local ok, err = hs.spaces.gotoSpace({id})
if not ok then
    error("Failed to go to space: " .. tostring(err))
end
"#
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::config::Config;
    use crate::remote::testing::ScriptedBridge;

    fn remote(bridge: &ScriptedBridge) -> Remote<ScriptedBridge> {
        Remote::new(bridge.clone(), &Config::default())
    }

    #[tokio::test]
    async fn list_spaces_parses_records() {
        let bridge = ScriptedBridge::new();
        bridge.push_ok(
            r#"[
                {"id":"1","name":"Main","screenId":"S1","screenName":"Built-in","isCurrent":true},
                {"id":"2","name":"Work","screenId":"S1","screenName":"Built-in","isCurrent":false}
            ]"#,
        );

        let spaces = remote(&bridge).list_spaces().await.unwrap();
        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[0].id, SpaceId::from("1"));
        assert!(spaces[0].is_current);
        assert_eq!(spaces[1].screen_name, "Built-in");
        assert!(!spaces[1].is_current);
    }

    #[tokio::test]
    async fn list_spaces_propagates_parse_errors() {
        let bridge = ScriptedBridge::new();
        bridge.push_ok("garbage");
        let err = remote(&bridge).list_spaces().await.unwrap_err();
        assert!(matches!(err, HostError::Parse(_)));
    }

    #[tokio::test]
    async fn create_space_infers_last_id_then_navigates() {
        let bridge = ScriptedBridge::new();
        bridge.push_ok("3");
        bridge.push_ok("");

        let id = remote(&bridge).create_space().await.unwrap();
        assert_eq!(id, SpaceId::from("3"));

        let calls = bridge.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("hs.spaces.addSpaceToScreen(currentScreen, false)"));
        assert!(calls[0].contains("allSpaces[#allSpaces]"));
        assert!(calls[1].contains("hs.spaces.gotoSpace(3)"));
    }

    #[tokio::test(start_paused = true)]
    async fn remove_current_space_navigates_waits_then_removes() {
        let bridge = ScriptedBridge::new();
        bridge.push_ok(r#"{"removed":"2","previous":"1"}"#);
        bridge.push_ok("");

        let outcome = remote(&bridge).remove_current_space().await.unwrap();
        assert_eq!(outcome.removed, SpaceId::from("2"));
        assert_eq!(outcome.previous, SpaceId::from("1"));

        let calls = bridge.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("hs.spaces.gotoSpace(prevSpaceId)"));
        assert!(calls[1].contains("hs.spaces.removeSpace(2)"));
    }

    #[tokio::test]
    async fn remove_current_space_fails_without_predecessor() {
        let bridge = ScriptedBridge::new();
        bridge.push_host_error("No previous space found, cannot remove current space.");

        let err = remote(&bridge).remove_current_space().await.unwrap_err();
        assert!(matches!(err, HostError::Host(message) if message.contains("No previous space")));
        assert_eq!(bridge.call_count(), 1);
    }

    #[tokio::test]
    async fn goto_space_is_a_single_round_trip() {
        let bridge = ScriptedBridge::new();
        bridge.push_ok("");
        remote(&bridge).goto_space(&SpaceId::from("7")).await.unwrap();
        let calls = bridge.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("hs.spaces.gotoSpace(7)"));
    }
}
