//! Window operations.

use tracing::instrument;

use crate::host::{HostBridge, HostError};
use crate::model::{AppPath, SpaceId, WindowId, WindowInfo};
use crate::remote::{Remote, lua_quote, parse_records};

impl<B: HostBridge> Remote<B> {
    /// Enumerate the windows of one space.
    #[instrument(skip(self))]
    pub async fn list_windows(&self, space_id: &SpaceId) -> Result<Vec<WindowInfo>, HostError> {
        let payload = list_windows_payload(space_id, self.inline_snapshots);
        let reply = self.bridge.execute(&payload).await?;
        parse_records(&reply)
    }

    /// Enumerate windows across all spaces, excluding the launcher
    /// application's own windows so the switcher does not list itself.
    #[instrument(skip(self))]
    pub async fn list_all_windows(&self) -> Result<Vec<WindowInfo>, HostError> {
        let payload = list_all_windows_payload(&self.launcher_app, self.inline_snapshots);
        let reply = self.bridge.execute(&payload).await?;
        parse_records(&reply)
    }

    /// Bring a window to the foreground.
    #[instrument(skip(self))]
    pub async fn focus_window(&self, id: &WindowId) -> Result<(), HostError> {
        self.bridge.execute(&focus_window_payload(id)).await?;
        Ok(())
    }

    /// Capture a window's appearance as a base64 data-URI. `None` for a
    /// minimized window or one with no renderable surface.
    #[instrument(skip(self))]
    pub async fn window_snapshot(&self, id: &WindowId) -> Result<Option<String>, HostError> {
        let reply = self.bridge.execute(&window_snapshot_payload(id)).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            Ok(None)
        } else {
            Ok(Some(reply.to_string()))
        }
    }

    /// Running GUI applications with their bundle paths, for resolving
    /// per-application icons.
    #[instrument(skip(self))]
    pub async fn list_application_paths(&self) -> Result<Vec<AppPath>, HostError> {
        let reply = self.bridge.execute(LIST_APPLICATION_PATHS).await?;
        parse_records(&reply)
    }
}

/// Lua snippet building one window record into a local `entry`, optionally
/// capturing a snapshot inline for non-minimized windows.
fn window_entry_snippet(inline_snapshots: bool) -> &'static str {
    if inline_snapshots {
        r#"        local app = window:application()
        local entry = {
            id = tostring(windowId),
            title = window:title() or "Untitled",
            application = app and app:name() or "Unknown",
            isMinimized = window:isMinimized(),
            isFullscreen = window:isFullscreen()
        }
        if not window:isMinimized() then
            local snap = window:snapshot()
            if snap then
                entry.snapshot = snap:encodeAsURLString()
            end
        end
        table.insert(windows, entry)"#
    } else {
        r#"        local app = window:application()
        table.insert(windows, {
            id = tostring(windowId),
            title = window:title() or "Untitled",
            application = app and app:name() or "Unknown",
            isMinimized = window:isMinimized(),
            isFullscreen = window:isFullscreen()
        })"#
    }
}

fn list_windows_payload(space_id: &SpaceId, inline_snapshots: bool) -> String {
    format!(
        r#"
local windows = {{}}
local windowsInSpace = hs.spaces.windowsForSpace({space_id})

for _, windowId in ipairs(windowsInSpace) do
    local window = hs.window.get(windowId)
    if window then
{entry}
    end
end

return hs.json.encode(windows)
"#,
        entry = window_entry_snippet(inline_snapshots),
    )
}

fn list_all_windows_payload(launcher_app: &str, inline_snapshots: bool) -> String {
    format!(
        r#"
local windows = {{}}

for _, window in ipairs(hs.window.allWindows()) do
    local windowId = window:id()
    local app = window:application()
    local appName = app and app:name() or "Unknown"
    if windowId and appName ~= {launcher} then
{entry}
    end
end

return hs.json.encode(windows)
"#,
        launcher = lua_quote(launcher_app),
        entry = window_entry_snippet(inline_snapshots),
    )
}

fn focus_window_payload(id: &WindowId) -> String {
    format!(
        r#"
local window = hs.window.get({id})
if not window then
    error("Window not found: {id}")
end
window:focus()
"#
    )
}

fn window_snapshot_payload(id: &WindowId) -> String {
    format!(
        r#"
local window = hs.window.get({id})
if not window then
    error("Window not found: {id}")
end
if window:isMinimized() then
    return ""
end
local snap = window:snapshot()
if not snap then
    return ""
end
return snap:encodeAsURLString()
"#
    )
}

const LIST_APPLICATION_PATHS: &str = r#"
local apps = {}
for _, app in ipairs(hs.application.runningApplications()) do
    local path = app:path()
    if path then
        table.insert(apps, { name = app:name(), path = path })
    end
end
return hs.json.encode(apps)
"#;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::config::Config;
    use crate::remote::testing::ScriptedBridge;

    fn remote(bridge: &ScriptedBridge) -> Remote<ScriptedBridge> {
        Remote::new(bridge.clone(), &Config::default())
    }

    fn remote_with_inline_snapshots(bridge: &ScriptedBridge) -> Remote<ScriptedBridge> {
        let config = Config {
            inline_snapshots: true,
            ..Config::default()
        };
        Remote::new(bridge.clone(), &config)
    }

    #[tokio::test]
    async fn list_windows_parses_records() {
        let bridge = ScriptedBridge::new();
        bridge.push_ok(
            r#"[
                {"id":"10","title":"inbox","application":"Mail","isMinimized":false,"isFullscreen":false},
                {"id":"11","title":"doc","application":"Pages","isMinimized":true,"isFullscreen":false}
            ]"#,
        );

        let windows = remote(&bridge).list_windows(&SpaceId::from("1")).await.unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].id, WindowId::from("10"));
        assert_eq!(windows[0].application, "Mail");
        assert!(windows[1].is_minimized);
        assert_eq!(windows[0].snapshot, None);

        let calls = bridge.calls();
        assert!(calls[0].contains("hs.spaces.windowsForSpace(1)"));
        assert!(!calls[0].contains("snapshot"));
    }

    #[tokio::test]
    async fn empty_space_reply_is_an_empty_list() {
        let bridge = ScriptedBridge::new();
        bridge.push_ok("{}");
        let windows = remote(&bridge).list_windows(&SpaceId::from("4")).await.unwrap();
        assert!(windows.is_empty());
    }

    #[tokio::test]
    async fn inline_snapshots_extend_the_payload() {
        let bridge = ScriptedBridge::new();
        bridge.push_ok("{}");
        remote_with_inline_snapshots(&bridge)
            .list_windows(&SpaceId::from("1"))
            .await
            .unwrap();
        let calls = bridge.calls();
        assert!(calls[0].contains("window:snapshot()"));
        assert!(calls[0].contains("encodeAsURLString"));
    }

    #[tokio::test]
    async fn global_listing_filters_the_launcher_app() {
        let bridge = ScriptedBridge::new();
        bridge.push_ok("{}");
        remote(&bridge).list_all_windows().await.unwrap();
        let calls = bridge.calls();
        assert!(calls[0].contains("hs.window.allWindows()"));
        assert!(calls[0].contains(r#"appName ~= "Raycast""#));
    }

    #[tokio::test]
    async fn window_snapshot_maps_empty_reply_to_none() {
        let bridge = ScriptedBridge::new();
        bridge.push_ok("");
        bridge.push_ok("data:image/png;base64,AAAA");

        let remote = remote(&bridge);
        let minimized = remote.window_snapshot(&WindowId::from("10")).await.unwrap();
        assert_eq!(minimized, None);

        let visible = remote.window_snapshot(&WindowId::from("11")).await.unwrap();
        assert_eq!(visible, Some("data:image/png;base64,AAAA".to_string()));
    }

    #[tokio::test]
    async fn focus_window_errors_surface() {
        let bridge = ScriptedBridge::new();
        bridge.push_host_error("Window not found: 99");
        let err = remote(&bridge).focus_window(&WindowId::from("99")).await.unwrap_err();
        assert!(matches!(err, HostError::Host(message) if message.contains("99")));
    }

    #[tokio::test]
    async fn application_paths_parse() {
        let bridge = ScriptedBridge::new();
        bridge.push_ok(r#"[{"name":"Safari","path":"/Applications/Safari.app"}]"#);
        let apps = remote(&bridge).list_application_paths().await.unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "Safari");
        assert_eq!(apps[0].path, "/Applications/Safari.app");
    }
}
