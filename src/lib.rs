//! Space and window control for launcher UIs, delegated to a Hammerspoon
//! automation host over AppleScript. See [`store::SpaceStore`] for the
//! cache the UI reads from and [`remote::Remote`] for the operation
//! catalog behind it.

pub mod common;
pub mod host;
pub mod model;
pub mod remote;
pub mod store;
