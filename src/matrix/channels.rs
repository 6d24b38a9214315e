//! Channel selection

use crate::metadata::Channel;
use tracing::debug;

/// Channels to process for an app, in descriptor order.
///
/// An empty `requested` list selects every channel. Otherwise only channels
/// whose name is listed are kept; requested names the app does not define
/// are ignored.
pub fn select_channels<'a>(channels: &'a [Channel], requested: &[String]) -> Vec<&'a Channel> {
    if requested.is_empty() {
        return channels.iter().collect();
    }

    for name in requested {
        if !channels.iter().any(|c| &c.name == name) {
            debug!(channel = %name, "Requested channel not defined, ignoring");
        }
    }

    channels
        .iter()
        .filter(|c| requested.iter().any(|name| name == &c.name))
        .collect()
}
