//! Terminal rendering of the synchronized state.

use exmon_core::StateSnapshot;

use crate::cli::Format;

/// Connectivity label shown in the status header.
pub fn status_label(connected: bool) -> &'static str {
    if connected { "online" } else { "offline" }
}

/// Render one snapshot for stdout.
pub fn render(snap: &StateSnapshot, format: Format) -> serde_json::Result<String> {
    let updated = snap
        .updated_at
        .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| "never".to_string());
    let header = format!(
        "[{}] rev {} updated {}",
        status_label(snap.connected),
        snap.revision,
        updated
    );

    let body = match format {
        Format::Line => serde_json::to_string(&snap.tree)?,
        Format::Pretty => serde_json::to_string_pretty(&snap.tree)?,
    };

    Ok(match format {
        Format::Line => format!("{header} {body}"),
        Format::Pretty => format!("{header}\n{body}"),
    })
}
