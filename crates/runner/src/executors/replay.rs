#![forbid(unsafe_code)]

use std::path::Path;

/// Canned interpreter reply for offline runs.
pub(crate) fn read_reply(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("read replay file {} failed: {e}", path.display()))
}
