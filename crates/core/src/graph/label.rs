#![forbid(unsafe_code)]

/// Case-folds a field label and collapses runs of spaces, hyphens and
/// underscores into one `_`, so "Return Date", "return-date" and
/// "return_date" compare equal. Nothing looser than that.
pub fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_separator = false;
    for ch in label.trim().chars() {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = !out.is_empty();
            continue;
        }
        if pending_separator {
            out.push('_');
            pending_separator = false;
        }
        out.extend(ch.to_lowercase());
    }
    out
}
