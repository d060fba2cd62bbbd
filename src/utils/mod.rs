use rand::{distributions::Alphanumeric, Rng};

/// Public ids are opaque; 20 characters at most to fit the id columns.
pub fn random_public_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len.min(20))
        .map(char::from)
        .collect()
}

// Helper to keep only the last path segment of a client supplied filename
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '-' })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
