use sha2::{Digest, Sha256};

/// File-name-safe rendering of a station id. IPv6 literals and hostnames
/// with odd characters all map onto `[A-Za-z0-9._-]`.
pub fn sanitize_component(s: &str) -> String {
    let out: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    if out.is_empty() || out.chars().all(|c| c == '.') {
        // "", "." and ".." are not usable as file name stems.
        format!("_{out}")
    } else {
        out
    }
}

/// File name stem for a station's own log. Ids that needed sanitizing get
/// a short digest of the raw id appended so two stations never collide.
pub fn station_file_stem(station: &str) -> String {
    let clean = sanitize_component(station);
    if clean == station {
        return clean;
    }
    let mut hasher = Sha256::new();
    hasher.update(station.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{clean}-{}", &digest[..8])
}
