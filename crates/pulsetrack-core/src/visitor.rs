use sha2::{Digest, Sha256};

/// Derive a visitor ID from IP and User-Agent.
///
/// Formula: sha256(salt_epoch + ip + user_agent)[0..8] encoded as 16 hex
/// chars. The salt_epoch = floor(unix_utc_timestamp / 86400) rotates daily at
/// midnight UTC, so a derived ID cannot be correlated across days.
///
/// Called only when the client did not supply a persisted visitor ID of its
/// own; supplied IDs are used as-is and never recalculated, so the midnight
/// rotation does not split an in-progress visit.
pub fn compute_visitor_id(ip: &str, user_agent: &str) -> String {
    let salt_epoch = chrono::Utc::now().timestamp() / 86400;
    let input = format!("{}{}{}", salt_epoch, ip, user_agent);
    let hash = Sha256::digest(input.as_bytes());
    // First 8 bytes → 16 hex characters.
    hex::encode(&hash[..8])
}
