// Record ID Generator - prefixed, time-ordered string ids
// Format: <prefix>_<unix millis>_<9 random base-36 chars>

use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Generate a new id for the given record prefix
pub fn generate_id(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();

    format!("{}_{}_{}", prefix, millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation() {
        let id1 = generate_id("user");
        let id2 = generate_id("user");

        assert_ne!(id1, id2);
        assert!(id1.starts_with("user_"));

        let suffix = id1.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_millis_segment_is_numeric() {
        let id = generate_id("artwork");
        let millis = id.split('_').nth(1).unwrap();
        assert!(millis.parse::<u128>().unwrap() > 0);
    }
}
