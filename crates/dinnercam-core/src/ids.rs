//! Message identifier generation.

use uuid::Uuid;

/// Generate a new message id.
///
/// UUIDv7 ids are time-ordered with a random tail, so ids sort in creation
/// order and collisions are not a practical concern.
pub fn new_message_id() -> String {
    Uuid::now_v7().to_string()
}

/// Derive a fresh id from a colliding one, preserving the original as a
/// prefix so the collision stays visible in logs.
pub fn dedup_id(original: &str) -> String {
    let fresh = Uuid::now_v7().simple().to_string();
    // The tail of a v7 uuid is the random part; the head is the timestamp
    // and can repeat within a tight loop.
    format!("{original}-{}", &fresh[fresh.len() - 8..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = new_message_id();
        let b = new_message_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_dedup_id_keeps_original_prefix() {
        let fresh = dedup_id("msg-1");
        assert!(fresh.starts_with("msg-1-"));
        assert_ne!(fresh, "msg-1");
    }

    #[test]
    fn test_dedup_id_diverges_in_tight_loop() {
        let a = dedup_id("msg-1");
        let b = dedup_id("msg-1");
        assert_ne!(a, b);
    }
}
