/// Deterministic avatar color via CRC32 hash of the user id.
/// Returns (r, g, b) from first 3 bytes of hash.
pub fn user_color(user_id: &str) -> (u8, u8, u8) {
    let hash = crc32fast::hash(user_id.as_bytes());
    let bytes = hash.to_be_bytes();
    (bytes[0], bytes[1], bytes[2])
}

/// Up to two uppercase initials for an avatar placeholder.
pub fn initials(display_name: &str) -> String {
    display_name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{initials, user_color};

    #[test]
    fn user_color_is_deterministic() {
        assert_eq!(user_color("user-1"), user_color("user-1"));
    }

    #[test]
    fn user_color_varies_for_different_ids() {
        assert_ne!(user_color("user-1"), user_color("user-2"));
    }

    #[test]
    fn initials_take_first_two_words() {
        assert_eq!(initials("ada lovelace byron"), "AL");
        assert_eq!(initials("  grace "), "G");
        assert_eq!(initials(""), "");
    }
}
