/// Current UTC timestamp (Unix millis)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Snowflake-style i64 resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC
///   - 12 bits: random
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let ts = (now_millis() - EPOCH_MS) & 0x1FF_FFFF_FFFF;
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000);
    (ts << 12) | rand_bits
}

/// Canonical form of a client phone number: digits only, keeping a leading `+`.
///
/// Returns `None` when fewer than 8 or more than 15 digits remain.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let plus = trimmed.starts_with('+');
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if !(8..=15).contains(&digits.len()) {
        return None;
    }
    Some(if plus { format!("+{digits}") } else { digits })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_fits_js_safe_integer() {
        let id = snowflake_id();
        assert!(id > 0);
        assert!(id < (1_i64 << 53));
    }

    #[test]
    fn snowflake_grows_with_time() {
        let a = snowflake_id() >> 12;
        let b = snowflake_id() >> 12;
        assert!(b >= a);
    }

    #[test]
    fn phone_strips_separators() {
        assert_eq!(normalize_phone("06 12 34 56 78"), Some("0612345678".to_string()));
        assert_eq!(normalize_phone(" +225 07-07-07-07 "), Some("+22507070707".to_string()));
    }

    #[test]
    fn phone_length_bounds() {
        assert_eq!(normalize_phone("1234567"), None);
        assert_eq!(normalize_phone("1234567890123456"), None);
        assert_eq!(normalize_phone("not a phone"), None);
    }
}
