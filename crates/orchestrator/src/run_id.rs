//! Run identifier generation (spec §4.10): `run-<ISO8601 with ':.'→'-'>-<6-char random>`.

use chrono::{DateTime, Utc};
use rand::Rng;

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub fn generate_run_id(now: DateTime<Utc>) -> String {
    format!("run-{}-{}", timestamp_component(now), random_suffix())
}

fn timestamp_component(now: DateTime<Utc>) -> String {
    now.to_rfc3339().replace([':', '.'], "-")
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..6).map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn run_id_has_no_colons_or_dots_and_the_documented_prefix() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 45).unwrap();
        let id = generate_run_id(now);
        assert!(id.starts_with("run-2026-03-01T12-30-45"));
        assert!(!id.contains(':'));
        assert!(!id.contains('.'));
        let suffix = id.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 6);
    }

    #[test]
    fn successive_run_ids_differ() {
        let now = Utc::now();
        assert_ne!(generate_run_id(now), generate_run_id(now));
    }
}
