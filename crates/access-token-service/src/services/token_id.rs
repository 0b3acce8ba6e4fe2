//! Token identifier generation.
//!
//! Ids are `<stamp>-<random>`: a 12 hex digit millisecond timestamp followed
//! by 128 bits from the system CSPRNG in hex. The stamp keeps ids roughly
//! sortable by issuance time and is the only part ever logged; the random
//! part makes ids unguessable.

use crate::errors::AuthError;
use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};

/// Number of random bytes backing each token id.
const TOKEN_RANDOM_BYTES: usize = 16;

/// Generate a fresh stamped token id for issuance at `now`.
///
/// # Errors
///
/// Returns `AuthError::Internal` if the CSPRNG fails.
pub fn generate_token_id(rng: &SystemRandom, now: DateTime<Utc>) -> Result<String, AuthError> {
    let mut bytes = [0u8; TOKEN_RANDOM_BYTES];

    rng.fill(&mut bytes).map_err(|e| {
        tracing::error!(target: "auth.services.token_id", error = %e, "Failed to generate random bytes for token id");
        AuthError::Internal("RNG failure".to_string())
    })?;

    Ok(format_token_id(now, &bytes))
}

fn format_token_id(now: DateTime<Utc>, random: &[u8]) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    format!("{:012x}-{}", millis, hex::encode(random))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;

    #[test]
    fn test_token_id_format() {
        let rng = SystemRandom::new();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();

        let id = generate_token_id(&rng, now).unwrap();
        let (stamp, random) = id.split_once('-').unwrap();

        assert_eq!(stamp.len(), 12);
        assert_eq!(u64::from_str_radix(stamp, 16).unwrap(), now.timestamp_millis() as u64);
        assert_eq!(random.len(), 32);
        assert!(random.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_token_ids_are_unique() {
        let rng = SystemRandom::new();
        let now = Utc::now();

        let ids: HashSet<String> = (0..1000)
            .map(|_| generate_token_id(&rng, now).unwrap())
            .collect();

        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_token_ids_sort_by_issuance_time() {
        let rng = SystemRandom::new();
        let earlier = Utc::now();
        let later = earlier + Duration::milliseconds(5);

        let a = generate_token_id(&rng, earlier).unwrap();
        let b = generate_token_id(&rng, later).unwrap();

        assert!(a < b);
    }

    #[test]
    fn test_random_part_uses_every_byte() {
        let now = Utc::now();
        let id = format_token_id(now, &[0xff; TOKEN_RANDOM_BYTES]);
        let (_, random) = id.split_once('-').unwrap();

        assert_eq!(random, "f".repeat(32));
    }

    #[test]
    fn test_pre_epoch_time_stamps_zero() {
        let before_epoch = Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).unwrap();
        let id = format_token_id(before_epoch, &[0; TOKEN_RANDOM_BYTES]);
        assert!(id.starts_with("000000000000-"));
    }
}
