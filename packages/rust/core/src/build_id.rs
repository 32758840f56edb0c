//! Build identity generation.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of a generated build identifier.
pub const BUILD_ID_LEN: usize = 12;

/// Return the caller-supplied build id, or generate a fresh one.
///
/// Never fails; an empty explicit id counts as unset.
pub fn resolve_build_id(explicit: Option<&str>, rng: &mut impl Rng) -> String {
    match explicit.filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => generate_build_id(rng),
    }
}

/// Generate a [`BUILD_ID_LEN`]-character alphanumeric build identifier.
///
/// The id distinguishes one invocation from another for traceability;
/// uniqueness is probabilistic, not guaranteed. The random source is a
/// parameter so callers (and tests) control determinism.
pub fn generate_build_id(rng: &mut impl Rng) -> String {
    (0..BUILD_ID_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn generated_id_has_fixed_length_and_charset() {
        let mut rng = rand::thread_rng();
        for _ in 0..32 {
            let id = generate_build_id(&mut rng);
            assert_eq!(id.len(), BUILD_ID_LEN);
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric()), "{id}");
        }
    }

    #[test]
    fn generation_is_deterministic_for_a_seeded_source() {
        let a = generate_build_id(&mut StdRng::seed_from_u64(42));
        let b = generate_build_id(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);

        let c = generate_build_id(&mut StdRng::seed_from_u64(43));
        assert_ne!(a, c);
    }

    #[test]
    fn explicit_id_is_returned_unchanged() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(resolve_build_id(Some("release-17"), &mut rng), "release-17");
    }

    #[test]
    fn empty_explicit_id_is_treated_as_unset() {
        let mut rng = StdRng::seed_from_u64(0);
        let id = resolve_build_id(Some(""), &mut rng);
        assert_eq!(id.len(), BUILD_ID_LEN);

        let id = resolve_build_id(None, &mut rng);
        assert_eq!(id.len(), BUILD_ID_LEN);
    }
}
