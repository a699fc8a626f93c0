// ── Setup identity ──
//
// The (category, setup-id, PIN) triple a bridge advertises for pairing.
// Missing values are drawn from an injected RNG exactly once; after that
// the identity is fixed for the controller's lifetime.

use std::sync::{Mutex, OnceLock, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::setup::encode_setup_uri;

/// Accessory category advertised by a bridge.
pub const BRIDGE_CATEGORY: u8 = 2;

/// Randomness source used to generate setup identities.
pub type BoxRng = Box<dyn RngCore + Send>;

/// An OS-seeded generator.
pub fn default_rng() -> BoxRng {
    Box::new(StdRng::from_os_rng())
}

/// Pairing identity of a bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupIdentity {
    pub category: u8,
    /// Four uppercase characters appended to the setup URI.
    pub setup_id: String,
    /// Eight decimal digits.
    pub pin: String,
}

impl SetupIdentity {
    /// Generate a fully random identity.
    pub fn generate<R: Rng>(category: u8, rng: &mut R) -> Self {
        Self::resolve(category, None, None, rng)
    }

    /// Keep the supplied values and generate only what is missing.
    pub fn resolve<R: Rng>(
        category: u8,
        setup_id: Option<String>,
        pin: Option<String>,
        rng: &mut R,
    ) -> Self {
        let setup_id = setup_id.unwrap_or_else(|| random_setup_id(rng));
        let pin = pin.unwrap_or_else(|| random_pin(rng));
        Self {
            category,
            setup_id,
            pin,
        }
    }

    /// The `X-HM://` URI for this identity.
    pub fn setup_uri(&self) -> String {
        encode_setup_uri(self.category, &self.setup_id, &self.pin)
    }
}

/// Random setup id: four uppercase hex digits.
pub fn random_setup_id<R: Rng>(rng: &mut R) -> String {
    format!("{:04X}", rng.random_range(0..0xffff_u32))
}

/// Random PIN: eight zero-padded decimal digits.
pub fn random_pin<R: Rng>(rng: &mut R) -> String {
    format!("{:08}", rng.random_range(0..99_999_999_u32))
}

/// Identity resolved on first access and shared between a controller and
/// its handles.
pub(crate) struct LazyIdentity {
    category: u8,
    setup_id: Option<String>,
    pin: Option<String>,
    rng: Mutex<BoxRng>,
    resolved: OnceLock<SetupIdentity>,
}

impl LazyIdentity {
    pub(crate) fn new(
        category: u8,
        setup_id: Option<String>,
        pin: Option<String>,
        rng: BoxRng,
    ) -> Self {
        Self {
            category,
            setup_id,
            pin,
            rng: Mutex::new(rng),
            resolved: OnceLock::new(),
        }
    }

    /// Swap the RNG. No effect once the identity has been resolved.
    pub(crate) fn replace_rng(&self, rng: BoxRng) {
        *self.rng.lock().unwrap_or_else(PoisonError::into_inner) = rng;
    }

    pub(crate) fn get(&self) -> &SetupIdentity {
        self.resolved.get_or_init(|| {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            SetupIdentity::resolve(
                self.category,
                self.setup_id.clone(),
                self.pin.clone(),
                &mut *rng,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn generated_values_have_expected_shape() {
        let mut rng = seeded(1);
        for _ in 0..64 {
            let id = SetupIdentity::generate(BRIDGE_CATEGORY, &mut rng);
            assert_eq!(id.setup_id.len(), 4);
            assert!(
                id.setup_id
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)),
                "bad setup id {}",
                id.setup_id
            );
            assert_eq!(id.pin.len(), 8);
            assert!(id.pin.chars().all(|c| c.is_ascii_digit()), "bad pin {}", id.pin);
        }
    }

    #[test]
    fn same_seed_same_identity() {
        let a = SetupIdentity::generate(BRIDGE_CATEGORY, &mut seeded(42));
        let b = SetupIdentity::generate(BRIDGE_CATEGORY, &mut seeded(42));
        assert_eq!(a, b);
    }

    #[test]
    fn supplied_values_are_kept() {
        let id = SetupIdentity::resolve(
            5,
            Some("ABCD".into()),
            Some("12345678".into()),
            &mut seeded(3),
        );
        assert_eq!(id.setup_id, "ABCD");
        assert_eq!(id.pin, "12345678");
        assert_eq!(id.setup_uri(), encode_setup_uri(5, "ABCD", "12345678"));
    }

    #[test]
    fn only_missing_values_are_generated() {
        let id = SetupIdentity::resolve(2, Some("ZZ99".into()), None, &mut seeded(9));
        assert_eq!(id.setup_id, "ZZ99");
        assert_eq!(id.pin.len(), 8);
    }

    #[test]
    fn lazy_identity_resolves_once() {
        let lazy = LazyIdentity::new(2, None, None, Box::new(seeded(11)));
        let first = lazy.get().clone();
        lazy.replace_rng(Box::new(seeded(12)));
        assert_eq!(lazy.get(), &first);
        assert_eq!(lazy.get().setup_uri(), first.setup_uri());
    }
}
