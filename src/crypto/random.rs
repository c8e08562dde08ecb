use parking_lot::Mutex;
use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Source of bytes for new data keys.
pub trait RandomSource: Send + Sync + 'static {
    fn fill(&self, buf: &mut [u8]) -> anyhow::Result<()>;
}

/// The operating system's CSPRNG. This is what production providers use.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> anyhow::Result<()> {
        getrandom::getrandom(buf).map_err(|e| anyhow::anyhow!("getrandom failed: {e}"))
    }
}

/// Deterministic generator for tests. Every data key it produces is
/// predictable from the seed, so it must never back a real provider.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn fill(&self, buf: &mut [u8]) -> anyhow::Result<()> {
        self.rng.lock().fill_bytes(buf);
        Ok(())
    }
}
