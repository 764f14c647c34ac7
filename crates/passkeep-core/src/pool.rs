//! Pooled cryptographically secure random number generator.
//!
//! Architecture:
//! 1. A 64-byte entropy pool, only ever replaced by SHA-512(pool || input)
//! 2. A 64-bit counter advanced by an odd constant for every output block
//! 3. 32 fresh bytes from the platform CSPRNG per block
//! 4. Output block = SHA-256(pool || counter || fresh), 32 bytes at a time
//!
//! Pool, counter and the generated-byte tally sit behind one lock, so
//! concurrent callers never observe a half-updated state. Callers that want a
//! process-wide generator use [`CryptoPool::global`]; everything else (tests,
//! embedders with their own RNG) builds a private instance.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use log::{debug, trace, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::config::PoolConfig;
use crate::environment::{EnvironmentSnapshot, coarse_ticks_now};
use crate::error::{Error, Result};
use crate::primitives::{HASH256_LEN, HASH512_LEN, hash256, hash512};

/// Added to the counter before every block. Odd, so the counter cycles
/// through all 2^64 values.
pub const COUNTER_STEP: u64 = 0x74D8_B29E_4D38_E161;

/// Largest single request accepted by [`CryptoPool::get_random_bytes`].
pub const MAX_REQUEST_BYTES: u32 = i32::MAX as u32;

/// Bytes drawn from the platform CSPRNG for each output block.
const FRESH_BYTES: usize = 32;

/// Instrumentation callback fired before each output block.
pub type PreGenerateHook = Arc<dyn Fn() + Send + Sync>;

// ---------------------------------------------------------------------------
// Platform CSPRNG
// ---------------------------------------------------------------------------

/// Source of fresh randomness mixed into every output block.
pub trait PlatformRng: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// The operating system CSPRNG via `getrandom`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRng;

impl PlatformRng for OsRng {
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        getrandom::fill(buf)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "os"
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

#[derive(Zeroize, ZeroizeOnDrop)]
struct PoolState {
    pool: [u8; HASH512_LEN],
    counter: u64,
    generated: u64,
}

/// Thread-safe pooled CSPRNG.
pub struct CryptoPool {
    state: Mutex<PoolState>,
    rng: Box<dyn PlatformRng>,
    hook: Mutex<Option<PreGenerateHook>>,
}

static GLOBAL: OnceLock<CryptoPool> = OnceLock::new();

impl CryptoPool {
    /// Create a pool backed by the OS CSPRNG and seeded with a snapshot of
    /// the process environment.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default(), Box::new(OsRng))
    }

    /// Create a pool over a caller-supplied platform RNG.
    pub fn with_rng(rng: Box<dyn PlatformRng>) -> Self {
        Self::with_config(PoolConfig::default(), rng)
    }

    pub fn with_config(config: PoolConfig, rng: Box<dyn PlatformRng>) -> Self {
        let pool = Self::unseeded(rng, coarse_ticks_now());
        pool.seed(&config);
        pool
    }

    /// The process-wide pool, created on first use.
    pub fn global() -> &'static CryptoPool {
        GLOBAL.get_or_init(CryptoPool::new)
    }

    fn unseeded(rng: Box<dyn PlatformRng>, counter: u64) -> Self {
        Self {
            state: Mutex::new(PoolState {
                pool: [0u8; HASH512_LEN],
                counter,
                generated: 0,
            }),
            rng,
            hook: Mutex::new(None),
        }
    }

    /// Construction-time seeding. Failures only weaken the initial pool, the
    /// per-block CSPRNG draw still applies, so they are logged and skipped.
    fn seed(&self, config: &PoolConfig) {
        if config.seed_environment {
            match EnvironmentSnapshot::collect()
                .to_bytes()
                .and_then(|bytes| self.add_entropy(&bytes))
            {
                Ok(()) => debug!("crypto pool: folded environment snapshot"),
                Err(e) => warn!("crypto pool: environment seeding skipped: {e}"),
            }
        }

        let mut csp = Zeroizing::new([0u8; FRESH_BYTES]);
        match self
            .rng
            .fill(&mut csp[..])
            .and_then(|()| self.add_entropy(&csp[..]))
        {
            Ok(()) => debug!("crypto pool: seeded from {} rng", self.rng.name()),
            Err(e) => warn!("crypto pool: {} rng seeding skipped: {e}", self.rng.name()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // The state is valid after every statement, so a poisoned lock is safe to reuse.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fold caller-supplied entropy into the pool.
    ///
    /// Inputs longer than 64 bytes are compressed with SHA-512 first.
    pub fn add_entropy(&self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::invalid("entropy input must not be empty"));
        }

        let compressed;
        let input: &[u8] = if data.len() > HASH512_LEN {
            compressed = Zeroizing::new(hash512(data));
            &compressed[..]
        } else {
            data
        };

        let mut st = self.lock();
        let mut joined = Zeroizing::new(Vec::with_capacity(HASH512_LEN + input.len()));
        joined.extend_from_slice(&st.pool);
        joined.extend_from_slice(input);
        let mut next = hash512(&joined);
        st.pool.copy_from_slice(&next);
        next.zeroize();
        Ok(())
    }

    /// Install or clear the pre-generation hook.
    pub fn set_pre_generate_hook(&self, hook: Option<PreGenerateHook>) {
        *self.hook.lock().unwrap_or_else(PoisonError::into_inner) = hook;
    }

    fn fire_hook(&self) {
        let hook = self
            .hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Produce one 32-byte output block.
    pub fn generate_block(&self) -> Result<Zeroizing<[u8; HASH256_LEN]>> {
        self.fire_hook();

        let mut fresh = Zeroizing::new([0u8; FRESH_BYTES]);
        let mut st = self.lock();
        st.counter = st.counter.wrapping_add(COUNTER_STEP);
        self.rng.fill(&mut fresh[..])?;

        let mut input = Zeroizing::new(Vec::with_capacity(HASH512_LEN + 8 + FRESH_BYTES));
        input.extend_from_slice(&st.pool);
        input.extend_from_slice(&st.counter.to_le_bytes());
        input.extend_from_slice(&fresh[..]);

        let block = Zeroizing::new(hash256(&input));
        st.generated += HASH256_LEN as u64;
        trace!("crypto pool: block generated, total {} bytes", st.generated);
        Ok(block)
    }

    /// Return exactly `count` random bytes.
    pub fn get_random_bytes(&self, count: u32) -> Result<Vec<u8>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if count > MAX_REQUEST_BYTES {
            return Err(Error::invalid(format!(
                "requested {count} random bytes, limit is {MAX_REQUEST_BYTES}"
            )));
        }

        let count = count as usize;
        let mut output = Vec::with_capacity(count);
        while output.len() < count {
            let block = self.generate_block()?;
            let take = (count - output.len()).min(HASH256_LEN);
            output.extend_from_slice(&block[..take]);
        }
        Ok(output)
    }

    /// Total bytes produced by this pool so far, in whole blocks.
    pub fn generated_byte_count(&self) -> u64 {
        self.lock().generated
    }

    pub fn rng_name(&self) -> &'static str {
        self.rng.name()
    }
}

impl Default for CryptoPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CryptoPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoPool")
            .field("rng", &self.rng.name())
            .field("generated", &self.generated_byte_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    // -----------------------------------------------------------------------
    // Mock platform RNGs
    // -----------------------------------------------------------------------

    /// Deterministic RNG: every fill yields an incrementing byte pattern.
    struct CountingRng {
        next: AtomicU64,
    }

    impl CountingRng {
        fn new() -> Self {
            Self {
                next: AtomicU64::new(0),
            }
        }
    }

    impl PlatformRng for CountingRng {
        fn fill(&self, buf: &mut [u8]) -> Result<()> {
            let start = self.next.fetch_add(buf.len() as u64, Ordering::SeqCst);
            for (i, b) in buf.iter_mut().enumerate() {
                *b = (start + i as u64) as u8;
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    struct FailingRng;

    impl PlatformRng for FailingRng {
        fn fill(&self, _buf: &mut [u8]) -> Result<()> {
            Err(Error::UnsupportedPlatform("no CSPRNG in this sandbox".into()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn deterministic_pool() -> CryptoPool {
        let pool = CryptoPool::unseeded(Box::new(CountingRng::new()), 42);
        pool.seed(&PoolConfig {
            seed_environment: false,
        });
        pool
    }

    // -----------------------------------------------------------------------
    // Output length and accounting
    // -----------------------------------------------------------------------

    #[test]
    fn test_get_random_bytes_various_sizes() {
        let pool = CryptoPool::new();
        for size in [1u32, 16, 31, 32, 33, 64, 100, 256] {
            let bytes = pool.get_random_bytes(size).unwrap();
            assert_eq!(bytes.len(), size as usize, "Expected {size} bytes");
        }
    }

    #[test]
    fn test_zero_request_is_empty_and_free() {
        let pool = CryptoPool::new();
        assert!(pool.get_random_bytes(0).unwrap().is_empty());
        assert_eq!(pool.generated_byte_count(), 0);
    }

    #[test]
    fn test_oversized_request_rejected() {
        let pool = CryptoPool::new();
        let err = pool.get_random_bytes(MAX_REQUEST_BYTES + 1).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_generated_count_rounds_up_to_blocks() {
        let pool = CryptoPool::new();
        pool.get_random_bytes(1).unwrap();
        assert_eq!(pool.generated_byte_count(), 32);
        pool.get_random_bytes(33).unwrap();
        assert_eq!(pool.generated_byte_count(), 32 + 64);
    }

    #[test]
    fn test_consecutive_requests_differ() {
        let pool = CryptoPool::new();
        let a = pool.get_random_bytes(32).unwrap();
        let b = pool.get_random_bytes(32).unwrap();
        assert_ne!(a, b);
    }

    // -----------------------------------------------------------------------
    // Entropy folding
    // -----------------------------------------------------------------------

    #[test]
    fn test_add_entropy_rejects_empty() {
        let pool = CryptoPool::new();
        assert!(matches!(
            pool.add_entropy(&[]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_deterministic_pools_agree() {
        let a = deterministic_pool();
        let b = deterministic_pool();
        assert_eq!(a.get_random_bytes(80).unwrap(), b.get_random_bytes(80).unwrap());
    }

    #[test]
    fn test_add_entropy_changes_output() {
        let a = deterministic_pool();
        let b = deterministic_pool();
        b.add_entropy(b"user supplied mouse movement").unwrap();
        assert_ne!(a.get_random_bytes(32).unwrap(), b.get_random_bytes(32).unwrap());
    }

    #[test]
    fn test_add_entropy_updates_pool_state() {
        let pool = deterministic_pool();
        let before = pool.lock().pool;
        pool.add_entropy(b"user supplied mouse movement").unwrap();
        let after = pool.lock().pool;
        assert_ne!(before, after);
        assert!(after.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_long_entropy_is_accepted() {
        let a = deterministic_pool();
        let b = deterministic_pool();
        a.add_entropy(&[0xA5; 1000]).unwrap();
        b.add_entropy(&[0xA5; 999]).unwrap();
        assert_ne!(a.get_random_bytes(32).unwrap(), b.get_random_bytes(32).unwrap());
    }

    // -----------------------------------------------------------------------
    // Failure and instrumentation
    // -----------------------------------------------------------------------

    #[test]
    fn test_failing_rng_construction_is_infallible() {
        let pool = CryptoPool::with_rng(Box::new(FailingRng));
        let err = pool.get_random_bytes(16).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform(_)));
        assert_eq!(pool.generated_byte_count(), 0);
    }

    #[test]
    fn test_hook_fires_once_per_block() {
        let pool = CryptoPool::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        pool.set_pre_generate_hook(Some(Arc::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        })));
        pool.get_random_bytes(100).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        pool.set_pre_generate_hook(None);
        pool.get_random_bytes(32).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_global_is_shared() {
        let a = CryptoPool::global() as *const CryptoPool;
        let b = CryptoPool::global() as *const CryptoPool;
        assert_eq!(a, b);
        assert_eq!(CryptoPool::global().rng_name(), "os");
    }

    #[test]
    fn test_concurrent_callers() {
        let pool = CryptoPool::new();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..50 {
                        assert_eq!(pool.get_random_bytes(48).unwrap().len(), 48);
                    }
                });
            }
        });
        assert_eq!(pool.generated_byte_count(), 8 * 50 * 64);
    }
}
