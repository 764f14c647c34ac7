//! # passkeep-core
//!
//! **Randomness and password-strength primitives for a password manager.**
//!
//! `passkeep-core` provides the security plumbing a password vault needs
//! underneath its UI: a process-wide cryptographic pool, keyed random
//! streams for protecting in-memory secrets, and a pattern-based password
//! quality estimator.
//!
//! ## Quick Start
//!
//! ```
//! use passkeep_core::{CrsAlgorithm, CryptoPool, CryptoRandomStream, estimate_password_bits};
//!
//! // Fresh randomness from the shared pool
//! let key = CryptoPool::global().get_random_bytes(32).unwrap();
//!
//! // A keyed stream for masking protected strings
//! let mut stream = CryptoRandomStream::new(CrsAlgorithm::ChaCha20, &key).unwrap();
//! let die = stream.get_random_u64_bounded(6).unwrap();
//! assert!(die < 6);
//!
//! // Strength of a candidate password
//! let pw: Vec<char> = "correct horse".chars().collect();
//! assert!(estimate_password_bits(&pw) > 0);
//! ```
//!
//! ## Architecture
//!
//! OS RNG + environment + caller entropy → [`CryptoPool`] (SHA-512 state,
//! SHA-256 output blocks) → [`CryptoRandomStream`] (ArcFour variant, Salsa20
//! or ChaCha20) → masking / password generation.
//!
//! The quality estimator is independent: patterns → bounded search →
//! entropy-coded cost in bits.

pub mod charset;
pub mod cipher;
pub mod config;
pub mod environment;
pub mod error;
pub mod generator;
pub mod otp;
pub mod pool;
pub mod primitives;
pub mod quality;
pub mod self_test;
pub mod stream;

pub use charset::CharSet;
pub use cipher::{ArcFourVariant, ChaCha20Cipher, Salsa20Cipher, StreamCipher};
pub use config::{CoreConfig, EstimatorConfig, PoolConfig};
pub use environment::EnvironmentSnapshot;
pub use error::{Error, Result};
pub use generator::{PasswordProfile, generate};
pub use otp::hotp;
pub use pool::{CryptoPool, OsRng, PlatformRng, PreGenerateHook};
pub use primitives::{hash256, hash512, resize_key};
pub use quality::{
    PopularPasswords, QualityEstimator, QualityReport, Segment, estimate_password_bits,
};
pub use stream::{CrsAlgorithm, CryptoRandomStream};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
