//! Statistical checks for keystreams and bounded random draws.
//!
//! A small NIST SP 800-22 inspired battery used by the `passkeep-core` test
//! suites to catch gross failures: a broken cipher round, a biased
//! bounded draw, a pool that repeats itself. Each check returns a
//! [`TestResult`] with a p-value (where applicable), a pass/fail
//! determination, and a letter grade (A through F).

use flate2::Compression;
use flate2::write::ZlibEncoder;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use statrs::function::erf::erfc;
use std::io::Write;

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a single randomness test.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub p_value: Option<f64>,
    pub statistic: f64,
    pub details: String,
    pub grade: char,
}

impl TestResult {
    /// Assign a letter grade based on p-value.
    ///
    /// - A: p >= 0.1
    /// - B: p >= 0.01
    /// - C: p >= 0.001
    /// - D: p >= 0.0001
    /// - F: otherwise or None
    pub fn grade_from_p(p: Option<f64>) -> char {
        match p {
            Some(p) if p >= 0.1 => 'A',
            Some(p) if p >= 0.01 => 'B',
            Some(p) if p >= 0.001 => 'C',
            Some(p) if p >= 0.0001 => 'D',
            _ => 'F',
        }
    }

    /// Determine pass/fail from p-value against a threshold.
    pub fn pass_from_p(p: Option<f64>, threshold: f64) -> bool {
        match p {
            Some(p) => p >= threshold,
            None => false,
        }
    }

    fn from_p(name: &str, p: Option<f64>, statistic: f64, details: String) -> Self {
        TestResult {
            name: name.to_string(),
            passed: Self::pass_from_p(p, 0.01),
            p_value: p,
            statistic,
            details,
            grade: Self::grade_from_p(p),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Unpack a byte slice into individual bits (MSB first per byte).
fn to_bits(data: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(data.len() * 8);
    for &byte in data {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    bits
}

/// Return a failing `TestResult` when data is too short.
fn insufficient(name: &str, needed: usize, got: usize) -> TestResult {
    TestResult {
        name: name.to_string(),
        passed: false,
        p_value: None,
        statistic: 0.0,
        details: format!("Insufficient data: need {needed}, got {got}"),
        grade: 'F',
    }
}

/// Upper tail of the chi-squared distribution; `None` for a degenerate `df`.
fn chi2_sf(df: f64, chi2: f64) -> Option<f64> {
    ChiSquared::new(df).ok().map(|d| d.sf(chi2))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 1. FREQUENCY TESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Monobit frequency -- proportion of 1s vs 0s should be ~50%.
pub fn monobit_frequency(data: &[u8]) -> TestResult {
    let name = "Monobit Frequency";
    let bits = to_bits(data);
    let n = bits.len();
    if n < 100 {
        return insufficient(name, 100, n);
    }
    let s: i64 = bits
        .iter()
        .map(|&b| if b == 1 { 1i64 } else { -1i64 })
        .sum();
    let s_obs = (s as f64).abs() / (n as f64).sqrt();
    let p = erfc(s_obs / 2.0_f64.sqrt());
    TestResult::from_p(name, Some(p), s_obs, format!("S={s}, n={n}"))
}

/// Block frequency -- frequency within 128-bit blocks. Chi-squared test.
pub fn block_frequency(data: &[u8]) -> TestResult {
    let name = "Block Frequency";
    let block_size: usize = 128;
    let bits = to_bits(data);
    let n = bits.len();
    let num_blocks = n / block_size;
    if num_blocks < 10 {
        return insufficient(name, block_size * 10, n);
    }
    let mut chi2 = 0.0;
    for block in bits.chunks_exact(block_size) {
        let ones: usize = block.iter().map(|&b| b as usize).sum();
        let proportion = ones as f64 / block_size as f64;
        chi2 += (proportion - 0.5) * (proportion - 0.5);
    }
    chi2 *= 4.0 * block_size as f64;
    let p = chi2_sf(num_blocks as f64, chi2);
    TestResult::from_p(
        name,
        p,
        chi2,
        format!("blocks={num_blocks}, M={block_size}"),
    )
}

/// Byte frequency -- chi-squared on byte value distribution (256 bins).
pub fn byte_frequency(data: &[u8]) -> TestResult {
    let name = "Byte Frequency";
    let n = data.len();
    if n < 256 {
        return insufficient(name, 256, n);
    }
    let mut hist = [0u64; 256];
    for &b in data {
        hist[b as usize] += 1;
    }
    let mut result = chi_square_uniform(&hist);
    result.name = name.to_string();
    result
}

/// Chi-squared goodness of fit against the uniform distribution.
///
/// `counts[i]` is how often outcome `i` was observed. This is the check for
/// `get_random_u64_bounded`: every value below the bound must be equally
/// likely, including bounds that do not divide 2^64.
pub fn chi_square_uniform(counts: &[u64]) -> TestResult {
    let name = "Uniform Chi-Squared";
    let k = counts.len();
    let n: u64 = counts.iter().sum();
    if k < 2 {
        return insufficient(name, 2, k);
    }
    // Expected count per bin of at least 5 keeps the approximation honest.
    if n < 5 * k as u64 {
        return insufficient(name, 5 * k, n as usize);
    }
    let expected = n as f64 / k as f64;
    let chi2: f64 = counts
        .iter()
        .map(|&c| {
            let diff = c as f64 - expected;
            diff * diff / expected
        })
        .sum();
    let p = chi2_sf((k - 1) as f64, chi2);
    TestResult::from_p(
        name,
        p,
        chi2,
        format!("bins={k}, n={n}, expected_per_bin={expected:.1}"),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// 2. RUNS TESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Runs test -- number of uninterrupted runs of 0s or 1s.
pub fn runs_test(data: &[u8]) -> TestResult {
    let name = "Runs Test";
    let bits = to_bits(data);
    let n = bits.len();
    if n < 100 {
        return insufficient(name, 100, n);
    }
    let ones: usize = bits.iter().map(|&b| b as usize).sum();
    let prop = ones as f64 / n as f64;
    if (prop - 0.5).abs() >= 2.0 / (n as f64).sqrt() {
        return TestResult {
            name: name.to_string(),
            passed: false,
            p_value: Some(0.0),
            statistic: 0.0,
            details: format!("Pre-test failed: proportion={prop:.4}"),
            grade: 'F',
        };
    }
    let runs = 1 + bits.windows(2).filter(|w| w[0] != w[1]).count();
    let expected = 2.0 * n as f64 * prop * (1.0 - prop) + 1.0;
    let std = 2.0 * (2.0 * n as f64).sqrt() * prop * (1.0 - prop);
    let z = (runs as f64 - expected).abs() / std;
    let p = erfc(z / 2.0_f64.sqrt());
    TestResult::from_p(
        name,
        Some(p),
        z,
        format!("runs={runs}, expected={expected:.0}"),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// 3. ENTROPY AND CORRELATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Shannon entropy in bits per byte (8.0 is ideal).
pub fn shannon_entropy(data: &[u8]) -> TestResult {
    let name = "Shannon Entropy";
    let n = data.len();
    if n < 256 {
        return insufficient(name, 256, n);
    }
    let mut hist = [0u64; 256];
    for &b in data {
        hist[b as usize] += 1;
    }
    let h: f64 = hist
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n as f64;
            -p * p.log2()
        })
        .sum();
    let grade = if h > 7.9 {
        'A'
    } else if h > 7.5 {
        'B'
    } else if h > 7.0 {
        'C'
    } else if h > 6.0 {
        'D'
    } else {
        'F'
    };
    TestResult {
        name: name.to_string(),
        passed: h > 7.5,
        p_value: None,
        statistic: h,
        details: format!("{h:.4} bits/byte over {n} bytes"),
        grade,
    }
}

/// Compression ratio -- zlib compression ratio (random ~ 1.0+).
pub fn compression_ratio(data: &[u8]) -> TestResult {
    let name = "Compression Ratio";
    let n = data.len();
    if n < 32 {
        return insufficient(name, 32, n);
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    let compressed = match encoder.write_all(data).and_then(|()| encoder.finish()) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                name: name.to_string(),
                passed: false,
                p_value: None,
                statistic: 0.0,
                details: format!("zlib failed: {e}"),
                grade: 'F',
            };
        }
    };
    let ratio = compressed.len() as f64 / n as f64;
    let grade = if ratio > 0.95 {
        'A'
    } else if ratio > 0.85 {
        'B'
    } else if ratio > 0.7 {
        'C'
    } else if ratio > 0.5 {
        'D'
    } else {
        'F'
    };
    TestResult {
        name: name.to_string(),
        passed: ratio > 0.85,
        p_value: None,
        statistic: ratio,
        details: format!("{}/{n} = {ratio:.4}", compressed.len()),
        grade,
    }
}

/// Serial correlation -- lag-1 correlation coefficient between bytes.
pub fn serial_correlation(data: &[u8]) -> TestResult {
    let name = "Serial Correlation";
    let n = data.len();
    if n < 100 {
        return insufficient(name, 100, n);
    }
    let xs: Vec<f64> = data.iter().map(|&b| f64::from(b)).collect();
    let mean = xs.iter().sum::<f64>() / n as f64;
    let var: f64 = xs.iter().map(|x| (x - mean) * (x - mean)).sum();
    if var < 1e-10 {
        return TestResult {
            name: name.to_string(),
            passed: false,
            p_value: Some(0.0),
            statistic: 0.0,
            details: "Zero variance".to_string(),
            grade: 'F',
        };
    }
    let cov: f64 = xs
        .windows(2)
        .map(|w| (w[0] - mean) * (w[1] - mean))
        .sum();
    let r = cov / var;
    // Under independence r is approximately N(0, 1/n).
    let z = r.abs() * (n as f64).sqrt();
    let p = erfc(z / 2.0_f64.sqrt());
    TestResult::from_p(name, Some(p), r, format!("r={r:.5}, n={n}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Test battery
// ═══════════════════════════════════════════════════════════════════════════════

/// Run every byte-stream check on `data`.
pub fn run_all_tests(data: &[u8]) -> Vec<TestResult> {
    let tests: [fn(&[u8]) -> TestResult; 7] = [
        monobit_frequency,
        block_frequency,
        byte_frequency,
        runs_test,
        shannon_entropy,
        compression_ratio,
        serial_correlation,
    ];
    tests.iter().map(|test_fn| test_fn(data)).collect()
}
