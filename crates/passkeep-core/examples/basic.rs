//! Basic walkthrough: self-test, pool output, a keyed stream, a generated
//! password and its strength estimate.
//!
//! Run: `RUST_LOG=debug cargo run --example basic`

use passkeep_core::{
    CrsAlgorithm, CryptoPool, CryptoRandomStream, PasswordProfile, QualityEstimator, generate,
    self_test,
};

fn main() -> passkeep_core::Result<()> {
    env_logger::init();

    self_test::run()?;

    let pool = CryptoPool::global();
    let random = pool.get_random_bytes(32)?;
    print!("Pool bytes (hex): ");
    for b in &random {
        print!("{b:02x}");
    }
    println!();

    let mut stream = CryptoRandomStream::new(CrsAlgorithm::ChaCha20, &random)?;
    let rolls: Vec<u64> = (0..10)
        .map(|_| stream.get_random_u64_bounded(6).map(|v| v + 1))
        .collect::<Result<_, _>>()?;
    println!("Dice rolls from {}: {rolls:?}", stream.algorithm());

    let profile = PasswordProfile::from_ranges(16, "ulds")?;
    let password = generate(&profile, pool, b"")?;
    let chars: Vec<char> = password.chars().collect();

    let report = QualityEstimator::default().report(&chars);
    println!(
        "\nGenerated password: {} chars, ~{} bits ({} segmentations checked)",
        chars.len(),
        report.bits,
        report.paths_evaluated
    );
    for weak in ["password", "p4ssw0rd", "dragon2024dragon"] {
        let c: Vec<char> = weak.chars().collect();
        println!("  {weak:<18} {:>3} bits", passkeep_core::estimate_password_bits(&c));
    }
    println!(
        "\nPool generated {} bytes in total",
        pool.generated_byte_count()
    );
    Ok(())
}
