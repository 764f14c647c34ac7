//! Startup self-test.
//!
//! Runs known-answer checks for every primitive the crate ships and confirms
//! the OS random source answers. A mismatch means the build is broken, so it
//! is reported as [`Error::InternalInvariantViolation`] and the host should
//! refuse to continue.

use log::{debug, info};

use crate::cipher::{ArcFourVariant, ChaCha20Cipher, Salsa20Cipher, StreamCipher};
use crate::error::{Error, Result};
use crate::otp::hotp;
use crate::primitives::{hex_to_bytes, hmac_sha256, resize_key};

/// Run every check. Stops at the first failure.
pub fn run() -> Result<()> {
    let checks: [(&str, fn() -> Result<()>); 7] = [
        ("os-rng", check_os_rng),
        ("salsa20", check_salsa20),
        ("chacha20", check_chacha20),
        ("arcfour-variant", check_arcfour),
        ("hmac-sha256", check_hmac),
        ("hotp", check_hotp),
        ("resize-key", check_resize_key),
    ];
    for (name, check) in checks {
        check()?;
        debug!("self-test {name}: ok");
    }
    info!("self-test passed ({} checks)", checks.len());
    Ok(())
}

fn expect_eq(what: &str, got: &[u8], expected_hex: &str) -> Result<()> {
    let expected = hex_to_bytes(expected_hex)?;
    if got == expected.as_slice() {
        Ok(())
    } else {
        Err(Error::InternalInvariantViolation(format!(
            "{what} known-answer test failed"
        )))
    }
}

fn check_os_rng() -> Result<()> {
    let mut buf = [0u8; 32];
    getrandom::fill(&mut buf)?;
    Ok(())
}

fn check_salsa20() -> Result<()> {
    let key = hex_to_bytes("0F62B5085BAE0154A7FA4DA0F34699EC3F92E5388BDE3184D72A7DD02376C91C")?;
    let iv = hex_to_bytes("288FF65DC42B92F9")?;
    let mut c = Salsa20Cipher::new(&key, &iv)?;
    let mut out = [0u8; 16];
    c.encrypt(&mut out)?;
    expect_eq("Salsa20", &out, "5E5E71F90199340304ABB22A37B6625B")
}

fn check_chacha20() -> Result<()> {
    let key: Vec<u8> = (0u8..32).collect();
    let mut iv = [0u8; 12];
    iv[3] = 0x09;
    iv[7] = 0x4A;
    let mut c = ChaCha20Cipher::new(&key, &iv, false)?;
    c.seek(64)?;
    let mut out = [0u8; 64];
    c.encrypt(&mut out)?;
    expect_eq(
        "ChaCha20",
        &out,
        "10F1E7E4D13B5915500FDD1FA32071C4C7D1F4C733C068030422AA9AC3D46C4E\
         D2826446079FAA0914C2D705D98B02A2B5129CD1DE164EB9CBD083E8A2503C4E",
    )
}

fn check_arcfour() -> Result<()> {
    let mut c = ArcFourVariant::new(&[0, 1, 2, 3])?;
    let mut out = [0u8; 16];
    c.encrypt(&mut out)?;
    expect_eq("ArcFour variant", &out, "9749DFE1A4D9157C855BF2E5093077A0")
}

fn check_hmac() -> Result<()> {
    // RFC 4231 test cases 1 and 2.
    let mac = hmac_sha256(&[0x0B; 20], b"Hi There")?;
    expect_eq(
        "HMAC-SHA-256",
        &mac,
        "B0344C61D8DB38535CA8AFCEAF0BF12B881DC200C9833DA726E9376C2E32CFF7",
    )?;
    let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?")?;
    expect_eq(
        "HMAC-SHA-256",
        &mac,
        "5BDCC146BF60754E6A042426089575C75A003F089D2739839DEC58B964EC3843",
    )
}

fn check_hotp() -> Result<()> {
    let secret = b"12345678901234567890";
    let otp = hotp(secret, 0, 6, false, None)?;
    let otp9 = hotp(secret, 9, 6, false, None)?;
    if otp == "755224" && otp9 == "520489" {
        Ok(())
    } else {
        Err(Error::InternalInvariantViolation(
            "HOTP known-answer test failed".into(),
        ))
    }
}

fn check_resize_key() -> Result<()> {
    let key = resize_key(b"passkeep", 16)?;
    expect_eq("resize_key", &key, "3569E10976A590BFCE57B33DE49C491E")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_test_passes() {
        run().unwrap();
    }

    #[test]
    fn test_expect_eq_reports_mismatch() {
        let err = expect_eq("demo", &[0x00], "01").unwrap_err();
        assert!(matches!(err, Error::InternalInvariantViolation(_)));
        assert!(err.to_string().contains("demo"));
    }
}
