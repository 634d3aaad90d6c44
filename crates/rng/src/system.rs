//! Provide entropy from the operating system.

/// Returns a random `u64` value, used to pick a world seed when none is configured.
pub fn entropy() -> u64 {
    let mut bytes = [0u8; 8];
    if getrandom::getrandom(&mut bytes).is_err() {
        // Fall back on the clock. This is only ever used to pick a world seed.
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64);
        return crate::utility::splitmix64(nanos);
    }
    u64::from_ne_bytes(bytes)
}
