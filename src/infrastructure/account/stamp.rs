//! Random stamp generation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

use crate::domain::account::{Stamp, StampGenerator};

/// Length in characters of every generated stamp
pub const STAMP_LENGTH: usize = 32;

// 24 random bytes encode to exactly 32 base64 characters without padding
const STAMP_BYTES: usize = STAMP_LENGTH / 4 * 3;

/// Generates fixed-length, URL-safe stamps from the thread-local CSPRNG
#[derive(Debug, Clone, Default)]
pub struct RandomStampGenerator;

impl RandomStampGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl StampGenerator for RandomStampGenerator {
    fn new_stamp(&self) -> Stamp {
        let mut bytes = [0u8; STAMP_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);

        Stamp::new(URL_SAFE_NO_PAD.encode(bytes))
    }
}
