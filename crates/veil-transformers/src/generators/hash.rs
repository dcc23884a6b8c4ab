use super::Generator;
use crate::error::GeneratorError;
use sha2::{Digest, Sha512};

/// SHA-512 in counter mode over `salt || seed || counter`.
pub struct HashGenerator {
    salt: Vec<u8>,
    size: usize,
}

impl HashGenerator {
    pub fn new(salt: Vec<u8>, size: usize) -> Self {
        Self { salt, size }
    }
}

impl Generator for HashGenerator {
    fn generate(&mut self, seed: &[u8]) -> Result<Vec<u8>, GeneratorError> {
        let mut output = Vec::with_capacity(self.size + 64);
        let mut counter: u64 = 0;

        while output.len() < self.size {
            let mut hasher = Sha512::new();
            hasher.update(&self.salt);
            hasher.update(seed);
            hasher.update(counter.to_be_bytes());
            output.extend_from_slice(&hasher.finalize());
            counter += 1;
        }

        output.truncate(self.size);
        Ok(output)
    }

    fn size(&self) -> usize {
        self.size
    }
}
