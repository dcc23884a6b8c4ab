use super::Generator;
use crate::error::GeneratorError;
use rand::{rngs::StdRng, RngCore, SeedableRng};

pub struct RandomGenerator {
    rng: StdRng,
    size: usize,
}

impl RandomGenerator {
    pub fn new(size: usize) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            size,
        }
    }
}

impl Generator for RandomGenerator {
    fn generate(&mut self, _seed: &[u8]) -> Result<Vec<u8>, GeneratorError> {
        let mut output = vec![0u8; self.size];
        self.rng.fill_bytes(&mut output);
        Ok(output)
    }

    fn size(&self) -> usize {
        self.size
    }
}
