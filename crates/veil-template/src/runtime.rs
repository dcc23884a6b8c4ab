use rand::{rngs::StdRng, SeedableRng};

/// Per-transformer state shared by the random template functions.
pub struct TemplateRuntime {
    rng: StdRng,
}

impl TemplateRuntime {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for TemplateRuntime {
    fn default() -> Self {
        Self::new()
    }
}
