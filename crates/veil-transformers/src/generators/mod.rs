mod hash;
mod random;

pub use hash::HashGenerator;
pub use random::RandomGenerator;

use crate::error::GeneratorError;
use std::{fmt, str::FromStr};

/// Generators must produce at least this many bytes so an index can always be
/// derived with [`build_u64_from_bytes`].
pub const MIN_GENERATOR_SIZE: usize = 8;

pub trait Generator: Send {
    /// Returns exactly [`Generator::size`] bytes.
    fn generate(&mut self, seed: &[u8]) -> Result<Vec<u8>, GeneratorError>;
    fn size(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Random,
    Deterministic,
}

impl FromStr for Engine {
    type Err = GeneratorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "random" => Ok(Engine::Random),
            "deterministic" | "hash" => Ok(Engine::Deterministic),
            other => Err(GeneratorError::UnknownEngine(other.to_string())),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Random => f.write_str("random"),
            Engine::Deterministic => f.write_str("deterministic"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeneratorSettings {
    pub salt: Vec<u8>,
}

impl GeneratorSettings {
    pub fn new(salt: impl Into<Vec<u8>>) -> Self {
        Self { salt: salt.into() }
    }
}

pub fn build_generator(
    engine: Engine,
    size: usize,
    settings: &GeneratorSettings,
) -> Result<Box<dyn Generator>, GeneratorError> {
    if size < MIN_GENERATOR_SIZE {
        return Err(GeneratorError::SizeTooSmall {
            size,
            min: MIN_GENERATOR_SIZE,
        });
    }

    Ok(match engine {
        Engine::Random => Box::new(RandomGenerator::new(size)),
        Engine::Deterministic => Box::new(HashGenerator::new(settings.salt.clone(), size)),
    })
}

/// Little-endian u64 from the first 8 bytes.
pub fn build_u64_from_bytes(data: &[u8]) -> Result<u64, GeneratorError> {
    let mut bytes = [0u8; 8];
    match data.get(..8) {
        Some(head) => bytes.copy_from_slice(head),
        None => return Err(GeneratorError::NotEnoughBytes(data.len())),
    }
    Ok(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_from_str() {
        assert_eq!("random".parse::<Engine>().unwrap(), Engine::Random);
        assert_eq!("hash".parse::<Engine>().unwrap(), Engine::Deterministic);
        assert!("md5".parse::<Engine>().is_err());
    }

    #[test]
    fn test_build_generator_rejects_small_size() {
        assert!(matches!(
            build_generator(Engine::Random, 4, &GeneratorSettings::default()),
            Err(GeneratorError::SizeTooSmall { size: 4, min: 8 })
        ));
    }

    #[test]
    fn test_build_u64_from_bytes() {
        assert_eq!(
            build_u64_from_bytes(&[1, 0, 0, 0, 0, 0, 0, 0, 9]).unwrap(),
            1
        );
        assert!(build_u64_from_bytes(&[1, 2, 3]).is_err());
    }
}
