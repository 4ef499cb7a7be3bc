//! # Degree and Memory Map Configuration
//!
//! Programs are generated for one polynomial degree (512 or 1024 for Falcon,
//! any power of two from 2 upward for testing). The memory maps below describe
//! which rows of which bank hold pre-loaded data when a program starts.

use crate::bank::{Bank, NUM_BANKS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest degree the scheduler supports (one split level above the leaves)
pub const MIN_DEGREE: u32 = 2;

/// Largest degree the scheduler supports (Falcon-1024)
pub const MAX_DEGREE: u32 = 1024;

/// Rows of BRAM0..BRAM3 reserved for the FFT basis rows in sign programs
pub const BASIS_ROWS: u32 = 512;

/// Rows of the message header read by HASH_TO_POINT
pub const MESSAGE_HEADER_ROWS: u32 = 1;

/// Rows of the compressed signature header read by DECOMPRESS
pub const SIGNATURE_HEADER_ROWS: u32 = 1;

/// Polynomial degree of a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Degree(u32);

impl Degree {
    /// Falcon-512
    pub const FALCON_512: Self = Self(512);

    /// Falcon-1024
    pub const FALCON_1024: Self = Self(1024);

    /// Create a degree with validation
    pub const fn new(n: u32) -> Result<Self, ConfigError> {
        if n < MIN_DEGREE {
            return Err(ConfigError::DegreeTooSmall(n));
        }
        if !n.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo(n));
        }
        if n > MAX_DEGREE {
            return Err(ConfigError::DegreeTooLarge(n));
        }
        Ok(Self(n))
    }

    /// Degree as a plain integer
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// log2 of the degree
    #[inline]
    pub const fn log2(self) -> u32 {
        self.0.trailing_zeros()
    }

    /// Rows occupied by one polynomial in FFT form (two coefficients per row)
    #[inline]
    pub const fn rows(self) -> u32 {
        self.0 / 2
    }

    /// Element-count field for instructions touching a whole polynomial
    #[inline]
    pub const fn element_count(self) -> u8 {
        (self.log2() - 1) as u8
    }

    /// Elements of the LDL tree for this degree
    #[inline]
    pub const fn tree_elements(self) -> u32 {
        tree_size(self.0)
    }

    /// Rows of the LDL tree (two elements per row)
    #[inline]
    pub const fn tree_rows(self) -> u32 {
        self.tree_elements().div_ceil(2)
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Elements of an LDL tree over degree `k`: one level of `k` elements per depth
#[inline]
pub const fn tree_size(k: u32) -> u32 {
    (k.trailing_zeros() + 1) * k
}

/// Rows of each bank holding valid data before the first instruction runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMap {
    pub preloaded: [u32; NUM_BANKS],
}

impl MemoryMap {
    /// Nothing pre-loaded
    pub const EMPTY: Self = Self {
        preloaded: [0; NUM_BANKS],
    };

    /// Verify: public key in BRAM0, compressed signature in BRAM1, message in BRAM6
    pub fn verify(degree: Degree) -> Self {
        let mut map = Self::EMPTY;
        map.preloaded[Bank::Bram0.index()] = degree.rows();
        map.preloaded[Bank::Bram1.index()] = SIGNATURE_HEADER_ROWS;
        map.preloaded[Bank::Bram6.index()] = MESSAGE_HEADER_ROWS;
        map
    }

    /// Sign: basis rows in BRAM0..BRAM3, message in BRAM4, LDL tree in BRAM6
    pub fn sign(degree: Degree) -> Self {
        let mut map = Self::EMPTY;
        for bank in Bank::WORKING_RING {
            map.preloaded[bank.index()] = BASIS_ROWS;
        }
        map.preloaded[Bank::Bram4.index()] = MESSAGE_HEADER_ROWS;
        map.preloaded[Bank::Bram6.index()] = degree.tree_rows();
        map
    }

    /// Mark `rows` rows of `bank` as pre-loaded
    pub fn with_preloaded(mut self, bank: Bank, rows: u32) -> Self {
        self.preloaded[bank.index()] = rows;
        self
    }

    /// Pre-loaded rows of one bank
    #[inline]
    pub fn rows(&self, bank: Bank) -> u32 {
        self.preloaded[bank.index()]
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Configuration error types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    /// Degree must be at least 2
    DegreeTooSmall(u32),
    /// Degree must be a power of two
    NotPowerOfTwo(u32),
    /// Degree must not exceed 1024
    DegreeTooLarge(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DegreeTooSmall(n) => {
                write!(f, "degree {} is below the minimum of {}", n, MIN_DEGREE)
            }
            ConfigError::NotPowerOfTwo(n) => {
                write!(f, "degree {} is not a power of two", n)
            }
            ConfigError::DegreeTooLarge(n) => {
                write!(f, "degree {} exceeds the maximum of {}", n, MAX_DEGREE)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falcon_512() {
        let d = Degree::FALCON_512;
        assert_eq!(d.get(), 512);
        assert_eq!(d.log2(), 9);
        assert_eq!(d.rows(), 256);
        assert_eq!(d.element_count(), 8);
        assert_eq!(d.tree_elements(), 5120);
        assert_eq!(d.tree_rows(), 2560);
    }

    #[test]
    fn test_validation() {
        assert!(Degree::new(2).is_ok());
        assert!(Degree::new(1024).is_ok());

        assert_eq!(Degree::new(0).unwrap_err(), ConfigError::DegreeTooSmall(0));
        assert_eq!(Degree::new(1).unwrap_err(), ConfigError::DegreeTooSmall(1));
        assert_eq!(Degree::new(384).unwrap_err(), ConfigError::NotPowerOfTwo(384));
        assert_eq!(Degree::new(2048).unwrap_err(), ConfigError::DegreeTooLarge(2048));
    }

    #[test]
    fn test_tree_size() {
        assert_eq!(tree_size(1), 1);
        assert_eq!(tree_size(2), 4);
        assert_eq!(tree_size(4), 12);
        assert_eq!(tree_size(1024), 11264);

        // One level of k elements plus two subtrees of half size
        for k in [4u32, 8, 64, 512] {
            assert_eq!(tree_size(k), k + 2 * tree_size(k / 2));
        }
    }

    #[test]
    fn test_memory_maps() {
        let d = Degree::FALCON_512;
        let verify = MemoryMap::verify(d);
        assert_eq!(verify.rows(Bank::Bram0), 256);
        assert_eq!(verify.rows(Bank::Bram6), MESSAGE_HEADER_ROWS);
        assert_eq!(verify.rows(Bank::Bram5), 0);

        let sign = MemoryMap::sign(d);
        assert_eq!(sign.rows(Bank::Bram3), BASIS_ROWS);
        assert_eq!(sign.rows(Bank::Bram6), 2560);
        assert_eq!(sign.rows(Bank::Bram5), 0);
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::NotPowerOfTwo(3).to_string(),
            "degree 3 is not a power of two"
        );
    }
}
