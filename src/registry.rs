//! Immutable set of codes built once at start-up.
//!
//! Building a registry constructs every field table, BCH syndrome table and
//! Reed-Solomon generator polynomial up front. Any inconsistency is reported
//! as `Error::Config` before a single record is processed. Afterwards the
//! registry is only read, so it is shared between decode calls and threads
//! through an `Arc` without locking.

use crate::config::{BchConfig, RsConfig, BCH_CONFIGS, RS6, RS8};
use crate::error::{Error, Result};
use crate::fec::bch::BchCode;
use crate::fec::reed_solomon::RsFrameCodec;
use log::info;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Reed-Solomon frame variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsProfile {
    /// 8-bit symbols with an 8-symbol erasure region
    Rs8,
    /// 6-bit symbols
    Rs6,
}

impl Display for RsProfile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RsProfile::Rs8 => write!(f, "RS8"),
            RsProfile::Rs6 => write!(f, "RS6"),
        }
    }
}

/// Every BCH and Reed-Solomon code the decoder uses
#[derive(Debug, Clone)]
pub struct CodeRegistry {
    bch: BTreeMap<u64, BchCode>,
    rs8: RsFrameCodec,
    rs6: RsFrameCodec,
}

impl CodeRegistry {
    /// Build the standard configuration set
    pub fn new() -> Result<Self> {
        Self::with_configs(&BCH_CONFIGS, &RS8, &RS6)
    }

    /// Build a registry from explicit configurations
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if any code fails to build or two BCH entries
    /// share a generator polynomial
    pub fn with_configs(bch: &[BchConfig], rs8: &RsConfig, rs6: &RsConfig) -> Result<Self> {
        let mut codes = BTreeMap::new();
        for config in bch {
            let code = BchCode::from_config(config)?;
            if codes.insert(config.poly, code).is_some() {
                return Err(Error::Config(format!(
                    "BCH generator {} configured twice",
                    config.poly
                )));
            }
        }

        let registry = CodeRegistry {
            bch: codes,
            rs8: RsFrameCodec::from_config(rs8)?,
            rs6: RsFrameCodec::from_config(rs6)?,
        };
        info!("{}", registry);
        Ok(registry)
    }

    /// Build the standard set behind an `Arc` for sharing
    pub fn shared() -> Result<Arc<Self>> {
        Self::new().map(Arc::new)
    }

    /// BCH code with generator `poly`
    pub fn bch(&self, poly: u64) -> Option<&BchCode> {
        self.bch.get(&poly)
    }

    /// BCH code with generator `poly`, as a configuration error when missing
    pub fn require_bch(&self, poly: u64) -> Result<&BchCode> {
        self.bch(poly)
            .ok_or_else(|| Error::Config(format!("no BCH code with generator {}", poly)))
    }

    /// All BCH codes, ordered by generator polynomial
    pub fn bch_codes(&self) -> impl Iterator<Item = &BchCode> {
        self.bch.values()
    }

    /// Reed-Solomon frame codec for `profile`
    pub fn rs(&self, profile: RsProfile) -> &RsFrameCodec {
        match profile {
            RsProfile::Rs8 => &self.rs8,
            RsProfile::Rs6 => &self.rs6,
        }
    }
}

impl Display for CodeRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "code registry: {} BCH codes ({} syndrome entries), RS8 nsym={}, RS6 nsym={}",
            self.bch.len(),
            self.bch.values().map(|c| c.table_entries()).sum::<usize>(),
            self.rs8.codec().nsym(),
            self.rs6.codec().nsym()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fec::bch::Codeword;
    use std::thread;

    #[test]
    fn test_standard_registry() {
        let registry = CodeRegistry::new().unwrap();
        let polys: Vec<u64> = registry.bch_codes().map(|c| c.poly()).collect();
        assert_eq!(polys, vec![29, 41, 465, 1207, 1897, 3545]);

        assert_eq!(registry.bch(1897).unwrap().codeword_bits(), 31);
        assert!(registry.bch(1234).is_none());
        assert!(matches!(registry.require_bch(1234), Err(Error::Config(_))));

        assert_eq!(registry.rs(RsProfile::Rs8).symbol_width(), 8);
        assert_eq!(registry.rs(RsProfile::Rs8).codec().nsym(), 16);
        assert_eq!(registry.rs(RsProfile::Rs6).symbol_width(), 6);
        assert_eq!(registry.rs(RsProfile::Rs6).parity(), 10);
    }

    #[test]
    fn test_duplicate_poly() {
        let configs = [BCH_CONFIGS[0], BCH_CONFIGS[0]];
        assert!(matches!(
            CodeRegistry::with_configs(&configs, &RS8, &RS6),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_bad_config_is_fatal() {
        let mut bad = BCH_CONFIGS[3];
        bad.syndrome_bits = 4;
        assert!(matches!(
            CodeRegistry::with_configs(&[bad], &RS8, &RS6),
            Err(Error::Config(_))
        ));

        let mut bad_rs = RS6;
        bad_rs.primitive = 0x11D;
        assert!(matches!(
            CodeRegistry::with_configs(&BCH_CONFIGS, &RS8, &bad_rs),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_shared_across_threads() {
        let registry = CodeRegistry::shared().unwrap();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let code = registry.bch(1897).unwrap();
                    let word = Codeword::new(0, 31).unwrap().flip(i * 7);
                    code.correct(&word).unwrap().errors
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    }
}
