// ─────────────────────────────────────────────────────────────────────
// SCPN HMcode Core — Growth Table Cache
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Caller-owned memo of growth tables keyed by cosmology fingerprint.

use crate::growth::GrowthTable;
use dashmap::DashMap;
use hmcode_types::config::GrowthConfig;
use hmcode_types::cosmology::{CosmologicalParameters, CosmologyFingerprint};
use hmcode_types::error::HmcodeResult;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GrowthKey {
    cosmology: CosmologyFingerprint,
    a_initial: u64,
    steps: usize,
}

impl GrowthKey {
    fn new(cosmology: &CosmologicalParameters, config: &GrowthConfig) -> Self {
        GrowthKey {
            cosmology: cosmology.fingerprint(),
            a_initial: config.a_initial.to_bits(),
            steps: config.steps,
        }
    }
}

/// Shared growth tables. Tables are immutable, so concurrent readers of the
/// same cosmology share one `Arc` without locking.
#[derive(Debug, Default)]
pub struct GrowthCache {
    tables: DashMap<GrowthKey, Arc<GrowthTable>>,
}

impl GrowthCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached table for `cosmology`, building it on a miss. Two threads
    /// missing at once both build; the first insert wins.
    pub fn get_or_build(
        &self,
        cosmology: &CosmologicalParameters,
        config: &GrowthConfig,
    ) -> HmcodeResult<Arc<GrowthTable>> {
        let key = GrowthKey::new(cosmology, config);
        if let Some(hit) = self.tables.get(&key) {
            trace!(?key, "growth cache hit");
            return Ok(Arc::clone(&hit));
        }
        let table = Arc::new(GrowthTable::build(cosmology, config)?);
        let entry = self.tables.entry(key).or_insert(table);
        Ok(Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn clear(&self) {
        self.tables.clear();
    }
}
