//! HMcode-2020 halo-model engine for the non-linear matter power spectrum.
//!
//! Stage 1: background, growth, neutrino transfer, linear slices
//! Stage 2: de-wiggling, variance, spherical collapse, calibration
//! Stage 3: halo profiles, halo-model integrals, assembler, growth cache

pub mod background;
pub mod cache;
pub mod collapse;
pub mod dewiggle;
pub mod fitting;
pub mod growth;
pub mod halomodel;
pub mod linear;
pub mod neutrinos;
pub mod power;
pub mod profile;
pub mod variance;

pub use cache::GrowthCache;
pub use power::{HmCode, NonlinearPowerGrid};
