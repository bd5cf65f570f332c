//! Numerical building blocks for SCPN HMcode Core.

pub mod error;
pub mod interp;
pub mod ode;
pub mod quadrature;
pub mod roots;
pub mod smoothing;
pub mod special;
