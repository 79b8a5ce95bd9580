//! Quantum Cryptography Protocols.
//!
//! This module contains the key distribution protocols and the shared
//! channel-to-key pipeline they run through.

pub mod qkd;
pub use qkd::{bb84, e91};
