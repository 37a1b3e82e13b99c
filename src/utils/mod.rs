//! Shared utility data structures.
//!
//! This module contains small, dependency-free building blocks used by the
//! analysis layers, most notably the [`BitSet`] backing register liveness.

mod bitset;

pub use bitset::{BitSet, BitSetIter};
