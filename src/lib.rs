//! Car-Following Simulation Library
//!
//! Simulates vehicles following each other along a single road, advanced in
//! lock-step by a fixed-rate clock.

pub mod simulation;
