//! This module contains submodules for preparing test data for the filter bank.
//!
//! The `noise` submodule simulates powerline interference, baseline wander and EMG noise.
pub mod noise;
