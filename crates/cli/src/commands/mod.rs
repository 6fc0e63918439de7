//! CLI Commands

pub mod check;
pub mod sample;
pub mod update;
