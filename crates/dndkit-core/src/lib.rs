#![forbid(unsafe_code)]

//! Core: geometry, host document abstraction, pointer normalization, and
//! event throttling for dndkit.

#[macro_use]
pub mod logging;

pub mod dom;
pub mod geometry;
pub mod memory_dom;
pub mod pointer;
pub mod scroll;
pub mod throttle;
