//! Carretera: Stateright models.
//!
//! Small and "toy" on purpose: a few vehicles on a 2-3 segment road, enough
//! to model-check lane exclusivity, FIFO service, the backward cascade and
//! the tick/circulate rendezvous without the threads of the real crate.
//!
//! Each example in `examples/` focuses on one little machine.

pub mod toy_road;
