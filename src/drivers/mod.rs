//! Concrete drivers built on the driver contract.

pub mod cozo;

pub use cozo::CozoDriver;
