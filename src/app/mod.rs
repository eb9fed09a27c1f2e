// Application layer: the procedure calculators built on the core algorithms.

pub mod calculators;
