// Adapters layer: reading results and rendering rankings for the outside world.

pub mod csv_results;
pub mod report;
