// Temporal activity scoring: decay accumulator, aggregator, threshold selector.

pub mod aggregate;
pub mod decay;
pub mod table;
pub mod threshold;
