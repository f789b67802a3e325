// Polarnet: temporal retweet scoring and co-audience polarization.
//
// This is the library root. Each module corresponds to one stage or concern
// of the pipeline: events -> scoring -> network -> clustering, plus config,
// errors and output formatting.

pub mod clustering;
pub mod config;
pub mod error;
pub mod events;
pub mod network;
pub mod output;
pub mod period;
pub mod pipeline;
pub mod scoring;
