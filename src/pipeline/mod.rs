// Pipeline orchestration: scoring pass, network pass, clustering.

pub mod run;

pub use run::{
    NetworkStage, Pipeline, PipelineOptions, PipelineOutcome, PipelineReport, ScoreStage,
};
