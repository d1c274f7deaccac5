pub mod extractor;
pub mod logging;
pub mod pipeline;
pub mod processor;
pub mod remote;
pub mod sources;

pub use extractor::{ArticleExtractor, Extractor};
pub use logging::{init_logging, Logger};
pub use pipeline::{BlogPipeline, DryRunReport, PipelineOptions, PipelineOutcome};
pub use remote::HttpRevalidator;
pub use sources::{ArticleSource, RecencyWindow};

pub mod prelude {
    pub use super::extractor::{ArticleExtractor, Extractor};
    pub use super::pipeline::{BlogPipeline, PipelineOptions, PipelineOutcome};
    pub use super::sources::ArticleSource;
    pub use wcag_core::{Article, Error, Result};
}
