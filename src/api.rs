pub mod trains;

pub use trains::{fetch_with_retry, FetchError, HttpTrainSource, TrainSource};
