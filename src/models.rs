mod train;

pub use train::TrainRecord;
