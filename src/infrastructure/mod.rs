pub mod queue;
pub mod staging;
pub mod storage;
pub mod transcoder;
