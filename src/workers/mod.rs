pub mod queue_consumer;
pub mod reclaimer;
