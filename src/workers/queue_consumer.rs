use crate::infrastructure::queue::rabbitmq::RabbitMqService;
use crate::modules::video::model::JobOutcome;
use crate::modules::video::service::JobProcessor;
use futures_util::StreamExt;
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicNackOptions, BasicRejectOptions};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const CONSUMER_TAG: &str = "video_processing_worker";

/// How a delivery is settled once its job has an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    /// Dropped without requeue; redelivering bad input cannot help.
    Reject,
    /// Returned to the queue for another attempt.
    Requeue,
}

pub fn disposition_for(outcome: &JobOutcome) -> Disposition {
    match outcome {
        outcome if outcome.is_success() => Disposition::Ack,
        JobOutcome::RejectedInput(_) => Disposition::Reject,
        _ => Disposition::Requeue,
    }
}

/// Consumes `{ "name": ... }` notifications from `queue_name` and feeds them
/// to the job processor one at a time.
pub async fn start_queue_consumer(
    queue: RabbitMqService,
    processor: Arc<JobProcessor>,
    queue_name: String,
    shutdown: CancellationToken,
) {
    info!("🎥 Starting queue consumer...");

    let mut consumer = match queue.consume(&queue_name, CONSUMER_TAG).await {
        Ok(consumer) => consumer,
        Err(e) => {
            error!("Queue consumer could not start: {}", e);
            return;
        }
    };

    info!("🎥 Queue consumer listening on '{}'", queue_name);

    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = consumer.next() => next,
        };

        let delivery = match next {
            Some(Ok(delivery)) => delivery,
            Some(Err(e)) => {
                error!("Failed to receive delivery: {}", e);
                continue;
            }
            None => {
                warn!("Consumer stream closed");
                break;
            }
        };

        info!("📦 Received transcoding job");
        let report = processor.process_notification(&delivery.data).await;
        settle(&delivery, disposition_for(&report.outcome)).await;
    }

    info!("🎥 Queue consumer stopped");
}

async fn settle(delivery: &Delivery, disposition: Disposition) {
    let result = match disposition {
        Disposition::Ack => delivery.ack(BasicAckOptions::default()).await,
        Disposition::Reject => {
            delivery
                .reject(BasicRejectOptions { requeue: false })
                .await
        }
        Disposition::Requeue => {
            delivery
                .nack(BasicNackOptions {
                    requeue: true,
                    ..BasicNackOptions::default()
                })
                .await
        }
    };

    if let Err(e) = result {
        error!(?disposition, "Failed to settle delivery: {}", e);
    }
}
