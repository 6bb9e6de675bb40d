use std::time::Duration;

use rand::Rng;
use renderflow::jobs::RenderWorker;
use tokio::time::sleep;
use tracing::{debug, error, info};

pub struct Schedule {
    worker: RenderWorker,
    interval: Duration,
    jitter: Duration,
}

impl Schedule {
    /// Jitter is a tenth of `interval`.
    pub fn new(worker: RenderWorker, interval: Duration) -> Self {
        Self {
            worker,
            interval,
            jitter: interval / 10,
        }
    }

    fn sleep_duration_with_jitter(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.interval;
        }

        let jitter_millis = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let random_jitter = rand::thread_rng().gen_range(0..=jitter_millis);
        self.interval + Duration::from_millis(random_jitter)
    }

    /// Invokes the worker forever. A failed invocation is logged and the
    /// loop carries on with the next tick.
    pub async fn run(self) -> anyhow::Result<()> {
        info!(interval = ?self.interval, "scheduled render runs enabled");
        loop {
            match self.worker.run_once().await {
                Ok(report) if report.claimed > 0 => info!(
                    processed = report.processed,
                    failed = report.failed,
                    "scheduled render run done"
                ),
                Ok(_) => debug!("no render jobs due"),
                Err(e) => error!("scheduled render run failed: {e:#}"),
            }

            sleep(self.sleep_duration_with_jitter()).await;
        }
    }
}
