use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::time::{Duration, Instant};

/// What a finished run produced and where its artefacts went.
#[derive(Debug)]
pub struct GenerationReport<T> {
    pub output: T,
    pub location: String,
    pub elapsed: Duration,
}

pub struct GenerationEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> GenerationEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<GenerationReport<P::Output>> {
        let name = self.pipeline.name();
        let started = Instant::now();
        tracing::info!("🚀 Starting {} generation", name);
        self.monitor.log_stats("Start");

        // Extract
        tracing::info!("📥 Reading {} inputs...", name);
        let input = self
            .pipeline
            .extract()
            .await
            .inspect_err(|e| tracing::error!("❌ {} extract failed: {}", name, e))?;
        tracing::debug!("Extract finished in {:?}", started.elapsed());
        self.monitor.log_stats("Extract");

        // Transform
        tracing::info!("⚙️ Scheduling {}...", name);
        let output = self
            .pipeline
            .transform(input)
            .await
            .inspect_err(|e| tracing::error!("❌ {} scheduling failed: {}", name, e))?;
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!("💾 Writing {} outputs...", name);
        let location = self
            .pipeline
            .load(&output)
            .await
            .inspect_err(|e| tracing::error!("❌ {} write failed: {}", name, e))?;
        self.monitor.log_stats("Load");

        let elapsed = started.elapsed();
        tracing::info!("✅ {} outputs saved to: {} ({:?})", name, location, elapsed);
        self.monitor.log_final_stats();

        Ok(GenerationReport {
            output,
            location,
            elapsed,
        })
    }
}
