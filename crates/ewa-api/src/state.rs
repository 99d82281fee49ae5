//! Application state management
//!
//! Author: hephaex@gmail.com

use ewa_core::{AppConfig, Result};
use ewa_rag::SupportPipeline;
use std::time::Instant;

/// Application state shared across invocations
///
/// Built once at start-up and never mutated afterwards.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Embed, retrieve, generate pipeline
    pub pipeline: SupportPipeline,
    /// Process start time
    pub start_time: Instant,
}

impl AppState {
    /// Create application state from an already built pipeline
    pub fn new(config: AppConfig, pipeline: SupportPipeline) -> Self {
        Self {
            config,
            pipeline,
            start_time: Instant::now(),
        }
    }

    /// Build every service client from config
    pub async fn initialize(config: AppConfig) -> Result<Self> {
        let pipeline = SupportPipeline::from_config(&config).await?;
        Ok(Self::new(config, pipeline))
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
