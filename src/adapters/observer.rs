use crate::domain::model::ExportStage;
use crate::domain::ports::ExportObserver;
use std::sync::{Mutex, PoisonError};

/// Logs every callback and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExportObserver for TracingObserver {
    fn on_error(&self, message: &str) {
        tracing::error!("❌ {}", message);
    }

    fn on_progress(&self, stage: &ExportStage) {
        tracing::info!("📡 {}", stage);
    }
}

/// Logs like [`TracingObserver`] and keeps the messages so they can be shown
/// together once the run ends.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    errors: Mutex<Vec<String>>,
    stages: Mutex<Vec<ExportStage>>,
}

impl CollectingObserver {
    pub fn errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stages(&self) -> Vec<ExportStage> {
        self.stages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ExportObserver for CollectingObserver {
    fn on_error(&self, message: &str) {
        TracingObserver.on_error(message);
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }

    fn on_progress(&self, stage: &ExportStage) {
        if matches!(stage, ExportStage::FetchingPortfolio { .. }) {
            tracing::debug!("📡 {}", stage);
        } else {
            TracingObserver.on_progress(stage);
        }
        self.stages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(stage.clone());
    }
}
