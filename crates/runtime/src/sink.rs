//! Event sink that writes engine events to the tracing pipeline.

use adaptix_core::{EngineEvent, EventSink};
use tracing::{info, warn};

/// Sink that logs every event as structured JSON.
///
/// Degradations (deprecations, critical health, elevated failure risk)
/// log at warn; everything else at info.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: EngineEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => format!("unserializable event: {e}"),
        };
        match event {
            EngineEvent::ModelDeprecated { .. }
            | EngineEvent::FailurePredicted { .. }
            | EngineEvent::HealthCritical { .. } => warn!(%payload, "engine event"),
            _ => info!(%payload, "engine event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptix_core::{DecisionId, RecommendedAction};

    #[test]
    fn events_serialize_with_a_tag() {
        let event = EngineEvent::DecisionMade {
            decision_id: DecisionId::new(),
            recommendation: RecommendedAction::Monitor,
            confidence: 0.6,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"decision_made\""));
        // Logging must never panic on any variant.
        LogEventSink.emit(event);
    }
}
