//! Learning loop: outcome feedback, EMA accuracy updates, the adaptive
//! learning phase and the retrain path.

mod adaptive;
mod feedback;
mod retrain;

pub use adaptive::AdaptiveStateController;
pub use feedback::{FeedbackLoop, LearningError, Result};
pub use retrain::{RetrainService, RetrainSummary};
