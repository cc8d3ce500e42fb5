//! Training statistics

use serde::{Deserialize, Serialize};

/// Running statistics over codec training steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Total steps
    pub total_steps: usize,
    /// Loss of the most recent step
    pub last_loss: f32,
    /// Running loss (EMA)
    pub running_loss: f32,
    /// Best loss seen
    pub best_loss: f32,
    /// Steps since improvement
    pub steps_without_improvement: usize,
    /// Current learning rate
    pub current_lr: f32,
}

impl Default for TrainingStats {
    fn default() -> Self {
        Self {
            total_steps: 0,
            last_loss: 0.0,
            running_loss: 0.0,
            best_loss: f32::MAX,
            steps_without_improvement: 0,
            current_lr: 0.0,
        }
    }
}

impl TrainingStats {
    /// Update with new loss
    pub fn update(&mut self, loss: f32, lr: f32) {
        self.total_steps += 1;
        self.last_loss = loss;
        self.current_lr = lr;

        // Exponential moving average of loss
        if self.total_steps == 1 {
            self.running_loss = loss;
        } else {
            self.running_loss = 0.99 * self.running_loss + 0.01 * loss;
        }

        if loss < self.best_loss {
            self.best_loss = loss;
            self.steps_without_improvement = 0;
        } else {
            self.steps_without_improvement += 1;
        }
    }
}
