//! Binary logistic regression trained with gradient descent, stochastic
//! gradient descent and AdaGrad.

pub mod dataset;
pub mod error;
pub mod history;
pub mod log_reg;
pub mod optimizers;
pub mod trainer;

pub use dataset::Dataset;
pub use error::{Result, TrainError};
pub use trainer::{BinaryClassifierTrainer, EpochReport, TrainerConfig};
