use itertools::Itertools;
use ndarray::Array1;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::log_reg::{evaluate_accuracy, log_loss, log_loss_grad, predict_probs};
use crate::optimizers::{
    AdaGrad, GradientDescent, StochasticGradientDescent, UpdateRule, DEFAULT_EPS_STABLE,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub eps_stable: f64,
    /// Base seed; each stochastic rule gets its own stream derived from it.
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 10_000,
            learning_rate: 1e-2,
            eps_stable: DEFAULT_EPS_STABLE,
            seed: 666,
        }
    }
}

struct Slot {
    rule: Box<dyn UpdateRule>,
    weights: Array1<f64>,
}

/// Trains one zero-initialized weight vector per update rule on the same data.
///
/// An epoch calls every rule [`UpdateRule::steps_per_epoch`] times: once for
/// full-batch gradient descent, once per training row for the stochastic rules.
pub struct BinaryClassifierTrainer {
    slots: Vec<Slot>,
    epochs: usize,
}

/// Training metrics of every rule after one epoch, in rule order.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    pub names: Vec<&'static str>,
    pub train_log_loss: Vec<f64>,
    pub train_accuracy: Vec<f64>,
    pub weights: Vec<Array1<f64>>,
}

impl EpochReport {
    pub fn log_loss_line(&self) -> String {
        metrics_line("Train LogLoss", &self.names, &self.train_log_loss)
    }

    pub fn accuracy_line(&self) -> String {
        metrics_line("Train Accuracies", &self.names, &self.train_accuracy)
    }
}

/// `"<label> (GD, SGD, AdaGrad): 0.5 0.25 1.0"`
pub fn metrics_line(label: &str, names: &[&str], values: &[f64]) -> String {
    format!(
        "{label} ({}): {}",
        names.iter().join(", "),
        values.iter().map(|v| format!("{v:?}")).join(" ")
    )
}

impl TrainerConfig {
    pub fn sgd_seed(&self) -> u64 {
        self.seed.wrapping_add(1)
    }

    pub fn adagrad_seed(&self) -> u64 {
        self.seed.wrapping_add(2)
    }
}

impl BinaryClassifierTrainer {
    /// GD, SGD and AdaGrad, all with `config.learning_rate`.
    pub fn new(n_features: usize, config: &TrainerConfig) -> Self {
        let rules: Vec<Box<dyn UpdateRule>> = vec![
            Box::new(GradientDescent::new(config.learning_rate)),
            Box::new(
                StochasticGradientDescent::new(config.learning_rate).with_seed(config.sgd_seed()),
            ),
            Box::new(
                AdaGrad::new(n_features, config.learning_rate)
                    .with_eps_stable(config.eps_stable)
                    .with_seed(config.adagrad_seed()),
            ),
        ];

        Self::with_rules(n_features, config.epochs, rules)
    }

    pub fn with_rules(n_features: usize, epochs: usize, rules: Vec<Box<dyn UpdateRule>>) -> Self {
        let slots = rules
            .into_iter()
            .map(|rule| Slot {
                rule,
                weights: Array1::zeros(n_features),
            })
            .collect();

        Self { slots, epochs }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| s.rule.name()).collect()
    }

    pub fn weights(&self) -> Vec<&Array1<f64>> {
        self.slots.iter().map(|s| &s.weights).collect()
    }

    pub fn run_epoch(&mut self, epoch: usize, train: &Dataset) -> Result<EpochReport> {
        let (x, y) = (train.features(), train.labels());

        for slot in &mut self.slots {
            for _ in 0..slot.rule.steps_per_epoch(train.n_rows()) {
                slot.rule.update(&mut slot.weights, x, y, log_loss_grad)?;
            }
        }

        let mut train_log_loss = Vec::with_capacity(self.slots.len());
        let mut train_accuracy = Vec::with_capacity(self.slots.len());

        for slot in &self.slots {
            let probs = predict_probs(x, slot.weights.view())?;

            train_log_loss.push(log_loss(y, probs.view())?);
            train_accuracy.push(evaluate_accuracy(x, y, slot.weights.view())?);
        }

        Ok(EpochReport {
            epoch,
            names: self.names(),
            train_log_loss,
            train_accuracy,
            weights: self.slots.iter().map(|s| s.weights.clone()).collect(),
        })
    }

    /// Runs every configured epoch, handing each report to `on_epoch`.
    /// An error from either training or the callback stops the run.
    pub fn fit<F>(&mut self, train: &Dataset, mut on_epoch: F) -> Result<()>
    where
        F: FnMut(&EpochReport) -> Result<()>,
    {
        for epoch in 0..self.epochs {
            let report = self.run_epoch(epoch, train)?;

            on_epoch(&report)?;
        }

        Ok(())
    }

    /// Accuracy of every rule's current weights on `data`.
    pub fn evaluate(&self, data: &Dataset) -> Result<Vec<f64>> {
        self.slots
            .iter()
            .map(|s| evaluate_accuracy(data.features(), data.labels(), s.weights.view()))
            .collect()
    }
}
