use std::fs::File;
use std::io;
use std::path::Path;

use itertools::{izip, Itertools};
use serde::Serialize;

use crate::error::{Result, TrainError};
use crate::trainer::EpochReport;

#[derive(Debug, Serialize)]
struct HistoryRecord<'a> {
    epoch: usize,
    optimizer: &'a str,
    train_log_loss: f64,
    train_accuracy: f64,
    /// space separated, bias weight first
    weights: String,
}

/// Writes one CSV row per rule and epoch: the loss curve, the accuracy curve
/// and the weight trajectory of every rule.
pub struct HistoryWriter<W: io::Write> {
    writer: csv::Writer<W>,
}

impl HistoryWriter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
        })
    }
}

impl<W: io::Write> HistoryWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
        }
    }

    pub fn record(&mut self, report: &EpochReport) -> Result<()> {
        for (name, &train_log_loss, &train_accuracy, weights) in izip!(
            &report.names,
            &report.train_log_loss,
            &report.train_accuracy,
            &report.weights
        ) {
            self.writer.serialize(HistoryRecord {
                epoch: report.epoch,
                optimizer: name,
                train_log_loss,
                train_accuracy,
                weights: weights.iter().join(" "),
            })?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;

        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| {
            let err = e.error();

            TrainError::Io(io::Error::new(err.kind(), err.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    #[test]
    fn writes_one_row_per_rule() {
        let report = EpochReport {
            epoch: 3,
            names: vec!["GD", "SGD"],
            train_log_loss: vec![0.5, 0.25],
            train_accuracy: vec![1., 0.75],
            weights: vec![array![0.1, -0.2], array![0., 1.5]],
        };

        let mut history = HistoryWriter::new(Vec::new());

        history.record(&report).unwrap();

        let written = String::from_utf8(history.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = written.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,optimizer,train_log_loss,train_accuracy,weights");
        assert!(lines[1].starts_with("3,GD,0.5,"));
        assert!(lines[1].ends_with(",0.1 -0.2"));
        assert!(lines[2].starts_with("3,SGD,0.25,0.75,"));
        assert!(lines[2].ends_with(",0 1.5"));
    }
}
