use std::io;
use std::path::Path;

use ndarray::{concatenate, Array1, Array2, ArrayView1, ArrayView2, Axis, Ix1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::de::{self, Deserialize, Deserializer, Unexpected};

use crate::error::{ensure_len, ensure_rows, Result, TrainError};

#[derive(Debug, serde::Deserialize)]
struct Record {
    x1: f64,
    x2: f64,

    #[serde(deserialize_with = "bool_from_int")]
    label: bool,
}

fn bool_from_int<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match u8::deserialize(deserializer)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(de::Error::invalid_value(
            Unexpected::Unsigned(other as u64),
            &"zero or one",
        )),
    }
}

/// Design matrix with one binary label per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Array2<f64>,
    labels: Array1<f64>,
}

impl Dataset {
    pub fn new(features: Array2<f64>, labels: Array1<f64>) -> Result<Self> {
        ensure_len("labels", labels.len(), features.nrows())?;

        if let Some((index, &value)) = labels
            .iter()
            .enumerate()
            .find(|&(_, &l)| l != 0. && l != 1.)
        {
            return Err(TrainError::InvalidLabel { index, value });
        }

        Ok(Self { features, labels })
    }

    pub fn features(&self) -> ArrayView2<f64> {
        self.features.view()
    }

    pub fn labels(&self) -> ArrayView1<f64> {
        self.labels.view()
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Prepends a constant 1 column so the first weight acts as the intercept.
    pub fn with_bias(self) -> Result<Self> {
        let ones = Array2::ones((self.n_rows(), 1));

        let features = concatenate(Axis(1), &[ones.view(), self.features.view()])?;

        Ok(Self {
            features,
            labels: self.labels,
        })
    }

    pub fn select_features(&self, columns: &[usize]) -> Result<Self> {
        let n_features = self.n_features();

        if let Some(&column) = columns.iter().find(|&&c| c >= n_features) {
            return Err(TrainError::ShapeMismatch {
                what: "feature column",
                got: column,
                expected: n_features,
            });
        }

        Ok(Self {
            features: self.features.select(Axis(1), columns),
            labels: self.labels.clone(),
        })
    }

    /// Shuffles the rows with a generator seeded by `seed` and splits them into
    /// `(train, test)`. The test part gets `ceil(test_fraction * n)` rows.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<(Self, Self)> {
        let rows = self.n_rows();

        let invalid = TrainError::InvalidSplit {
            test_fraction,
            rows,
        };

        if !(test_fraction > 0. && test_fraction < 1.) {
            return Err(invalid);
        }

        let n_test = (test_fraction * rows as f64).ceil() as usize;

        if n_test == 0 || n_test >= rows {
            return Err(invalid);
        }

        let mut indices: Vec<usize> = (0..rows).collect();
        let mut rng = StdRng::seed_from_u64(seed);

        indices.shuffle(&mut rng);

        let (test_idx, train_idx) = indices.split_at(n_test);

        Ok((self.take_rows(train_idx), self.take_rows(test_idx)))
    }

    fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            labels: self.labels.select(Axis(0), indices),
        }
    }

    /// Iris reduced to sepal length and width, with setosa as class 0 and
    /// the two other species as class 1.
    pub fn iris() -> Result<Self> {
        let iris = Self::try_from(linfa_datasets::iris())?;

        iris.select_features(&[0, 1])
    }

    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;

        Self::from_reader(file)
    }

    /// Reads `x1,x2,label` records; `label` must be 0 or 1.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let records: Vec<Record> = csv::Reader::from_reader(reader)
            .deserialize()
            .collect::<std::result::Result<_, _>>()?;

        ensure_rows("csv dataset", records.len())?;

        let features: Vec<f64> = records.iter().flat_map(|r| [r.x1, r.x2]).collect();

        let labels: Array1<f64> = records.iter().map(|r| r.label as u8 as f64).collect();

        let features = Array2::from_shape_vec((records.len(), 2), features)?;

        Self::new(features, labels)
    }

    /// Two-feature synthetic data: class 0 centred at `(-separation, -separation)`,
    /// class 1 at `(separation, separation)`, unit variance.
    pub fn gaussian_blobs(n_per_class: usize, separation: f64, seed: u64) -> Result<Self> {
        let normal = Normal::new(0., 1.)?;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut features = Vec::with_capacity(4 * n_per_class);
        let mut labels = Vec::with_capacity(2 * n_per_class);

        for label in [0., 1.] {
            let centre = if label == 1. { separation } else { -separation };

            for _ in 0..n_per_class {
                features.push(centre + normal.sample(&mut rng));
                features.push(centre + normal.sample(&mut rng));
                labels.push(label);
            }
        }

        let features = Array2::from_shape_vec((labels.len(), 2), features)?;

        Self::new(features, Array1::from(labels))
    }
}

/// Binarizes a multi-class linfa dataset: target 0 stays 0, every other class becomes 1.
impl TryFrom<linfa::Dataset<f64, usize, Ix1>> for Dataset {
    type Error = TrainError;

    fn try_from(dataset: linfa::Dataset<f64, usize, Ix1>) -> Result<Self> {
        let labels = dataset.targets.mapv(|t| if t != 0 { 1. } else { 0. });

        Self::new(dataset.records, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    fn indexed(rows: usize) -> Dataset {
        let features = Array2::from_shape_fn((rows, 2), |(i, j)| (i * 10 + j) as f64);
        let labels = Array1::from_shape_fn(rows, |i| (i % 2) as f64);

        Dataset::new(features, labels).unwrap()
    }

    #[test]
    fn rejects_non_binary_labels() {
        let err = Dataset::new(array![[1.], [2.]], array![0., 2.]).unwrap_err();

        assert!(matches!(err, TrainError::InvalidLabel { index: 1, .. }));
    }

    #[test]
    fn rejects_label_count_mismatch() {
        let err = Dataset::new(array![[1.], [2.]], array![0.]).unwrap_err();

        assert!(matches!(
            err,
            TrainError::ShapeMismatch {
                got: 1,
                expected: 2,
                ..
            }
        ));
    }

    #[test]
    fn bias_column_is_prepended() {
        let data = indexed(5).with_bias().unwrap();

        assert_eq!(data.n_features(), 3);
        assert!(data.features().column(0).iter().all(|&v| v == 1.));
        assert_eq!(data.features().row(2).to_vec(), vec![1., 20., 21.]);
    }

    #[test]
    fn select_features_keeps_requested_columns() {
        let data = indexed(3).select_features(&[1]).unwrap();

        assert_eq!(data.features(), array![[1.], [11.], [21.]]);

        assert!(indexed(3).select_features(&[2]).is_err());
    }

    #[test]
    fn split_partitions_all_rows() {
        let data = indexed(150);

        let (train, test) = data.train_test_split(0.2, 666).unwrap();

        assert_eq!(train.n_rows(), 120);
        assert_eq!(test.n_rows(), 30);

        let mut ids: Vec<usize> = train
            .features()
            .column(0)
            .iter()
            .chain(test.features().column(0).iter())
            .map(|&v| v as usize / 10)
            .collect();

        ids.sort_unstable();

        assert_eq!(ids, (0..150).collect::<Vec<_>>());

        // labels travel with their rows
        for (row, label) in train.features().rows().into_iter().zip(train.labels()) {
            assert_eq!((row[0] as usize / 10 % 2) as f64, *label);
        }
    }

    #[test]
    fn split_rounds_test_size_up() {
        let (train, test) = indexed(11).train_test_split(0.25, 1).unwrap();

        assert_eq!(test.n_rows(), 3);
        assert_eq!(train.n_rows(), 8);
    }

    #[test]
    fn split_is_seeded() {
        let data = indexed(50);

        let first = data.train_test_split(0.3, 9).unwrap();
        let second = data.train_test_split(0.3, 9).unwrap();
        let other = data.train_test_split(0.3, 10).unwrap();

        assert_eq!(first, second);
        assert_ne!(first.1, other.1);
    }

    #[test]
    fn split_rejects_bad_fractions() {
        let data = indexed(10);

        for fraction in [0., 1., -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                data.train_test_split(fraction, 0),
                Err(TrainError::InvalidSplit { .. })
            ));
        }

        assert!(indexed(1).train_test_split(0.5, 0).is_err());
    }

    #[test]
    fn iris_is_two_class_two_feature() {
        let iris = Dataset::iris().unwrap();

        assert_eq!(iris.n_rows(), 150);
        assert_eq!(iris.n_features(), 2);
        assert_eq!(iris.labels().sum(), 100.);
    }

    #[test]
    fn linfa_targets_are_binarized() {
        let records = array![[0.1, 1.], [0.2, 2.], [0.3, 3.], [0.4, 4.]];
        let targets = array![0usize, 1, 2, 0];

        let data = Dataset::try_from(linfa::Dataset::new(records.clone(), targets)).unwrap();

        assert_eq!(data.features(), records);
        assert_eq!(data.labels(), array![0., 1., 1., 0.]);
    }

    #[test]
    fn reads_csv_records() {
        let csv = "x1,x2,label\n0.5,1.5,1\n-2.0,0.25,0\n3,4,1\n";

        let data = Dataset::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(data.features(), array![[0.5, 1.5], [-2.0, 0.25], [3., 4.]]);
        assert_eq!(data.labels(), array![1., 0., 1.]);
    }

    #[test]
    fn csv_label_must_be_zero_or_one() {
        let csv = "x1,x2,label\n0.5,1.5,2\n";

        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();

        assert!(matches!(err, TrainError::Csv(_)));
    }

    #[test]
    fn empty_csv_is_rejected() {
        let err = Dataset::from_reader("x1,x2,label\n".as_bytes()).unwrap_err();

        assert!(matches!(err, TrainError::Empty { .. }));
    }

    #[test]
    fn blobs_are_balanced_and_seeded() {
        let blobs = Dataset::gaussian_blobs(40, 2., 3).unwrap();

        assert_eq!(blobs.n_rows(), 80);
        assert_eq!(blobs.n_features(), 2);
        assert_eq!(blobs.labels().sum(), 40.);

        assert_eq!(blobs, Dataset::gaussian_blobs(40, 2., 3).unwrap());
    }
}
