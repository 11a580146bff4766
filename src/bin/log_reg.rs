use clap::Parser;

use loss_optimization::history::HistoryWriter;
use loss_optimization::trainer::metrics_line;
use loss_optimization::{BinaryClassifierTrainer, Dataset, TrainerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value_t = 10_000)]
    epochs: usize,

    #[arg(long, default_value_t = 1e-2)]
    learning_rate: f64,

    #[arg(long, default_value_t = 1e-8)]
    eps_stable: f64,

    /// Seeds both the train/test split and the row sampling.
    #[arg(long, default_value_t = 666)]
    seed: u64,

    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,

    /// `x1,x2,label` CSV to train on instead of Iris.
    #[arg(long, conflicts_with = "blobs")]
    csv_path: Option<String>,

    /// Train on this many synthetic points per class instead of Iris.
    #[arg(long)]
    blobs: Option<usize>,

    /// Per-epoch loss, accuracy and weights of every rule, as CSV.
    #[arg(long)]
    history_path: Option<String>,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    log_every: u64,
}

fn load_dataset(args: &Args) -> Result<Dataset, Box<dyn std::error::Error>> {
    let dataset = match (&args.csv_path, args.blobs) {
        (Some(path), _) => Dataset::from_csv(path)?,
        (None, Some(n_per_class)) => Dataset::gaussian_blobs(n_per_class, 1.5, args.seed)?,
        (None, None) => Dataset::iris()?,
    };

    Ok(dataset.with_bias()?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let dataset = load_dataset(&args)?;

    let (train, test) = dataset.train_test_split(args.test_fraction, args.seed)?;

    let config = TrainerConfig {
        epochs: args.epochs,
        learning_rate: args.learning_rate,
        eps_stable: args.eps_stable,
        seed: args.seed,
    };

    let mut trainer = BinaryClassifierTrainer::new(train.n_features(), &config);

    let mut history = args
        .history_path
        .as_ref()
        .map(HistoryWriter::create)
        .transpose()?;

    trainer.fit(&train, |report| {
        if (report.epoch as u64 + 1) % args.log_every == 0 {
            println!("{}", report.log_loss_line());
            println!("{}", report.accuracy_line());
        }

        if let Some(history) = history.as_mut() {
            history.record(report)?;
        }

        Ok(())
    })?;

    if let Some(history) = history.as_mut() {
        history.flush()?;
    }

    let test_accuracies = trainer.evaluate(&test)?;

    println!(
        "{}",
        metrics_line("Test Accuracies", &trainer.names(), &test_accuracies)
    );

    Ok(())
}
