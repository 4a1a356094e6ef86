use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use tracing::info;
use ldars::{Document, FitOptions, LogLikelihood, Model, ModelOptions, MonitoringCallback, PersistedModel, TopicDocument};
use ldars::state::GlobalState;

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Opt {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a model on a corpus of `docid wordid count` triples.
    Train(TrainOpt),
    /// Infer topics for unseen documents with a fixed model.
    Predict(PredictOpt),
    /// Perplexity of documents with topic assignments (JSON lines) under a model.
    Perplexity(PerplexityOpt),
}

#[derive(Debug, Args)]
pub struct TrainOpt {
    /// Corpus file, one `docid wordid count` triple per line.
    #[clap(short, long, parse(from_os_str))]
    pub input: PathBuf,

    /// Model file to write, JSON if the extension is `.json`, bincode otherwise.
    #[clap(short, long, parse(from_os_str))]
    pub model: PathBuf,

    /// Document topics output (JSON lines), defaults to stdout.
    #[clap(short, long, parse(from_os_str))]
    pub output: Option<PathBuf>,

    /// Vocabulary size, word ids are expected in [0, voc_size)
    #[clap(long)]
    pub voc_size: usize,

    /// Number of topics
    #[clap(short, default_value_t = 10)]
    pub k: usize,

    /// Document-topic concentration (defaults to 50 / k)
    #[clap(short, long)]
    pub alpha: Option<f64>,

    /// Topic-word concentration
    #[clap(short, long, default_value_t = 0.01)]
    pub beta: f64,

    /// Maximum number of iterations
    #[clap(long, default_value_t = 100)]
    pub iters: usize,

    /// Evaluate the training perplexity every n iterations (0 = never)
    #[clap(long, default_value_t = 0)]
    pub evaluate_every: usize,

    /// Stop once the relative perplexity change drops below this (0 = never)
    #[clap(long, default_value_t = 0.0)]
    pub perplexity_tol: f64,

    /// Seed for the random number generator
    #[clap(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of workers (partitions) for parallelization (-1 = number of CPUs)
    #[clap(short, short_alias = 't', default_value_t = -1)]
    pub workers: i32,

    /// Log the iteration statistics.
    #[clap(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct PredictOpt {
    /// Corpus file, one `docid wordid count` triple per line.
    #[clap(short, long, parse(from_os_str))]
    pub input: PathBuf,

    /// Model file written by `train`.
    #[clap(short, long, parse(from_os_str))]
    pub model: PathBuf,

    /// Document topics output (JSON lines), defaults to stdout.
    #[clap(short, long, parse(from_os_str))]
    pub output: Option<PathBuf>,

    /// Number of resampling passes over each document
    #[clap(long, default_value_t = 20)]
    pub sweeps: usize,

    /// Seed for the random number generator
    #[clap(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of workers (partitions) for parallelization (-1 = number of CPUs)
    #[clap(short, short_alias = 't', default_value_t = -1)]
    pub workers: i32,
}

#[derive(Debug, Args)]
pub struct PerplexityOpt {
    /// Document topics (JSON lines) written by `train` or `predict`.
    #[clap(short, long, parse(from_os_str))]
    pub input: PathBuf,

    /// Model file written by `train`.
    #[clap(short, long, parse(from_os_str))]
    pub model: PathBuf,
}


fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(e) = try_main() {
        eprintln!("ldars: {}", e);
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    let opt: Opt = Opt::parse();

    match opt.command {
        Command::Train(opt) => train(opt),
        Command::Predict(opt) => predict(opt),
        Command::Perplexity(opt) => perplexity(opt),
    }
}

fn train(opt: TrainOpt) -> Result<(), Box<dyn Error>> {
    let documents = read_documents(&opt.input)?;
    info!(n_documents = documents.len(), path = %opt.input.display(), "read corpus");

    let mut model_options = ModelOptions::default(opt.voc_size, opt.k);
    if let Some(alpha) = opt.alpha {
        model_options.alpha = alpha;
    }
    model_options.beta = opt.beta;

    let fit_options = FitOptions {
        seed: opt.seed,
        iters: opt.iters,
        workers: opt.workers,
        evaluate_every: opt.evaluate_every,
        perplexity_tol: opt.perplexity_tol,
        ..FitOptions::default()
    };

    let mut callback = MonitoringCallback::<GlobalState>::new();
    if opt.verbose {
        callback.add_metric(LogLikelihood);
    }
    callback.set_verbose(opt.verbose);

    let mut model = Model::from_options(model_options);
    let outputs = model.fit(documents, &fit_options, Some(callback))?;

    save_model(&opt.model, &model.to_persisted()?)?;
    info!(path = %opt.model.display(), "saved model");
    write_documents(opt.output.as_deref(), &outputs)
}

fn predict(opt: PredictOpt) -> Result<(), Box<dyn Error>> {
    let documents = read_documents(&opt.input)?;
    let model = Model::from_persisted(load_model(&opt.model)?)?;

    let fit_options = FitOptions {
        seed: opt.seed,
        workers: opt.workers,
        predict_sweeps: opt.sweeps,
        ..FitOptions::default()
    };
    let outputs = model.predict(documents, &fit_options)?;
    info!(n_documents = outputs.len(), "inferred document topics");

    write_documents(opt.output.as_deref(), &outputs)
}

fn perplexity(opt: PerplexityOpt) -> Result<(), Box<dyn Error>> {
    let model = Model::from_persisted(load_model(&opt.model)?)?;

    let reader = BufReader::new(File::open(&opt.input)?);
    let documents = reader.lines()
        .filter_ok(|line| !line.trim().is_empty())
        .map(|line| -> Result<TopicDocument, Box<dyn Error>> { Ok(serde_json::from_str(&line?)?) })
        .collect::<Result<Vec<_>, _>>()?;

    let perplexity = model.perplexity(&documents)?;
    println!("{}", perplexity);
    Ok(())
}

/// Reads whitespace separated `docid wordid count` triples.
///
/// All lines with the same doc id form one document, repeated words are summed. Documents are
/// returned in ascending doc id order.
pub fn read_documents(path: &Path) -> Result<Vec<Document>, Box<dyn Error>> {
    parse_documents(BufReader::new(File::open(path)?))
}

pub fn parse_documents(reader: impl BufRead) -> Result<Vec<Document>, Box<dyn Error>> {
    let mut triples = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let fields: Vec<_> = line.split_whitespace().collect();
        match fields.as_slice() {
            [] => continue,
            [doc_id, word, count] => triples.push((
                doc_id.parse::<i64>().map_err(|e| format!("line {}: doc id: {}", i + 1, e))?,
                word.parse::<usize>().map_err(|e| format!("line {}: word id: {}", i + 1, e))?,
                count.parse::<u32>().map_err(|e| format!("line {}: count: {}", i + 1, e))?,
            )),
            _ => return Err(format!("line {}: expected `docid wordid count`", i + 1).into()),
        }
    }

    let documents = triples.into_iter()
        .sorted_by_key(|&(doc_id, _, _)| doc_id)
        .group_by(|&(doc_id, _, _)| doc_id)
        .into_iter()
        .map(|(doc_id, group)| {
            let (words, counts) = group
                .map(|(_, word, count)| (word, count))
                .sorted_by_key(|&(word, _)| word)
                .coalesce(|a, b| if a.0 == b.0 { Ok((a.0, a.1 + b.1)) } else { Err((a, b)) })
                .unzip();
            Document::new(doc_id, words, counts)
        })
        .collect();
    Ok(documents)
}

fn write_documents(output: Option<&Path>, documents: &[TopicDocument]) -> Result<(), Box<dyn Error>> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    for document in documents {
        serde_json::to_writer(&mut writer, document)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn is_json(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("json"))
}

pub fn save_model(path: &Path, model: &PersistedModel) -> Result<(), Box<dyn Error>> {
    let writer = BufWriter::new(File::create(path)?);
    if is_json(path) {
        serde_json::to_writer_pretty(writer, model)?;
    } else {
        bincode::serialize_into(writer, model)?;
    }
    Ok(())
}

pub fn load_model(path: &Path) -> Result<PersistedModel, Box<dyn Error>> {
    let reader = BufReader::new(File::open(path)?);
    let model = if is_json(path) {
        serde_json::from_reader(reader)?
    } else {
        bincode::deserialize_from(reader)?
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use ldars::Document;
    use super::parse_documents;

    #[test]
    fn test_parse_documents() {
        let input = "3 1 2\n\n1 0 1\n3 0 4\n1 2 1\n3 1 1\n";
        let documents = parse_documents(input.as_bytes()).unwrap();
        assert_eq!(documents, vec![
            Document::new(1, vec![0, 2], vec![1, 1]),
            Document::new(3, vec![0, 1], vec![4, 3]),
        ]);
    }

    #[test]
    fn test_parse_documents_errors() {
        assert!(parse_documents("1 2\n".as_bytes()).is_err());
        assert!(parse_documents("1 x 2\n".as_bytes()).is_err());
        assert!(parse_documents("1 2 -1\n".as_bytes()).is_err());
    }
}
