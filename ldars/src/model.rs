use std::thread::available_parallelism;
use rand::prelude::*;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};
use tracing::{debug, info};
use crate::callback::{Callback, MonitoringCallback};
use crate::data::{Document, TopicDocument};
use crate::error::{LdaError, LdaResult};
use crate::params::{FitOptions, ModelOptions, ModelParams, TopicCounts};
use crate::state::{GlobalState, GlobalWorker, LocalState, LocalWorker, ShardedState};
use crate::stats::{PerplexityStats, SampleMode};

/// Trained model in its exchange form: hyperparameters and the flat count array.
///
/// `model` is the row-major `(voc_size + 1) x topic_num` matrix of word-topic counts, the last row
/// holding the per-topic totals.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedModel {
    pub voc_size: usize,
    pub topic_num: usize,
    pub alpha: f64,
    pub beta: f64,
    pub iter_num: usize,
    pub model: Vec<i64>,
}

impl PersistedModel {
    pub fn options(&self) -> ModelOptions {
        ModelOptions::new(self.voc_size, self.topic_num, self.alpha, self.beta)
    }
}

/// Latent Dirichlet Allocation fitted with approximate distributed collapsed Gibbs sampling
/// (AD-LDA) as described in [1].
///
/// Every iteration each partition of the corpus resamples its tokens against a private copy of
/// the model of the previous iteration, after which the word-topic counts of all partitions are
/// merged into the next model.
///
/// [1] D. Newman, A. Asuncion, P. Smyth and M. Welling, "Distributed Algorithms for Topic Models,"
/// Journal of Machine Learning Research, vol. 10, 2009.
///
/// # Example:
/// ```
/// use ldars::{Document, FitOptions, Model, ModelOptions, MonitoringCallback};
/// use ldars::params::ModelParams;
/// use ldars::state::GlobalState;
///
/// let documents = vec![
///     Document::new(0, vec![0, 1], vec![2, 1]),
///     Document::new(1, vec![1, 2], vec![1, 3]),
/// ];
///
/// let mut model = Model::from_options(ModelOptions::new(3, 2, 0.1, 0.1));
/// let fit_options = FitOptions { iters: 10, ..FitOptions::default() };
/// let outputs = model.fit(documents, &fit_options, None::<MonitoringCallback<GlobalState>>).unwrap();
///
/// assert_eq!(outputs.len(), 2);
/// assert_eq!(model.params().unwrap().n_tokens(), 7);
/// ```
pub struct Model {
    global: Option<GlobalState>,
    model_options: ModelOptions,
    perplexity_history: Vec<(usize, f64)>,
}

impl Model {
    /// Create a new model from a set of model options.
    pub fn from_options(model_options: ModelOptions) -> Self {
        Self {
            global: None,
            model_options,
            perplexity_history: Vec::new(),
        }
    }

    /// Restore a trained model.
    pub fn from_persisted(persisted: PersistedModel) -> LdaResult<Self> {
        let model_options = persisted.options();
        model_options.validate()?;
        let counts = TopicCounts::from_flat(persisted.voc_size, persisted.topic_num, persisted.model)?;
        let global = GlobalState::from_model(model_options.clone(), counts, persisted.iter_num)?;
        Ok(Self {
            global: Some(global),
            model_options,
            perplexity_history: Vec::new(),
        })
    }

    /// Export the trained model.
    pub fn to_persisted(&self) -> LdaResult<PersistedModel> {
        let global = self.params()?;
        Ok(PersistedModel {
            voc_size: self.model_options.voc_size,
            topic_num: self.model_options.topic_num,
            alpha: self.model_options.alpha,
            beta: self.model_options.beta,
            iter_num: global.iteration(),
            model: global.model().as_flat().to_vec(),
        })
    }

    pub fn options(&self) -> &ModelOptions {
        &self.model_options
    }

    /// Check whether the model is already fitted.
    pub fn is_fitted(&self) -> bool {
        self.global.is_some()
    }

    /// The fitted model.
    pub fn params(&self) -> LdaResult<&GlobalState> {
        self.global.as_ref().ok_or(LdaError::NotFitted)
    }

    /// Training perplexity per evaluated iteration of the last fit.
    pub fn perplexity_history(&self) -> &[(usize, f64)] {
        &self.perplexity_history
    }

    /// Fit the model to the documents.
    ///
    /// # Arguments
    ///
    /// * `documents`: The corpus, every word id in `[0, voc_size)`.
    /// * `fit_options`: Options for the fitting procedure.
    /// * `callback`: Callback function to monitor the fitting procedure.
    ///
    /// # Returns
    ///
    /// Every document with its final topic state, in input order.
    pub fn fit(
        &mut self,
        documents: Vec<Document>,
        fit_options: &FitOptions,
        callback: Option<impl Callback<GlobalState>>,
    ) -> LdaResult<Vec<TopicDocument>> {
        self.model_options.validate()?;
        fit_options.validate()?;
        for doc in &documents {
            doc.validate(self.model_options.voc_size)?;
        }

        let mut rng = SmallRng::seed_from_u64(fit_options.seed);
        match resolve_workers(fit_options.workers) {
            1 => {
                let mut local = LocalState::from_documents(documents);
                local.init(self.model_options.topic_num, &mut rng);

                self.fit_worker(&mut local, fit_options, callback)?;
                Ok(local.into_documents())
            },
            workers => {
                let mut local = ShardedState::from_documents(documents, workers);
                local.init(self.model_options.topic_num, &mut rng);

                self.fit_worker(&mut local, fit_options, callback)?;
                Ok(local.into_documents())
            }
        }
    }

    /// Fit the model using the data workers.
    ///
    /// The model of the last completed iteration is kept when an iteration fails.
    ///
    /// # Arguments
    ///
    /// * `local`: The data workers, already initialized.
    /// * `fit_options`: Options for the fitting procedure.
    /// * `callback`: Callback function to monitor the fitting procedure.
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::SeedableRng;
    /// use rand::rngs::SmallRng;
    /// use ldars::{Document, FitOptions, Model, ModelOptions, MonitoringCallback};
    /// use ldars::state::{GlobalState, LocalWorker, ShardedState};
    ///
    /// let documents = (0..8)
    ///     .map(|i| Document::new(i, vec![i as usize % 3, 3], vec![2, 1]))
    ///     .collect();
    ///
    /// let mut model = Model::from_options(ModelOptions::new(4, 2, 0.5, 0.1));
    /// let fit_options = FitOptions { iters: 5, ..FitOptions::default() };
    /// let mut local = ShardedState::from_documents(documents, 4);
    /// local.init(2, &mut SmallRng::seed_from_u64(fit_options.seed));
    ///
    /// model.fit_worker(
    ///     &mut local,
    ///     &fit_options,
    ///     Some(MonitoringCallback::<GlobalState>::new()),
    /// ).unwrap();
    /// assert!(model.is_fitted());
    /// ```
    pub fn fit_worker<L: LocalWorker>(
        &mut self,
        local: &mut L,
        fit_options: &FitOptions,
        mut callback: Option<impl Callback<GlobalState>>,
    ) -> LdaResult<()> {
        let mut rng = SmallRng::seed_from_u64(fit_options.seed);

        // Initial model from the random assignment
        let stats = local.collect_topic_stats(&self.model_options)?;
        self.global = Some(GlobalState::from_stats(self.model_options.clone(), stats));
        self.perplexity_history.clear();
        let global = self.global.as_mut().ok_or(LdaError::NotFitted)?;
        info!(
            n_documents = local.n_documents(),
            n_tokens = local.n_tokens(),
            topic_num = self.model_options.topic_num,
            "initialized model"
        );

        let mut last_perplexity = None;
        for i in 0..fit_options.iters {
            // Before step callback
            if let Some(callback) = &mut callback {
                callback.before_step(i);
            }

            // Resample every partition against the model of the previous iteration
            local.apply_sweep(&*global, 1, SampleMode::Train, &mut rng)?;

            // Merge the partition counts into the next model
            let stats = local.collect_topic_stats(&self.model_options)?;
            global.update_model(stats)?;
            debug!(iteration = i, n_tokens = global.n_tokens(), "merged model");

            if let Some(callback) = &mut callback {
                callback.during_step(i, global);
            }

            let mut converged = false;
            if fit_options.evaluate_every > 0 && (i + 1) % fit_options.evaluate_every == 0 {
                let perplexity = local.collect_perplexity_stats(&*global)?.finalize()?;
                self.perplexity_history.push((i, perplexity));
                info!(iteration = i, perplexity, "evaluated training perplexity");
                if let Some(callback) = &mut callback {
                    callback.after_evaluation(i, perplexity);
                }

                if let Some(last) = last_perplexity {
                    let change = relative_change(last, perplexity);
                    converged = fit_options.perplexity_tol > 0.0 && change < fit_options.perplexity_tol;
                }
                last_perplexity = Some(perplexity);
            }

            // After step callback
            if let Some(callback) = &mut callback {
                callback.after_step(i);
            }

            if converged {
                info!(iteration = i, "perplexity converged, stopping early");
                break;
            }
        }

        Ok(())
    }

    /// Infer the topics of unseen documents, keeping the model fixed.
    ///
    /// Every document starts from a random assignment and is resampled
    /// `fit_options.predict_sweeps` times against the fitted counts.
    ///
    /// # Arguments
    ///
    /// * `documents`: The documents to infer topics for.
    /// * `fit_options`: Seed, worker count and number of sweeps.
    ///
    /// # Examples
    ///
    /// ```
    /// use ldars::{Document, FitOptions, Model, ModelOptions, MonitoringCallback};
    /// use ldars::state::GlobalState;
    ///
    /// let documents = vec![
    ///     Document::new(0, vec![0, 1], vec![2, 1]),
    ///     Document::new(1, vec![1, 2], vec![1, 3]),
    /// ];
    ///
    /// let mut model = Model::from_options(ModelOptions::new(3, 2, 0.1, 0.1));
    /// let fit_options = FitOptions { iters: 10, ..FitOptions::default() };
    /// model.fit(documents, &fit_options, None::<MonitoringCallback<GlobalState>>).unwrap();
    ///
    /// let outputs = model.predict(vec![Document::new(7, vec![2], vec![4])], &fit_options).unwrap();
    /// assert_eq!(outputs[0].doc_topic.topic_count.iter().sum::<i64>(), 4);
    /// ```
    pub fn predict(
        &self,
        documents: Vec<Document>,
        fit_options: &FitOptions,
    ) -> LdaResult<Vec<TopicDocument>> {
        let global = self.params()?;
        fit_options.validate()?;
        for doc in &documents {
            doc.validate(self.model_options.voc_size)?;
        }

        let mut rng = SmallRng::seed_from_u64(fit_options.seed);
        match resolve_workers(fit_options.workers) {
            1 => {
                let local = LocalState::from_documents(documents);
                predict_worker(local, global, fit_options.predict_sweeps, &mut rng)
            },
            workers => {
                let local = ShardedState::from_documents(documents, workers);
                predict_worker(local, global, fit_options.predict_sweeps, &mut rng)
            }
        }
    }

    /// Perplexity of documents with their topic assignments under the fitted model,
    /// `exp(-log_likelihood / n_tokens)`.
    pub fn perplexity(&self, documents: &[TopicDocument]) -> LdaResult<f64> {
        let global = self.params()?;
        let stats = documents.par_iter()
            .try_fold(PerplexityStats::default, |mut stats, doc| {
                stats.accumulate(&doc.document, &doc.doc_topic, global.model(), global.options())?;
                Ok::<_, LdaError>(stats)
            })
            .try_reduce(PerplexityStats::default, |a, b| Ok(a + &b))?;
        stats.finalize()
    }
}

fn predict_worker<L: LocalWorker>(
    mut local: L,
    global: &GlobalState,
    sweeps: usize,
    rng: &mut SmallRng,
) -> LdaResult<Vec<TopicDocument>> {
    local.init(global.topic_num(), rng);
    local.apply_sweep(global, sweeps, SampleMode::Frozen, rng)?;
    Ok(local.into_documents())
}

/// Number of partitions for a worker setting, non-positive values meaning one per CPU.
fn resolve_workers(workers: i32) -> usize {
    match workers {
        0 | 1 => 1,
        w if w < 0 => available_parallelism().map(|n| n.get()).unwrap_or(1),
        w => w as usize,
    }
}

fn relative_change(last: f64, current: f64) -> f64 {
    (last - current).abs() / last.abs().max(f64::MIN_POSITIVE)
}

/// Trains a model on `documents` and returns it with the final topic state of every document.
///
/// Runs single-threaded with the default seed.
///
/// # Example:
/// ```
/// use ldars::{train, Document};
///
/// let documents = vec![
///     Document::new(0, vec![0, 1], vec![2, 1]),
///     Document::new(1, vec![1, 2], vec![1, 3]),
/// ];
/// let (model, outputs) = train(documents, 3, 2, 1, 0.1, 0.1).unwrap();
///
/// assert_eq!(model.model.len(), 8);
/// assert_eq!(model.model[6] + model.model[7], 7);
/// assert_eq!(outputs[1].word_count, 4);
/// ```
pub fn train(
    documents: Vec<Document>,
    voc_size: usize,
    topic_num: usize,
    iter_num: usize,
    alpha: f64,
    beta: f64,
) -> LdaResult<(PersistedModel, Vec<TopicDocument>)> {
    let fit_options = FitOptions { iters: iter_num, ..FitOptions::default() };
    let mut model = Model::from_options(ModelOptions::new(voc_size, topic_num, alpha, beta));
    let outputs = model.fit(documents, &fit_options, None::<MonitoringCallback<GlobalState>>)?;
    Ok((model.to_persisted()?, outputs))
}

/// Infers topics for `documents` with `iter_num` resampling passes against a fixed model.
pub fn predict(
    documents: Vec<Document>,
    model: &PersistedModel,
    iter_num: usize,
) -> LdaResult<Vec<TopicDocument>> {
    let fit_options = FitOptions { predict_sweeps: iter_num, ..FitOptions::default() };
    Model::from_persisted(model.clone())?.predict(documents, &fit_options)
}

/// Perplexity of `documents` with their topic assignments under `model`.
pub fn perplexity(model: &PersistedModel, documents: &[TopicDocument]) -> LdaResult<f64> {
    Model::from_persisted(model.clone())?.perplexity(documents)
}
