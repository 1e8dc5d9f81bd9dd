//! Bounded-concurrency scan execution.
//!
//! Every point is serialized up front, then a dedicated rayon pool of
//! `min(workers, points)` threads drains the job list. Workers claim the next
//! slot with an atomic counter and write the outcome into a write-once cell at
//! that slot, so results come back in grid order whatever the completion order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use chrono::Utc;
use once_cell::sync::OnceCell;

use crate::domain::{Dataset, ParameterSet, ScanAxis, ScanPoint, ScanReport, ScanResult};
use crate::engine::{Engine, parse_likelihood};
use crate::error::ScanError;
use crate::input::{InputDocument, couplings_document};
use crate::scan::grid;
use crate::stats::chi_square_p_value;
use crate::validate;

pub const DEFAULT_WORKERS: usize = 10;

struct Job {
    point: ScanPoint,
    document: InputDocument,
}

pub struct ScanExecutor<E> {
    engine: E,
    workers: usize,
}

impl<E: Engine> ScanExecutor<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Result<Self, ScanError> {
        self.workers = validate::validate_workers(workers)?;
        Ok(self)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn scan_1d(
        &self,
        fixed: &ParameterSet,
        axis: ScanAxis,
        dataset: Dataset,
    ) -> Result<ScanReport, ScanError> {
        self.scan(fixed, &[axis], dataset)
    }

    pub fn scan_2d(
        &self,
        fixed: &ParameterSet,
        x: ScanAxis,
        y: ScanAxis,
        dataset: Dataset,
    ) -> Result<ScanReport, ScanError> {
        self.scan(fixed, &[x, y], dataset)
    }

    /// Scan one or two axes over `fixed`.
    ///
    /// Fails before any engine call if an axis or a point is invalid. Points
    /// whose engine run fails are kept with an absent likelihood; the scan
    /// only fails if every point does.
    pub fn scan(
        &self,
        fixed: &ParameterSet,
        axes: &[ScanAxis],
        dataset: Dataset,
    ) -> Result<ScanReport, ScanError> {
        let points = grid::expand(fixed, axes)?;
        let jobs = points
            .into_iter()
            .map(|point| {
                let document = couplings_document(&point.parameters)?;
                Ok(Job { point, document })
            })
            .collect::<Result<Vec<_>, ScanError>>()?;

        let total = jobs.len();
        let axis_names: Vec<&str> = axes.iter().map(|a| a.name.as_str()).collect();
        log::info!(
            "scanning {} over {total} points on dataset {} ({} workers)",
            axis_names.join(" x "),
            dataset.as_str(),
            self.workers.min(total)
        );
        let started = Instant::now();

        let likelihoods = self.run(&jobs, dataset)?;
        let failed = likelihoods.iter().filter(|l| l.is_none()).count();
        if failed == total {
            return Err(ScanError::AllPointsFailed { points: total });
        }

        let ndf = axes.len();
        let (minimum, results) = annotate(&jobs, likelihoods, ndf);
        let best = results
            .iter()
            .find(|r| r.likelihood == Some(minimum))
            .map(|r| r.coordinates.clone())
            .unwrap_or_default();

        log::info!(
            "scan finished in {:.1}s: {} of {total} points ok, minimum -2logL = {minimum} at {best:?}",
            started.elapsed().as_secs_f64(),
            total - failed,
        );

        Ok(ScanReport {
            generated_at: Utc::now(),
            dataset,
            axes: axes.to_vec(),
            ndf,
            minimum,
            best,
            failed,
            results,
        })
    }

    /// Evaluate every job and return likelihoods in job order.
    fn run(&self, jobs: &[Job], dataset: Dataset) -> Result<Vec<Option<f64>>, ScanError> {
        let threads = self.workers.min(jobs.len()).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("hscan-worker-{i}"))
            .build()
            .map_err(|e| ScanError::WorkerPool(e.to_string()))?;

        let next = AtomicUsize::new(0);
        let slots: Vec<OnceCell<Option<f64>>> = (0..jobs.len()).map(|_| OnceCell::new()).collect();

        pool.scope(|scope| {
            for _ in 0..threads {
                scope.spawn(|_| {
                    loop {
                        let slot = next.fetch_add(1, Ordering::Relaxed);
                        let Some(job) = jobs.get(slot) else { break };
                        let outcome = self
                            .engine
                            .evaluate(&job.document, dataset)
                            .and_then(|output| parse_likelihood(&output));
                        let likelihood = match outcome {
                            Ok(value) => {
                                log::debug!("point {:?} -> {value}", job.point.coordinates);
                                Some(value)
                            }
                            Err(err) => {
                                log::warn!("point {:?} failed: {err}", job.point.coordinates);
                                None
                            }
                        };
                        let _ = slots[slot].set(likelihood);
                    }
                });
            }
        });

        Ok(slots.into_iter().map(|cell| cell.into_inner().flatten()).collect())
    }
}

/// Attach `delta` and `p_value` to every present likelihood.
fn annotate(jobs: &[Job], likelihoods: Vec<Option<f64>>, ndf: usize) -> (f64, Vec<ScanResult>) {
    let minimum = likelihoods
        .iter()
        .flatten()
        .copied()
        .fold(f64::INFINITY, f64::min);

    let results = jobs
        .iter()
        .zip(likelihoods)
        .map(|(job, likelihood)| {
            let delta = likelihood.map(|l| l - minimum);
            ScanResult {
                index: job.point.index.clone(),
                coordinates: job.point.coordinates.clone(),
                likelihood,
                delta,
                p_value: delta.map(|d| chi_square_p_value(d, ndf as f64)),
            }
        })
        .collect();
    (minimum, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParameterName;
    use crate::error::EngineError;
    use rand::Rng;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Value of `<C to="{to}">` in a coupling document.
    fn coupling(doc: &InputDocument, to: &str) -> f64 {
        let open = format!("<C to=\"{to}\">");
        let text = doc.as_str();
        let start = text.find(&open).unwrap() + open.len();
        let end = text[start..].find("</C>").unwrap() + start;
        text[start..end].parse().unwrap()
    }

    /// Parabola in CV and CF with its minimum at (1.0, 0.9).
    fn parabola(doc: &InputDocument) -> f64 {
        let cv = coupling(doc, "ZZ");
        let cf = coupling(doc, "tt");
        50.0 + 100.0 * (cv - 1.0).powi(2) + 40.0 * (cf - 0.9).powi(2)
    }

    struct Parabola;

    impl Engine for Parabola {
        fn evaluate(&self, doc: &InputDocument, _: Dataset) -> Result<String, EngineError> {
            Ok(format!("Ndof = 10\n-2log(likelihood) = {}\n", parabola(doc)))
        }
    }

    fn cv_axis(min: f64, max: f64, steps: usize) -> ScanAxis {
        ScanAxis {
            name: ParameterName::Cv,
            min,
            max,
            steps,
        }
    }

    #[test]
    fn one_dimensional_scan_is_ordered_with_one_zero_delta() {
        let executor = ScanExecutor::new(Parabola);
        let report = executor
            .scan_1d(&ParameterSet::new(), cv_axis(0.8, 1.2, 5), Dataset::Latest)
            .unwrap();

        assert_eq!(report.results.len(), 5);
        let xs: Vec<f64> = report.results.iter().map(|r| r.coordinates[0]).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]), "{xs:?}");

        let deltas: Vec<f64> = report.results.iter().map(|r| r.delta.unwrap()).collect();
        assert!(deltas.iter().all(|&d| d >= 0.0));
        assert_eq!(deltas.iter().filter(|&&d| d == 0.0).count(), 1);
        assert_eq!(report.results[2].delta, Some(0.0));
        assert_eq!(report.best.len(), 1);
        assert!((report.best[0] - 1.0).abs() < 1e-12);
        assert_eq!(report.ndf, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.results[2].p_value, Some(1.0));
    }

    #[test]
    fn two_dimensional_scan_finds_the_minimum() {
        let executor = ScanExecutor::new(Parabola).with_workers(4).unwrap();
        let report = executor
            .scan_2d(
                &ParameterSet::new(),
                cv_axis(0.9, 1.1, 3),
                ScanAxis {
                    name: ParameterName::Cf,
                    min: 0.7,
                    max: 1.1,
                    steps: 3,
                },
                Dataset::Run2,
            )
            .unwrap();

        assert_eq!(report.results.len(), 9);
        assert_eq!(report.ndf, 2);
        assert_eq!(report.results[4].index, vec![1, 1]);
        assert_eq!(report.results[4].delta, Some(0.0));
        assert_eq!(report.minimum, 50.0);
    }

    /// Tracks how many evaluations overlap in time.
    struct Gauge {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl Engine for Gauge {
        fn evaluate(&self, doc: &InputDocument, _: Dataset) -> Result<String, EngineError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(format!("-2log(likelihood) = {}", parabola(doc)))
        }
    }

    #[test]
    fn worker_cap_bounds_in_flight_points() {
        let gauge = Gauge {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        };
        let executor = ScanExecutor::new(&gauge).with_workers(2).unwrap();
        let report = executor
            .scan_1d(&ParameterSet::new(), cv_axis(0.5, 1.5, 6), Dataset::Latest)
            .unwrap();

        assert_eq!(report.results.len(), 6);
        assert_eq!(gauge.calls.load(Ordering::SeqCst), 6);
        let peak = gauge.peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "peak in flight {peak}");
    }

    struct Failing;

    impl Engine for Failing {
        fn evaluate(&self, _: &InputDocument, _: Dataset) -> Result<String, EngineError> {
            Err(EngineError::Timeout { seconds: 1.0 })
        }
    }

    #[test]
    fn all_points_failing_is_an_error() {
        let executor = ScanExecutor::new(Failing);
        let err = executor
            .scan_1d(&ParameterSet::new(), cv_axis(0.8, 1.2, 4), Dataset::Latest)
            .unwrap_err();
        assert_eq!(err, ScanError::AllPointsFailed { points: 4 });
    }

    /// Fails every point above CV = 1.0 and reports garbage for CV = 0.8.
    struct Patchy;

    impl Engine for Patchy {
        fn evaluate(&self, doc: &InputDocument, _: Dataset) -> Result<String, EngineError> {
            let cv = coupling(doc, "ZZ");
            if cv > 1.0 + 1e-9 {
                Err(EngineError::ExitStatus {
                    status: "exit status: 1".to_string(),
                })
            } else if (cv - 0.8).abs() < 1e-9 {
                Ok("no likelihood today".to_string())
            } else {
                Ok(format!("-2log(likelihood) = {}", parabola(doc)))
            }
        }
    }

    #[test]
    fn failed_points_keep_their_slot() {
        let executor = ScanExecutor::new(Patchy);
        let report = executor
            .scan_1d(&ParameterSet::new(), cv_axis(0.8, 1.2, 5), Dataset::Latest)
            .unwrap();

        let present: Vec<bool> = report.results.iter().map(|r| r.likelihood.is_some()).collect();
        assert_eq!(present, vec![false, true, true, false, false]);
        assert_eq!(report.failed, 3);
        assert!(report.results[0].delta.is_none());
        assert!(report.results[0].p_value.is_none());
        assert_eq!(report.results[2].delta, Some(0.0));
        assert!(report.results[1].delta.unwrap() > 0.0);
    }

    /// Sleeps a random few milliseconds so completion order is shuffled.
    struct Jittery {
        completed: Mutex<Vec<f64>>,
    }

    impl Engine for Jittery {
        fn evaluate(&self, doc: &InputDocument, _: Dataset) -> Result<String, EngineError> {
            let pause = rand::thread_rng().gen_range(0..8u64);
            std::thread::sleep(Duration::from_millis(pause));
            let cv = coupling(doc, "ZZ");
            self.completed.lock().unwrap().push(cv);
            Ok(format!("-2log(likelihood) = {}", 1000.0 * cv))
        }
    }

    #[test]
    fn results_follow_grid_order_not_completion_order() {
        let engine = Jittery {
            completed: Mutex::new(Vec::new()),
        };
        let executor = ScanExecutor::new(&engine).with_workers(8).unwrap();
        let report = executor
            .scan_1d(&ParameterSet::new(), cv_axis(0.0, 2.0, 41), Dataset::Latest)
            .unwrap();

        assert_eq!(engine.completed.lock().unwrap().len(), 41);
        for (i, r) in report.results.iter().enumerate() {
            assert_eq!(r.index, vec![i]);
            let l = r.likelihood.unwrap();
            assert!((l - 1000.0 * r.coordinates[0]).abs() < 1e-6, "slot {i}");
        }
    }

    struct Unreachable;

    impl Engine for Unreachable {
        fn evaluate(&self, _: &InputDocument, _: Dataset) -> Result<String, EngineError> {
            panic!("engine must not be called");
        }
    }

    #[test]
    fn invalid_axis_fails_before_any_engine_call() {
        let executor = ScanExecutor::new(Unreachable);
        let err = executor
            .scan_1d(&ParameterSet::new(), cv_axis(1.2, 0.8, 5), Dataset::Latest)
            .unwrap_err();
        assert!(matches!(err, ScanError::Validation(_)));
    }

    #[test]
    fn worker_count_is_validated() {
        assert!(ScanExecutor::new(Parabola).with_workers(0).is_err());
        assert!(ScanExecutor::new(Parabola).with_workers(65).is_err());
        assert_eq!(ScanExecutor::new(Parabola).workers(), DEFAULT_WORKERS);
    }
}
