//! Parallel nonce search.
//!
//! The nonce space is striped across `workers` tasks on a dedicated rayon
//! pool: worker `w` tries `w, w + workers, w + 2 * workers, ...`. The first
//! worker to find a solution raises a shared flag and every other worker stops
//! at its next attempt. Callers can stop the search from outside through a
//! [`CancelToken`].
//!
//! When several nonces satisfy the target, the reported one is whichever a
//! worker reached first. It is not necessarily the lowest, so results may
//! differ from [`ProofOfWork::run`] and between runs.

use crate::config::PowConfig;
use crate::pow::{PowError, ProofOfWork, Result, Scan, Solution};
use labchain_core::{Blake3, BlockHeader, HashFunction};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// A shared cancellation signal for a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every worker observing this token to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Multi-threaded proof-of-work miner.
#[derive(Debug)]
pub struct ParallelMiner<H = Blake3> {
    config: PowConfig,
    pool: rayon::ThreadPool,
    _hasher: PhantomData<H>,
}

impl ParallelMiner<Blake3> {
    /// Create a Blake3 miner with `config.workers` threads.
    pub fn new(config: PowConfig) -> Result<Self> {
        Self::with_hasher(config)
    }
}

impl<H: HashFunction> ParallelMiner<H> {
    /// Create a miner using the hash function `H`.
    pub fn with_hasher(config: PowConfig) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("pow-worker-{i}"))
            .build()?;

        Ok(Self {
            config,
            pool,
            _hasher: PhantomData,
        })
    }

    pub fn config(&self) -> &PowConfig {
        &self.config
    }

    /// Search for a nonce sealing `header`.
    ///
    /// `attempts` in the returned solution counts hashes across all workers.
    pub fn mine(&self, header: &BlockHeader, cancel: &CancelToken) -> Result<Solution> {
        let pow = ProofOfWork::<H>::with_hasher(header, self.config.difficulty_bits)?;
        let workers = self.config.workers as u64;
        let max_nonce = self.config.max_nonce;

        debug!(
            difficulty_bits = self.config.difficulty_bits,
            max_nonce, workers, "mining header in parallel"
        );

        let found = AtomicBool::new(false);
        let attempts = AtomicU64::new(0);
        let winner: Mutex<Option<Solution>> = Mutex::new(None);

        self.pool.scope(|s| {
            for worker in 0..workers {
                let (pow, found, attempts, winner) = (&pow, &found, &attempts, &winner);
                s.spawn(move |_| {
                    let stop = || found.load(Ordering::Relaxed) || cancel.is_cancelled();
                    match pow.scan(worker, workers, max_nonce, stop) {
                        Scan::Found(solution) => {
                            attempts.fetch_add(solution.attempts, Ordering::Relaxed);
                            // Only the first finder reports.
                            if found
                                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                                .is_ok()
                            {
                                if let Ok(mut slot) = winner.lock() {
                                    *slot = Some(solution);
                                }
                            }
                        }
                        Scan::Exhausted { attempts: n } | Scan::Stopped { attempts: n } => {
                            attempts.fetch_add(n, Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        let total = attempts.load(Ordering::Relaxed);
        let winner = winner.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());

        match winner {
            Some(solution) => {
                let solution = Solution {
                    attempts: total,
                    ..solution
                };
                info!(
                    nonce = solution.nonce,
                    hash = %solution.hash,
                    attempts = total,
                    "header sealed"
                );
                Ok(solution)
            }
            None if cancel.is_cancelled() => {
                warn!(attempts = total, "mining cancelled");
                Err(PowError::Cancelled)
            }
            None => {
                warn!(max_nonce, attempts = total, "nonce space exhausted");
                Err(PowError::NonceExhausted { max_nonce })
            }
        }
    }

    /// Mine `header` and store the winning nonce in it.
    ///
    /// Reuses this miner's thread pool. On error the header is left untouched.
    pub fn seal(&self, header: &mut BlockHeader, cancel: &CancelToken) -> Result<Solution> {
        let solution = self.mine(header, cancel)?;
        header.nonce = solution.nonce;
        Ok(solution)
    }
}
