//! Important error walkthrough
//!
//! Shows which operations count as observing an important error, races
//! several threads to reveal one error, and reports what was left unseen.
//! See `config.rs` for the environment variables.

mod config;

use std::error::Error;
use std::process::ExitCode;
use std::sync::{Arc, Barrier};
use std::thread;

use important::{chain, Baseline, ImportantError};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use config::{DemoConfig, ENV_LOG};

#[derive(Debug, PartialEq, thiserror::Error)]
enum StreamError {
    #[error("forget me not")]
    ForgetMeNot,
}

#[derive(Debug, thiserror::Error)]
enum ReadError {
    /// Keeps only the message, the chain ends here.
    #[error("read failed: {0}")]
    Flat(String),
    /// Keeps the important error as its source.
    #[error("read failed")]
    Wrapped(#[source] ImportantError),
}

struct Step {
    label: &'static str,
    observes: bool,
    run: fn(ImportantError),
}

const STEPS: &[Step] = &[
    Step {
        label: "Display ({})",
        observes: false,
        run: |err| {
            let _ = err.to_string();
        },
    },
    Step {
        label: "Debug ({:?})",
        observes: false,
        run: |err| {
            let _ = format!("{:?}", err);
        },
    },
    Step {
        label: "Error::source",
        observes: true,
        run: |err| {
            let _ = err.source();
        },
    },
    Step {
        label: "chain::is",
        observes: true,
        run: |err| {
            chain::is(&err, &StreamError::ForgetMeNot);
        },
    },
    Step {
        label: "chain::find",
        observes: true,
        run: |err| {
            chain::find::<StreamError>(&err);
        },
    },
    Step {
        label: "re-wrapped as message, then unwrapped twice",
        observes: false,
        run: |err| {
            let outer = ReadError::Flat(err.to_string());
            chain::unwrap_one(&outer).and_then(chain::unwrap_one);
        },
    },
    Step {
        label: "re-wrapped as source, then unwrapped twice",
        observes: true,
        run: |err| {
            let outer = ReadError::Wrapped(err);
            chain::unwrap_one(&outer).and_then(chain::unwrap_one);
        },
    },
    Step {
        label: "re-wrapped as source, then important::unwrap",
        observes: true,
        run: |err| {
            let outer = ReadError::Wrapped(err);
            important::unwrap(&outer);
        },
    },
];

fn init_logging() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}

/// Run every step on a fresh error. Returns how many behaved unexpectedly.
fn walkthrough() -> usize {
    let mut surprises = 0;
    for step in STEPS {
        let (err, seen) = important::error_seen(StreamError::ForgetMeNot);
        (step.run)(err);

        let observed = seen.get();
        println!(
            "  {:<48} {}",
            step.label,
            if observed { "observed" } else { "not observed" }
        );
        if observed != step.observes {
            warn!(step = step.label, observed, "unexpected observation state");
            surprises += 1;
        }
    }
    surprises
}

/// What the reveal threads handed back.
#[derive(Debug, Default, PartialEq, Eq)]
struct RaceTally {
    joined: usize,
    panicked: usize,
    identical: bool,
}

impl RaceTally {
    fn from_results(results: Vec<thread::Result<Option<usize>>>) -> Self {
        let mut tally = Self { identical: true, ..Self::default() };
        let mut first = None;
        for result in results {
            match result {
                Ok(cause) => {
                    tally.joined += 1;
                    match first {
                        None => first = Some(cause),
                        Some(prev) => tally.identical &= prev == cause,
                    }
                }
                Err(_) => tally.panicked += 1,
            }
        }
        tally
    }
}

/// Reveal one error from `threads` threads released together. Returns the
/// number of decrements (must be exactly one) and the thread tally.
fn race(threads: usize) -> (i64, RaceTally) {
    let baseline = Baseline::new();
    let (err, seen) = important::error_seen(StreamError::ForgetMeNot);
    let err = Arc::new(err);
    let start = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let err = Arc::clone(&err);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                err.reveal()
                    .map(|c| c as *const (dyn Error + Send + Sync) as *const () as usize)
            })
        })
        .collect();

    let tally = RaceTally::from_results(handles.into_iter().map(|h| h.join()).collect());
    let decrements = 1 - baseline.delta();

    debug!(threads, ?tally, "reveal race finished");
    println!(
        "  {} threads revealed one error: seen={} joined={} panicked={} same cause={} decrements={}",
        threads,
        seen.get(),
        tally.joined,
        tally.panicked,
        tally.identical,
        decrements
    );
    (decrements, tally)
}

fn main() -> ExitCode {
    init_logging();
    let config = DemoConfig::from_env();
    info!(?config, "starting");

    println!("=== Observation rules ===");
    let walk = Baseline::new();
    let mut surprises = walkthrough();
    // Steps that do not observe leave their error unseen on purpose.
    let left_on_purpose = walk.delta();

    let baseline = Baseline::new();

    println!("\n=== Concurrent reveal ===");
    let (decrements, tally) = race(config.threads);
    surprises += tally.panicked + usize::from(!tally.identical);

    if config.leak {
        drop(important::error(StreamError::ForgetMeNot));
        println!("\n  dropped one important error without looking at it");
    }

    let delta = baseline.delta();
    println!("\n=== Unseen ===");
    println!(
        "  total={} walkthrough={} since walkthrough={}",
        important::unseen(),
        left_on_purpose,
        delta
    );

    if surprises != 0 || decrements != 1 || delta != 0 {
        warn!(surprises, decrements, delta, "important errors were mishandled");
        if config.strict {
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
