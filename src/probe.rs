use std::fmt;

use tracing::{info, warn};

use loadwire::config::{load_config, to_client_config};
use loadwire::error::AppResult;
use loadwire::http::{ByteCounters, Outcome, build_client};

use crate::cli::ProbeArgs;

pub(crate) async fn run(args: ProbeArgs) -> AppResult<()> {
    let mut file = load_config(args.config.as_deref())?.unwrap_or_default();
    if let Some(url) = args.url {
        file.url = Some(url);
    }
    if let Some(transport) = args.transport {
        file.transport = Some(transport);
    }

    let config = to_client_config(&file)?;
    let client = build_client(&config)?;
    info!(
        "Probing {} {} with the {} transport ({} requests)",
        config.method,
        config.url,
        client.transport(),
        args.requests
    );

    let mut summary = Summary::default();
    for index in 1..=args.requests {
        let outcome = client.execute().await;
        match outcome.error.as_ref() {
            None => info!(
                "#{}: status {} in {}us",
                index, outcome.code, outcome.elapsed_micros
            ),
            Some(err) => warn!(
                "#{}: code {} after {}us: {}",
                index, outcome.code, outcome.elapsed_micros, err
            ),
        }
        summary.record(&outcome);
    }

    println!("{}", summary.with_counters(&config.counters));
    Ok(())
}

/// Running totals over the probe's outcomes.
#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    completed: u64,
    failed: u64,
    total_micros: u64,
}

impl Summary {
    /// A call counts as completed when a status code came back without an
    /// error.
    fn record(&mut self, outcome: &Outcome) {
        if outcome.code > 0 && outcome.error.is_none() {
            self.completed = self.completed.saturating_add(1);
        } else {
            self.failed = self.failed.saturating_add(1);
        }
        self.total_micros = self.total_micros.saturating_add(outcome.elapsed_micros);
    }

    fn mean_micros(&self) -> u64 {
        self.total_micros
            .checked_div(self.completed.saturating_add(self.failed))
            .unwrap_or(0)
    }

    const fn with_counters<'summary>(
        &'summary self,
        counters: &'summary ByteCounters,
    ) -> SummaryLine<'summary> {
        SummaryLine {
            summary: self,
            counters,
        }
    }
}

struct SummaryLine<'summary> {
    summary: &'summary Summary,
    counters: &'summary ByteCounters,
}

impl fmt::Display for SummaryLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "completed={} failed={} mean={}us read={}B written={}B",
            self.summary.completed,
            self.summary.failed,
            self.summary.mean_micros(),
            self.counters.read(),
            self.counters.written()
        )
    }
}
