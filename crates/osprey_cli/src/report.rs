//! Rendering of fan-out reports for the terminal and for JSON export.

use serde::Serialize;

use osprey_exec::FanoutReport;

/// Flattened, serializable view of one strategy's run.
#[derive(Debug, Serialize)]
pub struct StrategySummary {
    pub strategy: String,
    pub elapsed_ms: f64,
    pub row_count: usize,
    pub partial: bool,
    pub failures: Vec<FailureSummary>,
    pub skipped_shards: Vec<u64>,
    pub per_shard: Vec<ShardSummary>,
}

#[derive(Debug, Serialize)]
pub struct FailureSummary {
    pub shard_id: u64,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ShardSummary {
    pub shard_id: u64,
    pub rows: usize,
    pub elapsed_ms: f64,
}

impl StrategySummary {
    pub fn from_report(report: &FanoutReport) -> Self {
        let per_shard = report
            .timing
            .per_shard
            .iter()
            .map(|(id, elapsed)| ShardSummary {
                shard_id: id.0,
                rows: report
                    .per_shard_rows
                    .iter()
                    .find(|(rid, _)| rid == id)
                    .map(|(_, n)| *n)
                    .unwrap_or(0),
                elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            })
            .collect();
        Self {
            strategy: report.strategy.to_string(),
            elapsed_ms: report.timing.total.as_secs_f64() * 1000.0,
            row_count: report.row_count(),
            partial: report.is_partial(),
            failures: report
                .failures
                .iter()
                .map(|f| FailureSummary {
                    shard_id: f.shard_id.0,
                    kind: f.cause.kind_name().to_string(),
                    message: f.cause.to_string(),
                })
                .collect(),
            skipped_shards: report.skipped.iter().map(|s| s.0).collect(),
            per_shard,
        }
    }

    pub fn print_text(&self, per_shard: bool) {
        println!("== {} ==", self.strategy);
        if per_shard {
            for shard in &self.per_shard {
                println!(
                    "  shard:{}  {} rows  {:.3} ms",
                    shard.shard_id, shard.rows, shard.elapsed_ms
                );
            }
        }
        println!("Fanout query complete - record count: {}", self.row_count);
        println!("Elapsed: {:.3} ms", self.elapsed_ms);
        if self.failures.is_empty() && self.skipped_shards.is_empty() {
            println!("shard failures: none");
        } else {
            for failure in &self.failures {
                println!(
                    "shard failure: shard:{} [{}] {}",
                    failure.shard_id, failure.kind, failure.message
                );
            }
            if !self.skipped_shards.is_empty() {
                let skipped: Vec<String> = self
                    .skipped_shards
                    .iter()
                    .map(|s| format!("shard:{}", s))
                    .collect();
                println!("never attempted: {}", skipped.join(", "));
            }
        }
        println!();
    }
}
