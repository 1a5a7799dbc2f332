// ── RED metrics (command-driven) ────────────────────────────────

/// Counter: total store commands. Labels: command, status.
pub const COMMANDS_TOTAL: &str = "rota_commands_total";

/// Histogram: command latency in seconds. Labels: command.
pub const COMMAND_DURATION_SECONDS: &str = "rota_command_duration_seconds";

/// Counter: commands rejected by the commit-time overlap re-check.
pub const OVERLAPS_REJECTED_TOTAL: &str = "rota_overlaps_rejected_total";

// ── USE metrics ─────────────────────────────────────────────────

/// Counter: snapshots served.
pub const SNAPSHOTS_TOTAL: &str = "rota_snapshots_total";

/// Gauge: current store version after the last successful commit.
pub const STORE_VERSION: &str = "rota_store_version";

// No exporter is bundled; the embedding process installs a recorder
// (e.g. a Prometheus exporter) if it wants these published.
