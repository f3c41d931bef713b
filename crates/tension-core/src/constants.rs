//! Schema identifiers and well-known names.

/// Schema tag written into the drift document `meta` block.
pub const DRIFT_SCHEMA: &str = "tension.drift/v1";

/// Schema tag written into the atom document `meta` block.
pub const ATOM_SCHEMA: &str = "tension.atoms/v1";

/// Schema tag written into the status document.
pub const STATUS_SCHEMA: &str = "tension.status/v1";

/// Version of the compiled-in tension rule table.
pub const RULE_TABLE_VERSION: &str = "tension-rules/v1";

/// Prefix of every atom id.
pub const ATOM_ID_PREFIX: &str = "atom-";

/// Prefix of every edge id.
pub const EDGE_ID_PREFIX: &str = "edge-";

/// Default project config file name.
pub const CONFIG_FILE_NAME: &str = "tension.toml";

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "TENSION_LOG";

/// Snapshot input files. `transitions.json` is optional.
pub const SNAPSHOT_GATES: &str = "gates.json";
pub const SNAPSHOT_METRICS: &str = "metrics.json";
pub const SNAPSHOT_OVERLAYS: &str = "overlays.json";
pub const SNAPSHOT_TRANSITIONS: &str = "transitions.json";

/// Artifact file names written by `derive` and `batch`.
pub const DRIFT_FILE: &str = "drift.json";
pub const ATOMS_FILE: &str = "atoms.json";
pub const EDGES_FILE: &str = "edges.ndjson";
pub const STATUS_FILE: &str = "status.json";
