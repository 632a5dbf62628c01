//! Observability for the room client.
//!
//! Metric labels are bounded:
//! - `status`: success, error
//! - `error_type`: bounded by [`crate::errors`] variants
//! - `kind`: bounded by `SignalKind` (11 values)
//! - `event`: bounded by outbound signals (3 values)
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `rc_discovery_total` | Counter | `status` | Discovery outcomes |
//! | `rc_discovery_failures_total` | Counter | `error_type` | Discovery failure causes |
//! | `rc_discovery_duration_seconds` | Histogram | none | Discovery latency |
//! | `rc_connect_attempts_total` | Counter | `status` | `connect()` outcomes |
//! | `rc_signals_received_total` | Counter | `kind` | Inbound signals dispatched |
//! | `rc_signals_sent_total` | Counter | `event` | Outbound signals queued |
//! | `rc_keepalive_pings_total` | Counter | none | Keepalive `PING` events sent |

pub mod metrics;
