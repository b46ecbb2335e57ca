#![forbid(unsafe_code)]
//! Adapters behind the `qcdeck-core` ports: document stores (in-memory,
//! local directory, HTTP), a TTL read-through query cache, and the
//! rusqlite executor for the columnar metrics table.

mod cache;
mod clock;
mod filtering;
mod http;
mod local;
mod memory;
mod metrics;

pub use cache::{QueryCache, TTL_ONE_HOUR_MS, TTL_ONE_MINUTE_MS, TTL_TWENTY_FOUR_HOURS_MS};
pub use clock::SystemClock;
pub use http::HttpDocStore;
pub use local::LocalDocStore;
pub use memory::MemoryDocStore;
pub use metrics::{fetch_metric_rows, MetricRow};

pub const CRATE_NAME: &str = "qcdeck-store";
