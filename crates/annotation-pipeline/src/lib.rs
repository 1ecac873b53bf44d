//! Concurrent annotation pipeline: fan messages out to the completion API,
//! then parse the answers into issuer-level sentiment records.

pub mod batch;
pub mod dispatcher;
pub mod export;
pub mod input;
pub mod scoring;
pub mod sink;

pub use batch::{write_records, BatchStats};
pub use dispatcher::{Dispatcher, DEFAULT_MAX_IN_FLIGHT};
pub use export::{group_by_message, read_records, save_grouped_json, MessageScores};
pub use input::{dedup_messages, load_messages};
pub use scoring::team_score;
pub use sink::{RecordSink, FLUSH_INTERVAL};
