pub mod directory;
pub mod error;
pub mod parser;
pub mod types;

pub use directory::{
    load_reference_table, normalize_name, read_reference_table, DirectoryEntry, DirectoryIndex,
    DirectoryLayout,
};
pub use error::*;
pub use parser::{parse_line, LineError, Mention, ResponseParser, SCORE_MARKER};
pub use types::*;
