//! Lexicon files and training-pair loading.
//!
//! - [`tsv`]: reading and writing `word<TAB>pronunciation[<TAB>tag]` files
//! - [`loader`]: turning a lexicon into sampled training pairs

pub mod loader;
pub mod tsv;

pub use loader::{for_each_pair, load_pairs, prepare_pairs, GistFilter, LoadOptions, Pair};
pub use tsv::{
    open_input, open_output, read_tsv, read_tsv_path, validate_records, write_tsv, write_tsv_path,
    STDIO_PATH,
};
