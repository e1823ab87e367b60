mod finder;
mod scorer;

pub use finder::find_candidates;
pub use scorer::{rank, score};
