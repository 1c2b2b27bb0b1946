mod sink;

pub use sink::{OutputFile, SharedOutput};
