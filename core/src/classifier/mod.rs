pub mod classify;
pub mod entry;

pub use classify::{classify, classify_line};
pub use entry::{Channel, ClassifiedLine, Severity};
