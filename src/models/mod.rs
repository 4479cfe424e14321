pub mod process;
pub mod sample;

pub use process::{DisplayEntry, DisplayEntryError, ProcessRecord};
pub use sample::{Sample, Series, SeriesView, Usage, ViewConfig};
