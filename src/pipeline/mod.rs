mod area;
mod batch;
mod layout;

pub use area::{process_area, AreaSummary};
pub use batch::{read_area_names, run_batch, BatchState};
pub use layout::Layout;
