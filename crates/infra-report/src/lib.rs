// pybench Infrastructure - Report Adapters
// Implements: RunStore (JSON documents), HTML run pages and history index

mod escape;
mod html;
mod index;
mod json_store;
mod svg;

pub use html::render_run_html;
pub use index::render_index_html;
pub use json_store::JsonRunStore;
pub use svg::{BarChart, BarSeries};
