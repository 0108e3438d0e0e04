//! Output artifacts for skillscope.
//!
//! - [`render_dashboard`]: a self-contained HTML page with Plotly charts
//! - [`export_json`]: the raw skill list and publisher aggregates as JSON
//!
//! Every file is written through [`skillscope_storage::write_atomic`], so a
//! failed run never leaves a truncated artifact behind.

pub mod dashboard;
pub mod export;

pub use dashboard::{DEFAULT_TOP_N, format_millions, render_dashboard};
pub use export::{JsonExport, OWNERS_FILE, SKILLS_FILE, export_json, write_dashboard};
