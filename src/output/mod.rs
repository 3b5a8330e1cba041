pub mod formatter;

pub use formatter::{
    format_delta, format_money, format_multiple, format_snapshot, format_summary_table,
    should_use_colors,
};
