// CSV bar input and report output for the command line front-end
mod bar_loader;
mod report_writer;

pub use {
    bar_loader::{load_bar_csv, symbol_from_path},
    report_writer::{
        StrongThresholds, render_summary, strength_cell, write_json_report, write_symbol_outputs,
        write_zones_csv,
    },
};
