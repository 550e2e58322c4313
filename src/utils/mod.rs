// file: src/utils/mod.rs
// description: utility module exports
// reference: internal module structure

pub mod logging;
pub mod response;

pub use logging::{format_error, format_severity, format_success, format_warning, init_logger};
pub use response::{clean_label, strip_code_fences};
