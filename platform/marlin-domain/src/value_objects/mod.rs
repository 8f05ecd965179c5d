pub mod bar;
pub mod record;
pub mod signal;
