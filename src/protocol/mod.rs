pub mod chunked;
pub mod commands;
pub mod decoder;
