pub mod race_result;
pub mod ranking_file;
