pub mod explain;
pub mod options;
