pub mod generate;
pub mod row_ops;
