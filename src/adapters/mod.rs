// Adapters
// データベースへのアクセスとDDLの入出力を抽象化

pub mod connection_string;
pub mod connector;
pub mod sql_generator;
pub mod sql_quote;
pub mod type_classifier;
