// Services Layer
// スキーマの読み取り・並べ替え・転送を行うサービス層

pub mod dependency_sorter;
pub mod schema_reader;
pub mod schema_transfer;
pub mod statement_splitter;
