// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod export;
pub mod import;
pub mod inspect;
