// Schemaportライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメイン（スキーマモデル、設定、エラー）
// - adapters: データベースコネクター、型分類、DDL生成
// - services: スキーマ読み取り、依存順ソート、エクスポート/インポート

pub mod adapters;
pub mod cli;
pub mod core;
pub mod services;
