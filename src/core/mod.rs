// Core Domain
// スキーマスナップショットのモデル、設定、エラー、命名ポリシー

pub mod config;
pub mod error;
pub mod naming;
pub mod schema;
