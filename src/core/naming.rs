// 命名ポリシー
//
// 設定ファイル名と予約されたテーブル名・制約名の単一ソースを提供します。

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".schemaport.yaml";

/// SQLiteがAUTOINCREMENTの採番管理に使う内部テーブル
pub const SQLITE_SEQUENCE_TABLE: &str = "sqlite_sequence";

/// SQLiteの内部オブジェクトに付く接頭辞
pub const SQLITE_INTERNAL_PREFIX: &str = "sqlite_";

/// Jet(Access)で主キー制約に使われる慣習的な名前
pub const JET_PRIMARY_KEY_NAME: &str = "PrimaryKey";

/// 内部テーブルかどうかを判定
///
/// スキーマスナップショットに含めてはならないテーブルの場合は true を返します。
pub fn is_internal_table(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower == SQLITE_SEQUENCE_TABLE || lower.starts_with(SQLITE_INTERNAL_PREFIX)
}
