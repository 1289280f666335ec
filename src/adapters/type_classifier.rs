// 型分類サービス
//
// プロバイダー固有の型名文字列（Jet/Access、MySQL、SQL Server、SQLite、
// Oracle、PostgreSQL）を論理的な ColumnType に分類します。
// 順序付きのトークン表を上から照合し、最初に一致した規則を採用します。

use crate::core::schema::ColumnType;
use tracing::warn;

/// Jet の COLUMN_FLAGS でこの値を超えると長文テキスト（MEMO）扱い
pub const JET_LONG_TEXT_FLAGS: i64 = 127;

/// トークンの照合方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchMode {
    /// 型名全体が一致
    Exact,
    /// 型名のいずれかの単語が一致
    Word,
    /// 型名に部分文字列として含まれる
    Contains,
}

/// 分類規則
#[derive(Debug, Clone, Copy)]
struct TypeRule {
    token: &'static str,
    mode: MatchMode,
    column_type: ColumnType,
    /// 汎用文字列型（フラグで長文テキストに切り替わる）
    generic_string: bool,
}

const fn rule(token: &'static str, mode: MatchMode, column_type: ColumnType) -> TypeRule {
    TypeRule {
        token,
        mode,
        column_type,
        generic_string: false,
    }
}

const fn string_rule(token: &'static str, mode: MatchMode) -> TypeRule {
    TypeRule {
        token,
        mode,
        column_type: ColumnType::VarChar,
        generic_string: true,
    }
}

use MatchMode::{Contains, Exact, Word};

// 衝突しうるトークンは、より具体的なものを先に並べる
// （AUTOINCREMENT は INT より先、NVARCHAR は VARCHAR より先、DATETIME は DATE より先）。
const TYPE_RULES: &[TypeRule] = &[
    // OLE DB の DBTYPE コード（Jet スキーマ行セットの DATA_TYPE）
    rule("3", Exact, ColumnType::Integer),
    rule("2", Exact, ColumnType::SmallInt),
    rule("17", Exact, ColumnType::TinyInt),
    rule("20", Exact, ColumnType::BigInt),
    rule("4", Exact, ColumnType::Float),
    rule("5", Exact, ColumnType::Double),
    rule("6", Exact, ColumnType::Currency),
    rule("7", Exact, ColumnType::DateTime),
    rule("11", Exact, ColumnType::Boolean),
    rule("72", Exact, ColumnType::Guid),
    rule("131", Exact, ColumnType::Decimal),
    rule("128", Exact, ColumnType::Binary),
    rule("205", Exact, ColumnType::OleObject),
    string_rule("130", Exact),
    // 自動採番
    rule("AUTOINCREMENT", Contains, ColumnType::AutoNumber),
    rule("AUTO_INCREMENT", Contains, ColumnType::AutoNumber),
    rule("AUTONUMBER", Contains, ColumnType::AutoNumber),
    rule("IDENTITY", Contains, ColumnType::AutoNumber),
    rule("COUNTER", Word, ColumnType::AutoNumber),
    rule("SERIAL", Contains, ColumnType::AutoNumber),
    // GUID
    rule("UNIQUEIDENTIFIER", Contains, ColumnType::Guid),
    rule("GUID", Contains, ColumnType::Guid),
    rule("UUID", Contains, ColumnType::Guid),
    // 整数
    rule("BIGINT", Contains, ColumnType::BigInt),
    rule("SMALLINT", Contains, ColumnType::SmallInt),
    rule("TINYINT", Contains, ColumnType::TinyInt),
    rule("MEDIUMINT", Contains, ColumnType::Integer),
    rule("INT8", Word, ColumnType::BigInt),
    rule("INT4", Word, ColumnType::Integer),
    rule("INT2", Word, ColumnType::SmallInt),
    rule("LONG", Exact, ColumnType::Integer),
    rule("BYTE", Exact, ColumnType::TinyInt),
    // 長文テキスト
    rule("LONGVARWCHAR", Contains, ColumnType::Memo),
    rule("LONGVARCHAR", Contains, ColumnType::Memo),
    rule("LONGTEXT", Contains, ColumnType::Memo),
    rule("MEDIUMTEXT", Contains, ColumnType::Memo),
    rule("TINYTEXT", Contains, ColumnType::VarChar),
    rule("NTEXT", Contains, ColumnType::Memo),
    rule("MEMO", Contains, ColumnType::Memo),
    rule("CLOB", Contains, ColumnType::Memo),
    rule("TEXT", Contains, ColumnType::Memo),
    // 文字列
    rule("NVARCHAR", Contains, ColumnType::NVarChar),
    rule("NATIONAL CHARACTER VARYING", Contains, ColumnType::NVarChar),
    string_rule("VARWCHAR", Contains),
    string_rule("WCHAR", Contains),
    string_rule("CHARACTER VARYING", Contains),
    string_rule("VARCHAR", Contains),
    string_rule("STRING", Contains),
    rule("NCHAR", Contains, ColumnType::Char),
    rule("CHAR", Contains, ColumnType::Char),
    // バイナリ
    rule("OLEOBJECT", Contains, ColumnType::OleObject),
    rule("OLE OBJECT", Contains, ColumnType::OleObject),
    rule("LONGBINARY", Contains, ColumnType::OleObject),
    rule("LONGVARBINARY", Contains, ColumnType::Blob),
    rule("BLOB", Contains, ColumnType::Blob),
    rule("BYTEA", Contains, ColumnType::Blob),
    rule("IMAGE", Word, ColumnType::Blob),
    rule("BINARY", Contains, ColumnType::Binary),
    // 構造化
    rule("XML", Contains, ColumnType::Xml),
    rule("JSON", Contains, ColumnType::Json),
    // 数値
    rule("MONEY", Contains, ColumnType::Currency),
    rule("CURRENCY", Contains, ColumnType::Currency),
    rule("DECIMAL", Contains, ColumnType::Decimal),
    rule("NUMERIC", Contains, ColumnType::Decimal),
    rule("NUMBER", Word, ColumnType::Decimal),
    rule("DOUBLE", Contains, ColumnType::Double),
    rule("FLOAT8", Word, ColumnType::Double),
    rule("FLOAT4", Word, ColumnType::Float),
    rule("FLOAT", Contains, ColumnType::Float),
    rule("REAL", Word, ColumnType::Float),
    rule("SINGLE", Word, ColumnType::Float),
    // 真偽値
    rule("BOOLEAN", Contains, ColumnType::Boolean),
    rule("BOOL", Word, ColumnType::Boolean),
    rule("YESNO", Contains, ColumnType::Boolean),
    rule("YES/NO", Contains, ColumnType::Boolean),
    rule("LOGICAL", Word, ColumnType::Boolean),
    rule("BIT", Word, ColumnType::Boolean),
    // 日時
    rule("DATETIME", Contains, ColumnType::DateTime),
    rule("TIMESTAMP", Contains, ColumnType::Timestamp),
    rule("DATE", Word, ColumnType::Date),
    rule("TIME", Word, ColumnType::Time),
    // 汎用整数（INTERVAL や POINT を拾わないよう単語照合）
    rule("INTEGER", Word, ColumnType::Integer),
    rule("INT", Word, ColumnType::Integer),
];

/// 型名がトークン規則に一致するか判定
fn matches_rule(normalized: &str, rule: &TypeRule) -> bool {
    match rule.mode {
        MatchMode::Exact => normalized == rule.token,
        MatchMode::Contains => normalized.contains(rule.token),
        MatchMode::Word => normalized
            .split(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '/')
            .any(|word| word == rule.token),
    }
}

/// 生の型名を ColumnType に分類
///
/// 同じ入力には常に同じ結果を返す純粋関数です（ログ出力を除く）。
/// 一致する規則がない場合は `ColumnType::Other` を返し、警告を1件記録します。
///
/// # Arguments
///
/// * `raw_type_name` - プロバイダーが報告した型名
/// * `flags` - 型フラグ（Jet の COLUMN_FLAGS、他プロバイダーでは0）
/// * `declared_length` - 宣言された長さ（SQL Server の MAX は負値）
pub fn classify(raw_type_name: &str, flags: i64, declared_length: i64) -> ColumnType {
    let normalized = raw_type_name.trim().to_ascii_uppercase();

    let Some(matched) = TYPE_RULES
        .iter()
        .find(|rule| matches_rule(&normalized, rule))
    else {
        warn!(
            raw_type = raw_type_name,
            "Unrecognized column type, classified as Other"
        );
        return ColumnType::Other;
    };

    if matched.generic_string && flags > JET_LONG_TEXT_FLAGS {
        return ColumnType::Memo;
    }

    if matched.column_type.is_character() && declared_length < 0 {
        return ColumnType::Memo;
    }

    matched.column_type
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    struct WarningCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for WarningCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn count_warnings<T>(f: impl FnOnce() -> T) -> (T, usize) {
        let counter = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarningCounter(counter.clone()));
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, counter.load(Ordering::SeqCst))
    }

    #[test]
    fn test_unknown_type_is_other_with_one_warning() {
        let (column_type, warnings) = count_warnings(|| classify("FROBNOSTICATOR", 0, 0));
        assert_eq!(column_type, ColumnType::Other);
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_known_type_emits_no_warning() {
        let (column_type, warnings) = count_warnings(|| classify("varchar", 0, 50));
        assert_eq!(column_type, ColumnType::VarChar);
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_classification_is_deterministic() {
        for raw in ["BIGINT", "nvarchar", "FROBNOSTICATOR", "WChar", "datetime2"] {
            assert_eq!(classify(raw, 0, 10), classify(raw, 0, 10));
        }
    }

    #[test]
    fn test_auto_number_tokens_win_over_integer() {
        assert_eq!(classify("INTEGER AUTOINCREMENT", 0, 0), ColumnType::AutoNumber);
        assert_eq!(classify("int identity", 0, 0), ColumnType::AutoNumber);
        assert_eq!(classify("AutoNumber", 0, 0), ColumnType::AutoNumber);
        assert_eq!(classify("COUNTER", 0, 0), ColumnType::AutoNumber);
        assert_eq!(classify("bigserial", 0, 0), ColumnType::AutoNumber);
    }

    #[test]
    fn test_integer_family() {
        assert_eq!(classify("INTEGER", 0, 0), ColumnType::Integer);
        assert_eq!(classify("int", 0, 0), ColumnType::Integer);
        assert_eq!(classify("int unsigned", 0, 0), ColumnType::Integer);
        assert_eq!(classify("bigint", 0, 0), ColumnType::BigInt);
        assert_eq!(classify("int8", 0, 0), ColumnType::BigInt);
        assert_eq!(classify("smallint", 0, 0), ColumnType::SmallInt);
        assert_eq!(classify("UnsignedTinyInt", 0, 0), ColumnType::TinyInt);
        assert_eq!(classify("Long", 0, 0), ColumnType::Integer);
    }

    #[test]
    fn test_integer_token_does_not_match_inside_words() {
        assert_eq!(classify("INTERVAL", 0, 0), ColumnType::Other);
        assert_eq!(classify("POINT", 0, 0), ColumnType::Other);
    }

    #[test]
    fn test_string_family() {
        assert_eq!(classify("VARCHAR", 0, 255), ColumnType::VarChar);
        assert_eq!(classify("character varying", 0, 40), ColumnType::VarChar);
        assert_eq!(classify("nvarchar", 0, 40), ColumnType::NVarChar);
        assert_eq!(classify("char", 0, 2), ColumnType::Char);
        assert_eq!(classify("nchar", 0, 2), ColumnType::Char);
        assert_eq!(classify("TEXT", 0, 0), ColumnType::Memo);
        assert_eq!(classify("longtext", 0, 0), ColumnType::Memo);
        assert_eq!(classify("MEMO", 0, 0), ColumnType::Memo);
    }

    #[test]
    fn test_jet_long_text_flag_threshold() {
        assert_eq!(classify("WChar", 127, 255), ColumnType::VarChar);
        assert_eq!(classify("WChar", 128, 0), ColumnType::Memo);
        assert_eq!(classify("130", 106, 50), ColumnType::VarChar);
        assert_eq!(classify("130", 234, 0), ColumnType::Memo);
        // フラグ規則は汎用文字列型にだけ適用される
        assert_eq!(classify("INTEGER", 234, 0), ColumnType::Integer);
    }

    #[test]
    fn test_sql_server_max_length_is_memo() {
        assert_eq!(classify("varchar", 0, -1), ColumnType::Memo);
        assert_eq!(classify("nvarchar", 0, -1), ColumnType::Memo);
    }

    #[test]
    fn test_date_time_family() {
        assert_eq!(classify("DATETIME", 0, 0), ColumnType::DateTime);
        assert_eq!(classify("datetime2", 0, 0), ColumnType::DateTime);
        assert_eq!(classify("timestamp with time zone", 0, 0), ColumnType::Timestamp);
        assert_eq!(classify("date", 0, 0), ColumnType::Date);
        assert_eq!(classify("time", 0, 0), ColumnType::Time);
        assert_eq!(classify("7", 0, 0), ColumnType::DateTime);
    }

    #[test]
    fn test_misc_types() {
        assert_eq!(classify("money", 0, 0), ColumnType::Currency);
        assert_eq!(classify("Currency", 0, 0), ColumnType::Currency);
        assert_eq!(classify("numeric", 0, 0), ColumnType::Decimal);
        assert_eq!(classify("NUMBER", 0, 0), ColumnType::Decimal);
        assert_eq!(classify("double precision", 0, 0), ColumnType::Double);
        assert_eq!(classify("REAL", 0, 0), ColumnType::Float);
        assert_eq!(classify("bit", 0, 0), ColumnType::Boolean);
        assert_eq!(classify("YesNo", 0, 0), ColumnType::Boolean);
        assert_eq!(classify("uniqueidentifier", 0, 0), ColumnType::Guid);
        assert_eq!(classify("varbinary", 0, 0), ColumnType::Binary);
        assert_eq!(classify("longblob", 0, 0), ColumnType::Blob);
        assert_eq!(classify("OLEOBJECT", 0, 0), ColumnType::OleObject);
        assert_eq!(classify("xml", 0, 0), ColumnType::Xml);
        assert_eq!(classify("jsonb", 0, 0), ColumnType::Json);
    }
}
