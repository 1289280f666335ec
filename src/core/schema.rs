// スキーマドメインモデル
//
// プロバイダーに依存しないスキーマスナップショットを表現する型システム。
// Schema, Table, Column, ForeignKey, Relationship などの構造体を提供します。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// スキーマスナップショット
///
/// ある時点で1つのデータベースから読み取った全テーブル定義を保持します。
/// エクスポートや検査の間だけ存在し、永続化されません。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// テーブル定義のマップ（テーブル名 -> Table）
    pub tables: BTreeMap<String, Table>,
}

impl Schema {
    /// 空のスキーマを作成
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    /// テーブルを追加
    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// 指定されたテーブルが存在するか確認
    pub fn has_table(&self, table_name: &str) -> bool {
        self.tables.contains_key(table_name)
    }

    /// 指定されたテーブルを取得
    pub fn get_table(&self, table_name: &str) -> Option<&Table> {
        self.tables.get(table_name)
    }

    /// 指定されたテーブルを可変参照で取得
    pub fn get_table_mut(&mut self, table_name: &str) -> Option<&mut Table> {
        self.tables.get_mut(table_name)
    }

    /// テーブル数を取得
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// テーブル名の一覧（名前順）
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// 指定された名前順にテーブルを並べる
    ///
    /// スナップショットに存在しない名前は無視します。
    pub fn tables_in_order(&self, order: &[String]) -> Vec<&Table> {
        order
            .iter()
            .filter_map(|name| self.tables.get(name))
            .collect()
    }
}

/// テーブル定義
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// テーブル名
    pub name: String,

    /// カラム定義（カラム名 -> Column）
    pub columns: BTreeMap<String, Column>,

    /// このテーブルを参照元とする外部キー（宣言順）
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,

    /// 主キーカラム名
    #[serde(default)]
    pub primary_key: Option<String>,
}

impl Table {
    /// 新しいテーブルを作成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: BTreeMap::new(),
            foreign_keys: Vec::new(),
            primary_key: None,
        }
    }

    /// カラムを追加
    ///
    /// 同名のカラムが既にある場合は置き換えます。
    /// 主キーフラグ付きのカラムは、主キー未設定であればテーブルの主キーになります。
    pub fn add_column(&mut self, column: Column) {
        if column.primary_key && self.primary_key.is_none() {
            self.primary_key = Some(column.name.clone());
        }
        self.columns.insert(column.name.clone(), column);
    }

    /// 主キーを設定
    ///
    /// 該当カラムの主キーフラグも合わせて立てます。
    pub fn set_primary_key(&mut self, column_name: &str) {
        if let Some(column) = self.columns.get_mut(column_name) {
            column.primary_key = true;
        }
        self.primary_key = Some(column_name.to_string());
    }

    /// 外部キーを追加
    pub fn add_foreign_key(&mut self, foreign_key: ForeignKey) {
        self.foreign_keys.push(foreign_key);
    }

    /// 指定されたカラムを取得
    pub fn get_column(&self, column_name: &str) -> Option<&Column> {
        self.columns.get(column_name)
    }

    /// カラムを序数位置順に取得
    pub fn ordered_columns(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self.columns.values().collect();
        columns.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));
        columns
    }

    /// 参照先テーブル名の一覧（宣言順、重複なし）
    pub fn referenced_tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = Vec::new();
        for fk in &self.foreign_keys {
            if !tables.contains(&fk.parent_table.as_str()) {
                tables.push(fk.parent_table.as_str());
            }
        }
        tables
    }
}

/// カラム定義
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// カラム名（テーブル内で一意）
    pub name: String,

    /// 論理カラム型
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// 文字型の長さ（文字型以外は0）
    #[serde(default)]
    pub length: u32,

    /// NULL許可フラグ
    pub nullable: bool,

    /// ユニークフラグ
    #[serde(default)]
    pub unique: bool,

    /// デフォルト値（SQL表現のまま）
    pub default_value: Option<String>,

    /// 序数位置（1始まり）
    #[serde(default)]
    pub position: u32,

    /// 主キーフラグ
    #[serde(default)]
    pub primary_key: bool,
}

impl Column {
    /// 新しいカラムを作成
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            length: 0,
            nullable,
            unique: false,
            default_value: None,
            position: 0,
            primary_key: false,
        }
    }

    /// 長さを設定（文字型以外では0のまま）
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = if self.column_type.is_character() {
            length
        } else {
            0
        };
        self
    }

    /// 序数位置を設定
    pub fn with_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    /// デフォルト値を設定
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// 主キーとしてマーク
    pub fn primary(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// ユニークとしてマーク
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// 自動採番カラムかどうか
    pub fn is_auto_number(&self) -> bool {
        self.column_type == ColumnType::AutoNumber
    }
}

/// カラム型
///
/// Jet/Access、MySQL、SQL Server、SQLite、Oracle、PostgreSQLの
/// 型語彙を統一した論理カラム種別です。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// 自動採番（IDENTITY, AUTOINCREMENT, SERIAL, COUNTER）
    AutoNumber,
    Integer,
    BigInt,
    SmallInt,
    TinyInt,
    Decimal,
    Float,
    Double,
    Currency,
    Boolean,
    /// 固定長文字列
    Char,
    /// 可変長文字列
    VarChar,
    /// 可変長Unicode文字列
    NVarChar,
    /// 長文テキスト（TEXT, MEMO, LONGTEXT, CLOB）
    Memo,
    Binary,
    Blob,
    /// Jet の OLE オブジェクト
    OleObject,
    DateTime,
    Date,
    Time,
    Timestamp,
    Guid,
    Xml,
    Json,
    /// 分類できなかった型（エラーではない）
    Other,
}

impl ColumnType {
    /// 長さを持つ文字型かどうか
    pub fn is_character(&self) -> bool {
        matches!(
            self,
            ColumnType::Char | ColumnType::VarChar | ColumnType::NVarChar
        )
    }
}

/// 参照整合性アクション
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintAction {
    #[default]
    NoAction,
    Cascade,
    SetNull,
}

impl ConstraintAction {
    /// プロバイダーの規則文字列から変換
    ///
    /// "CASCADE" → Cascade、"SET NULL" → SetNull、それ以外はすべて NoAction。
    pub fn from_rule(rule: &str) -> Self {
        let normalized = rule.trim().to_ascii_uppercase().replace('_', " ");
        match normalized.as_str() {
            "CASCADE" => ConstraintAction::Cascade,
            "SET NULL" => ConstraintAction::SetNull,
            _ => ConstraintAction::NoAction,
        }
    }

    /// DDLに出力するキーワード（NoActionの場合はNone）
    pub fn as_sql(&self) -> Option<&'static str> {
        match self {
            ConstraintAction::NoAction => None,
            ConstraintAction::Cascade => Some("CASCADE"),
            ConstraintAction::SetNull => Some("SET NULL"),
        }
    }
}

/// 外部キー定義
///
/// 所有テーブル（子）のカラムが親テーブルのカラムを参照することを表します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// 制約名
    pub name: String,
    /// 参照元テーブル
    pub child_table: String,
    /// 参照元カラム
    pub child_column: String,
    /// 参照先テーブル
    pub parent_table: String,
    /// 参照先カラム
    pub parent_column: String,
    /// 削除時アクション
    #[serde(default)]
    pub on_delete: ConstraintAction,
    /// 更新時アクション
    #[serde(default)]
    pub on_update: ConstraintAction,
}

impl ForeignKey {
    /// 新しい外部キーを作成（アクションは NoAction）
    pub fn new(
        name: impl Into<String>,
        child_table: impl Into<String>,
        child_column: impl Into<String>,
        parent_table: impl Into<String>,
        parent_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            child_table: child_table.into(),
            child_column: child_column.into(),
            parent_table: parent_table.into(),
            parent_column: parent_column.into(),
            on_delete: ConstraintAction::NoAction,
            on_update: ConstraintAction::NoAction,
        }
    }

    /// 自己参照かどうか
    pub fn is_self_reference(&self) -> bool {
        self.child_table == self.parent_table
    }
}

/// リレーションシップ
///
/// プロバイダーの外部キー行から直接作られる一時的な運搬用の型です。
/// スキーマ読み取り中にだけ存在し、最後に所有テーブルの ForeignKey に変換されます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub name: String,
    pub child_table: String,
    pub child_column: String,
    pub parent_table: String,
    pub parent_column: String,
    pub on_delete: ConstraintAction,
    pub on_update: ConstraintAction,
}

impl Relationship {
    /// テーブル付属の ForeignKey に変換
    pub fn into_foreign_key(self) -> ForeignKey {
        ForeignKey {
            name: self.name,
            child_table: self.child_table,
            child_column: self.child_column,
            parent_table: self.parent_table,
            parent_column: self.parent_column,
            on_delete: self.on_delete,
            on_update: self.on_update,
        }
    }
}
