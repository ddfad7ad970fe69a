//! ノード引数の読み取り

use crate::error::{Result, SpecError};
use kdl::{KdlNode, KdlValue};
use tracing::warn;

fn first(node: &KdlNode) -> Option<&KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .map(|e| e.value())
}

/// 最初の引数を文字列として取得
pub(super) fn string_arg(node: &KdlNode) -> Option<String> {
    first(node).and_then(|v| v.as_string()).map(|s| s.to_string())
}

/// 全ての文字列引数を取得
pub(super) fn string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string().map(|s| s.to_string()))
        .collect()
}

/// 必須の名前引数を取得（`database "app" { ... }` の "app"）
pub(super) fn required_name(node: &KdlNode) -> Result<String> {
    match string_arg(node) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(SpecError::InvalidConfig(format!(
            "{} には名前が必要です",
            node.name().value()
        ))),
    }
}

/// 必須の文字列引数を取得
pub(super) fn required_string(node: &KdlNode) -> Result<String> {
    string_arg(node).ok_or_else(|| {
        SpecError::InvalidConfig(format!(
            "{} には文字列を指定してください",
            node.name().value()
        ))
    })
}

/// 最初の引数を整数として取得
pub(super) fn integer_arg(node: &KdlNode) -> Result<i64> {
    first(node)
        .and_then(|v| v.as_integer())
        .and_then(|v| i64::try_from(v).ok())
        .ok_or_else(|| {
            SpecError::InvalidConfig(format!(
                "{} には整数を指定してください",
                node.name().value()
            ))
        })
}

/// 最初の引数をブール値として取得
pub(super) fn bool_arg(node: &KdlNode) -> Result<bool> {
    let key = node.name().value();
    first(node)
        .and_then(|v| bool_with_hint(key, v))
        .ok_or_else(|| {
            SpecError::InvalidConfig(format!(
                "{key} には #true または #false を指定してください"
            ))
        })
}

/// プロパティ（`hours=3`）を整数として取得
pub(super) fn integer_prop(node: &KdlNode, key: &str) -> Option<i64> {
    node.get(key)
        .and_then(|v| v.as_integer())
        .and_then(|v| i64::try_from(v).ok())
}

/// 最初の引数を文字列化して取得
///
/// `postgresql_config` や `settings` のように値の型がキーごとに異なるブロックで使います。
pub(super) fn scalar_arg(node: &KdlNode) -> Option<String> {
    match first(node)? {
        KdlValue::String(s) => Some(s.clone()),
        KdlValue::Integer(i) => Some(i.to_string()),
        KdlValue::Float(f) => Some(f.to_string()),
        KdlValue::Bool(b) => Some(b.to_string()),
        KdlValue::Null => None,
    }
}

/// ブール値をパースし、`true`/`false` 文字列が使用された場合は警告を出力
///
/// KDL v2 では `#true`/`#false` を使用する必要がある
fn bool_with_hint(key: &str, value: &KdlValue) -> Option<bool> {
    if let Some(b) = value.as_bool() {
        return Some(b);
    }

    match value.as_string()? {
        "true" => {
            warn!("'{key} \"true\"' is a string, not a boolean. Use '{key} #true' instead");
            Some(true)
        }
        "false" => {
            warn!("'{key} \"false\"' is a string, not a boolean. Use '{key} #false' instead");
            Some(false)
        }
        _ => None,
    }
}
