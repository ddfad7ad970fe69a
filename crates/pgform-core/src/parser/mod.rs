//! KDLパーサー
//!
//! pgform の KDL 宣言ファイルをパースします。
//! ブロックごとのパース処理はモジュールに分離されています。

mod cluster;
mod config;
mod value;

use cluster::parse_cluster;

use crate::error::{Result, SpecError};
use crate::model::ClusterResource;
use kdl::KdlDocument;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// KDLファイルをパースして宣言されたクラスターを返す
pub fn parse_kdl_file<P: AsRef<Path>>(path: P) -> Result<Vec<ClusterResource>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| SpecError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_kdl_string(&content)
}

/// KDL文字列をパース
///
/// トップレベルの `cluster` ノードのみを解釈します。
/// 同名のクラスターが複数宣言されている場合はエラーです。
pub fn parse_kdl_string(content: &str) -> Result<Vec<ClusterResource>> {
    let doc: KdlDocument = content.parse()?;

    let mut clusters = Vec::new();
    let mut seen = HashSet::new();

    for node in doc.nodes() {
        match node.name().value() {
            "cluster" => {
                let cluster = parse_cluster(node)?;
                if !seen.insert(cluster.name.clone()) {
                    return Err(SpecError::Duplicate {
                        kind: "cluster",
                        name: cluster.name,
                    });
                }
                debug!(cluster = %cluster.name, "Parsed cluster declaration");
                clusters.push(cluster);
            }
            other => {
                // 不明なノードはスキップ
                warn!(node = other, "Ignoring unknown top-level node");
            }
        }
    }

    Ok(clusters)
}

#[cfg(test)]
mod tests;
