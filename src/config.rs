//! 配置模块，负责从JSON配置文件加载模式目录

use crate::catalog::{
    standard_facets, standard_primitive_types, FacetKind, InMemoryCatalog,
    PrimitiveTypeDescriptor, StorageField,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 目录配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置文件不存在: {}", .0.display())]
    NotFound(PathBuf),
    #[error("无法读取配置文件 {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("无法解析JSON配置 {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 目录配置结构
///
/// ```json
/// {
///   "entities": {
///     "Order": {
///       "Id": { "column": "order_id", "type": "Int32" },
///       "Total": { "column": "total", "type": "Decimal", "nullable": true }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// 实体名 -> (字段名 -> 存储字段)
    pub entities: HashMap<String, HashMap<String, StorageField>>,
    /// 基础类型表，缺省时使用标准 Edm.* 类型
    #[serde(default = "standard_primitive_types")]
    pub primitive_types: Vec<PrimitiveTypeDescriptor>,
    /// 可用的通用 facet，缺省为 Nullable 和 DefaultValue
    #[serde(default = "standard_facets")]
    pub facets: Vec<FacetKind>,
}

impl CatalogConfig {
    /// 从JSON文件加载目录配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.to_path_buf()));
        }

        // 读取文件内容
        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;

        Self::parse(&content, &path_ref.display().to_string())
    }

    /// 从JSON字符串加载目录配置
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Json {
            origin: origin.to_string(),
            source,
        })
    }

    /// 构建内存目录
    pub fn into_catalog(self) -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new()
            .with_primitive_types(self.primitive_types)
            .with_facets(self.facets);
        for (entity, fields) in self.entities {
            for (field, storage) in fields {
                catalog.add_field(&entity, field, storage);
            }
        }
        catalog
    }

    /// 实体总数
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}
