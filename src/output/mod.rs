//! 输出整形模块
//!
//! 字段投影 + 三种序列化（JSON / XML / CSV），全部是纯函数。
//! 投影以记录声明顺序产出有序键值对，CSV 的列序、XML 的元素序
//! 都由它决定。

mod serializer;

pub use serializer::{fail_body, serialize};

use serde_json::Value;

use crate::errors::Result;
use crate::services::geo::GeoRecord;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Xml,
    Csv,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json; charset=utf-8",
            Self::Xml => "application/xml; charset=utf-8",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Xml => write!(f, "xml"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Invalid output format: '{}'. Valid: json, xml, csv", s)),
        }
    }
}

/// 按 tier 可见字段集投影记录
///
/// - `fields == None` → 全字段，按记录声明顺序
/// - `fields == Some(list)` → 仅保留列出的字段，仍按记录声明顺序；
///   非 JSON 格式额外剔除 `status`（它不是数据载荷的字段）
///
/// 相同输入的投影结果恒定。
pub fn project(
    record: &GeoRecord,
    fields: Option<&[String]>,
    format: OutputFormat,
) -> Result<Vec<(String, Value)>> {
    let value = serde_json::to_value(record)?;
    let Value::Object(map) = value else {
        // GeoRecord 恒为对象
        return Ok(Vec::new());
    };

    let pairs = map
        .into_iter()
        .filter(|(key, _)| match fields {
            None => true,
            Some(list) => {
                if !list.iter().any(|f| f == key) {
                    return false;
                }
                // 过滤后的 XML/CSV 载荷里 status 没有意义，剔除
                !(format != OutputFormat::Json && key == "status")
            }
        })
        .collect();

    Ok(pairs)
}
