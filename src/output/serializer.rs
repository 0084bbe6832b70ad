//! 三种输出格式的序列化
//!
//! 输入都是投影后的有序键值对。JSON 走 serde_json，CSV 走 csv crate，
//! XML 是单根元素包字段子元素的固定形态，手写生成并做字符转义。

use serde_json::Value;

use crate::errors::Result;

use super::OutputFormat;

/// 序列化投影结果为响应体
pub fn serialize(pairs: &[(String, Value)], format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Json => to_json(pairs),
        OutputFormat::Xml => Ok(to_xml(pairs)),
        OutputFormat::Csv => to_csv(pairs),
    }
}

/// 失败响应的两字段信封，按请求格式渲染
pub fn fail_body(message: &str, format: OutputFormat) -> Vec<u8> {
    let pairs = vec![
        ("status".to_string(), Value::String("fail".to_string())),
        ("message".to_string(), Value::String(message.to_string())),
    ];
    // 信封字段恒为标量，三种序列化都不会失败
    serialize(&pairs, format).unwrap_or_else(|_| message.as_bytes().to_vec())
}

fn to_json(pairs: &[(String, Value)]) -> Result<Vec<u8>> {
    let mut map = serde_json::Map::new();
    for (key, value) in pairs {
        map.insert(key.clone(), value.clone());
    }
    Ok(serde_json::to_vec(&Value::Object(map))?)
}

fn to_xml(pairs: &[(String, Value)]) -> Vec<u8> {
    let mut out = String::from("<response>");
    for (key, value) in pairs {
        match value {
            // 数组展开为同名重复元素
            Value::Array(items) => {
                for item in items {
                    push_element(&mut out, key, &scalar_text(item));
                }
            }
            other => push_element(&mut out, key, &scalar_text(other)),
        }
    }
    out.push_str("</response>");
    out.into_bytes()
}

fn push_element(out: &mut String, name: &str, text: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
    out.push_str(&escape_xml(text));
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn to_csv(pairs: &[(String, Value)]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(pairs.iter().map(|(k, _)| k.as_str()))?;
    writer.write_record(pairs.iter().map(|(_, v)| scalar_text(v)))?;
    writer
        .into_inner()
        .map_err(|e| crate::errors::GeogateError::serialization(e.to_string()))
}

/// 标量文本形式：字符串原样，数字/布尔按显示值，数组分号连接
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(";"),
        Value::Object(_) => value.to_string(),
    }
}
