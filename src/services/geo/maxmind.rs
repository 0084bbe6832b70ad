//! MaxMind GeoLite2 数据库实现
//!
//! 使用本地 GeoLite2-City.mmdb 文件解析，无网络调用。
//! 打开失败由构造方返回错误，注册表会降级为 DisabledProvider。

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use maxminddb::Reader;
use tracing::trace;

use super::provider::{GeoProvider, Unavailable};
use super::record::GeoRecord;

/// MaxMind Provider
pub struct MaxMindProvider {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxMindProvider {
    /// 从文件路径打开数据库
    pub fn open(path: &str) -> Result<Self, maxminddb::MaxMindDbError> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    fn map_record(ip: &str, city: &maxminddb::geoip2::City) -> GeoRecord {
        let mut rec = GeoRecord::new(ip);

        if let Some(code) = city.continent.code {
            rec.continent_code = code.to_string();
        }
        if let Some(name) = city.continent.names.english {
            rec.continent = name.to_string();
        }
        if let Some(code) = city.country.iso_code {
            rec.country_code = code.to_string();
        }
        if let Some(name) = city.country.names.english {
            rec.country = name.to_string();
        }
        if let Some(name) = city.city.names.english {
            rec.city = name.to_string();
        }
        if let Some(code) = city.postal.code {
            rec.zip = code.to_string();
        }

        // 一级行政区取 subdivisions 首个，完整列表进扩展字段
        if let Some(first) = city.subdivisions.first() {
            if let Some(code) = first.iso_code {
                rec.region = code.to_string();
            }
            if let Some(name) = first.names.english {
                rec.region_name = name.to_string();
            }
        }
        let names: Vec<String> = city
            .subdivisions
            .iter()
            .filter_map(|s| s.names.english.map(|n| n.to_string()))
            .collect();
        if !names.is_empty() {
            rec.subdivisions = Some(names);
        }

        if let Some(lat) = city.location.latitude {
            rec.lat = lat;
        }
        if let Some(lon) = city.location.longitude {
            rec.lon = lon;
        }
        if let Some(tz) = city.location.time_zone {
            rec.timezone = tz.to_string();
        }
        if let Some(radius) = city.location.accuracy_radius {
            rec.accuracy_radius = Some(radius as u32);
        }

        rec
    }
}

#[async_trait]
impl GeoProvider for MaxMindProvider {
    async fn lookup(&self, ip: &str) -> Result<GeoRecord, Unavailable> {
        let ip_addr: IpAddr = ip
            .parse()
            .map_err(|e| Unavailable::new(format!("invalid ip for mmdb lookup: {}", e)))?;

        let result = self
            .reader
            .lookup(ip_addr)
            .map_err(|e| Unavailable::new(format!("mmdb lookup failed: {}", e)))?;
        let city: maxminddb::geoip2::City = result
            .decode()
            .map_err(|e| Unavailable::new(format!("mmdb decode failed: {}", e)))?
            .ok_or_else(|| Unavailable::new("ip not present in database"))?;

        let rec = Self::map_record(ip, &city);
        trace!(
            "MaxMind lookup {}: country={}, city={}",
            ip, rec.country, rec.city
        );
        Ok(rec)
    }

    fn name(&self) -> &'static str {
        "maxmind"
    }
}
