//! 规范化地理位置记录
//!
//! 所有后端的查询结果都归一到 [`GeoRecord`]。每个基础字段有明确的
//! 默认值，记录永远是"全量"的：字段只会是默认值，不会缺失。
//! （扩展字段例外，仅在来源提供时出现。）

use serde::{Deserialize, Serialize};

pub const DEFAULT_UNKNOWN: &str = "Unknown";
pub const DEFAULT_NA: &str = "N/A";

/// 规范化的地理位置查询结果
///
/// 线上字段名沿用 ip-api 风格的 camelCase（serde rename），
/// 序列化顺序即结构体声明顺序，CSV 列序依赖这一点。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    pub status: String,
    pub query: String,
    pub continent: String,
    #[serde(rename = "continentCode")]
    pub continent_code: String,
    pub country: String,
    #[serde(rename = "countryCode")]
    pub country_code: String,
    pub region: String,
    #[serde(rename = "regionName")]
    pub region_name: String,
    pub city: String,
    pub district: String,
    pub zip: String,
    pub lat: f64,
    pub lon: f64,
    pub timezone: String,
    pub offset: i64,
    pub currency: String,
    pub isp: String,
    pub org: String,
    #[serde(rename = "as")]
    pub as_number: String,
    #[serde(rename = "asname")]
    pub as_name: String,
    pub mobile: bool,
    pub proxy: bool,
    pub hosting: bool,

    // 扩展字段：仅部分来源提供，缺席时不序列化
    #[serde(rename = "accuracyRadius", skip_serializing_if = "Option::is_none")]
    pub accuracy_radius: Option<u32>,
    #[serde(rename = "userType", skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpn: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tor: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdivisions: Option<Vec<String>>,
}

impl Default for GeoRecord {
    fn default() -> Self {
        Self {
            status: "success".to_string(),
            query: String::new(),
            continent: DEFAULT_UNKNOWN.to_string(),
            continent_code: DEFAULT_NA.to_string(),
            country: DEFAULT_UNKNOWN.to_string(),
            country_code: DEFAULT_NA.to_string(),
            region: DEFAULT_UNKNOWN.to_string(),
            region_name: DEFAULT_UNKNOWN.to_string(),
            city: DEFAULT_UNKNOWN.to_string(),
            district: String::new(),
            zip: String::new(),
            lat: 0.0,
            lon: 0.0,
            timezone: DEFAULT_UNKNOWN.to_string(),
            offset: 0,
            currency: DEFAULT_UNKNOWN.to_string(),
            isp: DEFAULT_UNKNOWN.to_string(),
            org: DEFAULT_UNKNOWN.to_string(),
            as_number: DEFAULT_UNKNOWN.to_string(),
            as_name: DEFAULT_UNKNOWN.to_string(),
            mobile: false,
            proxy: false,
            hosting: false,
            accuracy_radius: None,
            user_type: None,
            vpn: None,
            tor: None,
            mcc: None,
            mnc: None,
            subdivisions: None,
        }
    }
}

impl GeoRecord {
    /// 以目标 IP 初始化一条全默认记录
    pub fn new(ip: &str) -> Self {
        Self {
            query: ip.to_string(),
            ..Self::default()
        }
    }

    /// 城市与一级行政区是否都已解析出来
    ///
    /// 主库命中但这两个字段仍是默认值时，回退链会尝试用备库补全。
    pub fn is_complete(&self) -> bool {
        self.city != DEFAULT_UNKNOWN && self.region_name != DEFAULT_UNKNOWN
    }

    /// 用另一条记录补全本记录中仍为默认值的字段
    ///
    /// 本记录已填充的字段永远不被覆盖（primary wins），
    /// `other` 只填洞。合并满足幂等与保序。
    pub fn fill_from(&mut self, other: &Self) {
        fn fill_str(dst: &mut String, src: &str, default: &str) {
            if dst == default && src != default {
                *dst = src.to_string();
            }
        }

        fill_str(&mut self.continent, &other.continent, DEFAULT_UNKNOWN);
        fill_str(&mut self.continent_code, &other.continent_code, DEFAULT_NA);
        fill_str(&mut self.country, &other.country, DEFAULT_UNKNOWN);
        fill_str(&mut self.country_code, &other.country_code, DEFAULT_NA);
        fill_str(&mut self.region, &other.region, DEFAULT_UNKNOWN);
        fill_str(&mut self.region_name, &other.region_name, DEFAULT_UNKNOWN);
        fill_str(&mut self.city, &other.city, DEFAULT_UNKNOWN);
        fill_str(&mut self.district, &other.district, "");
        fill_str(&mut self.zip, &other.zip, "");
        fill_str(&mut self.timezone, &other.timezone, DEFAULT_UNKNOWN);
        fill_str(&mut self.currency, &other.currency, DEFAULT_UNKNOWN);
        fill_str(&mut self.isp, &other.isp, DEFAULT_UNKNOWN);
        fill_str(&mut self.org, &other.org, DEFAULT_UNKNOWN);
        fill_str(&mut self.as_number, &other.as_number, DEFAULT_UNKNOWN);
        fill_str(&mut self.as_name, &other.as_name, DEFAULT_UNKNOWN);

        if self.lat == 0.0 && self.lon == 0.0 && (other.lat != 0.0 || other.lon != 0.0) {
            self.lat = other.lat;
            self.lon = other.lon;
        }
        if self.offset == 0 {
            self.offset = other.offset;
        }

        // 分类标志：false 视为默认，来源给出 true 才算填充
        self.mobile |= other.mobile;
        self.proxy |= other.proxy;
        self.hosting |= other.hosting;

        // 扩展字段：None 即缺席
        if self.accuracy_radius.is_none() {
            self.accuracy_radius = other.accuracy_radius;
        }
        if self.user_type.is_none() {
            self.user_type = other.user_type.clone();
        }
        if self.vpn.is_none() {
            self.vpn = other.vpn;
        }
        if self.tor.is_none() {
            self.tor = other.tor;
        }
        if self.mcc.is_none() {
            self.mcc = other.mcc.clone();
        }
        if self.mnc.is_none() {
            self.mnc = other.mnc.clone();
        }
        if self.subdivisions.is_none() {
            self.subdivisions = other.subdivisions.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_total() {
        let rec = GeoRecord::default();
        assert_eq!(rec.status, "success");
        assert_eq!(rec.country, "Unknown");
        assert_eq!(rec.continent_code, "N/A");
        assert_eq!(rec.district, "");
        assert_eq!(rec.lat, 0.0);
        assert_eq!(rec.offset, 0);
        assert!(!rec.proxy);
        assert!(rec.accuracy_radius.is_none());
    }

    #[test]
    fn fill_from_only_fills_defaulted_fields() {
        let mut primary = GeoRecord::new("8.8.8.8");
        primary.country = "United States".to_string();
        primary.lat = 37.4;
        primary.lon = -122.0;

        let mut secondary = GeoRecord::new("8.8.8.8");
        secondary.country = "Spoofland".to_string();
        secondary.city = "Mountain View".to_string();
        secondary.lat = 1.0;
        secondary.lon = 1.0;

        primary.fill_from(&secondary);

        // primary 已填充的字段不被覆盖
        assert_eq!(primary.country, "United States");
        assert_eq!(primary.lat, 37.4);
        // 默认字段被补全
        assert_eq!(primary.city, "Mountain View");
    }

    #[test]
    fn fill_from_is_idempotent() {
        let mut primary = GeoRecord::new("1.1.1.1");
        let mut secondary = GeoRecord::new("1.1.1.1");
        secondary.city = "Sydney".to_string();
        secondary.region_name = "New South Wales".to_string();
        secondary.vpn = Some(false);

        primary.fill_from(&secondary);
        let once = primary.clone();
        primary.fill_from(&secondary);
        assert_eq!(primary, once);
    }

    #[test]
    fn completeness_requires_city_and_region_name() {
        let mut rec = GeoRecord::new("8.8.8.8");
        assert!(!rec.is_complete());
        rec.city = "Mountain View".to_string();
        assert!(!rec.is_complete());
        rec.region_name = "California".to_string();
        assert!(rec.is_complete());
    }

    #[test]
    fn extended_fields_are_skipped_when_absent() {
        let rec = GeoRecord::new("8.8.8.8");
        let json = serde_json::to_value(&rec).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("vpn"));
        assert!(!obj.contains_key("accuracyRadius"));
        // 基础字段用线上名
        assert!(obj.contains_key("countryCode"));
        assert!(obj.contains_key("as"));
    }
}
