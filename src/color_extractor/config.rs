//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ExtractorConfig`：外部来源的下载/读取限制、
//! 解码资源上限以及细节缩放所用的重采样滤镜。
//! 提取参数（切割、细节百分比）属于单次调用，不放在这里。
//!
//! ## 实现思路
//!
//! - `Default` 提供加固后的加载策略：拦截内网地址，设置连接/下载/读流超时。
//! - `permissive` 对应模块级函数：任意地址可达，不设任何超时，只保留体积与解码上限。
//! - 超时字段为 `None` 时表示不限制；`validate` 只校验已设置的取值。
//! - 配置在提取器创建后不可变，并发调用之间不共享可变状态。

use image::imageops::FilterType;
use std::ops::RangeInclusive;

use super::ExtractionError;

/// 颜色提取器配置。
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// 下载/读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 网络下载总超时时间（秒），`None` 为不限制。
    pub download_timeout: Option<u64>,
    /// 建立连接（TCP/TLS）超时时间（秒），`None` 为不限制。
    pub connect_timeout: Option<u64>,
    /// 下载首包超时时间（毫秒），`None` 为不限制。
    pub stream_first_byte_timeout_ms: Option<u64>,
    /// 下载分块读取超时时间（毫秒），`None` 为不限制。
    pub stream_chunk_timeout_ms: Option<u64>,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 是否允许访问内网或本地地址（默认关闭，防 SSRF）。
    pub allow_private_network: bool,
    /// 是否对域名执行 DNS 解析后再做内网 IP 拦截。
    pub resolve_dns_for_url_safety: bool,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 细节缩放使用的重采样滤镜。
    pub resize_filter: FilterType,
    /// 非匿名请求时附带的 `Authorization` 头。
    pub authorization: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            download_timeout: Some(30),
            connect_timeout: Some(8),
            stream_first_byte_timeout_ms: Some(10_000),
            stream_chunk_timeout_ms: Some(15_000),
            max_redirects: 5,
            allow_private_network: false,
            resolve_dns_for_url_safety: true,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            resize_filter: FilterType::Triangle,
            authorization: None,
        }
    }
}

impl ExtractorConfig {
    /// 不做网络限制的配置：允许内网与本地地址，不设置任何超时。
    ///
    /// 体积与解码上限保持默认，避免单次调用耗尽内存。
    pub fn permissive() -> Self {
        Self {
            download_timeout: None,
            connect_timeout: None,
            stream_first_byte_timeout_ms: None,
            stream_chunk_timeout_ms: None,
            allow_private_network: true,
            resolve_dns_for_url_safety: false,
            ..Self::default()
        }
    }

    /// 校验加载与解码相关的取值范围。
    pub fn validate(&self) -> Result<(), ExtractionError> {
        if self.max_file_size == 0 {
            return Err(ExtractionError::InvalidFormat("max_file_size 不能为 0".to_string()));
        }
        check_range("download_timeout", self.download_timeout, 1..=600, "秒")?;
        check_range("connect_timeout", self.connect_timeout, 1..=120, "秒")?;
        check_range(
            "stream_first_byte_timeout_ms",
            self.stream_first_byte_timeout_ms,
            500..=120_000,
            "毫秒",
        )?;
        check_range(
            "stream_chunk_timeout_ms",
            self.stream_chunk_timeout_ms,
            500..=120_000,
            "毫秒",
        )?;
        if self.max_decoded_pixels == 0 || self.max_decoded_bytes == 0 {
            return Err(ExtractionError::InvalidFormat("解码上限不能为 0".to_string()));
        }

        Ok(())
    }

    /// 解析命令行等外部输入中的滤镜名称。
    pub fn parse_filter(name: &str) -> Result<FilterType, ExtractionError> {
        match name.trim().to_lowercase().as_str() {
            "nearest" => Ok(FilterType::Nearest),
            "triangle" => Ok(FilterType::Triangle),
            "catmull-rom" | "catmullrom" => Ok(FilterType::CatmullRom),
            "gaussian" => Ok(FilterType::Gaussian),
            "lanczos3" => Ok(FilterType::Lanczos3),
            other => Err(ExtractionError::InvalidFormat(format!(
                "未知滤镜：{}（可选：nearest / triangle / catmull-rom / gaussian / lanczos3）",
                other
            ))),
        }
    }
}

fn check_range(
    name: &str,
    value: Option<u64>,
    range: RangeInclusive<u64>,
    unit: &str,
) -> Result<(), ExtractionError> {
    match value {
        Some(v) if !range.contains(&v) => Err(ExtractionError::InvalidFormat(format!(
            "{} 必须在 {}~{} {}之间",
            name,
            range.start(),
            range.end(),
            unit
        ))),
        _ => Ok(()),
    }
}
