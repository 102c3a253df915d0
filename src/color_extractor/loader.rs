//! # 外部来源加载模块
//!
//! ## 设计思路
//!
//! 统一处理不同 URI（Data URL / HTTP(S) / 本地文件）的原始字节加载，
//! 并在“尽可能早”的阶段执行输入校验，尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - Data URL：格式解析 + 解码前体积预估 + 解码。
//! - URL：协议 + 主机安全 + 手动重定向 + 内容类型 + 体积校验 + 流式下载。
//! - 文件：`file://` 或普通路径，存在性 + metadata 体积限制 + 读取。
//! - 所有来源最终都要通过图片签名（magic bytes）校验。
//! - 匿名模式下不携带任何凭据；加载失败不重试、不缓存。

use base64::{Engine as _, engine::general_purpose};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::lookup_host;

use super::source::{LoadOptions, RawImageData};
use super::{ColorExtractor, ExtractionError, ExtractorConfig};

const STREAM_SIGNATURE_PROBE_BYTES: usize = 4096;
const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;
const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

impl ColorExtractor {
    /// 按 URI 类型加载原始字节。
    pub(crate) async fn load(
        &self,
        uri: &str,
        options: LoadOptions,
        config: &ExtractorConfig,
    ) -> Result<RawImageData, ExtractionError> {
        let uri = uri.trim();

        if uri.starts_with(DATA_URL_PREFIX) {
            return Self::load_from_data_url(uri, config);
        }

        match reqwest::Url::parse(uri) {
            Ok(parsed) => match parsed.scheme() {
                "http" | "https" => self.load_from_url(parsed, options, config).await,
                "file" => {
                    let path = parsed.to_file_path().map_err(|_| {
                        ExtractionError::InvalidFormat(format!("无效的文件 URL：{}", uri))
                    })?;
                    Self::load_from_file(&path, config)
                }
                // Windows 盘符路径（如 `C:\a.png`）也能被解析成 URL。
                _ if Path::new(uri).exists() => Self::load_from_file(Path::new(uri), config),
                other => Err(ExtractionError::InvalidFormat(format!(
                    "不支持的 URI 协议：{}",
                    other
                ))),
            },
            Err(_) => Self::load_from_file(&PathBuf::from(uri), config),
        }
    }

    /// 从 URL 加载图片原始字节。
    async fn load_from_url(
        &self,
        url: reqwest::Url,
        options: LoadOptions,
        config: &ExtractorConfig,
    ) -> Result<RawImageData, ExtractionError> {
        log::info!("🌐 开始下载图片 - URL: {}", redact_url_for_log(url.as_str()));

        validate_url_safety(&url, config).await?;
        let bytes = self.download_with_validation(url, options, config).await?;
        validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "url",
        })
    }

    /// 从 Data URL（`data:image/...;base64,...`）加载图片原始字节。
    fn load_from_data_url(
        data: &str,
        config: &ExtractorConfig,
    ) -> Result<RawImageData, ExtractionError> {
        log::info!("📝 开始处理 Data URL 图片");

        let bytes = parse_data_url_with_limit(data, config.max_file_size)?;

        if bytes.len() as u64 > config.max_file_size {
            return Err(ExtractionError::ResourceLimit(format!(
                "Data URL 解码后体积过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
        validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "data-url",
        })
    }

    /// 从本地路径加载图片原始字节。
    fn load_from_file(path: &Path, config: &ExtractorConfig) -> Result<RawImageData, ExtractionError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(ExtractionError::FileSystem(format!(
                "文件不存在：{}",
                path.display()
            )));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| ExtractionError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        if metadata.len() > config.max_file_size {
            return Err(ExtractionError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| ExtractionError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    /// 执行带校验的网络下载。
    ///
    /// 重定向手动跟随，每一跳都重新做安全校验；正文流式读取。
    async fn download_with_validation(
        &self,
        url: reqwest::Url,
        options: LoadOptions,
        config: &ExtractorConfig,
    ) -> Result<Vec<u8>, ExtractionError> {
        let client = self.http_client()?;
        let mut current_url = prepare_request_url(url, options);

        for redirect_count in 0..=config.max_redirects {
            log::debug!("📡 发送 HTTP 请求...");
            let response = send_request(client, current_url.clone(), options, config)
                .await
                .map_err(|e| map_reqwest_error(e, current_url.as_str(), config))?;

            if response.status().is_redirection() {
                if redirect_count >= config.max_redirects {
                    return Err(ExtractionError::Network(format!(
                        "重定向次数超过限制（{}）",
                        config.max_redirects
                    )));
                }

                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .ok_or_else(|| ExtractionError::Network("重定向响应缺少 Location 头".to_string()))?;

                let location_str = location
                    .to_str()
                    .map_err(|e| ExtractionError::InvalidFormat(format!("重定向地址无效：{}", e)))?;

                let next_url = current_url.join(location_str).map_err(|e| {
                    ExtractionError::InvalidFormat(format!("重定向 URL 解析失败：{}", e))
                })?;

                validate_url_safety(&next_url, config).await?;

                log::debug!("↪️ 跳转到: {}", redact_url_for_log(next_url.as_str()));
                current_url = prepare_request_url(next_url, options);
                continue;
            }

            if !response.status().is_success() {
                return Err(ExtractionError::Network(format!(
                    "HTTP {}: {}",
                    response.status().as_u16(),
                    status_message(response.status().as_u16())
                )));
            }

            if let Some(ct) = response.headers().get(reqwest::header::CONTENT_TYPE) {
                if let Ok(ct_str) = ct.to_str() {
                    if !is_image_content_type(ct_str) {
                        return Err(ExtractionError::InvalidFormat(format!(
                            "不是图片类型：{}",
                            ct_str
                        )));
                    }
                }
            }

            let total_len = response
                .headers()
                .get(reqwest::header::CONTENT_LENGTH)
                .and_then(|cl| cl.to_str().ok())
                .and_then(|cl| cl.parse::<u64>().ok());

            if let Some(size) = total_len {
                if size > config.max_file_size {
                    return Err(ExtractionError::ResourceLimit(format!(
                        "文件过大：{:.2} MB（限制：{:.2} MB）",
                        size as f64 / 1024.0 / 1024.0,
                        config.max_file_size as f64 / 1024.0 / 1024.0
                    )));
                }
            }

            return read_body_with_limits(response, total_len, config).await;
        }

        Err(ExtractionError::Network("下载流程异常结束".to_string()))
    }

    /// 返回复用的 HTTP 客户端，首次访问网络时才构建。
    fn http_client(&self) -> Result<&reqwest::Client, ExtractionError> {
        self.http_client.get_or_try_init(|| build_http_client(&self.config))
    }
}

async fn send_request(
    client: &reqwest::Client,
    url: reqwest::Url,
    options: LoadOptions,
    config: &ExtractorConfig,
) -> Result<reqwest::Response, reqwest::Error> {
    let mut request = client
        .get(url.clone())
        .header(reqwest::header::USER_AGENT, concat!("image-to-colors/", env!("CARGO_PKG_VERSION")))
        .header(reqwest::header::ACCEPT, "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8");

    if !options.anonymous_cross_origin {
        let referer = format!("{}://{}/", url.scheme(), url.host_str().unwrap_or(""));
        request = request.header(reqwest::header::REFERER, referer);

        if let Some(authorization) = &config.authorization {
            request = request.header(reqwest::header::AUTHORIZATION, authorization);
        }
    }

    request.send().await
}

fn build_http_client(config: &ExtractorConfig) -> Result<reqwest::Client, ExtractionError> {
    let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
    if let Some(secs) = config.download_timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = config.connect_timeout {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }

    builder
        .build()
        .map_err(|e| ExtractionError::Network(format!("无法创建 HTTP 客户端：{}", e)))
}

/// 匿名模式下去掉 URL 中的用户信息，避免被当作 Basic 认证发送。
fn prepare_request_url(mut url: reqwest::Url, options: LoadOptions) -> reqwest::Url {
    if options.anonymous_cross_origin {
        let _ = url.set_username("");
        let _ = url.set_password(None);
    }
    url
}

/// 流式读取正文，首包与分块分别设置超时，并持续校验体积与签名。
async fn read_body_with_limits(
    mut response: reqwest::Response,
    total_len: Option<u64>,
    config: &ExtractorConfig,
) -> Result<Vec<u8>, ExtractionError> {
    let initial_capacity = total_len
        .map(|len| len.min(config.max_file_size).min(usize::MAX as u64) as usize)
        .filter(|len| *len > 0)
        .unwrap_or(BUFFER_INITIAL_CAPACITY);
    let mut buffer = Vec::with_capacity(initial_capacity);
    let mut total: u64 = 0;
    let mut signature_validated = false;
    let mut received_first_chunk = false;

    loop {
        let read_timeout = if received_first_chunk {
            config.stream_chunk_timeout_ms
        } else {
            config.stream_first_byte_timeout_ms
        };

        let next_chunk_result = match read_timeout {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), response.chunk())
                .await
                .map_err(|_| {
                    if received_first_chunk {
                        ExtractionError::Timeout("下载数据流读取超时".to_string())
                    } else {
                        ExtractionError::Timeout("下载首包超时".to_string())
                    }
                })?,
            None => response.chunk().await,
        };

        let Some(chunk) = next_chunk_result
            .map_err(|e| ExtractionError::Network(format!("下载失败：{}", e)))?
        else {
            break;
        };

        received_first_chunk = true;

        total = total.saturating_add(chunk.len() as u64);
        if total > config.max_file_size {
            return Err(ExtractionError::ResourceLimit("下载后文件超过大小限制".to_string()));
        }
        buffer.extend_from_slice(&chunk);

        if !signature_validated {
            signature_validated = validate_stream_signature_probe(&buffer, STREAM_SIGNATURE_PROBE_BYTES)?;
        }
    }

    if !signature_validated {
        validate_image_signature(&buffer)?;
    }

    log::debug!("✅ 下载完成 - {} bytes", total);

    Ok(buffer)
}

/// 校验 URL 安全性。
///
/// 默认阻止本地/内网目标，防止 SSRF 风险。
async fn validate_url_safety(url: &reqwest::Url, config: &ExtractorConfig) -> Result<(), ExtractionError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ExtractionError::InvalidFormat("仅支持 HTTP/HTTPS".to_string()));
    }

    if config.allow_private_network {
        return Ok(());
    }

    let host = url
        .host_str()
        .ok_or_else(|| ExtractionError::InvalidFormat("URL 缺少主机地址".to_string()))?;

    if is_local_hostname(host) {
        return Err(ExtractionError::InvalidFormat(format!(
            "禁止访问本地网络地址：{}",
            host
        )));
    }

    let bare_host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare_host.parse::<IpAddr>() {
        if is_private_or_local_ip(ip) {
            return Err(ExtractionError::InvalidFormat(format!("禁止访问内网 IP：{}", ip)));
        }

        return Ok(());
    }

    if config.resolve_dns_for_url_safety {
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ExtractionError::InvalidFormat("URL 缺少端口信息".to_string()))?;

        let addrs = lookup_host((host, port))
            .await
            .map_err(|e| ExtractionError::Network(format!("URL 主机解析失败：{}", e)))?;

        let mut resolved_any = false;
        for addr in addrs {
            if is_private_or_local_ip(addr.ip()) {
                return Err(ExtractionError::InvalidFormat(format!(
                    "URL 解析结果命中内网地址：{}",
                    addr.ip()
                )));
            }
            resolved_any = true;
        }

        if !resolved_any {
            return Err(ExtractionError::Network("URL 未解析到有效地址".to_string()));
        }
    }

    Ok(())
}

/// 判断主机名是否指向本地地址。
fn is_local_hostname(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host.eq_ignore_ascii_case("localhost.")
        || host.ends_with(".local")
}

/// 判断 IP 是否属于本地/内网/链路本地等受限范围。
fn is_private_or_local_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            if v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_unspecified()
                || v4.is_multicast()
            {
                return true;
            }

            let octets = v4.octets();
            // 0.0.0.0/8 与运营商级 NAT 100.64.0.0/10
            octets[0] == 0 || (octets[0] == 100 && (octets[1] & 0b1100_0000) == 0b0100_0000)
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_unique_local()
                || v6.is_unicast_link_local()
                || v6.is_multicast()
        }
    }
}

fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

/// 日志中只保留协议、主机、端口与路径。
fn redact_url_for_log(url: &str) -> String {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return "<invalid-url>".to_string();
    };

    let host = parsed.host_str().unwrap_or("<unknown-host>");
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();

    format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path())
}

fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, ExtractionError> {
    let len = base64_data.trim().len() as u64;
    let groups = len
        .checked_add(3)
        .ok_or_else(|| ExtractionError::ResourceLimit("Base64 输入长度溢出".to_string()))?
        / 4;

    groups
        .checked_mul(3)
        .ok_or_else(|| ExtractionError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
}

fn parse_data_url_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, ExtractionError> {
    let normalized = data.trim();

    if !normalized.starts_with("data:image/") {
        return Err(ExtractionError::InvalidFormat("Data URL 不是图片类型".to_string()));
    }

    let base64_start = normalized
        .find(BASE64_MARKER)
        .ok_or_else(|| ExtractionError::InvalidFormat("缺少 base64 标记".to_string()))?;
    let base64_data = &normalized[base64_start + BASE64_MARKER.len()..];
    let estimated_len = estimate_base64_decoded_upper_bound_len(base64_data)?;

    if estimated_len > max_file_size {
        return Err(ExtractionError::ResourceLimit(format!(
            "Data URL 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
            estimated_len as f64 / 1024.0 / 1024.0,
            max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    general_purpose::STANDARD
        .decode(base64_data)
        .map_err(|e| ExtractionError::Decode(format!("Base64 解码失败：{}", e)))
}

/// 统一映射 reqwest 错误到业务错误。
fn map_reqwest_error(e: reqwest::Error, url: &str, config: &ExtractorConfig) -> ExtractionError {
    let err_msg = e.to_string().replace(url, &redact_url_for_log(url));

    if e.is_timeout() {
        match config.download_timeout {
            Some(secs) => ExtractionError::Timeout(format!("下载超时（{}秒）", secs)),
            None => ExtractionError::Timeout(format!("下载超时：{}", err_msg)),
        }
    } else if e.is_connect() {
        ExtractionError::Network(format!("无法连接：{}", err_msg))
    } else {
        ExtractionError::Network(format!("请求失败：{}", err_msg))
    }
}

fn status_message(code: u16) -> &'static str {
    match code {
        404 => "未找到",
        403 => "访问被拒绝",
        500..=599 => "服务器错误",
        _ => "请求失败",
    }
}

/// 通过文件签名（magic bytes）校验输入是否为图片。
fn validate_image_signature(bytes: &[u8]) -> Result<(), ExtractionError> {
    if bytes.is_empty() {
        return Err(ExtractionError::InvalidFormat("图片内容为空".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| ExtractionError::InvalidFormat("无法识别图片类型".to_string()))?;

    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(ExtractionError::InvalidFormat(format!(
            "文件签名不是图片类型：{}",
            kind.mime_type()
        )));
    }

    Ok(())
}

/// 流式下载阶段的签名探测：尽早识别并拒绝非图片内容。
///
/// 返回值：
/// - `Ok(true)`：已识别为图片
/// - `Ok(false)`：当前字节不足以判断，继续下载
/// - `Err(...)`：已识别为非图片，或达到探测上限仍无法识别
fn validate_stream_signature_probe(bytes: &[u8], probe_limit: usize) -> Result<bool, ExtractionError> {
    if bytes.is_empty() {
        return Ok(false);
    }

    if let Some(kind) = infer::get(bytes) {
        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(ExtractionError::InvalidFormat(format!(
                "下载内容不是图片类型：{}",
                kind.mime_type()
            )));
        }
        return Ok(true);
    }

    if bytes.len() >= probe_limit {
        return Err(ExtractionError::InvalidFormat(format!(
            "下载前 {} 字节内无法识别图片类型",
            probe_limit
        )));
    }

    Ok(false)
}
