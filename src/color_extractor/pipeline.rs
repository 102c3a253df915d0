//! # 缩放与像素解码流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → 画面 → 颜色”的过程集中管理：
//! - `decode_raw`：外部字节解码为图像，并在关键节点做资源上限控制
//! - `scale`：按细节百分比把图像重采样为新画面（不修改调用方的图像）
//! - `decode`：读取画面中的矩形窗口，按 RGBA 四字节分组取前三个字节
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸，按像素/内存上限快速拒绝
//! 2. 完整解码
//! 3. 目标尺寸与原始尺寸一致时直接转换 RGBA；否则先按同样的像素/内存上限校验目标尺寸，
//!    再用 `fast_image_resize` 重采样（细节百分比放大不能绕过解码上限）
//! 4. 按行优先顺序输出颜色，透明通道丢弃

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader, RgbaImage};
use std::io::Cursor;

use super::params::Color;
use super::region::Rectangle;
use super::source::RawImageData;
use super::{ColorExtractor, ExtractionError, ExtractorConfig};

const BYTES_PER_PIXEL: usize = 4;

/// 按细节百分比把图像重采样为新的 RGBA 画面。
///
/// 目标尺寸为 `原始尺寸 * (百分比 / 100)` 向零截断，两个方向使用同一比例以保持宽高比。
/// 目标画面超过 `max_decoded_pixels` / `max_decoded_bytes` 时返回 `ResourceLimit`。
pub fn scale(
    image: &DynamicImage,
    detailing_percentage: f64,
    config: &ExtractorConfig,
) -> Result<RgbaImage, ExtractionError> {
    let filter = config.resize_filter;
    let (width, height) = image.dimensions();
    let factor = detailing_percentage / 100.0;
    let target_width = (f64::from(width) * factor) as u32;
    let target_height = (f64::from(height) * factor) as u32;

    if target_width == width && target_height == height {
        return Ok(image.to_rgba8());
    }

    if target_width == 0 || target_height == 0 {
        log::debug!(
            "细节缩放结果为空画面：{}x{} -> {}x{}",
            width,
            height,
            target_width,
            target_height
        );
        return Ok(RgbaImage::new(target_width, target_height));
    }

    validate_pixel_limits(config, target_width, target_height)?;
    validate_decoded_memory_limits(config, target_width, target_height)?;

    log::debug!(
        "🧩 细节缩放：{}x{} -> {}x{}（{}%，filter={:?}）",
        width,
        height,
        target_width,
        target_height,
        detailing_percentage,
        filter
    );

    match resize_with_fast_image_resize(image, target_width, target_height, filter) {
        Ok(resized) => Ok(resized),
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::resize_exact：{}", err);
            Ok(image.resize_exact(target_width, target_height, filter).to_rgba8())
        }
    }
}

/// 读取画面中 `rect` 对应的像素，输出行优先的颜色列表。
///
/// 越界矩形返回 `OutOfRange`，零面积矩形返回空列表。
pub fn decode(surface: &RgbaImage, rect: &Rectangle) -> Result<Vec<Color>, ExtractionError> {
    let Some(window) = rect.to_pixel_rect(surface.width(), surface.height())? else {
        return Ok(Vec::new());
    };

    let stride = surface.width() as usize * BYTES_PER_PIXEL;
    let row_len = window.width as usize * BYTES_PER_PIXEL;
    let raw = surface.as_raw();
    let mut colors = Vec::with_capacity(window.pixel_count());

    for row in window.y..window.y + window.height {
        let start = row as usize * stride + window.x as usize * BYTES_PER_PIXEL;
        colors.extend(
            raw[start..start + row_len]
                .chunks_exact(BYTES_PER_PIXEL)
                .map(|px| Color(px[0], px[1], px[2])),
        );
    }

    Ok(colors)
}

impl ColorExtractor {
    /// 将加载得到的原始字节解码为图像。
    pub(crate) fn decode_raw(
        &self,
        raw: RawImageData,
        config: &ExtractorConfig,
    ) -> Result<DynamicImage, ExtractionError> {
        image::guess_format(&raw.bytes)
            .map_err(|e| ExtractionError::InvalidFormat(format!("不支持的图片格式：{}", e)))?;

        let (header_width, header_height) = inspect_dimensions_from_memory(&raw.bytes)?;
        validate_pixel_limits(config, header_width, header_height)?;
        validate_decoded_memory_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| ExtractionError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        validate_pixel_limits(config, width, height)?;

        log::debug!(
            "✅ 图片解码成功 - 来源: {} 尺寸: {}x{}",
            raw.source_hint,
            width,
            height
        );

        Ok(decoded)
    }
}

/// 仅通过内存中的图片头信息读取宽高。
fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ExtractionError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ExtractionError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

    reader
        .into_dimensions()
        .map_err(|e| ExtractionError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
}

fn validate_pixel_limits(
    config: &ExtractorConfig,
    width: u32,
    height: u32,
) -> Result<(), ExtractionError> {
    let pixels = u64::from(width)
        .checked_mul(u64::from(height))
        .ok_or_else(|| ExtractionError::ResourceLimit("图片像素数溢出".to_string()))?;

    if pixels > config.max_decoded_pixels {
        return Err(ExtractionError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    Ok(())
}

fn validate_decoded_memory_limits(
    config: &ExtractorConfig,
    width: u32,
    height: u32,
) -> Result<(), ExtractionError> {
    let estimated = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL as u64))
        .ok_or_else(|| ExtractionError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

    if estimated > config.max_decoded_bytes {
        return Err(ExtractionError::ResourceLimit(format!(
            "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
            estimated as f64 / 1024.0 / 1024.0,
            config.max_decoded_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}

fn resize_with_fast_image_resize(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<RgbaImage, ExtractionError> {
    let src = image.to_rgba8();
    let (src_width, src_height) = src.dimensions();

    let src_image =
        fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
            .map_err(|e| ExtractionError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new().resize_alg(to_resize_alg(filter));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ExtractionError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    RgbaImage::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| ExtractionError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))
}

fn to_resize_alg(filter: FilterType) -> fr::ResizeAlg {
    match filter {
        FilterType::Nearest => fr::ResizeAlg::Nearest,
        FilterType::Triangle => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
        FilterType::CatmullRom => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
        FilterType::Gaussian => fr::ResizeAlg::Convolution(fr::FilterType::Mitchell),
        FilterType::Lanczos3 => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
    }
}
