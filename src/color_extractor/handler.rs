//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ColorExtractor` 只负责流程编排，不持有任何可变状态，并发调用彼此独立。
//! 同步链路固定为：
//! 1. 入口判断来源：现成画面直接使用；图像先按细节百分比缩放为新画面
//! 2. 基于画面当前尺寸解析切割区域
//! 3. 读取区域像素并转换为颜色列表
//!
//! 异步链路先加载并解码外部来源，再委托给同步链路。
//!
//! ## 实现思路
//!
//! - 配置在构建时校验，之后只读。
//! - HTTP 客户端延迟到首次网络加载时构建，同步链路不依赖网络栈。
//! - 加载失败原样向上返回，不重试、不吞错、不返回部分结果。
//! - 记录 `load/decode/extract/total` 阶段耗时，便于性能诊断。

use image::RgbaImage;
use once_cell::sync::OnceCell;
use std::borrow::Cow;
use std::time::Instant;

use super::params::{Color, ExtractionParameters};
use super::source::{ColorSource, LoadOptions};
use super::{ExtractionError, ExtractorConfig, pipeline, region};

/// 颜色提取器。
///
/// 封装了只读配置与按需构建、可复用的 HTTP 客户端。
#[derive(Debug, Clone)]
pub struct ColorExtractor {
    pub(super) config: ExtractorConfig,
    pub(super) http_client: OnceCell<reqwest::Client>,
}

impl Default for ColorExtractor {
    fn default() -> Self {
        Self::from_validated(ExtractorConfig::default())
    }
}

impl ColorExtractor {
    /// 根据配置创建提取器。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_to_colors::{ColorExtractor, ExtractorConfig};
    ///
    /// let extractor = ColorExtractor::new(ExtractorConfig::default())?;
    /// # Ok::<(), image_to_colors::ExtractionError>(())
    /// ```
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractionError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    pub(super) fn from_validated(config: ExtractorConfig) -> Self {
        Self {
            config,
            http_client: OnceCell::new(),
        }
    }

    /// 同步提取：从现成画面或已解码图像中取出颜色。
    ///
    /// # 示例
    /// ```rust
    /// use image::{ImageBuffer, Rgba, RgbaImage};
    /// use image_to_colors::{Color, ColorExtractor, ColorSource, CuttingParameters, ExtractionParameters};
    ///
    /// let surface: RgbaImage = ImageBuffer::from_fn(5, 5, |x, y| Rgba([(y * 5 + x) as u8, 0, 0, 255]));
    /// let extractor = ColorExtractor::default();
    /// let params = ExtractionParameters::default()
    ///     .with_cutting(CuttingParameters::pixels(0.0, 0.0, 1.0, 1.0));
    ///
    /// let colors = extractor.get(ColorSource::Surface(&surface), Some(&params))?;
    /// assert_eq!(colors, vec![Color(0, 0, 0)]);
    /// # Ok::<(), image_to_colors::ExtractionError>(())
    /// ```
    pub fn get(
        &self,
        source: ColorSource<'_>,
        parameters: Option<&ExtractionParameters>,
    ) -> Result<Vec<Color>, ExtractionError> {
        let surface: Cow<'_, RgbaImage> = match source {
            ColorSource::Surface(surface) => Cow::Borrowed(surface),
            ColorSource::Image(image) => {
                let percentage = parameters
                    .map(ExtractionParameters::detailing_percentage)
                    .unwrap_or(super::params::DEFAULT_DETAILING_PERCENTAGE);
                Cow::Owned(pipeline::scale(image, percentage, &self.config)?)
            }
        };

        let cutting = parameters.and_then(|p| p.cutting_parameters.as_ref());
        let rect = region::resolve(surface.width(), surface.height(), cutting);
        log::debug!(
            "切割区域：({}, {}, {}, {}) 画面 {}x{}",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            surface.width(),
            surface.height()
        );

        pipeline::decode(&surface, &rect)
    }

    /// 异步提取：先从 URI 加载并解码图像，再按同步链路提取颜色。
    ///
    /// 支持 `data:image/...;base64,` Data URL、HTTP(S) 地址、`file://` 地址与本地路径。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_to_colors::{ColorExtractor, ExtractionParameters};
    ///
    /// # async fn demo() -> Result<(), image_to_colors::ExtractionError> {
    /// let extractor = ColorExtractor::new(Default::default())?;
    /// let params = ExtractionParameters::default()
    ///     .with_detailing_percentage(40.0)
    ///     .with_cross_origin_anonymous(true);
    /// let colors = extractor
    ///     .get_from_external_source("https://example.com/a.png", Some(&params))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_from_external_source(
        &self,
        uri: &str,
        parameters: Option<&ExtractionParameters>,
    ) -> Result<Vec<Color>, ExtractionError> {
        let total_start = Instant::now();
        let options = LoadOptions {
            anonymous_cross_origin: parameters.is_some_and(|p| p.cross_origin_anonymous),
        };

        let load_start = Instant::now();
        let raw = self.load(uri, options, &self.config).await?;
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let image = self.decode_raw(raw, &self.config)?;
        let decode_elapsed = decode_start.elapsed();

        let extract_start = Instant::now();
        let colors = self.get(ColorSource::Image(&image), parameters)?;
        let extract_elapsed = extract_start.elapsed();

        log::info!(
            "✅ 颜色提取完成 - colors={} load={}ms decode={}ms extract={}ms total={}ms",
            colors.len(),
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            extract_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(colors)
    }
}
