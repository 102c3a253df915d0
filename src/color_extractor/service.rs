//! # 服务入口
//!
//! ## 设计思路
//!
//! 大多数调用方不需要自定义配置，只想“给一张图，拿回颜色”。
//! 这里提供模块级函数，内部每次创建 `ColorExtractor`，不保留任何全局状态。
//!
//! - 同步函数使用 `ColorExtractor::default()`，不会构建 HTTP 客户端。
//! - 异步函数使用 `ExtractorConfig::permissive()`：任意地址可达、不设超时，
//!   与浏览器加载图片的行为一致；只保留体积与解码上限。
//!
//! 需要内网拦截、超时、滤镜或凭据时，直接构建 `ColorExtractor`。

use image::{DynamicImage, RgbaImage};

use super::params::{Color, ExtractionParameters};
use super::{ColorExtractor, ColorSource, ExtractionError, ExtractorConfig};

/// 同步提取：从现成画面（`&RgbaImage`）或已解码图像（`&DynamicImage`）中取出颜色。
///
/// # 示例
/// ```rust
/// use image::{ImageBuffer, Rgba, RgbaImage};
/// use image_to_colors::{Color, CuttingParameters, ExtractionParameters};
///
/// let surface: RgbaImage = ImageBuffer::from_fn(5, 5, |x, y| Rgba([(y * 5 + x) as u8, 0, 0, 255]));
/// let params = ExtractionParameters::default()
///     .with_cutting(CuttingParameters::percentage(20.0, 20.0, 60.0, 60.0));
///
/// let colors = image_to_colors::get(&surface, Some(&params))?;
/// assert_eq!(colors[0], Color(6, 0, 0));
/// assert_eq!(colors.len(), 9);
/// # Ok::<(), image_to_colors::ExtractionError>(())
/// ```
pub fn get<'a, S>(source: S, parameters: Option<&ExtractionParameters>) -> Result<Vec<Color>, ExtractionError>
where
    S: Into<ColorSource<'a>>,
{
    ColorExtractor::default().get(source.into(), parameters)
}

/// 异步提取：从 URI 加载图像后取出颜色，加载失败时返回错误。
pub async fn get_from_external_source(
    uri: &str,
    parameters: Option<&ExtractionParameters>,
) -> Result<Vec<Color>, ExtractionError> {
    ColorExtractor::new(ExtractorConfig::permissive())?
        .get_from_external_source(uri, parameters)
        .await
}

/// 直接从现成画面提取，等价于 `get(ColorSource::Surface(surface), ..)`。
pub fn get_from_surface(
    surface: &RgbaImage,
    parameters: Option<&ExtractionParameters>,
) -> Result<Vec<Color>, ExtractionError> {
    get(surface, parameters)
}

/// 直接从已解码图像提取，细节百分比生效。
pub fn get_from_image(
    image: &DynamicImage,
    parameters: Option<&ExtractionParameters>,
) -> Result<Vec<Color>, ExtractionError> {
    get(image, parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_extractor::CuttingParameters;
    use image::{ImageBuffer, Rgba};

    fn fixture_surface() -> RgbaImage {
        ImageBuffer::from_fn(5, 5, |x, y| Rgba([(y * 5 + x) as u8, 0, 0, 255]))
    }

    #[test]
    fn get_from_surface_ignores_detailing() {
        let params = ExtractionParameters::default()
            .with_detailing_percentage(40.0)
            .with_cutting(CuttingParameters::pixels(1.0, 1.0, 3.0, 3.0));

        let colors = get_from_surface(&fixture_surface(), Some(&params)).expect("extraction failed");

        assert_eq!(colors.len(), 9);
        assert_eq!(colors[0], Color(6, 0, 0));
        assert_eq!(colors[8], Color(18, 0, 0));
    }

    #[test]
    fn get_from_image_applies_detailing() {
        let image = DynamicImage::ImageRgba8(fixture_surface());
        let params = ExtractionParameters::default().with_detailing_percentage(40.0);

        let detailed = get_from_image(&image, Some(&params)).expect("extraction failed");
        let native = get_from_image(&image, None).expect("extraction failed");

        assert_eq!(detailed.len(), 4);
        assert_eq!(native, get_from_surface(&fixture_surface(), None).expect("extraction failed"));
    }

    #[test]
    fn get_from_image_reports_oversized_detailing() {
        let image = DynamicImage::ImageRgba8(fixture_surface());
        let params = ExtractionParameters::default().with_detailing_percentage(1e12);

        let result = get_from_image(&image, Some(&params));

        assert!(matches!(result, Err(ExtractionError::ResourceLimit(_))));
    }
}
