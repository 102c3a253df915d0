//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ColorSource` 表示同步入口接收的来源：现成画面或尚未栅格化的图像
//! - `LoadOptions` 表示外部加载时的提示
//! - `RawImageData` 表示已加载但未解码的字节
//!
//! 来源类型只在入口处判断一次，后续阶段只面对 `RgbaImage`。

use image::{DynamicImage, RgbaImage};

/// 同步提取入口接收的来源。
#[derive(Debug, Clone, Copy)]
pub enum ColorSource<'a> {
    /// 已栅格化的 RGBA 画面，按原样读取，不应用细节缩放。
    Surface(&'a RgbaImage),
    /// 已解码的图像，先按细节百分比重采样为新画面再读取。
    Image(&'a DynamicImage),
}

impl<'a> From<&'a RgbaImage> for ColorSource<'a> {
    fn from(surface: &'a RgbaImage) -> Self {
        Self::Surface(surface)
    }
}

impl<'a> From<&'a DynamicImage> for ColorSource<'a> {
    fn from(image: &'a DynamicImage) -> Self {
        Self::Image(image)
    }
}

/// 外部加载提示。
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// 请求资源时不携带任何凭据（URL 用户信息、`Authorization`、`Referer`）。
    pub anonymous_cross_origin: bool,
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}
