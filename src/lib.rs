//! # 图片取色工具 — 库入口
//!
//! 给定一张图像与感兴趣区域，按行优先顺序返回每个采样像素的 RGB 颜色。
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  调用方                                                   │
//! │    get(&RgbaImage | &DynamicImage, params)      （同步） │
//! │    get_from_external_source(uri, params).await  （异步） │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓
//! ┌───────┴──────────────────────────────────────────────────┐
//! │  color_extractor                                          │
//! │  ├─ loader     Data URL / HTTP(S) / 文件 加载与校验       │
//! │  ├─ pipeline   解码 · 细节缩放 · 像素读取                 │
//! │  ├─ region     切割参数 → 像素矩形                        │
//! │  └─ handler    ColorExtractor 编排                        │
//! │                                                          │
//! │  error         AppError（命令行统一错误类型）             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`color_extractor`] | 颜色提取核心：来源加载、缩放、切割、像素解码 |
//! | [`error`] | 统一错误类型 `AppError`，命令行入口的返回类型 |
//!
//! ## 示例
//!
//! ```rust
//! use image::{ImageBuffer, Rgba, RgbaImage};
//! use image_to_colors::{Color, CuttingParameters, ExtractionParameters};
//!
//! let surface: RgbaImage = ImageBuffer::from_fn(5, 5, |x, y| Rgba([(y * 5 + x) as u8, 0, 0, 255]));
//!
//! let all = image_to_colors::get(&surface, None)?;
//! assert_eq!(all.len(), 25);
//!
//! let params = ExtractionParameters::default()
//!     .with_cutting(CuttingParameters::pixels(1.0, 1.0, 3.0, 3.0));
//! let center = image_to_colors::get(&surface, Some(&params))?;
//! assert_eq!(center[4], Color(12, 0, 0));
//! # Ok::<(), image_to_colors::ExtractionError>(())
//! ```

pub mod color_extractor;
pub mod error;

pub use color_extractor::{
    Color, ColorExtractor, ColorSource, CuttingMode, CuttingParameters, ExtractionError,
    ExtractionParameters, ExtractorConfig, get, get_from_external_source, get_from_image,
    get_from_surface,
};
