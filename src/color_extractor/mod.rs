//! # 颜色提取模块（color_extractor）
//!
//! ## 设计思路
//!
//! 该模块将“来源识别 → 加载校验 → 解码 → 细节缩放 → 区域解析 → 像素解码”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `service`：模块级入口函数（同步走默认提取器，异步走不限网络的加载配置）
//! - `handler`：`ColorExtractor`，编排整条处理流水线
//! - `loader`：负责 Data URL / URL / 文件加载与安全校验
//! - `pipeline`：负责字节解码、细节缩放、像素读取
//! - `region`：切割参数到像素矩形的换算
//! - `config/error/params/source`：配置、错误、参数与中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! get_from_external_source(uri)
//!    ↓
//! loader.rs（来源加载 + URL/体积/签名校验）
//!    ↓
//! pipeline.rs（解码 + 像素限制）
//!    ↓
//! get(ColorSource)
//!    ├─ pipeline::scale（仅图像来源，按细节百分比）
//!    ├─ region::resolve（基于缩放后的画面尺寸）
//!    └─ pipeline::decode（RGBA → RGB，行优先）
//! ```

mod config;
mod error;
mod handler;
mod loader;
mod params;
mod pipeline;
mod region;
mod service;
mod source;

pub use config::ExtractorConfig;
pub use error::ExtractionError;
pub use handler::ColorExtractor;
pub use params::{
    Color, CuttingMode, CuttingParameters, DEFAULT_DETAILING_PERCENTAGE, ExtractionParameters,
};
pub use pipeline::{decode, scale};
pub use region::{PixelRect, Rectangle, resolve};
pub use service::{get, get_from_external_source, get_from_image, get_from_surface};
pub use source::ColorSource;
