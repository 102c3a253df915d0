//! # 提取参数与结果模型
//!
//! ## 设计思路
//!
//! 调用方只需描述“要哪一块、要多细”，其余交给提取器：
//! - `ExtractionParameters`：可选配置包（细节百分比 / 切割参数 / 匿名跨域提示）
//! - `CuttingParameters`：切割矩形，按 `CuttingMode` 解释为像素或百分比
//! - `Color`：单个像素的 RGB 三元组，透明通道已丢弃
//!
//! 参数本身不做校验：负百分比、零面积矩形都会原样传递给后续阶段。

use serde::{Deserialize, Serialize};

/// 未指定细节百分比时的默认值（不缩放）。
pub const DEFAULT_DETAILING_PERCENTAGE: f64 = 100.0;

/// 一个像素的颜色：`(red, green, blue)`，序列化为 `[r, g, b]`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub fn red(self) -> u8 {
        self.0
    }

    pub fn green(self) -> u8 {
        self.1
    }

    pub fn blue(self) -> u8 {
        self.2
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self(r, g, b)
    }
}

impl From<Color> for [u8; 3] {
    fn from(color: Color) -> Self {
        color.to_array()
    }
}

/// 切割矩形四个数值的单位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CuttingMode {
    /// 绝对像素，相对画面左上角。
    Pixels,
    /// 画面当前宽/高的百分比（不限制在 0~100）。
    Percentage,
}

/// 从画面中切出一块矩形区域。
///
/// `width` / `height` 可以为负：正值向右/向下延伸，负值向左/向上延伸。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CuttingParameters {
    pub mode: CuttingMode,
    pub from_x: f64,
    pub from_y: f64,
    pub width: f64,
    pub height: f64,
}

impl CuttingParameters {
    pub fn pixels(from_x: f64, from_y: f64, width: f64, height: f64) -> Self {
        Self {
            mode: CuttingMode::Pixels,
            from_x,
            from_y,
            width,
            height,
        }
    }

    pub fn percentage(from_x: f64, from_y: f64, width: f64, height: f64) -> Self {
        Self {
            mode: CuttingMode::Percentage,
            from_x,
            from_y,
            width,
            height,
        }
    }
}

/// 颜色提取的可选配置。
///
/// # 示例
/// ```rust
/// use image_to_colors::{CuttingParameters, ExtractionParameters};
///
/// let params = ExtractionParameters::default()
///     .with_detailing_percentage(40.0)
///     .with_cutting(CuttingParameters::percentage(20.0, 20.0, 60.0, 60.0));
/// assert_eq!(params.detailing_percentage(), 40.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionParameters {
    /// 切割前把图像缩放到原始尺寸的百分比，保持宽高比。
    ///
    /// 仅在来源为图像（而非现成画面）时生效。
    pub detailing_percentage: Option<f64>,
    /// 只提取画面中的某一块；缺省为整幅画面。
    pub cutting_parameters: Option<CuttingParameters>,
    /// 从外部地址加载时不携带任何凭据。
    pub cross_origin_anonymous: bool,
}

impl ExtractionParameters {
    pub fn with_detailing_percentage(mut self, percentage: f64) -> Self {
        self.detailing_percentage = Some(percentage);
        self
    }

    pub fn with_cutting(mut self, cutting: CuttingParameters) -> Self {
        self.cutting_parameters = Some(cutting);
        self
    }

    pub fn with_cross_origin_anonymous(mut self, anonymous: bool) -> Self {
        self.cross_origin_anonymous = anonymous;
        self
    }

    /// 生效的细节百分比（缺省 100）。
    pub fn detailing_percentage(&self) -> f64 {
        self.detailing_percentage
            .unwrap_or(DEFAULT_DETAILING_PERCENTAGE)
    }
}
