//! # 切割区域解析模块
//!
//! ## 设计思路
//!
//! 把调用方的切割参数（缺省 / 像素矩形 / 百分比矩形）与画面当前尺寸，
//! 换算成一个具体的矩形。换算本身是纯函数，不做裁剪、不做越界校验。
//!
//! ## 实现思路
//!
//! 1. `resolve`：按模式换算出浮点矩形 `Rectangle`（百分比按 `v / 100 * 尺寸`）
//! 2. `Rectangle::to_pixel_rect`：按像素读取的规则落到整数窗口
//!    - 四个值各自向零截断
//!    - 负宽/高表示向左/向上延伸，翻转为正向矩形
//!    - 零面积直接返回 `None`（结果为空列表）
//!    - 任何部分越出画面即报 `OutOfRange`，不做裁剪

use serde::Serialize;

use super::error::ExtractionError;
use super::params::{CuttingMode, CuttingParameters};

/// 解析后的矩形（像素单位，尚未截断）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 画面内的整数读取窗口，已翻转为正向。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// 窗口内的像素总数。
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Rectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 按像素读取规则把矩形落到画面内的整数窗口。
    ///
    /// 零面积返回 `Ok(None)`；越界返回 `OutOfRange`。
    pub fn to_pixel_rect(
        &self,
        surface_width: u32,
        surface_height: u32,
    ) -> Result<Option<PixelRect>, ExtractionError> {
        let (x, width) = normalize_span(self.x, self.width);
        let (y, height) = normalize_span(self.y, self.height);

        if width == 0 || height == 0 {
            return Ok(None);
        }

        let fits_x = x >= 0 && x.saturating_add(width) <= i64::from(surface_width);
        let fits_y = y >= 0 && y.saturating_add(height) <= i64::from(surface_height);

        if !fits_x || !fits_y {
            return Err(ExtractionError::OutOfRange {
                rect: *self,
                surface: (surface_width, surface_height),
            });
        }

        Ok(Some(PixelRect {
            x: x as u32,
            y: y as u32,
            width: width as u32,
            height: height as u32,
        }))
    }
}

/// 把切割参数换算为当前画面上的矩形。
pub fn resolve(
    surface_width: u32,
    surface_height: u32,
    cutting: Option<&CuttingParameters>,
) -> Rectangle {
    let width = f64::from(surface_width);
    let height = f64::from(surface_height);

    match cutting {
        None => Rectangle::new(0.0, 0.0, width, height),
        Some(cut) => match cut.mode {
            CuttingMode::Pixels => Rectangle::new(cut.from_x, cut.from_y, cut.width, cut.height),
            CuttingMode::Percentage => Rectangle::new(
                (cut.from_x / 100.0) * width,
                (cut.from_y / 100.0) * height,
                (cut.width / 100.0) * width,
                (cut.height / 100.0) * height,
            ),
        },
    }
}

/// 截断起点与跨度；负跨度翻转为从 `origin + extent` 开始的正跨度。
fn normalize_span(origin: f64, extent: f64) -> (i64, i64) {
    let origin = origin as i64;
    let extent = extent as i64;

    if extent < 0 {
        (origin.saturating_add(extent), extent.saturating_neg())
    } else {
        (origin, extent)
    }
}
