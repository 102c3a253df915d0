//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载颜色提取链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 除 `OutOfRange` 外，其余分支都属于“加载失败”（来源无法获取或无法解码）。

use super::region::Rectangle;

/// 颜色提取统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    /// 切割区域超出画面范围，不做裁剪也不返回部分结果。
    #[error(
        "切割区域越界：({}, {}, {}, {}) 超出画面 {}x{}",
        rect.x, rect.y, rect.width, rect.height, surface.0, surface.1
    )]
    OutOfRange {
        rect: Rectangle,
        surface: (u32, u32),
    },
}

impl ExtractionError {
    /// 是否为加载阶段（获取或解码外部来源）的失败。
    pub fn is_load_failure(&self) -> bool {
        !matches!(self, Self::OutOfRange { .. })
    }

    /// 稳定的错误码，供命令行或上层调用方做机器判断。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Decode(_) => "decode",
            Self::InvalidFormat(_) => "invalid_format",
            Self::FileSystem(_) => "file_system",
            Self::Timeout(_) => "timeout",
            Self::ResourceLimit(_) => "resource_limit",
            Self::OutOfRange { .. } => "out_of_range",
        }
    }

    /// 出错所在的处理阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Network(_) | Self::FileSystem(_) | Self::Timeout(_) => "load",
            Self::InvalidFormat(_) | Self::Decode(_) | Self::ResourceLimit(_) => "decode",
            Self::OutOfRange { .. } => "extract",
        }
    }
}
