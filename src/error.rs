//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，命令行入口统一返回 `Result<T, AppError>`，
//! 避免在入口处散落 `.map_err(|e| e.to_string())`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ExtractionError`、I/O、JSON 错误提供 `From` 转换，无需手动 map。

use crate::color_extractor::ExtractionError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 颜色提取流水线错误（加载 / 解码 / 切割）
    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    /// 命令行参数无效
    #[error("参数错误: {0}")]
    InvalidArgument(String),

    /// 输出写入失败
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 结果序列化失败
    #[error("序列化错误: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// 稳定错误码，便于脚本判断失败原因。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Extraction(err) => err.code(),
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}
