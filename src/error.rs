//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `EditorError` 枚举，承载会话层所有失败来源：
//! 本地栅格处理（`RasterError`）、外部协作方（模型、相机）以及会话自身的前置条件。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `RasterError` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，满足前端展示要求。
//! - 所有错误都不自动重试，`code()` 供前端区分文案。

use serde::Serialize;

use crate::raster::RasterError;

/// 会话级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// 本地栅格处理错误（解码 / 编码 / 格式 / 资源限制）
    #[error("{0}")]
    Raster(#[from] RasterError),

    /// 相机不可用或权限被拒绝
    #[error("无法访问相机：{0}")]
    CaptureUnavailable(String),

    /// 外部模型以安全策略拒绝了请求，需要用户修改输入
    #[error("请求被拦截：{0}")]
    RequestBlocked(String),

    /// 额度或频率限制
    #[error("额度已用尽：{0}")]
    QuotaExceeded(String),

    /// 外部模型既没有返回图片也没有返回说明文字
    #[error("模型没有返回图片，请换个描述再试")]
    EmptyResponse,

    #[error("未知错误：{0}")]
    UnknownFailure(String),

    /// 已有请求在进行中
    #[error("已有编辑请求正在处理中")]
    Busy,

    /// 会话中还没有图片
    #[error("请先上传或生成一张图片")]
    NoImage,

    /// 需要文字描述但输入为空
    #[error("{0}")]
    MissingPrompt(&'static str),
}

impl EditorError {
    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Raster(inner) => inner.code(),
            Self::CaptureUnavailable(_) => "capture_unavailable",
            Self::RequestBlocked(_) => "request_blocked",
            Self::QuotaExceeded(_) => "quota_exceeded",
            Self::EmptyResponse => "empty_response",
            Self::UnknownFailure(_) => "unknown_failure",
            Self::Busy => "busy",
            Self::NoImage => "no_image",
            Self::MissingPrompt(_) => "missing_prompt",
        }
    }
}

/// 前端要求返回值实现 `Serialize`。
/// 将错误序列化为人类可读的字符串。
impl Serialize for EditorError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
