//! # 栅格错误模型
//!
//! ## 设计思路
//!
//! 编解码、合成、扩展画布这几条本地栅格链路共用一个错误枚举。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。

/// 栅格处理统一错误类型。
///
/// 在会话层会被上转为 `EditorError`，最终以提示条的形式展示给用户。
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// 字节不是声明媒体类型的合法图片数据。
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}

impl RasterError {
    /// 稳定错误码，供前端按类型区分文案。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Encode(_) => "encode",
            Self::InvalidFormat(_) => "invalid_format",
            Self::ResourceLimit(_) => "resource_limit",
        }
    }
}
