//! # 会话配置
//!
//! ## 设计思路
//!
//! 在 `RasterConfig` 之上补充会话层策略：笔刷范围、建议条数、提示条排队方式。
//! 配置可从 JSON 注入，注入后统一走 `validate`，非法值在入口处就被拒绝。

use serde::{Deserialize, Serialize};

use super::NoticePolicy;
use crate::raster::{
    DEFAULT_BRUSH_SIZE, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE, RasterConfig, RasterError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub raster: RasterConfig,
    pub default_brush_size: f32,
    pub min_brush_size: f32,
    pub max_brush_size: f32,
    /// 建议列表最多保留几条。
    pub suggestion_limit: usize,
    pub notice_policy: NoticePolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            raster: RasterConfig::default(),
            default_brush_size: DEFAULT_BRUSH_SIZE,
            min_brush_size: MIN_BRUSH_SIZE,
            max_brush_size: MAX_BRUSH_SIZE,
            suggestion_limit: 3,
            notice_policy: NoticePolicy::Replace,
        }
    }
}

impl EditorConfig {
    /// 从 JSON 解析并校验，缺省字段使用默认值。
    ///
    /// # 示例
    /// ```rust
    /// use magic_canvas::editor::EditorConfig;
    ///
    /// let config = EditorConfig::from_json(r#"{ "suggestion_limit": 2 }"#)?;
    /// assert_eq!(config.suggestion_limit, 2);
    /// assert_eq!(config.default_brush_size, 40.0);
    /// # Ok::<(), magic_canvas::raster::RasterError>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self, RasterError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RasterError::InvalidFormat(format!("解析配置失败：{}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RasterError> {
        self.raster.validate()?;

        if !(self.min_brush_size > 0.0 && self.min_brush_size <= self.max_brush_size) {
            return Err(RasterError::InvalidFormat(format!(
                "笔刷范围无效：{} ~ {}",
                self.min_brush_size, self.max_brush_size
            )));
        }
        if !(self.min_brush_size..=self.max_brush_size).contains(&self.default_brush_size) {
            return Err(RasterError::InvalidFormat(format!(
                "默认笔刷 {} 不在 {} ~ {} 之间",
                self.default_brush_size, self.min_brush_size, self.max_brush_size
            )));
        }
        if !(1..=10).contains(&self.suggestion_limit) {
            return Err(RasterError::InvalidFormat(
                "suggestion_limit 必须在 1~10 之间".to_string(),
            ));
        }

        Ok(())
    }
}
