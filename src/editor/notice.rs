//! # 提示条
//!
//! 同一时间只展示一条错误提示。新错误按策略替换当前提示，或排在其后，
//! 用户关闭当前提示后再出现下一条。

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EditorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticePolicy {
    Replace,
    Queue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub code: &'static str,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn from_error(error: &EditorError) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
            raised_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoticeBoard {
    policy: NoticePolicy,
    current: Option<Notice>,
    pending: VecDeque<Notice>,
}

impl NoticeBoard {
    pub fn new(policy: NoticePolicy) -> Self {
        Self {
            policy,
            current: None,
            pending: VecDeque::new(),
        }
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn raise(&mut self, error: &EditorError) {
        let notice = Notice::from_error(error);
        log::warn!("⚠️ [{}] {}", notice.code, notice.message);

        match (self.policy, self.current.is_some()) {
            (NoticePolicy::Queue, true) => self.pending.push_back(notice),
            _ => self.current = Some(notice),
        }
    }

    /// 关闭当前提示，排队中的下一条（如有）随即显示。
    pub fn dismiss(&mut self) {
        self.current = self.pending.pop_front();
    }

    /// 新操作开始前清空全部提示。
    pub fn clear(&mut self) {
        self.current = None;
        self.pending.clear();
    }
}
