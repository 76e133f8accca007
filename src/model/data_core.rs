//! AppState：应用核心状态与提取编排
//!
//! 持有当前 JSON、可选字段、勾选字段与提取模式；所有变化都通过显式的
//! 状态转换函数完成，结果交给打字动画展示。失败一律在此转换为
//! 通知或局部错误状态，不向上层抛出未处理的故障。

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::Rng;
use serde_json::Value;
use thiserror::Error;

use crate::config::AppConfig;
use crate::model::extractor::{extract_fields, format_extracted_fields};
use crate::model::field_paths::{default_selection, enumerate_fields, DEFAULT_SELECTION_LEN};
use crate::model::notifications::{Notification, NotificationCenter, NotificationId, Severity};
use crate::model::sample_data::sample_data;
use crate::model::typing::TypingAnimator;
use crate::service::openai::{ExtractionRequest, LiveExtractionError};
use crate::utils::fs::{parse_json_text, read_json_file};

pub const MSG_FILE_LOADED: &str = "JSON file loaded successfully!";
pub const MSG_PARSE_FAILED: &str = "Error parsing JSON file. Please ensure it is a valid JSON file.";
pub const MSG_READ_FAILED: &str = "Error reading file.";
pub const MSG_SELECT_AT_LEAST_ONE: &str = "Please select at least one field to extract";
pub const MSG_NO_FIELDS_ERROR: &str = "Please select JSON data and at least one field to extract.";
pub const OUTPUT_NO_FIELDS: &str = "Error: No data or fields to extract.";
pub const OUTPUT_LIVE_FAILED: &str = "Error: Failed to extract fields using AI";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("状态错误: {0}")]
    State(String),
    #[error("配置错误: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// 本地提取 + 打字动画
    Simulated,
    /// 用户触发后调用外部 LLM
    Live,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveStatus {
    Idle,
    Pending,
    Succeeded,
    Failed(String),
}

/// 一次已登记的实时提取请求；id 用于丢弃过期响应
#[derive(Debug, Clone, PartialEq)]
pub struct LiveRequest {
    pub id: u64,
    pub request: ExtractionRequest,
}

#[derive(Debug)]
pub struct AppState<R = StdRng> {
    pub source_path: Option<PathBuf>,
    json: Value,
    available_fields: Vec<String>,
    target_fields: Vec<String>,
    mode: ExtractionMode,
    live_status: LiveStatus,
    last_request_id: u64,
    outstanding_request: Option<u64>,
    animator: TypingAnimator<R>,
    notifications: NotificationCenter,
}

impl AppState<StdRng> {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_animator(config, TypingAnimator::new(config.typing.clone()))
    }
}

impl<R: Rng> AppState<R> {
    /// 以示例数据启动，默认勾选前五个字段并开始模拟提取
    pub fn with_animator(config: &AppConfig, animator: TypingAnimator<R>) -> Self {
        let mut state = Self {
            source_path: None,
            json: Value::Null,
            available_fields: Vec::new(),
            target_fields: Vec::new(),
            mode: ExtractionMode::Simulated,
            live_status: LiveStatus::Idle,
            last_request_id: 0,
            outstanding_request: None,
            animator,
            notifications: NotificationCenter::new(config.notification_duration_ms),
        };
        state.set_json(sample_data());
        state
    }

    /// 加载JSON文件；失败时只发通知，不改动当前数据
    pub fn load_file(&mut self, p: &Path) -> Result<(), AppError> {
        match read_json_file(p) {
            Ok(v) => {
                self.source_path = Some(p.to_path_buf());
                self.set_json(v);
                self.notifications.push(MSG_FILE_LOADED, Severity::Success);
                tracing::info!("文件加载成功: {}", p.display());
                Ok(())
            }
            Err(e) => {
                self.notify_import_error(&e);
                tracing::error!("文件加载失败 {}: {}", p.display(), e);
                Err(e)
            }
        }
    }

    /// 加载JSON文本（粘贴/拖放内容）
    pub fn load_json_text(&mut self, text: &str) -> Result<(), AppError> {
        match parse_json_text(text) {
            Ok(v) => {
                self.source_path = None;
                self.set_json(v);
                self.notifications.push(MSG_FILE_LOADED, Severity::Success);
                Ok(())
            }
            Err(e) => {
                self.notify_import_error(&e);
                tracing::error!("JSON文本解析失败: {}", e);
                Err(e)
            }
        }
    }

    fn notify_import_error(&mut self, e: &AppError) {
        let message = match e {
            AppError::Parse(_) => MSG_PARSE_FAILED,
            _ => MSG_READ_FAILED,
        };
        self.notifications.push(message, Severity::Error);
    }

    /// 替换数据源：重新枚举字段并重置默认勾选
    pub fn set_json(&mut self, v: Value) {
        self.json = v;
        self.available_fields = enumerate_fields(&self.json);
        tracing::info!("可选字段: {} 个", self.available_fields.len());
        let defaults = default_selection(&self.available_fields);
        self.set_target_fields(defaults);
    }

    /// 更新勾选字段；模拟模式下立即重新提取
    pub fn set_target_fields(&mut self, fields: Vec<String>) {
        if fields.is_empty() {
            self.notifications.push(MSG_SELECT_AT_LEAST_ONE, Severity::Info);
        } else if fields.len() > DEFAULT_SELECTION_LEN {
            self.notifications.push(
                format!("Selected {} fields for extraction", fields.len()),
                Severity::Info,
            );
        }
        self.target_fields = fields;
        self.refresh_simulated();
    }

    /// 勾选框变化：勾选追加到末尾，取消勾选移除
    pub fn toggle_field(&mut self, field: &str, checked: bool) {
        let mut fields = self.target_fields.clone();
        if checked {
            if !fields.iter().any(|f| f == field) {
                fields.push(field.to_string());
            }
        } else {
            fields.retain(|f| f != field);
        }
        self.set_target_fields(fields);
    }

    /// 切换模拟/实时模式
    pub fn toggle_mode(&mut self) {
        self.outstanding_request = None;
        self.live_status = LiveStatus::Idle;
        match self.mode {
            ExtractionMode::Simulated => {
                self.mode = ExtractionMode::Live;
                // 实时模式以空白输出开始，等待用户触发
                self.animator.cancel();
                self.notifications
                    .push("Switched to OpenAI extraction mode", Severity::Info);
            }
            ExtractionMode::Live => {
                self.mode = ExtractionMode::Simulated;
                self.refresh_simulated();
                self.notifications
                    .push("Switched to Simulated extraction mode", Severity::Info);
            }
        }
        tracing::info!("提取模式: {:?}", self.mode);
    }

    /// 模拟模式：同步提取并重新开始打字
    fn refresh_simulated(&mut self) {
        if self.mode != ExtractionMode::Simulated {
            return;
        }
        let pairs = extract_fields(&self.json, &self.target_fields);
        let text = format_extracted_fields(&pairs);
        tracing::debug!("模拟提取命中 {} 项", pairs.len());
        self.animator.start_session(&text);
    }

    /// 用户点击“Extract with OpenAI”：登记请求并进入 Pending
    pub fn begin_live_extraction(&mut self) -> Result<LiveRequest, AppError> {
        if self.mode != ExtractionMode::Live {
            return Err(AppError::State("当前不是实时提取模式".into()));
        }
        if self.outstanding_request.is_some() {
            return Err(AppError::State("已有提取请求在进行中".into()));
        }
        if self.json.is_null() || self.target_fields.is_empty() {
            self.live_status = LiveStatus::Failed(MSG_NO_FIELDS_ERROR.to_string());
            self.animator.start_session(OUTPUT_NO_FIELDS);
            return Err(AppError::State(MSG_NO_FIELDS_ERROR.into()));
        }

        self.last_request_id += 1;
        let id = self.last_request_id;
        self.outstanding_request = Some(id);
        self.live_status = LiveStatus::Pending;
        tracing::info!("实时提取请求 #{}: {:?}", id, self.target_fields);
        Ok(LiveRequest {
            id,
            request: ExtractionRequest {
                selected_fields: self.target_fields.clone(),
                json_data: self.json.clone(),
            },
        })
    }

    /// 外部服务返回；不是当前请求（或已切换模式）时丢弃并返回 false
    pub fn complete_live_extraction(
        &mut self,
        id: u64,
        result: Result<String, LiveExtractionError>,
    ) -> bool {
        if self.mode != ExtractionMode::Live || self.outstanding_request != Some(id) {
            tracing::warn!("丢弃过期的实时提取响应 #{}", id);
            return false;
        }
        self.outstanding_request = None;

        let result = result.and_then(|text| {
            if text.is_empty() {
                Err(LiveExtractionError::EmptyResponse)
            } else {
                Ok(text)
            }
        });
        match result {
            Ok(text) => {
                tracing::info!("实时提取 #{} 成功", id);
                self.live_status = LiveStatus::Succeeded;
                self.animator.start_session(&text);
            }
            Err(e) => {
                tracing::error!("实时提取 #{} 失败: {}", id, e);
                self.live_status = LiveStatus::Failed(e.to_string());
                self.animator.start_session(OUTPUT_LIVE_FAILED);
            }
        }
        true
    }

    /// 推进动画与通知的时钟
    pub fn tick(&mut self, elapsed_ms: u64) {
        self.animator.advance(elapsed_ms);
        self.notifications.advance(elapsed_ms);
    }

    pub fn dismiss_notification(&mut self, id: NotificationId) -> bool {
        self.notifications.dismiss(id)
    }

    pub fn notifications(&self) -> &[Notification] {
        self.notifications.items()
    }

    pub fn json(&self) -> &Value {
        &self.json
    }

    /// JSON 面板展示用（两空格缩进）
    pub fn pretty_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(&self.json)?)
    }

    pub fn available_fields(&self) -> &[String] {
        &self.available_fields
    }

    pub fn target_fields(&self) -> &[String] {
        &self.target_fields
    }

    pub fn is_selected(&self, field: &str) -> bool {
        self.target_fields.iter().any(|f| f == field)
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    pub fn live_status(&self) -> &LiveStatus {
        &self.live_status
    }

    pub fn is_pending(&self) -> bool {
        self.live_status == LiveStatus::Pending
    }

    /// 输出面板当前可见的文本
    pub fn display_text(&self) -> &str {
        self.animator.display()
    }

    /// 当前会话的完整文本（复制用）
    pub fn output_text(&self) -> &str {
        self.animator.source_text()
    }

    pub fn animator(&self) -> &TypingAnimator<R> {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut TypingAnimator<R> {
        &mut self.animator
    }
}
