//! VM桥接层：连接Slint UI与AppState数据模型
//!
//! 注意：此模块的具体实现在main.rs中，因为依赖于Slint生成的类型
//! 这里只提供公共常量与纯文本格式化

use crate::model::data_core::{ExtractionMode, LiveStatus};

// === 常量定义（消除魔法值） ===
pub const STATUS_READY: &str = "就绪";
pub const STATUS_COPIED: &str = "已复制到剪贴板";
pub const STATUS_ERROR_PREFIX: &str = "错误: ";

pub const LABEL_CHOOSE_FILE: &str = "Choose JSON File";
pub const LABEL_PENDING: &str = "AI is analyzing the JSON data...";

/// UI 动画刷新间隔（约一帧）
pub const TICK_INTERVAL_MS: u64 = 16;

/// 文件按钮文字
pub fn file_label(file_name: Option<&str>) -> String {
    match file_name {
        Some(name) => format!("Selected: {}", name),
        None => LABEL_CHOOSE_FILE.to_string(),
    }
}

/// 模式切换按钮文字
pub fn mode_button_label(mode: ExtractionMode) -> &'static str {
    match mode {
        ExtractionMode::Simulated => "Using Simulation",
        ExtractionMode::Live => "Using OpenAI",
    }
}

/// 输出面板标题
pub fn output_title(mode: ExtractionMode) -> &'static str {
    match mode {
        ExtractionMode::Simulated => "AI Agent Extraction (Simulation)",
        ExtractionMode::Live => "AI Agent Extraction (OpenAI API)",
    }
}

/// 实时模式下的错误行（无错误时为空）
pub fn live_error_line(status: &LiveStatus) -> String {
    match status {
        LiveStatus::Failed(message) => format!("Error: {}", message),
        _ => String::new(),
    }
}

/// 勾选摘要：“Selected: a, b, c”
pub fn selection_summary(fields: &[String]) -> String {
    format!("Selected: {}", fields.join(", "))
}
