//! JSON字段提取演示工具库
//!
//! 提供字段提取、可选字段枚举、打字动画与实时（OpenAI）提取编排
//! 遵循MVVM架构模式：model 为纯状态与逻辑，UI 只负责绑定

pub mod config;
pub mod model;
pub mod service;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use config::AppConfig;
pub use model::data_core::{AppError, AppState, ExtractionMode, LiveRequest, LiveStatus};
pub use model::extractor::{extract_fields, format_extracted_fields, ExtractedPair};
pub use model::field_paths::enumerate_fields;
pub use model::typing::{AnimatorState, TypingAnimator, TypingConfig};
