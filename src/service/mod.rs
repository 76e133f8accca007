//! 外部服务协作者

pub mod openai;
