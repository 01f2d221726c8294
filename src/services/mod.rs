//! 业务能力层
//!
//! 描述"我能做什么"，只处理单个题目，不关心流程顺序

pub mod answer_parser;
pub mod extractor;
pub mod injector;
pub mod prompt;
pub mod reasoning;

pub use reasoning::ReasoningClient;
