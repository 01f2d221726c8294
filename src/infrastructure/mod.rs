//! 基础设施层
//!
//! 持有稀缺资源（浏览器 / 页面），只暴露能力，不处理业务流程

pub mod browser_session;
pub mod element_locator;

pub use browser_session::BrowserSession;
pub use element_locator::{locate, LocatedElement, MatchRule};
