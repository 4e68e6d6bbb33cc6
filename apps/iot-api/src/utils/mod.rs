//! 工具模块：响应构造与参数校验

pub mod response;
pub mod validation;

pub use validation::*;
