//! 聊天消息扇出系统核心领域模型
//!
//! 包含消息实体、标识类型、输入校验规则以及 HTML 转义。
//! 这里的代码都是纯函数或不可变数据，不涉及 I/O。

pub mod business_rules;
pub mod errors;
pub mod message;
pub mod sanitizer;
pub mod value_objects;

// 重新导出常用类型
pub use business_rules::*;
pub use errors::*;
pub use message::*;
pub use sanitizer::*;
pub use value_objects::*;
