//! 类型系统模块：会话消息与函数调用的核心数据类型。
//!
//! # Types Module
//!
//! Core data types shared by every stage of a turn.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | One entry of the append-only conversation log |
//! | [`MessageRole`] | user, assistant, function or system |
//! | [`AssistantTurn`] | Normalized output of one completion call |
//! | [`FunctionDefinition`] | Projected callable-function schema |
//! | [`CallIntent`] | `{name, arguments}` recovered from model output |
//! | [`DispatchResult`] | Text payload produced by executing a call intent |

pub mod message;
pub mod tool;

pub use message::{AssistantTurn, Message, MessageRole};
pub use tool::{CallIntent, CapabilityCategory, DispatchResult, FunctionDefinition};
