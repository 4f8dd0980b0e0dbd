// apps/tw_cli/src/commands/mod.rs

//! 命令实现

pub mod run;
pub mod validate;
