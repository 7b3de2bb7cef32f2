//! 设备调试日志。
//!
//! 按设备开启的交互日志：配置存于 `devdebug:cfg:<device_id>`，
//! 日志以新在前的定长列表存于 `devdebug:logs:<device_id>`。
//! 写入是尽力而为的，未开启或已过期时直接跳过。

mod entry;
mod sink;

pub use entry::{DebugLogEntry, LogAction, LogDirection, LogOutcome};
pub use sink::{Clock, DebugConfig, DebugLogError, DebugLogSink, config_key, logs_key};
