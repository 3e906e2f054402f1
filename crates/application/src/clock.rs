use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定时间，测试用
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// 把当前时间格式化为展示字符串
///
/// 所有事件里的 `time` 字段都来自这里，按配置的时区和格式输出。
#[derive(Clone)]
pub struct DisplayClock {
    clock: Arc<dyn Clock>,
    timezone: Tz,
    format: String,
}

impl DisplayClock {
    pub fn new(clock: Arc<dyn Clock>, timezone: Tz, format: impl Into<String>) -> Self {
        Self {
            clock,
            timezone,
            format: format.into(),
        }
    }

    pub fn stamp(&self) -> String {
        self.clock
            .now()
            .with_timezone(&self.timezone)
            .format(&self.format)
            .to_string()
    }
}
