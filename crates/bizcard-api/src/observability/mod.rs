//! 요청 실패 관측.
//!
//! 핸들러는 실패를 직접 기록하지 않습니다. [`ApiError`](crate::error::ApiError)가
//! 응답에 [`FailureNote`]를 붙이고, [`record_failures`] 미들웨어가 요청의
//! 메서드/URL과 함께 [`ObservabilitySink`]로 넘깁니다.

mod file;

pub use file::DailyFileSink;

use std::fmt;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};

/// 기록 레벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// 응답 확장에 실리는 실패 정보.
#[derive(Debug, Clone)]
pub struct FailureNote {
    pub level: LogLevel,
    pub message: String,
}

/// 관측 싱크. 기록 실패는 호출자에게 전파하지 않습니다.
pub trait ObservabilitySink: Send + Sync {
    fn record(&self, level: LogLevel, method: &str, url: &str, message: &str);
}

/// `tracing`으로만 내보내는 싱크 (감사 파일 비활성화 시).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn record(&self, level: LogLevel, method: &str, url: &str, message: &str) {
        match level {
            LogLevel::Info => info!(method, url, "{message}"),
            LogLevel::Warn => warn!(method, url, "{message}"),
            LogLevel::Error => error!(method, url, "{message}"),
        }
    }
}

/// 기록된 항목.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkEntry {
    pub level: LogLevel,
    pub method: String,
    pub url: String,
    pub message: String,
}

/// 메모리에 쌓아두는 싱크 (테스트용).
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<SinkEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<SinkEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ObservabilitySink for MemorySink {
    fn record(&self, level: LogLevel, method: &str, url: &str, message: &str) {
        let entry = SinkEntry {
            level,
            method: method.to_string(),
            url: url.to_string(),
            message: message.to_string(),
        };
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

/// 실패 응답을 싱크에 기록하는 미들웨어.
pub async fn record_failures(
    State(sink): State<Arc<dyn ObservabilitySink>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let url = request.uri().to_string();

    let response = next.run(request).await;

    if let Some(note) = response.extensions().get::<FailureNote>() {
        sink.record(note.level, &method, &url, &note.message);
    }

    response
}
