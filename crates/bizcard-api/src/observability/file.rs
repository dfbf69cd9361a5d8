//! 일자별 로그 파일 싱크.
//!
//! 요청 경로에서는 채널에 한 줄을 넣기만 하고, 파일 I/O는 전용 blocking
//! 태스크가 맡습니다. 파일은 첫 기록 시점에 열리며, 날짜(UTC)가 바뀌면 새
//! 파일로 넘어갑니다. 파일 이름: `log-YYYY-MM-DD.log`, 한 줄 형식:
//!
//! ```text
//! 2025-01-31T09:15:02.120Z [ERROR] POST /users/login - Invalid email or password
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::warn;

use super::{LogLevel, ObservabilitySink};

/// 기록 대기열 크기. 가득 차면 새 항목은 버려집니다.
const QUEUE_CAPACITY: usize = 1024;

#[derive(Debug)]
struct LogLine {
    at: DateTime<Utc>,
    level: LogLevel,
    method: String,
    url: String,
    message: String,
}

/// 파일 쓰기 담당. blocking 태스크 하나가 소유합니다.
#[derive(Debug)]
struct DailyFileWriter {
    directory: PathBuf,
    current: Option<(NaiveDate, File)>,
}

impl DailyFileWriter {
    fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            current: None,
        }
    }

    fn directory(&self) -> &Path {
        &self.directory
    }

    /// 해당 날짜의 로그 파일 경로.
    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.directory
            .join(format!("log-{}.log", date.format("%Y-%m-%d")))
    }

    fn write_line(&mut self, line: &LogLine) -> io::Result<()> {
        let today = line.at.date_naive();
        let is_current = matches!(&self.current, Some((date, _)) if *date == today);
        if !is_current {
            fs::create_dir_all(&self.directory)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.path_for(today))?;
            self.current = Some((today, file));
        }

        if let Some((_, file)) = self.current.as_mut() {
            writeln!(
                file,
                "{} [{}] {} {} - {}",
                line.at.to_rfc3339_opts(SecondsFormat::Millis, true),
                line.level,
                line.method,
                line.url,
                line.message
            )?;
        }
        Ok(())
    }
}

/// 추가 전용 일자별 파일 싱크.
///
/// 모든 핸들이 drop되면 기록 태스크는 남은 줄을 쓰고 종료합니다.
#[derive(Debug, Clone)]
pub struct DailyFileSink {
    tx: mpsc::Sender<LogLine>,
}

impl DailyFileSink {
    /// 기록 태스크를 띄웁니다. tokio 런타임 안에서 호출해야 합니다.
    pub fn spawn(directory: impl Into<PathBuf>) -> (Self, JoinHandle<()>) {
        let mut writer = DailyFileWriter::new(directory);
        let (tx, mut rx) = mpsc::channel::<LogLine>(QUEUE_CAPACITY);

        let handle = tokio::task::spawn_blocking(move || {
            while let Some(line) = rx.blocking_recv() {
                if let Err(e) = writer.write_line(&line) {
                    warn!(
                        directory = %writer.directory().display(),
                        error = %e,
                        "Failed to write audit log"
                    );
                }
            }
        });

        (Self { tx }, handle)
    }
}

impl ObservabilitySink for DailyFileSink {
    fn record(&self, level: LogLevel, method: &str, url: &str, message: &str) {
        let line = LogLine {
            at: Utc::now(),
            level,
            method: method.to_string(),
            url: url.to_string(),
            message: message.to_string(),
        };

        match self.tx.try_send(line) {
            Ok(()) => {}
            Err(TrySendError::Full(line)) => {
                warn!(method = %line.method, url = %line.url, "Audit log queue full, entry dropped");
            }
            Err(TrySendError::Closed(line)) => {
                warn!(method = %line.method, url = %line.url, "Audit log writer stopped, entry dropped");
            }
        }
    }
}
