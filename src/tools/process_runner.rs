use log::{debug, warn};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// 輪詢子程序狀態的間隔
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    #[must_use]
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("無法執行 {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} 執行逾時（{}s）", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
    #[error("無法取得 {program} 的執行狀態: {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },
}

/// 執行外部程式並收集輸出，逾時則終止程序
///
/// stdout/stderr 由背景執行緒讀取，避免管線緩衝區滿時程序卡住。
pub fn run_with_timeout(
    mut command: Command,
    timeout: Option<Duration>,
) -> Result<CommandOutput, CommandError> {
    let program = command.get_program().to_string_lossy().to_string();
    debug!("執行: {command:?}");

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|source| CommandError::Spawn {
        program: program.clone(),
        source,
    })?;

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let status = wait_for_exit(&mut child, &program, timeout)?;

    Ok(CommandOutput {
        status,
        stdout: join_reader(stdout_reader),
        stderr: join_reader(stderr_reader),
    })
}

fn wait_for_exit(
    child: &mut Child,
    program: &str,
    timeout: Option<Duration>,
) -> Result<ExitStatus, CommandError> {
    let Some(timeout) = timeout else {
        return child.wait().map_err(|source| CommandError::Wait {
            program: program.to_string(),
            source,
        });
    };

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                warn!("{program} 執行逾時，終止程序 [{}]", child.id());
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::TimedOut {
                    program: program.to_string(),
                    timeout,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                let _ = child.kill();
                return Err(CommandError::Wait {
                    program: program.to_string(),
                    source,
                });
            }
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = pipe.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
