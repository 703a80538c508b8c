use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{
    AsyncBufReadExt,
    AsyncRead,
    BufReader,
};
use tokio::sync::{
    Mutex,
    mpsc,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{
    debug,
    warn,
};

use super::Interaction;
use crate::error::{
    Error,
    Result,
};
use crate::protocol::QuestionPayload;

pub const DEFAULT_ANSWER_TIMEOUT: Duration = Duration::from_secs(30);

/// A console-backed [Interaction].
///
/// A background reader task decouples "wait for input" from "detect
/// cancellation/timeout": `ask` races cancellation, a fixed wait ceiling, and
/// input arrival, and whichever resolves first wins. Empty (trimmed) lines
/// are rejected with a re-prompt and never delivered.
#[derive(Debug)]
pub struct TerminalInteraction {
    input_rx: Mutex<mpsc::Receiver<String>>,
    answer_timeout: Duration,
    reader: JoinHandle<()>,
}

impl TerminalInteraction {
    /// Reads answers from standard input.
    pub fn stdin(cancel: &CancellationToken) -> Self {
        Self::new(cancel, tokio::io::stdin())
    }

    pub fn new<R>(cancel: &CancellationToken, source: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self::with_timeout(cancel, source, DEFAULT_ANSWER_TIMEOUT)
    }

    pub fn with_timeout<R>(cancel: &CancellationToken, source: R, answer_timeout: Duration) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let (input_tx, input_rx) = mpsc::channel(1);
        let reader = tokio::spawn(read_loop(source, input_tx, cancel.clone()));
        Self {
            input_rx: Mutex::new(input_rx),
            answer_timeout,
            reader,
        }
    }
}

#[async_trait]
impl Interaction for TerminalInteraction {
    async fn ask(&self, cancel: &CancellationToken, question: &QuestionPayload) -> Result<String> {
        println!("{}", question.question);
        if !question.choices.is_empty() {
            for choice in &question.choices {
                println!("{choice}");
            }
            println!();
        }

        let mut input_rx = self.input_rx.lock().await;
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = tokio::time::sleep(self.answer_timeout) => Err(Error::Timeout),
            line = input_rx.recv() => match line {
                Some(line) => {
                    debug!("received an answer from the terminal");
                    Ok(line)
                },
                None => Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "terminal input closed",
                ))),
            },
        }
    }
}

impl Drop for TerminalInteraction {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop<R>(source: R, input_tx: mpsc::Sender<String>, cancel: CancellationToken)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let mut lines = BufReader::new(source).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    println!("Please provide a non-empty answer");
                    continue;
                }
                if input_tx.send(line).await.is_err() {
                    break;
                }
            },
            Ok(None) => {
                debug!("terminal input reached EOF");
                break;
            },
            Err(err) => {
                warn!(%err, "failed reading from the terminal");
                break;
            },
        }
    }
}
