use std::{io::BufRead, thread};

use tokio::{
    io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};
use tracing::{debug, warn};

use crate::{
    commands::{Command, Orchestrator, Reply},
    error::CommandError,
};

/// Lines buffered between a blocking reader thread and the command loop.
const LINE_BUFFER: usize = 64;

/// Reads lines from a blocking `reader` on a dedicated OS thread.
///
/// The receiver yields each line and closes at EOF or on a read error. The
/// thread is detached: dropping the receiver never waits for a pending read,
/// so a terminal left open does not hold the process after shutdown.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    let spawned = thread::Builder::new()
        .name("stagevisor-input".into())
        .spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        warn!(%error, "command input read failed");
                        break;
                    }
                }
            }
        });
    if let Err(error) = spawned {
        warn!(%error, "command input thread not started");
    }
    rx
}

/// Reads commands line by line and writes one reply line per command.
///
/// Blank lines are ignored. Unknown input is answered and the loop goes on;
/// only an I/O error or end of input ends it.
pub struct CommandLoop {
    orchestrator: Orchestrator,
}

impl CommandLoop {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    /// Serves commands from `reader` until EOF.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            self.serve(&line, &mut writer).await?;
        }
        debug!("command input closed");
        Ok(())
    }

    /// Serves commands arriving on `lines` until the sender side closes.
    ///
    /// Pairs with [`spawn_line_reader`]; cancelling this future abandons any
    /// read still in progress.
    pub async fn run_lines<W>(
        &self,
        mut lines: mpsc::Receiver<String>,
        mut writer: W,
    ) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(line) = lines.recv().await {
            self.serve(&line, &mut writer).await?;
        }
        debug!("command input closed");
        Ok(())
    }

    async fn serve<W>(&self, line: &str, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let reply = match Command::parse_line(line) {
            Ok(None) => return Ok(()),
            Ok(Some(cmd)) => {
                debug!(command = %cmd, "executing");
                self.orchestrator.execute(cmd).await
            }
            Err(CommandError::Unknown(input)) => {
                warn!(%input, "unknown command");
                Reply::Unknown(input)
            }
        };

        writer.write_all(format!("{reply}\n").as_bytes()).await?;
        writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, core::Pipeline};
    use std::{io::Read, time::Duration};

    /// Blocking reader that never returns, like a terminal nobody types into.
    struct Silent;

    impl Read for Silent {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            loop {
                thread::park();
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_and_unknown_lines() {
        let pipeline = Pipeline::builder(Config::default()).build();
        let cl = CommandLoop::new(Orchestrator::new(pipeline.clone()));

        let mut out = Vec::new();
        cl.run(&b"\n   \nfrobnicate\n"[..], &mut out)
            .await
            .expect("in-memory io");

        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "unknown command: frobnicate\n"
        );
        pipeline.shutdown().await.expect("workers stop");
    }

    #[tokio::test]
    async fn test_line_reader_thread_feeds_loop_until_eof() {
        let pipeline = Pipeline::builder(Config::default()).build();
        let cl = CommandLoop::new(Orchestrator::new(pipeline.clone()));

        let lines = spawn_line_reader(std::io::Cursor::new("bogus\n\nstart\n"));
        let mut out = Vec::new();
        cl.run_lines(lines, &mut out).await.expect("in-memory io");

        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "unknown command: bogus\nexisting upgrade work stopped, ready to upgrade\n"
        );
        pipeline.shutdown().await.expect("workers stop");
    }

    #[tokio::test]
    async fn test_shutdown_is_not_held_by_a_pending_read() {
        let pipeline = Pipeline::builder(Config::default()).build();
        let cl = CommandLoop::new(Orchestrator::new(pipeline.clone()));
        let lines = spawn_line_reader(std::io::BufReader::new(Silent));

        let stopped = tokio::time::timeout(
            Duration::from_secs(5),
            pipeline.run_until(async {
                tokio::select! {
                    _ = cl.run_lines(lines, tokio::io::sink()) => {}
                    _ = tokio::time::sleep(Duration::from_millis(50)) => {}
                }
            }),
        )
        .await;

        assert_eq!(stopped.expect("shutdown not blocked by input"), Ok(()));
    }
}
