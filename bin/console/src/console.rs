//! Console surface and read loop.

use async_trait::async_trait;
use chat_relay_core::SessionKey;
use chat_relay_router::{
    EventKind, InboundEvent, MessageRouter, ReplySurface, SurfaceError, TextFormat,
};
use rootcause::prelude::Report;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

pub const WELCOME: &str =
    "Welcome to AI Chat! Type 'exit' to quit, 'clear' to delete your chat history.";
const PROMPT: &str = "You: ";

/// One line of console input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Exit,
    Blank,
    Event(EventKind),
}

impl ConsoleInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            Self::Blank
        } else if line.eq_ignore_ascii_case("exit") {
            Self::Exit
        } else if line.eq_ignore_ascii_case("clear") {
            Self::Event(EventKind::Clear)
        } else {
            Self::Event(EventKind::Message(line.to_string()))
        }
    }
}

/// Writes replies to the terminal.
pub struct ConsoleSurface<W> {
    out: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> ConsoleSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write(&self, text: &str) -> std::io::Result<()> {
        let mut out = self.out.lock().await;
        out.write_all(text.as_bytes()).await?;
        out.flush().await
    }

    async fn write_line(&self, text: &str) -> Result<(), Report<SurfaceError>> {
        self.write(&format!("{text}\n"))
            .await
            .map_err(|e| {
                SurfaceError::Delivery {
                    reason: e.to_string(),
                }
                .into()
            })
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ReplySurface for ConsoleSurface<W> {
    async fn send(&self, text: &str, _format: TextFormat) -> Result<(), Report<SurfaceError>> {
        self.write_line(&format!("AI: {text}")).await
    }

    async fn notify(&self, text: &str) -> Result<(), Report<SurfaceError>> {
        self.write_line(text).await
    }
}

/// Reads lines until `exit` or end of input, routing each through `router`.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read or written.
pub async fn run<R, W>(
    router: &MessageRouter,
    input: R,
    surface: &ConsoleSurface<W>,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send,
{
    let mut lines = input.lines();
    surface.write(&format!("{WELCOME}\n")).await?;

    loop {
        surface.write(PROMPT).await?;
        let Some(line) = lines.next_line().await? else {
            surface.write("\n").await?;
            return Ok(());
        };

        match ConsoleInput::parse(&line) {
            ConsoleInput::Exit => return Ok(()),
            ConsoleInput::Blank => continue,
            ConsoleInput::Event(kind) => {
                let event = InboundEvent::new(SessionKey::Console, kind);
                router.handle(event, surface).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_relay_ai::{CompletionBackend, CompletionFailure};
    use chat_relay_conversation::{FileTranscriptStore, SessionManager, Turn};
    use chat_relay_router::RouterSettings;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct EchoBackend;

    #[async_trait]
    impl CompletionBackend for EchoBackend {
        async fn complete(&self, turns: &[Turn]) -> Result<String, CompletionFailure> {
            let last = turns.last().map(|t| t.content.clone()).unwrap_or_default();
            Ok(format!("echo {last}"))
        }
    }

    fn router(dir: &TempDir) -> MessageRouter {
        let store = FileTranscriptStore::new(dir.path().to_path_buf());
        let sessions = Arc::new(SessionManager::new(Arc::new(store), "persona"));
        MessageRouter::new(sessions, Arc::new(EchoBackend), RouterSettings::default())
    }

    async fn run_script(dir: &TempDir, script: &'static [u8]) -> String {
        let surface = ConsoleSurface::new(Vec::new());
        run(&router(dir), script, &surface).await.expect("run");
        String::from_utf8(surface.into_inner()).expect("utf8")
    }

    #[test]
    fn parses_console_commands() {
        assert_eq!(ConsoleInput::parse("exit"), ConsoleInput::Exit);
        assert_eq!(ConsoleInput::parse("Exit\r\n"), ConsoleInput::Exit);
        assert_eq!(
            ConsoleInput::parse("CLEAR"),
            ConsoleInput::Event(EventKind::Clear)
        );
        assert_eq!(ConsoleInput::parse("   "), ConsoleInput::Blank);
        assert_eq!(
            ConsoleInput::parse("exit now"),
            ConsoleInput::Event(EventKind::Message("exit now".to_string()))
        );
    }

    #[tokio::test]
    async fn session_round_trip() {
        let dir = TempDir::new().expect("tempdir");

        let output = run_script(&dir, b"hello\n\nclear\nclear\nEXIT\nnever read\n").await;

        assert_eq!(
            output,
            format!(
                "{WELCOME}\nYou: AI: echo hello\nYou: You: Chat history has been cleared!\n\
                 You: Chat history is already empty!\nYou: "
            )
        );
        assert!(!dir.path().join("user.json").exists());
    }

    #[tokio::test]
    async fn end_of_input_stops_loop() {
        let dir = TempDir::new().expect("tempdir");
        let output = run_script(&dir, b"hi").await;

        assert!(output.ends_with("AI: echo hi\nYou: \n"));
        assert!(dir.path().join("user.json").exists());
    }
}
