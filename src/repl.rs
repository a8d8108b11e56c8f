//! Line-oriented chat loop over any async reader/writer pair

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::error;

use crate::llm::orchestrator::ConversationOrchestrator;

pub const PROMPT: &str = "> ";

const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "bye"];

/// True when `line` asks to end the session
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    EXIT_COMMANDS.iter().any(|cmd| line.eq_ignore_ascii_case(cmd))
}

pub struct Repl<R, W> {
    input: R,
    output: W,
}

impl<R, W> Repl<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read prompts until EOF or an exit command, writing one reply per prompt
    ///
    /// Returns the number of prompts answered. Only I/O errors end the loop
    /// early; a failed model call is reported and the loop carries on.
    pub async fn run(&mut self, orchestrator: &mut ConversationOrchestrator) -> std::io::Result<usize> {
        let mut answered = 0;
        let mut buf = Vec::new();

        loop {
            self.output.write_all(PROMPT.as_bytes()).await?;
            self.output.flush().await?;

            buf.clear();
            if self.input.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            // Terminals in a legacy encoding still get an answer
            let line = String::from_utf8_lossy(&buf);
            let prompt = line.trim();
            if prompt.is_empty() {
                continue;
            }
            if is_exit_command(prompt) {
                break;
            }

            let reply = match orchestrator.respond(prompt).await {
                Ok(reply) => reply,
                Err(e) => {
                    error!(error = %e, "Model request failed");
                    format!("Error: {}", e)
                }
            };
            self.output.write_all(reply.as_bytes()).await?;
            self.output.write_all(b"\n\n").await?;
            answered += 1;
        }

        self.output.write_all(b"\nGoodbye.\n").await?;
        self.output.flush().await?;
        Ok(answered)
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
