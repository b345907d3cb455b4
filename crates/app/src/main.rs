use agent_host::{AgentHost, SessionHandle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

mod render;
mod utils;

const HELP: &str = "Type a message to chat. Prefix with ! to run a shell command directly.\n\
/new starts a new chat, /quit exits.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays the transcript
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (settings, source) = utils::load_settings_or_default();
    tracing::info!(?source, "settings loaded");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = AgentHost::new(settings).start(tx)?;

    let render = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            println!("{}", render::format_message(&msg));
        }
    });

    println!("{}", HELP);
    run_repl(BufReader::new(tokio::io::stdin()), handle).await;

    // The session task is gone, so its display sender is closed and the
    // renderer stops after printing what is still queued.
    render.await?;
    Ok(())
}

/// Read commands until EOF or `/quit`, then wait for every submitted message.
///
/// Consumes `handle`; once this returns no handle is left and the session task
/// shuts down.
async fn run_repl<R>(input: R, handle: SessionHandle)
where
    R: AsyncBufRead + Unpin,
{
    let mut pending = JoinSet::new();
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read input");
                break;
            }
        };
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/new" => match handle.reset().await {
                Ok(()) => println!("-- new chat --"),
                Err(e) => {
                    tracing::warn!(error = %e, "reset failed");
                    break;
                }
            },
            text => {
                // Each message is its own unit of work; the session queues them.
                let handle = handle.clone();
                let text = text.to_string();
                pending.spawn(async move {
                    if let Err(e) = handle.submit(text).await {
                        tracing::debug!(error = %e, "message ended with an error");
                    }
                });
            }
        }
    }

    tracing::debug!(pending = pending.len(), "input closed, finishing queued messages");
    while let Some(joined) = pending.join_next().await {
        if let Err(e) = joined {
            tracing::warn!(error = %e, "message task failed");
        }
    }
}
