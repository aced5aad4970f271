use chat_client::cli::{CHAT_URL_ENV, CliError, CliOptions};
use chat_client::render::render_turn;
use chat_client::session::{ChatSession, SubmitRejection};
use chat_client::transport::{ChatTransport, HttpChatTransport};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::error;
use tracing_subscriber::EnvFilter;

const QUIT_COMMANDS: [&str; 2] = ["/quit", "/exit"];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_client=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = match CliOptions::parse(std::env::args().skip(1), std::env::var(CHAT_URL_ENV).ok())
    {
        Ok(options) => options,
        Err(CliError::HelpRequested) => {
            print_usage();
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    let transport = HttpChatTransport::new(options.url);
    if let Err(err) = run_repl(&transport).await {
        error!(error = %err, "chat session ended unexpectedly");
        std::process::exit(1);
    }
}

async fn run_repl(transport: &HttpChatTransport) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session = ChatSession::new();

    stdout
        .write_all(
            format!(
                "Talking to Koa at {}. Type a message, or /quit to leave.\n",
                transport.url()
            )
            .as_bytes(),
        )
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        if QUIT_COMMANDS.contains(&line.trim()) {
            break;
        }

        session.set_input(line);
        let pending = match session.begin_submit() {
            Ok(pending) => pending,
            Err(SubmitRejection::EmptyInput) => continue,
            Err(SubmitRejection::Busy) => {
                stdout.write_all(b"koa is still replying...\n").await?;
                continue;
            }
        };

        if session.is_loading() {
            stdout.write_all(b"koa is thinking...\n").await?;
            stdout.flush().await?;
        }

        let result = transport.send(&pending.messages).await;
        session.complete_submit(result);

        if let Some(turn) = session.last_turn() {
            stdout
                .write_all(format!("{}\n\n", render_turn(turn)).as_bytes())
                .await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

fn print_usage() {
    eprintln!(
        "Usage: koa-chat [--url <chat endpoint>]\n\
         \n\
         Options:\n\
         - --url   Chat endpoint (default: $KOA_CHAT_URL or http://127.0.0.1:8080/api/chat)\n\
         - --help  Show this help text"
    );
}
