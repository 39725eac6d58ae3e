//! Interactive chat REPL with URL summaries and reply translation.
//!
//! Usage:
//!   ANTHROPIC_API_KEY=sk-... cargo run --example chat
//!   ANTHROPIC_API_KEY=sk-... cargo run --example chat -- --language es
//!   OPENAI_API_KEY=sk-... cargo run --example chat -- --provider openai --model gpt-4o
//!
//! Type "/lang <code>" to switch the reply language, "/langs" to list them.
//! Ctrl-C or type "exit" / "quit" to leave.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::Parser;
use polyglot_chat::{
    render, AnthropicProvider, ChatAssistant, ChatConfig, ChatEvent, InferenceProvider,
    LanguagePreference, OpenAiProvider, LANGUAGES,
};

#[derive(Parser)]
#[command(name = "chat", about = "Chat with URL summaries and translated replies")]
struct Cli {
    /// Provider: "anthropic" or "openai"
    #[arg(long, default_value = "anthropic")]
    provider: String,

    /// Model to use
    #[arg(long, default_value = "claude-sonnet-4-20250514")]
    model: String,

    /// System prompt
    #[arg(long, short = 's')]
    system: Option<String>,

    /// Max output tokens per turn
    #[arg(long, default_value_t = 4096)]
    max_tokens: u32,

    /// Max model turns per message
    #[arg(long, default_value_t = 20)]
    max_turns: usize,

    /// Reply language code
    #[arg(long, short = 'l', default_value = "en")]
    language: String,

    /// API base URL (defaults depend on provider)
    #[arg(long)]
    base_url: Option<String>,
}

fn build_provider(cli: &Cli) -> Arc<dyn InferenceProvider> {
    match cli.provider.as_str() {
        "anthropic" => {
            let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_else(|_| {
                eprintln!("error: ANTHROPIC_API_KEY not set");
                std::process::exit(1);
            });
            let mut p = AnthropicProvider::new(&api_key);
            if let Some(ref url) = cli.base_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        "openai" => {
            let base = cli
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com".into());
            let mut p = OpenAiProvider::new(base);
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                p = p.with_api_key(key);
            }
            Arc::new(p)
        }
        other => {
            eprintln!("error: unknown provider '{other}'. Use 'anthropic' or 'openai'.");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let provider = build_provider(&cli);

    let mut language = LanguagePreference::new();
    if let Err(e) = language.select(&cli.language) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    let config = ChatConfig {
        model: cli.model.clone(),
        max_tokens: cli.max_tokens,
        max_turns: cli.max_turns,
        system_prompt: cli.system.clone(),
        ..ChatConfig::default()
    };
    let mut chat = ChatAssistant::new(provider, config);

    eprintln!("polyglot chat");
    eprintln!("provider: {}", cli.provider);
    eprintln!("model: {}", cli.model);
    eprintln!("language: {}", language.current().display_name);
    for def in chat.tools().registry().definitions() {
        eprintln!("tool: {} ({})", def.name, def.description);
    }
    eprintln!("---");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        eprint!("\x1b[1;36myou>\x1b[0m ");
        io::stderr().flush().ok();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            _ => break,
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed, "exit" | "quit" | "/q") {
            break;
        }
        if trimmed == "/langs" {
            for lang in LANGUAGES {
                eprintln!("  {:<3} {}", lang.code, lang.name);
            }
            continue;
        }
        if let Some(code) = trimmed.strip_prefix("/lang ") {
            match language.select(code) {
                Ok(selected) => eprintln!("\x1b[2m  language: {}\x1b[0m", selected.display_name),
                Err(e) => eprintln!("\x1b[1;31merror:\x1b[0m {e}"),
            }
            continue;
        }

        let (tx, mut rx) = tokio::sync::mpsc::channel::<ChatEvent>(64);

        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    ChatEvent::Text { content } => {
                        eprint!("\x1b[1;32massistant>\x1b[0m ");
                        println!("{content}");
                    }
                    ChatEvent::ToolInvocation(invocation) => {
                        let view = render(&invocation);
                        let color = if view.is_error() { "31" } else { "33" };
                        eprintln!("\x1b[{color}m  [{}]\x1b[0m {view}", invocation.tool_name);
                    }
                    ChatEvent::Translation(translation) => match translation.translated_text {
                        Some(text) => {
                            eprint!("\x1b[1;32m{}>\x1b[0m ", translation.target_language_code);
                            println!("{text}");
                        }
                        None => eprintln!(
                            "\x1b[31m  [translation failed]\x1b[0m {}",
                            translation.translation_error.unwrap_or_default()
                        ),
                    },
                    ChatEvent::Finished { turns } => {
                        if turns > 1 {
                            eprintln!("\x1b[2m  ({turns} turns)\x1b[0m");
                        }
                    }
                    ChatEvent::TurnStart { .. } | ChatEvent::Error { .. } => {}
                }
            }
        });

        match chat.send_streaming(trimmed, language.current(), tx).await {
            Ok(reply) => {
                printer.await.ok();
                eprintln!(
                    "\x1b[2m  [{}in / {}out tokens]\x1b[0m",
                    reply.usage.input_tokens, reply.usage.output_tokens
                );
            }
            Err(e) => {
                printer.await.ok();
                eprintln!("\x1b[1;31merror:\x1b[0m {e}");
            }
        }
    }

    eprintln!("bye.");
}
