//! flowwrite CLI: inspect workflows and talk to providers from a terminal.
//!
//! Usage:
//!   flowwrite-cli order <workflow.json>              Print the execution order
//!   flowwrite-cli validate <workflow.json>           Report workflow problems
//!   flowwrite-cli providers                          List the capability matrix
//!   flowwrite-cli chat <provider> <prompt> [opts]    Stream one chat completion
//!   flowwrite-cli workflows [list|show <id>|import <file>|delete <id>]

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use flowwrite::store::FileStore;
use flowwrite::types::{build_chat_request, FimCompletionRequest, StreamAccumulator};
use flowwrite::client::fim_completion_stream;
use flowwrite::{validate_workflow, ChatMessage, ClientBuilder, ProviderType, WorkflowDefinition};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "order" => cmd_order(&args[2..]).await,
        "validate" => cmd_validate(&args[2..]).await,
        "providers" => cmd_providers(),
        "chat" => cmd_chat(&args[2..]).await,
        "fim" => cmd_fim(&args[2..]).await,
        "workflows" => cmd_workflows(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("flowwrite-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"flowwrite-cli: workflow and provider tooling

USAGE:
    flowwrite-cli <COMMAND> [OPTIONS]

COMMANDS:
    order <workflow.json>               Print the execution order of a workflow
    validate <workflow.json>            Report errors and warnings for a workflow
    providers                           List known providers and capabilities
    chat <provider> <prompt> [OPTIONS]  Stream a chat completion
        --model <name>  --base-url <url>  --system <text>  --no-stream
    fim <provider> <prompt> [--suffix <text>] [--model <name>] [--base-url <url>]
                                        Fill-in-middle completion
    workflows list                      List stored workflows
    workflows show <id>                 Print a stored workflow
    workflows import <workflow.json>    Store a workflow document
    workflows delete <id>               Remove a stored workflow
    version                             Show version information
    help                                Show this help message

ENVIRONMENT:
    RUST_LOG                            Log filter (default: info)
    FLOWWRITE_STORE_DIR                 Document store root (default: ./.flowwrite)
    FLOWWRITE_HTTP_TIMEOUT_SECS         Request / stream idle timeout in seconds (default: 60)
    FLOWWRITE_PROXY_URL                 Proxy for all provider traffic
    <PROVIDER>_API_KEY                  API key when none is in the OS keyring"#
    );
}

/// Value following `--name`, if present.
fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

async fn read_workflow(path: &str) -> Result<WorkflowDefinition> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {path}"))?;
    WorkflowDefinition::from_json(&data).with_context(|| format!("parsing {path}"))
}

async fn open_store() -> Result<FileStore> {
    let root = std::env::var("FLOWWRITE_STORE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".flowwrite"));
    FileStore::open(&root)
        .await
        .with_context(|| format!("opening store at {}", root.display()))
}

async fn cmd_order(args: &[String]) -> Result<()> {
    let Some(path) = args.first() else {
        bail!("usage: flowwrite-cli order <workflow.json>");
    };
    let workflow = read_workflow(path).await?;
    let order = workflow.resolve()?;
    for (i, id) in order.iter().enumerate() {
        let name = workflow.node(id).map(|n| n.name.as_str()).unwrap_or("?");
        println!("{:>3}. {}  ({})", i + 1, name, id);
    }
    Ok(())
}

async fn cmd_validate(args: &[String]) -> Result<()> {
    let Some(path) = args.first() else {
        bail!("usage: flowwrite-cli validate <workflow.json>");
    };
    let workflow = read_workflow(path).await?;
    let report = validate_workflow(&workflow);
    for e in &report.errors {
        println!("error:   {e}");
    }
    for w in &report.warnings {
        println!("warning: {w}");
    }
    if report.is_valid() {
        println!("✓ {} ({} nodes) is valid", workflow.name, workflow.nodes.len());
        Ok(())
    } else {
        bail!("{} error(s) found", report.errors.len())
    }
}

fn cmd_providers() -> Result<()> {
    println!(
        "{:<10} {:<28} {:<8} {:<5} {:<7} {}",
        "ID", "BASE URL", "THINK", "FIM", "PREFIX", "MODELS"
    );
    for p in ProviderType::ALL {
        let c = p.config();
        let yes_no = |b: bool| if b { "yes" } else { "no" };
        println!(
            "{:<10} {:<28} {:<8} {:<5} {:<7} {}",
            p.id(),
            if c.base_url.is_empty() { "(any)" } else { c.base_url.as_str() },
            yes_no(c.supports_thinking_mode),
            yes_no(c.supports_fim),
            yes_no(c.supports_prefix_completion),
            if c.models.is_empty() { "(any)".to_string() } else { c.models.join(", ") }
        );
    }
    Ok(())
}

fn builder_from_args(provider: &str, args: &[String]) -> Result<ClientBuilder> {
    let provider: ProviderType = provider.parse()?;
    let mut builder = ClientBuilder::new(provider);
    if let Some(model) = flag(args, "--model") {
        builder = builder.model(model);
    }
    if let Some(url) = flag(args, "--base-url") {
        builder = builder.base_url(url);
    }
    Ok(builder)
}

async fn cmd_chat(args: &[String]) -> Result<()> {
    let (Some(provider), Some(prompt)) = (args.first(), args.get(1)) else {
        bail!("usage: flowwrite-cli chat <provider> <prompt> [--model <name>] [--base-url <url>] [--system <text>] [--no-stream]");
    };
    let builder = builder_from_args(provider, &args[2..])?;
    let model = builder.settings().effective_model().to_string();
    let client = builder.build()?;

    let mut messages = Vec::new();
    if let Some(system) = flag(args, "--system") {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(prompt.as_str()));
    let request = build_chat_request(messages, model);

    if has_flag(args, "--no-stream") {
        let response = client.chat_completion(&request).await?;
        if let Some(reasoning) = flowwrite::types::extract_reasoning_content(&response) {
            eprintln!("[reasoning]\n{reasoning}\n");
        }
        println!("{}", flowwrite::types::extract_content(&response));
        return Ok(());
    }

    let (mut stream, cancel) = client.chat_completion_stream_with_cancel(&request).await?;
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut stdout = std::io::stdout();
    let mut acc = StreamAccumulator::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if let Some(text) = chunk.content_delta() {
            emit(&mut stdout, text)?;
        }
        acc.push(&chunk);
    }
    ctrl_c.abort();
    println!();

    let done = acc.finish();
    if let Some(usage) = done.usage {
        eprintln!(
            "[{} prompt + {} completion = {} tokens]",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        );
    }
    Ok(())
}

/// Streamed text must reach the terminal as it arrives, not at line breaks.
fn emit(out: &mut impl Write, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

async fn cmd_fim(args: &[String]) -> Result<()> {
    let (Some(provider), Some(prompt)) = (args.first(), args.get(1)) else {
        bail!("usage: flowwrite-cli fim <provider> <prompt> [--suffix <text>] [--model <name>] [--base-url <url>]");
    };
    let builder = builder_from_args(provider, &args[2..])?;
    let model = builder.settings().effective_model().to_string();
    let client = builder.build()?;

    let mut request = FimCompletionRequest::new(model, prompt.as_str()).max_tokens(256);
    if let Some(suffix) = flag(args, "--suffix") {
        request = request.suffix(suffix);
    }

    let mut stream = fim_completion_stream(client.as_ref(), &request).await?;
    let mut stdout = std::io::stdout();
    while let Some(piece) = stream.next().await {
        emit(&mut stdout, &piece?.text)?;
    }
    println!();
    Ok(())
}

async fn cmd_workflows(args: &[String]) -> Result<()> {
    let store = open_store().await?;
    match args.first().map(String::as_str).unwrap_or("list") {
        "list" => {
            let summaries = store.list_workflows().await?;
            if summaries.is_empty() {
                println!("(no workflows)");
            }
            for s in summaries {
                println!("{}  {}  (updated {})", s.id, s.name, s.updated_at);
            }
        }
        "show" => {
            let id = args.get(1).context("usage: flowwrite-cli workflows show <id>")?;
            let workflow = store
                .load_workflow(id)
                .await?
                .with_context(|| format!("no workflow with id {id}"))?;
            println!("{}", serde_json::to_string_pretty(&workflow)?);
        }
        "import" => {
            let path = args
                .get(1)
                .context("usage: flowwrite-cli workflows import <workflow.json>")?;
            let workflow = read_workflow(path).await?;
            let summary = store.save_workflow(&workflow).await?;
            println!("stored {} ({})", summary.name, summary.id);
        }
        "delete" => {
            let id = args.get(1).context("usage: flowwrite-cli workflows delete <id>")?;
            if !store.delete_workflow(id).await? {
                bail!("no workflow with id {id}");
            }
            println!("deleted {id}");
        }
        other => bail!("unknown workflows subcommand: {other}"),
    }
    Ok(())
}
