use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use llama_feed::ai::{self, ChatGateway, ImageAnalyzer, PostChat};
use llama_feed::config::Config;
use llama_feed::data::{Feed, PostSource};
use llama_feed::model::{Post, Role};
use llama_feed::search::{self, SearchOrchestrator};

#[derive(Parser, Debug)]
#[command(
    name = "llama-feed",
    version,
    about = "Ask a Llama chat model about feed images and posts, and search posts in natural language"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// JSON file with the posts to use instead of the sample feed
    #[arg(short, long, value_name = "FILE", global = true)]
    posts: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config.json and exit
    Init,
    /// Print the description derived from an image URL, without calling the API
    Describe { url: String },
    /// Ask a question about an image
    Ask {
        url: String,
        /// Question (default: a general description request)
        #[arg(default_value = "")]
        question: String,
    },
    /// Ask a question about a post
    Post { id: String, question: String },
    /// Chat about a post interactively (stdin, `exit` to quit)
    Chat { id: String },
    /// Natural-language search over the feed
    Search { query: String },
    /// Show recently viewed posts
    Recent {
        /// Number of posts (default from config)
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Check which AI capabilities are working
    Probe,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    if let Command::Init = cli.command {
        let config = Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        println!(
            "Set llama.api_url and llama.api_key there, or export {} and {}",
            llama_feed::config::ENV_API_URL,
            llama_feed::config::ENV_API_KEY
        );
        return Ok(());
    }

    if let Command::Describe { ref url } = cli.command {
        let description = ai::describe_image_url(url);
        if cli.json {
            print_json(&serde_json::json!({ "url": url, "description": description }))?;
        } else {
            println!("{description}");
        }
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let feed = Feed::open(cli.posts.as_deref())?;
    let gateway =
        Arc::new(ChatGateway::new(&config.llama).context("Failed to set up Llama client")?);
    let analyzer = ImageAnalyzer::new(gateway.clone());

    match cli.command {
        Command::Init | Command::Describe { .. } => {}

        Command::Ask { url, question } => {
            let answer = analyzer.analyze(&url, &question).await;
            if cli.json {
                print_json(&serde_json::json!({
                    "url": url,
                    "question": question,
                    "answer": answer,
                }))?;
            } else {
                println!("{answer}");
            }
        }

        Command::Post { id, question } => {
            let post = find_post(&feed, &id)?;
            let answer = analyzer.analyze_post(post, &question).await;
            if cli.json {
                print_json(&serde_json::json!({
                    "post": id,
                    "question": question,
                    "answer": answer,
                }))?;
            } else {
                print_post(post, None);
                println!("{answer}");
            }
        }

        Command::Chat { id } => {
            let post = find_post(&feed, &id)?.clone();
            run_chat(&gateway, post).await?;
        }

        Command::Search { query } => {
            let orchestrator = SearchOrchestrator::new(analyzer, config.search.clone());
            let results = orchestrator.search(&query, feed.posts()).await;
            log::info!("{} result(s) for {query:?}", results.len());

            if cli.json {
                let rows: Vec<serde_json::Value> = results
                    .iter()
                    .map(|p| {
                        serde_json::json!({
                            "post": p,
                            "imageDescription": orchestrator.cached_description(&p.id),
                        })
                    })
                    .collect();
                print_json(&rows)?;
            } else if results.is_empty() {
                println!("{DIM}(no matching posts){RESET}");
            } else {
                for post in &results {
                    print_post(post, orchestrator.cached_description(&post.id).as_deref());
                }
            }
        }

        Command::Recent { count } => {
            let count = count.unwrap_or(config.search.recently_viewed_count);
            let recent = search::recently_viewed(feed.posts(), count);
            if cli.json {
                print_json(&recent)?;
            } else {
                for post in &recent {
                    print_post(post, None);
                }
            }
        }

        Command::Probe => {
            let report = gateway.probe().await;
            if cli.json {
                print_json(&report)?;
            } else {
                print!("{report}");
            }
        }
    }

    Ok(())
}

fn find_post<'a>(feed: &'a Feed, id: &str) -> Result<&'a Post> {
    feed.find(id)
        .with_context(|| format!("No post with id {id:?} in the feed"))
}

async fn run_chat(gateway: &ChatGateway, post: Post) -> Result<()> {
    let mut chat = PostChat::new(post);
    print_post(chat.post(), None);
    if let Some(greeting) = chat.transcript().iter().find(|m| m.role == Role::Assistant) {
        println!("{BOLD}assistant:{RESET} {}", greeting.content.flatten());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("{DIM}you:{RESET} ");
        let Some(line) = lines.next_line().await.context("Failed to read from stdin")? else {
            break;
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }
        if let Some(reply) = chat.ask(gateway, line).await {
            println!("{BOLD}assistant:{RESET} {reply}");
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 60;
/// Indent for continuation lines (label column width + " : ").
const INDENT: &str = "               ";

/// Print a post as a labelled block.
fn print_post(post: &Post, image_description: Option<&str>) {
    println!();
    println!(
        "  {BOLD}#{} @{}{RESET} {DIM}{} · {} likes{RESET}",
        post.id, post.username, post.timestamp, post.likes
    );
    println!("  {DIM}{}{RESET}", "─".repeat(72));
    print_row("Caption", &post.caption);
    print_row("Image", &post.image_url);
    if let Some(description) = image_description {
        for (i, line) in wrap_text(description, VAL_WIDTH).iter().enumerate() {
            if i == 0 {
                println!("  {GREEN}{:<12} : {line}{RESET}", "Description");
            } else {
                println!("  {GREEN}{INDENT}{line}{RESET}");
            }
        }
    }
    for comment in &post.comments {
        print_row(&format!("@{}", comment.username), &comment.text);
    }
}

fn print_row(label: &str, val: &str) {
    let label_col = format!("{label:<12}");
    for (i, line) in wrap_text(val, VAL_WIDTH).iter().enumerate() {
        if i == 0 {
            println!("  {label_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
