use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use newsum::assistant::OpenAiAssistants;
use newsum::banner::{BannerInfo, print_banner, print_summary};
use newsum::config::Config;
use newsum::consts::{DEFAULT_BIND, DEFAULT_MODEL, NEWS_API_URL, OPENAI_API_URL};
use newsum::engine::Engine;
use newsum::engine::assistant::AssistantEngine;
use newsum::error::Error;
use newsum::events::EventBus;
use newsum::jobs::JobRegistry;
use newsum::news::NewsApiClient;
use newsum::prompts::summarizer::assistant_spec;
use newsum::session::RunControl;
use newsum::spinner::Spinner;
use newsum::tools::ToolDispatcher;
use newsum::web::{AppState, create_app};

#[derive(Parser)]
#[command(name = "newsum", version, about = "The news on any topic, summarized by an assistant.")]
struct Cli {
    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    news_api_key: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Model backing the assistant
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Seconds between run status checks
    #[arg(long, default_value_t = 2)]
    poll_interval: u64,

    /// Seconds before an unfinished run is cancelled
    #[arg(short, long, default_value_t = 300)]
    timeout: u64,

    /// Address the web UI listens on
    #[arg(short, long, default_value = DEFAULT_BIND)]
    bind: String,

    /// Base URL of the news search API
    #[arg(long, default_value = NEWS_API_URL)]
    news_url: String,

    /// Base URL of the OpenAI API
    #[arg(long, default_value = OPENAI_API_URL)]
    openai_url: String,

    /// Summarize a single topic, print it, and exit (no web UI)
    #[arg(long)]
    topic: Option<String>,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::new(
            self.news_api_key.clone().unwrap_or_default(),
            self.openai_api_key.clone().unwrap_or_default(),
        );
        config.news.base_url = self.news_url.trim_end_matches('/').to_string();
        config.assistant.base_url = self.openai_url.trim_end_matches('/').to_string();
        config.assistant.model = self.model.clone();
        config.poll.interval = Duration::from_secs(self.poll_interval);
        config.poll.timeout = Duration::from_secs(self.timeout);
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsum=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    config.validate().context("invalid configuration")?;

    let news = NewsApiClient::new(config.news.clone()).context("failed to build news client")?;
    let api = OpenAiAssistants::new(config.assistant.clone())
        .context("failed to build OpenAI client")?;

    let engine: Arc<dyn Engine> = Arc::new(AssistantEngine::new(
        Arc::new(api),
        ToolDispatcher::new(Arc::new(news)),
        config.poll,
        assistant_spec(&config.assistant.model),
    ));

    // Single topic mode
    if let Some(topic) = cli.topic.as_deref() {
        return run_once(engine.as_ref(), topic.trim()).await;
    }

    serve(engine, &config, &cli.bind).await
}

async fn run_once(engine: &dyn Engine, topic: &str) -> anyhow::Result<()> {
    if topic.is_empty() {
        anyhow::bail!("topic must not be empty");
    }

    let events = EventBus::default();
    let (cancel, control) = RunControl::new(events.clone());
    let spinner = Spinner::start(&format!("summarizing \"{topic}\""), &events);

    // Ctrl+C cancels the remote run, then waits for the session to wind down
    let summarize = engine.summarize(topic, &control);
    tokio::pin!(summarize);
    let result = tokio::select! {
        result = &mut summarize => result,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            summarize.await
        }
    };

    spinner.stop().await;

    match result {
        Ok(summary) => {
            print_summary(topic, &summary);
            Ok(())
        }
        Err(Error::Cancelled) => {
            eprintln!("interrupted");
            Ok(())
        }
        Err(e) => Err(e).context("summary failed"),
    }
}

async fn serve(engine: Arc<dyn Engine>, config: &Config, bind: &str) -> anyhow::Result<()> {
    print_banner(&BannerInfo {
        model: &config.assistant.model,
        listen: bind,
        news_url: &config.news.base_url,
        openai_url: &config.assistant.base_url,
        poll_interval: config.poll.interval,
        run_timeout: config.poll.timeout,
    });

    let app = create_app(AppState {
        jobs: Arc::new(JobRegistry::new(engine)),
        refresh_secs: config.poll.interval.as_secs().max(1),
    });

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(addr = %listener.local_addr()?, "serving web UI");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    Ok(())
}
