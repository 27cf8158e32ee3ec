use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::cli::context::CliContext;
use crate::errors::TaskError;
use crate::messaging::InboundResponse;
use crate::task::{CommandName, CrawlParams, TaskRequest};

#[derive(Args, Clone, Debug)]
pub struct CrawlArgs {
    /// Instagram account whose reels page is crawled
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    pub username: Option<String>,

    /// Full reels page URL
    #[arg(long)]
    pub url: Option<String>,

    /// Number of distinct reels to collect
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub reel_qty: i64,

    /// Task identifier; a random one is generated when omitted
    #[arg(long)]
    pub task_id: Option<String>,

    /// Pretty-print the response
    #[arg(long)]
    pub pretty: bool,
}

impl CrawlArgs {
    pub fn page_url(&self) -> String {
        match (&self.url, &self.username) {
            (Some(url), _) => url.trim().to_string(),
            (None, Some(username)) => reels_url(username),
            (None, None) => String::new(),
        }
    }

    pub fn to_request(&self) -> TaskRequest {
        let task_id = self
            .task_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        TaskRequest::new(
            task_id,
            CommandName::CrawlIgPage.as_str(),
            json!({ "url": self.page_url(), "reel_qty": self.reel_qty }),
        )
    }

    /// Builds the request and rejects it up front when the router would.
    pub fn checked_request(&self) -> Result<TaskRequest, TaskError> {
        let request = self.to_request();
        CrawlParams::from_request(&request)?;
        Ok(request)
    }
}

/// Reels listing of `username`, like `https://www.instagram.com/<name>/reels/`.
pub fn reels_url(username: &str) -> String {
    let name = username.trim().trim_start_matches('@').trim_matches('/');
    format!("https://www.instagram.com/{name}/reels/")
}

pub async fn cmd_crawl(args: CrawlArgs, ctx: &CliContext) -> Result<()> {
    let request = match args.checked_request() {
        Ok(request) => request,
        Err(err) => {
            let response = InboundResponse::Error {
                error: err.to_string(),
            };
            print_response(&response, args.pretty)?;
            bail!("crawl failed: {err}");
        }
    };
    let session = ctx.session().await?;
    let response = session.channel().dispatch(request).await;
    session.shutdown().await;

    print_response(&response, args.pretty)?;
    if let InboundResponse::Error { error } = response {
        bail!("crawl failed: {error}");
    }
    Ok(())
}

fn print_response(response: &InboundResponse, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(response)
    } else {
        serde_json::to_string(response)
    }
    .context("Failed to encode response")?;
    println!("{rendered}");
    Ok(())
}
