use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crawl70::{render_report, Crawler};

#[doc(hidden)]
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Gopher server to start crawling from
    #[arg(default_value_t = String::from("comp3310.ddns.net"))]
    host: String,

    /// TCP port of the origin server
    #[arg(default_value_t = 70)]
    port: u16,

    /// Maximum recursion depth; the root menu counts as depth 0
    max_depth: Option<usize>,

    /// Directory downloaded resources are stored under
    #[arg(short, long, default_value = "downloaded_files")]
    output: PathBuf,
}

#[async_std::main]
async fn main() -> Result<()> {
    femme::start();
    let args = Args::parse();

    let mut crawler = Crawler::new(&args.host, args.port, &args.output);
    if let Some(max_depth) = args.max_depth {
        crawler = crawler.with_max_depth(max_depth);
    }
    crawler.crawl("").await?;

    print!("{}", render_report(crawler.stats(), crawler.visited_count()));
    Ok(())
}
