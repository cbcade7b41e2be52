use anyhow::Result;
use clap::Parser;
use magpie::{credential_from_env, init_tracing_once, ExportFormat, JsonlSink, Magpie, MagpieOptions};
use std::path::PathBuf;
use std::time::Duration;

/// Prepare a Hacker News upvote dataset with caching.
#[derive(Parser, Debug)]
#[command(name = "magpie", version)]
struct Args {
    /// Account whose upvotes become the positive examples.
    username: String,
    /// Clear the cache before fetching data.
    #[arg(long)]
    clear_cache: bool,
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Dataset name; output lands in <out-dir>/<destination>/.
    #[arg(long)]
    destination: Option<String>,
    /// Negative examples sampled per upvote.
    #[arg(long)]
    neighbors: Option<usize>,
    #[arg(long)]
    min_score: Option<i64>,
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long)]
    outer_workers: Option<usize>,
    /// Sampler batch dispatch rate.
    #[arg(long)]
    rps: Option<f64>,
    /// Per-request HTTP timeout, in seconds.
    #[arg(long)]
    http_timeout: Option<u64>,
    /// Write zstd-compressed JSONL.
    #[arg(long)]
    zst: bool,
    #[arg(long)]
    no_progress: bool,
}

impl Args {
    /// Layer command-line overrides on top of `opts`.
    fn apply(&self, mut opts: MagpieOptions) -> MagpieOptions {
        if let Some(dir) = &self.cache_dir { opts = opts.with_cache_dir(dir); }
        if let Some(dir) = &self.out_dir { opts = opts.with_out_dir(dir); }
        if let Some(dest) = &self.destination { opts = opts.with_destination(dest.clone()); }
        if let Some(n) = self.neighbors { opts = opts.with_neighbors_per_upvote(n); }
        if let Some(s) = self.min_score { opts = opts.with_min_score(s); }
        if let Some(n) = self.workers { opts = opts.with_workers(n); }
        if let Some(n) = self.outer_workers { opts = opts.with_outer_workers(n); }
        if let Some(r) = self.rps { opts = opts.with_requests_per_second(r); }
        if let Some(secs) = self.http_timeout { opts = opts.with_http_timeout(Duration::from_secs(secs)); }
        if self.zst { opts = opts.with_format(ExportFormat::Zst); }
        opts.with_progress(!self.no_progress)
    }
}

fn main() -> Result<()> {
    init_tracing_once();
    let args = Args::parse();
    let token = credential_from_env()?;

    let opts = args.apply(MagpieOptions::default().merge_env());
    let sink = JsonlSink::new(&opts.out_dir, opts.format);
    let magpie = Magpie::http(opts)?;
    if args.clear_cache {
        magpie.clear_cache()?;
    }

    let dataset = magpie.run(&args.username, &token, &sink)?;
    println!(
        "Wrote {} rows ({} train / {} test) to {}",
        dataset.len(),
        dataset.train.len(),
        dataset.test.len(),
        sink.split_path(&magpie.opts().destination, "train").display()
    );
    Ok(())
}
