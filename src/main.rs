mod cache;
mod date;
mod error;
mod output;
mod pagination;
mod post;
mod prismic;
mod reading_time;
mod richtext;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use date::DateFormatter;
use pagination::{LoadMore, Pagination};
use post::PostDetail;
use prismic::{Predicate, Query, RawDoc, RawPage};

const DOCUMENT_TYPE: &str = "post";
const LIST_FIELDS: &[&str] = &["title", "subtitle", "author"];

#[derive(Parser, Debug)]
#[clap(
    author = "Sridhar Ratnakumar",
    version,
    about = "Render a Prismic-backed blog into static HTML pages"
)]
struct Args {
    /// Content API endpoint (e.g. https://my-repo.cdn.prismic.io/api/v2)
    #[arg(long, env = "PRISMIC_ENDPOINT")]
    endpoint: String,

    /// Access token for private repositories
    #[arg(long, env = "PRISMIC_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Locale used for publication dates
    #[arg(long, env = "BLOG_LOCALE", default_value = "pt_BR")]
    locale: String,

    /// Cache directory (default: the user cache directory)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the post list
    List {
        /// Posts per page
        #[arg(long, default_value_t = 20)]
        page_size: u32,

        /// Number of pages to load before rendering
        #[arg(long, default_value_t = 1)]
        pages: usize,

        /// Only list posts matching this text
        #[arg(long)]
        search: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a single post page
    Post {
        /// Post uid (its slug)
        uid: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Hours a cached post is served before it is fetched again
        #[arg(long, default_value_t = 24)]
        revalidate_hours: u32,

        /// Always fetch, never read or write the cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Write the list pages and every post page into a directory
    Build {
        /// Output directory
        #[arg(short, long, default_value = "public")]
        out_dir: PathBuf,

        /// Posts per page
        #[arg(long, default_value_t = 20)]
        page_size: u32,

        /// Hours a cached post is served before it is fetched again
        #[arg(long, default_value_t = 24)]
        revalidate_hours: u32,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        "prismic_blog=debug"
    } else {
        "prismic_blog=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = prismic::Client::new(&args.endpoint, args.access_token.clone())
        .context("Failed to set up content API client")?;
    let dates = DateFormatter::from_locale_name(&args.locale)?;
    tracing::debug!("Endpoint: {}", args.endpoint);

    match &args.command {
        Command::List {
            page_size,
            pages,
            search,
            output,
        } => {
            let first = fetch_first_page(&client, *page_size, search.as_deref())?;
            let pagination = Pagination::initialize(&first);
            let loaded = pagination
                .load_all(&client, pages.saturating_sub(1))
                .context("Failed to load more posts")?;
            tracing::info!(
                "Listing {} posts from {} page(s), more available: {}",
                pagination.results().len(),
                loaded + 1,
                pagination.has_more()
            );
            let rendered = output::render_index(&pagination, &dates)?;
            write_output(output.as_deref(), &rendered)?;
        }

        Command::Post {
            uid,
            output,
            revalidate_hours,
            no_cache,
        } => {
            let cache = if *no_cache {
                None
            } else {
                Some(open_cache(&args, client.host())?)
            };
            let max_age = cache::max_age(*revalidate_hours);
            let doc = fetch_post(&client, cache.as_ref(), uid, max_age)
                .with_context(|| format!("Failed to fetch post {:?}", uid))?;
            let rendered = output::render_post(&PostDetail::from_raw(&doc), &dates)?;
            write_output(output.as_deref(), &rendered)?;
        }

        Command::Build {
            out_dir,
            page_size,
            revalidate_hours,
        } => {
            let cache = open_cache(&args, client.host())?;
            let max_age = cache::max_age(*revalidate_hours);
            build(&client, &cache, &dates, out_dir, *page_size, max_age)?;
        }
    }

    Ok(())
}

fn fetch_first_page(
    client: &prismic::Client,
    page_size: u32,
    search: Option<&str>,
) -> Result<RawPage> {
    let mut query = Query::documents(DOCUMENT_TYPE)
        .fetch(LIST_FIELDS)
        .page_size(page_size)
        .order_by("document.first_publication_date desc");
    if let Some(text) = search {
        query = query.filter(Predicate::fulltext(text));
    }
    client.query(&query).context("Failed to fetch post list")
}

fn open_cache(args: &Args, host: &str) -> Result<cache::Cache> {
    match &args.cache_dir {
        Some(dir) => cache::Cache::at(&dir.join(host)),
        None => cache::Cache::new(host),
    }
}

/// Serve a post from the cache while it is fresh, otherwise fetch and cache it.
fn fetch_post(
    client: &prismic::Client,
    cache: Option<&cache::Cache>,
    uid: &str,
    max_age: chrono::Duration,
) -> Result<RawDoc> {
    let now = chrono::Utc::now();
    if let Some(cache) = cache {
        if let Some(cached) = cache.load(uid)? {
            if cached.is_fresh(now, max_age) {
                tracing::debug!("Post {} cached at {}, reusing", uid, cached.fetched_at);
                return Ok(cached.doc);
            }
            tracing::debug!("Post {} cache is stale, revalidating", uid);
        }
    }

    let doc = client.get_by_uid(DOCUMENT_TYPE, uid)?;

    if let Some(cache) = cache {
        cache.save(&cache::CachedDoc {
            uid: uid.to_string(),
            doc: doc.clone(),
            fetched_at: now,
        })?;
    }
    Ok(doc)
}

fn build(
    client: &prismic::Client,
    cache: &cache::Cache,
    dates: &DateFormatter,
    out_dir: &Path,
    page_size: u32,
    max_age: chrono::Duration,
) -> Result<()> {
    let post_dir = out_dir.join("post");
    std::fs::create_dir_all(&post_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", post_dir))?;

    let page_dir = out_dir.join("page");
    std::fs::create_dir_all(&page_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", page_dir))?;

    let first = fetch_first_page(client, page_size, None)?;

    // Walk every page; each becomes a list page linking to the next one.
    let all = Pagination::initialize(&first);
    loop {
        match all.load_more(client).context("Failed to load more posts")? {
            LoadMore::Loaded(n) => tracing::debug!("Loaded {} more posts", n),
            LoadMore::Exhausted => break,
        }
    }

    for (path, rendered) in output::render_list_pages(&all, dates)? {
        write_output(Some(out_dir.join(path).as_path()), &rendered)?;
    }

    let posts = all.results();
    let total = posts.len();
    for (i, post) in posts.iter().enumerate() {
        let Some(uid) = post.uid.as_deref() else {
            tracing::warn!("[{}/{}] Post without uid, skipping", i + 1, total);
            continue;
        };
        let path = post_dir.join(format!("{}.html", uid));

        let rendered = fetch_post(client, Some(cache), uid, max_age).and_then(|doc| {
            output::render_post(&PostDetail::from_raw(&doc), dates).map_err(Into::into)
        });
        match rendered {
            Ok(html) => write_output(Some(path.as_path()), &html)?,
            Err(e) => {
                tracing::warn!("[{}/{}] Post {} not generated yet: {:#}", i + 1, total, uid, e);
                write_output(Some(path.as_path()), &output::render_fallback())?;
            }
        }
    }

    tracing::info!("Built {} post pages into {:?}", total, out_dir);
    Ok(())
}

fn write_output(path: Option<&Path>, rendered: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write output to {:?}", path))?;
            tracing::info!("Output written to {:?}", path);
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
