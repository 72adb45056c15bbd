use std::path::Path;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use folio_app::modules::books::shelves::{self, Pillar};
use folio_app::{Book, CatalogSource, FileLink, NewBookInput, Services};
use folio_identity::{AuthOutcome, SessionState, SignOutOutcome};
use folio_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Browse and manage the folio book catalog")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the catalog
    List {
        /// Only books in this category (case-insensitive)
        #[arg(long)]
        category: Option<String>,
        /// Only fiction or nonfiction
        #[arg(long, value_enum)]
        pillar: Option<PillarArg>,
        /// Narrow a pillar to one genre; picks the pillar when --pillar is absent
        #[arg(long)]
        genre: Option<String>,
        /// Match title or author
        #[arg(long)]
        search: Option<String>,
        /// Print the tagged result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the curated home and library rows
    Shelves,
    /// Print the download link for a book
    Open { id: String },
    /// Add a book, uploading its file first when one is given
    Add(AddArgs),
    /// Delete a book (admin mode only)
    Delete { id: String },
    /// Upload a file to book storage and print its public URL
    Upload {
        path: String,
        /// Object name; defaults to book-<token>-<file name>
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign in with email and password
    SignIn(AuthArgs),
    /// Create an account with email and password
    SignUp(AuthArgs),
    /// End the current session
    SignOut,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PillarArg {
    Fiction,
    Nonfiction,
}

impl From<PillarArg> for Pillar {
    fn from(arg: PillarArg) -> Self {
        match arg {
            PillarArg::Fiction => Pillar::Fiction,
            PillarArg::Nonfiction => Pillar::Nonfiction,
        }
    }
}

/// Filters for `list`, applied in order: category, pillar/genre, search.
#[derive(Debug)]
struct ListFilter {
    category: Option<String>,
    pillar: Option<Pillar>,
    genre: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Args)]
struct AddArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: String,
    #[arg(long, default_value = "Custom")]
    category: String,
    #[arg(long, default_value_t = 0.0)]
    price: f64,
    #[arg(long, default_value_t = 4.5)]
    rating: f64,
    #[arg(long, default_value_t = 240)]
    pages: u32,
    #[arg(long)]
    accent: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    cover: Option<String>,
    #[arg(long)]
    audio_preview: Option<String>,
    #[arg(long)]
    featured: bool,
    /// Local path or URL of the book file
    #[arg(long)]
    file: Option<String>,
}

#[derive(Debug, Args)]
struct AuthArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load folio settings")?;
    folio_telemetry::init(&settings.telemetry);
    tracing::debug!(env = ?settings.environment, "folio cli starting");

    let services = Services::from_settings(&settings);

    match cli.command {
        Command::List {
            category,
            pillar,
            genre,
            search,
            json,
        } => {
            let filter = ListFilter {
                category,
                pillar: pillar.map(Pillar::from),
                genre,
                search,
            };
            list(&services, &filter, json).await
        }
        Command::Shelves => show_shelves(&services).await,
        Command::Open { id } => open(&services, &id).await,
        Command::Add(args) => add(&services, args).await,
        Command::Delete { id } => {
            if !settings.catalog.admin_mode {
                return Err(anyhow!(
                    "deleting books requires admin mode (set FOLIO_CATALOG__ADMIN_MODE=true)"
                ));
            }
            services
                .catalog
                .delete_book(&id)
                .await
                .map_err(|err| anyhow!("delete failed: {}", err.user_message()))?;
            println!("deleted {id}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Upload { path, name } => {
            let name = name.unwrap_or_else(|| services.catalog.upload_name(file_name(&path)));
            let url = services
                .catalog
                .upload_book_file(&path, &name)
                .await
                .map_err(|err| anyhow!("upload failed: {}", err.user_message()))?;
            println!("{url}");
            Ok(ExitCode::SUCCESS)
        }
        Command::SignIn(args) => {
            let outcome = services
                .identity
                .sign_in_with_email(&args.email, &args.password)
                .await?;
            Ok(report_auth("sign-in", &outcome))
        }
        Command::SignUp(args) => {
            let outcome = services
                .identity
                .sign_up_with_email(&args.email, &args.password)
                .await?;
            Ok(report_auth("sign-up", &outcome))
        }
        Command::SignOut => {
            let outcome = services.identity.sign_out().await?;
            Ok(report_sign_out(&outcome))
        }
    }
}

async fn list(services: &Services, filter: &ListFilter, json: bool) -> anyhow::Result<ExitCode> {
    let catalog = services.catalog.fetch_books().await;
    let books = apply_filter(&catalog.data, filter);

    if json {
        let body = serde_json::json!({ "data": books, "source": catalog.source });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("source: {}", source_label(catalog.source));
    for book in books {
        print_book(book);
    }
    Ok(ExitCode::SUCCESS)
}

fn apply_filter<'a>(books: &'a [Book], filter: &ListFilter) -> Vec<&'a Book> {
    let mut selected: Vec<&Book> = match filter.category.as_deref() {
        Some(category) => shelves::by_category(books, category),
        None => books.iter().collect(),
    };

    let genre = filter.genre.as_deref();
    let pillar = filter.pillar.or_else(|| genre.and_then(Pillar::of));
    match (pillar, genre) {
        (Some(pillar), _) => keep(&mut selected, shelves::in_pillar(books, pillar, genre)),
        // A genre outside both pillars can only match by exact category.
        (None, Some(genre)) => keep(&mut selected, shelves::by_category(books, genre)),
        (None, None) => {}
    }

    if let Some(query) = filter.search.as_deref() {
        keep(&mut selected, shelves::search(books, query));
    }
    selected
}

/// Retain only books that also appear in `matching`.
fn keep(selected: &mut Vec<&Book>, matching: Vec<&Book>) {
    selected.retain(|book| matching.iter().any(|other| other.id == book.id));
}

async fn show_shelves(services: &Services) -> anyhow::Result<ExitCode> {
    let catalog = services.catalog.fetch_books().await;
    let books = &catalog.data;

    println!("source: {}", source_label(catalog.source));
    if let Some(hero) = shelves::hero(books) {
        println!("\nSpotlight: {} by {}", hero.title, hero.author);
    }
    print_row("Featured", &shelves::featured_picks(books));
    print_row("Staff picks", &shelves::staff_picks(books));
    print_row("New arrivals", &shelves::new_arrivals(books));
    print_row("Trending", &shelves::trending(books));
    print_row("Quick reads", &shelves::quick_reads(books));
    print_row("Listen now", &shelves::audio_books(books));

    println!("\nPopular authors");
    for author in shelves::popular_authors(books) {
        println!("  {author}");
    }

    println!("\nContinue reading");
    for book in shelves::reading_list(books) {
        let progress = book.progress.unwrap_or(0.0);
        println!("  {:>3.0}%  {}", progress * 100.0, book.title);
    }
    Ok(ExitCode::SUCCESS)
}

async fn open(services: &Services, id: &str) -> anyhow::Result<ExitCode> {
    let catalog = services.catalog.fetch_books().await;
    let Some(book) = catalog.data.iter().find(|book| book.id == id) else {
        eprintln!("no book with id {id}");
        return Ok(ExitCode::FAILURE);
    };

    match book.file_link() {
        FileLink::Available(url) => {
            eprintln!("{}: {}", book.title, file_label(book));
            println!("{url}");
            Ok(ExitCode::SUCCESS)
        }
        FileLink::Missing => {
            eprintln!("No file available: this book does not have a download link yet.");
            Ok(ExitCode::FAILURE)
        }
        FileLink::Invalid { reference, .. } => {
            eprintln!("Unable to open file: '{reference}' is not a valid link.");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn add(services: &Services, args: AddArgs) -> anyhow::Result<ExitCode> {
    let title = args.title.trim();
    let author = args.author.trim();
    if title.is_empty() || author.is_empty() {
        return Err(anyhow!("a book needs a title and an author"));
    }
    let category = match args.category.trim() {
        "" => "Custom",
        category => category,
    };

    let file_url = match args.file.as_deref() {
        Some(file) => {
            let name = services.catalog.upload_name(file_name(file));
            let url = services
                .catalog
                .upload_book_file(file, &name)
                .await
                .map_err(|err| anyhow!("upload failed: {}", err.user_message()))?;
            Some(url)
        }
        None => None,
    };

    let input = NewBookInput {
        id: None,
        title: title.to_string(),
        author: author.to_string(),
        price: args.price,
        rating: args.rating,
        pages: args.pages,
        category: category.to_string(),
        accent: args.accent,
        featured: Some(args.featured),
        description: args.description,
        cover: args.cover,
        audio_preview: args.audio_preview,
        file_url,
    };

    let added = services
        .catalog
        .add_book(input)
        .await
        .map_err(|err| anyhow!("could not add book: {}", err.user_message()))?;

    println!(
        "added {} ({}) under {} to the {} catalog",
        added.data.title,
        added.data.id,
        added.data.category,
        source_label(added.source)
    );
    Ok(ExitCode::SUCCESS)
}

fn report_auth(action: &str, outcome: &AuthOutcome) -> ExitCode {
    match SessionState::Anonymous.after_sign_in(outcome) {
        SessionState::Authenticated(user) => {
            println!(
                "{action} succeeded: {}",
                user.email.as_deref().unwrap_or(user.id.as_str())
            );
            ExitCode::SUCCESS
        }
        SessionState::Anonymous => match outcome {
            AuthOutcome::Failed(message) => {
                eprintln!("{action} failed: {message}");
                ExitCode::FAILURE
            }
            _ => {
                println!("{action} accepted; check your email to confirm the account");
                ExitCode::SUCCESS
            }
        },
    }
}

fn report_sign_out(outcome: &SignOutOutcome) -> ExitCode {
    match outcome {
        SignOutOutcome::SignedOut => {
            println!("signed out");
            ExitCode::SUCCESS
        }
        SignOutOutcome::Failed(message) => {
            eprintln!("sign-out failed: {message}");
            ExitCode::FAILURE
        }
    }
}

fn print_book(book: &Book) {
    println!(
        "{:<28} {:<40} {:<22} {:<10} {:.1}  {}",
        book.id,
        book.title,
        book.author,
        book.category,
        book.rating,
        file_label(book)
    );
}

/// `PDF · 4.5 MB` when the book has a usable file.
fn file_label(book: &Book) -> String {
    if book.can_open() {
        format!("PDF · {:.1} MB", book.estimated_file_size_mb())
    } else {
        "no file".to_string()
    }
}

fn print_row(heading: &str, books: &[&Book]) {
    println!("\n{heading}");
    for book in books {
        println!("  {} by {}", book.title, book.author);
    }
}

fn source_label(source: CatalogSource) -> &'static str {
    match source {
        CatalogSource::Local => "local",
        CatalogSource::Remote => "remote",
    }
}

fn file_name(path: &str) -> Option<&str> {
    Path::new(path).file_name().and_then(|name| name.to_str())
}
