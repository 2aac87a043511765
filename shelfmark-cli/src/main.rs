mod config;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::ConfigMerger;
use serde::Serialize;
use shelfmark_core::adapters::{FixedClock, FsLibraryStore, SystemClock};
use shelfmark_core::ports::Clock;
use shelfmark_core::settings::LibrarySettings;
use shelfmark_core::{Library, LibraryError, ServiceError};
use shelfmark_domain::validation::{
    validate_borrower_id, validate_copies, validate_text, validate_year,
};
use shelfmark_render::{
    render_add_md, render_book_md, render_books_md, render_borrow_md, render_categories_md,
    render_delete_md, render_loans_md, render_return_md,
};
use shelfmark_types::{BookPatch, BookRef, Borrower, Timestamp};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

type CliLibrary = Library<FsLibraryStore, Box<dyn Clock>>;

#[derive(Debug, Parser)]
#[command(
    name = "shelfmark",
    version,
    about = "Book inventory and lending ledger for a small library."
)]
struct Cli {
    /// Directory holding the record files and shelfmark.toml (default: current directory).
    #[arg(long, global = true, default_value = ".", env = "SHELFMARK_DATA_DIR")]
    data_dir: Utf8PathBuf,

    /// Loan period in days (overrides shelfmark.toml).
    #[arg(long, global = true)]
    loan_days: Option<u32>,

    /// Fine per whole day late (overrides shelfmark.toml).
    #[arg(long, global = true)]
    fine_per_day: Option<u64>,

    /// Output format (text, json).
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Pin the current time, e.g. "Tue Mar 04 13:05:02 2025".
    #[arg(long, global = true, hide = true, env = "SHELFMARK_NOW")]
    now: Option<Timestamp>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add copies of a book, merging into an existing record with the same title and author.
    Add(AddArgs),
    /// Show one book.
    Find(BookArgs),
    /// Change fields of a book.
    Update(UpdateArgs),
    /// Delete copies of a book; deleting every copy removes the record.
    Delete(DeleteArgs),
    /// Delete every book in a category.
    DeleteCategory(CategoryArgs),
    /// Delete every book in the catalog.
    DeleteAll(DeleteAllArgs),
    /// List the books in a category.
    List(CategoryArgs),
    /// List the distinct categories.
    Categories,
    /// Sort a category by title.
    Sort(CategoryArgs),
    /// Borrow one copy of a book.
    Borrow(BorrowArgs),
    /// Borrow between 2 and 5 books at once, or none if any of them cannot be lent.
    BorrowMany(BorrowManyArgs),
    /// Return a borrowed book.
    Return(BorrowArgs),
    /// Show loans (default: active loans).
    Loans(LoansArgs),
}

#[derive(Debug, Parser)]
struct AddArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: String,
    #[arg(long)]
    year: i32,
    #[arg(long)]
    category: String,
    #[arg(long, default_value_t = 1)]
    copies: u32,
}

#[derive(Debug, Parser)]
struct BookArgs {
    #[arg(long)]
    category: String,
    #[arg(long)]
    title: String,
}

#[derive(Debug, Parser)]
struct CategoryArgs {
    #[arg(long)]
    category: String,
}

#[derive(Debug, Parser)]
struct UpdateArgs {
    #[command(flatten)]
    book: BookArgs,

    #[arg(long)]
    new_title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    new_category: Option<String>,
    #[arg(long)]
    year: Option<i32>,

    /// New total; available copies move by the same amount.
    #[arg(long)]
    total_copies: Option<u32>,
}

#[derive(Debug, Parser)]
struct DeleteArgs {
    #[command(flatten)]
    book: BookArgs,

    #[arg(long)]
    copies: u32,

    /// Confirm deleting more copies than are currently available.
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[derive(Debug, Parser)]
struct DeleteAllArgs {
    /// Confirm wiping the catalog.
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[derive(Debug, Parser)]
struct BorrowerArgs {
    /// Borrower name.
    #[arg(long)]
    name: String,
    /// Borrower id.
    #[arg(long)]
    id: String,
}

#[derive(Debug, Parser)]
struct BorrowArgs {
    #[command(flatten)]
    book: BookArgs,
    #[command(flatten)]
    borrower: BorrowerArgs,
}

#[derive(Debug, Parser)]
struct BorrowManyArgs {
    #[command(flatten)]
    borrower: BorrowerArgs,

    /// A book as CATEGORY:TITLE. Repeat for each book.
    #[arg(long = "book", value_parser = parse_book_ref, required = true)]
    books: Vec<BookRef>,
}

#[derive(Debug, Parser)]
struct LoansArgs {
    /// Only active loans past their due date.
    #[arg(long, default_value_t = false, conflicts_with = "all")]
    overdue: bool,

    /// Include returned loans.
    #[arg(long, default_value_t = false)]
    all: bool,

    /// Only loans for this borrower id.
    #[arg(long)]
    borrower: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::from(0),
        Err(e) => match library_error(&e) {
            Some(refused) => {
                error!(kind = refused.kind(), "{:#}", e);
                ExitCode::from(2)
            }
            None => {
                error!("{:#}", e);
                ExitCode::from(1)
            }
        },
    }
}

/// The library's refusal behind `err`, if that is what stopped the command.
fn library_error(err: &anyhow::Error) -> Option<&LibraryError> {
    match err.downcast_ref::<ServiceError>() {
        Some(ServiceError::Library(inner)) => Some(inner),
        Some(ServiceError::Persistence(_)) => None,
        None => err.downcast_ref::<LibraryError>(),
    }
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file_config =
        config::load_or_default(&cli.data_dir).context("load shelfmark.toml config")?;
    let settings =
        ConfigMerger::new(file_config).merge(&cli.data_dir, cli.loan_days, cli.fine_per_day)?;
    debug!(
        books = %settings.books_path(),
        loans = %settings.loans_path(),
        policy = ?settings.policy,
        "merged config"
    );

    let mut library = open_library(&settings, cli.now)?;
    let format = cli.format;

    match cli.cmd {
        Command::Add(args) => cmd_add(&mut library, args, format),
        Command::Find(args) => cmd_find(&library, args, format),
        Command::Update(args) => cmd_update(&mut library, args, format),
        Command::Delete(args) => cmd_delete(&mut library, args, format),
        Command::DeleteCategory(args) => cmd_delete_category(&mut library, args, format),
        Command::DeleteAll(args) => cmd_delete_all(&mut library, args, format),
        Command::List(args) => cmd_list(&library, args, format),
        Command::Categories => cmd_categories(&library, format),
        Command::Sort(args) => cmd_sort(&mut library, args, format),
        Command::Borrow(args) => cmd_borrow(&mut library, args, format),
        Command::BorrowMany(args) => cmd_borrow_many(&mut library, args, format),
        Command::Return(args) => cmd_return(&mut library, args, format),
        Command::Loans(args) => cmd_loans(&library, args, format),
    }
}

fn open_library(settings: &LibrarySettings, now: Option<Timestamp>) -> anyhow::Result<CliLibrary> {
    let clock: Box<dyn Clock> = match now {
        Some(ts) => Box::new(FixedClock::new(ts)),
        None => Box::new(SystemClock),
    };
    let store = FsLibraryStore::from_settings(settings);
    Library::open(store, clock, settings.policy)
        .with_context(|| format!("open library in {}", settings.data_dir))
}

fn emit<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce() -> String,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn check_book_args(args: &BookArgs) -> Result<(), LibraryError> {
    validate_text("category", &args.category)?;
    validate_text("title", &args.title)
}

fn borrower_from(args: BorrowerArgs) -> Result<Borrower, LibraryError> {
    validate_text("borrower name", &args.name)?;
    validate_borrower_id(&args.id)?;
    Ok(Borrower::new(args.name.trim(), args.id.trim()))
}

fn parse_book_ref(raw: &str) -> Result<BookRef, String> {
    let (category, title) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected CATEGORY:TITLE, got '{}'", raw))?;
    let (category, title) = (category.trim(), title.trim());
    if category.is_empty() || title.is_empty() {
        return Err(format!("expected CATEGORY:TITLE, got '{}'", raw));
    }
    Ok(BookRef::new(category, title))
}

fn cmd_add(library: &mut CliLibrary, args: AddArgs, format: OutputFormat) -> anyhow::Result<()> {
    validate_text("title", &args.title)?;
    validate_text("author", &args.author)?;
    validate_text("category", &args.category)?;
    validate_year(args.year)?;
    validate_copies(args.copies)?;

    let outcome = library.add_copies(
        &args.title,
        &args.author,
        args.year,
        &args.category,
        args.copies,
    )?;
    emit(
        format,
        &serde_json::json!({ "title": args.title.trim(), "result": outcome }),
        || render_add_md(args.title.trim(), &outcome),
    )
}

fn cmd_find(library: &CliLibrary, args: BookArgs, format: OutputFormat) -> anyhow::Result<()> {
    check_book_args(&args)?;
    let book = library.find(&args.category, &args.title)?;
    emit(format, book, || render_book_md(book))
}

fn cmd_update(
    library: &mut CliLibrary,
    args: UpdateArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    check_book_args(&args.book)?;
    if let Some(title) = &args.new_title {
        validate_text("new title", title)?;
    }
    if let Some(author) = &args.author {
        validate_text("author", author)?;
    }
    if let Some(category) = &args.new_category {
        validate_text("new category", category)?;
    }
    if let Some(year) = args.year {
        validate_year(year)?;
    }

    let patch = BookPatch {
        title: args.new_title,
        author: args.author,
        category: args.new_category,
        year: args.year,
        total_copies: args.total_copies,
    };
    let book = library.update(&args.book.category, &args.book.title, &patch)?;
    emit(format, &book, || render_book_md(&book))
}

fn cmd_delete(
    library: &mut CliLibrary,
    args: DeleteArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    check_book_args(&args.book)?;
    let BookArgs { category, title } = &args.book;

    if library.exceeds_available(category, title, args.copies)? && !args.force {
        let available = library.find(category, title)?.available_copies;
        return Err(LibraryError::validation(format!(
            "only {} copies of '{}' are on the shelf; pass --force to delete copies that are on loan",
            available, title
        ))
        .into());
    }

    let outcome = library.delete_copies(category, title, args.copies)?;
    emit(
        format,
        &serde_json::json!({ "title": title, "result": outcome }),
        || render_delete_md(title, &outcome),
    )
}

fn cmd_delete_category(
    library: &mut CliLibrary,
    args: CategoryArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    validate_text("category", &args.category)?;
    let removed = library.delete_by_category(&args.category)?;
    emit(
        format,
        &serde_json::json!({ "category": args.category, "removed": removed }),
        || format!("Deleted {} book(s) from '{}'\n", removed, args.category),
    )
}

fn cmd_delete_all(
    library: &mut CliLibrary,
    args: DeleteAllArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if !args.force {
        return Err(LibraryError::validation("pass --force to delete every book").into());
    }
    let removed = library.delete_all()?;
    emit(format, &serde_json::json!({ "removed": removed }), || {
        format!("Deleted {} book(s)\n", removed)
    })
}

fn cmd_list(library: &CliLibrary, args: CategoryArgs, format: OutputFormat) -> anyhow::Result<()> {
    validate_text("category", &args.category)?;
    let books: Vec<_> = library.list_by_category(&args.category).collect();
    emit(format, &books, || {
        render_books_md(&args.category, books.iter().copied())
    })
}

fn cmd_categories(library: &CliLibrary, format: OutputFormat) -> anyhow::Result<()> {
    let categories = library.distinct_categories();
    emit(format, &categories, || render_categories_md(&categories))
}

fn cmd_sort(library: &mut CliLibrary, args: CategoryArgs, format: OutputFormat) -> anyhow::Result<()> {
    validate_text("category", &args.category)?;
    library.sort_by_title(&args.category)?;
    cmd_list(library, args, format)
}

fn cmd_borrow(library: &mut CliLibrary, args: BorrowArgs, format: OutputFormat) -> anyhow::Result<()> {
    check_book_args(&args.book)?;
    let borrower = borrower_from(args.borrower)?;
    let record = library.borrow(&args.book.title, &args.book.category, &borrower)?;
    let records = [record];
    emit(format, &records, || render_borrow_md(&records))
}

fn cmd_borrow_many(
    library: &mut CliLibrary,
    args: BorrowManyArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    for book in &args.books {
        validate_text("category", &book.category)?;
        validate_text("title", &book.title)?;
    }
    let borrower = borrower_from(args.borrower)?;
    let records = library.borrow_many(&borrower, &args.books)?;
    emit(format, &records, || render_borrow_md(&records))
}

fn cmd_return(library: &mut CliLibrary, args: BorrowArgs, format: OutputFormat) -> anyhow::Result<()> {
    check_book_args(&args.book)?;
    let borrower = borrower_from(args.borrower)?;
    let receipt = library.return_book(&args.book.title, &args.book.category, &borrower)?;
    emit(format, &receipt, || render_return_md(&receipt))
}

fn cmd_loans(library: &CliLibrary, args: LoansArgs, format: OutputFormat) -> anyhow::Result<()> {
    if let Some(id) = &args.borrower {
        validate_borrower_id(id)?;
    }
    let now = library.now();
    let (heading, records) = if args.overdue {
        ("Overdue loans", library.overdue())
    } else if args.all {
        ("All loans", library.ledger().records().iter().collect())
    } else {
        ("Active loans", library.ledger().active().collect())
    };
    let records: Vec<_> = records
        .into_iter()
        .filter(|r| {
            args.borrower
                .as_deref()
                .is_none_or(|id| shelfmark_types::text::eq_fold(&r.borrower_id, id))
        })
        .collect();

    emit(format, &records, || {
        render_loans_md(heading, records.iter().copied(), now)
    })
}
