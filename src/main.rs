//! Library Client - terminal front end for the library REST API

use anyhow::{anyhow, bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use dialoguer::Confirm;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_client::{
    app::{App, Page},
    config::{AppConfig, LoggingConfig},
    views::{book_form::BookForm, LoadState, Notification},
    AppState,
};

#[derive(Parser)]
#[command(name = "library-client")]
#[command(version, about = "Library Client - manage books and borrows", long_about = None)]
struct Cli {
    /// API base URL (overrides configuration)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the page at a client path (/, /books, /edit-book/<id>, /borrow-summary)
    Open {
        #[arg(default_value = "/")]
        path: String,

        /// Filter books by title, author, genre or ISBN
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add a new book
    AddBook {
        #[command(flatten)]
        book: BookArgs,
    },
    /// Edit an existing book; only the given fields change
    EditBook {
        id: String,

        #[command(flatten)]
        changes: BookChanges,
    },
    /// Delete a book after confirmation
    DeleteBook {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Borrow copies of a book
    Borrow {
        book_id: String,

        #[arg(short, long, default_value = "1", allow_negative_numbers = true)]
        quantity: i64,

        /// Due date (YYYY-MM-DD); defaults to the configured loan length
        #[arg(short, long)]
        due_date: Option<NaiveDate>,
    },
    /// Show the borrow summary
    Summary,
}

#[derive(Args)]
struct BookArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: String,
    #[arg(long)]
    genre: String,
    #[arg(long)]
    isbn: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    img_url: String,
    #[arg(long, default_value = "1")]
    copies: u32,
    /// Mark the book unavailable even when it has copies
    #[arg(long)]
    unavailable: bool,
}

#[derive(Args)]
struct BookChanges {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    isbn: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    img_url: Option<String>,
    #[arg(long)]
    copies: Option<u32>,
    #[arg(long)]
    available: Option<bool>,
}

impl BookChanges {
    fn apply(self, form: &mut BookForm) {
        if let Some(v) = self.title {
            form.title = v;
        }
        if let Some(v) = self.author {
            form.author = v;
        }
        if let Some(v) = self.genre {
            form.genre = v;
        }
        if let Some(v) = self.isbn {
            form.isbn = v;
        }
        if let Some(v) = self.description {
            form.description = v;
        }
        if let Some(v) = self.img_url {
            form.img_url = v;
        }
        if let Some(v) = self.copies {
            form.set_copies(v);
        }
        if let Some(v) = self.available {
            form.set_available(v);
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("library_client={}", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Print a notification; errors become the command's failure
fn report(notification: &Notification) -> anyhow::Result<()> {
    match notification {
        Notification::Success(msg) => {
            println!("{}", msg);
            Ok(())
        }
        Notification::Error(msg) => bail!("{}", msg),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::load()
        .context("Failed to load configuration")?
        .with_base_url(cli.api_url.clone());

    init_tracing(&config.logging);
    tracing::info!("Starting Library Client v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(api = %config.api.base_url, "using library API");

    let state = AppState::new(config).map_err(|e| anyhow!(e.user_message()))?;
    let ui = state.config.ui.clone();
    let today = Local::now().date_naive();
    let mut app = App::new(state.clone());

    match cli.command {
        Commands::Open { path, search } => {
            app.navigate(&path).await;
            if let (Some(term), Page::List(view)) = (search, app.page_mut()) {
                view.set_search(&term);
            }
            print!("{}", app.render());
        }
        Commands::Summary => {
            app.navigate("/borrow-summary").await;
            print!("{}", app.render());
        }
        Commands::AddBook { book } => {
            app.navigate("/create-book").await;
            let Page::CreateBook(form) = app.page_mut() else {
                bail!("create book page unavailable");
            };
            form.title = book.title;
            form.author = book.author;
            form.genre = book.genre;
            form.isbn = book.isbn;
            form.description = book.description;
            form.img_url = book.img_url;
            form.set_copies(book.copies);
            form.set_available(!book.unavailable);

            let submitted = form
                .submit(&state.api, &ui)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            report(&submitted.notification)?;
            if let Some(redirect) = submitted.redirect {
                app.follow(&redirect).await;
                print!("{}", app.render());
            }
        }
        Commands::EditBook { id, changes } => {
            app.navigate(&format!("/edit-book/{}", id)).await;
            let Page::EditBook(view) = app.page_mut() else {
                bail!("edit book page unavailable");
            };
            let Some(form) = view.form_mut() else {
                let reason = match &view.state {
                    LoadState::Failed(msg) => msg.clone(),
                    _ => "Book not found.".to_string(),
                };
                bail!("{}", reason);
            };
            changes.apply(form);

            let submitted = form
                .submit(&state.api, &ui)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            report(&submitted.notification)?;
            if let Some(redirect) = submitted.redirect {
                app.follow(&redirect).await;
                print!("{}", app.render());
            }
        }
        Commands::DeleteBook { id, yes } => {
            app.navigate("/books").await;
            let Page::List(view) = app.page_mut() else {
                bail!("book list unavailable");
            };
            view.request_delete(&id)
                .map_err(|e| anyhow!(e.user_message()))?;
            print!("{}", view.render());

            let confirmed = yes
                || Confirm::new()
                    .with_prompt("Delete this book?")
                    .default(false)
                    .interact()
                    .context("Failed to read confirmation")?;
            if !confirmed {
                view.cancel();
                println!("Deletion cancelled.");
                return Ok(());
            }

            let notification = view
                .confirm_delete(&state.api)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            app.refresh().await;
            print!("{}", app.render());
            report(&notification)?;
        }
        Commands::Borrow {
            book_id,
            quantity,
            due_date,
        } => {
            app.navigate("/books").await;
            let Page::List(view) = app.page_mut() else {
                bail!("book list unavailable");
            };
            let form = view
                .open_borrow(&book_id, today, ui.default_loan_days)
                .map_err(|e| anyhow!(e.user_message()))?;
            form.quantity = quantity;
            if due_date.is_some() {
                form.due_date = due_date;
            }

            let notification = view
                .submit_borrow(&state.api, today)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            app.refresh().await;
            print!("{}", app.render());
            report(&notification)?;
        }
    }

    Ok(())
}
