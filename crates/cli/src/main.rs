use anyhow::Context;
use bibliotek_core::config::{dir_from_env_value, max_upload_bytes_from_env_value};
use bibliotek_core::{
    BookMetadata, BookRecord, BookService, CoreConfig, UploadRequest, UploadedFile,
    DEFAULT_DATA_DIR, DEFAULT_UPLOADS_DIR,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bibliotek")]
#[command(about = "Bibliotek library catalog CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all books
    List,
    /// Search title, author and category (case-insensitive)
    Search {
        query: String,
    },
    /// Upload a PDF and create its catalog entry
    Upload {
        /// Path to the PDF
        path: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long)]
        year: i32,
        #[arg(long, default_value = "")]
        description: String,
        /// Cover image (optional)
        #[arg(long)]
        cover: Option<PathBuf>,
    },
    /// Delete a book and its stored files
    Delete {
        /// Book id (32 hex characters)
        id: String,
    },
    /// Copy a stored file out of the uploads directory
    Download {
        /// Stored name, as found in pdfUrl or imageUrl
        name: String,
        /// Destination path
        dest: PathBuf,
    },
    /// List user accounts
    Users,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'bibliotek --help' for commands");
        return Ok(());
    };

    let service = open_service()?;

    match command {
        Commands::List => print_books(&service.list_books()?),
        Commands::Search { query } => print_books(&service.search_books(&query)?),
        Commands::Upload {
            path,
            title,
            author,
            category,
            year,
            description,
            cover,
        } => {
            let metadata = BookMetadata::new(&title, &author, &category, year, &description)?;
            let document = read_upload(&path)?;
            let cover = cover.as_deref().map(read_upload).transpose()?;

            let record = service.upload_book(UploadRequest {
                metadata,
                document,
                cover,
            })?;
            println!("Uploaded '{}' with ID: {}", record.title, record.id);
            println!("Stored as: {}", record.pdf_url);
        }
        Commands::Delete { id } => {
            let report = service.delete_book(&id)?;
            println!(
                "Deleted {} (document removed: {}, cover removed: {})",
                report.id, report.document_deleted, report.cover_deleted
            );
        }
        Commands::Download { name, dest } => {
            let bytes = service.read_document(&name)?;
            std::fs::write(&dest, &bytes)
                .with_context(|| format!("failed to write {}", dest.display()))?;
            println!("Wrote {} bytes to {}", bytes.len(), dest.display());
        }
        Commands::Users => {
            for user in service.users() {
                println!("{} ({})", user.username, user.role);
            }
        }
    }

    Ok(())
}

fn open_service() -> anyhow::Result<BookService> {
    let uploads_dir = dir_from_env_value(
        std::env::var("BIBLIOTEK_UPLOADS_DIR").ok(),
        DEFAULT_UPLOADS_DIR,
    );
    let data_dir = dir_from_env_value(std::env::var("BIBLIOTEK_DATA_DIR").ok(), DEFAULT_DATA_DIR);
    let max_upload_bytes =
        max_upload_bytes_from_env_value(std::env::var("BIBLIOTEK_MAX_UPLOAD_BYTES").ok())?;

    let cfg = CoreConfig::new(uploads_dir, data_dir, max_upload_bytes)?;
    Ok(BookService::open(&cfg)?)
}

fn read_upload(path: &Path) -> anyhow::Result<UploadedFile> {
    let content =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".into());
    Ok(UploadedFile::new(name, content)?)
}

fn print_books(books: &[BookRecord]) {
    if books.is_empty() {
        println!("No books found.");
        return;
    }
    for book in books {
        println!(
            "ID: {}, Title: {}, Author: {}, Year: {}, Category: {}, PDF: {}",
            book.id, book.title, book.author, book.year, book.category, book.pdf_url
        );
    }
}
