use std::fs::File;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use filedrop_core::{CoreConfig, FileKey, FileStore, ListingService, ThumbnailGenerator};

#[derive(Parser)]
#[command(name = "filedrop")]
#[command(about = "filedrop store maintenance CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored files
    List,
    /// Store a local file
    Put {
        /// Local file to store
        path: PathBuf,
        /// Name to store under (defaults to the file's own name)
        #[arg(long)]
        name: Option<String>,
        /// Skip thumbnail generation even for images
        #[arg(long)]
        no_thumbnail: bool,
    },
    /// Copy a stored file out of the store
    Get {
        /// Stored file name
        name: String,
        /// Destination path (defaults to the stored name in the current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate (or regenerate) the thumbnail for a stored image
    Thumbnail {
        /// Stored file name
        name: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'filedrop --help' for commands");
        return Ok(());
    };

    let cfg = CoreConfig::from_env()?;
    cfg.ensure_directories()?;
    let store = FileStore::new(cfg.store_dir())?.with_max_file_size(cfg.max_upload_bytes());

    match command {
        Commands::List => {
            let records = ListingService::from_config(store, &cfg).list()?;
            if records.is_empty() {
                println!("No files stored.");
            }
            for record in records {
                let thumbnail = record.thumbnail_url.as_deref().unwrap_or("-");
                println!(
                    "{}\t{}\t{}\t{}",
                    record.name, record.size, record.mod_time, thumbnail
                );
            }
        }
        Commands::Put {
            path,
            name,
            no_thumbnail,
        } => {
            let name = match name {
                Some(name) => name,
                None => path.to_string_lossy().into_owned(),
            };
            let source = File::open(&path)?;
            match store.put(&name, source) {
                Ok(stored) => {
                    println!("Stored {} ({} bytes)", stored.name, stored.size_bytes);
                    if !no_thumbnail && cfg.thumbnails_enabled() && cfg.is_image(&stored.name) {
                        report(write_thumbnail(&cfg, &store, &stored.name));
                    }
                }
                Err(e) => eprintln!("Error storing {}: {}", path.display(), e),
            }
        }
        Commands::Get { name, out } => match store.read(&name) {
            Ok(content) => {
                let out = match out {
                    Some(out) => out,
                    None => PathBuf::from(FileKey::sanitize(&name)?.as_str()),
                };
                std::fs::write(&out, &content)?;
                println!("Wrote {} bytes to {}", content.len(), out.display());
            }
            Err(e) => eprintln!("Error reading {}: {}", name, e),
        },
        Commands::Thumbnail { name } => {
            let key = FileKey::sanitize(&name)?;
            if !cfg.is_image(&key) {
                eprintln!("{} does not have an image extension", key);
                return Ok(());
            }
            report(write_thumbnail(&cfg, &store, &key));
        }
    }

    Ok(())
}

/// Generate the thumbnail for `key` synchronously, describing what actually happened.
fn write_thumbnail(cfg: &CoreConfig, store: &FileStore, key: &FileKey) -> Result<String, String> {
    let generator = ThumbnailGenerator::from_config(cfg);
    match generator.generate(&store.path_for(key), key) {
        Ok(path) => Ok(format!("Wrote thumbnail {}", path.display())),
        Err(e) => Err(format!("Error generating thumbnail for {}: {}", key, e)),
    }
}

fn report(outcome: Result<String, String>) {
    match outcome {
        Ok(message) => println!("{}", message),
        Err(message) => eprintln!("{}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use tempfile::TempDir;

    fn setup() -> (TempDir, CoreConfig, FileStore) {
        let temp = TempDir::new().unwrap();
        let cfg = CoreConfig::new(temp.path().join("uploads"), temp.path().join("thumbnails"));
        cfg.ensure_directories().unwrap();
        let store = FileStore::new(cfg.store_dir()).unwrap();
        (temp, cfg, store)
    }

    #[test]
    fn corrupt_image_reports_failure() {
        let (_temp, cfg, store) = setup();
        let stored = store.put("broken.png", &b"not a png"[..]).unwrap();

        let outcome = write_thumbnail(&cfg, &store, &stored.name);
        let message = outcome.unwrap_err();
        assert!(message.contains("broken.png"), "{message}");
        assert!(!cfg.thumbnail_dir().join("broken.png").exists());
    }

    #[test]
    fn valid_image_reports_written_thumbnail() {
        let (_temp, cfg, store) = setup();
        let img = ImageBuffer::from_fn(300, 150, |x, _| Rgb([(x % 256) as u8, 40, 90]));
        img.save_with_format(store.root_directory().join("wide.png"), ImageFormat::Png)
            .unwrap();
        let key = FileKey::sanitize("wide.png").unwrap();

        let message = write_thumbnail(&cfg, &store, &key).unwrap();
        assert!(message.starts_with("Wrote thumbnail"), "{message}");
        let thumb = image::open(cfg.thumbnail_dir().join("wide.png")).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (100, 50));
    }
}
