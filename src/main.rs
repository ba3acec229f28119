//! # chatvault CLI
//!
//! Command-line interface for the chatvault library.

use std::fs::File;
use std::io::BufWriter;
use std::process;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use clap::Parser as ClapParser;

use chatvault::archive::{export_archive, import_archive};
use chatvault::cli::{Args, Command, ExportFormat};
use chatvault::config::{DateOrder, ParserConfig};
use chatvault::logging::init_logging;
use chatvault::media::MediaIndex;
use chatvault::output::{write_csv, write_jsonl};
use chatvault::progress::stderr_progress;
use chatvault::store::{ChatStats, ChatStore};
use chatvault::{ChatParser, ChatvaultError, StoredMessage};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ Error: {}", e);
        if e.is_unrecognized() {
            eprintln!("   Expected a WhatsApp \"Export chat\" .txt file (iOS or Android).");
        }
        process::exit(1);
    }
}

fn run() -> Result<(), ChatvaultError> {
    let args = <Args as ClapParser>::parse();
    init_logging(args.log_level.as_deref());

    let mut store = ChatStore::open(&args.db)?;

    match args.command {
        Command::Import {
            input,
            name,
            media_dir,
            date_order,
            progress,
        } => {
            println!("📦 chatvault v{}", env!("CARGO_PKG_VERSION"));
            println!("{RULE}");
            println!("📂 Input:    {}", input.display());
            println!("🗄️  Database: {}", args.db.display());
            if date_order == DateOrder::MonthFirst {
                println!("📅 Dates:    month first");
            }
            println!();

            let start = Instant::now();
            let parser = ChatParser::with_config(ParserConfig::new().with_date_order(date_order));
            println!("⏳ Parsing...");
            let mut result = if progress {
                parser.parse_file_with_progress(&input, &stderr_progress())?
            } else {
                parser.parse_file(&input)?
            }
            .into_recognized()?;
            if let Some(name) = name {
                result.chat.name = name;
            }
            println!(
                "   Found {} messages from {} senders ({} export, {:.2}s)",
                result.messages.len(),
                result.senders.len(),
                result.chat.platform,
                start.elapsed().as_secs_f64()
            );
            if !result.warnings.is_empty() {
                println!("⚠️  {} lines skipped or repaired:", result.warnings.len());
                for warning in result.warnings.iter().take(5) {
                    println!("   {warning}");
                }
            }

            let media = match media_dir {
                Some(dir) => {
                    let media = MediaIndex::from_dir(&dir)?;
                    println!("🖼️  Media:    {} files in {}", media.len(), dir.display());
                    media
                }
                None => MediaIndex::new(),
            };

            let chat_id = store.ingest_with_media(&result, &media)?;
            println!();
            println!("✅ Done! Imported \"{}\" as chat #{}", result.chat.name, chat_id);
            println!(
                "   Total time: {:.2}s",
                start.elapsed().as_secs_f64()
            );
        }

        Command::List => {
            let chats = store.list_chats()?;
            if chats.is_empty() {
                println!("No chats yet. Import one with `chatvault import <file>`.");
            }
            for summary in chats {
                let span = match (summary.first_message, summary.last_message) {
                    (Some(first), Some(last)) => format!(
                        "{} → {}",
                        first.with_timezone(&Local).format("%Y-%m-%d"),
                        last.with_timezone(&Local).format("%Y-%m-%d")
                    ),
                    _ => "empty".to_string(),
                };
                println!(
                    "#{:<4} {} ({}, {} messages, {})",
                    summary.chat.id,
                    summary.chat.name,
                    summary.chat.platform,
                    summary.message_count,
                    span
                );
            }
        }

        Command::Show {
            chat_id,
            limit,
            offset,
        } => {
            let chat = store.chat(chat_id)?;
            println!("💬 {}", chat.name);
            println!("{RULE}");
            for message in store.messages(chat_id, limit, offset)? {
                println!("{}", format_message(&message));
            }
        }

        Command::Context { message_id, window } => {
            let anchor = store.message(message_id)?;
            for message in store.neighborhood(anchor.chat_id, message_id, window)? {
                let marker = if message.id == message_id { "▶" } else { " " };
                println!("{marker} {}", format_message(&message));
            }
        }

        Command::Search { query, limit } => {
            let hits = store.search(&query, limit)?;
            println!("🔍 {} results for \"{}\"", hits.len(), query);
            for hit in hits {
                println!("[{}] {}", hit.chat_name, format_message(&hit.message));
            }
        }

        Command::Stats { chat, top } => {
            let stats = store.chat_stats(chat, top)?;
            match chat {
                Some(id) => println!("📊 {}", store.chat(id)?.name),
                None => println!("📊 All chats"),
            }
            println!("{RULE}");
            print_stats(&stats);
        }

        Command::Highlights { min_length, limit } => {
            for message in store.random_highlights(min_length, limit)? {
                println!("✨ {}", format_message(&message));
            }
        }

        Command::OnThisDay { date, limit } => {
            let day = match date {
                Some(date) => NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .map_err(|_| ChatvaultError::invalid_date(date))?,
                None => Local::now().date_naive(),
            };
            let memories = store.on_this_day(day, limit)?;
            if memories.is_empty() {
                println!("Nothing from around {} in other years.", day.format("%B %-d"));
            }
            for message in memories {
                println!("🕰️  {}", format_message(&message));
            }
        }

        Command::Delete { chat_id } => {
            if !store.delete_chat(chat_id)? {
                return Err(ChatvaultError::not_found("chat", chat_id));
            }
            println!("🗑️  Deleted chat #{chat_id}");
        }

        Command::Export {
            chat_id,
            format,
            output,
        } => {
            println!("💾 Writing {}...", format);
            match format {
                ExportFormat::Archive => {
                    let summary = export_archive(&store, chat_id, &output)?;
                    println!(
                        "✅ Done! {} messages and {} media files saved to {}",
                        summary.messages,
                        summary.media_files,
                        output.display()
                    );
                }
                ExportFormat::Jsonl | ExportFormat::Csv => {
                    store.chat(chat_id)?;
                    let messages = store.all_messages(chat_id)?;
                    let writer = BufWriter::new(File::create(&output)?);
                    if format == ExportFormat::Csv {
                        write_csv(&messages, writer)?;
                    } else {
                        write_jsonl(&messages, writer)?;
                    }
                    println!(
                        "✅ Done! {} messages saved to {}",
                        messages.len(),
                        output.display()
                    );
                }
            }
        }

        Command::Restore { dir } => {
            let chat_id = import_archive(&mut store, &dir)?;
            let chat = store.chat(chat_id)?;
            println!("✅ Done! Restored \"{}\" as chat #{}", chat.name, chat_id);
        }
    }

    Ok(())
}

/// One message as a terminal line, in local time.
fn format_message(message: &StoredMessage) -> String {
    let time = message.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    let mut line = if message.sender_id.is_some() {
        format!("#{} [{}] {}: {}", message.id, time, message.sender_label(), message.content)
    } else {
        format!("#{} [{}] * {}", message.id, time, message.content)
    };
    if let Some(uri) = &message.media_uri {
        line.push_str(&format!(" 📎 {uri}"));
    }
    line
}

fn print_stats(stats: &ChatStats) {
    println!("   Messages:     {}", stats.total_messages);
    println!("   Active days:  {}", stats.active_days);
    if let Some(day) = stats.busiest_weekday() {
        println!("   Busiest day:  {}", WEEKDAYS[day]);
    }
    if let Some(hour) = stats.busiest_hour() {
        println!("   Busiest hour: {hour:02}:00");
    }
    if !stats.top_senders.is_empty() {
        println!();
        println!("👥 Top senders:");
        for (rank, sender) in stats.top_senders.iter().enumerate() {
            println!("   {}. {} ({})", rank + 1, sender.name, sender.count);
        }
    }
}
