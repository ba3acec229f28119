//! Synthetic WhatsApp export generator for stress testing chatvault.
//!
//! Usage: cargo run --features gen-test --bin gen_export -- [messages] [output] [ios|android]
//! Example: cargo run --features gen-test --bin gen_export -- 100000 heavy_chat.txt android

use rand::Rng;
use rand::seq::SliceRandom;
use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;

use chrono::{Duration, NaiveDate, NaiveDateTime};

const SENDERS: &[&str] = &[
    "Alice",
    "Bob",
    "Иван",
    "Мария",
    "村上",
    "محمد",
    "+44 7700 900123",
    "🔥FireUser🔥",
];

const EMOJIS: &[&str] = &["😀", "😂", "😍", "🤔", "🔥", "👍", "❤️", "🏳️‍🌈", "👨‍👩‍👧‍👦"];

const ATTACHMENT_NAMES: &[&str] = &[
    "IMG-20210620-WA0001.jpg",
    "VID-20210620-WA0002.mp4",
    "PTT-20210620-WA0003.opus",
    "STK-20210620-WA0004.webp",
    "Contract final (2).pdf",
    "Mum.vcf",
];

#[derive(Clone, Copy)]
enum Layout {
    Ios,
    Android,
}

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();

    let count: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(100_000);
    let output = args.get(2).map_or("heavy_chat.txt", String::as_str);
    let layout = match args.get(3).map_or("android", String::as_str) {
        "ios" | "iphone" => Layout::Ios,
        "android" => Layout::Android,
        other => {
            eprintln!("Unknown layout: {other}. Use 'ios' or 'android'");
            std::process::exit(1);
        }
    };

    println!("🧪 Export Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Messages: {count}");
    println!("   Output:   {output}");
    println!(
        "   Layout:   {}",
        match layout {
            Layout::Ios => "iOS",
            Layout::Android => "Android",
        }
    );
    println!();

    let mut writer = BufWriter::with_capacity(1024 * 1024, File::create(output)?);
    let mut rng = rand::thread_rng();
    let start = Instant::now();
    let mut bytes_written = 0usize;

    let mut at = NaiveDate::from_ymd_opt(2019, 3, 1)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .unwrap_or_default();

    let header = format!(
        "{} Messages and calls are end-to-end encrypted. No one outside of this chat can read them.\n",
        stamp(layout, at, true)
    );
    writer.write_all(header.as_bytes())?;
    bytes_written += header.len();

    for i in 0..count {
        at += Duration::seconds(rng.gen_range(5..3_600));
        let sender = SENDERS.choose(&mut rng).copied().unwrap_or("Alice");
        let body = generate_body(&mut rng, layout, i);

        let line = if i % 250 == 125 {
            format!("{} {sender} changed the group description\n", stamp(layout, at, true))
        } else {
            format!("{} {sender}: {body}\n", stamp(layout, at, false))
        };
        writer.write_all(line.as_bytes())?;
        bytes_written += line.len();

        if (i + 1) % 10_000 == 0 {
            let elapsed = start.elapsed().as_secs_f64();
            eprint!(
                "\r   Generated {}/{} ({:.1} MB, {:.0} msg/s)",
                i + 1,
                count,
                bytes_written as f64 / 1_000_000.0,
                (i + 1) as f64 / elapsed
            );
        }
    }

    writer.flush()?;

    let elapsed = start.elapsed();
    println!("\n\n✅ Done!");
    println!("   Size: {:.2} MB", bytes_written as f64 / 1_000_000.0);
    println!("   Time: {:.2}s", elapsed.as_secs_f64());
    println!(
        "   Speed: {:.0} msg/s",
        count as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}

/// Message header prefix. System lines on Android have no sender, so the
/// caller writes the body straight after the separator.
fn stamp(layout: Layout, at: NaiveDateTime, system: bool) -> String {
    match layout {
        Layout::Ios => {
            // iOS prefixes system lines with a left-to-right mark.
            let mark = if system { "\u{200e}" } else { "" };
            format!("{mark}[{}]", at.format("%d/%m/%Y, %H:%M:%S"))
        }
        Layout::Android => format!("{} -", at.format("%d/%m/%Y, %H:%M")),
    }
}

fn generate_body(rng: &mut impl Rng, layout: Layout, index: usize) -> String {
    match index % 20 {
        0..=7 => format!("Normal message #{index} with some text"),

        // Continuation lines, including one that looks like a header
        8 => format!("First line #{index}\nsecond line\n\nafter a blank line"),
        9 => format!("Quoting:\n20/06/2021 was a good day #{index}"),

        10 => {
            let emojis: String = (0..20)
                .map(|_| EMOJIS.choose(rng).copied().unwrap_or("🙂"))
                .collect();
            format!("Emoji spam: {emojis} #{index}")
        }

        11 => format!("Кириллица и 日本語 mixed #{index}"),

        12 => match layout {
            Layout::Ios => "\u{200e}image omitted".to_string(),
            Layout::Android => "<Media omitted>".to_string(),
        },

        13 => {
            let name = ATTACHMENT_NAMES.choose(rng).copied().unwrap_or("file.bin");
            match layout {
                Layout::Ios => format!("\u{200e}<attached: {index:08}-{name}>"),
                Layout::Android => format!("{name} (file attached)"),
            }
        }

        14 => "This message was deleted".to_string(),
        15 => "Missed voice call".to_string(),
        16 => format!(
            "location: https://maps.google.com/?q={:.5},{:.5}",
            rng.gen_range(-90.0..90.0),
            rng.gen_range(-180.0..180.0)
        ),
        17 => format!("Call me at 10:30 - seriously: it's urgent #{index}"),

        // Directional marks sprinkled around names and text
        18 => format!("\u{202a}wrapped in embedding marks\u{202c} #{index}"),

        _ => format!("Giant message #{index}: {}", "X".repeat(rng.gen_range(1_000..20_000))),
    }
}
