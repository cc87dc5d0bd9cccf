//! lark-cli - 命令行工具
//!
//! 列目录、查看曲目信息、无界面播放

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use lark_library::{list_entries, DirEntry};
use lark_player::{
    format_time, probe_metadata, spawn_engine, EngineConfig, MediaStatus, PlaybackController,
    PlaybackSource, PlayerNotification,
};
use serde::Serialize;

/// `info` 子命令的输出
#[derive(Debug, Serialize)]
struct TrackInfo {
    valid: bool,
    codec: String,
    sample_rate: u32,
    channels: usize,
    duration_ms: u64,
    duration: String,
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    has_cover: bool,
}

fn usage(program: &str) -> ExitCode {
    eprintln!("Usage:");
    eprintln!("  {} list <dir> [--json]", program);
    eprintln!("  {} info <file>          # prints JSON", program);
    eprintln!("  {} play <file|file://...> [volume]", program);
    ExitCode::from(1)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("lark-cli");

    if args.len() < 3 {
        return usage(program);
    }

    let target = PathBuf::from(&args[2]);
    match args[1].as_str() {
        "list" => list(&target, args.iter().any(|a| a == "--json")),
        "info" => info(&target),
        "play" => {
            let Some(source) = PlaybackSource::parse(&args[2]) else {
                eprintln!("Empty locator");
                return usage(program);
            };
            let volume = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(50);
            play(source, volume)
        }
        other => {
            eprintln!("Unknown command: {}", other);
            usage(program)
        }
    }
}

fn list(dir: &Path, json: bool) -> ExitCode {
    let listing = list_entries(dir);
    if listing.error.is_some() {
        // list_entries 已记录原因
        return ExitCode::from(2);
    }

    if json {
        return print_json(&listing.entries);
    }

    for DirEntry { name, is_dir, .. } in &listing.entries {
        if *is_dir {
            println!("{}/", name);
        } else {
            println!("{}", name);
        }
    }
    ExitCode::SUCCESS
}

fn info(path: &Path) -> ExitCode {
    let (audio, metadata) = match probe_metadata(path) {
        Ok(probed) => probed,
        Err(e) => {
            println!(
                "{}",
                serde_json::json!({ "valid": false, "error": e.to_string() })
            );
            return ExitCode::from(2);
        }
    };

    let info = TrackInfo {
        valid: true,
        duration_ms: audio.duration_ms(),
        duration: format_time(audio.duration_ms()),
        codec: audio.codec,
        sample_rate: audio.sample_rate,
        channels: audio.channels,
        has_cover: metadata.artwork().is_some(),
        title: metadata.title,
        artist: metadata.artist,
        album: metadata.album,
    };
    print_json(&info)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to serialize: {}", e);
            ExitCode::from(2)
        }
    }
}

fn play(source: PlaybackSource, volume: i32) -> ExitCode {
    let engine = match spawn_engine(EngineConfig::default()) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    log::info!("playing {} at volume {}", source, volume);
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut controller = PlaybackController::new(engine, tx);
    controller.set_volume(volume);
    controller.set_source(source);
    controller.play();

    let mut duration = 0;
    let mut last_second = u64::MAX;
    loop {
        controller.process_events();

        for notification in rx.try_iter() {
            match notification {
                PlayerNotification::DurationChanged(d) => duration = d,
                PlayerNotification::PositionChanged(pos) if pos / 1000 != last_second => {
                    last_second = pos / 1000;
                    print!("\r{} / {}", format_time(pos), format_time(duration));
                    let _ = std::io::stdout().flush();
                }
                PlayerNotification::MetadataChanged(meta) => {
                    if let Some(title) = &meta.title {
                        println!("{}", title);
                    }
                }
                PlayerNotification::Error(e) => eprintln!("\n{}", e),
                PlayerNotification::MediaStatusChanged(MediaStatus::EndOfMedia) => {
                    println!();
                    log::info!("end of media");
                    return ExitCode::SUCCESS;
                }
                PlayerNotification::MediaStatusChanged(MediaStatus::InvalidMedia) => {
                    log::warn!("cannot play this source");
                    return ExitCode::from(3);
                }
                _ => {}
            }
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}
