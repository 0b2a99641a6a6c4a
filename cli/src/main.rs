/*
    spotify-rainbow-rs | Rust CLI tool to sort playlists into rainbow order.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use rainbow_core::{
    get_spotify_client, HttpImageSource, PlaylistCurator, RainbowConfig, RainbowPreview,
    RainbowSorter,
};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "spotify-rainbow")]
#[command(about = "Sort your Spotify playlists into rainbow order by album art", long_about = None)]
struct Cli {
    /// Covers analyzed concurrently per wave (default: 8, env: RAINBOW_BATCH_SIZE)
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Pause between waves in milliseconds (default: 100, env: RAINBOW_BATCH_DELAY_MS)
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the playlists you can reorder (owned or collaborative)
    List,
    /// Shows the rainbow order of a playlist without changing it
    Preview {
        /// The Spotify ID of the playlist
        #[arg(value_name = "PLAYLIST_ID")]
        playlist_id: String,
        /// Remove duplicate tracks from the proposed order
        #[arg(long)]
        dedup: bool,
        /// Output the preview to a JSON file (e.g., --json=preview.json)
        #[arg(long)]
        json: Option<String>,
    },
    /// Reorders a playlist into rainbow order
    Apply {
        /// The Spotify ID of the playlist
        #[arg(value_name = "PLAYLIST_ID")]
        playlist_id: String,
        /// Remove duplicate tracks before writing the new order
        #[arg(long)]
        dedup: bool,
        /// Output the detailed reorder report to a JSON file
        #[arg(long)]
        json: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if dotenv().is_err() {
        // Silently ignore
    }

    let cli = Cli::parse();
    let config = build_config(&cli);

    match &cli.command {
        Commands::List => {
            handle_list(config).await;
        }
        Commands::Preview {
            playlist_id,
            dedup,
            json,
        } => {
            handle_preview(config, playlist_id, *dedup, json.as_deref()).await;
        }
        Commands::Apply {
            playlist_id,
            dedup,
            json,
        } => {
            handle_apply(config, playlist_id, *dedup, json.as_deref()).await;
        }
    }
}

fn build_config(cli: &Cli) -> RainbowConfig {
    let mut config = RainbowConfig::from_env();
    if let Some(size) = cli.batch_size {
        config = config.with_batch_size(size);
    }
    if let Some(ms) = cli.delay_ms {
        config = config.with_batch_delay(Duration::from_millis(ms));
    }
    log::debug!("Using {:?}", config);
    config
}

async fn get_curator(config: RainbowConfig) -> PlaylistCurator {
    let spotify = match get_spotify_client().await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error initializing Spotify client: {}", e);
            process::exit(1);
        }
    };

    let source = match HttpImageSource::new() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error initializing image downloader: {}", e);
            process::exit(1);
        }
    };

    PlaylistCurator::new(spotify, RainbowSorter::new(Arc::new(source), config))
}

/// A token that is cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!();
            eprintln!("Cancelling color analysis...");
            child.cancel();
        }
    });
    token
}

fn write_json<T: Serialize>(path: &str, value: &T) -> anyhow::Result<()> {
    let json_content = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    let mut file =
        File::create(path).with_context(|| format!("Failed to create file '{}'", path))?;
    file.write_all(json_content.as_bytes())
        .context("Failed to write report to file")?;
    Ok(())
}

fn save_report<T: Serialize>(path: Option<&str>, value: &T) {
    if let Some(path) = path {
        match write_json(path, value) {
            Ok(()) => {
                println!();
                println!("[SAVED] Report saved to: {}", path);
            }
            Err(e) => {
                eprintln!();
                eprintln!("[ERROR] {:#}", e);
            }
        }
    }
}

async fn build_preview(
    curator: &PlaylistCurator,
    playlist_id: &str,
    dedup: bool,
) -> RainbowPreview {
    println!("Analyzing album art of playlist {} ...", playlist_id);
    println!("(Press Ctrl-C to cancel)");

    let cancel = cancel_on_ctrl_c();
    let mut preview = match curator.preview(playlist_id, &cancel).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!();
            eprintln!("[ERROR] Preview failed: {}", e);
            process::exit(1);
        }
    };

    if dedup && preview.has_duplicates {
        let removed = preview.purge_duplicates();
        println!(
            "Removed {} duplicate track{}",
            removed,
            if removed == 1 { "" } else { "s" }
        );
    }

    preview
}

fn print_preview(preview: &RainbowPreview) {
    println!();
    println!("---------------------------------------------------");
    println!("RAINBOW PREVIEW");
    println!("---------------------------------------------------");
    println!("Tracks:               {}", preview.tracks.len());
    println!("Unanalyzable Covers:  {}", preview.undetermined_count);
    println!("---------------------------------------------------");
    for group in &preview.groups {
        println!("  {:<15} {}", group.group.to_string(), group.tracks);
    }
    println!("---------------------------------------------------");

    println!();
    for (i, track) in preview.tracks.iter().enumerate() {
        println!("{:>4}. {}", i + 1, track);
    }

    if preview.has_duplicates {
        println!();
        println!("[WARN] This playlist contains duplicate tracks. Use --dedup to remove them.");
    }
}

async fn handle_list(config: RainbowConfig) {
    let curator = get_curator(config).await;
    println!("Fetching your playlists...");

    match curator.list_editable_playlists().await {
        Ok(playlists) => {
            println!();
            println!(
                "{:<25} | {:<30} | {:<20} | {:<6} | {:<5}",
                "ID", "Name", "Owner", "Tracks", "Collab"
            );
            println!(
                "{:-<25}-+-{:-<30}-+-{:-<20}-+-{:-<6}-+-{:-<5}",
                "", "", "", "", ""
            );

            for pl in playlists {
                let name = truncate(&pl.name, 28);
                let owner = truncate(&pl.owner_name, 18);
                let collab = if pl.is_collaborative { "Yes" } else { "No" };

                println!(
                    "{:<25} | {:<30} | {:<20} | {:<6} | {:<5}",
                    pl.id, name, owner, pl.total_tracks, collab
                );
            }
            println!();
            println!("Tip: Copy an ID and run 'rainbow-cli preview <ID>'");
        }
        Err(e) => {
            eprintln!("Failed to list playlists: {}", e);
            process::exit(1);
        }
    }
}

async fn handle_preview(config: RainbowConfig, playlist_id: &str, dedup: bool, json: Option<&str>) {
    let curator = get_curator(config).await;
    let preview = build_preview(&curator, playlist_id, dedup).await;
    print_preview(&preview);
    save_report(json, &preview);
}

async fn handle_apply(config: RainbowConfig, playlist_id: &str, dedup: bool, json: Option<&str>) {
    let curator = get_curator(config).await;
    let preview = build_preview(&curator, playlist_id, dedup).await;

    if preview.tracks.is_empty() {
        println!();
        println!("No tracks found in this playlist. Nothing to do.");
        return;
    }

    println!();
    println!("Writing {} tracks in rainbow order...", preview.tracks.len());

    match curator.apply_order(playlist_id, &preview.tracks).await {
        Ok(report) => {
            println!();
            println!("---------------------------------------------------");
            println!("REORDER {}", if report.is_success() { "COMPLETE" } else { "INCOMPLETE" });
            println!("---------------------------------------------------");
            println!("Tracks Written:   {}", report.tracks_written);
            println!("Requests:         {}", report.batch_logs.len());
            for log in report.batch_logs.iter().filter(|l| !l.is_success()) {
                println!("  Request {}: {}", log.batch_index, log.status);
            }
            let missing = report.unwritten_track_ids();
            if !missing.is_empty() {
                println!("Missing Tracks:   {}", missing.len());
                for id in missing {
                    println!("  {}", id);
                }
            }
            println!("---------------------------------------------------");

            save_report(json, &report);

            if !report.is_success() {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!();
            eprintln!("[ERROR] Reorder failed: {}", e);
            process::exit(1);
        }
    }
}

/// Shortens `text` to `max` characters, marking the cut with "..".
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{}..", cut)
    } else {
        text.to_string()
    }
}
