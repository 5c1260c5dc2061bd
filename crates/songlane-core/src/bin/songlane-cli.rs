use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use songlane_core::{
    LyricLine, Lyrics, Song, SonglaneConfig,
    diagnostics::{init_tracing_from_config, song_span},
    fixtures::demo_song,
    persistence::{autosave_song, load_song, save_song},
};

#[derive(Debug, Parser)]
#[command(name = "songlane-cli")]
#[command(about = "Headless tools for Songlane song documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Overrides `paths.logs_dir` from songlane.config.toml.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Writes the demo song, by default into `paths.export_dir`.
    Demo {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Loads a song, validates it and prints a summary.
    Inspect {
        path: PathBuf,

        #[arg(long, value_enum, default_value = "summary")]
        format: InspectFormat,

        /// Also writes an autosave copy into `paths.autosave_dir`.
        #[arg(long)]
        autosave: bool,
    },
    /// Spreads lyric text over a tick range and prints the words.
    Tokenize {
        text: String,

        #[arg(long, default_value_t = 0)]
        start: i64,

        #[arg(long, default_value_t = 1_920)]
        end: i64,
    },
}

#[derive(Debug, Clone, ValueEnum)]
enum InspectFormat {
    Summary,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = SonglaneConfig::load_or_default()?;
    let log_dir = cli.log_dir.unwrap_or_else(|| config.paths.logs_dir.clone());
    let _telemetry = init_tracing_from_config(&log_dir, &config.diagnostics)?;

    match cli.command {
        Commands::Demo { output } => {
            let output =
                output.unwrap_or_else(|| config.paths.export_dir.join("demo.songlane.json"));
            let song = demo_song();
            let _song_scope = song_span(&song).entered();
            save_song(&output, &song)?;
            tracing::info!(path = %output.display(), "demo song written");
        }
        Commands::Inspect {
            path,
            format,
            autosave,
        } => {
            let song = load_song(&path)?;
            let _song_scope = song_span(&song).entered();
            match format {
                InspectFormat::Summary => {
                    println!("{}", serde_json::to_string_pretty(&summary(&song))?);
                }
                InspectFormat::Json => println!("{}", serde_json::to_string_pretty(&song)?),
            }
            if autosave {
                let saved = autosave_song(&song, &config.paths.autosave_dir)?;
                tracing::info!(path = %saved.display(), "autosave written");
            }
        }
        Commands::Tokenize { text, start, end } => {
            let mut lyrics = Lyrics::with_line_length(config.song.lyric_line_length);
            let index = lyrics.create_line_from_string(&text, start, end, None);
            if let Some(line) = lyrics.line_at(index) {
                print_words(line);
            }
        }
    }

    Ok(())
}

fn summary(song: &Song) -> serde_json::Value {
    json!({
        "id": song.id(),
        "ppq": song.ppq(),
        "tempo_changes": song.tempo_events().len(),
        "time_signatures": song.time_signatures().len(),
        "tracks": song
            .tracks()
            .iter()
            .map(|track| json!({
                "id": track.id(),
                "kind": track.kind(),
                "clips": track.clip_count(),
                "start_tick": track.start_tick(),
                "end_tick": track.end_tick(),
            }))
            .collect::<Vec<_>>(),
        "last_tick": song.last_tick(),
        "duration_seconds": song.duration(),
        "lyric_lines": song.lyrics().line_count(),
        "structures": song.structures().len(),
    })
}

fn print_words(line: &LyricLine) {
    for word in line.words() {
        println!("{:>8} {:>8}  {:?}", word.start_tick(), word.end_tick(), word.word());
    }
}
