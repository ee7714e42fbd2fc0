use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use vidtool::engine::{MediaType, Resolution};

#[derive(Parser)]
#[command(name = "vidtool")]
#[command(about = "Download, compress and convert media with yt-dlp and ffmpeg", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print the job report as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download one or more URLs, one after another
    Download {
        /// URLs, or any text containing them
        urls: Vec<String>,

        /// Read URLs from a text file (links are picked out of the text)
        #[arg(long, value_name = "FILE")]
        from_file: Option<PathBuf>,

        /// Maximum video height: best, 1080p, 720p, 480p, 360p, 240p, 144p
        #[arg(short, long, default_value = "best")]
        resolution: Resolution,

        /// audio, video or both
        #[arg(short, long, default_value = "video")]
        media: MediaType,

        /// Destination folder (defaults to the last one used)
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Cookie file for the downloader (defaults to cookieyt.txt in the config folder)
        #[arg(long)]
        cookies: Option<PathBuf>,
    },

    /// Re-encode a video to land near a target size
    Compress {
        /// Video file to compress
        file: PathBuf,

        /// Target size in MB; 0 compresses as far as possible
        #[arg(short, long, default_value_t = 0)]
        target_mb: u32,

        /// Destination folder (defaults to the last one used)
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },

    /// Convert a file, or every compatible file in a folder, to another format
    Convert {
        /// File or folder to convert
        source: PathBuf,

        /// Output format (extension), e.g. mp4, mp3, png
        #[arg(long = "to")]
        format: String,

        /// Treat SOURCE as a folder and convert every compatible file in it
        #[arg(long)]
        folder: bool,

        /// Destination folder (defaults to the last one used)
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },

    /// List the output formats offered for a file or folder
    Formats {
        path: PathBuf,
    },

    /// Probe a media file to get its duration
    Probe {
        /// Path to the media file
        file: PathBuf,
    },

    /// Check that ffmpeg, ffprobe and the downloader can be found
    CheckTools,

    /// Save the ffmpeg executable location (ffprobe must sit next to it)
    SetFfmpeg {
        path: PathBuf,
    },

    /// Show config status and location, or create default config if missing
    InitConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
