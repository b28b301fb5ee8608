use std::path::PathBuf;

use chart_types::MetadataField;
use clap::{Parser, Subcommand, ValueEnum};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    ", ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "chart-sync", version = VERSION)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Optional TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory with one sub-directory per chart collection (default: ./data)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy a field from one snapshot into every other week that lacks it
    #[command(alias = "copy-images")]
    Propagate {
        /// Source snapshot (default: <data-dir>/Signe/2026-W04.json)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Target collection directory; repeat for several (default: the source's collection)
        #[arg(long = "target")]
        targets: Vec<PathBuf>,

        /// Field to copy (default: image-url)
        #[arg(long, value_enum)]
        field: Option<FieldArg>,
    },

    /// Fill unknown titles/artists from Spotify for allow-listed tracks
    Enrich {
        /// Snapshot to update (default: <data-dir>/Walter/2026-W04.json)
        path: Option<PathBuf>,

        /// Track id eligible for lookup; repeat for several (replaces the configured list)
        #[arg(long = "track-id")]
        track_ids: Vec<String>,
    },

    /// Look up one track and print its metadata as JSON
    FetchTrack {
        /// Spotify track id
        track_id: String,
    },

    /// List entries that are missing a title, artists or image
    Audit {
        /// Snapshot to inspect (default: <data-dir>/Walter/2026-W04.json)
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FieldArg {
    ImageUrl,
    SpotifyUrl,
    Title,
    Artists,
}

impl From<FieldArg> for MetadataField {
    fn from(arg: FieldArg) -> Self {
        match arg {
            FieldArg::ImageUrl => MetadataField::ImageUrl,
            FieldArg::SpotifyUrl => MetadataField::SpotifyUrl,
            FieldArg::Title => MetadataField::Title,
            FieldArg::Artists => MetadataField::Artists,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_images_alias_parses_targets() {
        let args = Args::try_parse_from([
            "chart-sync",
            "copy-images",
            "--source",
            "data/Signe/2026-W04.json",
            "--target",
            "data/Signe",
            "--target",
            "data/Walter",
        ])
        .unwrap();
        match args.cmd {
            Command::Propagate {
                source,
                targets,
                field,
            } => {
                assert_eq!(source, Some(PathBuf::from("data/Signe/2026-W04.json")));
                assert_eq!(
                    targets,
                    vec![PathBuf::from("data/Signe"), PathBuf::from("data/Walter")]
                );
                assert_eq!(field, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn enrich_accepts_optional_path_and_ids() {
        let args = Args::try_parse_from([
            "chart-sync",
            "enrich",
            "week.json",
            "--track-id",
            "X1",
            "--data-dir",
            "/srv/data",
        ])
        .unwrap();
        assert_eq!(args.data_dir, Some(PathBuf::from("/srv/data")));
        match args.cmd {
            Command::Enrich { path, track_ids } => {
                assert_eq!(path, Some(PathBuf::from("week.json")));
                assert_eq!(track_ids, vec!["X1".to_string()]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn field_flag_maps_to_metadata_field() {
        let args =
            Args::try_parse_from(["chart-sync", "propagate", "--field", "spotify-url"]).unwrap();
        let Command::Propagate { field, .. } = args.cmd else {
            panic!("expected propagate");
        };
        assert_eq!(field.map(MetadataField::from), Some(MetadataField::SpotifyUrl));
    }
}
