//! The `watermill preset` command for saving and inspecting settings presets.

use clap::{Args, Subcommand};
use watermill_core::{Config, PresetStore};

use super::settings::WatermarkArgs;
use super::types::ConflictArg;

/// Arguments for the `preset` command.
#[derive(Args, Debug)]
pub struct PresetArgs {
    #[command(subcommand)]
    pub command: PresetCommand,
}

/// Subcommands for preset management.
#[derive(Subcommand, Debug)]
pub enum PresetCommand {
    /// Save the given settings under a name
    Save {
        /// Preset name (letters, digits, '-', '_' and spaces)
        name: String,

        #[command(flatten)]
        look: WatermarkArgs,

        /// Conflict policy stored with the preset
        #[arg(long, value_enum)]
        conflict: Option<ConflictArg>,

        /// Zip the output directory after runs using this preset
        #[arg(long)]
        zip: bool,
    },

    /// List saved presets
    List,

    /// Print a preset as JSON
    Show {
        /// Preset name or path to a preset file
        name: String,
    },
}

/// Execute the preset command.
pub fn execute(args: PresetArgs, config: &Config) -> anyhow::Result<()> {
    let store = PresetStore::new(config.preset_dir());

    match args.command {
        PresetCommand::Save {
            name,
            look,
            conflict,
            zip,
        } => {
            let mut settings = look.resolve(config)?;
            if let Some(conflict) = conflict {
                settings.conflict_mode = conflict.into();
            }
            if zip {
                settings.create_archive = true;
            }
            let path = store.save(&name, &settings)?;
            println!("Preset '{}' saved to {}", name, path.display());
        }

        PresetCommand::List => {
            let names = store.list()?;
            if names.is_empty() {
                eprintln!("No presets in {}", store.dir().display());
            }
            for name in names {
                println!("{name}");
            }
        }

        PresetCommand::Show { name } => {
            let preset = store.load(&name)?;
            println!("{}", serde_json::to_string_pretty(&preset)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use watermill_core::{Anchor, ConflictMode};

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.general.preset_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let args = PresetArgs {
            command: PresetCommand::Save {
                name: "web export".into(),
                look: WatermarkArgs {
                    anchor: Some(Anchor::BottomCenter),
                    ..Default::default()
                },
                conflict: Some(ConflictArg::Skip),
                zip: true,
            },
        };
        execute(args, &config).unwrap();

        let preset = PresetStore::new(dir.path()).load("web export").unwrap();
        assert_eq!(preset.settings.anchor, Anchor::BottomCenter);
        assert_eq!(preset.settings.conflict_mode, ConflictMode::Skip);
        assert!(preset.settings.create_archive);
    }

    #[test]
    fn test_save_rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let args = PresetArgs {
            command: PresetCommand::Save {
                name: "loud".into(),
                look: WatermarkArgs {
                    opacity: Some(150),
                    ..Default::default()
                },
                conflict: None,
                zip: false,
            },
        };
        assert!(execute(args, &config).is_err());
        assert!(PresetStore::new(dir.path()).list().unwrap().is_empty());
    }

    #[test]
    fn test_show_missing_preset() {
        let dir = tempfile::tempdir().unwrap();
        let args = PresetArgs {
            command: PresetCommand::Show {
                name: "ghost".into(),
            },
        };
        assert!(execute(args, &config_in(dir.path())).is_err());
    }
}
