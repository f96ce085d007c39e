use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::OutputFormat;
use crate::config::{Config, ConfigValue, DEFAULT_API_URL};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        cli_config_path: Option<PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        print_value("api_url", &config.api_url, |v| v.clone());
                        print_value("token", &config.token, |v| {
                            if v.is_some() { "****" } else { "(not set)" }.to_string()
                        });
                        print_value("dietitian_id", &config.dietitian_id, |v| {
                            v.clone().unwrap_or_else(|| "(not set)".to_string())
                        });
                        print_value("dietitian_name", &config.dietitian_name, |v| v.clone());
                        print_value(
                            "request_timeout_secs",
                            &config.request_timeout_secs,
                            u64::to_string,
                        );
                        print_value(
                            "refresh_interval_secs",
                            &config.refresh_interval_secs,
                            u64::to_string,
                        );
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = cli_config_path.unwrap_or_else(Config::default_config_path);

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'diet config show' to view current configuration.");
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let mut file = fs::File::create(&config_path)?;
                file.write_all(default_config().as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nSet token and dietitian_id, then run 'diet clients list'.");
                Ok(())
            }
        }
    }
}

fn print_value<T>(key: &str, value: &ConfigValue<T>, show: impl Fn(&T) -> String) {
    println!("{}: {}", key, show(&value.value));
    println!("  source: {}", value.source);
    println!();
}

fn default_config() -> String {
    format!(
        r#"# dietdesk configuration

# Base URL of the platform API
api_url: {}

# Credentials of the signed-in dietitian (or DIETDESK_TOKEN / DIETDESK_DIETITIAN_ID)
# token: <bearer token>
# dietitian_id: <your user id>
dietitian_name: Dietitian

# request_timeout_secs: 30
# refresh_interval_secs: 60
"#,
        DEFAULT_API_URL
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigSource;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_parses() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, default_config()).unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.api_url.value, DEFAULT_API_URL);
        assert_eq!(config.dietitian_name.source, ConfigSource::File);
    }

    #[test]
    fn test_init_writes_to_given_path() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.yaml");
        let config = Config::load(Some(config_path.clone())).unwrap();

        let cmd = ConfigCommand {
            command: ConfigSubcommand::Init,
        };
        cmd.run(&config, Some(config_path.clone())).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("api_url:"));
    }
}
