mod affordance;
mod api;
mod cli;
mod config;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use affordance::{AffordanceState, AvatarUploader, DisplayedImage, SelectedFile, UploadAffordance};
use api::ApiClient;
use cli::{Cli, Commands};
use config::ClientConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ClientConfig::load()?;

    match cli.command {
        Commands::Me => {
            let client = ApiClient::new(&config.api_url, config.session().as_deref())?;
            let me = client.me().await?;
            println!(
                "#{} {} <{}>",
                me.id,
                me.name.as_deref().unwrap_or("(no name)"),
                me.email
            );
            println!("image: {}", me.image.as_deref().unwrap_or("(none)"));
        }
        Commands::Upload { path } => {
            let client = ApiClient::new(&config.api_url, config.session().as_deref())?;
            upload(&client, &path).await?;
        }
        Commands::Session { session_id } => {
            config.session_id = Some(session_id);
            config.save()?;
            println!("Session saved.");
        }
        Commands::Logout => {
            config.session_id = None;
            config.save()?;
            println!("Session removed.");
        }
        Commands::ConfigPath => {
            let path = ClientConfig::config_path()?;
            if !path.exists() {
                config.save()?;
            }
            println!("{}", path.display());
        }
    }

    Ok(())
}

async fn upload(client: &ApiClient, path: &Path) -> Result<()> {
    let file = read_selection(path)?;
    let me = client.me().await?;
    let mut affordance = UploadAffordance::new(me.image);

    affordance.begin(&file)?;
    if let DisplayedImage::Preview(preview) = affordance.displayed() {
        println!(
            "Uploading {} ({} bytes, preview {} chars)...",
            file.file_name,
            file.size(),
            preview.data_uri().len()
        );
    }
    affordance.finish(client.upload_avatar(&file).await);

    match affordance.state() {
        AffordanceState::Committed { image_url } => {
            println!("Profile picture updated: {image_url}");
            Ok(())
        }
        AffordanceState::Reverted { notice } => {
            let kept = affordance.durable_image().unwrap_or("(none)");
            anyhow::bail!("{notice}. Keeping previous image: {kept}")
        }
        state => anyhow::bail!("Upload ended in unexpected state: {state:?}"),
    }
}

fn read_selection(path: &Path) -> Result<SelectedFile> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "avatar".to_string());
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(SelectedFile::new(file_name, mime_type, bytes))
}
