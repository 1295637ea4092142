use anyhow::{anyhow, Context};
use clap::Subcommand;
use serde_json::json;

use crate::auth::{check_credentials, hash_password, plaintext_mirror};
use crate::cli::utils::{output_rows, output_success};
use crate::cli::OutputFormat;
use crate::config;
use crate::database::models::{AdminUserView, NewUser, User};
use crate::database::{open_store, SharedStore};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user")]
    Add {
        #[arg(help = "Login name")]
        name: String,
        #[arg(help = "Initial password")]
        password: String,
        #[arg(long, help = "Display nickname")]
        nickname: Option<String>,
        #[arg(long, help = "Grant administrator rights")]
        admin: bool,
    },

    #[command(about = "List users, newest first")]
    List,

    #[command(about = "Set a new password without knowing the old one")]
    ResetPassword {
        #[arg(help = "Login name")]
        name: String,
        #[arg(help = "New password")]
        new_password: String,
    },

    #[command(about = "Check a password against the stored credentials")]
    VerifyPassword {
        #[arg(help = "Login name")]
        name: String,
        #[arg(help = "Password to check")]
        password: String,
    },
}

async fn store() -> anyhow::Result<SharedStore> {
    open_store(config::config()).await.context("failed to open store")
}

async fn find_by_name(store: &SharedStore, name: &str) -> anyhow::Result<User> {
    store
        .find_user_by_name(name)
        .await?
        .ok_or_else(|| anyhow!("User '{}' not found", name))
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;
    let store = store().await?;

    match cmd {
        UserCommands::Add {
            name,
            password,
            nickname,
            admin,
        } => {
            if password.trim().is_empty() {
                return Err(anyhow!("Password must not be blank"));
            }
            if store.find_user_by_name(&name).await?.is_some() {
                return Err(anyhow!("User '{}' already exists", name));
            }

            let new_user = NewUser {
                name,
                password_hash: hash_password(&password, security.bcrypt_cost).await?,
                password_plain: plaintext_mirror(&password, security),
                nickname,
                avatar: None,
                avatar_type: None,
                avatar_url: None,
                bio: None,
                age: None,
                gender: None,
                is_admin: admin,
            };
            let user = store.insert_user(new_user).await?;

            output_success(
                output_format,
                &format!("Created user '{}' ({})", user.name, user.id),
                Some(json!({ "id": user.id, "name": user.name, "is_admin": user.is_admin })),
            )
        }
        UserCommands::List => {
            let users = store.list_users().await?;
            let rows: Vec<Vec<String>> = users
                .iter()
                .map(|u| {
                    vec![
                        u.id.to_string(),
                        u.name.clone(),
                        u.nickname.clone().unwrap_or_default(),
                        if u.is_admin { "yes".to_string() } else { String::new() },
                        u.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    ]
                })
                .collect();
            let views: Vec<AdminUserView> = users
                .iter()
                .map(|u| AdminUserView::new(u, security.retain_plaintext_passwords))
                .collect();

            output_rows(
                output_format,
                &["ID", "NAME", "NICKNAME", "ADMIN", "CREATED"],
                &rows,
                serde_json::to_value(views)?,
            )
        }
        UserCommands::ResetPassword { name, new_password } => {
            if new_password.trim().is_empty() {
                return Err(anyhow!("Password must not be blank"));
            }
            let user = find_by_name(&store, &name).await?;
            let hash = hash_password(&new_password, security.bcrypt_cost).await?;
            store
                .set_password(user.id, hash, plaintext_mirror(&new_password, security))
                .await?;

            output_success(output_format, &format!("Password reset for '{}'", name), None)
        }
        UserCommands::VerifyPassword { name, password } => {
            let user = find_by_name(&store, &name).await?;
            let valid = check_credentials(&user, &password).await?;
            let hashed = user.password.starts_with("$2");

            output_success(
                output_format,
                &format!(
                    "Password for '{}' is {}{}",
                    name,
                    if valid { "valid" } else { "NOT valid" },
                    if hashed { "" } else { " (stored value is not hashed)" }
                ),
                Some(json!({ "valid": valid, "hashed": hashed })),
            )
        }
    }
}
