//! CLI handlers for login, registration, status and logout.

use std::io::Write;

use crate::api::{LoginCredentials, Registration};
use crate::session::Session;

/// Handle `pixshare auth login <login>`.
pub async fn handle_login(
    session: &Session,
    login: &str,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };
    let credentials = if login.contains('@') {
        LoginCredentials::email(login, password)
    } else {
        LoginCredentials::username_or_email(login, password)
    };
    let signed_in = session.auth().login(&credentials).await?;
    let name = signed_in
        .user
        .and_then(|u| u.username)
        .unwrap_or_else(|| login.to_string());
    println!("✅ Logged in as {name}");
    Ok(())
}

/// Handle `pixshare auth register <email> <username>`.
pub async fn handle_register(
    session: &Session,
    email: &str,
    username: &str,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };
    let registration = Registration {
        email: email.to_string(),
        username: username.to_string(),
        password,
    };
    session.auth().register(&registration).await?;
    println!("✅ Account {username} created");
    Ok(())
}

/// Handle `pixshare auth status`.
pub async fn handle_status(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔐 Authentication Status\n");
    println!("  API: {}", session.client().base_url());

    if !session.is_logged_in()? {
        println!("  Session: ❌ Not logged in");
        return Ok(());
    }

    if let Some(identity) = session.identity()? {
        let id = identity
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_string());
        let name = identity.username.unwrap_or_else(|| "?".to_string());
        println!("  Token: {name} (id {id})");
    }

    match session.auth().profile().await {
        Ok(user) => {
            let name = user.username.unwrap_or_default();
            let email = user.email.unwrap_or_default();
            println!("  Session: ✅ Logged in as {name} <{email}>");
        }
        Err(e) => println!("  Session: ⚠️  {e}"),
    }
    Ok(())
}

/// Handle `pixshare auth logout`.
pub fn handle_logout(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    session.auth().logout()?;
    println!("✅ Logged out");
    Ok(())
}

fn prompt_password() -> Result<String, Box<dyn std::error::Error>> {
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err("no password provided".into());
    }
    Ok(password)
}
