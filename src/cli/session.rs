//! CLI handlers for login, logout, status, refresh and check.

use std::io::Write;
use std::sync::Arc;

use chrono::Utc;

use super::LoginArgs;
use crate::auth::{AuthController, HttpAuthEndpoint, SessionState, SessionStatus};
use crate::config::SessionConfig;
use crate::error::SessionError;

/// Wiring shared by every subcommand.
pub struct CliContext {
    pub config: SessionConfig,
    pub controller: AuthController,
}

impl CliContext {
    pub fn load(api_url: Option<String>) -> Result<Self, SessionError> {
        let mut config = SessionConfig::from_env()?;
        if let Some(url) = api_url {
            config.api_base_url = url;
        }
        let session = Arc::new(SessionState::restore(Arc::new(config.session_store())));
        let endpoint = Arc::new(HttpAuthEndpoint::from_config(&config)?);
        let controller = AuthController::new(session, endpoint);
        Ok(Self { config, controller })
    }

    fn session(&self) -> &Arc<SessionState> {
        self.controller.session()
    }
}

/// Handle `fanhub login`.
pub async fn handle_login(
    ctx: &CliContext,
    args: &LoginArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = match &args.password {
        Some(password) => password.clone(),
        None => prompt_password()?,
    };
    if password.is_empty() {
        return Err(SessionError::InvalidArgument("password is empty".to_string()).into());
    }

    let user = ctx.controller.login(&args.email, &password).await?;
    println!("✅ Signed in as {}", user.label());
    Ok(())
}

/// Handle `fanhub logout`.
pub async fn handle_logout(ctx: &CliContext) -> Result<(), Box<dyn std::error::Error>> {
    ctx.controller.logout();
    println!("👋 Signed out");
    Ok(())
}

/// Handle `fanhub status`. Reports what is stored without contacting the server.
pub async fn handle_status(ctx: &CliContext) -> Result<(), Box<dyn std::error::Error>> {
    let auth = ctx.session().auth_state();
    let tokens = ctx.session().tokens();

    println!("API:      {}", ctx.config.api_base_url);
    println!("Storage:  {}", ctx.config.session_store().path().display());
    if !tokens.has_any() {
        println!("Session:  none");
        return Ok(());
    }

    match &auth.user {
        Some(user) => println!("User:     {} (id {})", user.label(), user.id),
        None => println!("User:     unknown"),
    }
    println!(
        "Tokens:   access {}, refresh {}",
        presence(tokens.access_token.is_some()),
        presence(tokens.refresh_token.is_some())
    );
    if let Some(expires_at) = tokens.access_expires_at() {
        let state = if expires_at > Utc::now() { "expires" } else { "expired" };
        println!("Access:   {state} {}", expires_at.to_rfc3339());
    }
    println!("Run `fanhub check` to verify the session with the server.");
    Ok(())
}

/// Handle `fanhub refresh`.
pub async fn handle_refresh(ctx: &CliContext) -> Result<(), Box<dyn std::error::Error>> {
    if ctx.controller.refresh_auth().await {
        println!("✅ Access token refreshed");
        Ok(())
    } else {
        Err(SessionError::Authentication(
            "refresh failed; sign in again with `fanhub login`".to_string(),
        )
        .into())
    }
}

/// Handle `fanhub check`.
pub async fn handle_check(ctx: &CliContext) -> Result<(), Box<dyn std::error::Error>> {
    match ctx.controller.check_auth().await {
        SessionStatus::Authenticated => {
            let label = ctx
                .session()
                .auth_state()
                .user
                .map(|user| user.label())
                .unwrap_or_default();
            println!("✅ Session valid for {label}");
            Ok(())
        }
        status => {
            println!("❌ Not signed in ({status})");
            Err(SessionError::Authentication("no valid session".to_string()).into())
        }
    }
}

fn presence(held: bool) -> &'static str {
    if held {
        "held"
    } else {
        "missing"
    }
}

fn prompt_password() -> Result<String, std::io::Error> {
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
