//! Session commands.
//!
//! Login and registration persist the bearer token and immediately run the
//! cart's mode transition, so a guest cart built before logging in lands
//! in the account cart right away.

use secrecy::SecretString;

use shopeasy_client::api::types::AuthResponse;
use shopeasy_client::api::{ApiClient, ApiError};
use shopeasy_client::cart::CartReconciler;
use shopeasy_client::session::{self, SessionMode};
use shopeasy_client::storage::FileStore;
use shopeasy_core::Email;

use super::format_price;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Create an account. The server logs the new user straight in.
pub async fn register(
    api: &ApiClient,
    store: FileStore,
    email: &str,
    display_name: &str,
    password: &str,
) -> CliResult {
    let email = Email::parse(email)?;
    let response = api.register(&email, display_name, password).await?;
    finish_login(api, store, response).await
}

/// Log in with email and password.
pub async fn login(api: &ApiClient, store: FileStore, email: &str, password: &str) -> CliResult {
    let email = Email::parse(email)?;
    let response = api.login(&email, password).await?;
    finish_login(api, store, response).await
}

/// Persist the token and migrate any guest cart into the account cart.
async fn finish_login(api: &ApiClient, mut store: FileStore, response: AuthResponse) -> CliResult {
    session::remember_token(&mut store, &response.token)?;

    let authed = api.with_bearer_token(SecretString::from(response.token));
    let mut cart = CartReconciler::new(store, authed);
    let snapshot = cart.on_mode_transition(SessionMode::Authenticated).await;

    println!(
        "Logged in as {} <{}>",
        response.user.display_name, response.user.email,
    );
    if !snapshot.is_empty() {
        println!(
            "Cart: {} item(s), total {}",
            snapshot.item_count(),
            format_price(snapshot.total()),
        );
    }
    Ok(())
}

/// Log out. The account cart stays on the server; only the token goes.
pub fn logout(mut store: FileStore) -> CliResult {
    session::forget_token(&mut store)?;
    println!("Logged out");
    Ok(())
}

/// Show the logged-in user. A token the server no longer accepts is
/// discarded, dropping the session back to anonymous.
pub async fn whoami(api: &ApiClient, mut store: FileStore) -> CliResult {
    if !api.has_token() {
        println!("Not logged in");
        return Ok(());
    }

    match api.profile().await {
        Ok(user) => {
            println!("{} <{}>", user.display_name, user.email);
            if let Some(created_at) = user.created_at {
                println!("Member since {}", created_at.format("%Y-%m-%d"));
            }
            Ok(())
        }
        Err(ApiError::Unauthorized(_)) => {
            session::forget_token(&mut store)?;
            println!("Session expired, please log in again");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
