//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! smartsales login -u vendedor1
//! smartsales register -u ana -e ana@example.com --city Santa Cruz
//! smartsales whoami --verify
//! smartsales logout
//! ```

use std::io::{self, BufRead, Write};

use secrecy::SecretString;
use smartsales_client::api::RegistrationForm;
use smartsales_client::error::AppError;
use smartsales_client::state::AppState;
use smartsales_core::UserRole;

/// Profile fields for `register`, as given on the command line.
pub struct Profile {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    pub role: UserRole,
}

/// Read a line from stdin after printing `label` to stderr.
fn prompt(label: &str) -> io::Result<SecretString> {
    let mut stderr = io::stderr();
    write!(stderr, "{label}: ")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_owned()))
}

/// Log in, prompting for the password when it was not passed.
#[allow(clippy::print_stdout)]
pub async fn login(
    state: &mut AppState,
    username: &str,
    password: Option<String>,
) -> Result<(), AppError> {
    let password = match password {
        Some(password) => SecretString::from(password),
        None => prompt("Password")?,
    };

    let user = state.login(username, &password).await?;
    println!("Logged in as {} ({})", user.display_name(), user.role);
    Ok(())
}

/// Register an account, prompting for the password twice.
#[allow(clippy::print_stdout)]
pub async fn register(state: &mut AppState, profile: Profile) -> Result<(), AppError> {
    let password = prompt("Password")?;
    let password_confirm = prompt("Confirm password")?;

    let form = RegistrationForm {
        username: profile.username,
        email: profile.email,
        password,
        password_confirm,
        first_name: profile.first_name,
        last_name: profile.last_name,
        phone: profile.phone,
        city: profile.city,
        role: profile.role,
    };

    let user = state.register(&form).await?;
    println!("Account created. Logged in as {}", user.username);
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn logout(state: &mut AppState) -> Result<(), AppError> {
    if !state.session().is_authenticated() {
        println!("Not logged in");
        return Ok(());
    }
    state.logout().await?;
    println!("Logged out");
    Ok(())
}

/// Show the stored session, optionally checking it against the backend.
#[allow(clippy::print_stdout)]
pub async fn whoami(state: &mut AppState, verify: bool) -> Result<(), AppError> {
    if verify && !state.verify_session().await? {
        println!("Session is no longer valid; logged out");
        return Ok(());
    }

    match state.session().user() {
        Some(user) => {
            println!("{} <{}>", user.username, user.email);
            println!("  Name: {} {}", user.first_name, user.last_name);
            println!("  Role: {}", user.role);
            if !user.city.is_empty() {
                println!("  City: {}", user.city);
            }
        }
        None => println!("Not logged in"),
    }
    Ok(())
}
