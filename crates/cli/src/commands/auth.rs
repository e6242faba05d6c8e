//! `signup`, `login`, `logout` and `whoami`.

use secrecy::SecretString;

use stagedoor_client::AppError;
use stagedoor_client::api::{AuthKind, AuthMode};

use super::Context;
use crate::Credentials;
use crate::output;

pub async fn sign_in(ctx: &Context, mode: AuthMode, creds: &Credentials) -> Result<(), AppError> {
    let kind = if creds.admin {
        AuthKind::Admin
    } else {
        AuthKind::User
    };
    let password = SecretString::from(creds.password.clone());

    let identity = ctx
        .auth()
        .sign_in(kind, mode, &creds.email, &password)
        .await?;

    let verb = match mode {
        AuthMode::Login => "Signed in",
        AuthMode::Signup => "Account created, signed in",
    };
    output::line(&format!("{verb} as {} ({})", identity.email, identity.role));
    if identity.credential.is_placeholder() {
        output::line("The backend issued no token; requests will be sent unauthenticated.");
    }
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<(), AppError> {
    ctx.auth().sign_out().await?;
    output::line("Signed out");
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<(), AppError> {
    let Some(identity) = ctx.session.current().await? else {
        output::line("Not signed in");
        return Ok(());
    };

    let admin = ctx.session.is_admin().await?;
    output::line(&format!(
        "{} ({}{})",
        identity.email,
        identity.role,
        if admin { ", admin access" } else { "" }
    ));
    match identity.id {
        Some(id) => output::line(&format!("User id: {id}")),
        None => output::line("User id: unknown"),
    }
    Ok(())
}
