use crate::app::{AppContext, Backend, CliResult};
use portal_api::Registration;
use portal_auth::{landing_route, DASHBOARD_ROUTE};

pub async fn login(ctx: &AppContext, email: &str, password: &str) -> CliResult {
    ctx.session.initialize().await;
    let user = ctx
        .session
        .login(email, password)
        .await
        .map_err(|e| e.to_string())?;
    println!("Signed in as {} <{}>", user.name, user.email);

    if let Backend::Organization(_) = ctx.backend {
        let landing = ctx.workspace()?.bootstrap_after_login().await?;
        println!("-> {}", landing.route());
    } else {
        println!("-> {}", landing_route(&user));
    }
    Ok(())
}

pub async fn register(
    ctx: &AppContext,
    name: String,
    email: String,
    password: String,
    company: String,
) -> CliResult {
    ctx.session.initialize().await;
    let registration = Registration {
        name,
        email,
        password,
        company,
    };
    let user = ctx
        .session
        .register(&registration)
        .await
        .map_err(|e| e.to_string())?;
    println!("Account created for {} <{}>", user.name, user.email);
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> CliResult {
    ctx.session.initialize().await;
    ctx.session.logout().await;
    println!("Signed out");
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> CliResult {
    let user = ctx.require_user(DASHBOARD_ROUTE).await?;
    println!("{} <{}>", user.name, user.email);
    if !user.company.is_empty() {
        println!("company: {}", user.company);
    }
    println!("role: {}", user.role);
    Ok(())
}

pub async fn health(ctx: &AppContext) -> CliResult {
    match &ctx.backend {
        Backend::Rest(client) => {
            let status = client.health().await?;
            println!("{}: {} ({})", status.status, status.message, status.timestamp);
        }
        Backend::Organization(client) => {
            // Anything but a transport failure means the project answered.
            match client.get_user("").await {
                Err(e) if e.kind() == portal_api::ErrorKind::NetworkError => return Err(e.into()),
                _ => println!("OK: {} is reachable", client.api_url()),
            }
        }
    }
    Ok(())
}
