use super::UsersCommand;
use crate::app::{AppContext, CliResult};
use portal_api::UserUpdate;
use portal_auth::ADMIN_ROUTE;

pub async fn run(ctx: &AppContext, cmd: UsersCommand) -> CliResult {
    let client = ctx.rest()?;
    let admin = ctx.require_user(ADMIN_ROUTE).await?;

    match cmd {
        UsersCommand::List => {
            for user in client.list_users().await? {
                let active = if user.is_active.unwrap_or(true) { "active" } else { "inactive" };
                println!("{}  {} <{}> {} {}", user.id, user.name, user.email, user.role, active);
            }
        }
        UsersCommand::Update {
            id,
            active,
            name,
            company,
        } => {
            let update = UserUpdate {
                is_active: active,
                name,
                company,
                ..Default::default()
            };
            let updated = client.update_user(&id, &update).await?;
            if id == admin.id {
                let mut me = updated.unwrap_or_else(|| admin.clone());
                update.apply_to(&mut me);
                ctx.session.update_profile_snapshot(me)?;
            }
            println!("Updated user {}", id);
        }
        UsersCommand::Delete { id } => {
            if id == admin.id {
                return Err("refusing to deactivate your own account".into());
            }
            client.delete_user(&id).await?;
            println!("Deactivated user {}", id);
        }
    }
    Ok(())
}
