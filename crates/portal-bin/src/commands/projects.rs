use super::{print_json, ProjectsCommand};
use crate::app::{AppContext, CliResult};
use portal_api::ProjectDraft;
use portal_auth::DASHBOARD_ROUTE;

pub async fn run(ctx: &AppContext, cmd: ProjectsCommand) -> CliResult {
    let client = ctx.rest()?;
    ctx.require_user(DASHBOARD_ROUTE).await?;

    match cmd {
        ProjectsCommand::List => {
            for project in client.list_projects().await? {
                println!(
                    "{}  {} [{}] {}%",
                    project.id, project.name, project.status, project.progress
                );
            }
        }
        ProjectsCommand::Create {
            name,
            description,
            client_id,
            budget,
        } => {
            let draft = ProjectDraft {
                name: Some(name),
                description,
                client_id,
                budget,
                ..Default::default()
            };
            let project = client.create_project(&draft).await?;
            println!("Created project {}", project.id);
        }
        ProjectsCommand::Update {
            id,
            status,
            progress,
            priority,
        } => {
            let draft = ProjectDraft {
                status,
                progress,
                priority,
                ..Default::default()
            };
            match client.update_project(&id, &draft).await? {
                Some(project) => print_json(&project)?,
                None => println!("Updated project {}", id),
            }
        }
        ProjectsCommand::Delete { id } => {
            client.delete_project(&id).await?;
            println!("Deleted project {}", id);
        }
    }
    Ok(())
}
