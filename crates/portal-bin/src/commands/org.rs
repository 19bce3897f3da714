use super::{print_json, OrgCommand};
use crate::app::{AppContext, CliResult};
use org_workspace::OrgLanding;
use portal_auth::DASHBOARD_ROUTE;

pub async fn run(ctx: &AppContext, cmd: OrgCommand) -> CliResult {
    let workspace = ctx.workspace()?;
    ctx.require_user(DASHBOARD_ROUTE).await?;
    let client = workspace.client().clone();

    match cmd {
        OrgCommand::List => match workspace.load_dashboard().await? {
            None => println!("No organization yet. Create one with `nhd-portal org create`."),
            Some(dashboard) => {
                for org in &dashboard.organizations {
                    let marker = if org.id == dashboard.current_org_id { "*" } else { " " };
                    println!(
                        "{} {}  {} ({})",
                        marker,
                        org.id,
                        org.name,
                        org.slug.as_deref().unwrap_or("-")
                    );
                }
            }
        },
        OrgCommand::Switch { org_id } => {
            let contents = workspace.switch_org(&org_id).await?;
            println!(
                "Now working in {} ({} projects, {} files)",
                org_id,
                contents.projects.len(),
                contents.files.len()
            );
        }
        OrgCommand::Projects => {
            let org_id = current_org(&workspace).await?;
            print_json(&client.organization_projects(&org_id).await?)?;
        }
        OrgCommand::Files => {
            let org_id = current_org(&workspace).await?;
            print_json(&client.list_org_files(&org_id).await?)?;
        }
        OrgCommand::Upload { file, content_type } => {
            current_org(&workspace).await?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let bytes = tokio::fs::read(&file).await?;
            let files = workspace
                .upload_file(&name, content_type.as_deref(), bytes)
                .await?;
            println!("Uploaded {} ({} files now)", name, files.len());
        }
        OrgCommand::DownloadUrl { path } => {
            println!("{}", client.signed_file_url(&path).await?);
        }
        OrgCommand::Create { name, slug } => {
            let landing = workspace.create_organization(&name, &slug).await?;
            if let OrgLanding::Ready { org_id, .. } = &landing {
                println!("Created organization, now working in {}", org_id);
            }
            println!("-> {}", landing.route());
        }
    }
    Ok(())
}

async fn current_org(workspace: &org_workspace::OrgWorkspace) -> CliResult<String> {
    match workspace.resolve_current_org().await? {
        OrgLanding::Ready { org_id, .. } => Ok(org_id),
        OrgLanding::NeedsOrganization => {
            Err("no organization yet; create one with `nhd-portal org create`".into())
        }
    }
}
