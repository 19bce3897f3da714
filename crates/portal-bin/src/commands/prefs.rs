use super::{print_json, PrefsCommand};
use crate::app::{AppContext, CliResult};
use portal_storage::Theme;

pub fn run(ctx: &AppContext, cmd: PrefsCommand) -> CliResult {
    let prefs = ctx.preferences();

    match cmd {
        PrefsCommand::Show => {
            print_json(&serde_json::json!({
                "theme": prefs.theme(),
                "profile": prefs.profile(),
                "storage": ctx.paths.storage_file(),
            }))?;
        }
        PrefsCommand::Theme { value: None } => {
            let theme = prefs.toggle_theme()?;
            println!("Theme: {}", theme.as_str());
        }
        PrefsCommand::Theme { value: Some(value) } => {
            let theme = value.parse::<Theme>()?;
            prefs.set_theme(theme)?;
            println!("Theme: {}", theme.as_str());
        }
        PrefsCommand::Set { key, value } => {
            let mut profile = prefs.profile();
            let mut json = serde_json::to_value(&profile)?;
            let slot = key
                .split('.')
                .try_fold(&mut json, |node, part| node.get_mut(part))
                .ok_or_else(|| format!("unknown preference: {}", key))?;
            *slot = if slot.is_boolean() {
                serde_json::Value::Bool(value.parse()?)
            } else {
                serde_json::Value::String(value)
            };
            profile = serde_json::from_value(json)?;
            prefs.save_profile(&profile)?;
            println!("Saved {}", key);
        }
    }
    Ok(())
}
