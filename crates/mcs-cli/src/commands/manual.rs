use mcs_core::models::{GuideArticle, WarningLight};
use mcs_core::screens::{ManualScreen, ManualState};
use mcs_core::util::compact_text;

use crate::commands::common::Context;
use crate::error::CliError;

const GUIDE_PREVIEW_CHARS: usize = 80;

pub fn format_light(light: &WarningLight) -> String {
    format!(
        "[{}] {}: {}\n    {}",
        light.severity.as_str(),
        light.name,
        light.description,
        light.action
    )
}

pub fn format_guide(guide: &GuideArticle) -> String {
    let body = compact_text(&guide.body);
    let preview = if body.chars().count() > GUIDE_PREVIEW_CHARS {
        let cut = body.chars().take(GUIDE_PREVIEW_CHARS).collect::<String>();
        format!("{cut}...")
    } else {
        body
    };
    format!("{} ({})\n    {preview}", guide.title, guide.category)
}

async fn load_manual(ctx: &Context, query: Option<String>) -> Result<ManualState, CliError> {
    let screen = ManualScreen::new(ctx.gateway()?);
    screen.load().await;
    if let Some(query) = query {
        screen.set_query(query);
    }
    Ok(screen.state())
}

pub async fn run_lights(ctx: &Context, query: Option<String>) -> Result<(), CliError> {
    let state = load_manual(ctx, query).await?;
    if let Some(message) = state.lights.as_ref().and_then(|lights| lights.error()) {
        return Err(CliError::Rejected(message.to_string()));
    }

    let lights = state.visible_lights();
    if lights.is_empty() {
        println!("No warning lights found.");
    }
    for light in lights {
        println!("{}", format_light(light));
    }
    Ok(())
}

pub async fn run_guides(ctx: &Context, query: Option<String>) -> Result<(), CliError> {
    let state = load_manual(ctx, query).await?;
    if let Some(message) = state.guides.as_ref().and_then(|guides| guides.error()) {
        return Err(CliError::Rejected(message.to_string()));
    }

    let guides = state.visible_guides();
    if guides.is_empty() {
        println!("No guides found.");
    }
    for guide in guides {
        println!("{}", format_guide(guide));
    }
    Ok(())
}
