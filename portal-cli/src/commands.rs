//! Command handlers
//!
//! Each handler prints its result to stdout; logging goes to stderr.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use portal_common::auth::LoginRequest;
use portal_common::config::PortalConfig;
use portal_common::generation::DemoGenerator;
use portal_common::progress::completion_percentage;
use portal_common::queries::{leaderboard, search_users, total_lessons, total_users};
use portal_common::resolver::LessonPath;
use portal_common::store::genesis;
use portal_common::{MutationOutcome, PortalStore};

use crate::Command;

pub async fn run(command: Command, mut store: PortalStore, config: &PortalConfig) -> Result<PortalStore> {
    match command {
        Command::List => list(&store),
        Command::CreateOrg { name, color } => {
            let outcome = store.create_organization(&name, &color)?;
            report(&outcome, "organization");
        }
        Command::Export { organization_id } => {
            println!("{}", store.export_organization(&organization_id)?);
        }
        Command::Replace { organization_id, file } => replace(&mut store, &organization_id, &file)?,
        Command::AddPhase { organization_id, title } => {
            let outcome = store.create_phase(&organization_id, &title)?;
            report(&outcome, "phase");
        }
        Command::Toggle {
            organization_id,
            phase_id,
            module_id,
            lesson_id,
        } => {
            let path = LessonPath::new(organization_id, phase_id, module_id, lesson_id);
            let outcome = store.toggle_lesson_completion(&path)?;
            report(&outcome, "lesson");
            if let Some(org) = store.organization(&path.organization_id) {
                println!("completion: {}%", completion_percentage(org));
            }
        }
        Command::Roster { organization_id } => roster(&store, &organization_id)?,
        Command::Search { term } => {
            for hit in search_users(store.organizations(), &term) {
                println!("{:<24} {:<10} {}", hit.user.name, hit.user.role, hit.organization_name);
            }
        }
        Command::Genesis { organization_id, prompt } => {
            let generator = DemoGenerator::new(config.generation.demo_delay());
            let shared = store.into_shared();
            let outcome = genesis(&shared, &organization_id, &prompt, &generator, config.generation.timeout())
                .await
                .context("Structure generation failed")?;
            report(&outcome, "structure");
            store = match Arc::try_unwrap(shared) {
                Ok(lock) => lock.into_inner(),
                Err(_) => bail!("store still shared after generation"),
            };
        }
        Command::Login { username, password, org } => {
            let request = match org {
                Some(organization_slug) => LoginRequest::Client {
                    organization_slug,
                    username,
                    password,
                },
                None => LoginRequest::Master { username, password },
            };
            let outcome = store.login(&request, &config.master)?;
            println!(
                "logged in as {} ({}) {}",
                outcome.user.name,
                outcome.user.role,
                outcome.organization_id.as_deref().unwrap_or("all organizations")
            );
        }
    }
    Ok(store)
}

fn list(store: &PortalStore) {
    for org in store.organizations() {
        println!(
            "{:<6} {:<14} {:<20} lessons {:>3}  completion {:>3}%  users {:>3}",
            org.id,
            org.slug,
            org.name,
            org.lesson_count(),
            completion_percentage(org),
            org.users.len()
        );
    }
    println!(
        "{} organizations, {} users, {} lessons",
        store.organizations().len(),
        total_users(store.organizations()),
        total_lessons(store.organizations())
    );
}

fn replace(store: &mut PortalStore, organization_id: &str, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let outcome = store.replace_organization_text(organization_id, &text)?;
    report(&outcome, "organization");
    Ok(())
}

fn roster(store: &PortalStore, organization_id: &str) -> Result<()> {
    let Some(org) = store.organization(organization_id) else {
        bail!("organization {} not found", organization_id);
    };
    for (user, score) in leaderboard(org) {
        let label = user.position.as_deref().unwrap_or("-");
        println!(
            "{:<10} {:<24} {:<8} {:<14} progress {:>3}%  score {:>3}",
            user.id,
            user.name,
            user.role,
            label,
            user.progress.unwrap_or(0),
            score
        );
    }
    Ok(())
}

fn report(outcome: &MutationOutcome, what: &str) {
    match outcome {
        MutationOutcome::Created(id) => println!("created {} {}", what, id),
        MutationOutcome::Applied => println!("updated {}", what),
        MutationOutcome::NoOp => println!("no change: {} not found", what),
    }
}
