//! gcda-lb - Labeling workflow client
//!
//! Terminal front-end for the GenAI Content Detection Assistant labeling
//! pipeline: signs a reviewer in, pulls assigned tasks, merges AI
//! preselection suggestions into the label form, and submits verdicts with
//! bounded retry. All workflow logic lives in the library; this binary
//! renders workflow events and forwards line commands to the controller.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gcda_common::events::{EventBus, WorkflowEvent};
use gcda_common::models::{Classification, LabelValue, Session};
use gcda_common::roles::{can_access, Role};
use gcda_common::Error;

use gcda_lb::api::auth::validate_signup;
use gcda_lb::api::BackendClient;
use gcda_lb::catalog::{IndicatorCatalog, IndicatorItem};
use gcda_lb::config::Settings;
use gcda_lb::session::SessionStore;
use gcda_lb::workflow::WorkflowController;

/// Command-line arguments for gcda-lb
#[derive(Parser, Debug)]
#[command(name = "gcda-lb")]
#[command(about = "Labeling client for the GenAI Content Detection Assistant")]
#[command(version)]
struct Args {
    /// Backend base URL (overrides GCDA_BACKEND_URL and the config file)
    #[arg(short, long)]
    backend_url: Option<String>,

    /// Scoring API key forwarded with preselection requests
    #[arg(long)]
    api_key: Option<String>,

    /// Indicator catalog TOML file (overrides GCDA_CATALOG and the config file)
    #[arg(long)]
    catalog: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gcda_lb=info,gcda_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting gcda-lb (labeling client)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::resolve(
        args.backend_url.as_deref(),
        args.api_key.as_deref(),
        args.catalog.as_deref(),
    );
    let backend = BackendClient::new(&settings.backend_url);

    // One reachability probe up front so a bad URL fails loudly here
    // instead of on the first task request.
    match backend.health().await {
        Ok(health) => {
            info!(status = %health.status, "Backend reachable at {}", backend.base_url())
        }
        Err(e) => println!(
            "Warning: backend at {} is not responding ({})",
            backend.base_url(),
            e
        ),
    }

    let catalog = IndicatorCatalog::load(settings.catalog_path.as_deref());

    let state_dir = gcda_common::config::state_dir();
    let mut store = SessionStore::open(&state_dir);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let session = match restored_session(&backend, &mut store).await {
        Some(session) => session,
        None => sign_in(&backend, &mut store, &mut lines).await?,
    };

    if !can_access(Some(session.role), Role::Labeler) {
        println!(
            "Account '{}' has the {} role; labeling requires labeler access.",
            session.username, session.role
        );
        return Ok(());
    }
    println!("Signed in as {} ({})", session.username, session.role);

    let events = EventBus::new(256);
    let (mut controller, mut deliveries) = WorkflowController::new(
        backend.clone(),
        events.clone(),
        catalog,
        session.clone(),
        settings.api_key.clone(),
    );

    // Dedicated printer so retry/preselection progress renders as it
    // happens, not after the triggering command returns.
    let mut printer_rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = printer_rx.recv().await {
            render_event(&event);
        }
    });

    print_help();

    // First task without being asked, like opening the labeling page
    if let Err(e) = controller.next_task().await {
        warn!(error = %e, "Initial task request failed");
    }

    loop {
        print!("gcda> ");
        std::io::stdout().flush().ok();

        tokio::select! {
            line = lines.next_line() => {
                let line = match line.context("Failed reading stdin")? {
                    Some(line) => line,
                    None => break,
                };
                if !dispatch(&mut controller, &backend, &mut store, &session, line.trim()).await {
                    break;
                }
            }
            delivery = deliveries.recv() => {
                if let Some(delivery) = delivery {
                    controller.apply_preselect_delivery(delivery);
                }
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}

/// Handle one REPL line; returns false when the loop should exit
async fn dispatch(
    controller: &mut WorkflowController,
    backend: &BackendClient,
    store: &mut SessionStore,
    session: &Session,
    line: &str,
) -> bool {
    if line.is_empty() {
        return true;
    }
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    match cmd {
        "help" | "?" => print_help(),
        "next" | "n" => {
            report_local(controller.next_task().await);
        }
        "show" | "s" => print_status(controller),
        "label" | "l" => match LabelValue::parse(rest) {
            Some(value) => {
                if report_local(controller.set_label(value)) {
                    println!("Verdict set to {}", value.as_str());
                }
            }
            None => println!("Usage: label <GenAI|NotGenAI>"),
        },
        "tag" | "t" => {
            if rest.is_empty() {
                println!("Usage: tag <word>");
            } else {
                match controller.toggle_tag(rest) {
                    Ok(true) => println!("Tag '{}' added", rest),
                    Ok(false) => println!("Tag '{}' removed", rest),
                    Err(e) => println!("{}", e),
                }
            }
        }
        "ai" => toggle_indicator(controller, IndicatorFamily::Ai, rest),
        "human" | "hu" => toggle_indicator(controller, IndicatorFamily::Human, rest),
        "suggest" => {
            if report_local(controller.refresh_suggestions()) {
                println!("Requesting fresh AI suggestions...");
            }
        }
        "submit" => {
            report_local(controller.submit().await);
        }
        "whoami" => println!("{} ({})", session.username, session.role),
        "logout" => {
            backend.logout(&session.token).await;
            store.invalidate();
            println!("Signed out.");
            return false;
        }
        "quit" | "exit" | "q" => return false,
        _ => println!("Unknown command '{}'; 'help' lists commands.", cmd),
    }
    true
}

/// Print local validation errors; network failures already render as events
fn report_local<T>(result: gcda_common::Result<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(Error::Validation(msg)) => {
            println!("{}", msg);
            false
        }
        Err(_) => false,
    }
}

enum IndicatorFamily {
    Ai,
    Human,
}

fn toggle_indicator(controller: &mut WorkflowController, family: IndicatorFamily, input: &str) {
    if input.is_empty() {
        println!("Usage: ai|human <number|id>   (numbers as listed by 'show')");
        return;
    }
    let items = match family {
        IndicatorFamily::Ai => &controller.catalog().ai_indicators,
        IndicatorFamily::Human => &controller.catalog().human_indicators,
    };
    let id = match resolve_indicator(items, input) {
        Some(id) => id.to_string(),
        None => {
            println!("No such indicator '{}'; 'show' lists them.", input);
            return;
        }
    };
    let toggled = match family {
        IndicatorFamily::Ai => controller.toggle_ai_indicator(&id),
        IndicatorFamily::Human => controller.toggle_human_indicator(&id),
    };
    match toggled {
        Ok(true) => println!("Checked {}", id),
        Ok(false) => println!("Unchecked {}", id),
        Err(e) => println!("{}", e),
    }
}

/// Map user input to a catalog id: a 1-based list number or the id itself
fn resolve_indicator<'a>(items: &'a [IndicatorItem], input: &str) -> Option<&'a str> {
    if let Ok(n) = input.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| items.get(i))
            .map(|item| item.id.as_str());
    }
    items
        .iter()
        .find(|item| item.id == input)
        .map(|item| item.id.as_str())
}

fn print_status(controller: &WorkflowController) {
    match controller.task() {
        Some(task) => {
            println!("Task #{}: {}", task.website_id, task.url);
            println!("  started: {}", task.start_time);
        }
        None => {
            println!("No task loaded ('next' requests one).");
            return;
        }
    }
    let draft = controller.draft();
    println!(
        "Verdict: {}",
        draft
            .label_value()
            .map(|v| v.as_str())
            .unwrap_or("(unset - 'label GenAI' or 'label NotGenAI')")
    );
    if draft.tags().is_empty() {
        println!("Tags: (none)");
    } else {
        println!("Tags: {}", draft.tags().join(", "));
    }
    println!("AI indicators:");
    print_indicator_family(&controller.catalog().ai_indicators, draft.ai_indicators());
    println!("Human indicators:");
    print_indicator_family(
        &controller.catalog().human_indicators,
        draft.human_indicators(),
    );
}

fn print_indicator_family(items: &[IndicatorItem], selected: &[String]) {
    for (i, item) in items.iter().enumerate() {
        let mark = if selected.iter().any(|s| s == &item.id) {
            "x"
        } else {
            " "
        };
        println!("  [{}] {:2}. {} ({})", mark, i + 1, item.label, item.id);
    }
    // Scorer-delivered ids the catalog does not know are still selected
    for id in selected {
        if !items.iter().any(|item| &item.id == id) {
            println!("  [x]     (uncatalogued) {}", id);
        }
    }
}

fn render_event(event: &WorkflowEvent) {
    match event {
        WorkflowEvent::StateChanged { .. } => {}
        WorkflowEvent::TaskLoaded { website_id, url } => {
            println!("\nTask #{}: {}", website_id, url);
        }
        WorkflowEvent::NoTaskAvailable { title, message } => {
            println!("\n{}: {}", title, message);
        }
        WorkflowEvent::TaskRequestFailed { reason } => {
            println!("\nTask request failed: {}. Try 'next' again.", reason);
        }
        WorkflowEvent::PreselectionStarted { website_id } => {
            println!("Requesting AI suggestions for task #{}...", website_id);
        }
        WorkflowEvent::PreselectionApplied {
            classification,
            confidence_score,
            ai_count,
            human_count,
            ..
        } => {
            println!(
                "AI suggestions in: {} AI cue(s), {} human cue(s) pre-checked.",
                ai_count, human_count
            );
            if let Some(classification) = classification {
                match confidence_score {
                    Some(score) => println!(
                        "  model leans {} ({}% confidence); the verdict is still yours",
                        classification_label(*classification),
                        score
                    ),
                    None => println!(
                        "  model leans {}; the verdict is still yours",
                        classification_label(*classification)
                    ),
                }
            }
        }
        WorkflowEvent::PreselectionDiscarded { reason, .. } => {
            println!("(stale AI suggestions discarded: {})", reason);
        }
        WorkflowEvent::PreselectionFailed { reason, .. } => {
            println!(
                "AI suggestions unavailable: {}. Labeling continues manually.",
                reason
            );
        }
        WorkflowEvent::SubmissionStarted { website_id } => {
            println!("Submitting label for task #{}...", website_id);
        }
        WorkflowEvent::SubmissionRetrying {
            attempt,
            max_attempts,
            delay_secs,
        } => {
            println!(
                "Attempt {}/{} failed; retrying in {}s...",
                attempt, max_attempts, delay_secs
            );
        }
        WorkflowEvent::SubmissionSucceeded { message, .. } => {
            println!("Submitted: {}", message);
        }
        WorkflowEvent::SubmissionFailed { reason, .. } => {
            println!(
                "Submission failed: {}. Draft preserved; adjust and 'submit' again.",
                reason
            );
        }
    }
}

fn classification_label(classification: Classification) -> &'static str {
    match classification {
        Classification::AiGenerated => "AI-generated",
        Classification::HumanCreated => "human-created",
        Classification::Uncertain => "uncertain",
    }
}

fn print_help() {
    println!("Commands:");
    println!("  next           request the next labeling task");
    println!("  show           current task and draft");
    println!("  label <v>      set the verdict: GenAI or NotGenAI");
    println!("  tag <word>     toggle a tag");
    println!("  ai <n|id>      toggle an AI indicator (number from 'show', or id)");
    println!("  human <n|id>   toggle a human indicator");
    println!("  suggest        re-run AI preselection for this task");
    println!("  submit         submit the label");
    println!("  whoami         show the signed-in account");
    println!("  logout         sign out and exit");
    println!("  quit           exit without signing out");
}

// ============================================================================
// Sign-in Flow
// ============================================================================

/// Try to reuse a persisted session, verifying it against the backend
///
/// A 401 clears the stored session; an unreachable backend keeps it, since
/// the first task request will surface any real problem.
async fn restored_session(backend: &BackendClient, store: &mut SessionStore) -> Option<Session> {
    let session = store.current()?.clone();
    match backend.current_user(&session.token).await {
        Ok(user) => {
            info!(username = %user.username, "Restored session verified");
            println!("Restored session for {} ({}).", session.username, session.role);
            Some(session)
        }
        Err(Error::AuthRequired(_)) => {
            info!("Stored session no longer honored; clearing");
            store.invalidate();
            None
        }
        Err(e) => {
            warn!(error = %e, "Could not verify restored session");
            Some(session)
        }
    }
}

async fn sign_in(
    backend: &BackendClient,
    store: &mut SessionStore,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<Session> {
    println!("Sign in to continue (type 'signup' to create an account).");
    loop {
        let username = prompt(lines, "Username: ").await?;
        if username.is_empty() {
            continue;
        }
        if username.eq_ignore_ascii_case("signup") {
            if let Err(e) = sign_up(backend, lines).await {
                println!("Signup failed: {}", e);
            }
            continue;
        }
        let password = prompt(lines, "Password: ").await?;

        match backend.login(&username, &password, true).await {
            Ok(login) => {
                store
                    .establish(&login)
                    .context("Could not persist session")?;
                match store.current() {
                    Some(session) => return Ok(session.clone()),
                    None => println!("Login succeeded but the token is already expired; try again."),
                }
            }
            Err(e) => println!("Login failed: {}", e),
        }
    }
}

async fn sign_up(backend: &BackendClient, lines: &mut Lines<BufReader<Stdin>>) -> Result<()> {
    let username = prompt(lines, "New username: ").await?;
    let full_name = prompt(lines, "Full name: ").await?;
    let password = prompt(lines, "Password: ").await?;
    let confirm = prompt(lines, "Confirm password: ").await?;
    let role_input = prompt(lines, "Role [labeler/admin] (default labeler): ").await?;

    let role = if role_input.is_empty() {
        Role::Labeler
    } else {
        Role::parse(&role_input)
            .ok_or_else(|| anyhow::anyhow!("Unknown role '{}'", role_input))?
    };

    let request = validate_signup(&username, &full_name, &password, &confirm, role)?;
    let user = backend.signup(&request).await?;
    println!("Account '{}' created; sign in to continue.", user.username);
    Ok(())
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<String> {
    print!("{}", label);
    std::io::stdout().flush().ok();
    let line = lines
        .next_line()
        .await
        .context("Failed reading stdin")?
        .ok_or_else(|| anyhow::anyhow!("Input closed"))?;
    Ok(line.trim().to_string())
}
