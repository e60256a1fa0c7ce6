use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use clap::Subcommand;
use visitdesk_engine::stores::StoreError;
use visitdesk_engine::{App, Navigation, NotificationLevel, SessionEvent};
use visitdesk_types::{ChatId, MessageType, Slot, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFilter {
    All,
    Pending,
    Approved,
}

#[derive(Subcommand)]
pub enum ChatAction {
    /// List chats, then print live notifications until Ctrl-C.
    Watch,
    /// Send a direct message in an existing chat.
    Send { chat: u64, message: String },
}

fn store_err(err: StoreError) -> anyhow::Error {
    anyhow!(err.user_message())
}

async fn require_session(app: &mut App) -> Result<()> {
    app.initialize().await;
    if !app.session().is_logged_in() {
        bail!("Not signed in. Run `visitdesk login <email>` first.");
    }
    Ok(())
}

pub fn report_event(event: &SessionEvent) {
    match event {
        SessionEvent::Notification { level, text } => {
            let tag = match level {
                NotificationLevel::Info => "info",
                NotificationLevel::Warning => "warning",
                NotificationLevel::Error => "error",
            };
            eprintln!("[{tag}] {text}");
        }
        SessionEvent::Redirect(path) => tracing::debug!(path, "Redirect"),
        SessionEvent::StateChanged(state) => tracing::debug!(%state, "Session state"),
    }
}

pub async fn login(app: &mut App, email: &str, password: &str) -> Result<()> {
    let home = app.login(email, password).await?;
    println!("Signed in as {email}. Home: {home}");
    Ok(())
}

pub async fn logout(app: &mut App) -> Result<()> {
    app.initialize().await;
    app.logout().await;
    println!("Signed out.");
    Ok(())
}

pub async fn whoami(app: &mut App) -> Result<()> {
    require_session(app).await?;
    let profile = app
        .session()
        .profile()
        .context("Signed in but no profile loaded")?;
    println!("{} <{}>", profile.name, profile.email);
    println!("role: {}", profile.role);
    if let Some(id) = profile.profile_id {
        println!("profile id: {id}");
    }
    Ok(())
}

pub async fn tours(app: &mut App, date: Option<&str>) -> Result<()> {
    require_session(app).await?;
    let date = date
        .map(|raw| {
            raw.parse::<NaiveDate>()
                .with_context(|| format!("Invalid date {raw:?}, expected YYYY-MM-DD"))
        })
        .transpose()?;

    let store = &mut app.stores_mut().tours;
    store.fetch().await.map_err(store_err)?;
    let tours = match date {
        Some(date) => store.on_date(date),
        None => store.tours().iter().collect(),
    };
    if tours.is_empty() {
        println!("No tours.");
    }
    for tour in tours {
        let school = tour
            .visitor
            .as_ref()
            .and_then(|v| v.high_school_name.as_deref())
            .unwrap_or("-");
        println!(
            "#{:<5} {} {:<9} {:<11} {school}",
            tour.id,
            tour.date,
            tour.slot,
            format!("{:?}", tour.status)
        );
    }
    Ok(())
}

pub async fn batches(app: &mut App, filter: BatchFilter) -> Result<()> {
    require_session(app).await?;
    let store = &mut app.stores_mut().tour_requests;
    match filter {
        BatchFilter::All => store.fetch_all().await,
        BatchFilter::Pending => store.fetch_pending().await,
        BatchFilter::Approved => store.fetch_approved().await,
    }
    .map_err(store_err)?;

    if store.summaries().is_empty() {
        println!("No batches.");
    }
    for batch in store.summaries() {
        println!(
            "#{:<5} {:<9} {:>3} visitors  {}",
            batch.id, batch.status, batch.visitor_count, batch.date_range
        );
    }
    Ok(())
}

pub async fn availability(app: &mut App) -> Result<()> {
    require_session(app).await?;
    let store = &mut app.stores_mut().availability;
    store.fetch().await.map_err(store_err)?;
    if store.selected().is_empty() {
        println!("No available slots.");
    }
    for cell in store.selected() {
        println!("{cell}");
    }
    Ok(())
}

pub async fn toggle_availability(app: &mut App, day: &str, slot: u8) -> Result<()> {
    let day: Weekday = day.parse()?;
    let slot = Slot::new(slot)?;
    require_session(app).await?;

    let store = &mut app.stores_mut().availability;
    store.fetch().await.map_err(store_err)?;
    let outcome = store.toggle(day, slot).await.map_err(store_err)?;
    println!("{day} {}: {outcome:?}", slot.start_time());
    Ok(())
}

pub async fn fairs(app: &mut App) -> Result<()> {
    require_session(app).await?;
    let store = &mut app.stores_mut().fairs;
    store.fetch().await.map_err(store_err)?;
    if store.fairs().is_empty() {
        println!("No fairs.");
    }
    for fair in store.fairs() {
        println!(
            "#{:<5} {} {:<9} {}",
            fair.id,
            fair.date,
            format!("{:?}", fair.status),
            fair.explanation.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub async fn chat(app: &mut App, action: ChatAction) -> Result<()> {
    require_session(app).await?;
    let session = app.session().clone();
    let profile = session.profile().context("Signed in but no profile loaded")?;
    let messaging = session.messaging();
    messaging
        .fetch_chats_for_user(profile.id)
        .await
        .context("Failed to load chats")?;

    match action {
        ChatAction::Watch => {
            {
                let state = messaging.state().lock();
                for chat in &state.chats {
                    let other = [&chat.participant1, &chat.participant2]
                        .into_iter()
                        .flatten()
                        .find(|p| p.id != profile.id)
                        .map_or("-", |p| p.name.as_str());
                    println!("#{:<5} {other}", chat.id);
                }
            }

            let mut events = session.subscribe();
            println!("Watching for messages. Ctrl-C to stop.");
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    event = events.recv() => match event {
                        Ok(event @ SessionEvent::Notification { .. }) => report_event(&event),
                        Ok(SessionEvent::Redirect(_)) if !session.is_logged_in() => {
                            bail!("Session ended.");
                        }
                        Ok(_) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            Ok(())
        }
        ChatAction::Send { chat, message } => {
            let chat_id = ChatId::new(chat);
            let receivers: Vec<_> = {
                let state = messaging.state().lock();
                let chat = state
                    .chat(chat_id)
                    .with_context(|| format!("No chat #{chat_id}"))?;
                [&chat.participant1, &chat.participant2]
                    .into_iter()
                    .flatten()
                    .map(|p| p.id)
                    .filter(|id| *id != profile.id)
                    .collect()
            };
            messaging
                .send_message(Some(chat_id), &message, MessageType::Direct, receivers)
                .await
                .context("Failed to send message")?;
            println!("Sent.");
            Ok(())
        }
    }
}

pub async fn navigate(app: &mut App, path: &str) -> Result<()> {
    match app.navigate(path).await {
        Navigation::Allow(path) => println!("allow {path}"),
        Navigation::Redirect(path) => println!("redirect {path}"),
    }
    Ok(())
}
