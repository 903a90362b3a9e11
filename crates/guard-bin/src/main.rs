// ============================
// crates/guard-bin/src/main.rs
// ============================
//! `tabguard`: a simulated browser tab driven from stdin.
//!
//! Each input line is an interaction signal or a command (see `help`). The
//! liveness check runs in the background and signs the user out after the
//! configured inactivity timeout.

mod command;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use command::{Command, HELP};
use guard_lib::activity::MonitorHandle;
use guard_lib::audit::{AuditLogger, TracingAuditSink};
use guard_lib::auth::SessionPhase;
use guard_lib::config::Settings;
use guard_lib::hooks::{IdentityProvider, LogoutHandler, Notifier, StoredIdentity};
use guard_lib::storage::{keys, TabStore};
use guard_lib::validation::{password_strength, validate_email, validate_password};
use guard_lib::GuardContext;
use std::path::PathBuf;
use std::sync::Arc;
use tabguard_common::{Identity, IdentityStatus, NoticeKind, Role};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "tabguard", version, about = "Session guard for a simulated browser tab")]
struct Args {
    /// Config file (defaults to ./tabguard.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep the tab store in this directory so a restart resumes the session
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

/// Prints notices to the terminal
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, kind: NoticeKind, text: &str) {
        println!("[{kind}] {text}");
    }
}

/// Drops the cached credentials of the tab
struct StoreLogout {
    store: Arc<dyn TabStore>,
}

#[async_trait]
impl LogoutHandler for StoreLogout {
    async fn force_logout(&self) -> anyhow::Result<()> {
        self.store.remove(keys::AUTH_TOKEN)?;
        self.store.remove(keys::CURRENT_USER)?;
        println!("signed out");
        Ok(())
    }
}

/// The simulated tab
struct Tab {
    ctx: GuardContext,
    audit: AuditLogger,
    identity: StoredIdentity,
    monitor: Option<MonitorHandle>,
}

impl Tab {
    fn new(ctx: GuardContext) -> Self {
        let audit = ctx.audit_logger(Arc::new(TracingAuditSink));
        let identity = StoredIdentity::new(ctx.store.clone());
        Self {
            ctx,
            audit,
            identity,
            monitor: None,
        }
    }

    /// Monitor a session restored from the tab store
    fn resume(&mut self) {
        if self.ctx.session.is_valid() {
            println!("resumed session {}", self.ctx.session.session_id().unwrap_or_default());
            self.start_monitor();
        }
    }

    fn start_monitor(&mut self) {
        let logout = Arc::new(StoreLogout {
            store: self.ctx.store.clone(),
        });
        self.monitor = Some(self.ctx.start_monitor(logout, Arc::new(ConsoleNotifier)));
    }

    async fn stop_monitor(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.teardown().await;
        }
    }

    /// Handle one command; `false` closes the tab
    async fn handle(&mut self, command: Command) -> anyhow::Result<bool> {
        match command {
            Command::Login { email } => self.login(&email).await?,
            Command::Register { email, password } => self.register(&email, &password),
            Command::Signal(signal) => match &self.monitor {
                Some(monitor) => monitor.listener().on_signal(signal),
                None => tracing::debug!(?signal, "activity outside a session"),
            },
            Command::Token => match self.ctx.session.require_live() {
                Ok(_) => println!("{}", self.ctx.csrf.get_token()),
                Err(e) => println!("{}", e.sanitized_message()),
            },
            Command::Submit { token } => {
                if let Err(e) = self.ctx.session.require_live() {
                    println!("form rejected: {}", e.sanitized_message());
                } else if self.ctx.csrf.validate_token(&token) {
                    println!("form accepted");
                } else {
                    println!("form rejected: invalid or expired token");
                }
            },
            Command::Status => self.status().await,
            Command::Logout => self.logout().await,
            Command::Reset { email } => {
                self.ctx.login_limiter.reset(&email);
                println!("login attempts cleared for {email}");
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    async fn login(&mut self, email: &str) -> anyhow::Result<()> {
        if let Err(e) = validate_email(email) {
            println!("{e}");
            return Ok(());
        }
        if !self.ctx.login_limiter.check(email) {
            let wait = self.ctx.login_limiter.remaining(email);
            println!(
                "too many login attempts, try again in {} minute(s)",
                wait.as_secs().div_ceil(60)
            );
            return Ok(());
        }

        self.stop_monitor().await;
        let session_id = self.ctx.begin_session();

        let identity = Identity {
            id: uuid::Uuid::new_v4().to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: Some(email.to_string()),
            role: Role::User,
            status: IdentityStatus::Active,
        };
        let json = serde_json::to_string(&identity).context("encoding identity")?;
        if let Err(e) = self.ctx.store.set(keys::CURRENT_USER, &json) {
            tracing::warn!(error = %e, "could not cache identity in tab store");
        }

        self.start_monitor();
        self.audit.log_login(&identity.id).await;
        println!("signed in as {} ({session_id})", identity.name);
        Ok(())
    }

    fn register(&self, email: &str, password: &str) {
        if let Err(e) = validate_email(email) {
            println!("{e}");
            return;
        }
        if !self.ctx.registration_limiter.check(email) {
            let wait = self.ctx.registration_limiter.remaining(email);
            println!(
                "too many registration attempts, try again in {} minute(s)",
                wait.as_secs().div_ceil(60)
            );
            return;
        }

        let report = password_strength(password);
        match validate_password(password) {
            Ok(_) => println!("registered {email}, password strength: {}", report.strength),
            Err(e) => println!("{e}"),
        }
    }

    async fn status(&self) {
        let session = &self.ctx.session;
        match session.phase() {
            SessionPhase::Expired => println!("no active session"),
            phase => println!(
                "session {} {:?}, expires in {}s",
                session.session_id().unwrap_or_default(),
                phase,
                session.remaining().as_secs()
            ),
        }
        if let Some(user) = self.identity.current_identity().await {
            println!("signed in as {} <{}>", user.name, user.email.unwrap_or_default());
        }
    }

    async fn logout(&mut self) {
        let user = self.identity.current_identity().await;
        self.stop_monitor().await;
        if let Some(user) = &user {
            self.audit.log_logout(&user.id).await;
        }
        self.ctx.end_session();
        println!("signed out");
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Settings::load().context("loading config")?,
    };
    if let Some(dir) = args.store_dir {
        settings.store_dir = Some(dir);
    }

    init_tracing(&settings.log_level, args.json);

    let ctx = GuardContext::from_settings(settings)?;
    let mut tab = Tab::new(ctx);
    tab.resume();

    println!("tabguard ready, type `help` for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                if !tab.handle(command).await? {
                    break;
                }
            },
            Err(e) => println!("{e}"),
        }
    }

    tab.stop_monitor().await;
    Ok(())
}
