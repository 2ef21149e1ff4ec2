//! Main pricealert command line entry points
use crate::terminal::TerminalUi;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use inquire::ui::RenderConfig;
use pricealert_core::{
    alert_request::AlertRequest,
    client::HttpAlertApi,
    email::EmailAddress,
    error::{RequestError, VerifyError},
    paths::config_file,
    settings::Settings,
    store::{FileStore, SecureStore, StoreKey},
    ui::Navigate,
    verification::{ResendOutcome, Verification, VerificationResult},
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const RESEND_COMMAND: &str = "resend";

#[derive(Debug, Parser)]
#[command(name = "pricealert")]
#[command(about = "Subscribe to First Securities Brokers daily price alerts")]
pub struct Cli {
    #[arg(long, help = "Path to the secure store file for this device")]
    store_file: Option<PathBuf>,
    #[arg(long, help = "Whether to turn off ansi terminal colors")]
    no_colors: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Get a verification code by email and confirm it to receive price alerts
    Subscribe(SubscribeCommand),
    /// Show the email addresses remembered on this device
    Status,
    /// Print file paths used by the application (e.g. the path to config)
    Paths,
}

#[derive(Debug, Parser)]
pub struct SubscribeCommand {
    /// Email address to subscribe.
    /// If not provided, you'll be asked for it.
    #[arg(long)]
    email: Option<String>,
}

impl Cli {
    pub async fn run(&self, mut settings: Settings) -> Result<()> {
        let ansi = !self.no_colors;
        setup_tracing(ansi);

        if let Some(store_file) = &self.store_file {
            settings.store_file = store_file.clone();
        }

        tracing::debug!(?settings, "Loaded settings");

        match &self.command {
            Commands::Subscribe(subscribe) => {
                let state = CliState::load(&settings, ansi)?;
                let email = state.request_code(subscribe.email.as_deref()).await?;
                state.verify_code(email).await?;
            }
            Commands::Status => {
                let store = FileStore::new(&settings.store_file);
                let requested = store.get_item(StoreKey::UserEmail)?;
                let verified = store.get_item(StoreKey::VerifiedEmail)?;

                match (requested, verified) {
                    (None, None) => {
                        println!("No email is remembered on this device yet. Use \"pricealert subscribe\" to sign up for price alerts.");
                    }
                    (requested, verified) => {
                        println!(
                            "Last code requested for: {}",
                            requested.as_deref().unwrap_or("-")
                        );
                        println!(
                            "Verified email: {}",
                            verified.as_deref().unwrap_or("-")
                        );
                    }
                }
            }
            Commands::Paths => {
                println!("{}", config_file().display());
                println!("{}", settings.store_file.display());
            }
        }

        Ok(())
    }
}

pub(crate) struct CliState<'s> {
    pub(crate) settings: &'s Settings,
    pub(crate) render_config: RenderConfig,
    pub(crate) api: HttpAlertApi,
    pub(crate) store: FileStore,
    pub(crate) ui: TerminalUi,
}

impl<'s> CliState<'s> {
    fn load(settings: &'s Settings, colors: bool) -> Result<CliState<'s>> {
        let render_config = if colors {
            RenderConfig::default_colored()
        } else {
            RenderConfig::empty()
        };

        let api = HttpAlertApi::new(&settings.api)?;
        tracing::info!(?api, "Alert API client ready");

        Ok(Self {
            settings,
            render_config,
            api,
            store: FileStore::new(&settings.store_file),
            ui: TerminalUi::new(colors, settings.verification.success_delay()),
        })
    }

    async fn request_code(&self, email: Option<&str>) -> Result<EmailAddress> {
        let mut request = AlertRequest::new(self.api.clone(), self.store.clone(), self.ui);

        if let Some(email) = email {
            return match request.request_otp(email).await? {
                Navigate::VerifyEmail { email } => Ok(email),
                Navigate::Root => bail!("Unexpected navigation while requesting a code"),
            };
        }

        let remembered = request.remembered_email();
        loop {
            let mut prompt = inquire::Text::new("What's your email address?")
                .with_help_message("This is required to confirm your identity")
                .with_render_config(self.render_config);
            if let Some(remembered) = remembered.as_deref() {
                prompt = prompt.with_initial_value(remembered);
            }
            let candidate = prompt.prompt()?;
            tracing::info!(email = %candidate, "Email entered");

            match request.request_otp(candidate.trim()).await {
                Ok(Navigate::VerifyEmail { email }) => return Ok(email),
                Ok(Navigate::Root) => bail!("Unexpected navigation while requesting a code"),
                Err(RequestError::InvalidEmail) => continue,
                Err(e) => {
                    tracing::info!(%e, "Code request failed");
                    let retry = inquire::Confirm::new("Try again?")
                        .with_default(true)
                        .with_render_config(self.render_config)
                        .prompt()?;
                    if !retry {
                        bail!(e);
                    }
                }
            }
        }
    }

    async fn verify_code(&self, email: EmailAddress) -> Result<()> {
        let mut verification = Verification::mount(
            email,
            self.api.clone(),
            self.store.clone(),
            self.ui,
            self.settings.resend,
            self.settings.verification.success_delay(),
        );

        println!("Enter the code, or type \"{RESEND_COMMAND}\" to get a new one.");

        loop {
            let resend_label = verification.resend_state().label();
            let input = inquire::Text::new("Verification code:")
                .with_help_message(&resend_label)
                .with_render_config(self.render_config)
                .prompt()?;

            if input.trim().eq_ignore_ascii_case(RESEND_COMMAND) {
                let outcome = verification.resend().await;
                tracing::info!(?outcome, "Resend finished");
                if outcome == ResendOutcome::LimitReached {
                    println!("Run \"pricealert subscribe\" again to start over.");
                }
                continue;
            }

            verification.enter_code(&input);
            match verification.verify().await {
                Ok(VerificationResult::Success) => break,
                Ok(result) => tracing::info!(?result, "Verification not accepted"),
                Err(VerifyError::InvalidFormat) => {}
            }
        }

        let email = verification.email().clone();
        verification.unmount();

        println!("Successfully subscribed {email} to price alerts.");
        Ok(())
    }
}

fn setup_tracing(ansi: bool) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(ansi)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::from_default_env())
        .init();
}
